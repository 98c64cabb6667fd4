//! Loaded schemas.
//!
//! A schema is a tree of [`Scope`]s. Every scope has a key (the member,
//! attribute or element name it matches in content), a [`Role`], its own
//! failure predicates, ordered children, and for arrays one shared item
//! scope. The same structure is produced whether the schema was written in
//! JSON or XML.

use crate::role::Role;
use benchfold_kernel::{FailurePredicate, PredicateError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub key: String,
    pub role: Role,
    pub failures: Vec<FailurePredicate>,
    pub children: Vec<Scope>,
    pub items: Option<Box<Scope>>,
}

impl Scope {
    pub fn new(key: impl Into<String>, role: Role) -> Self {
        Self {
            key: key.into(),
            role,
            failures: Vec::new(),
            children: Vec::new(),
            items: None,
        }
    }

    pub fn with_child(mut self, child: Scope) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_items(mut self, items: Scope) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_failure(mut self, predicate: FailurePredicate) -> Self {
        self.failures.push(predicate);
        self
    }

    /// Children declaring `role`, in declared order.
    pub fn children_with(&self, role: Role) -> impl Iterator<Item = &Scope> {
        self.children.iter().filter(move |c| c.role == role)
    }
}

/// Syntax a schema was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Xml,
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Xml => "xml",
        })
    }
}

/// Errors raised while loading a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema is neither valid JSON ({json}) nor valid XML ({xml})")]
    Format { json: String, xml: String },

    #[error("{path}: unknown role `{role}`")]
    UnknownRole { path: String, role: String },

    #[error("{path}: {source}")]
    Predicate {
        path: String,
        #[source]
        source: PredicateError,
    },

    #[error("{path}: array scope declares no item schema")]
    MissingItems { path: String },

    #[error("{path}: {message}")]
    Malformed { path: String, message: String },

    #[error("schema declares no root scope")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Scope,
    format: SchemaFormat,
}

impl Schema {
    pub fn new(root: Scope, format: SchemaFormat) -> Result<Self, SchemaError> {
        validate(&root, &root.key)?;
        Ok(Self { root, format })
    }

    /// Load a schema, trying JSON first and XML second.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let json = match crate::json::parse_schema(text) {
            Ok(schema) => return Ok(schema),
            Err(SchemaError::Format { json, .. }) => json,
            Err(other) => return Err(other),
        };
        match crate::xml::parse_schema(text) {
            Ok(schema) => Ok(schema),
            Err(SchemaError::Format { xml, .. }) => Err(SchemaError::Format { json, xml }),
            Err(other) => Err(other),
        }
    }

    pub fn root(&self) -> &Scope {
        &self.root
    }

    pub fn format(&self) -> SchemaFormat {
        self.format
    }
}

fn validate(scope: &Scope, path: &str) -> Result<(), SchemaError> {
    if scope.role == Role::Array && scope.items.is_none() {
        return Err(SchemaError::MissingItems { path: shown(path) });
    }
    for child in &scope.children {
        validate(child, &join(path, &child.key))?;
    }
    if let Some(items) = &scope.items {
        validate(items, &join(path, &items.key))?;
    }
    Ok(())
}

/// Path as printed in errors; the unnamed root shows as `<root>`.
pub(crate) fn shown(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

pub(crate) fn join(path: &str, key: &str) -> String {
    match (path.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (false, true) => path.to_string(),
        (false, false) => format!("{path}.{key}"),
    }
}
