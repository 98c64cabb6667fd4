//! The schema-driven interpretation algorithm.
//!
//! One walk serves both syntaxes: the schema tree is followed top-down and
//! each scope asks the content for the nodes it names through
//! [`ContentNode`]. Every scope produces at most one group or value, plus
//! any threshold rules it declares, into the builder of its parent.

use crate::content::ContentNode;
use crate::role::{AttributeRole, Role, ThresholdParameter, ValueSource};
use crate::schema::{Schema, Scope};
use benchfold_kernel::{
    BenchError, FailureSet, Literal, NamePath, NodeBuilder, ThresholdRule, ThresholdSpec,
    TreeError, ValueKind, ValueRole,
};
use std::collections::BTreeMap;
use tracing::debug;

const ELLIPSIS: &str = "...";

/// Presentation options applied while interpreting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpretOptions {
    /// Cap on description and message length, in characters.
    pub truncate: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpretError {
    /// A scope could not be read; `path` is its fully-qualified name.
    #[error("{path}: {source}")]
    Scope {
        path: String,
        #[source]
        source: BenchError,
    },

    #[error("{document}: {source}")]
    Tree {
        document: String,
        #[source]
        source: TreeError,
    },

    #[error("{document}: content is neither valid JSON ({json}) nor valid XML ({xml})")]
    Content {
        document: String,
        json: String,
        xml: String,
    },
}

impl InterpretError {
    fn at(path: &NamePath, source: impl Into<BenchError>) -> Self {
        Self::Scope {
            path: path.dotted(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Attributes {
    id: Option<i64>,
    name: Option<String>,
    description: Option<String>,
    unit: Option<String>,
    messages: BTreeMap<String, String>,
}

pub struct Interpreter<'s> {
    schema: &'s Schema,
    options: InterpretOptions,
}

impl<'s> Interpreter<'s> {
    pub fn new(schema: &'s Schema, options: InterpretOptions) -> Self {
        Self { schema, options }
    }

    /// Interpret a document whose root content node is `root` into `file`.
    ///
    /// `root_key` names the root when the schema gives it no name; a root
    /// object without a name is transparent and its children attach to
    /// `file` directly.
    pub fn interpret<N: ContentNode>(
        &self,
        root: N,
        root_key: &str,
        file: &mut NodeBuilder,
        file_path: &NamePath,
    ) -> Result<(), InterpretError> {
        let scope = self.schema.root();
        let inherited = FailureSet::default();
        if scope.role == Role::Object && self.attributes(scope, root, file_path)?.name.is_none() {
            debug!(path = %file_path, "unnamed root object attaches to the file group");
            let failures = inherited.scoped(&scope.failures);
            return self.descend(scope, root, &failures, file_path, file, false);
        }
        self.visit(scope, root_key, root, &inherited, file_path, file)
    }

    fn visit<N: ContentNode>(
        &self,
        scope: &Scope,
        key: &str,
        node: N,
        inherited: &FailureSet,
        path: &NamePath,
        parent: &mut NodeBuilder,
    ) -> Result<(), InterpretError> {
        let failures = inherited.scoped(&scope.failures);
        match scope.role {
            Role::Object | Role::Array => {
                let attrs = self.attributes(scope, node, path)?;
                let name = attrs.name.unwrap_or_else(|| key.to_string());
                let here = path.child(name.as_str());
                let mut group = if scope.role == Role::Array {
                    NodeBuilder::array(name)
                } else {
                    NodeBuilder::group(name)
                };
                group.set_description(attrs.description);
                self.descend(scope, node, &failures, &here, &mut group, false)?;
                if let Some(items) = &scope.items {
                    for (index, item) in node.items(&items.key).into_iter().enumerate() {
                        self.visit(items, &index.to_string(), item, &failures, &here, &mut group)?;
                    }
                }
                parent.push_child(group);
            }
            Role::Result { full } => {
                self.visit_value(scope, key, node, &failures, path, parent, ValueRole::Result, full)?
            }
            Role::Parameter { full } => self.visit_value(
                scope,
                key,
                node,
                &failures,
                path,
                parent,
                ValueRole::Parameter,
                full,
            )?,
            Role::BooleanKey => self.push_boolean_key(scope, &failures, parent),
            Role::Threshold => {
                let rule = self.threshold(scope, node, &path.child(key))?;
                parent.push_threshold(rule);
            }
            Role::Attribute(_) | Role::Value(_) | Role::ThresholdParameter(_) | Role::Ignored => {}
        }
        Ok(())
    }

    /// Walk the structural children of `scope` into `target`. Inside a
    /// value, boolean keys are value sources and are not emitted again.
    fn descend<N: ContentNode>(
        &self,
        scope: &Scope,
        node: N,
        failures: &FailureSet,
        path: &NamePath,
        target: &mut NodeBuilder,
        in_value: bool,
    ) -> Result<(), InterpretError> {
        for child in &scope.children {
            match child.role {
                Role::BooleanKey => {
                    if !in_value && node.contains(&child.key) {
                        self.push_boolean_key(child, &failures.scoped(&child.failures), target);
                    }
                }
                role if role.is_structural() => match node.child(&child.key) {
                    Some(content) => {
                        self.visit(child, &child.key, content, failures, path, target)?
                    }
                    None => debug!(path = %path, key = %child.key, "declared scope absent from content"),
                },
                _ => {}
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_value<N: ContentNode>(
        &self,
        scope: &Scope,
        key: &str,
        node: N,
        failures: &FailureSet,
        path: &NamePath,
        parent: &mut NodeBuilder,
        role: ValueRole,
        full: bool,
    ) -> Result<(), InterpretError> {
        if full {
            match node.literal() {
                Some(literal) => push_inferred(key, role, literal, failures, parent),
                None => {
                    // An object under a bare self-contained scope yields one
                    // value per scalar member.
                    for (member, content) in node.members() {
                        match content.literal() {
                            Some(literal) => {
                                push_inferred(&member, role, literal, failures, parent)
                            }
                            None => debug!(
                                path = %path.child(member.as_str()),
                                "self-contained member has no literal"
                            ),
                        }
                    }
                }
            }
            return Ok(());
        }

        let attrs = self.attributes(scope, node, path)?;
        let name = attrs.name.unwrap_or_else(|| key.to_string());
        let here = path.child(name.as_str());
        let Some((literal, source)) = self.resolve_value(scope, node, &here)? else {
            debug!(path = %here, "value scope resolved no literal");
            return Ok(());
        };
        let judged = match source {
            Some(source) => failures.scoped(&source.failures),
            None => failures.clone(),
        };

        let mut value = NodeBuilder::value(name, role, literal.clone());
        value.set_description(attrs.description);
        value.set_unit(attrs.unit);
        if let Some(property) = value.property_mut() {
            property.failed = judged.is_failure(&literal);
            property.id = attrs.id;
            property.messages = attrs.messages;
        }
        self.descend(scope, node, failures, &here, &mut value, true)?;
        parent.push_child(value);
        Ok(())
    }

    /// First value sub-role that resolves, else the node's own literal.
    fn resolve_value<'a, N: ContentNode>(
        &self,
        scope: &'a Scope,
        node: N,
        path: &NamePath,
    ) -> Result<Option<(Literal, Option<&'a Scope>)>, InterpretError> {
        let mut declared: Option<(ValueSource, &'a Scope)> = None;
        for child in &scope.children {
            match child.role {
                Role::Value(source) => {
                    if declared.is_none() {
                        declared = Some((source, child));
                    }
                    if let Some(raw) = node.child(&child.key).and_then(|n| n.literal()) {
                        let literal = coerce(raw, source, &path.child(child.key.as_str()))?;
                        return Ok(Some((literal, Some(child))));
                    }
                }
                Role::BooleanKey => {
                    if node.contains(&child.key) {
                        return Ok(Some((Literal::String(child.key.clone()), Some(child))));
                    }
                }
                _ => {}
            }
        }

        let Some(raw) = node.literal() else {
            return Ok(None);
        };
        match declared {
            Some((source, child)) => Ok(Some((coerce(raw, source, path)?, Some(child)))),
            None => Ok(Some((raw, None))),
        }
    }

    fn push_boolean_key(&self, scope: &Scope, failures: &FailureSet, parent: &mut NodeBuilder) {
        let literal = Literal::String(scope.key.clone());
        let mut value = NodeBuilder::value(scope.key.as_str(), ValueRole::Result, literal.clone());
        if let Some(property) = value.property_mut() {
            property.failed = failures.is_failure(&literal);
        }
        parent.push_child(value);
    }

    fn attributes<N: ContentNode>(
        &self,
        scope: &Scope,
        node: N,
        path: &NamePath,
    ) -> Result<Attributes, InterpretError> {
        let mut attrs = Attributes::default();
        for child in &scope.children {
            let Role::Attribute(role) = child.role else {
                continue;
            };
            let Some(literal) = node.child(&child.key).and_then(|n| n.literal()) else {
                continue;
            };
            match role {
                AttributeRole::Id => {
                    if attrs.id.is_none() {
                        let id = literal
                            .coerce(ValueKind::Integer)
                            .map_err(|e| InterpretError::at(&path.child(child.key.as_str()), e))?;
                        if let Literal::Integer(id) = id {
                            attrs.id = Some(id);
                        }
                    }
                }
                AttributeRole::Name => {
                    if attrs.name.is_none() {
                        attrs.name = Some(literal.to_string());
                    }
                }
                AttributeRole::Description => {
                    if attrs.description.is_none() {
                        attrs.description = Some(self.clip(literal.to_string()));
                    }
                }
                AttributeRole::Unit => {
                    if attrs.unit.is_none() {
                        attrs.unit = Some(literal.to_string());
                    }
                }
                AttributeRole::Message => {
                    let text = self.clip(literal.to_string());
                    attrs.messages.entry(child.key.clone()).or_insert(text);
                }
            }
        }
        Ok(attrs)
    }

    fn threshold<N: ContentNode>(
        &self,
        scope: &Scope,
        node: N,
        path: &NamePath,
    ) -> Result<ThresholdRule, InterpretError> {
        let mut spec = ThresholdSpec::default();
        for child in &scope.children {
            let Role::ThresholdParameter(parameter) = child.role else {
                continue;
            };
            let Some(literal) = node.child(&child.key).and_then(|n| n.literal()) else {
                continue;
            };
            let here = path.child(child.key.as_str());
            match parameter {
                ThresholdParameter::Method => {
                    if spec.method.is_empty() {
                        spec.method = literal.to_string();
                    }
                }
                ThresholdParameter::Minimum => {
                    if spec.minimum.is_none() {
                        spec.minimum = Some(number(&literal, &here)?);
                    }
                }
                ThresholdParameter::Maximum => {
                    if spec.maximum.is_none() {
                        spec.maximum = Some(number(&literal, &here)?);
                    }
                }
                ThresholdParameter::Delta => {
                    if spec.delta.is_none() {
                        spec.delta = Some(number(&literal, &here)?);
                    }
                }
                ThresholdParameter::Percentage => {
                    if spec.percentage.is_none() {
                        spec.percentage = Some(number(&literal, &here)?);
                    }
                }
                ThresholdParameter::IgnoreNegativeDeltas => {
                    if spec.ignore_negative_deltas.is_none() {
                        let flag = literal
                            .coerce(ValueKind::Boolean)
                            .map_err(|e| InterpretError::at(&here, e))?;
                        spec.ignore_negative_deltas = flag.as_bool();
                    }
                }
            }
        }
        ThresholdRule::from_spec(&spec).map_err(|e| InterpretError::at(path, e))
    }

    fn clip(&self, text: String) -> String {
        match self.options.truncate {
            Some(limit) if text.chars().count() > limit => {
                let mut clipped: String = text.chars().take(limit).collect();
                clipped.push_str(ELLIPSIS);
                clipped
            }
            _ => text,
        }
    }
}

fn push_inferred(
    name: &str,
    role: ValueRole,
    literal: Literal,
    failures: &FailureSet,
    parent: &mut NodeBuilder,
) {
    let mut value = NodeBuilder::value(name, role, literal.clone());
    if let Some(property) = value.property_mut() {
        property.failed = failures.is_failure(&literal);
    }
    parent.push_child(value);
}

fn coerce(raw: Literal, source: ValueSource, path: &NamePath) -> Result<Literal, InterpretError> {
    match source {
        ValueSource::Inferred => Ok(raw),
        ValueSource::Typed(kind) => raw.coerce(kind).map_err(|e| InterpretError::at(path, e)),
    }
}

fn number(literal: &Literal, path: &NamePath) -> Result<f64, InterpretError> {
    literal
        .coerce(ValueKind::Double)
        .map(|d| d.as_f64().unwrap_or_default())
        .map_err(|e| InterpretError::at(path, e))
}
