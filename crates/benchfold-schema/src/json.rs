//! JSON bindings: schema decoding and the JSON content view.

use crate::content::ContentNode;
use crate::role::Role;
use crate::schema::{Schema, SchemaError, SchemaFormat, Scope, join, shown};
use benchfold_kernel::{FailurePredicate, Literal, PredicateError};
use serde_json::{Map, Value};

const TYPE_KEY: &str = "type";
const PROPERTIES_KEY: &str = "properties";
const ITEMS_KEY: &str = "items";
const FAILURE_KEY: &str = "failure";

pub fn parse_schema(text: &str) -> Result<Schema, SchemaError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SchemaError::Format {
        json: e.to_string(),
        xml: String::new(),
    })?;
    let root = decode_scope("", &value, "")?;
    Schema::new(root, SchemaFormat::Json)
}

fn malformed(path: &str, message: &str) -> SchemaError {
    SchemaError::Malformed {
        path: shown(path),
        message: message.to_string(),
    }
}

fn decode_scope(key: &str, value: &Value, path: &str) -> Result<Scope, SchemaError> {
    let Some(obj) = value.as_object() else {
        return Err(malformed(path, "scope must be an object"));
    };

    let role = match obj.get(TYPE_KEY) {
        None => Role::Ignored,
        Some(Value::String(name)) => name.parse().map_err(|role| SchemaError::UnknownRole {
            path: shown(path),
            role,
        })?,
        Some(_) => return Err(malformed(path, "`type` must be a string")),
    };

    let mut scope = Scope::new(key, role);
    if let Some(failures) = obj.get(FAILURE_KEY) {
        scope.failures = decode_failures(failures, path)?;
    }
    match obj.get(PROPERTIES_KEY) {
        None => {}
        Some(Value::Object(properties)) => {
            for (child_key, child) in properties {
                scope
                    .children
                    .push(decode_scope(child_key, child, &join(path, child_key))?);
            }
        }
        Some(_) => return Err(malformed(path, "`properties` must be an object")),
    }
    if let Some(items) = obj.get(ITEMS_KEY) {
        scope.items = Some(Box::new(decode_scope("", items, path)?));
    }
    Ok(scope)
}

fn decode_failures(value: &Value, path: &str) -> Result<Vec<FailurePredicate>, SchemaError> {
    match value {
        Value::Array(list) => list.iter().map(|v| decode_failure(v, path)).collect(),
        other => Ok(vec![decode_failure(other, path)?]),
    }
}

fn decode_failure(value: &Value, path: &str) -> Result<FailurePredicate, SchemaError> {
    let Some(obj) = value.as_object() else {
        return Err(malformed(path, "failure must be an object"));
    };
    if let Some(key) = obj.get("key") {
        let Some(key) = key.as_str() else {
            return Err(malformed(path, "failure `key` must be a string"));
        };
        return Ok(FailurePredicate::StringEqualsKey {
            key: key.to_string(),
        });
    }
    let predicate_error = |source| SchemaError::Predicate {
        path: shown(path),
        source,
    };
    let literal = obj
        .get("value")
        .and_then(json_literal)
        .ok_or_else(|| predicate_error(PredicateError::MissingValue))?;
    let compare = match obj.get("compare") {
        None => None,
        Some(Value::String(op)) => Some(op.as_str()),
        Some(_) => return Err(malformed(path, "failure `compare` must be a string")),
    };
    FailurePredicate::from_literal(&literal, compare).map_err(predicate_error)
}

/// Scalar JSON values as literals; `null`, arrays and objects have none.
pub fn json_literal(value: &Value) -> Option<Literal> {
    match value {
        Value::Bool(b) => Some(Literal::Boolean(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Literal::Integer(i)),
            None => n.as_f64().map(Literal::Double),
        },
        Value::String(s) => Some(Literal::String(s.clone())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A position in a parsed JSON content document.
#[derive(Debug, Clone, Copy)]
pub struct JsonNode<'a> {
    value: &'a Value,
}

impl<'a> JsonNode<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn object(&self) -> Option<&'a Map<String, Value>> {
        self.value.as_object()
    }
}

impl ContentNode for JsonNode<'_> {
    fn child(&self, key: &str) -> Option<Self> {
        self.object()?.get(key).map(JsonNode::new)
    }

    fn items(&self, _item_key: &str) -> Vec<Self> {
        match self.value {
            Value::Array(list) => list.iter().map(JsonNode::new).collect(),
            Value::Object(map) => map.values().map(JsonNode::new).collect(),
            _ => Vec::new(),
        }
    }

    fn members(&self) -> Vec<(String, Self)> {
        self.object()
            .map(|map| {
                map.iter()
                    .map(|(key, value)| (key.clone(), JsonNode::new(value)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn literal(&self) -> Option<Literal> {
        json_literal(self.value)
    }
}
