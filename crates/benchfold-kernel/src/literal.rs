//! Typed literals observed in content documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared or inferred type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Integer,
    Double,
    String,
}

impl ValueKind {
    /// Whether threshold rules and numeric statistics apply.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Double)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "boolean" | "bool" => Ok(Self::Boolean),
            "integer" | "int" => Ok(Self::Integer),
            "double" | "float" | "number" => Ok(Self::Double),
            "string" | "text" => Ok(Self::String),
            _ => Err(format!("unknown value type: {s}")),
        }
    }
}

/// A raw value as it appears in one build's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

/// A literal could not be read as the declared type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot read `{literal}` as {expected}")]
pub struct CoercionError {
    pub expected: ValueKind,
    pub literal: String,
}

impl Literal {
    /// The literal's own runtime kind.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Double(_) => ValueKind::Double,
            Self::String(_) => ValueKind::String,
        }
    }

    /// Numeric view; `None` for booleans and strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read this literal as `kind`.
    ///
    /// Strings are parsed; integers widen to doubles; doubles narrow to
    /// integers only when integral. Anything may become a string.
    pub fn coerce(&self, kind: ValueKind) -> Result<Literal, CoercionError> {
        let fail = || CoercionError {
            expected: kind,
            literal: self.to_string(),
        };
        match (kind, self) {
            (ValueKind::String, Self::String(_)) => Ok(self.clone()),
            (ValueKind::String, other) => Ok(Self::String(other.to_string())),

            (ValueKind::Boolean, Self::Boolean(_)) => Ok(self.clone()),
            (ValueKind::Boolean, Self::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(Self::Boolean(true)),
                "false" => Ok(Self::Boolean(false)),
                _ => Err(fail()),
            },
            (ValueKind::Boolean, _) => Err(fail()),

            (ValueKind::Integer, Self::Integer(_)) => Ok(self.clone()),
            (ValueKind::Integer, Self::Double(d)) => {
                if d.is_finite() && d.fract() == 0.0 && d.abs() < i64::MAX as f64 {
                    Ok(Self::Integer(*d as i64))
                } else {
                    Err(fail())
                }
            }
            (ValueKind::Integer, Self::String(s)) => {
                s.trim().parse::<i64>().map(Self::Integer).map_err(|_| fail())
            }
            (ValueKind::Integer, Self::Boolean(_)) => Err(fail()),

            (ValueKind::Double, Self::Double(_)) => Ok(self.clone()),
            (ValueKind::Double, Self::Integer(i)) => Ok(Self::Double(*i as f64)),
            (ValueKind::Double, Self::String(s)) => match s.trim().parse::<f64>() {
                Ok(d) if d.is_finite() => Ok(Self::Double(d)),
                _ => Err(fail()),
            },
            (ValueKind::Double, Self::Boolean(_)) => Err(fail()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => f.write_str(s),
        }
    }
}
