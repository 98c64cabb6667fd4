//! The role vocabulary schemas annotate scopes with.
//!
//! Role strings are decoded once, at load time. An unknown string is an
//! error rather than a silently ignored scope.

use benchfold_kernel::ValueKind;
use std::fmt;

/// Where a value scope reads its literal from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// Keep the literal's own kind.
    Inferred,
    /// Coerce to a declared kind.
    Typed(ValueKind),
}

/// Sub-roles that name or describe the enclosing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    Id,
    Name,
    Description,
    Unit,
    Message,
}

/// Sub-roles read by a threshold scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdParameter {
    Method,
    Minimum,
    Maximum,
    Delta,
    Percentage,
    IgnoreNegativeDeltas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Object,
    Array,
    /// A result; `full` means the scope's own content is the literal.
    Result { full: bool },
    Parameter { full: bool },
    /// Its key being present is the value.
    BooleanKey,
    Threshold,
    Attribute(AttributeRole),
    Value(ValueSource),
    ThresholdParameter(ThresholdParameter),
    /// Declared without a role; contributes nothing.
    Ignored,
}

impl Role {
    /// Scopes the interpreter descends into when walking a parent.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Object
                | Self::Array
                | Self::Result { .. }
                | Self::Parameter { .. }
                | Self::BooleanKey
                | Self::Threshold
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Result { full: false } => "result",
            Self::Result { full: true } => "result-full",
            Self::Parameter { full: false } => "parameter",
            Self::Parameter { full: true } => "parameter-full",
            Self::BooleanKey => "booleankey",
            Self::Threshold => "threshold",
            Self::Attribute(AttributeRole::Id) => "id",
            Self::Attribute(AttributeRole::Name) => "name",
            Self::Attribute(AttributeRole::Description) => "description",
            Self::Attribute(AttributeRole::Unit) => "unit",
            Self::Attribute(AttributeRole::Message) => "message",
            Self::Value(ValueSource::Inferred) => "value",
            Self::Value(ValueSource::Typed(kind)) => kind.as_str(),
            Self::ThresholdParameter(ThresholdParameter::Method) => "method",
            Self::ThresholdParameter(ThresholdParameter::Minimum) => "minimum",
            Self::ThresholdParameter(ThresholdParameter::Maximum) => "maximum",
            Self::ThresholdParameter(ThresholdParameter::Delta) => "delta",
            Self::ThresholdParameter(ThresholdParameter::Percentage) => "percentage",
            Self::ThresholdParameter(ThresholdParameter::IgnoreNegativeDeltas) => {
                "ignore-negative-deltas"
            }
            Self::Ignored => "",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let role = match s.trim().to_lowercase().replace('_', "-").as_str() {
            "object" | "group" => Self::Object,
            "array" => Self::Array,
            "result" => Self::Result { full: false },
            "result-full" | "resultfull" => Self::Result { full: true },
            "parameter" => Self::Parameter { full: false },
            "parameter-full" | "parameterfull" => Self::Parameter { full: true },
            "booleankey" | "boolean-key" => Self::BooleanKey,
            "threshold" => Self::Threshold,
            "id" => Self::Attribute(AttributeRole::Id),
            "name" => Self::Attribute(AttributeRole::Name),
            "description" => Self::Attribute(AttributeRole::Description),
            "unit" => Self::Attribute(AttributeRole::Unit),
            "message" => Self::Attribute(AttributeRole::Message),
            "value" => Self::Value(ValueSource::Inferred),
            "boolean" => Self::Value(ValueSource::Typed(ValueKind::Boolean)),
            "integer" => Self::Value(ValueSource::Typed(ValueKind::Integer)),
            "double" => Self::Value(ValueSource::Typed(ValueKind::Double)),
            "string" => Self::Value(ValueSource::Typed(ValueKind::String)),
            "method" => Self::ThresholdParameter(ThresholdParameter::Method),
            "minimum" => Self::ThresholdParameter(ThresholdParameter::Minimum),
            "maximum" => Self::ThresholdParameter(ThresholdParameter::Maximum),
            "delta" => Self::ThresholdParameter(ThresholdParameter::Delta),
            "percentage" => Self::ThresholdParameter(ThresholdParameter::Percentage),
            "ignore-negative-deltas" | "ignorenegativedeltas" => {
                Self::ThresholdParameter(ThresholdParameter::IgnoreNegativeDeltas)
            }
            _ => return Err(s.to_string()),
        };
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_round_trips_through_its_name() {
        let roles = [
            Role::Object,
            Role::Array,
            Role::Result { full: false },
            Role::Result { full: true },
            Role::Parameter { full: false },
            Role::Parameter { full: true },
            Role::BooleanKey,
            Role::Threshold,
            Role::Attribute(AttributeRole::Message),
            Role::Value(ValueSource::Inferred),
            Role::Value(ValueSource::Typed(ValueKind::Double)),
            Role::ThresholdParameter(ThresholdParameter::IgnoreNegativeDeltas),
        ];
        for role in roles {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn role_names_are_case_and_separator_insensitive() {
        assert_eq!("Result_Full".parse::<Role>(), Ok(Role::Result { full: true }));
        assert_eq!("BOOLEANKEY".parse::<Role>(), Ok(Role::BooleanKey));
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert_eq!("histogram".parse::<Role>(), Err("histogram".to_string()));
    }
}
