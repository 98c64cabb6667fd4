//! Pass/fail predicates declared by schema scopes.
//!
//! A scope owns an ordered list of predicates. The list a value is judged
//! against is its own scope's predicates followed by every ancestor's, and
//! the value fails if any one of them matches.

use crate::literal::Literal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison used by numeric predicates: `value <op> bound` means failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
}

impl Comparator {
    pub fn holds(self, value: f64, bound: f64) -> bool {
        match self {
            Self::Less => value < bound,
            Self::LessOrEqual => value <= bound,
            Self::Equal => value == bound,
            Self::GreaterOrEqual => value >= bound,
            Self::Greater => value > bound,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "=",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Comparator {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "<" | "lt" => Ok(Self::Less),
            "<=" | "le" | "≤" => Ok(Self::LessOrEqual),
            "=" | "==" | "eq" => Ok(Self::Equal),
            ">=" | "ge" | "≥" => Ok(Self::GreaterOrEqual),
            ">" | "gt" => Ok(Self::Greater),
            _ => Err(PredicateError::UnknownComparator(s.to_string())),
        }
    }
}

/// Errors raised while constructing predicates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    #[error("unknown comparison operator `{0}`")]
    UnknownComparator(String),

    #[error("failure declaration has no value")]
    MissingValue,
}

/// One pass/fail rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailurePredicate {
    BooleanEquals { value: bool },
    NumericCompare { compare: Comparator, value: f64 },
    StringEquals { value: String },
    /// Matches a boolean-key value, whose literal is the key that was present.
    StringEqualsKey { key: String },
}

impl FailurePredicate {
    /// Build a numeric predicate from an operator string.
    pub fn numeric(compare: &str, value: f64) -> Result<Self, PredicateError> {
        Ok(Self::NumericCompare {
            compare: compare.parse()?,
            value,
        })
    }

    /// Build the predicate a declared literal implies: booleans compare for
    /// equality, numbers with `compare` (default `=`), strings for equality.
    pub fn from_literal(literal: &Literal, compare: Option<&str>) -> Result<Self, PredicateError> {
        match literal {
            Literal::Boolean(b) => Ok(Self::BooleanEquals { value: *b }),
            Literal::Integer(_) | Literal::Double(_) => {
                let value = literal.as_f64().ok_or(PredicateError::MissingValue)?;
                Self::numeric(compare.unwrap_or("="), value)
            }
            Literal::String(s) => Ok(Self::StringEquals { value: s.clone() }),
        }
    }

    pub fn matches(&self, literal: &Literal) -> bool {
        match self {
            Self::BooleanEquals { value } => literal.as_bool() == Some(*value),
            Self::NumericCompare { compare, value } => literal
                .as_f64()
                .is_some_and(|observed| compare.holds(observed, *value)),
            Self::StringEquals { value } => literal.as_str() == Some(value.as_str()),
            Self::StringEqualsKey { key } => literal.as_str() == Some(key.as_str()),
        }
    }
}

impl fmt::Display for FailurePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BooleanEquals { value } => write!(f, "== {value}"),
            Self::NumericCompare { compare, value } => write!(f, "{compare} {value}"),
            Self::StringEquals { value } => write!(f, "== \"{value}\""),
            Self::StringEqualsKey { key } => write!(f, "key {key}"),
        }
    }
}

/// Ordered predicate list in effect at one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureSet {
    predicates: Vec<FailurePredicate>,
}

impl FailureSet {
    pub fn new(predicates: Vec<FailurePredicate>) -> Self {
        Self { predicates }
    }

    /// The set seen by a nested scope: its own predicates first, then ours.
    pub fn scoped(&self, local: &[FailurePredicate]) -> Self {
        if local.is_empty() {
            return self.clone();
        }
        let mut predicates = Vec::with_capacity(local.len() + self.predicates.len());
        predicates.extend_from_slice(local);
        predicates.extend_from_slice(&self.predicates);
        Self { predicates }
    }

    /// Whether failure is possible at all in this scope.
    pub fn has_failures(&self) -> bool {
        !self.predicates.is_empty()
    }

    /// First predicate that matches `literal`, if any.
    pub fn first_match(&self, literal: &Literal) -> Option<&FailurePredicate> {
        self.predicates.iter().find(|p| p.matches(literal))
    }

    pub fn is_failure(&self, literal: &Literal) -> bool {
        self.first_match(literal).is_some()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailurePredicate> {
        self.predicates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_parse_accepts_symbols_and_words() {
        assert_eq!(">=".parse::<Comparator>().unwrap(), Comparator::GreaterOrEqual);
        assert_eq!("lt".parse::<Comparator>().unwrap(), Comparator::Less);
        assert_eq!(
            "~=".parse::<Comparator>().unwrap_err(),
            PredicateError::UnknownComparator("~=".into())
        );
    }

    #[test]
    fn inherited_numeric_predicate_applies_to_nested_value() {
        let ancestor = FailureSet::new(vec![FailurePredicate::numeric(">=", 10.0).unwrap()]);
        let nested = ancestor.scoped(&[]);

        assert!(nested.is_failure(&Literal::Integer(12)));
        assert!(!nested.is_failure(&Literal::Integer(5)));
        assert!(nested.is_failure(&Literal::Double(10.0)));
    }

    #[test]
    fn local_predicates_are_checked_before_inherited_ones() {
        let ancestor = FailureSet::new(vec![FailurePredicate::numeric(">", 100.0).unwrap()]);
        let local = [FailurePredicate::numeric(">", 50.0).unwrap()];
        let nested = ancestor.scoped(&local);

        assert_eq!(nested.len(), 2);
        assert_eq!(nested.first_match(&Literal::Double(200.0)), Some(&local[0]));
        assert!(nested.is_failure(&Literal::Double(75.0)));
        assert!(!ancestor.is_failure(&Literal::Double(75.0)));
    }

    #[test]
    fn predicates_only_match_their_own_literal_kind() {
        let yes = FailurePredicate::BooleanEquals { value: false };
        assert!(yes.matches(&Literal::Boolean(false)));
        assert!(!yes.matches(&Literal::String("false".into())));

        let text = FailurePredicate::StringEquals {
            value: "FAIL".into(),
        };
        assert!(text.matches(&Literal::String("FAIL".into())));
        assert!(!text.matches(&Literal::String("fail".into())));

        let num = FailurePredicate::numeric("=", 0.0).unwrap();
        assert!(!num.matches(&Literal::Boolean(false)));
    }

    #[test]
    fn boolean_key_predicate_matches_the_key_literal() {
        let key = FailurePredicate::StringEqualsKey {
            key: "timeout".into(),
        };
        assert!(key.matches(&Literal::String("timeout".into())));
        assert!(!key.matches(&Literal::String("crash".into())));
    }

    #[test]
    fn empty_set_means_failure_impossible() {
        let set = FailureSet::default();
        assert!(!set.has_failures());
        assert!(!set.is_failure(&Literal::Boolean(true)));
    }

    #[test]
    fn predicate_from_literal_defaults_to_equality() {
        let p = FailurePredicate::from_literal(&Literal::Integer(3), None).unwrap();
        assert_eq!(
            p,
            FailurePredicate::NumericCompare {
                compare: Comparator::Equal,
                value: 3.0
            }
        );
        assert!(FailurePredicate::from_literal(&Literal::Integer(3), Some("!!")).is_err());
    }
}
