//! Thresholds supplied from outside the schema.
//!
//! A catalog entry targets results by test name and test group (the
//! result's group label). An empty selector matches anything, so an entry
//! with both selectors empty applies to every result.

use crate::threshold::{ThresholdError, ThresholdRule, ThresholdSpec};
use serde::{Deserialize, Serialize};

/// One externally supplied rule and the results it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraThreshold {
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub test_group: String,
    pub rule: ThresholdRule,
}

impl ExtraThreshold {
    pub fn applies_to(&self, name: &str, group: &str) -> bool {
        (self.test_name.is_empty() || self.test_name == name)
            && (self.test_group.is_empty() || self.test_group == group)
    }
}

/// Ordered set of extra thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdCatalog {
    entries: Vec<ExtraThreshold>,
}

impl ThresholdCatalog {
    pub fn new(entries: Vec<ExtraThreshold>) -> Self {
        Self { entries }
    }

    /// Validate and add a loosely-typed declaration.
    pub fn declare(
        &mut self,
        test_name: impl Into<String>,
        test_group: impl Into<String>,
        spec: &ThresholdSpec,
    ) -> Result<(), ThresholdError> {
        self.entries.push(ExtraThreshold {
            test_name: test_name.into(),
            test_group: test_group.into(),
            rule: ThresholdRule::from_spec(spec)?,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rules targeting a result named `name` in group `group`.
    pub fn rules_for<'a>(
        &'a self,
        name: &'a str,
        group: &'a str,
    ) -> impl Iterator<Item = &'a ThresholdRule> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.applies_to(name, group))
            .map(|e| &e.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(method: &str, delta: f64) -> ThresholdSpec {
        ThresholdSpec {
            method: method.into(),
            delta: Some(delta),
            ..ThresholdSpec::default()
        }
    }

    #[test]
    fn empty_selectors_match_every_result() {
        let mut catalog = ThresholdCatalog::default();
        catalog.declare("", "", &spec("delta", 1.0)).unwrap();
        assert_eq!(catalog.rules_for("latency", "sort").count(), 1);
        assert_eq!(catalog.rules_for("anything", "").count(), 1);
    }

    #[test]
    fn selectors_match_exactly() {
        let mut catalog = ThresholdCatalog::default();
        catalog.declare("latency", "sort", &spec("delta", 1.0)).unwrap();
        catalog.declare("", "io", &spec("delta_average", 2.0)).unwrap();

        assert_eq!(catalog.rules_for("latency", "sort").count(), 1);
        assert_eq!(catalog.rules_for("latency", "sort.inner").count(), 0);
        assert_eq!(catalog.rules_for("throughput", "io").count(), 1);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn invalid_declarations_are_not_added() {
        let mut catalog = ThresholdCatalog::default();
        assert!(catalog.declare("", "", &spec("median", 1.0)).is_err());
        assert!(catalog.is_empty());
    }
}
