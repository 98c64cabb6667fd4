//! Pass/fail outcomes of one condensation.

use crate::identity::StableHash;
use crate::threshold::Violation;
use crate::tree::BuildNumber;
use serde::{Deserialize, Serialize};

/// Outcome for one value in one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub hash: StableHash,

    /// Dotted name path of the value.
    pub path: String,

    pub build: BuildNumber,

    /// A failure predicate matched the raw value.
    pub failed_predicate: bool,

    /// Threshold rules the value broke.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl Verdict {
    pub fn is_failing(&self) -> bool {
        self.failed_predicate || !self.violations.is_empty()
    }

    fn sort_key(&self) -> (&str, BuildNumber, &str) {
        (&self.path, self.build, &self.hash.0)
    }
}

/// Overall result of a condensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
}

/// All verdicts of one condensation, ordered by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictReport {
    pub result: Outcome,
    pub verdicts: Vec<Verdict>,
}

impl VerdictReport {
    /// Sorts verdicts and derives the overall result.
    pub fn new(mut verdicts: Vec<Verdict>) -> Self {
        verdicts.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let result = if verdicts.iter().any(Verdict::is_failing) {
            Outcome::Failed
        } else {
            Outcome::Passed
        };
        Self { result, verdicts }
    }

    pub fn failed(&self) -> bool {
        self.result == Outcome::Failed
    }

    pub fn failing(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| v.is_failing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::{Basis, ThresholdMethod};

    fn verdict(path: &str, failed_predicate: bool) -> Verdict {
        Verdict {
            hash: StableHash::from_dotted(path),
            path: path.to_string(),
            build: 3,
            failed_predicate,
            violations: Vec::new(),
        }
    }

    #[test]
    fn report_passes_when_nothing_fails() {
        let report = VerdictReport::new(vec![verdict("b", false), verdict("a", false)]);
        assert!(!report.failed());
        assert_eq!(report.verdicts[0].path, "a");
    }

    #[test]
    fn violation_alone_fails_the_report() {
        let mut v = verdict("a", false);
        v.violations.push(Violation {
            method: ThresholdMethod::Delta,
            value: 13.0,
            limit: 2.0,
            deviation: 3.0,
            basis: Basis::Previous(10.0),
        });
        let report = VerdictReport::new(vec![v, verdict("b", false)]);
        assert!(report.failed());
        assert_eq!(report.failing().count(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["result"], "failed");
        assert_eq!(json["verdicts"][0]["failedPredicate"], false);
    }
}
