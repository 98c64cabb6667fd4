//! The condensed summary: per-value running statistics.
//!
//! Raw samples are not kept. Each entry holds the value's descriptive
//! identity and a [`Statistics`] fold over every sample seen so far, where
//! only passing numeric samples move `previous`, the bounds, the average
//! and the standard deviation.

use benchfold_kernel::{
    BuildNumber, GroupClass, Literal, Node, NodeId, ResultTree, StableHash, ValueData, ValueKind,
    ValueRole,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive fields of a value, taken from its newest build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueIdentity {
    pub hash: StableHash,
    pub file: Option<StableHash>,
    pub path: String,
    pub name: String,
    pub group: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub kind: ValueKind,
    pub role: ValueRole,
}

impl ValueIdentity {
    pub fn of(tree: &ResultTree, id: NodeId, node: &Node, value: &ValueData) -> Self {
        Self {
            hash: node.hash.clone(),
            file: tree.file_group_of(id).map(|f| tree.node(f).hash.clone()),
            path: node.path.clone(),
            name: node.name.clone(),
            group: value.group_label.clone(),
            description: node.description.clone(),
            unit: value.unit.clone(),
            kind: value.kind,
            role: if node.class == GroupClass::Parameter {
                ValueRole::Parameter
            } else {
                ValueRole::Result
            },
        }
    }
}

/// Running statistics over passing samples.
///
/// The standard deviation is the population deviation. Folding uses
/// Welford's update with `m2 = std_deviation² · passed`, so an imported
/// entry continues exactly where the exported one stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub last_build: Option<BuildNumber>,
    pub previous: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub average: Option<f64>,
    pub std_deviation: Option<f64>,
    pub passed: u64,
    pub failed: u64,
}

impl Statistics {
    /// Fold one sample.
    pub fn fold(&mut self, build: BuildNumber, literal: &Literal, failed: bool) {
        self.last_build = Some(self.last_build.map_or(build, |last| last.max(build)));
        if failed {
            self.failed += 1;
            return;
        }
        let seen = self.passed as f64;
        self.passed += 1;
        let Some(x) = literal.as_f64() else {
            return;
        };
        let n = self.passed as f64;
        self.previous = Some(x);

        match self.average {
            None => {
                self.average = Some(x);
                self.std_deviation = Some(0.0);
                self.minimum = Some(x);
                self.maximum = Some(x);
            }
            Some(mean) => {
                let sd = self.std_deviation.unwrap_or(0.0);
                let m2 = sd * sd * seen;
                let delta = x - mean;
                let mean = mean + delta / n;
                let m2 = m2 + delta * (x - mean);
                self.average = Some(mean);
                self.std_deviation = Some((m2 / n).sqrt());
                self.minimum = Some(self.minimum.map_or(x, |m| m.min(x)));
                self.maximum = Some(self.maximum.map_or(x, |m| m.max(x)));
            }
        }
    }

    /// Whether `build` is at or before the newest folded build.
    pub fn covers(&self, build: BuildNumber) -> bool {
        self.last_build.is_some_and(|last| build <= last)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub identity: ValueIdentity,
    pub stats: Statistics,
}

impl SummaryEntry {
    pub fn new(identity: ValueIdentity) -> Self {
        Self {
            identity,
            stats: Statistics::default(),
        }
    }
}

/// Condensed history of a job, keyed by value identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    entries: BTreeMap<StableHash, SummaryEntry>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, hash: &StableHash) -> Option<&SummaryEntry> {
        self.entries.get(hash)
    }

    /// Entries in hash order.
    pub fn entries(&self) -> impl Iterator<Item = &SummaryEntry> {
        self.entries.values()
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&mut self, entry: SummaryEntry) -> Option<SummaryEntry> {
        self.entries.insert(entry.identity.hash.clone(), entry)
    }

    /// Fold one sample of the value described by `identity`.
    ///
    /// A sample from a build newer than anything folded so far also
    /// refreshes the entry's identity.
    pub fn fold(
        &mut self,
        identity: &ValueIdentity,
        build: BuildNumber,
        literal: &Literal,
        failed: bool,
    ) {
        let entry = self
            .entries
            .entry(identity.hash.clone())
            .or_insert_with(|| SummaryEntry::new(identity.clone()));
        if !entry.stats.covers(build) {
            entry.identity = identity.clone();
        }
        entry.stats.fold(build, literal, failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(path: &str) -> ValueIdentity {
        ValueIdentity {
            hash: StableHash::from_dotted(path),
            file: None,
            path: path.to_string(),
            name: path.rsplit('.').next().unwrap_or(path).to_string(),
            group: String::new(),
            description: None,
            unit: None,
            kind: ValueKind::Double,
            role: ValueRole::Result,
        }
    }

    fn folded(samples: &[(f64, bool)]) -> Statistics {
        let mut stats = Statistics::default();
        for (build, (x, failed)) in samples.iter().enumerate() {
            stats.fold(build as BuildNumber + 1, &Literal::Double(*x), *failed);
        }
        stats
    }

    #[test]
    fn population_statistics_over_passing_samples() {
        let stats = folded(&[(2.0, false), (4.0, false), (100.0, true), (6.0, false)]);
        assert_eq!(stats.passed, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.average, Some(4.0));
        assert_eq!(stats.minimum, Some(2.0));
        assert_eq!(stats.maximum, Some(6.0));
        assert_eq!(stats.previous, Some(6.0));
        let sd = stats.std_deviation.unwrap();
        assert!((sd - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.last_build, Some(4));
    }

    #[test]
    fn failing_samples_do_not_become_previous() {
        let stats = folded(&[(10.0, false), (50.0, true)]);
        assert_eq!(stats.previous, Some(10.0));
        assert_eq!(stats.average, Some(10.0));
    }

    #[test]
    fn equal_samples_fold_equally_under_equal_summaries() {
        let mut a = Summary::new();
        let mut b = Summary::new();
        let id = identity("f.json.sort.latency");
        for summary in [&mut a, &mut b] {
            summary.fold(&id, 1, &Literal::Double(8.0), false);
            summary.fold(&id, 2, &Literal::Double(12.0), false);
        }
        assert_eq!(a, b);

        a.fold(&id, 3, &Literal::Double(10.0), false);
        b.fold(&id, 3, &Literal::Double(10.0), false);
        let (a, b) = (&a.get(&id.hash).unwrap().stats, &b.get(&id.hash).unwrap().stats);
        assert_eq!(a.average, b.average);
        assert_eq!(a.std_deviation, b.std_deviation);
        assert_eq!((a.passed, a.failed), (b.passed, b.failed));
        assert_eq!(a.average, Some(10.0));
    }

    #[test]
    fn non_numeric_samples_only_count() {
        let mut stats = Statistics::default();
        stats.fold(1, &Literal::String("ok".into()), false);
        stats.fold(2, &Literal::Boolean(false), true);
        assert_eq!((stats.passed, stats.failed), (1, 1));
        assert_eq!(stats.average, None);
        assert_eq!(stats.previous, None);
    }

    #[test]
    fn newest_build_refreshes_identity() {
        let mut summary = Summary::new();
        let mut id = identity("f.json.t");
        summary.fold(&id, 5, &Literal::Integer(1), false);

        id.unit = Some("ms".into());
        summary.fold(&id, 3, &Literal::Integer(1), false);
        assert_eq!(summary.get(&id.hash).unwrap().identity.unit, None);

        summary.fold(&id, 6, &Literal::Integer(1), false);
        assert_eq!(
            summary.get(&id.hash).unwrap().identity.unit.as_deref(),
            Some("ms")
        );
    }
}
