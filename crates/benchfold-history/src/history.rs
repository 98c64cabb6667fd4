//! Keyed per-build history and its merge.
//!
//! A [`History`] keeps every sample of every value keyed by build number,
//! which makes merging two of them a plain union. Partials folded by
//! different workers over disjoint build ranges therefore combine in any
//! grouping, and [`History::finalize`] replays the union in build order
//! through the same fold a sequential condensation uses.
//!
//! Merging is defined over raw histories rather than over two finished
//! summaries. A running standard deviation and `previous` depend on the
//! order samples were folded in, and two summaries cannot be combined into
//! the result a single ordered fold would give. While a rebuild is in
//! flight it therefore holds every sample of the chain; the bounded
//! [`Summary`] exists only once [`History::finalize`] has run.

use crate::summary::{Summary, ValueIdentity};
use benchfold_kernel::{BuildNumber, Literal, ResultTree, StableHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub literal: Literal,
    pub failed: bool,
}

/// All samples of one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub identity: ValueIdentity,
    pub samples: BTreeMap<BuildNumber, Sample>,
}

impl Track {
    pub fn newest(&self) -> Option<BuildNumber> {
        self.samples.keys().next_back().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    tracks: BTreeMap<StableHash, Track>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, hash: &StableHash) -> Option<&Track> {
        self.tracks.get(hash)
    }

    /// Every build with at least one sample.
    pub fn builds(&self) -> Vec<BuildNumber> {
        let mut builds: Vec<BuildNumber> = self
            .tracks
            .values()
            .flat_map(|t| t.samples.keys().copied())
            .collect();
        builds.sort_unstable();
        builds.dedup();
        builds
    }

    /// Record every sample of an interpreted tree.
    pub fn record(&mut self, tree: &ResultTree) {
        for (id, node, value) in tree.values() {
            let identity = ValueIdentity::of(tree, id, node, value);
            for (build, literal) in &value.samples {
                self.push(
                    &identity,
                    *build,
                    Sample {
                        literal: literal.clone(),
                        failed: value.failed_at(*build),
                    },
                );
            }
        }
    }

    /// Add one sample. A build already present keeps its first sample.
    pub fn push(&mut self, identity: &ValueIdentity, build: BuildNumber, sample: Sample) {
        let track = self
            .tracks
            .entry(identity.hash.clone())
            .or_insert_with(|| Track {
                identity: identity.clone(),
                samples: BTreeMap::new(),
            });
        if track.newest().is_some_and(|newest| build > newest) {
            track.identity = identity.clone();
        }
        track.samples.entry(build).or_insert(sample);
    }

    /// Union of two histories.
    ///
    /// Where both hold a sample for the same build, `self`'s is kept. Each
    /// value's identity comes from whichever side holds its newest build,
    /// `self` on a tie.
    pub fn merge(mut self, other: History) -> History {
        for (hash, theirs) in other.tracks {
            match self.tracks.entry(hash) {
                Entry::Vacant(slot) => {
                    slot.insert(theirs);
                }
                Entry::Occupied(mut slot) => {
                    let ours = slot.get_mut();
                    if theirs.newest() > ours.newest() {
                        ours.identity = theirs.identity;
                    }
                    for (build, sample) in theirs.samples {
                        ours.samples.entry(build).or_insert(sample);
                    }
                }
            }
        }
        self
    }

    /// Replay every track in build order into a fresh summary.
    pub fn finalize(&self) -> Summary {
        let mut summary = Summary::new();
        for track in self.tracks.values() {
            for (build, sample) in &track.samples {
                summary.fold(&track.identity, *build, &sample.literal, sample.failed);
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchfold_kernel::{ValueKind, ValueRole};

    fn identity(unit: &str) -> ValueIdentity {
        ValueIdentity {
            hash: StableHash::from_dotted("f.json.t"),
            file: Some(StableHash::from_dotted("f.json")),
            path: "f.json.t".into(),
            name: "t".into(),
            group: "f.json".into(),
            description: None,
            unit: Some(unit.into()),
            kind: ValueKind::Double,
            role: ValueRole::Result,
        }
    }

    fn history(unit: &str, samples: &[(BuildNumber, f64)]) -> History {
        let mut history = History::new();
        for (build, x) in samples {
            history.push(
                &identity(unit),
                *build,
                Sample {
                    literal: Literal::Double(*x),
                    failed: false,
                },
            );
        }
        history
    }

    #[test]
    fn merge_is_a_left_biased_union() {
        let a = history("a", &[(1, 1.0), (2, 2.0)]);
        let b = history("b", &[(2, 20.0), (3, 3.0)]);
        let merged = a.merge(b);

        let track = merged.track(&StableHash::from_dotted("f.json.t")).unwrap();
        let values: Vec<(BuildNumber, Literal)> = track
            .samples
            .iter()
            .map(|(b, s)| (*b, s.literal.clone()))
            .collect();
        assert_eq!(
            values,
            vec![
                (1, Literal::Double(1.0)),
                (2, Literal::Double(2.0)),
                (3, Literal::Double(3.0)),
            ]
        );
        assert_eq!(track.identity.unit.as_deref(), Some("b"));
        assert_eq!(merged.builds(), vec![1, 2, 3]);
    }

    #[test]
    fn merge_grouping_does_not_matter() {
        let a = || history("a", &[(1, 1.0), (4, 4.0)]);
        let b = || history("b", &[(2, 2.0)]);
        let c = || history("c", &[(3, 3.0), (4, 40.0)]);

        let left = a().merge(b()).merge(c());
        let right = a().merge(b().merge(c()));
        assert_eq!(left, right);
    }

    #[test]
    fn finalize_matches_a_sequential_fold() {
        let samples = [(1, 3.0), (2, 5.0), (3, 4.0)];
        let summary = history("ms", &samples).finalize();

        let mut sequential = Summary::new();
        for (build, x) in samples {
            sequential.fold(&identity("ms"), build, &Literal::Double(x), false);
        }
        assert_eq!(summary, sequential);
    }
}
