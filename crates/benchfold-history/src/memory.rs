//! In-memory summary store for tests and embedding.

use crate::store::{StoreError, StoreKey, SummaryStore};
use crate::summary::Summary;
use benchfold_kernel::BuildNumber;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    summaries: BTreeMap<StoreKey, Summary>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Every stored key, ordered by job then position.
    pub fn keys(&self) -> impl Iterator<Item = &StoreKey> {
        self.summaries.keys()
    }
}

impl SummaryStore for MemoryStore {
    fn load(&self, key: &StoreKey) -> Result<Option<Summary>, StoreError> {
        Ok(self.summaries.get(key).cloned())
    }

    fn save(&mut self, key: &StoreKey, summary: &Summary) -> Result<(), StoreError> {
        self.summaries.insert(key.clone(), summary.clone());
        Ok(())
    }

    fn positions(&self, job: &str) -> Result<Vec<BuildNumber>, StoreError> {
        Ok(self
            .summaries
            .keys()
            .filter(|key| key.job == job)
            .map(|key| key.position)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::condense_with_store;
    use benchfold_kernel::{
        Literal, NodeBuilder, ResultTree, ThresholdCatalog, ThresholdRule, TreeBuilder, ValueRole,
    };

    fn tree(build: BuildNumber, ms: f64) -> ResultTree {
        let mut value = NodeBuilder::value("ms", ValueRole::Result, Literal::Double(ms));
        value.push_threshold(ThresholdRule::Delta {
            delta: 2.0,
            ignore_negative_deltas: false,
        });
        let mut file = NodeBuilder::file_group("bench.json", "bench.json");
        file.push_child(value);
        let mut builder = TreeBuilder::new();
        builder.insert(file).unwrap();
        let mut tree = builder.finish();
        tree.assign_build(build).unwrap();
        tree
    }

    #[test]
    fn jobs_are_kept_apart() {
        let mut store = MemoryStore::new();
        let extra = ThresholdCatalog::default();
        condense_with_store(&mut store, "a", &tree(1, 10.0), &extra).unwrap();
        condense_with_store(&mut store, "b", &tree(1, 50.0), &extra).unwrap();

        let second = condense_with_store(&mut store, "a", &tree(2, 13.0), &extra).unwrap();
        assert!(second.failed(), "delta of 3 against job a's previous 10");

        assert_eq!(store.len(), 3);
        assert_eq!(store.positions("a").unwrap(), vec![1, 2]);
        assert_eq!(store.positions("b").unwrap(), vec![1]);
        let (_, b) = store.latest("b").unwrap().unwrap();
        assert_eq!(b.entries().next().unwrap().stats.previous, Some(50.0));
    }
}
