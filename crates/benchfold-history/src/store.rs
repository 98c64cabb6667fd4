//! Persisted summaries, keyed by job and chain position.

use crate::condense::{Condensation, condense};
use crate::jsonl::{JsonlError, read_records_from_path, write_records_to_path};
use crate::record::{RecordError, export, import};
use crate::summary::Summary;
use benchfold_kernel::{BuildNumber, ResultTree, ThresholdCatalog};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where one summary lives: a job and the build it was condensed up to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreKey {
    pub job: String,
    pub position: BuildNumber,
}

impl StoreKey {
    pub fn new(job: impl Into<String>, position: BuildNumber) -> Self {
        Self {
            job: job.into(),
            position,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("invalid job name `{0}`")]
    InvalidJob(String),
}

pub trait SummaryStore {
    fn load(&self, key: &StoreKey) -> Result<Option<Summary>, StoreError>;

    fn save(&mut self, key: &StoreKey, summary: &Summary) -> Result<(), StoreError>;

    /// Stored positions of `job`, ascending.
    fn positions(&self, job: &str) -> Result<Vec<BuildNumber>, StoreError>;

    /// The summary at the highest stored position of `job`.
    fn latest(&self, job: &str) -> Result<Option<(BuildNumber, Summary)>, StoreError> {
        let Some(position) = self.positions(job)?.last().copied() else {
            return Ok(None);
        };
        Ok(self
            .load(&StoreKey::new(job, position))?
            .map(|summary| (position, summary)))
    }
}

/// Condense `tree` on top of the latest summary of `job` and store the
/// result at the tree's newest build.
pub fn condense_with_store(
    store: &mut impl SummaryStore,
    job: &str,
    tree: &ResultTree,
    extra: &ThresholdCatalog,
) -> Result<Condensation, StoreError> {
    let (position, previous) = store.latest(job)?.unwrap_or_default();
    let condensation = condense(tree, &previous, extra);
    let newest = tree.builds().last().copied().unwrap_or(position);
    let key = StoreKey::new(job, newest.max(position));
    store.save(&key, &condensation.summary)?;
    info!(job, position = key.position, "stored summary");
    Ok(condensation)
}

/// Read a summary file; a missing file is an empty summary.
pub fn load_summary(path: impl AsRef<Path>) -> Result<Summary, StoreError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Summary::new());
    }
    Ok(import(read_records_from_path(path)?)?)
}

pub fn save_summary(path: impl AsRef<Path>, summary: &Summary) -> Result<(), StoreError> {
    write_records_to_path(path, &export(summary))?;
    Ok(())
}

/// Summaries on disk as `<root>/<job>/<position>.jsonl`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, key: &StoreKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .job_dir(&key.job)?
            .join(format!("{}.jsonl", key.position)))
    }

    fn job_dir(&self, job: &str) -> Result<PathBuf, StoreError> {
        let valid = !job.is_empty()
            && job != "."
            && job != ".."
            && job
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StoreError::InvalidJob(job.to_string()));
        }
        Ok(self.root.join(job))
    }
}

impl SummaryStore for FileStore {
    fn load(&self, key: &StoreKey) -> Result<Option<Summary>, StoreError> {
        let path = self.path_of(key)?;
        if !path.exists() {
            return Ok(None);
        }
        load_summary(path).map(Some)
    }

    fn save(&mut self, key: &StoreKey, summary: &Summary) -> Result<(), StoreError> {
        save_summary(self.path_of(key)?, summary)
    }

    fn positions(&self, job: &str) -> Result<Vec<BuildNumber>, StoreError> {
        let dir = self.job_dir(job)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(JsonlError::Io(0, format!("{}: {e}", dir.display())).into()),
        };
        let mut positions: Vec<BuildNumber> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                name.strip_suffix(".jsonl")?.parse().ok()
            })
            .collect();
        positions.sort_unstable();
        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchfold_kernel::{Literal, NodeBuilder, TreeBuilder, ValueRole};
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "benchfold-store-{prefix}-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&path).expect("temp dir should be created");
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn tree(build: BuildNumber, ms: f64) -> ResultTree {
        let mut file = NodeBuilder::file_group("bench.json", "bench.json");
        file.push_child(NodeBuilder::value("ms", ValueRole::Result, Literal::Double(ms)));
        let mut builder = TreeBuilder::new();
        builder.insert(file).unwrap();
        let mut tree = builder.finish();
        tree.assign_build(build).unwrap();
        tree
    }

    #[test]
    fn file_store_lists_positions_in_order() {
        let dir = TempDir::new("positions");
        let mut store = FileStore::new(&dir.0);
        assert_eq!(store.positions("nightly").unwrap(), Vec::<BuildNumber>::new());
        assert!(store.latest("nightly").unwrap().is_none());

        let extra = ThresholdCatalog::default();
        condense_with_store(&mut store, "nightly", &tree(2, 10.0), &extra).unwrap();
        condense_with_store(&mut store, "nightly", &tree(10, 12.0), &extra).unwrap();

        assert_eq!(store.positions("nightly").unwrap(), vec![2, 10]);
        let (position, summary) = store.latest("nightly").unwrap().unwrap();
        assert_eq!(position, 10);
        let stats = summary.entries().next().unwrap().stats;
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.previous, Some(12.0));
    }

    #[test]
    fn job_names_cannot_escape_the_root() {
        let store = FileStore::new("/tmp/benchfold");
        for job in ["", "..", "a/b", "x y"] {
            assert!(matches!(
                store.path_of(&StoreKey::new(job, 1)),
                Err(StoreError::InvalidJob(_))
            ));
        }
        assert!(store.path_of(&StoreKey::new("nightly-arm64", 1)).is_ok());
    }

    #[test]
    fn missing_summary_file_loads_empty() {
        let dir = TempDir::new("missing");
        let summary = load_summary(dir.0.join("absent.jsonl")).unwrap();
        assert!(summary.is_empty());
    }
}
