//! Where schemas and content documents come from.

use crate::batch::SourceDocument;
use crate::schema::{Schema, SchemaError};
use benchfold_kernel::{BuildNumber, CURRENT_BUILD, ThresholdCatalog};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("build {0} has no content")]
    MissingBuild(BuildNumber),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn io_error(path: &Path, err: std::io::Error) -> ProviderError {
    ProviderError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Content documents of a chain of builds.
pub trait ContentProvider {
    /// Builds that have content, ascending.
    fn builds(&self) -> Result<Vec<BuildNumber>, ProviderError>;

    /// Documents of `build`, ordered by relative path.
    fn documents(&self, build: BuildNumber) -> Result<Vec<SourceDocument>, ProviderError>;
}

/// The schema of a job, plus thresholds declared outside of it.
pub trait SchemaProvider {
    fn schema(&self) -> Result<Schema, ProviderError>;

    fn extra_thresholds(&self) -> ThresholdCatalog {
        ThresholdCatalog::default()
    }
}

impl SchemaProvider for Schema {
    fn schema(&self) -> Result<Schema, ProviderError> {
        Ok(self.clone())
    }
}

/// A schema read from disk.
#[derive(Debug, Clone)]
pub struct SchemaFile {
    path: PathBuf,
    thresholds: ThresholdCatalog,
}

impl SchemaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            thresholds: ThresholdCatalog::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdCatalog) -> Self {
        self.thresholds = thresholds;
        self
    }
}

impl SchemaProvider for SchemaFile {
    fn schema(&self) -> Result<Schema, ProviderError> {
        let text = fs::read_to_string(&self.path).map_err(|e| io_error(&self.path, e))?;
        Ok(Schema::parse(&text)?)
    }

    fn extra_thresholds(&self) -> ThresholdCatalog {
        self.thresholds.clone()
    }
}

/// Builds laid out on disk as `<root>/<build number>/**`.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentProvider for DirectoryProvider {
    fn builds(&self) -> Result<Vec<BuildNumber>, ProviderError> {
        let entries = fs::read_dir(&self.root).map_err(|e| io_error(&self.root, e))?;
        let mut builds = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(build) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<BuildNumber>().ok())
                .filter(|build| *build != CURRENT_BUILD)
            {
                builds.push(build);
            }
        }
        builds.sort_unstable();
        Ok(builds)
    }

    fn documents(&self, build: BuildNumber) -> Result<Vec<SourceDocument>, ProviderError> {
        let dir = self.root.join(build.to_string());
        if !dir.is_dir() {
            return Err(ProviderError::MissingBuild(build));
        }
        let mut documents = Vec::new();
        collect_documents(&dir, &dir, &mut documents)?;
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(documents)
    }
}

fn collect_documents(
    base: &Path,
    dir: &Path,
    out: &mut Vec<SourceDocument>,
) -> Result<(), ProviderError> {
    let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        if path.is_dir() {
            collect_documents(base, &path, out)?;
            continue;
        }
        let text = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        let relative = path.strip_prefix(base).unwrap_or(&path);
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        out.push(SourceDocument::new(relative.join("/"), text));
    }
    Ok(())
}

/// Documents held in memory, keyed by build.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    builds: BTreeMap<BuildNumber, Vec<SourceDocument>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, build: BuildNumber, document: SourceDocument) {
        self.builds.entry(build).or_default().push(document);
    }

    pub fn with(mut self, build: BuildNumber, document: SourceDocument) -> Self {
        self.insert(build, document);
        self
    }
}

impl ContentProvider for MemoryProvider {
    fn builds(&self) -> Result<Vec<BuildNumber>, ProviderError> {
        Ok(self.builds.keys().copied().collect())
    }

    fn documents(&self, build: BuildNumber) -> Result<Vec<SourceDocument>, ProviderError> {
        self.builds
            .get(&build)
            .cloned()
            .ok_or(ProviderError::MissingBuild(build))
    }
}
