//! `benchfold.toml`: interpretation, history and extra threshold settings.

use benchfold_history::RebuildOptions;
use benchfold_kernel::{ThresholdCatalog, ThresholdError, ThresholdSpec};
use benchfold_schema::InterpretOptions;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "benchfold.toml";
pub const DEFAULT_TRUNCATE_LENGTH: usize = 120;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("threshold #{index}: {source}")]
    Threshold {
        index: usize,
        #[source]
        source: ThresholdError,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub interpret: InterpretSection,
    pub history: HistorySection,
    #[serde(rename = "threshold")]
    pub thresholds: Vec<ThresholdEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpretSection {
    pub truncate_strings: bool,
    pub truncate_length: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistorySection {
    pub workers: Option<usize>,
    pub budget_secs: Option<u64>,
}

/// One `[[threshold]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdEntry {
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub test_group: String,
    #[serde(flatten)]
    pub spec: ThresholdSpec,
}

impl Config {
    /// Load `path`, or `benchfold.toml` in the working directory when it
    /// exists, or the defaults.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH,
            None => return Ok(Self::default()),
        };
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let config = Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_string(),
                message,
            },
            other => other,
        })?;
        tracing::debug!(path, thresholds = config.thresholds.len(), "loaded config");
        Ok(config)
    }

    /// Parse and validate config text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: String::from("<inline>"),
            message: e.to_string(),
        })?;
        config.catalog()?;
        Ok(config)
    }

    pub fn catalog(&self) -> Result<ThresholdCatalog, ConfigError> {
        let mut catalog = ThresholdCatalog::default();
        for (index, entry) in self.thresholds.iter().enumerate() {
            catalog
                .declare(&entry.test_name, &entry.test_group, &entry.spec)
                .map_err(|source| ConfigError::Threshold {
                    index: index + 1,
                    source,
                })?;
        }
        Ok(catalog)
    }

    pub fn interpret_options(&self) -> InterpretOptions {
        InterpretOptions {
            truncate: self.interpret.truncate_strings.then(|| {
                self.interpret
                    .truncate_length
                    .unwrap_or(DEFAULT_TRUNCATE_LENGTH)
            }),
        }
    }

    /// Rebuild options with command-line overrides applied.
    pub fn rebuild_options(
        &self,
        workers: Option<usize>,
        budget_secs: Option<u64>,
    ) -> RebuildOptions {
        RebuildOptions {
            workers: workers.or(self.history.workers),
            budget: budget_secs
                .or(self.history.budget_secs)
                .map(Duration::from_secs),
            interpret: self.interpret_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[interpret]
truncate_strings = true

[history]
workers = 3
budget_secs = 600

[[threshold]]
test_name = "sort"
method = "delta"
delta = 2.0
ignore_negative_deltas = true

[[threshold]]
method = "absolute"
maximum = 500
"#;

    #[test]
    fn sample_config_loads() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(
            config.interpret_options().truncate,
            Some(DEFAULT_TRUNCATE_LENGTH)
        );
        assert_eq!(config.catalog().unwrap().len(), 2);

        let options = config.rebuild_options(None, Some(5));
        assert_eq!(options.workers, Some(3));
        assert_eq!(options.budget, Some(Duration::from_secs(5)));
    }

    #[test]
    fn empty_config_means_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.interpret_options().truncate, None);
        assert!(config.catalog().unwrap().is_empty());
        assert_eq!(config.rebuild_options(None, None), RebuildOptions::default());
    }

    #[test]
    fn bad_thresholds_fail_loading() {
        let unknown = "[[threshold]]\nmethod = \"sideways\"\n";
        assert!(matches!(
            Config::parse(unknown),
            Err(ConfigError::Threshold { index: 1, .. })
        ));

        let missing = "[[threshold]]\nmethod = \"percentage\"\n";
        let err = Config::parse(missing).unwrap_err();
        assert_eq!(
            err.to_string(),
            "threshold #1: threshold method `percentage` requires `percentage`"
        );
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(matches!(
            Config::parse("[histroy]\nworkers = 2\n"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
