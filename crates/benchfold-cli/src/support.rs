use crate::config::Config;
use benchfold_history::{Summary, load_summary};
use benchfold_kernel::Verdict;
use benchfold_schema::{Schema, SchemaFile, SchemaProvider, SourceDocument};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Exit status when a condensed build fails.
pub const EXIT_FAILING: i32 = 2;

pub fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn load_config_or_exit(path: Option<&str>) -> Config {
    Config::load(path).unwrap_or_else(|e| exit_with(e))
}

/// The schema file at `path`, carrying the thresholds declared in config.
pub fn schema_file_or_exit(config: &Config, path: &str) -> SchemaFile {
    let catalog = config.catalog().unwrap_or_else(|e| exit_with(e));
    SchemaFile::new(path).with_thresholds(catalog)
}

pub fn load_schema_or_exit(provider: &impl SchemaProvider, path: &str) -> Schema {
    provider
        .schema()
        .unwrap_or_else(|e| exit_with(format!("failed to load schema {path}: {e}")))
}

/// Read content files; each document is named by the path as given.
pub fn read_documents_or_exit(files: &[String]) -> Vec<SourceDocument> {
    files
        .iter()
        .map(|file| {
            let text = fs::read_to_string(file)
                .unwrap_or_else(|e| exit_with(format!("failed to read {file}: {e}")));
            SourceDocument::new(file.replace('\\', "/"), text)
        })
        .collect()
}

pub fn load_summary_or_exit(path: &str) -> Summary {
    if !Path::new(path).exists() {
        exit_with(format!("summary not found: {path}"));
    }
    load_summary(path).unwrap_or_else(|e| exit_with(format!("failed to load {path}: {e}")))
}

pub fn print_json(payload: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).expect("json serialization")
    );
}

pub fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}"))
}

pub fn verdict_line(verdict: &Verdict) -> String {
    let mut reasons = Vec::new();
    if verdict.failed_predicate {
        reasons.push("failure predicate".to_string());
    }
    reasons.extend(verdict.violations.iter().map(ToString::to_string));
    format!("{} (build {}): {}", verdict.path, verdict.build, reasons.join("; "))
}
