//! The durable export format of a summary: one flat record per value.

use crate::summary::{Statistics, Summary, SummaryEntry, ValueIdentity};
use benchfold_kernel::{BuildNumber, StableHash, ValueKind, ValueRole};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub hash: StableHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<StableHash>,
    pub path: String,
    pub group: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub role: ValueRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build: Option<BuildNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_deviation: Option<f64>,
    pub passed: u64,
    pub failed: u64,
}

impl From<&SummaryEntry> for SummaryRecord {
    fn from(entry: &SummaryEntry) -> Self {
        let SummaryEntry { identity, stats } = entry;
        Self {
            hash: identity.hash.clone(),
            file: identity.file.clone(),
            path: identity.path.clone(),
            group: identity.group.clone(),
            name: identity.name.clone(),
            description: identity.description.clone(),
            unit: identity.unit.clone(),
            kind: identity.kind,
            role: identity.role,
            last_build: stats.last_build,
            previous: stats.previous,
            minimum: stats.minimum,
            maximum: stats.maximum,
            average: stats.average,
            std_deviation: stats.std_deviation,
            passed: stats.passed,
            failed: stats.failed,
        }
    }
}

impl From<SummaryRecord> for SummaryEntry {
    fn from(record: SummaryRecord) -> Self {
        Self {
            identity: ValueIdentity {
                hash: record.hash,
                file: record.file,
                path: record.path,
                name: record.name,
                group: record.group,
                description: record.description,
                unit: record.unit,
                kind: record.kind,
                role: record.role,
            },
            stats: Statistics {
                last_build: record.last_build,
                previous: record.previous,
                minimum: record.minimum,
                maximum: record.maximum,
                average: record.average,
                std_deviation: record.std_deviation,
                passed: record.passed,
                failed: record.failed,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("summary holds two records for `{path}`")]
    DuplicateHash { path: String },

    #[error("record for `{path}` carries hash {hash}, which is not the hash of its path")]
    HashMismatch { path: String, hash: StableHash },
}

/// One record per entry, in hash order.
pub fn export(summary: &Summary) -> Vec<SummaryRecord> {
    summary.entries().map(SummaryRecord::from).collect()
}

/// Rebuild a summary from exported records.
pub fn import(records: Vec<SummaryRecord>) -> Result<Summary, RecordError> {
    let mut summary = Summary::new();
    for record in records {
        if StableHash::from_dotted(&record.path) != record.hash {
            return Err(RecordError::HashMismatch {
                path: record.path,
                hash: record.hash,
            });
        }
        let path = record.path.clone();
        if summary.insert(record.into()).is_some() {
            return Err(RecordError::DuplicateHash { path });
        }
    }
    Ok(summary)
}
