//! # benchfold-history
//!
//! Condensed build history of a job.
//!
//! This crate provides:
//! - `Summary`: per-value running statistics, folded one sample at a time
//! - `condense`: fold one interpreted build and judge it against thresholds
//! - `History`: keyed per-build samples whose merge is a plain union
//! - `rebuild`: parallel rebuild of a summary from a whole build chain
//! - JSONL export/import and lock-scoped stores keyed by job and position
//!
//! ## Data model
//!
//! ```text
//! ResultTree (one build)
//!     │ condense                     │ record
//!     ▼                              ▼
//! Summary ◀──── finalize ──── History (keyed by build, merged per range)
//!     ↕  export / import
//! JSONL (one SummaryRecord per line)
//! ```

pub mod atomic_store;
pub mod condense;
pub mod history;
pub mod jsonl;
pub mod memory;
pub mod rebuild;
pub mod record;
pub mod store;
pub mod summary;

pub use atomic_store::{AtomicStoreMutationError, mutate_summary_jsonl, summary_lock_path};
pub use condense::{Condensation, condense};
pub use history::{History, Sample, Track};
pub use jsonl::{
    JsonlError, read_records, read_records_from_path, write_records, write_records_to_path,
};
pub use memory::MemoryStore;
pub use rebuild::{Rebuild, RebuildError, RebuildOptions, default_workers, partition, rebuild};
pub use record::{RecordError, SummaryRecord, export, import};
pub use store::{
    FileStore, StoreError, StoreKey, SummaryStore, condense_with_store, load_summary, save_summary,
};
pub use summary::{Statistics, Summary, SummaryEntry, ValueIdentity};
