//! Lock-scoped mutation of one summary JSONL file.

use crate::store::{StoreError, load_summary, save_summary};
use crate::summary::Summary;
use chrono::Utc;
use std::error::Error as StdError;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn summary_lock_path(summary_path: &Path) -> PathBuf {
    let mut path: OsString = summary_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

#[derive(Debug)]
pub enum AtomicStoreMutationError<E> {
    LockBusy { lock_path: String },
    LockIo { lock_path: String, message: String },
    Store(StoreError),
    Mutation(E),
}

impl<E: Display> Display for AtomicStoreMutationError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockBusy { lock_path } => write!(f, "summary lock busy: {lock_path}"),
            Self::LockIo { lock_path, message } => {
                write!(f, "failed to acquire summary lock {lock_path}: {message}")
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::Mutation(err) => write!(f, "{err}"),
        }
    }
}

impl<E> StdError for AtomicStoreMutationError<E> where
    E: Display + std::fmt::Debug + StdError + 'static
{
}

/// Load the summary at `path`, run `mutator` on it, and save it back when
/// the mutator reports a change, all while holding `<path>.lock`.
///
/// A missing summary file starts as an empty summary. A held lock fails
/// fast with [`AtomicStoreMutationError::LockBusy`].
pub fn mutate_summary_jsonl<T, E, F>(
    path: impl AsRef<Path>,
    mutator: F,
) -> Result<T, AtomicStoreMutationError<E>>
where
    F: FnOnce(&mut Summary) -> Result<(T, bool), E>,
{
    let path = path.as_ref();
    let _guard = SummaryLockGuard::acquire(path).map_err(|failure| match failure {
        LockFailure::Busy(lock_path) => AtomicStoreMutationError::LockBusy { lock_path },
        LockFailure::Io(lock_path, message) => {
            AtomicStoreMutationError::LockIo { lock_path, message }
        }
    })?;

    let mut summary = load_summary(path).map_err(AtomicStoreMutationError::Store)?;
    let (value, changed) = mutator(&mut summary).map_err(AtomicStoreMutationError::Mutation)?;
    if changed {
        save_summary(path, &summary).map_err(AtomicStoreMutationError::Store)?;
    }
    Ok(value)
}

enum LockFailure {
    Busy(String),
    Io(String, String),
}

struct SummaryLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl SummaryLockGuard {
    fn acquire(path: &Path) -> Result<Self, LockFailure> {
        let lock_path = summary_lock_path(path);
        let shown = lock_path.display().to_string();
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| LockFailure::Io(shown.clone(), e.to_string()))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                Ok(Self {
                    lock_path,
                    _file: file,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(LockFailure::Busy(shown))
            }
            Err(err) => Err(LockFailure::Io(shown, err.to_string())),
        }
    }
}

impl Drop for SummaryLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
