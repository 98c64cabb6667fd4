//! Rebuilding a job's summary from its whole build chain.
//!
//! The chain is cut into contiguous ranges, one per worker. Each worker
//! interprets its builds and records them into a keyed [`History`]; the
//! partials are merged left to right and replayed through the summary fold.
//! Because the merge is a keyed union and the replay is in build order, the
//! result does not depend on how the chain was cut.

use crate::history::History;
use crate::summary::Summary;
use benchfold_kernel::BuildNumber;
use benchfold_schema::{
    BatchError, ContentProvider, InterpretOptions, ProviderError, Schema, SchemaProvider,
    interpret_build,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildOptions {
    /// Worker count; defaults to [`default_workers`].
    pub workers: Option<usize>,
    /// Wall-clock limit for the whole rebuild.
    pub budget: Option<Duration>,
    pub interpret: InterpretOptions,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RebuildError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("build {build}: {source}")]
    Interpret {
        build: BuildNumber,
        #[source]
        source: BatchError,
    },

    #[error("rebuild exceeded its budget of {0:?}")]
    BudgetExhausted(Duration),

    #[error("worker folding builds {first}..={last} panicked")]
    WorkerPanicked {
        first: BuildNumber,
        last: BuildNumber,
    },

    #[error("rebuild cancelled")]
    Cancelled,
}

/// A rebuilt summary and how it was produced.
#[derive(Debug, Clone)]
pub struct Rebuild {
    pub summary: Summary,
    pub builds: usize,
    pub workers: usize,
}

/// Available parallelism minus one, at least one.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Contiguous ranges of at most `ceil(len / parts)` builds.
pub fn partition(builds: &[BuildNumber], parts: usize) -> Vec<&[BuildNumber]> {
    if builds.is_empty() {
        return Vec::new();
    }
    let size = builds.len().div_ceil(parts.max(1));
    builds.chunks(size).collect()
}

/// Rebuild the summary of every build `content` offers.
///
/// Blocks until all workers are done. Any failing build, panicking worker
/// or exhausted budget fails the whole rebuild.
pub fn rebuild<C, S>(
    content: &C,
    schema: &S,
    options: &RebuildOptions,
) -> Result<Rebuild, RebuildError>
where
    C: ContentProvider + Sync + ?Sized,
    S: SchemaProvider + ?Sized,
{
    let started = Instant::now();
    let schema = schema.schema()?;
    let builds = content.builds()?;
    if builds.is_empty() {
        info!("no builds to rebuild from");
        return Ok(Rebuild {
            summary: Summary::new(),
            builds: 0,
            workers: 0,
        });
    }

    let workers = options
        .workers
        .unwrap_or_else(default_workers)
        .clamp(1, builds.len());
    let ranges = partition(&builds, workers);
    info!(
        builds = builds.len(),
        workers = ranges.len(),
        "rebuilding summary"
    );

    let partials = run_workers(content, &schema, &ranges, options, started)?;
    let history = partials.into_iter().fold(History::new(), History::merge);
    let summary = history.finalize();
    info!(
        values = summary.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rebuild finished"
    );
    Ok(Rebuild {
        summary,
        builds: builds.len(),
        workers: ranges.len(),
    })
}

fn run_workers<C>(
    content: &C,
    schema: &Schema,
    ranges: &[&[BuildNumber]],
    options: &RebuildOptions,
    started: Instant,
) -> Result<Vec<History>, RebuildError>
where
    C: ContentProvider + Sync + ?Sized,
{
    let deadline = options.budget.map(|budget| started + budget);
    let cancel = AtomicBool::new(false);
    let interpret = options.interpret;
    let mut partials: Vec<Option<History>> = ranges.iter().map(|_| None).collect();
    let mut first_error: Option<RebuildError> = None;
    let (tx, rx) = mpsc::channel::<(usize, Result<History, RebuildError>)>();

    thread::scope(|scope| {
        for (index, range) in ranges.iter().enumerate() {
            let tx = tx.clone();
            let cancel = &cancel;
            scope.spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    fold_range(content, schema, range, interpret, cancel)
                }))
                .unwrap_or_else(|_| {
                    Err(RebuildError::WorkerPanicked {
                        first: range.first().copied().unwrap_or_default(),
                        last: range.last().copied().unwrap_or_default(),
                    })
                });
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let mut received = 0;
        while received < ranges.len() {
            let message = match deadline {
                Some(deadline) => {
                    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => {
                            cancel.store(true, Ordering::Relaxed);
                            let budget = options.budget.unwrap_or_default();
                            warn!(?budget, "rebuild budget exhausted; cancelling workers");
                            first_error =
                                first_error.take().or(Some(RebuildError::BudgetExhausted(budget)));
                            break;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };
            received += 1;
            match message {
                (index, Ok(history)) => partials[index] = Some(history),
                (_, Err(err)) => {
                    cancel.store(true, Ordering::Relaxed);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
    });

    if let Some(err) = first_error {
        return Err(err);
    }
    partials
        .into_iter()
        .enumerate()
        .map(|(index, partial)| {
            partial.ok_or_else(|| RebuildError::WorkerPanicked {
                first: ranges[index].first().copied().unwrap_or_default(),
                last: ranges[index].last().copied().unwrap_or_default(),
            })
        })
        .collect()
}

fn fold_range<C>(
    content: &C,
    schema: &Schema,
    range: &[BuildNumber],
    options: InterpretOptions,
    cancel: &AtomicBool,
) -> Result<History, RebuildError>
where
    C: ContentProvider + ?Sized,
{
    let mut history = History::new();
    for &build in range {
        if cancel.load(Ordering::Relaxed) {
            return Err(RebuildError::Cancelled);
        }
        let documents = content.documents(build)?;
        match interpret_build(schema, &documents, build, options) {
            Ok(interpretation) => history.record(&interpretation.tree),
            Err(BatchError::NoResults) => warn!(build, "build has no results; skipped"),
            Err(source) => return Err(RebuildError::Interpret { build, source }),
        }
    }
    debug!(
        first = range.first().copied(),
        last = range.last().copied(),
        values = history.len(),
        "folded build range"
    );
    Ok(history)
}
