use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rayon::prelude::*;

use crate::{
    batch::producer::{GeneratedItem, ItemProducer},
    foundation::error::{ForgeError, ForgeResult},
};

/// Items generated when no count is given.
pub const DEFAULT_GENERATE_COUNT: usize = 10;

/// Largest accepted generation count.
pub const MAX_GENERATE_COUNT: usize = 500;

/// Check a procedural generation count against `1..=MAX_GENERATE_COUNT`.
pub fn validate_count(count: usize) -> ForgeResult<()> {
    if count == 0 || count > MAX_GENERATE_COUNT {
        return Err(ForgeError::validation(format!(
            "generate count must be within 1..={MAX_GENERATE_COUNT}, got {count}"
        )));
    }
    Ok(())
}

/// Cooperative cancel flag, observed between batch steps.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Items already being drawn are finished first.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress after one more item finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    /// Items finished so far, rendered or skipped.
    pub completed: usize,
    /// Items in the batch.
    pub total: usize,
}

impl BatchProgress {
    /// Human-readable status line.
    pub fn status(&self) -> String {
        format!("Rendered {}/{}", self.completed, self.total)
    }
}

/// Outcome of one batch step.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchEntry {
    /// The item rendered.
    Rendered(GeneratedItem),
    /// The item failed locally (decode or geometry) and leaves a gap.
    Skipped {
        /// 1-based index of the missing item.
        index: usize,
        /// Error message of the failure.
        reason: String,
    },
}

impl BatchEntry {
    /// 1-based index of this entry.
    pub fn index(&self) -> usize {
        match self {
            Self::Rendered(item) => item.index,
            Self::Skipped { index, .. } => *index,
        }
    }

    /// The rendered item, if any.
    pub fn item(&self) -> Option<&GeneratedItem> {
        match self {
            Self::Rendered(item) => Some(item),
            Self::Skipped { .. } => None,
        }
    }
}

/// Threading and chunking of a batch run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BatchThreading {
    /// Render items of a chunk on a rayon pool.
    pub parallel: bool,
    /// Worker count; `None` uses rayon's default.
    pub threads: Option<usize>,
    /// Items per chunk. Progress and cancellation are observed between chunks.
    pub chunk_size: usize,
}

impl Default for BatchThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            chunk_size: 16,
        }
    }
}

/// Counters for a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Items requested.
    pub items_total: usize,
    /// Items that rendered.
    pub items_rendered: usize,
    /// Items skipped after a local failure.
    pub items_skipped: usize,
    /// Distinct trait combinations among rendered items. Duplicates are kept, only counted.
    pub unique_combinations: usize,
}

impl RunStats {
    fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut seen = HashSet::new();
        let mut stats = Self {
            items_total: entries.len(),
            ..Self::default()
        };
        for entry in entries {
            match entry {
                BatchEntry::Rendered(item) => {
                    stats.items_rendered += 1;
                    seen.insert(item.combination_fingerprint());
                }
                BatchEntry::Skipped { .. } => stats.items_skipped += 1,
            }
        }
        stats.unique_combinations = seen.len();
        stats
    }
}

/// Entries in generation order plus run counters.
#[derive(Clone, Debug)]
pub struct BatchOutput {
    /// One entry per item, ordered by index.
    pub entries: Vec<BatchEntry>,
    /// Counters for the run.
    pub stats: RunStats,
}

impl BatchOutput {
    /// Rendered items in order, skipping gaps.
    pub fn items(&self) -> impl Iterator<Item = &GeneratedItem> {
        self.entries.iter().filter_map(BatchEntry::item)
    }
}

fn step<P: ItemProducer + ?Sized>(producer: &P, index: usize) -> ForgeResult<BatchEntry> {
    match producer.produce(index) {
        Ok(item) => {
            tracing::debug!(index, "item rendered");
            Ok(BatchEntry::Rendered(item))
        }
        Err(e) if e.is_item_local() => {
            tracing::warn!(index, error = %e, "item skipped");
            Ok(BatchEntry::Skipped {
                index,
                reason: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

/// A batch as a sequence of discrete steps, one item per `next()`.
///
/// The host regains control after every item, so it can report progress, yield to a UI loop or
/// cancel. After a cancel is observed the iterator yields one `Cancelled` error and then ends.
pub struct BatchRun<'a, P: ItemProducer + ?Sized> {
    producer: &'a P,
    cancel: CancelToken,
    next: usize,
    completed: usize,
    total: usize,
}

impl<'a, P: ItemProducer + ?Sized> BatchRun<'a, P> {
    /// Start a run over every item of `producer`.
    pub fn new(producer: &'a P, cancel: CancelToken) -> ForgeResult<Self> {
        if producer.is_empty() {
            return Err(ForgeError::empty_input("batch has no items"));
        }
        Ok(Self {
            producer,
            cancel,
            next: 1,
            completed: 0,
            total: producer.len(),
        })
    }

    /// Progress so far.
    pub fn progress(&self) -> BatchProgress {
        BatchProgress {
            completed: self.completed,
            total: self.total,
        }
    }
}

impl<P: ItemProducer + ?Sized> Iterator for BatchRun<'_, P> {
    type Item = ForgeResult<BatchEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.total {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.next = self.total + 1;
            return Some(Err(ForgeError::Cancelled {
                completed: self.completed,
            }));
        }
        let index = self.next;
        self.next += 1;
        let entry = step(self.producer, index);
        match entry {
            Ok(_) => self.completed += 1,
            Err(_) => self.next = self.total + 1,
        }
        Some(entry)
    }
}

/// Run every item of `producer`, calling `on_progress` after each finished item.
///
/// Entries come back in generation order whether or not rendering is parallel. A cancelled run
/// returns `Cancelled` and no entries, so nothing gets packaged.
#[tracing::instrument(skip(producer, cancel, on_progress), fields(total = producer.len()))]
pub fn run_batch<P, F>(
    producer: &P,
    threading: &BatchThreading,
    cancel: &CancelToken,
    mut on_progress: F,
) -> ForgeResult<BatchOutput>
where
    P: ItemProducer + ?Sized,
    F: FnMut(BatchProgress),
{
    let total = producer.len();
    let mut entries = Vec::with_capacity(total);

    if threading.parallel {
        if total == 0 {
            return Err(ForgeError::empty_input("batch has no items"));
        }
        let pool = build_thread_pool(threading.threads)?;
        let chunk_size = threading.chunk_size.max(1);
        let mut start = 1usize;
        while start <= total {
            if cancel.is_cancelled() {
                return Err(ForgeError::Cancelled {
                    completed: entries.len(),
                });
            }
            let end = (start + chunk_size).min(total + 1);
            let chunk = pool.install(|| {
                (start..end)
                    .into_par_iter()
                    .map(|index| step(producer, index))
                    .collect::<Vec<_>>()
            });
            for entry in chunk {
                entries.push(entry?);
                on_progress(BatchProgress {
                    completed: entries.len(),
                    total,
                });
            }
            start = end;
        }
    } else {
        for entry in BatchRun::new(producer, cancel.clone())? {
            entries.push(entry?);
            on_progress(BatchProgress {
                completed: entries.len(),
                total,
            });
        }
    }

    let stats = RunStats::from_entries(&entries);
    tracing::info!(
        rendered = stats.items_rendered,
        skipped = stats.items_skipped,
        unique = stats.unique_combinations,
        "batch finished"
    );
    Ok(BatchOutput { entries, stats })
}

fn build_thread_pool(threads: Option<usize>) -> ForgeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ForgeError::validation(
            "batch threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ForgeError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/batch/runner.rs"]
mod tests;
