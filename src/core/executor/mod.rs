//! # Executor Module
//!
//! Commits a previewed batch one rename at a time.
//!
//! ## Semantics
//! - Items are renamed strictly in order by a single worker
//! - Every item yields `Processing` followed by one terminal status
//! - An invalid config fails fast: one `Failed` for the first item and
//!   nothing else; the provider is never called
//! - A collision yields `Skipped` without calling the provider
//! - A provider error (or panic) yields `Failed` and the batch moves on
//! - Cancellation is checked before each item starts
//!
//! The stream is lazy: the rename for an item only happens when the
//! consumer asks for the item's terminal status.

mod types;

pub use types::{
    CancellationToken, ExecutionProgress, ExecutionReport, ExecutionSummary, ProgressStatus,
    RenamedItem, UnrenamedItem,
};

use crate::core::media::{MediaHandle, MediaItem};
use crate::core::naming::{validate_filename, FilenameGenerator, RenameConfig};
use crate::core::preview::duplicate_name_failure;
use crate::core::providers::{check_conflict, ConflictChecker, RenameProvider};
use crate::error::{ErrorKind, RenameFailure};
use crate::events::{Event, EventSender, RenameEvent};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs rename batches against a provider
#[derive(Clone)]
pub struct BatchExecutor {
    generator: FilenameGenerator,
    checker: Arc<dyn ConflictChecker>,
    provider: Arc<dyn RenameProvider>,
}

impl BatchExecutor {
    pub fn new(provider: Arc<dyn RenameProvider>, checker: Arc<dyn ConflictChecker>) -> Self {
        Self {
            generator: FilenameGenerator::new(),
            checker,
            provider,
        }
    }

    /// Use the same generator the preview used
    pub fn with_generator(mut self, generator: FilenameGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Start a batch over already-sorted `items`. Nothing happens until the
    /// returned stream is polled; dropping it stops the batch.
    pub fn execute(
        &self,
        items: Vec<MediaItem>,
        config: RenameConfig,
        token: CancellationToken,
    ) -> ExecutionStream {
        self.execute_numbered(items.into_iter().enumerate().collect(), config, token)
    }

    /// Like `execute`, but each item carries the position its name is
    /// numbered from
    pub fn execute_numbered(
        &self,
        items: Vec<(usize, MediaItem)>,
        config: RenameConfig,
        token: CancellationToken,
    ) -> ExecutionStream {
        let (sequence, items): (Vec<usize>, Vec<MediaItem>) = items.into_iter().unzip();
        ExecutionStream {
            executor: self.clone(),
            items,
            sequence,
            config,
            token,
            state: StreamState::NotStarted,
            next_index: 0,
            cancelled: false,
        }
    }

    /// Drive a batch to the end, mirroring progress onto `events`
    pub fn run_with_events(
        &self,
        items: Vec<MediaItem>,
        config: RenameConfig,
        token: CancellationToken,
        events: &EventSender,
    ) -> ExecutionReport {
        Self::drive(self.execute(items, config, token), events)
    }

    /// Replay the failed items of `report`, keeping their original
    /// numbering so committed names are not reused
    pub fn retry_failed(
        &self,
        report: &ExecutionReport,
        config: RenameConfig,
        token: CancellationToken,
    ) -> ExecutionReport {
        let stream = self.execute_numbered(report.failed_numbered(), config, token);
        Self::drive(stream, &crate::events::null_sender())
    }

    fn drive(mut stream: ExecutionStream, events: &EventSender) -> ExecutionReport {
        let start = Instant::now();
        let mut report = ExecutionReport::new(stream.total());
        events.send(Event::Rename(RenameEvent::Started {
            total: stream.total(),
        }));

        for progress in stream.by_ref() {
            report.record(&progress);
            events.send(Event::Rename(RenameEvent::Progress(progress)));
        }

        report.cancelled = stream.was_cancelled();
        report.duration_ms = start.elapsed().as_millis() as u64;

        let summary = report.summary();
        if report.cancelled {
            events.send(Event::Rename(RenameEvent::Cancelled { summary }));
        } else {
            events.send(Event::Rename(RenameEvent::Completed { summary }));
        }
        report
    }

    /// Drive a batch to the end without events
    pub fn run(
        &self,
        items: Vec<MediaItem>,
        config: RenameConfig,
        token: CancellationToken,
    ) -> ExecutionReport {
        self.run_with_events(items, config, token, &crate::events::null_sender())
    }

    fn process(&self, item: &MediaItem, config: &RenameConfig, index: usize) -> ProgressStatus {
        let candidate = self.generator.generate(item, config, index);

        if let Err(reason) = validate_filename(&candidate) {
            debug!(name = %item.name, candidate, %reason, "candidate rejected");
            return ProgressStatus::Failed(reason.into());
        }

        if check_conflict(self.checker.as_ref(), &item.handle, &candidate) {
            debug!(name = %item.name, candidate, "skipping duplicate name");
            return ProgressStatus::Skipped(duplicate_name_failure(&candidate));
        }

        match rename_guarded(self.provider.as_ref(), &item.handle, &candidate) {
            Ok(new_handle) => ProgressStatus::Success {
                new_name: candidate,
                new_handle,
            },
            Err(failure) => {
                warn!(name = %item.name, candidate, %failure, "rename failed");
                ProgressStatus::Failed(failure)
            }
        }
    }
}

/// Call the provider, turning an error or a panic into a failure
pub(crate) fn rename_guarded(
    provider: &dyn RenameProvider,
    handle: &MediaHandle,
    new_name: &str,
) -> Result<MediaHandle, RenameFailure> {
    match catch_unwind(AssertUnwindSafe(|| provider.rename(handle, new_name))) {
        Ok(result) => result.map_err(RenameFailure::from),
        Err(_) => Err(RenameFailure::new(
            ErrorKind::Provider,
            "rename provider panicked",
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    NotStarted,
    /// Between items
    Ready,
    /// `Processing` was emitted for this index; its terminal status is next
    InFlight(usize),
    Finished,
}

/// Lazy, finite, single-consumer stream of progress for one batch.
///
/// Not restartable: run a new batch to retry.
pub struct ExecutionStream {
    executor: BatchExecutor,
    items: Vec<MediaItem>,
    /// Numbering position per item
    sequence: Vec<usize>,
    config: RenameConfig,
    token: CancellationToken,
    state: StreamState,
    next_index: usize,
    cancelled: bool,
}

impl ExecutionStream {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// True if the batch stopped because the token was cancelled
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    fn progress(&self, index: usize, status: ProgressStatus) -> ExecutionProgress {
        ExecutionProgress {
            index,
            sequence: self.sequence[index],
            total: self.items.len(),
            item: self.items[index].clone(),
            status,
        }
    }

    fn start(&mut self) -> Option<ExecutionProgress> {
        if let Err(error) = self.config.validate() {
            self.state = StreamState::Finished;
            warn!(%error, items = self.items.len(), "batch rejected by config");
            if self.items.is_empty() {
                return None;
            }
            return Some(self.progress(0, ProgressStatus::Failed(error.into())));
        }

        info!(items = self.items.len(), prefix = %self.config.prefix, "batch started");
        self.executor.checker.begin_batch();
        self.state = StreamState::Ready;
        self.next_item()
    }

    fn next_item(&mut self) -> Option<ExecutionProgress> {
        if self.next_index >= self.items.len() {
            self.state = StreamState::Finished;
            info!(items = self.items.len(), "batch finished");
            return None;
        }

        if self.token.is_cancelled() {
            self.state = StreamState::Finished;
            self.cancelled = true;
            info!(
                processed = self.next_index,
                items = self.items.len(),
                "batch cancelled"
            );
            return None;
        }

        let index = self.next_index;
        self.state = StreamState::InFlight(index);
        Some(self.progress(index, ProgressStatus::Processing))
    }
}

impl Iterator for ExecutionStream {
    type Item = ExecutionProgress;

    fn next(&mut self) -> Option<ExecutionProgress> {
        match self.state {
            StreamState::NotStarted => self.start(),
            StreamState::Ready => self.next_item(),
            StreamState::InFlight(index) => {
                let status =
                    self.executor
                        .process(&self.items[index], &self.config, self.sequence[index]);
                self.next_index = index + 1;
                self.state = StreamState::Ready;
                Some(self.progress(index, status))
            }
            StreamState::Finished => None,
        }
    }
}
