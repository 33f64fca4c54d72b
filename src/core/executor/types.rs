//! Progress, cancellation and report types for the batch executor.

use crate::core::media::{MediaHandle, MediaItem};
use crate::error::RenameFailure;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a caller and a running batch.
///
/// The executor looks at it before starting each item; a rename that is
/// already running always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Where an item is in its rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Processing,
    Success {
        new_name: String,
        new_handle: MediaHandle,
    },
    Failed(RenameFailure),
    /// The candidate collided; the provider was not called
    Skipped(RenameFailure),
}

impl ProgressStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressStatus::Processing)
    }
}

/// One state transition of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionProgress {
    /// Zero-based position in the sorted batch
    pub index: usize,
    /// Position the candidate name was numbered from. Equals `index`
    /// except when a batch replays items from an earlier one.
    pub sequence: usize,
    pub total: usize,
    pub item: MediaItem,
    pub status: ProgressStatus,
}

impl ExecutionProgress {
    /// Whole-number percentage of the batch reached by this item
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        (self.index + 1) * 100 / self.total
    }
}

/// An item that was renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedItem {
    pub item: MediaItem,
    pub new_name: String,
    pub new_handle: MediaHandle,
}

/// An item that failed or was skipped, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrenamedItem {
    /// Numbering position the item had, so a retry can reuse it
    pub index: usize,
    pub item: MediaItem,
    pub failure: RenameFailure,
}

/// Counts for a finished (or cancelled) batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// Terminal outcomes of a batch, folded from its progress stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub total: usize,
    pub succeeded: Vec<RenamedItem>,
    pub failed: Vec<UnrenamedItem>,
    pub skipped: Vec<UnrenamedItem>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Fold one progress item in. `Processing` items are ignored.
    pub fn record(&mut self, progress: &ExecutionProgress) {
        match &progress.status {
            ProgressStatus::Processing => {}
            ProgressStatus::Success {
                new_name,
                new_handle,
            } => self.succeeded.push(RenamedItem {
                item: progress.item.clone(),
                new_name: new_name.clone(),
                new_handle: new_handle.clone(),
            }),
            ProgressStatus::Failed(failure) => self.failed.push(UnrenamedItem {
                index: progress.sequence,
                item: progress.item.clone(),
                failure: failure.clone(),
            }),
            ProgressStatus::Skipped(failure) => self.skipped.push(UnrenamedItem {
                index: progress.sequence,
                item: progress.item.clone(),
                failure: failure.clone(),
            }),
        }
    }

    /// Items that reached a terminal status
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    /// The failed subset, in batch order, ready to be replayed
    pub fn failed_items(&self) -> Vec<MediaItem> {
        self.failed.iter().map(|f| f.item.clone()).collect()
    }

    /// The failed subset paired with the numbering position each item had
    pub fn failed_numbered(&self) -> Vec<(usize, MediaItem)> {
        self.failed
            .iter()
            .map(|f| (f.index, f.item.clone()))
            .collect()
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            total: self.total,
            succeeded: self.succeeded.len(),
            failed: self.failed.len(),
            skipped: self.skipped.len(),
            cancelled: self.cancelled,
            duration_ms: self.duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::SystemTime;

    fn progress(index: usize, total: usize, status: ProgressStatus) -> ExecutionProgress {
        ExecutionProgress {
            index,
            sequence: index,
            total,
            item: MediaItem::new(format!("/p/{}.jpg", index), 1, SystemTime::UNIX_EPOCH),
            status,
        }
    }

    #[test]
    fn percent_is_floored() {
        assert_eq!(progress(0, 3, ProgressStatus::Processing).percent(), 33);
        assert_eq!(progress(1, 3, ProgressStatus::Processing).percent(), 66);
        assert_eq!(progress(2, 3, ProgressStatus::Processing).percent(), 100);
    }

    #[test]
    fn token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn report_sorts_outcomes() {
        let mut report = ExecutionReport::new(3);
        let failure = RenameFailure::new(ErrorKind::Provider, "locked");
        report.record(&progress(0, 3, ProgressStatus::Processing));
        report.record(&progress(
            0,
            3,
            ProgressStatus::Success {
                new_name: "x.jpg".to_string(),
                new_handle: MediaHandle::new("/p/x.jpg"),
            },
        ));
        report.record(&progress(1, 3, ProgressStatus::Failed(failure.clone())));
        report.record(&progress(2, 3, ProgressStatus::Skipped(failure)));

        let summary = report.summary();
        assert_eq!((summary.succeeded, summary.failed, summary.skipped), (1, 1, 1));
        assert_eq!(report.processed(), 3);
        assert_eq!(report.failed_items()[0].name, "1.jpg");
        assert_eq!(report.failed_numbered()[0].0, 1);
        assert_eq!(report.skipped[0].index, 2);
    }

    #[test]
    fn progress_is_serializable() {
        let p = progress(0, 1, ProgressStatus::Processing);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("processing"));
    }
}
