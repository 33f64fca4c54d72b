//! Event type definitions for progress reporting.

use crate::core::executor::{ExecutionProgress, ExecutionSummary};
use crate::core::monitor::FileSystemEvent;
use crate::error::RenameFailure;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the renamer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Batch rename events
    Rename(RenameEvent),
    /// Folder monitor events
    Monitor(MonitorEvent),
}

/// Events from a batch rename
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenameEvent {
    /// The batch was handed to the executor
    Started { total: usize },
    /// One item changed state
    Progress(ExecutionProgress),
    /// Every item reached a terminal status
    Completed { summary: ExecutionSummary },
    /// The batch stopped early because it was cancelled
    Cancelled { summary: ExecutionSummary },
}

/// Events from the folder monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MonitorEvent {
    /// Monitoring started on a folder
    Started { path: PathBuf },
    /// Monitoring stopped
    Stopped { path: PathBuf },
    /// A filesystem event matching the pattern was seen
    FileObserved(FileSystemEvent),
    /// A new arrival was renamed
    Renamed { from: PathBuf, to: PathBuf },
    /// A new arrival collided with an existing name and was left alone
    Skipped { path: PathBuf, failure: RenameFailure },
    /// A new arrival could not be renamed
    RenameFailed { path: PathBuf, failure: RenameFailure },
    /// The watch source failed; monitoring is over until restarted.
    /// The failure's kind is always `Watch`.
    Error { failure: RenameFailure },
}
