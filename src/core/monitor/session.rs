//! The worker side of a monitoring session.
//!
//! Owns the processed-file counter and is the only writer of the
//! monitor status while a session runs.

use super::backend::WatchSignal;
use super::{FileEventKind, FileSystemEvent, FilePattern, MonitorStatus, WatchedFolder};
use crate::core::executor::rename_guarded;
use crate::core::media::MediaItem;
use crate::core::naming::{validate_filename, FilenameGenerator};
use crate::core::preview::duplicate_name_failure;
use crate::core::providers::{check_conflict, ConflictChecker, DirectoryProvider, RenameProvider};
use crate::error::{ErrorKind, RenameFailure};
use crate::events::{Broadcaster, MonitorEvent, StateHolder};
use crossbeam_channel::Receiver;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, trace, warn};

pub(crate) struct MonitorSession {
    pub(crate) folder: WatchedFolder,
    pub(crate) pattern: FilePattern,
    pub(crate) generator: FilenameGenerator,
    pub(crate) provider: Arc<dyn RenameProvider>,
    pub(crate) checker: Arc<dyn ConflictChecker>,
    pub(crate) directories: Arc<dyn DirectoryProvider>,
    pub(crate) status: Arc<StateHolder<MonitorStatus>>,
    pub(crate) events: Arc<Broadcaster<MonitorEvent>>,
    pub(crate) files_processed: usize,
    /// Paths this session renamed files to, so the echo of that rename
    /// is not taken for a new arrival. An entry lives until the echo or
    /// a deletion of the path is seen.
    pub(crate) produced: HashSet<PathBuf>,
}

/// Outcome of one arrival
enum Arrival {
    Renamed(PathBuf),
    Skipped(RenameFailure),
    Failed(RenameFailure),
}

impl MonitorSession {
    /// Process signals until shutdown or a source failure
    pub(crate) fn run(mut self, signals: Receiver<WatchSignal>) {
        for signal in signals.iter() {
            if !self.handle(signal) {
                break;
            }
        }
        debug!(path = %self.folder.path.display(), "monitor worker exiting");
    }

    /// Returns false once the session is over
    pub(crate) fn handle(&mut self, signal: WatchSignal) -> bool {
        match signal {
            WatchSignal::Shutdown => false,
            WatchSignal::Failed(message) => {
                error!(path = %self.folder.path.display(), %message, "watch source failed");
                self.status.set(MonitorStatus::Error {
                    message: message.clone(),
                });
                self.events.publish(MonitorEvent::Error {
                    failure: RenameFailure::new(ErrorKind::Watch, message),
                });
                false
            }
            WatchSignal::Event(event) => {
                self.on_event(event);
                true
            }
        }
    }

    fn on_event(&mut self, event: FileSystemEvent) {
        // Produced names need not match the pattern
        match event.kind {
            FileEventKind::Created | FileEventKind::Moved if self.produced.remove(&event.path) => {
                trace!(path = %event.path.display(), "ignoring our own rename");
                return;
            }
            FileEventKind::Deleted => {
                self.produced.remove(&event.path);
            }
            _ => {}
        }

        if !self.pattern.matches_path(&event.path) {
            trace!(path = %event.path.display(), "ignoring non-matching file");
            return;
        }

        if event.kind == FileEventKind::Created && self.directories.is_directory(&event.path) {
            trace!(path = %event.path.display(), "ignoring new folder");
            return;
        }

        self.events.publish(MonitorEvent::FileObserved(event.clone()));

        if event.kind != FileEventKind::Created {
            return;
        }

        let index = self.files_processed;
        let outcome = self.rename_arrival(&event.path, index);
        self.files_processed += 1;
        self.status.set(MonitorStatus::Active {
            folder_path: self.folder.path.clone(),
            files_processed: self.files_processed,
        });

        match outcome {
            Arrival::Renamed(to) => {
                info!(from = %event.path.display(), to = %to.display(), "renamed new file");
                self.produced.insert(to.clone());
                self.events.publish(MonitorEvent::Renamed {
                    from: event.path,
                    to,
                });
            }
            Arrival::Skipped(failure) => {
                debug!(path = %event.path.display(), %failure, "new file skipped");
                self.events.publish(MonitorEvent::Skipped {
                    path: event.path,
                    failure,
                });
            }
            Arrival::Failed(failure) => {
                warn!(path = %event.path.display(), %failure, "could not rename new file");
                self.events.publish(MonitorEvent::RenameFailed {
                    path: event.path,
                    failure,
                });
            }
        }
    }

    fn rename_arrival(&self, path: &Path, index: usize) -> Arrival {
        // The provider decides whether the file is really there
        let item = MediaItem::from_path(path)
            .unwrap_or_else(|_| MediaItem::new(path, 0, SystemTime::now()));
        let config = &self.folder.config;

        let candidate = self.generator.generate(&item, config, index);
        if let Err(reason) = validate_filename(&candidate) {
            return Arrival::Failed(reason.into());
        }

        if check_conflict(self.checker.as_ref(), &item.handle, &candidate) {
            return Arrival::Skipped(duplicate_name_failure(&candidate));
        }

        match rename_guarded(self.provider.as_ref(), &item.handle, &candidate) {
            Ok(handle) => Arrival::Renamed(handle.path().to_path_buf()),
            Err(failure) => Arrival::Failed(failure),
        }
    }
}
