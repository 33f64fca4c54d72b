//! # Monitor Module
//!
//! Watches one folder and renames matching files as they arrive.
//!
//! ## States
//! - `Inactive` - nothing watched
//! - `Active` - watching; carries the folder and how many arrivals were handled
//! - `Error` - the folder could not be watched, or the watch source failed
//!
//! `start` always stops any previous session first, and `stop` returns to
//! `Inactive` from any state. Only `Created` events for files are renamed;
//! other matching events are reported and leave the counter alone, and
//! new sub-folders are ignored.
//!
//! Events are handled on a dedicated worker thread, so a slow rename never
//! blocks delivery from the OS watcher.

mod backend;
mod pattern;
mod session;

pub use backend::{ManualWatchBackend, NotifyWatchBackend, WatchBackend, WatchSignal};
pub use pattern::FilePattern;

use crate::core::media::MediaHandle;
use crate::core::naming::{FilenameGenerator, RenameConfig};
use crate::core::providers::{
    ConflictChecker, DirectoryProvider, FsConflictChecker, FsDirectoryProvider, FsRenameProvider,
    RenameProvider,
};
use crate::error::WatchError;
use crate::events::{Broadcaster, MonitorEvent, StateHolder};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use session::MonitorSession;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Kind of filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

/// A filesystem change observed in a watched folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
    pub timestamp: DateTime<Utc>,
}

impl FileSystemEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// A folder to watch and how to rename what lands in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedFolder {
    pub path: PathBuf,
    pub handle: MediaHandle,
    pub config: RenameConfig,
    /// Glob over file names; `None` matches everything
    pub pattern: Option<String>,
    pub recursive: bool,
    pub active: bool,
}

impl WatchedFolder {
    pub fn new(path: impl Into<PathBuf>, config: RenameConfig) -> Self {
        let path = path.into();
        Self {
            handle: MediaHandle::new(path.clone()),
            path,
            config,
            pattern: None,
            recursive: false,
            active: false,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Where the monitor stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorStatus {
    Inactive,
    Active {
        folder_path: PathBuf,
        files_processed: usize,
    },
    Error {
        message: String,
    },
}

impl MonitorStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, MonitorStatus::Active { .. })
    }
}

struct RunningSession {
    folder: WatchedFolder,
    control: Sender<WatchSignal>,
    worker: JoinHandle<()>,
}

/// Folder monitor state machine
pub struct FolderMonitor {
    backend: Box<dyn WatchBackend>,
    directories: Arc<dyn DirectoryProvider>,
    provider: Arc<dyn RenameProvider>,
    checker: Arc<dyn ConflictChecker>,
    generator: FilenameGenerator,
    status: Arc<StateHolder<MonitorStatus>>,
    events: Arc<Broadcaster<MonitorEvent>>,
    session: Option<RunningSession>,
}

impl FolderMonitor {
    pub fn new(
        backend: Box<dyn WatchBackend>,
        directories: Arc<dyn DirectoryProvider>,
        provider: Arc<dyn RenameProvider>,
        checker: Arc<dyn ConflictChecker>,
    ) -> Self {
        Self {
            backend,
            directories,
            provider,
            checker,
            generator: FilenameGenerator::new(),
            status: Arc::new(StateHolder::new(MonitorStatus::Inactive)),
            events: Arc::new(Broadcaster::new()),
            session: None,
        }
    }

    /// Monitor backed by the OS watcher and the real filesystem
    pub fn on_filesystem() -> Self {
        Self::new(
            Box::new(NotifyWatchBackend::new()),
            Arc::new(FsDirectoryProvider),
            Arc::new(FsRenameProvider),
            Arc::new(FsConflictChecker::new()),
        )
    }

    pub fn with_generator(mut self, generator: FilenameGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Start monitoring `folder`, replacing any running session.
    ///
    /// On failure the status becomes `Error` and the error is returned;
    /// the monitor never passes through `Active`.
    pub fn start(&mut self, mut folder: WatchedFolder) -> Result<(), WatchError> {
        self.stop();

        let pattern = match self.prepare(&folder) {
            Ok(pattern) => pattern,
            Err(error) => return Err(self.fail(error)),
        };

        let (control, signals) = unbounded();
        if let Err(error) = self
            .backend
            .watch(&folder.path, folder.recursive, control.clone())
        {
            return Err(self.fail(error));
        }

        folder.active = true;
        self.checker.begin_batch();
        self.status.set(MonitorStatus::Active {
            folder_path: folder.path.clone(),
            files_processed: 0,
        });
        self.events.publish(MonitorEvent::Started {
            path: folder.path.clone(),
        });

        let session = MonitorSession {
            folder: folder.clone(),
            pattern,
            generator: self.generator.clone(),
            provider: Arc::clone(&self.provider),
            checker: Arc::clone(&self.checker),
            directories: Arc::clone(&self.directories),
            status: Arc::clone(&self.status),
            events: Arc::clone(&self.events),
            files_processed: 0,
            produced: HashSet::new(),
        };

        let worker = thread::Builder::new()
            .name("folder-monitor".to_string())
            .spawn(move || session.run(signals));

        match worker {
            Ok(worker) => {
                info!(
                    path = %folder.path.display(),
                    pattern = folder.pattern.as_deref().unwrap_or("*"),
                    recursive = folder.recursive,
                    "monitoring started"
                );
                self.session = Some(RunningSession {
                    folder,
                    control,
                    worker,
                });
                Ok(())
            }
            Err(e) => {
                if let Err(error) = self.backend.unwatch() {
                    warn!(%error, "failed to release watch");
                }
                Err(self.fail(WatchError::WatchFailed {
                    path: folder.path,
                    reason: e.to_string(),
                }))
            }
        }
    }

    fn prepare(&self, folder: &WatchedFolder) -> Result<FilePattern, WatchError> {
        if !self.directories.exists(&folder.path) {
            return Err(WatchError::PathNotFound(folder.path.clone()));
        }
        if !self.directories.is_directory(&folder.path) {
            return Err(WatchError::NotADirectory(folder.path.clone()));
        }
        folder.config.validate()?;
        FilePattern::new(folder.pattern.as_deref())
    }

    fn fail(&self, error: WatchError) -> WatchError {
        warn!(%error, "could not start monitoring");
        self.status.set(MonitorStatus::Error {
            message: error.to_string(),
        });
        error
    }

    /// Stop monitoring. Always ends `Inactive`.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            if self.status.get() != MonitorStatus::Inactive {
                self.status.set(MonitorStatus::Inactive);
            }
            return;
        };

        if let Err(error) = self.backend.unwatch() {
            warn!(%error, "failed to release watch");
        }
        // The worker may already be gone after a source failure
        let _ = session.control.send(WatchSignal::Shutdown);
        if session.worker.join().is_err() {
            warn!("monitor worker panicked");
        }

        self.status.set(MonitorStatus::Inactive);
        self.events.publish(MonitorEvent::Stopped {
            path: session.folder.path.clone(),
        });
        info!(path = %session.folder.path.display(), "monitoring stopped");
    }

    pub fn status(&self) -> MonitorStatus {
        self.status.get()
    }

    /// Current status, then every change
    pub fn subscribe_status(&self) -> Receiver<MonitorStatus> {
        self.status.subscribe()
    }

    /// Everything the monitor observes and does from now on
    pub fn subscribe_events(&self) -> Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// The folder of the running session, if any
    pub fn watched_folder(&self) -> Option<&WatchedFolder> {
        self.session.as_ref().map(|s| &s.folder)
    }
}

impl Drop for FolderMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::InMemoryFileSystem;
    use crate::error::ErrorKind;
    use std::path::Path;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn setup() -> (Arc<InMemoryFileSystem>, ManualWatchBackend, FolderMonitor) {
        let fs = Arc::new(InMemoryFileSystem::new());
        fs.add_dir("/inbox");
        let backend = ManualWatchBackend::new();
        let monitor = FolderMonitor::new(
            Box::new(backend.clone()),
            fs.clone(),
            fs.clone(),
            fs.clone(),
        );
        (fs, backend, monitor)
    }

    fn folder() -> WatchedFolder {
        WatchedFolder::new("/inbox", RenameConfig::new("inbox_"))
    }

    /// Wait for the first event that is not a plain observation
    fn next_outcome(events: &Receiver<MonitorEvent>) -> MonitorEvent {
        loop {
            match events.recv_timeout(WAIT).expect("monitor event") {
                MonitorEvent::FileObserved(_) => continue,
                other => return other,
            }
        }
    }

    fn arrive(fs: &InMemoryFileSystem, backend: &ManualWatchBackend, path: &str) {
        fs.add_file(path, 10);
        assert!(backend.emit(FileSystemEvent::new(path, FileEventKind::Created)));
    }

    fn processed(status: &MonitorStatus) -> usize {
        match status {
            MonitorStatus::Active {
                files_processed, ..
            } => *files_processed,
            other => panic!("not active: {:?}", other),
        }
    }

    #[test]
    fn missing_folder_fails_without_going_active() {
        let (_fs, backend, mut monitor) = setup();
        let statuses = monitor.subscribe_status();

        let result = monitor.start(WatchedFolder::new("/nope", RenameConfig::default()));

        assert!(matches!(result, Err(WatchError::PathNotFound(_))));
        assert!(matches!(monitor.status(), MonitorStatus::Error { .. }));
        assert!(statuses.try_iter().all(|s| !s.is_active()));
        assert_eq!(backend.registrations(), 0);
    }

    #[test]
    fn file_path_is_not_a_folder() {
        let (fs, _backend, mut monitor) = setup();
        fs.add_file("/inbox/a.jpg", 1);

        let result = monitor.start(WatchedFolder::new("/inbox/a.jpg", RenameConfig::default()));
        assert!(matches!(result, Err(WatchError::NotADirectory(_))));
    }

    #[test]
    fn invalid_config_is_rejected_at_start() {
        let (_fs, _backend, mut monitor) = setup();
        let result = monitor.start(WatchedFolder::new("/inbox", RenameConfig::new("")));
        assert!(matches!(result, Err(WatchError::InvalidConfig(_))));
    }

    #[test]
    fn refused_registration_sets_error() {
        let (_fs, backend, mut monitor) = setup();
        backend.refuse_registration(true);

        assert!(monitor.start(folder()).is_err());
        assert!(matches!(monitor.status(), MonitorStatus::Error { .. }));
    }

    #[test]
    fn start_goes_active_with_zero_processed() {
        let (_fs, backend, mut monitor) = setup();
        monitor.start(folder()).unwrap();

        assert_eq!(
            monitor.status(),
            MonitorStatus::Active {
                folder_path: PathBuf::from("/inbox"),
                files_processed: 0
            }
        );
        assert_eq!(backend.watched_path(), Some(PathBuf::from("/inbox")));
        assert!(monitor.watched_folder().unwrap().active);
    }

    #[test]
    fn created_file_is_renamed_and_counted() {
        let (fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();

        arrive(&fs, &backend, "/inbox/IMG_9.jpg");

        match next_outcome(&events) {
            MonitorEvent::Started { .. } => {}
            other => panic!("unexpected {:?}", other),
        }
        match next_outcome(&events) {
            MonitorEvent::Renamed { from, to } => {
                assert_eq!(from, PathBuf::from("/inbox/IMG_9.jpg"));
                assert_eq!(to, PathBuf::from("/inbox/inbox_001.jpg"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(processed(&monitor.status()), 1);
        assert!(fs.contains_file("/inbox/inbox_001.jpg"));
    }

    #[test]
    fn only_created_events_advance_the_counter() {
        let (fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();

        fs.add_file("/inbox/old.jpg", 1);
        backend.emit(FileSystemEvent::new("/inbox/old.jpg", FileEventKind::Modified));
        backend.emit(FileSystemEvent::new("/inbox/old.jpg", FileEventKind::Moved));
        arrive(&fs, &backend, "/inbox/new.jpg");

        let mut observed = Vec::new();
        loop {
            match events.recv_timeout(WAIT).unwrap() {
                MonitorEvent::FileObserved(e) => observed.push(e.kind),
                MonitorEvent::Renamed { .. } => break,
                MonitorEvent::Started { .. } => {}
                other => panic!("unexpected {:?}", other),
            }
        }

        assert_eq!(
            observed,
            vec![
                FileEventKind::Modified,
                FileEventKind::Moved,
                FileEventKind::Created
            ]
        );
        assert_eq!(processed(&monitor.status()), 1);
        assert!(fs.contains_file("/inbox/old.jpg"));
    }

    #[test]
    fn pattern_filters_arrivals() {
        let (fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder().with_pattern("IMG_*.jpg")).unwrap();

        arrive(&fs, &backend, "/inbox/video.mp4");
        arrive(&fs, &backend, "/inbox/IMG_001.png");
        arrive(&fs, &backend, "/inbox/IMG_001.jpg");

        next_outcome(&events);
        match next_outcome(&events) {
            MonitorEvent::Renamed { from, .. } => {
                assert_eq!(from, PathBuf::from("/inbox/IMG_001.jpg"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(processed(&monitor.status()), 1);
        assert!(fs.contains_file("/inbox/video.mp4"));
    }

    #[test]
    fn own_renames_are_not_new_arrivals() {
        let (fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();
        next_outcome(&events);

        arrive(&fs, &backend, "/inbox/a.jpg");
        next_outcome(&events);
        backend.emit(FileSystemEvent::new(
            "/inbox/inbox_001.jpg",
            FileEventKind::Created,
        ));
        arrive(&fs, &backend, "/inbox/b.jpg");

        match next_outcome(&events) {
            MonitorEvent::Renamed { to, .. } => {
                assert_eq!(to, PathBuf::from("/inbox/inbox_002.jpg"))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(processed(&monitor.status()), 2);
    }

    #[test]
    fn new_sub_folder_is_left_alone() {
        let (fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();
        next_outcome(&events);

        fs.add_dir("/inbox/Holiday Album");
        backend.emit(FileSystemEvent::new(
            "/inbox/Holiday Album",
            FileEventKind::Created,
        ));
        arrive(&fs, &backend, "/inbox/a.jpg");

        match next_outcome(&events) {
            MonitorEvent::Renamed { from, to } => {
                assert_eq!(from, PathBuf::from("/inbox/a.jpg"));
                assert_eq!(to, PathBuf::from("/inbox/inbox_001.jpg"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(processed(&monitor.status()), 1);
        assert!(fs.is_directory(Path::new("/inbox/Holiday Album")));
        assert!(fs
            .rename_calls()
            .iter()
            .all(|(from, _)| from != Path::new("/inbox/Holiday Album")));
    }

    #[test]
    fn rename_echo_reported_as_move_is_swallowed_once() {
        let (fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();
        next_outcome(&events);

        arrive(&fs, &backend, "/inbox/a.jpg");
        next_outcome(&events);
        backend.emit(FileSystemEvent::new("/inbox/inbox_001.jpg", FileEventKind::Moved));

        // A later arrival reusing the name is a real arrival
        arrive(&fs, &backend, "/inbox/inbox_001.jpg");

        let mut observed = Vec::new();
        loop {
            match events.recv_timeout(WAIT).unwrap() {
                MonitorEvent::FileObserved(e) => observed.push((e.kind, e.path)),
                MonitorEvent::Renamed { from, to } => {
                    assert_eq!(from, PathBuf::from("/inbox/inbox_001.jpg"));
                    assert_eq!(to, PathBuf::from("/inbox/inbox_002.jpg"));
                    break;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(
            observed,
            vec![(FileEventKind::Created, PathBuf::from("/inbox/inbox_001.jpg"))]
        );
        assert_eq!(processed(&monitor.status()), 2);
    }

    #[test]
    fn deleting_a_renamed_file_forgets_it() {
        let (fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();
        next_outcome(&events);

        arrive(&fs, &backend, "/inbox/a.jpg");
        next_outcome(&events);

        backend.emit(FileSystemEvent::new("/inbox/inbox_001.jpg", FileEventKind::Deleted));
        arrive(&fs, &backend, "/inbox/inbox_001.jpg");

        match next_outcome(&events) {
            MonitorEvent::Renamed { from, to } => {
                assert_eq!(from, PathBuf::from("/inbox/inbox_001.jpg"));
                assert_eq!(to, PathBuf::from("/inbox/inbox_002.jpg"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(processed(&monitor.status()), 2);
    }

    #[test]
    fn colliding_arrival_is_skipped_but_counted() {
        let (fs, backend, mut monitor) = setup();
        fs.add_file("/inbox/inbox_001.jpg", 1);
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();
        next_outcome(&events);

        arrive(&fs, &backend, "/inbox/a.jpg");

        match next_outcome(&events) {
            MonitorEvent::Skipped { failure, .. } => assert_eq!(failure.kind, ErrorKind::Conflict),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(processed(&monitor.status()), 1);
        assert!(fs.contains_file("/inbox/a.jpg"));
    }

    #[test]
    fn source_failure_moves_to_error() {
        let (_fs, backend, mut monitor) = setup();
        let events = monitor.subscribe_events();
        monitor.start(folder()).unwrap();
        next_outcome(&events);

        backend.fail("inotify queue overflow");

        match next_outcome(&events) {
            MonitorEvent::Error { failure } => {
                assert_eq!(failure.kind, ErrorKind::Watch);
                assert!(failure.reason.contains("overflow"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            monitor.status(),
            MonitorStatus::Error {
                message: "inotify queue overflow".to_string()
            }
        );

        monitor.stop();
        assert_eq!(monitor.status(), MonitorStatus::Inactive);
    }

    #[test]
    fn stop_unwatches_and_goes_inactive() {
        let (_fs, backend, mut monitor) = setup();
        monitor.start(folder()).unwrap();

        monitor.stop();

        assert_eq!(monitor.status(), MonitorStatus::Inactive);
        assert!(!backend.is_watching());
        assert!(monitor.watched_folder().is_none());

        monitor.stop();
        assert_eq!(monitor.status(), MonitorStatus::Inactive);
    }

    #[test]
    fn stop_clears_a_failed_start() {
        let (_fs, _backend, mut monitor) = setup();
        let _ = monitor.start(WatchedFolder::new("/nope", RenameConfig::default()));

        monitor.stop();
        assert_eq!(monitor.status(), MonitorStatus::Inactive);
    }

    #[test]
    fn restarting_replaces_the_session() {
        let (fs, backend, mut monitor) = setup();
        fs.add_dir("/other");
        monitor.start(folder()).unwrap();

        monitor
            .start(WatchedFolder::new("/other", RenameConfig::new("o_")))
            .unwrap();

        assert_eq!(backend.watched_path(), Some(PathBuf::from("/other")));
        assert_eq!(backend.registrations(), 2);
        assert_eq!(processed(&monitor.status()), 0);
    }

    #[test]
    fn late_status_subscriber_sees_current_state() {
        let (_fs, _backend, mut monitor) = setup();
        monitor.start(folder()).unwrap();

        let statuses = monitor.subscribe_status();
        assert!(statuses.try_recv().unwrap().is_active());
    }
}
