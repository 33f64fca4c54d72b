//! Filesystem watch backends.
//!
//! A backend registers a folder with some event source and pushes
//! `WatchSignal`s into the sink it is given. Registration and
//! deregistration are symmetric: every `watch` is undone by `unwatch`.

use super::{FileEventKind, FileSystemEvent};
use crate::error::WatchError;
use crossbeam_channel::Sender;
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// What a backend delivers to the monitor
#[derive(Debug, Clone)]
pub enum WatchSignal {
    Event(FileSystemEvent),
    /// The event source failed; the session cannot continue
    Failed(String),
    /// Sent by the monitor itself to end its worker
    Shutdown,
}

/// An OS (or fake) filesystem watch
pub trait WatchBackend: Send {
    /// Start delivering events for `path` into `sink`
    fn watch(
        &mut self,
        path: &Path,
        recursive: bool,
        sink: Sender<WatchSignal>,
    ) -> Result<(), WatchError>;

    /// Stop delivering events. Calling it while not watching is a no-op.
    fn unwatch(&mut self) -> Result<(), WatchError>;
}

/// Backend using the platform's recommended `notify` watcher
#[derive(Default)]
pub struct NotifyWatchBackend {
    active: Option<(RecommendedWatcher, PathBuf)>,
}

impl NotifyWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a notify event into zero or more filesystem events.
    ///
    /// A rename is reported once, as `Moved` for its destination. inotify
    /// sends `From`, `To` and then `Both` for one rename, so `From` becomes
    /// a deletion of the old path and `Both` is dropped.
    fn translate(event: Event) -> Vec<FileSystemEvent> {
        let kind = match event.kind {
            EventKind::Create(CreateKind::Folder) => return Vec::new(),
            EventKind::Create(_) => FileEventKind::Created,
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => FileEventKind::Deleted,
                RenameMode::To => FileEventKind::Moved,
                RenameMode::Both => return Vec::new(),
                // Backends that cannot tell the two sides apart
                RenameMode::Any | RenameMode::Other => {
                    return event
                        .paths
                        .into_iter()
                        .map(|path| {
                            let kind = if path.exists() {
                                FileEventKind::Moved
                            } else {
                                FileEventKind::Deleted
                            };
                            FileSystemEvent::new(path, kind)
                        })
                        .collect();
                }
            },
            EventKind::Modify(_) => FileEventKind::Modified,
            EventKind::Remove(_) => FileEventKind::Deleted,
            _ => return Vec::new(),
        };

        event
            .paths
            .into_iter()
            .map(|path| FileSystemEvent::new(path, kind))
            .collect()
    }
}

impl WatchBackend for NotifyWatchBackend {
    fn watch(
        &mut self,
        path: &Path,
        recursive: bool,
        sink: Sender<WatchSignal>,
    ) -> Result<(), WatchError> {
        self.unwatch()?;

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for translated in Self::translate(event) {
                        let _ = sink.send(WatchSignal::Event(translated));
                    }
                }
                Err(e) => {
                    let _ = sink.send(WatchSignal::Failed(e.to_string()));
                }
            }
        })
        .map_err(|e| WatchError::WatchFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        watcher
            .watch(path, mode)
            .map_err(|e| WatchError::WatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        self.active = Some((watcher, path.to_path_buf()));
        Ok(())
    }

    fn unwatch(&mut self) -> Result<(), WatchError> {
        if let Some((mut watcher, path)) = self.active.take() {
            watcher
                .unwatch(&path)
                .map_err(|e| WatchError::UnwatchFailed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ManualState {
    sink: Option<Sender<WatchSignal>>,
    watched: Option<PathBuf>,
    registrations: usize,
    refuse_registration: bool,
}

/// Backend driven by hand, for tests and for feeding events from a
/// source the crate does not know about
#[derive(Debug, Clone, Default)]
pub struct ManualWatchBackend {
    state: Arc<Mutex<ManualState>>,
}

impl ManualWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the next registrations fail
    pub fn refuse_registration(&self, refuse: bool) {
        self.state().refuse_registration = refuse;
    }

    /// Deliver an event; returns false if nothing is being watched
    pub fn emit(&self, event: FileSystemEvent) -> bool {
        self.send(WatchSignal::Event(event))
    }

    /// Report a failure of the event source
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.send(WatchSignal::Failed(message.into()))
    }

    fn send(&self, signal: WatchSignal) -> bool {
        match &self.state().sink {
            Some(sink) => sink.send(signal).is_ok(),
            None => false,
        }
    }

    pub fn watched_path(&self) -> Option<PathBuf> {
        self.state().watched.clone()
    }

    pub fn is_watching(&self) -> bool {
        self.state().sink.is_some()
    }

    /// Number of successful `watch` calls so far
    pub fn registrations(&self) -> usize {
        self.state().registrations
    }
}

impl WatchBackend for ManualWatchBackend {
    fn watch(
        &mut self,
        path: &Path,
        _recursive: bool,
        sink: Sender<WatchSignal>,
    ) -> Result<(), WatchError> {
        let mut state = self.state();
        if state.refuse_registration {
            return Err(WatchError::WatchFailed {
                path: path.to_path_buf(),
                reason: "registration refused".to_string(),
            });
        }
        state.sink = Some(sink);
        state.watched = Some(path.to_path_buf());
        state.registrations += 1;
        Ok(())
    }

    fn unwatch(&mut self) -> Result<(), WatchError> {
        let mut state = self.state();
        state.sink = None;
        state.watched = None;
        Ok(())
    }
}
