//! In-memory filesystem for testing.

use super::{BatchClaims, ConflictChecker, DirectoryProvider, RenameProvider};
use crate::core::media::{MediaHandle, MediaItem};
use crate::error::ProviderError;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

#[derive(Debug, Default)]
struct State {
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
    failing_names: HashSet<String>,
    checker_broken: bool,
    claims: BatchClaims,
    rename_calls: Vec<(PathBuf, String)>,
}

/// In-memory filesystem implementing every provider trait.
///
/// Useful for tests: failures can be injected per file name and every
/// rename call is recorded.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    state: Mutex<State>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the rest
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a directory (and its ancestors)
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            state.dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Create a file and return the item describing it
    pub fn add_file(&self, path: impl AsRef<Path>, size: u64) -> MediaItem {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        let mut state = self.state();
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(state.files.len() as u64);
        state.files.insert(path.clone());
        MediaItem::new(path, size, modified)
    }

    pub fn contains_file(&self, path: impl AsRef<Path>) -> bool {
        self.state().files.contains(path.as_ref())
    }

    /// All file paths, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        self.state().files.iter().cloned().collect()
    }

    /// Make every rename of a file with this current name fail
    pub fn fail_renames_of(&self, name: impl Into<String>) {
        self.state().failing_names.insert(name.into());
    }

    /// Undo every `fail_renames_of`
    pub fn clear_failures(&self) {
        self.state().failing_names.clear();
    }

    /// Make every conflict check return an error
    pub fn break_conflict_checker(&self) {
        self.state().checker_broken = true;
    }

    /// (source path, requested name) for every rename attempted
    pub fn rename_calls(&self) -> Vec<(PathBuf, String)> {
        self.state().rename_calls.clone()
    }
}

impl RenameProvider for InMemoryFileSystem {
    fn rename(&self, handle: &MediaHandle, new_name: &str) -> Result<MediaHandle, ProviderError> {
        let mut state = self.state();
        let source = handle.path().to_path_buf();
        state.rename_calls.push((source.clone(), new_name.to_string()));

        let current_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if state.failing_names.contains(&current_name) {
            return Err(ProviderError::Io {
                path: source,
                reason: "injected failure".to_string(),
            });
        }

        if !state.files.contains(&source) {
            return Err(ProviderError::NotFound { path: source });
        }

        let target = handle.with_name(new_name);
        if target.path() != source && state.files.contains(target.path()) {
            return Err(ProviderError::AlreadyExists {
                path: target.path().to_path_buf(),
            });
        }

        state.files.remove(&source);
        state.files.insert(target.path().to_path_buf());
        Ok(target)
    }
}

impl ConflictChecker for InMemoryFileSystem {
    fn begin_batch(&self) {
        self.state().claims.clear();
    }

    fn has_conflict(&self, handle: &MediaHandle, candidate: &str) -> Result<bool, ProviderError> {
        let mut state = self.state();
        if state.checker_broken {
            return Err(ProviderError::Unavailable("injected checker failure".to_string()));
        }

        let dir = handle.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        if state.claims.is_claimed(&dir, candidate) {
            return Ok(true);
        }

        // Paths are stored case-sensitively; only the item itself may
        // share the candidate's name
        let wanted = candidate.to_lowercase();
        let exists = state.files.iter().any(|f| {
            f.as_path() != handle.path()
                && f.parent() == Some(dir.as_path())
                && f.file_name()
                    .map(|n| n.to_string_lossy().to_lowercase() == wanted)
                    .unwrap_or(false)
        });
        if exists {
            return Ok(true);
        }

        state.claims.claim(&dir, candidate);
        Ok(false)
    }
}

impl DirectoryProvider for InMemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.files.contains(path) || state.dirs.contains(path)
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }
}
