//! # Providers Module
//!
//! The filesystem collaborators the rename core talks to.
//!
//! ## Traits
//! - `RenameProvider` - commits a rename
//! - `ConflictChecker` - decides whether a candidate collides
//! - `DirectoryProvider` - answers existence questions for the monitor
//!
//! ## Implementations
//! - `fs` - real filesystem
//! - `memory` - in-memory filesystem for tests and dry runs
//!
//! ## Fail-open conflict checks
//! A checker that errors is treated as reporting "no conflict" so a flaky
//! check never blocks a legitimate rename. `check_conflict` is the only
//! place that policy lives; preview, executor and monitor all go through it.

mod fs;
mod memory;

pub use fs::{FsConflictChecker, FsDirectoryProvider, FsRenameProvider};
pub use memory::InMemoryFileSystem;

use crate::core::media::MediaHandle;
use crate::error::ProviderError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Commits renames
pub trait RenameProvider: Send + Sync {
    /// Rename the entry behind `handle` to `new_name` in the same folder
    fn rename(&self, handle: &MediaHandle, new_name: &str) -> Result<MediaHandle, ProviderError>;

    /// Rename several entries. An individual failure never stops the rest.
    fn batch_rename(
        &self,
        pairs: &[(MediaHandle, String)],
    ) -> HashMap<MediaHandle, Result<MediaHandle, ProviderError>> {
        pairs
            .iter()
            .map(|(handle, name)| (handle.clone(), self.rename(handle, name)))
            .collect()
    }
}

/// Decides whether a candidate name collides with an existing file or
/// with a name already handed out in the current batch
pub trait ConflictChecker: Send + Sync {
    /// Forget the names claimed by the previous batch
    fn begin_batch(&self) {}

    /// True if `candidate` cannot be used for the item behind `handle`.
    /// A successful non-conflicting check claims the name for the batch.
    fn has_conflict(&self, handle: &MediaHandle, candidate: &str) -> Result<bool, ProviderError>;
}

/// Existence checks used before a folder is watched
pub trait DirectoryProvider: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_directory(&self, path: &Path) -> bool;
}

/// Ask the checker, treating checker errors as "no conflict".
pub fn check_conflict(checker: &dyn ConflictChecker, handle: &MediaHandle, candidate: &str) -> bool {
    match checker.has_conflict(handle, candidate) {
        Ok(conflict) => conflict,
        Err(error) => {
            warn!(
                path = %handle.path().display(),
                candidate,
                %error,
                "conflict check failed, allowing rename"
            );
            false
        }
    }
}

/// Names handed out in the current batch, per folder, case-insensitive
#[derive(Debug, Default)]
pub(crate) struct BatchClaims {
    claimed: HashSet<(PathBuf, String)>,
}

impl BatchClaims {
    pub(crate) fn is_claimed(&self, dir: &Path, name: &str) -> bool {
        self.claimed
            .contains(&(dir.to_path_buf(), name.to_lowercase()))
    }

    pub(crate) fn claim(&mut self, dir: &Path, name: &str) {
        self.claimed.insert((dir.to_path_buf(), name.to_lowercase()));
    }

    pub(crate) fn clear(&mut self) {
        self.claimed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenChecker;

    impl ConflictChecker for BrokenChecker {
        fn has_conflict(&self, _: &MediaHandle, _: &str) -> Result<bool, ProviderError> {
            Err(ProviderError::Unavailable("index offline".to_string()))
        }
    }

    #[test]
    fn conflict_checks_fail_open() {
        let handle = MediaHandle::new("/photos/a.jpg");
        assert!(!check_conflict(&BrokenChecker, &handle, "photo001.jpg"));
    }

    #[test]
    fn claims_are_per_folder_and_case_insensitive() {
        let mut claims = BatchClaims::default();
        claims.claim(Path::new("/a"), "Photo001.jpg");
        assert!(claims.is_claimed(Path::new("/a"), "photo001.JPG"));
        assert!(!claims.is_claimed(Path::new("/b"), "photo001.jpg"));
        claims.clear();
        assert!(!claims.is_claimed(Path::new("/a"), "photo001.jpg"));
    }
}
