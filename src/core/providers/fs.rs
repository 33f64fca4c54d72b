//! Real filesystem providers.

use super::{BatchClaims, ConflictChecker, DirectoryProvider, RenameProvider};
use crate::core::media::MediaHandle;
use crate::error::ProviderError;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Renames files in place with `std::fs::rename`.
///
/// Refuses to overwrite an existing file. A change of case only is
/// allowed when the target name resolves to the source file itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRenameProvider;

impl RenameProvider for FsRenameProvider {
    fn rename(&self, handle: &MediaHandle, new_name: &str) -> Result<MediaHandle, ProviderError> {
        let source = handle.path();
        let target = handle.with_name(new_name);

        if target.path() == source {
            return Ok(target);
        }

        if !source.exists() {
            return Err(ProviderError::NotFound {
                path: source.to_path_buf(),
            });
        }

        match fs::symlink_metadata(target.path()) {
            Ok(_) if !is_same_file(source, target.path()).unwrap_or(false) => {
                return Err(ProviderError::AlreadyExists {
                    path: target.path().to_path_buf(),
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ProviderError::from_io(target.path(), &e)),
        }

        fs::rename(source, target.path()).map_err(|e| ProviderError::from_io(source, &e))?;
        debug!(from = %source.display(), to = %target.path().display(), "renamed");
        Ok(target)
    }
}

/// Checks the item's folder for an existing entry with the candidate name,
/// plus the names already claimed in the batch
#[derive(Debug, Default)]
pub struct FsConflictChecker {
    claims: Mutex<BatchClaims>,
}

impl FsConflictChecker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConflictChecker for FsConflictChecker {
    fn begin_batch(&self) {
        if let Ok(mut claims) = self.claims.lock() {
            claims.clear();
        }
    }

    fn has_conflict(&self, handle: &MediaHandle, candidate: &str) -> Result<bool, ProviderError> {
        let dir = handle
            .parent()
            .ok_or_else(|| ProviderError::NotFound {
                path: handle.path().to_path_buf(),
            })?
            .to_path_buf();

        let mut claims = self
            .claims
            .lock()
            .map_err(|_| ProviderError::Unavailable("conflict claims poisoned".to_string()))?;

        if claims.is_claimed(&dir, candidate) {
            return Ok(true);
        }

        let target = dir.join(candidate);
        match fs::symlink_metadata(&target) {
            Ok(_) if !is_same_file(handle.path(), &target).unwrap_or(false) => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ProviderError::from_io(target, &e)),
        }

        claims.claim(&dir, candidate);
        Ok(false)
    }
}

/// Whether both paths name the same file on disk.
///
/// On a case-insensitive volume `Photo.jpg` and `photo.jpg` are one file;
/// on a case-sensitive one they may be two.
fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let (a, b) = (fs::metadata(a)?, fs::metadata(b)?);
        Ok(a.dev() == b.dev() && a.ino() == b.ino())
    }

    #[cfg(not(unix))]
    {
        Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
    }
}

/// Answers directory questions from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDirectoryProvider;

impl DirectoryProvider for FsDirectoryProvider {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rename_moves_file_within_folder() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("IMG_1.jpg");
        fs::write(&source, b"x").unwrap();

        let renamed = FsRenameProvider
            .rename(&MediaHandle::new(&source), "photo001.jpg")
            .unwrap();

        assert_eq!(renamed.path(), temp.path().join("photo001.jpg"));
        assert!(!source.exists());
        assert!(renamed.path().exists());
    }

    #[test]
    fn rename_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"a").unwrap();
        fs::write(temp.path().join("b.jpg"), b"b").unwrap();

        let result = FsRenameProvider.rename(&MediaHandle::new(temp.path().join("a.jpg")), "b.jpg");

        assert!(matches!(result, Err(ProviderError::AlreadyExists { .. })));
        assert_eq!(fs::read(temp.path().join("b.jpg")).unwrap(), b"b");
    }

    #[test]
    fn rename_of_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result =
            FsRenameProvider.rename(&MediaHandle::new(temp.path().join("gone.jpg")), "x.jpg");
        assert!(matches!(result, Err(ProviderError::NotFound { .. })));
    }

    #[test]
    fn checker_sees_existing_files_and_batch_claims() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("taken.jpg"), b"x").unwrap();
        let a = MediaHandle::new(temp.path().join("a.jpg"));
        let b = MediaHandle::new(temp.path().join("b.jpg"));

        let checker = FsConflictChecker::new();
        checker.begin_batch();
        assert!(checker.has_conflict(&a, "taken.jpg").unwrap());
        assert!(!checker.has_conflict(&a, "new.jpg").unwrap());
        assert!(checker.has_conflict(&b, "NEW.jpg").unwrap());

        checker.begin_batch();
        assert!(!checker.has_conflict(&b, "new.jpg").unwrap());
    }

    #[test]
    fn own_name_is_not_a_conflict() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"x").unwrap();
        let a = MediaHandle::new(temp.path().join("a.jpg"));

        assert!(!FsConflictChecker::new().has_conflict(&a, "a.jpg").unwrap());
    }

    /// Creates two files whose names differ only in case; `None` when the
    /// volume folds case and only one file exists
    fn case_twins(temp: &TempDir) -> Option<(MediaHandle, MediaHandle)> {
        let upper = temp.path().join("Photo_001.jpg");
        let lower = temp.path().join("photo_001.jpg");
        fs::write(&upper, b"upper").unwrap();
        fs::write(&lower, b"lower").unwrap();
        if fs::read_dir(temp.path()).unwrap().count() < 2 {
            return None;
        }
        Some((MediaHandle::new(upper), MediaHandle::new(lower)))
    }

    #[test]
    fn checker_flags_a_different_file_that_differs_only_in_case() {
        let temp = TempDir::new().unwrap();
        let Some((upper, _)) = case_twins(&temp) else {
            return;
        };

        assert!(FsConflictChecker::new().has_conflict(&upper, "photo_001.jpg").unwrap());
    }

    #[test]
    fn rename_refuses_to_overwrite_a_case_twin() {
        let temp = TempDir::new().unwrap();
        let Some((upper, lower)) = case_twins(&temp) else {
            return;
        };

        let result = FsRenameProvider.rename(&upper, "photo_001.jpg");

        assert!(matches!(result, Err(ProviderError::AlreadyExists { .. })));
        assert_eq!(fs::read(lower.path()).unwrap(), b"lower");
        assert_eq!(fs::read(upper.path()).unwrap(), b"upper");
    }

    #[test]
    fn directory_provider_reports_kinds() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f.jpg");
        fs::write(&file, b"x").unwrap();

        assert!(FsDirectoryProvider.is_directory(temp.path()));
        assert!(FsDirectoryProvider.exists(&file));
        assert!(!FsDirectoryProvider.is_directory(&file));
        assert!(!FsDirectoryProvider.exists(&temp.path().join("nope")));
    }
}
