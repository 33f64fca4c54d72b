//! # Media Module
//!
//! The items a rename batch works on.
//!
//! ## Supported Types
//! - Images (.jpg, .jpeg, .png, .webp, .heic, .heif, .gif, .bmp, .tiff, .tif, .dng, .raw)
//! - Videos (.mp4, .mov, .m4v, .avi, .mkv, .webm, .3gp)
//! - Audio (.mp3, .m4a, .wav, .flac, .aac, .ogg)
//!
//! ## Example
//! ```rust,ignore
//! use media_renamer::core::media::{DirectoryScanner, ScanConfig};
//!
//! let scanner = DirectoryScanner::new(ScanConfig::default());
//! let items = scanner.scan("/Users/photos/trip")?;
//! ```

mod filter;
mod scanner;

pub use filter::MediaFilter;
pub use scanner::{DirectoryScanner, ScanConfig};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use uuid::Uuid;

/// Opaque handle the rename provider uses to address a file or folder.
///
/// The filesystem providers resolve it to a path; other providers may
/// treat it as an arbitrary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaHandle(PathBuf);

impl MediaHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory the handle lives in
    pub fn parent(&self) -> Option<&Path> {
        self.0.parent()
    }

    /// Handle for a sibling entry with a different name
    pub fn with_name(&self, name: &str) -> Self {
        Self(self.0.with_file_name(name))
    }
}

/// Broad media categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaType {
    /// Detect type from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "heic" | "heif" | "gif" | "bmp" | "tiff"
            | "tif" | "dng" | "raw" => MediaType::Image,
            "mp4" | "mov" | "m4v" | "avi" | "mkv" | "webm" | "3gp" => MediaType::Video,
            "mp3" | "m4a" | "wav" | "flac" | "aac" | "ogg" => MediaType::Audio,
            _ => MediaType::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(MediaType::Other)
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, MediaType::Other)
    }
}

/// A file selected for renaming. Never mutated; a rename yields a new
/// handle and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    /// Current file name, including extension
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub media_type: MediaType,
    pub modified: SystemTime,
    pub handle: MediaHandle,
}

impl MediaItem {
    /// Build an item for a path that has not been stat'ed
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: SystemTime) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            media_type: MediaType::from_path(&path),
            handle: MediaHandle::new(path.clone()),
            name,
            path,
            size,
            modified,
        }
    }

    /// Stat a file on disk and build an item for it
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self::new(
            path,
            metadata.len(),
            metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        ))
    }

    /// Extension without the dot, if the name has a non-empty one.
    ///
    /// A leading dot alone (".hidden") is not an extension.
    pub fn extension(&self) -> Option<&str> {
        let dot = self.name.rfind('.')?;
        if dot == 0 || dot + 1 == self.name.len() {
            return None;
        }
        Some(&self.name[dot + 1..])
    }

    /// Directory that holds the item
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }
}
