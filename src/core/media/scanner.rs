//! Directory walking implementation using walkdir.

use super::{filter::is_hidden, MediaFilter, MediaItem};
use crate::error::ScanError;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Include files that are not recognised media
    pub include_all_files: bool,
}

/// Builds `MediaItem`s for the files in a folder
pub struct DirectoryScanner {
    config: ScanConfig,
    filter: MediaFilter,
}

impl DirectoryScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = MediaFilter::new()
            .with_hidden(config.include_hidden)
            .with_other(config.include_all_files);
        Self { config, filter }
    }

    /// Scan a folder. Entries that cannot be read are logged and skipped.
    ///
    /// Items come back in directory order; callers sort them afterwards.
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<Vec<MediaItem>, ScanError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks);
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.config.include_hidden;
        let mut items = Vec::new();

        for entry in walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || include_hidden || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.filter.should_include(entry.path()) {
                continue;
            }

            match MediaItem::from_path(entry.path()) {
                Ok(item) => items.push(item),
                Err(source) => {
                    let error = ScanError::ReadEntry {
                        path: entry.path().to_path_buf(),
                        source,
                    };
                    warn!(%error, "skipping file");
                }
            }
        }

        debug!(root = %root.display(), found = items.len(), "scan finished");
        Ok(items)
    }
}
