//! File filtering logic for the scanner.

use super::MediaType;
use std::path::Path;

/// Decides which files a scan picks up
pub struct MediaFilter {
    /// Whether to include hidden files
    include_hidden: bool,
    /// Accept files whose extension is not a known media type
    include_other: bool,
}

impl MediaFilter {
    /// Media files only, hidden files skipped
    pub fn new() -> Self {
        Self {
            include_hidden: false,
            include_other: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Include files that are not images, videos or audio
    pub fn with_other(mut self, include: bool) -> Self {
        self.include_other = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        self.include_other || MediaType::from_path(path).is_media()
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_media() {
        let filter = MediaFilter::new();
        assert!(filter.should_include(Path::new("/photos/image.jpg")));
        assert!(filter.should_include(Path::new("/photos/clip.MOV")));
        assert!(filter.should_include(Path::new("/photos/voice.m4a")));
    }

    #[test]
    fn filter_excludes_other_files_by_default() {
        let filter = MediaFilter::new();
        assert!(!filter.should_include(Path::new("/photos/notes.txt")));
        assert!(!filter.should_include(Path::new("/photos/no_extension")));
    }

    #[test]
    fn filter_can_include_other_files() {
        let filter = MediaFilter::new().with_other(true);
        assert!(filter.should_include(Path::new("/photos/notes.txt")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = MediaFilter::new();
        assert!(!filter.should_include(Path::new("/photos/.hidden.jpg")));
        assert!(MediaFilter::new()
            .with_hidden(true)
            .should_include(Path::new("/photos/.hidden.jpg")));
    }
}
