//! # Core Module
//!
//! The UI-agnostic rename engine.
//!
//! ## Modules
//! - `media` - Media items, handles and directory scanning
//! - `sort` - Natural ordering and other sort strategies
//! - `naming` - Rename configuration, name generation and validation
//! - `metadata` - EXIF metadata and prefix tokens
//! - `providers` - Filesystem collaborators (real and in-memory)
//! - `preview` - Dry-run of a batch with conflict detection
//! - `executor` - Commits a batch with streamed progress
//! - `monitor` - Renames files as they land in a watched folder

pub mod executor;
pub mod media;
pub mod metadata;
pub mod monitor;
pub mod naming;
pub mod preview;
pub mod providers;
pub mod sort;

// Re-export commonly used types
pub use executor::{BatchExecutor, CancellationToken, ExecutionProgress, ProgressStatus};
pub use media::{MediaHandle, MediaItem, MediaType};
pub use monitor::{FolderMonitor, MonitorStatus, WatchedFolder};
pub use naming::RenameConfig;
pub use preview::{PreviewEngine, PreviewEntry};
pub use sort::{natural_compare, SortStrategy};
