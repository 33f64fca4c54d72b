//! # Error Module
//!
//! Error types for the media renamer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Item-scoped failures are values** - one bad file never unwinds a batch
//! - **Kind + reason** - every failure carries a machine-readable kind and a
//!   message a user can read

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum RenamerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Folder monitor error: {0}")]
    Watch(#[from] WatchError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// The failure taxonomy shared by preview, executor and monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The rename configuration is invalid; fails the whole batch
    Configuration,
    /// A candidate name breaks filesystem naming rules
    Validation,
    /// A candidate collides with an existing or already-claimed name
    Conflict,
    /// The rename operation provider failed for one item
    Provider,
    /// The filesystem watch failed; the monitor session is over
    Watch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Provider => write!(f, "provider"),
            ErrorKind::Watch => write!(f, "watch"),
        }
    }
}

/// An item-scoped failure recorded in progress events and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameFailure {
    pub kind: ErrorKind,
    pub reason: String,
}

impl RenameFailure {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RenameFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.reason)
    }
}

impl From<ConfigError> for RenameFailure {
    fn from(error: ConfigError) -> Self {
        RenameFailure::new(ErrorKind::Configuration, error.to_string())
    }
}

impl From<InvalidReason> for RenameFailure {
    fn from(reason: InvalidReason) -> Self {
        RenameFailure::new(ErrorKind::Validation, reason.to_string())
    }
}

impl From<ProviderError> for RenameFailure {
    fn from(error: ProviderError) -> Self {
        RenameFailure::new(ErrorKind::Provider, error.to_string())
    }
}

/// Reasons a rename configuration is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Prefix must not be empty")]
    EmptyPrefix,

    #[error("Prefix contains reserved character {0:?}")]
    ReservedCharacter(char),

    #[error("Prefix must not start with a dot or a space")]
    LeadingDotOrSpace,

    #[error("Prefix {0:?} would produce reserved device names")]
    ReservedDevicePrefix(String),

    #[error("Prefix is {length} characters long (maximum {max})")]
    PrefixTooLong { length: usize, max: usize },

    #[error("Digit count {0} is out of range (must be 1-6)")]
    DigitCountOutOfRange(u8),
}

/// Reasons a candidate filename is rejected. The first broken rule wins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("Name is empty")]
    Empty,

    #[error("Name is {length} characters long (maximum 255)")]
    TooLong { length: usize },

    #[error("Name contains illegal character {0:?}")]
    IllegalCharacter(char),

    #[error("Name {0:?} is a reserved device name")]
    ReservedName(String),

    #[error("Name must not start or end with a dot or a space")]
    LeadingOrTrailingDotOrSpace,
}

/// Errors raised by the filesystem collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Target already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to rename {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Provider is unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Map an io error for `path` onto the provider taxonomy
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => ProviderError::NotFound { path },
            std::io::ErrorKind::AlreadyExists => ProviderError::AlreadyExists { path },
            std::io::ErrorKind::PermissionDenied => ProviderError::PermissionDenied { path },
            _ => ProviderError::Io {
                path,
                reason: error.to_string(),
            },
        }
    }
}

/// Errors that occur while scanning a folder for media
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the folder monitor and its watch backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid file pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid rename configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Failed to watch {path}: {reason}")]
    WatchFailed { path: PathBuf, reason: String },

    #[error("Failed to stop watching {path}: {reason}")]
    UnwatchFailed { path: PathBuf, reason: String },
}

/// Errors reading the settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is malformed: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, RenamerError>;
