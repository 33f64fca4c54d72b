//! # Config Module
//!
//! User settings read from a TOML file.
//!
//! The file lives at `<config dir>/media-renamer/settings.toml` unless a
//! path is given explicitly. A missing file means defaults. The library
//! never writes it.
//!
//! ```toml
//! [rename]
//! prefix = "holiday_"
//! start_number = 1
//! digit_count = 4
//! preserve_extension = true
//! sort = "natural"
//!
//! [monitor]
//! pattern = "IMG_*.jpg"
//! recursive = false
//!
//! [scan]
//! recursive = false
//! include_hidden = false
//! ```

use crate::core::media::ScanConfig;
use crate::core::naming::RenameConfig;
use crate::core::sort::SortStrategy;
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "media-renamer";
const FILE_NAME: &str = "settings.toml";

/// Default rename parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameSettings {
    pub prefix: String,
    pub start_number: u64,
    pub digit_count: u8,
    pub preserve_extension: bool,
    pub sort: SortStrategy,
}

impl Default for RenameSettings {
    fn default() -> Self {
        let config = RenameConfig::default();
        Self {
            prefix: config.prefix,
            start_number: config.start_number,
            digit_count: config.digit_count,
            preserve_extension: config.preserve_extension,
            sort: config.sort,
        }
    }
}

impl From<&RenameSettings> for RenameConfig {
    fn from(settings: &RenameSettings) -> Self {
        RenameConfig::new(settings.prefix.clone())
            .start_number(settings.start_number)
            .digit_count(settings.digit_count)
            .preserve_extension(settings.preserve_extension)
            .sort(settings.sort)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub pattern: Option<String>,
    pub recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub recursive: bool,
    pub include_hidden: bool,
    /// Include files that are not images, videos or audio
    pub include_all_files: bool,
}

impl From<&ScanSettings> for ScanConfig {
    fn from(settings: &ScanSettings) -> Self {
        ScanConfig {
            recursive: settings.recursive,
            include_hidden: settings.include_hidden,
            include_all_files: settings.include_all_files,
            ..ScanConfig::default()
        }
    }
}

/// Everything the settings file can hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rename: RenameSettings,
    pub monitor: MonitorSettings,
    pub scan: ScanSettings,
}

impl Settings {
    /// Default location of the settings file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(FILE_NAME))
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&raw).map_err(|reason| SettingsError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn parse(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }

    pub fn rename_config(&self) -> RenameConfig {
        RenameConfig::from(&self.rename)
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::from(&self.scan)
    }
}
