//! Rename configuration.

use super::validator::{is_reserved_character, MAX_NAME_LENGTH};
use crate::core::sort::SortStrategy;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Longest prefix accepted. Leaves room for the number and an extension
/// inside the 255 character name limit.
pub const MAX_PREFIX_LENGTH: usize = MAX_NAME_LENGTH - 55;

pub const MIN_DIGITS: u8 = 1;
pub const MAX_DIGITS: u8 = 6;

/// How a batch of files is renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConfig {
    pub prefix: String,
    pub start_number: u64,
    /// Zero-padding width; wider numbers are never truncated
    pub digit_count: u8,
    pub preserve_extension: bool,
    pub sort: SortStrategy,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            prefix: "photo_".to_string(),
            start_number: 1,
            digit_count: 3,
            preserve_extension: true,
            sort: SortStrategy::Natural,
        }
    }
}

impl RenameConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn start_number(mut self, start: u64) -> Self {
        self.start_number = start;
        self
    }

    pub fn digit_count(mut self, digits: u8) -> Self {
        self.digit_count = digits;
        self
    }

    pub fn preserve_extension(mut self, preserve: bool) -> Self {
        self.preserve_extension = preserve;
        self
    }

    pub fn sort(mut self, sort: SortStrategy) -> Self {
        self.sort = sort;
        self
    }

    /// Validity depends on these fields alone, never on a file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        if let Some(ch) = self.prefix.chars().find(|c| is_reserved_character(*c)) {
            return Err(ConfigError::ReservedCharacter(ch));
        }

        if self.prefix.starts_with(['.', ' ']) {
            return Err(ConfigError::LeadingDotOrSpace);
        }

        // COM/LPT followed by a single digit is a device name
        if ["COM", "LPT"]
            .iter()
            .any(|device| device.eq_ignore_ascii_case(&self.prefix))
        {
            return Err(ConfigError::ReservedDevicePrefix(self.prefix.clone()));
        }

        let length = self.prefix.chars().count();
        if length > MAX_PREFIX_LENGTH {
            return Err(ConfigError::PrefixTooLong {
                length,
                max: MAX_PREFIX_LENGTH,
            });
        }

        if !(MIN_DIGITS..=MAX_DIGITS).contains(&self.digit_count) {
            return Err(ConfigError::DigitCountOutOfRange(self.digit_count));
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
