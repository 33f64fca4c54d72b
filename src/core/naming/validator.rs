//! Filesystem naming rules.

use crate::error::InvalidReason;

/// Characters no file name may contain
pub const RESERVED_CHARACTERS: [char; 10] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Longest accepted name, in characters
pub const MAX_NAME_LENGTH: usize = 255;

/// Device names that cannot be used as file names on Windows
pub const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

pub fn is_reserved_character(ch: char) -> bool {
    RESERVED_CHARACTERS.contains(&ch)
}

pub fn is_reserved_device_name(name: &str) -> bool {
    RESERVED_DEVICE_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Check a candidate file name. Reports the first rule it breaks and
/// never tries to repair the name.
pub fn validate_filename(name: &str) -> Result<(), InvalidReason> {
    if name.trim().is_empty() {
        return Err(InvalidReason::Empty);
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(InvalidReason::TooLong { length });
    }

    if let Some(ch) = name.chars().find(|c| is_reserved_character(*c)) {
        return Err(InvalidReason::IllegalCharacter(ch));
    }

    if is_reserved_device_name(name) {
        return Err(InvalidReason::ReservedName(name.to_string()));
    }

    let edge = |c: char| c == '.' || c == ' ';
    if name.starts_with(edge) || name.ends_with(edge) {
        return Err(InvalidReason::LeadingOrTrailingDotOrSpace);
    }

    Ok(())
}
