//! # Naming Module
//!
//! Turns a sorted selection into candidate names.
//!
//! - `config` - the rename configuration and its validity rules
//! - `generator` - prefix + zero-padded sequence number (+ extension)
//! - `validator` - filesystem naming rules for a single candidate

mod config;
mod generator;
mod validator;

pub use config::{RenameConfig, MAX_DIGITS, MAX_PREFIX_LENGTH, MIN_DIGITS};
pub use generator::{generate_name, FilenameGenerator};
pub use validator::{
    is_reserved_character, is_reserved_device_name, validate_filename, MAX_NAME_LENGTH,
    RESERVED_CHARACTERS, RESERVED_DEVICE_NAMES,
};
