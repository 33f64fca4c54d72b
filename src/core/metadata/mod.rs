//! # Metadata Module
//!
//! Per-item values a prefix can pull in through tokens.
//!
//! ## Tokens
//! - `{date}` - capture date as `YYYYMMDD`
//! - `{year}`, `{month}`, `{day}`
//! - `{camera}` - camera make and model
//! - `{dimensions}` - `WIDTHxHEIGHT`
//!
//! Missing values render as `unknown`. Substituted text has reserved
//! filename characters replaced with `_` so the expanded prefix stays a
//! legal name fragment.
//!
//! EXIF metadata is typically found in JPEG and TIFF files.

use crate::core::media::MediaHandle;
use crate::core::naming::is_reserved_character;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const UNKNOWN: &str = "unknown";

/// Extracted media metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Original capture date/time
    pub date_taken: Option<DateTime<Utc>>,
    /// Image width in pixels
    pub width: Option<u32>,
    /// Image height in pixels
    pub height: Option<u32>,
    /// Camera make (e.g., "Apple", "Canon")
    pub camera_make: Option<String>,
    /// Camera model (e.g., "iPhone 15 Pro")
    pub camera_model: Option<String>,
}

impl MediaMetadata {
    /// Get a display string for the camera
    pub fn camera_display(&self) -> Option<String> {
        match (&self.camera_make, &self.camera_model) {
            (Some(make), Some(model)) => {
                // Avoid duplication like "Apple Apple iPhone"
                if model.starts_with(make.as_str()) {
                    Some(model.clone())
                } else {
                    Some(format!("{} {}", make, model))
                }
            }
            (None, Some(model)) => Some(model.clone()),
            (Some(make), None) => Some(make.clone()),
            (None, None) => None,
        }
    }

    /// Get dimensions as a formatted string
    pub fn dimensions_display(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

/// Lookup of optional per-item values, keyed by handle
pub trait MetadataProvider: Send + Sync {
    fn metadata(&self, handle: &MediaHandle) -> MediaMetadata;
}

/// Reads EXIF tags from the file behind the handle
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifMetadataProvider;

impl MetadataProvider for ExifMetadataProvider {
    fn metadata(&self, handle: &MediaHandle) -> MediaMetadata {
        extract_metadata(handle.path())
    }
}

/// Expand metadata tokens in a prefix
pub fn expand_tokens(prefix: &str, metadata: &MediaMetadata) -> String {
    if !prefix.contains('{') {
        return prefix.to_string();
    }

    let date = metadata.date_taken;
    let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());

    let replacements = [
        ("{date}", or_unknown(date.map(|d| d.format("%Y%m%d").to_string()))),
        ("{year}", or_unknown(date.map(|d| format!("{:04}", d.year())))),
        ("{month}", or_unknown(date.map(|d| format!("{:02}", d.month())))),
        ("{day}", or_unknown(date.map(|d| format!("{:02}", d.day())))),
        ("{camera}", or_unknown(metadata.camera_display())),
        ("{dimensions}", or_unknown(metadata.dimensions_display())),
    ];

    let mut expanded = prefix.to_string();
    for (token, value) in replacements {
        if expanded.contains(token) {
            expanded = expanded.replace(token, &sanitize_value(&value));
        }
    }
    expanded
}

fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if is_reserved_character(c) { '_' } else { c })
        .collect()
}

/// Extract EXIF metadata from a file. Unreadable files yield empty metadata.
pub fn extract_metadata(path: &Path) -> MediaMetadata {
    let mut metadata = MediaMetadata::default();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return metadata,
    };

    let mut bufreader = BufReader::new(&file);
    let exif_reader = match Reader::new().read_from_container(&mut bufreader) {
        Ok(r) => r,
        Err(_) => return metadata,
    };

    if let Some(field) = exif_reader.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        if let Some(s) = get_string_value(&field.value) {
            // EXIF date format: "YYYY:MM:DD HH:MM:SS"
            if let Ok(naive) = NaiveDateTime::parse_from_str(&s, "%Y:%m:%d %H:%M:%S") {
                metadata.date_taken = Some(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }
    }

    // Prefer actual pixel dimensions
    if let Some(field) = exif_reader.get_field(Tag::PixelXDimension, In::PRIMARY) {
        metadata.width = get_u32_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::PixelYDimension, In::PRIMARY) {
        metadata.height = get_u32_value(&field.value);
    }
    if metadata.width.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageWidth, In::PRIMARY) {
            metadata.width = get_u32_value(&field.value);
        }
    }
    if metadata.height.is_none() {
        if let Some(field) = exif_reader.get_field(Tag::ImageLength, In::PRIMARY) {
            metadata.height = get_u32_value(&field.value);
        }
    }

    if let Some(field) = exif_reader.get_field(Tag::Make, In::PRIMARY) {
        metadata.camera_make = get_string_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::Model, In::PRIMARY) {
        metadata.camera_model = get_string_value(&field.value);
    }

    metadata
}

fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
