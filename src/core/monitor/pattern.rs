//! Glob filter for monitored file names.

use crate::error::WatchError;
use regex::{Regex, RegexBuilder};
use std::path::Path;

/// Simple wildcard filter: `*` matches any run of characters, `?` one
/// character, everything else literally. Case-insensitive, whole name.
/// No pattern (or a blank one) matches every name.
#[derive(Debug, Clone)]
pub struct FilePattern {
    regex: Option<Regex>,
}

impl FilePattern {
    pub fn new(pattern: Option<&str>) -> Result<Self, WatchError> {
        let pattern = match pattern.map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(Self::any()),
        };

        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| WatchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { regex: Some(regex) })
    }

    /// Pattern that accepts everything
    pub fn any() -> Self {
        Self { regex: None }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().map_or(true, |regex| regex.is_match(name))
    }

    /// Match against the leaf name of a path
    pub fn matches_path(&self, path: &Path) -> bool {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.matches(name),
            None => false,
        }
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut regex = String::with_capacity(glob.len() * 2 + 2);
    regex.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    regex.push('$');
    regex
}
