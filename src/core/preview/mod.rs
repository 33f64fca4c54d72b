//! # Preview Module
//!
//! Dry run of a rename batch. Predicts every candidate name and flags the
//! ones that cannot be committed, without touching a single file.
//!
//! ## Order of checks
//! 1. The rename config. An invalid config marks every entry as a conflict
//!    and no names are generated.
//! 2. The generated name against the filesystem naming rules.
//! 3. The conflict checker, for existing files and names already claimed
//!    earlier in the same batch.

use crate::core::media::MediaItem;
use crate::core::naming::{validate_filename, FilenameGenerator, RenameConfig};
use crate::core::providers::{check_conflict, ConflictChecker};
use crate::error::{ErrorKind, RenameFailure};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Predicted outcome for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub item: MediaItem,
    /// Empty when the config was invalid and no name was generated
    pub candidate_name: String,
    /// Why the entry cannot be committed
    pub conflict: Option<RenameFailure>,
}

impl PreviewEntry {
    pub fn has_conflict(&self) -> bool {
        self.conflict.is_some()
    }

    pub fn conflict_reason(&self) -> Option<&str> {
        self.conflict.as_ref().map(|c| c.reason.as_str())
    }

    /// Committing would leave the name as it is
    pub fn is_unchanged(&self) -> bool {
        !self.has_conflict() && self.candidate_name == self.item.name
    }

    pub fn can_commit(&self) -> bool {
        !self.has_conflict() && self.candidate_name != self.item.name
    }
}

/// Counts derived from a set of entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSummary {
    pub total: usize,
    pub committable: usize,
    pub conflicts: usize,
    pub unchanged: usize,
}

impl PreviewSummary {
    pub fn from_entries(entries: &[PreviewEntry]) -> Self {
        entries.iter().fold(
            PreviewSummary {
                total: entries.len(),
                ..PreviewSummary::default()
            },
            |mut summary, entry| {
                if entry.has_conflict() {
                    summary.conflicts += 1;
                } else if entry.can_commit() {
                    summary.committable += 1;
                } else {
                    summary.unchanged += 1;
                }
                summary
            },
        )
    }

    pub fn can_proceed(&self) -> bool {
        self.conflicts == 0 && self.committable > 0
    }
}

pub(crate) fn duplicate_name_failure(candidate: &str) -> RenameFailure {
    RenameFailure::new(
        ErrorKind::Conflict,
        format!(
            "Duplicate name: {} already exists or is used by another file in this batch",
            candidate
        ),
    )
}

/// Produces dry-run previews
pub struct PreviewEngine {
    generator: FilenameGenerator,
    checker: Arc<dyn ConflictChecker>,
}

impl PreviewEngine {
    pub fn new(checker: Arc<dyn ConflictChecker>) -> Self {
        Self {
            generator: FilenameGenerator::new(),
            checker,
        }
    }

    /// Use a specific generator (e.g. one with a metadata provider)
    pub fn with_generator(mut self, generator: FilenameGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Preview renaming `items`, which must already be sorted. No rename
    /// is performed.
    pub fn preview(&self, items: &[MediaItem], config: &RenameConfig) -> Vec<PreviewEntry> {
        if let Err(error) = config.validate() {
            debug!(%error, items = items.len(), "preview rejected by config");
            let failure = RenameFailure::from(error);
            return items
                .iter()
                .map(|item| PreviewEntry {
                    item: item.clone(),
                    candidate_name: String::new(),
                    conflict: Some(failure.clone()),
                })
                .collect();
        }

        self.checker.begin_batch();

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let candidate_name = self.generator.generate(item, config, index);
                let conflict = match validate_filename(&candidate_name) {
                    Err(reason) => Some(RenameFailure::from(reason)),
                    Ok(()) if check_conflict(self.checker.as_ref(), &item.handle, &candidate_name) => {
                        Some(duplicate_name_failure(&candidate_name))
                    }
                    Ok(()) => None,
                };
                PreviewEntry {
                    item: item.clone(),
                    candidate_name,
                    conflict,
                }
            })
            .collect()
    }

    /// Preview plus its summary
    pub fn preview_with_summary(
        &self,
        items: &[MediaItem],
        config: &RenameConfig,
    ) -> (Vec<PreviewEntry>, PreviewSummary) {
        let entries = self.preview(items, config);
        let summary = PreviewSummary::from_entries(&entries);
        (entries, summary)
    }
}
