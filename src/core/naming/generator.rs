//! Candidate name generation.

use super::RenameConfig;
use crate::core::media::MediaItem;
use crate::core::metadata::{expand_tokens, MetadataProvider};
use std::sync::Arc;

/// Build the candidate name for the item at `index` in a sorted batch.
///
/// Sequence number is `start_number + index`, zero-padded to
/// `digit_count` and never truncated. Pure and infallible; configs are
/// validated before this is called.
pub fn generate_name(item: &MediaItem, config: &RenameConfig, index: usize) -> String {
    compose(&config.prefix, item, config, index)
}

fn compose(prefix: &str, item: &MediaItem, config: &RenameConfig, index: usize) -> String {
    let number = u128::from(config.start_number) + index as u128;
    let base = format!(
        "{}{:0width$}",
        prefix,
        number,
        width = usize::from(config.digit_count)
    );

    match item.extension() {
        Some(ext) if config.preserve_extension => format!("{}.{}", base, ext),
        _ => base,
    }
}

/// Name generator shared by preview, executor and monitor so all three
/// number files the same way.
///
/// With a metadata provider attached, `{date}`-style tokens in the prefix
/// are expanded per item before numbering.
#[derive(Clone, Default)]
pub struct FilenameGenerator {
    metadata: Option<Arc<dyn MetadataProvider>>,
}

impl FilenameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            metadata: Some(provider),
        }
    }

    pub fn generate(&self, item: &MediaItem, config: &RenameConfig, index: usize) -> String {
        match &self.metadata {
            Some(provider) => {
                let prefix = expand_tokens(&config.prefix, &provider.metadata(&item.handle));
                compose(&prefix, item, config, index)
            }
            None => generate_name(item, config, index),
        }
    }
}

impl std::fmt::Debug for FilenameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilenameGenerator")
            .field("metadata", &self.metadata.is_some())
            .finish()
    }
}
