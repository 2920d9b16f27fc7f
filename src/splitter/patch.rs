//! Entry artifact patching
//!
//! The entry script carries a placeholder that is replaced by the serialized
//! metadata table once every fragment has been written.

use regex::Regex;
use tracing::{info, warn};

use super::error::SplitError;
use super::metadata::ChunkMetadataTable;
use crate::store::AssetStore;

/// Token the entry script reserves for the metadata table
pub const PLACEHOLDER: &str = "{CSS_CHUNKS_BY_MEDIA:1}";

/// Result of the patch step; only `Patched` changes the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched { asset: String, size: usize },
    NoEntryConfigured,
    EntryNotFound { entry: String },
    PlaceholderMissing { asset: String },
}

/// Find the script emitted for an entry chunk (`<entry>...js`)
pub fn find_entry_artifact(store: &dyn AssetStore, entry: &str) -> anyhow::Result<Option<String>> {
    let pattern = Regex::new(&format!("{}.+js$", regex::escape(entry)))?;
    Ok(store.list()?.into_iter().find(|name| pattern.is_match(name)))
}

/// Replace the placeholder in the entry script with the table
pub fn patch_entry(
    store: &dyn AssetStore,
    entry: Option<&str>,
    table: &ChunkMetadataTable,
) -> Result<PatchOutcome, SplitError> {
    let Some(entry) = entry else {
        return Ok(PatchOutcome::NoEntryConfigured);
    };

    let Some(asset) = find_entry_artifact(store, entry)? else {
        warn!("No script found for entry '{}', metadata table not embedded", entry);
        return Ok(PatchOutcome::EntryNotFound {
            entry: entry.to_string(),
        });
    };

    let content = store.read(&asset)?;
    let Some(at) = find(&content, PLACEHOLDER.as_bytes()) else {
        warn!("{} does not contain {}", asset, PLACEHOLDER);
        return Ok(PatchOutcome::PlaceholderMissing { asset });
    };

    let json = table.to_json()?;
    let mut patched = Vec::with_capacity(content.len() + json.len());
    patched.extend_from_slice(&content[..at]);
    patched.extend_from_slice(json.as_bytes());
    patched.extend_from_slice(&content[at + PLACEHOLDER.len()..]);

    let written = store.write(&asset, patched)?;
    info!("Embedded metadata for {} chunk(s) into {}", table.chunk_count(), written.name);

    Ok(PatchOutcome::Patched {
        asset: written.name,
        size: written.size,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
