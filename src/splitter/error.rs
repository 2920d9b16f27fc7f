//! Splitter errors

use thiserror::Error;

use super::classify::ParseError;
use crate::hash::HashError;

/// A failure that aborts the split
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Failed to parse {asset}")]
    Parse {
        asset: String,
        #[source]
        source: ParseError,
    },

    #[error("Failed to minify the '{bucket}' bucket of {asset}")]
    Minify {
        asset: String,
        bucket: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Failed to hash the '{bucket}' fragment of {asset}")]
    Hash {
        asset: String,
        bucket: String,
        #[source]
        source: HashError,
    },

    #[error("Chunk '{chunk}' has more than one '{bucket}' fragment")]
    DuplicateFragment { chunk: String, bucket: String },

    #[error("Failed to serialize the metadata table")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
