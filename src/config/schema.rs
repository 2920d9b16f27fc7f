//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Splitting behaviour shared by every bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSection {
    /// Minify each bucket after classification
    #[serde(default)]
    pub minify: bool,

    /// Keep the unsplit stylesheet as the common output
    #[serde(default)]
    pub keep_original: bool,

    /// Output name template for media fragments
    #[serde(default = "default_chunk_filename")]
    pub chunk_filename: String,

    /// Glob patterns of stylesheet assets to leave untouched
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Entry chunk id whose script receives the metadata table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,

    /// Number of hex characters kept from the content digest
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,
}

impl Default for SplitSection {
    fn default() -> Self {
        Self {
            minify: false,
            keep_original: false,
            chunk_filename: default_chunk_filename(),
            exclude: Vec::new(),
            entry: None,
            hash_length: default_hash_length(),
        }
    }
}

fn default_chunk_filename() -> String {
    "[id].[contenthash].css".to_string()
}

fn default_hash_length() -> usize {
    16
}

fn default_true() -> bool {
    true
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Build output directory holding the compiled assets
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}

/// One `[[bucket]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Bucket identifier, also inserted into fragment names
    pub id: String,

    /// Regex tested against the media condition of `@media` blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,

    /// Claim rules that carry no media condition
    #[serde(default)]
    pub default: bool,

    /// Prepend the common styles to this bucket
    #[serde(default)]
    pub with_common_styles: bool,

    /// Buckets to prefetch once this one is loaded
    #[serde(default)]
    pub prefetch: Vec<String>,

    /// Emit the contents of matched `@media` blocks without the wrapper
    #[serde(default = "default_true")]
    pub unwrap: bool,
}
