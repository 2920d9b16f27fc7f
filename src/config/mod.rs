//! Configuration handling for Mediasplit
//!
//! Parses `mediasplit.toml` and compiles it into the [`SplitConfig`] the
//! splitter runs against.

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::splitter::{NameTemplate, COMMON_BUCKET};

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Splitting options
    #[serde(default)]
    pub split: SplitSection,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Bucket definitions, in bucket order
    #[serde(default, rename = "bucket")]
    pub buckets: Vec<BucketConfig>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config = Self::from_toml_str(&content)?;

        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse mediasplit.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.compile().map(|_| ())
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Compile bucket matchers, exclude globs and the name template
    pub fn compile(&self) -> Result<SplitConfig> {
        if self.buckets.is_empty() {
            anyhow::bail!("At least one [[bucket]] must be specified in mediasplit.toml");
        }

        let mut buckets: Vec<BucketDefinition> = Vec::with_capacity(self.buckets.len());
        for bucket in &self.buckets {
            if bucket.id == COMMON_BUCKET {
                anyhow::bail!("Bucket id '{}' is reserved", COMMON_BUCKET);
            }
            if buckets.iter().any(|b| b.id == bucket.id) {
                anyhow::bail!("Bucket '{}' is defined more than once", bucket.id);
            }
            if bucket.media.is_none() && !bucket.default {
                anyhow::bail!(
                    "Bucket '{}' needs a `media` pattern or `default = true`",
                    bucket.id
                );
            }

            let media = bucket
                .media
                .as_deref()
                .map(Regex::new)
                .transpose()
                .with_context(|| format!("Invalid media pattern for bucket '{}'", bucket.id))?;

            buckets.push(BucketDefinition {
                id: bucket.id.clone(),
                media,
                default: bucket.default,
                with_common_styles: bucket.with_common_styles,
                prefetch: bucket.prefetch.clone(),
                unwrap_media: bucket.unwrap,
            });
        }

        let mut exclude = GlobSetBuilder::new();
        for pattern in &self.split.exclude {
            exclude.add(
                Glob::new(pattern)
                    .with_context(|| format!("Invalid exclude pattern: {}", pattern))?,
            );
        }
        let exclude = exclude.build().context("Failed to build exclude set")?;

        let chunk_filename = NameTemplate::parse(&self.split.chunk_filename)?;
        let bucket_ids: Vec<&str> = buckets.iter().map(|b| b.id.as_str()).collect();
        let fragment_names = chunk_filename
            .fragment_pattern(&bucket_ids)
            .context("Failed to build fragment name pattern")?;

        if self.split.hash_length == 0 {
            anyhow::bail!("hash_length must be greater than zero");
        }

        Ok(SplitConfig {
            buckets,
            minify: self.split.minify,
            keep_original: self.split.keep_original,
            exclude,
            chunk_filename,
            fragment_names,
            entry: self.split.entry.clone(),
            hash_length: self.split.hash_length,
        })
    }
}

/// A bucket with its media matcher compiled
#[derive(Debug, Clone)]
pub struct BucketDefinition {
    pub id: String,
    pub media: Option<Regex>,
    pub default: bool,
    pub with_common_styles: bool,
    pub prefetch: Vec<String>,
    pub unwrap_media: bool,
}

impl BucketDefinition {
    /// Whether a rule with the given media condition belongs here
    pub fn matches(&self, condition: Option<&str>) -> bool {
        match condition {
            None => self.default,
            Some(condition) => self
                .media
                .as_ref()
                .map(|re| re.is_match(condition))
                .unwrap_or(false),
        }
    }
}

/// Validated splitter configuration
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub buckets: Vec<BucketDefinition>,
    pub minify: bool,
    pub keep_original: bool,
    pub exclude: GlobSet,
    pub chunk_filename: NameTemplate,
    /// Matches names of fragments written by an earlier run
    pub fragment_names: Regex,
    pub entry: Option<String>,
    pub hash_length: usize,
}

impl SplitConfig {
    /// Bucket ids in table order: configured buckets, then `common`
    pub fn bucket_order(&self) -> Vec<&str> {
        self.buckets
            .iter()
            .map(|b| b.id.as_str())
            .chain(std::iter::once(COMMON_BUCKET))
            .collect()
    }

    /// Position of a bucket id in [`Self::bucket_order`]
    pub fn bucket_index(&self, id: &str) -> Option<usize> {
        if id == COMMON_BUCKET {
            return Some(self.buckets.len());
        }
        self.buckets.iter().position(|b| b.id == id)
    }

    pub fn bucket(&self, id: &str) -> Option<&BucketDefinition> {
        self.buckets.iter().find(|b| b.id == id)
    }

    /// Whether at least one bucket takes the common styles
    pub fn merges_common(&self) -> bool {
        self.buckets.iter().any(|b| b.with_common_styles)
    }

    /// Whether every bucket takes the common styles, leaving nothing standalone
    pub fn absorbs_common(&self) -> bool {
        self.buckets.iter().all(|b| b.with_common_styles)
    }

    /// Whether an asset is a stylesheet the splitter should process
    pub fn is_candidate(&self, asset_name: &str) -> bool {
        asset_name.ends_with(".css") && !self.exclude.is_match(asset_name)
    }

    /// Whether an asset is a media fragment this configuration produces
    pub fn is_fragment_name(&self, asset_name: &str) -> bool {
        self.fragment_names.is_match(asset_name)
    }
}
