//! Media-query splitting
//!
//! Runs once per build over every stylesheet in the asset store:
//! classify → merge common styles → hash fragments (concurrently) → write
//! fragments and remove dropped sources → build the metadata table → patch
//! the entry script. Nothing is written until every fragment has hashed.

mod classify;
mod error;
mod merge;
mod metadata;
mod naming;
mod patch;

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, error, info};

use crate::config::SplitConfig;
use crate::hash::{ContentHasher, Sha256Hasher};
use crate::minify::{LightningMinifier, Minifier};
use crate::store::AssetStore;

pub use classify::{
    classify, place_units, tokenize, ParseError, ParseErrorKind, Partition, Placement, RuleKind,
    RuleUnit,
};
pub use error::SplitError;
pub use merge::{resolve_common, CommonFate, MergePlan, MergedBucket};
pub use metadata::{ChunkMetadataTable, FragmentRecord};
pub use naming::{
    chunk_id, hash_fragment, table_key, write_fragment, EmittedFragment, FragmentJob,
    FragmentTarget, HashedFragment, NameTemplate,
};
pub use patch::{find_entry_artifact, patch_entry, PatchOutcome, PLACEHOLDER};

/// Catch-all bucket for rules no definition claims
pub const COMMON_BUCKET: &str = "common";

/// Outcome of a split run
#[derive(Debug)]
pub struct SplitReport {
    /// Every fragment written, in job order
    pub fragments: Vec<EmittedFragment>,

    /// Assets removed because their common output was dropped
    pub deleted: Vec<String>,

    /// Stylesheets skipped by `exclude` or because they are fragments
    pub skipped: Vec<String>,

    pub table: ChunkMetadataTable,

    pub patch: PatchOutcome,
}

/// A classified and merged stylesheet, nothing written yet
#[derive(Debug)]
struct AssetPlan {
    asset: String,
    chunk_id: String,
    original: String,
    merge: MergePlan,
}

impl AssetPlan {
    fn into_jobs(self, config: &SplitConfig) -> Vec<FragmentJob> {
        let mut jobs: Vec<FragmentJob> = self
            .merge
            .buckets
            .into_iter()
            .map(|bucket| FragmentJob {
                asset: self.asset.clone(),
                chunk_id: self.chunk_id.clone(),
                bucket_index: config.bucket_index(&bucket.id).unwrap_or(config.buckets.len()),
                bucket: bucket.id,
                target: FragmentTarget::Templated,
                content: bucket.text,
            })
            .collect();

        let common = match self.merge.common {
            CommonFate::Emit(text) => Some(text),
            CommonFate::KeepOriginal => Some(self.original),
            CommonFate::Drop => None,
        };

        if let Some(content) = common {
            jobs.push(FragmentJob {
                asset: self.asset.clone(),
                chunk_id: self.chunk_id,
                bucket: COMMON_BUCKET.to_string(),
                bucket_index: config.buckets.len(),
                target: FragmentTarget::Original,
                content,
            });
        }

        jobs
    }
}

/// Splits every stylesheet of a build into media fragments
pub struct MediaSplitter {
    config: Arc<SplitConfig>,
    store: Arc<dyn AssetStore>,
    hasher: Arc<dyn ContentHasher>,
    minifier: Arc<dyn Minifier>,
}

impl MediaSplitter {
    /// Create a splitter with the default SHA-256 hasher and lightningcss minifier
    pub fn new(config: SplitConfig, store: Arc<dyn AssetStore>) -> Self {
        let hasher = Arc::new(Sha256Hasher::new(config.hash_length));
        Self {
            config: Arc::new(config),
            store,
            hasher,
            minifier: Arc::new(LightningMinifier),
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_minifier(mut self, minifier: Arc<dyn Minifier>) -> Self {
        self.minifier = minifier;
        self
    }

    /// Run the split over the whole asset store
    pub async fn run(&self) -> Result<SplitReport, SplitError> {
        // 1. Classify and merge every stylesheet before touching the store
        let mut plans = Vec::new();
        let mut skipped = Vec::new();

        for name in self.store.list()? {
            if !name.ends_with(".css") {
                continue;
            }
            if self.config.is_fragment_name(&name) {
                debug!("Skipping fragment from an earlier run: {}", name);
                skipped.push(name);
                continue;
            }
            if !self.config.is_candidate(&name) {
                debug!("Skipping excluded stylesheet: {}", name);
                skipped.push(name);
                continue;
            }
            plans.push(self.plan_asset(&name)?);
        }

        let dropped: Vec<String> = plans
            .iter()
            .filter(|plan| plan.merge.common == CommonFate::Drop)
            .map(|plan| plan.asset.clone())
            .collect();

        let jobs: Vec<FragmentJob> = plans
            .into_iter()
            .flat_map(|plan| plan.into_jobs(&self.config))
            .collect();
        ensure_unique(&jobs)?;

        // 2. Hash every fragment concurrently, then wait for all
        info!("Hashing {} fragment(s)...", jobs.len());

        let results = join_all(
            jobs.into_iter()
                .map(|job| hash_fragment(job, self.hasher.as_ref())),
        )
        .await;

        let mut hashed = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(fragment) => hashed.push(fragment),
                Err(e) => {
                    error!("{}", e);
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        // 3. Write fragments, then remove common outputs that were absorbed or left empty
        let fragments = hashed
            .into_iter()
            .map(|fragment| {
                write_fragment(fragment, &self.config.chunk_filename, self.store.as_ref())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut deleted = Vec::new();
        for asset in &dropped {
            deleted.extend(self.remove_common(asset)?);
        }

        // 4. Aggregate the table
        let table = ChunkMetadataTable::build(&fragments, &self.config)?;

        // 5. Embed it into the entry script
        let patch = patch_entry(self.store.as_ref(), self.config.entry.as_deref(), &table)?;

        Ok(SplitReport {
            fragments,
            deleted,
            skipped,
            table,
            patch,
        })
    }

    fn plan_asset(&self, name: &str) -> Result<AssetPlan, SplitError> {
        let bytes = self.store.read(name)?;
        let original = String::from_utf8(bytes).map_err(|e| {
            let offset = e.utf8_error().valid_up_to();
            SplitError::Parse {
                asset: name.to_string(),
                source: ParseError::at(ParseErrorKind::InvalidUtf8, e.as_bytes(), offset),
            }
        })?;

        let mut partition =
            classify(&original, &self.config.buckets).map_err(|source| SplitError::Parse {
                asset: name.to_string(),
                source,
            })?;

        if self.config.minify {
            partition = partition.try_map(|bucket, text| {
                self.minifier.minify(text).map_err(|e| SplitError::Minify {
                    asset: name.to_string(),
                    bucket: bucket.to_string(),
                    source: e.into(),
                })
            })?;
        }

        info!("Split {} into [{}]", name, partition.bucket_ids().join(", "));

        let merge = resolve_common(partition, &self.config);

        Ok(AssetPlan {
            asset: name.to_string(),
            chunk_id: chunk_id(name).to_string(),
            original,
            merge,
        })
    }

    /// Delete a stylesheet and its source map, returning what was removed
    fn remove_common(&self, asset: &str) -> Result<Vec<String>, SplitError> {
        let mut removed = Vec::new();

        for name in [asset.to_string(), format!("{}.map", asset)] {
            if self.store.exists(&name) {
                self.store.delete(&name)?;
                debug!("Removed {}", name);
                removed.push(name);
            }
        }

        Ok(removed)
    }
}

/// Reject two fragments that would share a metadata table slot
fn ensure_unique(jobs: &[FragmentJob]) -> Result<(), SplitError> {
    let mut seen = HashSet::new();
    for job in jobs {
        let key = table_key(&job.chunk_id);
        if !seen.insert((key, job.bucket_index)) {
            return Err(SplitError::DuplicateFragment {
                chunk: key.to_string(),
                bucket: job.bucket.clone(),
            });
        }
    }
    Ok(())
}
