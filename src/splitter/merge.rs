//! Common-style merging
//!
//! Decides which buckets receive the common styles and whether the common
//! bucket survives as a standalone output.

use super::classify::Partition;
use super::COMMON_BUCKET;
use crate::config::SplitConfig;

/// What happens to the standalone common output at the source asset's name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonFate {
    /// Rewrite the source asset with the common styles
    Emit(String),
    /// Leave the unsplit stylesheet in place as the common output
    KeepOriginal,
    /// Remove the source asset (and its source map)
    Drop,
}

/// A media bucket after merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedBucket {
    pub id: String,
    pub text: String,
    /// Whether the common styles were prepended
    pub merged_common: bool,
}

/// Merge result for one stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// Non-common buckets in bucket order
    pub buckets: Vec<MergedBucket>,
    pub common: CommonFate,
}

/// Apply the common-merge policy to a partition
pub fn resolve_common(partition: Partition, config: &SplitConfig) -> MergePlan {
    let mut common_text = String::new();
    let mut media = Vec::new();

    for (id, text) in partition.into_entries() {
        if id == COMMON_BUCKET {
            common_text = text;
        } else {
            media.push((id, text));
        }
    }

    let merge = config.merges_common() && !common_text.is_empty();

    let buckets = media
        .into_iter()
        .map(|(id, text)| {
            let opted_in = config
                .bucket(&id)
                .map(|b| b.with_common_styles)
                .unwrap_or(false);

            if merge && opted_in {
                MergedBucket {
                    text: format!("{}{}", common_text, text),
                    id,
                    merged_common: true,
                }
            } else {
                MergedBucket {
                    id,
                    text,
                    merged_common: false,
                }
            }
        })
        .collect();

    let common = if config.keep_original {
        CommonFate::KeepOriginal
    } else if common_text.is_empty() || config.absorbs_common() {
        CommonFate::Drop
    } else {
        CommonFate::Emit(common_text)
    };

    MergePlan { buckets, common }
}
