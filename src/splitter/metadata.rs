//! Cross-fragment metadata table
//!
//! The table is keyed by chunk, then by bucket index, so the page runtime can
//! resolve a fragment with an array lookup:
//! `{ "main": { "0": { "hash": "...", "common": true, "prefetch": [1] } } }`

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::SplitError;
use super::naming::{table_key, EmittedFragment};
use crate::config::SplitConfig;

/// Runtime facts about one fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentRecord {
    pub hash: String,
    /// The bucket takes the common styles, so `common` need not be loaded
    pub common: bool,
    /// Bucket indices to prefetch after this fragment loads
    pub prefetch: Vec<usize>,
}

/// chunk id → bucket index → record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChunkMetadataTable(BTreeMap<String, BTreeMap<usize, FragmentRecord>>);

impl ChunkMetadataTable {
    /// Aggregate every emitted fragment of the build
    pub fn build(fragments: &[EmittedFragment], config: &SplitConfig) -> Result<Self, SplitError> {
        let mut table = Self::default();

        for fragment in fragments {
            let record = match config.buckets.get(fragment.bucket_index) {
                Some(bucket) => FragmentRecord {
                    hash: fragment.hash.clone(),
                    common: bucket.with_common_styles,
                    prefetch: bucket
                        .prefetch
                        .iter()
                        .filter_map(|target| config.bucket_index(target))
                        .collect(),
                },
                None => FragmentRecord {
                    hash: fragment.hash.clone(),
                    common: false,
                    prefetch: Vec::new(),
                },
            };

            let key = table_key(&fragment.chunk_id);
            let chunk = table.0.entry(key.to_string()).or_default();
            if chunk.insert(fragment.bucket_index, record).is_some() {
                return Err(SplitError::DuplicateFragment {
                    chunk: key.to_string(),
                    bucket: fragment.bucket.clone(),
                });
            }
        }

        Ok(table)
    }

    pub fn get(&self, chunk: &str, bucket_index: usize) -> Option<&FragmentRecord> {
        self.0.get(chunk).and_then(|c| c.get(&bucket_index))
    }

    pub fn chunk_count(&self) -> usize {
        self.0.len()
    }

    pub fn to_json(&self) -> Result<String, SplitError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;

    fn config() -> SplitConfig {
        Config::from_toml_str(
            r#"
            [[bucket]]
            id = "mobile"
            media = "max-width"
            with_common_styles = true
            prefetch = ["desktop", "tablet", "common"]

            [[bucket]]
            id = "desktop"
            media = "min-width"
            "#,
        )
        .unwrap()
        .compile()
        .unwrap()
    }

    fn fragment(chunk: &str, bucket: &str, index: usize, hash: &str) -> EmittedFragment {
        EmittedFragment {
            asset: format!("{}.css", chunk),
            chunk_id: chunk.to_string(),
            bucket: bucket.to_string(),
            bucket_index: index,
            name: format!("{}.{}.{}.css", chunk, bucket, hash),
            hash: hash.to_string(),
            size: 1,
        }
    }

    #[test]
    fn test_records_and_unknown_prefetch_targets() {
        let config = config();
        let table = ChunkMetadataTable::build(
            &[
                fragment("css/main", "desktop", 1, "d1"),
                fragment("css/main", "mobile", 0, "m1"),
                fragment("css/main", "common", 2, "c1"),
            ],
            &config,
        )
        .unwrap();

        assert_eq!(
            table.get("main", 0),
            Some(&FragmentRecord {
                hash: "m1".to_string(),
                common: true,
                prefetch: vec![1, 2],
            })
        );
        assert_eq!(
            table.get("main", 1),
            Some(&FragmentRecord {
                hash: "d1".to_string(),
                common: false,
                prefetch: vec![],
            })
        );
        assert!(!table.get("main", 2).unwrap().common);
    }

    #[test]
    fn test_json_shape_is_stable() {
        let config = config();
        let fragments = vec![
            fragment("admin", "mobile", 0, "a0"),
            fragment("main", "desktop", 1, "m1"),
        ];
        let reversed: Vec<EmittedFragment> = fragments.iter().rev().cloned().collect();

        let json = ChunkMetadataTable::build(&fragments, &config).unwrap().to_json().unwrap();
        let json_reversed = ChunkMetadataTable::build(&reversed, &config).unwrap().to_json().unwrap();

        assert_eq!(json, json_reversed);
        assert_eq!(
            json,
            r#"{"admin":{"0":{"hash":"a0","common":true,"prefetch":[1,2]}},"main":{"1":{"hash":"m1","common":false,"prefetch":[]}}}"#
        );
    }

    #[test]
    fn test_colliding_chunks_are_rejected() {
        let config = config();
        let result = ChunkMetadataTable::build(
            &[fragment("a/main", "mobile", 0, "x"), fragment("b/main", "mobile", 0, "y")],
            &config,
        );
        assert!(matches!(result, Err(SplitError::DuplicateFragment { .. })));
    }
}
