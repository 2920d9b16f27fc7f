//! In-memory asset store

use anyhow::{Context, Result};
use dashmap::DashMap;

use super::{AssetInfo, AssetStore};

/// Assets held in a concurrent map, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: DashMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, content: impl Into<Vec<u8>>) {
        self.assets.insert(name.to_string(), content.into());
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.assets.get(name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetStore for MemoryAssetStore {
    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.assets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.get(name)
            .with_context(|| format!("Asset not found: {}", name))
    }

    fn write(&self, name: &str, content: Vec<u8>) -> Result<AssetInfo> {
        let size = content.len();
        self.assets.insert(name.to_string(), content);
        Ok(AssetInfo {
            name: name.to_string(),
            size,
        })
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.assets
            .remove(name)
            .map(|_| ())
            .with_context(|| format!("Asset not found: {}", name))
    }

    fn exists(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }
}
