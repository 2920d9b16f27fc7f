//! Asset store
//!
//! The splitter reads stylesheets from, and writes fragments to, an asset
//! store. Asset names are `/`-separated paths relative to the store root.

mod fs;
mod memory;

use anyhow::Result;

pub use fs::FsAssetStore;
pub use memory::MemoryAssetStore;

/// Information about a written asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Asset name
    pub name: String,

    /// Size in bytes
    pub size: usize,
}

/// Read/write access to build output assets
///
/// Writes are atomic per name, so concurrent writers with distinct names
/// need no further coordination.
pub trait AssetStore: Send + Sync {
    /// All asset names, sorted
    fn list(&self) -> Result<Vec<String>>;

    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Create or overwrite an asset
    fn write(&self, name: &str, content: Vec<u8>) -> Result<AssetInfo>;

    fn delete(&self, name: &str) -> Result<()>;

    fn exists(&self, name: &str) -> bool;
}
