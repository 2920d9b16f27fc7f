//! Directory-backed asset store

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use super::{AssetInfo, AssetStore};
use crate::utils::{asset_name, normalize_asset_name};

/// Assets stored as files under a root directory
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            anyhow::bail!("Output directory does not exist: {}", root.display());
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(normalize_asset_name(name))
    }
}

impl AssetStore for FsAssetStore {
    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in WalkDir::new(&self.root) {
            let entry = entry
                .with_context(|| format!("Failed to list {}", self.root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = asset_name(&self.root, entry.path()) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name);
        fs::read(&path).with_context(|| format!("Failed to read asset: {}", path.display()))
    }

    fn write(&self, name: &str, content: Vec<u8>) -> Result<AssetInfo> {
        let path = self.path_of(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let size = content.len();
        fs::write(&path, content)
            .with_context(|| format!("Failed to write asset: {}", path.display()))?;

        Ok(AssetInfo {
            name: name.to_string(),
            size,
        })
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete asset: {}", path.display()))
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path()).unwrap();

        let info = store.write("css/main.print.abc.css", b"a{}".to_vec()).unwrap();
        assert_eq!(info.size, 3);
        store.write("main.js", b"x".to_vec()).unwrap();

        assert_eq!(store.list().unwrap(), vec!["css/main.print.abc.css", "main.js"]);
        assert!(store.exists("css/main.print.abc.css"));
        assert_eq!(store.read("css/main.print.abc.css").unwrap(), b"a{}".to_vec());

        store.delete("main.js").unwrap();
        assert!(!store.exists("main.js"));
        assert!(store.delete("main.js").is_err());
    }

    #[test]
    fn test_names_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dist");
        fs::create_dir(&root).unwrap();
        let store = FsAssetStore::new(&root).unwrap();

        store.write("../outside.css", b"a{}".to_vec()).unwrap();

        assert!(!dir.path().join("outside.css").exists());
        assert_eq!(store.list().unwrap(), vec!["outside.css"]);
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsAssetStore::new(dir.path().join("missing")).is_err());
    }
}
