//! Fragment naming and emission
//!
//! Fragments are content-addressed: the name template receives the chunk id
//! and the content hash, and the bucket id is inserted after the first
//! segment (`[id].[contenthash].css` becomes `main.print.<hash>.css`).

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use super::error::SplitError;
use crate::hash::ContentHasher;
use crate::store::AssetStore;

/// A dot-separated segment of a name template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Id,
    ContentHash,
    Literal(String),
}

/// Parsed output name template, e.g. `[id].[contenthash].css`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    segments: Vec<Segment>,
}

impl NameTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let segments: Vec<Segment> = template
            .split('.')
            .map(|part| match part {
                "[id]" => Segment::Id,
                "[contenthash]" => Segment::ContentHash,
                other => Segment::Literal(other.to_string()),
            })
            .collect();

        if !segments.contains(&Segment::Id) {
            anyhow::bail!("Chunk filename '{}' is missing the [id] token", template);
        }
        if !segments.contains(&Segment::ContentHash) {
            anyhow::bail!("Chunk filename '{}' is missing the [contenthash] token", template);
        }

        Ok(Self { segments })
    }

    /// Render the fragment name for one bucket
    pub fn render(&self, chunk_id: &str, bucket: &str, hash: &str) -> String {
        let mut parts: Vec<&str> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Id => chunk_id,
                Segment::ContentHash => hash,
                Segment::Literal(text) => text.as_str(),
            })
            .collect();
        parts.insert(1.min(parts.len()), bucket);
        parts.join(".")
    }

    /// Regex matching any name [`Self::render`] produces for the given buckets
    pub fn fragment_pattern(&self, bucket_ids: &[&str]) -> Result<Regex> {
        let buckets = bucket_ids
            .iter()
            .map(|id| regex::escape(id))
            .collect::<Vec<_>>()
            .join("|");

        let mut parts: Vec<String> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Id => ".+".to_string(),
                Segment::ContentHash => "[^./]+".to_string(),
                Segment::Literal(text) => regex::escape(text),
            })
            .collect();
        parts.insert(1.min(parts.len()), format!("(?:{})", buckets));

        Ok(Regex::new(&format!("^{}$", parts.join(r"\.")))?)
    }
}

/// Strip the extension and hash segments from an asset name
///
/// `css/main.3f2a.css` → `css/main`
pub fn chunk_id(asset_name: &str) -> &str {
    let file_start = asset_name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match asset_name[file_start..].find('.') {
        Some(dot) => &asset_name[..file_start + dot],
        None => asset_name,
    }
}

/// Metadata table key for a chunk id: its last path segment
pub fn table_key(chunk_id: &str) -> &str {
    chunk_id.rsplit('/').next().unwrap_or(chunk_id)
}

/// How a fragment is named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentTarget {
    /// Rendered from the name template
    Templated,
    /// Written back under the source asset name
    Original,
}

/// One fragment waiting to be hashed and written
#[derive(Debug, Clone)]
pub struct FragmentJob {
    pub asset: String,
    pub chunk_id: String,
    pub bucket: String,
    pub bucket_index: usize,
    pub target: FragmentTarget,
    pub content: String,
}

/// A fragment that has been written to the asset store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFragment {
    pub asset: String,
    pub chunk_id: String,
    pub bucket: String,
    pub bucket_index: usize,
    pub name: String,
    pub hash: String,
    pub size: usize,
}

/// A fragment whose hash is known but which has not been written yet
#[derive(Debug, Clone)]
pub struct HashedFragment {
    pub job: FragmentJob,
    pub hash: String,
}

/// Compute the content hash of a fragment
pub async fn hash_fragment(
    job: FragmentJob,
    hasher: &dyn ContentHasher,
) -> Result<HashedFragment, SplitError> {
    let hash = hasher
        .hash(job.content.as_bytes())
        .await
        .map_err(|source| SplitError::Hash {
            asset: job.asset.clone(),
            bucket: job.bucket.clone(),
            source,
        })?;

    Ok(HashedFragment { job, hash })
}

/// Name a hashed fragment and write it to the store
pub fn write_fragment(
    fragment: HashedFragment,
    template: &NameTemplate,
    store: &dyn AssetStore,
) -> Result<EmittedFragment, SplitError> {
    let HashedFragment { job, hash } = fragment;

    let name = match job.target {
        FragmentTarget::Templated => template.render(&job.chunk_id, &job.bucket, &hash),
        FragmentTarget::Original => job.asset.clone(),
    };

    let info = store.write(&name, job.content.into_bytes())?;
    debug!("Wrote {} ({} bytes)", info.name, info.size);

    Ok(EmittedFragment {
        asset: job.asset,
        chunk_id: job.chunk_id,
        bucket: job.bucket,
        bucket_index: job.bucket_index,
        name: info.name,
        hash,
        size: info.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Hasher;
    use crate::store::MemoryAssetStore;

    #[test]
    fn test_default_template() {
        let template = NameTemplate::parse("[id].[contenthash].css").unwrap();
        assert_eq!(template.render("css/main", "print", "abc"), "css/main.print.abc.css");
    }

    #[test]
    fn test_custom_template() {
        let template = NameTemplate::parse("static.[contenthash].[id].min.css").unwrap();
        assert_eq!(
            template.render("app", "dark", "f00"),
            "static.dark.f00.app.min.css"
        );
    }

    #[test]
    fn test_template_requires_tokens() {
        assert!(NameTemplate::parse("[id].css").is_err());
        assert!(NameTemplate::parse("[contenthash].css").is_err());
        assert!(NameTemplate::parse("[name].[contenthash].css").is_err());
    }

    #[test]
    fn test_fragment_pattern_matches_rendered_names_only() {
        let template = NameTemplate::parse("[id].[contenthash].css").unwrap();
        let pattern = template.fragment_pattern(&["screen", "print"]).unwrap();

        assert!(pattern.is_match(&template.render("css/main", "print", "9f0a")));
        assert!(pattern.is_match("main.screen.h12.css"));
        assert!(!pattern.is_match("main.abc123.css"));
        assert!(!pattern.is_match("main.tv.abc.css"));
        assert!(!pattern.is_match("css/print.abc.css"));
    }

    #[test]
    fn test_chunk_id() {
        assert_eq!(chunk_id("main.3f2a.css"), "main");
        assert_eq!(chunk_id("css/app.v1.3f2a.css"), "css/app");
        assert_eq!(chunk_id("static.v2/css/app.css"), "static.v2/css/app");
        assert_eq!(chunk_id("noext"), "noext");
    }

    #[test]
    fn test_table_key() {
        assert_eq!(table_key("css/app"), "app");
        assert_eq!(table_key("main"), "main");
    }

    #[tokio::test]
    async fn test_hashed_fragment_is_written_under_template_name() {
        let store = MemoryAssetStore::new();
        let hasher = Sha256Hasher::new(8);
        let template = NameTemplate::parse("[id].[contenthash].css").unwrap();

        let job = FragmentJob {
            asset: "main.abc.css".to_string(),
            chunk_id: "main".to_string(),
            bucket: "print".to_string(),
            bucket_index: 1,
            target: FragmentTarget::Templated,
            content: "b{color:blue}".to_string(),
        };
        let hashed = hash_fragment(job.clone(), &hasher).await.unwrap();
        assert!(store.is_empty());

        let fragment = write_fragment(hashed, &template, &store).unwrap();

        assert_eq!(fragment.hash.len(), 8);
        assert_eq!(fragment.name, format!("main.print.{}.css", fragment.hash));
        assert_eq!(fragment.size, 13);
        assert_eq!(store.get(&fragment.name).unwrap(), b"b{color:blue}".to_vec());

        let again = write_fragment(hash_fragment(job, &hasher).await.unwrap(), &template, &store)
            .unwrap();
        assert_eq!(again, fragment);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_original_target_keeps_asset_name() {
        let store = MemoryAssetStore::new();
        let hasher = Sha256Hasher::new(8);
        let template = NameTemplate::parse("[id].[contenthash].css").unwrap();

        let job = FragmentJob {
            asset: "main.abc.css".to_string(),
            chunk_id: "main".to_string(),
            bucket: "common".to_string(),
            bucket_index: 2,
            target: FragmentTarget::Original,
            content: "a{color:red}".to_string(),
        };
        let hashed = hash_fragment(job, &hasher).await.unwrap();
        let fragment = write_fragment(hashed, &template, &store).unwrap();

        assert_eq!(fragment.name, "main.abc.css");
        assert_eq!(store.get("main.abc.css").unwrap(), b"a{color:red}".to_vec());
    }
}
