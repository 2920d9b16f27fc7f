//! Utility functions and helpers

use std::path::{Component, Path};

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the content, truncated to `length` characters
pub fn hash_content(content: &[u8], length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let mut encoded = hex::encode(hasher.finalize());
    encoded.truncate(length);
    encoded
}

/// Asset name of a file under `root`: relative, `/`-separated
pub fn asset_name(root: &Path, file: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(file, root)?;
    let segments = relative
        .components()
        .map(|c| match c {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;
    Some(segments.join("/"))
}

/// Normalize an asset name so it stays inside the store root
///
/// Separators become `/`, `.` segments are dropped and `..` never climbs
/// above the root.
pub fn normalize_asset_name(name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    segments.join("/")
}

/// Format bytes as human-readable size
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}
