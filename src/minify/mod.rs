//! CSS minification
//!
//! Applied to each bucket independently, after classification and before
//! the common styles are merged.

use anyhow::{anyhow, Result};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use tracing::debug;

/// Minifies one bucket's CSS
pub trait Minifier: Send + Sync {
    fn minify(&self, css: &str) -> Result<String>;
}

/// Minifier backed by lightningcss
#[derive(Debug, Clone, Default)]
pub struct LightningMinifier;

impl Minifier for LightningMinifier {
    fn minify(&self, css: &str) -> Result<String> {
        let mut stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| anyhow!("Invalid CSS: {}", e))?;

        stylesheet
            .minify(MinifyOptions::default())
            .map_err(|e| anyhow!("Minification failed: {}", e))?;

        let output = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("Failed to print CSS: {}", e))?;

        debug!("Minified {} -> {} bytes", css.len(), output.code.len());

        Ok(output.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minifies_whitespace_and_comments() {
        let css = "/* heading */\nh1 {\n  color: red;\n}\n\nh2 {\n  margin: 0px;\n}\n";
        let output = LightningMinifier.minify(css).unwrap();

        assert!(!output.contains('\n'));
        assert!(!output.contains("heading"));
        assert!(output.starts_with("h1{"));
        assert!(output.len() < css.len());
    }
}
