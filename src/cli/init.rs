//! Configuration scaffolding command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Write a starter mediasplit.toml
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Directory to create the config in
    #[arg(default_value = ".")]
    pub dir: String,

    /// Entry chunk id whose script receives the metadata table
    #[arg(short, long, default_value = "main")]
    pub entry: String,

    /// Overwrite an existing config
    #[arg(short, long)]
    pub force: bool,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let dir = Path::new(&self.dir);
        let config_path = dir.join("mediasplit.toml");

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            );
        }

        fs::create_dir_all(dir).context("Failed to create config directory")?;
        fs::write(&config_path, self.generate_config())
            .context("Failed to write mediasplit.toml")?;

        eprintln!("  {} Created {}", "✓".green(), config_path.display().to_string().cyan());
        eprintln!("\n  Next steps:");
        eprintln!(
            "    {} add {} to your entry script",
            "→".dimmed(),
            crate::splitter::PLACEHOLDER.cyan()
        );
        eprintln!("    {} mediasplit split", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_config(&self) -> String {
        format!(
r#"# Mediasplit configuration

[split]
minify = false
keep_original = false
chunk_filename = "[id].[contenthash].css"
exclude = []
entry = "{entry}"

[output]
dir = "dist"

[[bucket]]
id = "mobile"
media = "max-width:\\s*767px"
default = true
with_common_styles = true
prefetch = ["desktop"]

[[bucket]]
id = "desktop"
media = "min-width:\\s*768px"
with_common_styles = true

[[bucket]]
id = "print"
media = "print"
"#,
            entry = self.entry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_generated_config_is_valid() {
        let cmd = InitCommand {
            dir: ".".to_string(),
            entry: "app".to_string(),
            force: false,
        };

        let config = Config::from_toml_str(&cmd.generate_config()).unwrap();
        let split = config.compile().unwrap();

        assert_eq!(split.entry.as_deref(), Some("app"));
        assert_eq!(split.bucket_order(), vec!["mobile", "desktop", "print", "common"]);
        assert!(split.bucket("mobile").unwrap().matches(Some("(max-width: 767px)")));
    }
}
