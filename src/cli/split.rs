//! Split command implementation

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::config::Config;
use crate::splitter::{MediaSplitter, PatchOutcome};
use crate::store::FsAssetStore;
use crate::utils::{format_duration, format_size};

/// Split the stylesheets of a build by media condition
#[derive(Args, Debug)]
pub struct SplitCommand {
    /// Build output directory (defaults to `output.dir`)
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Minify every fragment
    #[arg(short, long)]
    pub minify: bool,

    /// Keep the unsplit stylesheet as the common output
    #[arg(long)]
    pub keep_original: bool,

    /// Entry chunk id whose script receives the metadata table
    #[arg(short, long)]
    pub entry: Option<String>,
}

impl SplitCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let mut config = Config::load(config_path)?;
        self.apply_overrides(&mut config);

        let output_dir = self.outdir.clone().unwrap_or_else(|| config.output_dir());
        let store = Arc::new(FsAssetStore::new(&output_dir)?);

        eprintln!(
            "{} Splitting stylesheets in {}...",
            "→".blue(),
            output_dir.display().to_string().cyan()
        );

        let splitter = MediaSplitter::new(config.compile()?, store);
        let report = splitter.run().await?;

        eprintln!(
            "\n{} Wrote {} fragment(s) in {}\n",
            "✓".green().bold(),
            report.fragments.len(),
            format_duration(start.elapsed())
        );

        for fragment in &report.fragments {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                fragment.name.cyan(),
                format_size(fragment.size).dimmed()
            );
        }

        for name in &report.deleted {
            eprintln!("  {} {} {}", "-".dimmed(), name.dimmed(), "removed".dimmed());
        }

        for name in &report.skipped {
            eprintln!("  {} {} {}", "-".dimmed(), name.dimmed(), "excluded".dimmed());
        }

        match &report.patch {
            PatchOutcome::Patched { asset, size } => eprintln!(
                "\n  {} Patched {} {}",
                "✓".green(),
                asset.cyan(),
                format_size(*size).dimmed()
            ),
            PatchOutcome::NoEntryConfigured => {}
            PatchOutcome::EntryNotFound { entry } => eprintln!(
                "\n  {} No script found for entry {}",
                "!".yellow(),
                entry.yellow()
            ),
            PatchOutcome::PlaceholderMissing { asset } => eprintln!(
                "\n  {} {} has no metadata placeholder",
                "!".yellow(),
                asset.yellow()
            ),
        }

        eprintln!();

        Ok(())
    }

    /// Command-line flags take precedence over the config file
    fn apply_overrides(&self, config: &mut Config) {
        config.split.minify |= self.minify;
        config.split.keep_original |= self.keep_original;
        if let Some(entry) = &self.entry {
            config.split.entry = Some(entry.clone());
        }
    }
}
