//! Mediasplit - split compiled stylesheets by media condition
//!
//! Runs after a frontend build: every stylesheet in the output directory is
//! partitioned into per-media fragments (`main.print.<hash>.css`, ...) and
//! the entry script's `{CSS_CHUNKS_BY_MEDIA:1}` placeholder is replaced with
//! the table the page uses to load them.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediasplit_lib::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mediasplit=debug,mediasplit_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mediasplit=info,mediasplit_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
