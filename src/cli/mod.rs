//! Command-line interface for Mediasplit
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `split`: Split a build's stylesheets by media condition
//! - `init`: Write a starter configuration

mod init;
mod split;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use init::InitCommand;
pub use split::SplitCommand;

/// Mediasplit - split compiled stylesheets by media condition
#[derive(Parser, Debug)]
#[command(name = "mediasplit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to mediasplit.toml config file
    #[arg(short, long, global = true, default_value = "mediasplit.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split the stylesheets of a build output directory
    Split(SplitCommand),

    /// Write a starter mediasplit.toml
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Split(cmd) => cmd.execute(&self.config).await,
            Commands::Init(cmd) => cmd.execute().await,
        }
    }
}

/// Print the Mediasplit banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "◐".cyan(),
        "Mediasplit".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
