//! Mediasplit library
//!
//! Splits compiled stylesheets into per-media fragments and embeds a
//! fragment lookup table into the entry script.

pub mod cli;
pub mod config;
pub mod hash;
pub mod minify;
pub mod splitter;
pub mod store;
pub mod utils;

pub use cli::Cli;
pub use config::{Config, SplitConfig};
pub use splitter::{MediaSplitter, SplitError, SplitReport};
