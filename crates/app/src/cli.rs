//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Authenticated GETs against the configured API.
#[derive(Debug, Parser)]
#[command(name = "warden", version)]
#[command(about = "Send authenticated requests through the Warden session", long_about = None)]
pub struct Args {
    /// Explicit configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API paths or absolute URLs to fetch
    #[arg(required = true)]
    pub paths: Vec<String>,
}
