use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extract media metadata and playlists from beacon.tv pages
#[derive(Parser)]
#[command(name = "beacon-extract")]
#[command(about = "Extract media metadata and playlists from beacon.tv pages", long_about = None)]
pub struct Cli {
    /// Config file (defaults to config.toml in the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a content or series page by URL
    Extract {
        url: String,
        /// Follow playlist entries and print the resolved records
        #[arg(long)]
        resolve: bool,
    },
    /// Extract a content page by slug
    Content {
        slug: String,
    },
    /// List a series by slug
    Series {
        slug: String,
        /// Follow playlist entries and print the resolved records
        #[arg(long)]
        resolve: bool,
    },
}
