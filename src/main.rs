mod cli;

use std::process::ExitCode;

use anyhow::Result;
use beacon_extract::prelude::*;
use clap::Parser;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ExtractionError>() {
            Some(expected) if expected.is_expected() => {
                eprintln!("{expected}");
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "beacon_extract=debug" } else { "beacon_extract=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let pretty = cli.pretty;
    let config = Config::load(cli.config.as_deref())?;
    let extractor = BeaconExtractor::new(config)?;

    match cli.command {
        Commands::Extract { url, resolve } => match extractor.extract(&url).await? {
            Extraction::Playlist(playlist) if resolve => {
                print_resolved(&extractor, &playlist, pretty).await
            }
            other => print_json(&other, pretty),
        },
        Commands::Content { slug } => print_json(&extractor.extract_content(&slug).await?, pretty),
        Commands::Series { slug, resolve } => {
            let playlist = extractor.extract_series(&slug).await?;
            if resolve {
                print_resolved(&extractor, &playlist, pretty).await
            } else {
                print_json(&playlist, pretty)
            }
        }
    }
}

#[derive(Serialize)]
struct ResolvedPlaylist<'a> {
    id: &'a str,
    title: &'a str,
    entries: Vec<OutputRecord>,
}

async fn print_resolved(
    extractor: &BeaconExtractor,
    playlist: &Playlist,
    pretty: bool,
) -> Result<()> {
    let mut entries = Vec::with_capacity(playlist.entries.len());
    for (id, result) in extractor.resolve_entries(playlist).await {
        match result {
            Ok(record) => entries.push(record),
            Err(e) => warn!(id = %id, error = %format!("{e:#}"), "skipping playlist entry"),
        }
    }
    print_json(&ResolvedPlaylist { id: &playlist.id, title: &playlist.title, entries }, pretty)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}
