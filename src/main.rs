//! # Segue - next-track recommendations
//!
//! Command-line front end over the record store.
//!
//! ## Usage
//!
//! ```bash
//! # Fill the store
//! segue import records.jsonl --top-tracks 4021,77,310
//!
//! # Ask for the next track
//! segue recommend --user 17 --prev-track 4021 --prev-track-time 184.5
//!
//! # Inspect the store
//! segue stats
//! ```
//!
//! Logging goes through `env_logger`, controlled via `RUST_LOG`:
//! - `RUST_LOG=info segue import records.jsonl` - upload progress
//! - `RUST_LOG=segue::selector=trace segue recommend ...` - selection decisions

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use segue::catalog::{self, Catalog};
use segue::cli::{self, Command};
use segue::completion;
use segue::config::{self, RuntimeConfig};
use segue::selector::{PreferenceSelector, RandomSelector, Selector};
use segue::store::SqliteStore;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

/// Settings file, then command-line overrides.
fn runtime_config(config_path: Option<PathBuf>, db: Option<PathBuf>) -> Result<RuntimeConfig> {
    let config_path = match config_path {
        Some(path) => path,
        None => config::get_config_path()?,
    };
    let mut config = RuntimeConfig::load(&config_path)?;
    if let Some(db) = db {
        config.db_path = db;
    }
    debug!("Runtime config: {config:?}");
    Ok(config)
}

fn open_store(config: &RuntimeConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open record store {}", config.db_path.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        Command::Import { path, top_tracks } => {
            let config = runtime_config(args.config, args.db)?;
            let store = open_store(&config)?;

            info!("Importing records from {}", path.display());
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let records = catalog::read_records(BufReader::new(file))?;
            let summary = Catalog::from_records(records)
                .with_top_tracks(top_tracks)
                .upload(&store)?;

            println!(
                "Imported {} tracks, {} users, {} artists, {} top tracks into {}",
                summary.tracks,
                summary.users,
                summary.artists,
                summary.top_tracks,
                config.db_path.display()
            );
        }
        Command::Recommend { user, prev_track, prev_track_time, pool, seed } => {
            let config = runtime_config(args.config, args.db)?;
            let store = Arc::new(open_store(&config)?);

            let pool = if pool.is_empty() {
                config
                    .fallback_pool
                    .resolve(&*store, || Ok(store.track_ids()?))
                    .context("Failed to build fallback pool")?
            } else {
                pool
            };
            debug!("Fallback pool has {} tracks", pool.len());

            let selector = PreferenceSelector::new(Arc::clone(&store), RandomSelector::new(pool));
            let mut rng = match seed.or(config.seed) {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let next = selector
                .recommend_next(user, prev_track, prev_track_time, &mut rng)
                .with_context(|| {
                    format!("No recommendation for user {user} after track {prev_track}")
                })?;
            println!("{next}");
        }
        Command::Stats => {
            let config = runtime_config(args.config, args.db)?;
            let store = open_store(&config)?;

            println!("Store: {}", config.db_path.display());
            for space in ["track", "user", "artist", "chart"] {
                println!("  {space:<8} {}", store.count(space)?);
            }
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(&shell);
            completion::generate_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
