//! # Command-Line Interface Module
//!
//! Clap definitions for the `segue` binary.
//!
//! ## Commands
//!
//! - `import`: Upload a JSON-lines dump of encoded records into the store
//! - `recommend`: Print the next track for a user
//! - `stats`: Count the records in each key space
//! - `completion`: Generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! segue import records.jsonl --top-tracks 4021,77,310
//! segue recommend --user 17 --prev-track 4021 --prev-track-time 184.5
//! RUST_LOG=segue::selector=debug segue recommend --user 17 --prev-track 9
//! ```

use crate::record::{TrackId, UserId};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "segue")]
#[command(about = "Segue: next-track recommendations from cached catalog & preference records")]
#[command(version)]
pub struct Args {
    /// Settings file. Defaults to `config.json` in the platform config directory.
    #[arg(long, global = true, env = "SEGUE_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Record store to use, overriding the settings file
    #[arg(long, global = true, env = "SEGUE_DB", value_hint = clap::ValueHint::FilePath)]
    pub db: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload records into the store
    ///
    /// Reads one encoded record per line (tracks and user preferences) and
    /// writes them to the store, then rebuilds the per-artist index.
    Import {
        /// JSON-lines file of encoded records
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,

        /// Most popular tracks, most popular first (comma separated).
        /// Used as the fallback pool unless the settings file says otherwise.
        #[arg(long, value_delimiter = ',')]
        top_tracks: Vec<TrackId>,
    },

    /// Recommend the track to play after `--prev-track`
    ///
    /// Prints a single track id.
    Recommend {
        /// User to recommend for
        #[arg(long)]
        user: UserId,

        /// Track the user just played
        #[arg(long)]
        prev_track: TrackId,

        /// Seconds the previous track played
        #[arg(long, default_value_t = 0.0)]
        prev_track_time: f64,

        /// Fallback pool, overriding the settings file (comma separated)
        #[arg(long, value_delimiter = ',')]
        pool: Vec<TrackId>,

        /// Seed the random source for a reproducible pick
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show how many records each key space holds
    Stats,

    /// Generate shell completions
    ///
    /// Usage: segue completion bash > ~/.local/share/bash-completion/completions/segue
    Completion {
        shell: Shell,
    },
}
