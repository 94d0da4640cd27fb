//! Next-track recommendations over a key-value record store.
//!
//! Core modules:
//! - [`selector`] - Next-track selection (preference-narrowed links, random fallback)
//! - [`codec`] - Record byte format
//! - [`store`] - Record storage (in-memory and SQLite)
//! - [`record`] - Track, user preference and artist index records
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - Offline upload that fills the store
//! - [`config`] - Data directory and runtime settings
//! - [`error`] - Errors surfaced by the recommendation path
//! - [`cli`] - Command-line interface definitions
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use rand::thread_rng;
//! use segue::catalog::Catalog;
//! use segue::record::{Record, Track, UserPreferences};
//! use segue::selector::{PreferenceSelector, RandomSelector, Selector};
//! use segue::store::MemoryStore;
//!
//! let track = |id, artist: &str, recommendations| Track {
//!     id,
//!     artist: artist.to_string(),
//!     title: format!("Track {id}"),
//!     recommendations,
//! };
//! let catalog = Catalog::from_records(vec![
//!     Record::Track(track(1, "A", vec![2, 3])),
//!     Record::Track(track(2, "A", vec![])),
//!     Record::Track(track(3, "B", vec![1])),
//!     Record::UserPreferences(UserPreferences { user_id: 9, preferences: vec![3] }),
//! ]);
//!
//! let store = MemoryStore::new();
//! catalog.upload(&store)?;
//!
//! let selector = PreferenceSelector::new(&store, RandomSelector::new(catalog.track_ids()));
//! let next = selector.recommend_next(9, 1, 200.0, &mut thread_rng())?;
//! assert_eq!(next, 3);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Selection
//!
//! For a user and the track they just played:
//!
//! 1. Unknown previous track or unknown user: random pick from the fallback pool
//! 2. Previous track without recommendations: random pick from the fallback pool
//! 3. Recommendations the user already prefers: random pick among those
//! 4. Otherwise: random pick among all recommendations
//!
//! The play time of the previous track is accepted and handed on, but does
//! not affect the choice.
//!
//! ## Error Handling
//!
//! Absent records are never errors. Corrupt records, an empty fallback pool
//! and store failures surface as [`error::Error`].

pub mod catalog;
pub mod cli;
pub mod codec;
pub mod completion;
pub mod config;
pub mod error;
pub mod record;
pub mod selector;
pub mod store;
