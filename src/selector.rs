//! Next-track selection.
//!
//! Two strategies share the [`Selector`] capability:
//!
//! - [`RandomSelector`] - uniform pick from a fixed pool. Never delegates.
//! - [`PreferenceSelector`] - follows the previous track's recommendation
//!   links, narrowed to what the user already likes when there is overlap.
//!   Falls back to a composed selector whenever its data is missing.
//!
//! Randomness is passed into every call, so a selector holds no mutable
//! state and can be shared across threads. Production code hands in
//! `rand::thread_rng()`; tests hand in a seeded `StdRng`.
//!
//! # Examples
//!
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use segue::codec;
//! use segue::record::{Track, UserPreferences};
//! use segue::selector::{PreferenceSelector, RandomSelector, Selector};
//! use segue::store::{MemoryStore, RecordWriter, StoreKey};
//!
//! let store = MemoryStore::new();
//! let track = Track { id: 1, artist: "A".into(), title: "T".into(), recommendations: vec![2, 3] };
//! let prefs = UserPreferences { user_id: 7, preferences: vec![3] };
//! store.set(StoreKey::Track(1), codec::encode_track(&track)?)?;
//! store.set(StoreKey::User(7), codec::encode_preferences(&prefs)?)?;
//!
//! let selector = PreferenceSelector::new(&store, RandomSelector::new(vec![100]));
//! let mut rng = StdRng::seed_from_u64(1);
//! assert_eq!(selector.recommend_next(7, 1, 31.5, &mut rng)?, 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::codec;
use crate::error::{Error, Result};
use crate::record::{TrackId, UserId};
use crate::store::{RecordStore, StoreKey};
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashSet;

/// Anything that can pick the track to play after `prev_track`.
pub trait Selector: Send + Sync {
    /// Choose the next track for `user`.
    ///
    /// `prev_track_time` is how long the previous track played, in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolEmpty`] when no candidate exists at all,
    /// [`Error::Decode`] when a stored record is corrupt, and
    /// [`Error::Store`] when the backend fails.
    fn recommend_next(
        &self,
        user: UserId,
        prev_track: TrackId,
        prev_track_time: f64,
        rng: &mut dyn RngCore,
    ) -> Result<TrackId>;
}

/// Uniform pick from a configured pool of track ids.
#[derive(Debug, Clone, Default)]
pub struct RandomSelector {
    pool: Vec<TrackId>,
}

impl RandomSelector {
    #[must_use]
    pub fn new(pool: Vec<TrackId>) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &[TrackId] {
        &self.pool
    }
}

impl Selector for RandomSelector {
    fn recommend_next(
        &self,
        user: UserId,
        prev_track: TrackId,
        prev_track_time: f64,
        rng: &mut dyn RngCore,
    ) -> Result<TrackId> {
        let track = self.pool.choose(rng).copied().ok_or(Error::PoolEmpty)?;
        trace!(
            "Random pick {track} of {} for user {user} after {prev_track} ({:.1}s)",
            self.pool.len(),
            prev_track_time
        );
        Ok(track)
    }
}

/// Recommendation-link selector personalised by user preferences.
///
/// Lookup order matters: an unknown previous track or an unknown user both
/// go straight to the fallback, before anything is decoded.
#[derive(Debug, Clone)]
pub struct PreferenceSelector<S, F = RandomSelector> {
    store: S,
    fallback: F,
}

impl<S, F> PreferenceSelector<S, F>
where
    S: RecordStore,
    F: Selector,
{
    #[must_use]
    pub fn new(store: S, fallback: F) -> Self {
        Self { store, fallback }
    }

    #[must_use]
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    fn fall_back(
        &self,
        reason: &str,
        user: UserId,
        prev_track: TrackId,
        prev_track_time: f64,
        rng: &mut dyn RngCore,
    ) -> Result<TrackId> {
        debug!("User {user}, previous track {prev_track}: {reason}, using fallback");
        self.fallback
            .recommend_next(user, prev_track, prev_track_time, rng)
    }
}

impl<S, F> Selector for PreferenceSelector<S, F>
where
    S: RecordStore,
    F: Selector,
{
    fn recommend_next(
        &self,
        user: UserId,
        prev_track: TrackId,
        prev_track_time: f64,
        rng: &mut dyn RngCore,
    ) -> Result<TrackId> {
        let Some(track_bytes) = self.store.get(&StoreKey::Track(prev_track))? else {
            return self.fall_back("previous track unknown", user, prev_track, prev_track_time, rng);
        };
        let Some(prefs_bytes) = self.store.get(&StoreKey::User(user))? else {
            return self.fall_back("no preferences stored", user, prev_track, prev_track_time, rng);
        };

        let track = codec::decode_track(&track_bytes)?;
        let prefs = codec::decode_preferences(&prefs_bytes)?;

        if track.recommendations.is_empty() {
            return self.fall_back("no recommendations", user, prev_track, prev_track_time, rng);
        }

        let candidates = candidate_pool(&track.recommendations, &prefs.preferences);
        let next = candidates.choose(rng).copied().ok_or(Error::PoolEmpty)?;
        trace!(
            "User {user}: picked {next} from {} of {} recommendations after {prev_track} ({:.1}s)",
            candidates.len(),
            track.recommendations.len(),
            prev_track_time
        );
        Ok(next)
    }
}

/// Tracks eligible for the final pick.
///
/// The recommendations that the user also prefers, in recommendation order
/// without repeats. When nothing overlaps (including empty preferences) the
/// whole recommendation list is returned as-is.
#[must_use]
pub fn candidate_pool(recommendations: &[TrackId], preferences: &[TrackId]) -> Vec<TrackId> {
    let preferred: HashSet<TrackId> = preferences.iter().copied().collect();
    let mut seen = HashSet::new();
    let overlap: Vec<TrackId> = recommendations
        .iter()
        .copied()
        .filter(|id| preferred.contains(id) && seen.insert(*id))
        .collect();

    if overlap.is_empty() {
        recommendations.to_vec()
    } else {
        overlap
    }
}
