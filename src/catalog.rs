//! # Catalog Upload
//!
//! The offline step that fills the record store before any recommendation
//! is served. A [`Catalog`] collects decoded records in memory and writes
//! them out through a [`RecordWriter`]:
//!
//! - tracks, keyed by track id
//! - user preferences, keyed by user id
//! - an artist index, one [`ArtistTrackList`] per artist, keyed by name
//! - the top-tracks list, when one was given, under [`StoreKey::TopTracks`]
//!
//! Input is a JSON-lines dump in the codec's own wire form, one encoded
//! record per line (see [`read_records`]). Artist lists in the input are
//! ignored; the index is always rebuilt from the tracks.

use crate::codec::{self, EncodeError};
use crate::record::{ArtistTrackList, Record, Track, TrackId, UserPreferences};
use crate::store::{RecordStore, RecordWriter, StoreKey};
use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io::BufRead;

/// In-memory catalog waiting to be uploaded.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
    top_tracks: Vec<TrackId>,
    users_preferences: Vec<UserPreferences>,
}

/// Counts written by [`Catalog::upload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub tracks: usize,
    pub users: usize,
    pub artists: usize,
    pub top_tracks: usize,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort decoded records into tracks and user preferences.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut catalog = Self::new();
        let mut skipped = 0usize;

        for record in records {
            match record {
                Record::Track(track) => catalog.tracks.push(track),
                Record::UserPreferences(prefs) => catalog.users_preferences.push(prefs),
                Record::ArtistTrackList(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Ignored {skipped} artist lists, the index is rebuilt from tracks");
        }
        info!(
            "Catalog has {} tracks and {} users preferences",
            catalog.tracks.len(),
            catalog.users_preferences.len()
        );
        catalog
    }

    /// Most popular tracks, usable as a fallback pool.
    #[must_use]
    pub fn with_top_tracks(mut self, top_tracks: Vec<TrackId>) -> Self {
        info!("Loaded top tracks {:?} ...", &top_tracks[..top_tracks.len().min(3)]);
        self.top_tracks = top_tracks;
        self
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn users_preferences(&self) -> &[UserPreferences] {
        &self.users_preferences
    }

    #[must_use]
    pub fn top_tracks(&self) -> &[TrackId] {
        &self.top_tracks
    }

    /// Ids of every track in the catalog, in catalog order.
    #[must_use]
    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|track| track.id).collect()
    }

    /// Tracks grouped by artist, artists in name order, tracks in catalog order.
    #[must_use]
    pub fn artist_index(&self) -> Vec<ArtistTrackList> {
        let mut grouped: BTreeMap<&str, Vec<TrackId>> = BTreeMap::new();
        for track in &self.tracks {
            grouped.entry(track.artist.as_str()).or_default().push(track.id);
        }

        grouped
            .into_iter()
            .map(|(artist, track_ids)| ArtistTrackList {
                artist: artist.to_string(),
                track_ids,
            })
            .collect()
    }

    pub fn upload_tracks<W: RecordWriter>(&self, store: &W) -> Result<usize> {
        info!("Uploading tracks to store");
        let entries = self
            .tracks
            .par_iter()
            .map(|track| Ok((StoreKey::Track(track.id), codec::encode_track(track)?)))
            .collect::<Result<Vec<_>, EncodeError>>()
            .context("Failed to encode tracks")?;

        let written = store.set_batch(entries).context("Failed to write tracks")?;
        info!("Uploaded {written} tracks");
        Ok(written)
    }

    pub fn upload_users_preferences<W: RecordWriter>(&self, store: &W) -> Result<usize> {
        info!("Uploading users preferences to store");
        let entries = self
            .users_preferences
            .par_iter()
            .map(|prefs| {
                let bytes = codec::encode_preferences(prefs)?;
                Ok((StoreKey::User(prefs.user_id), bytes))
            })
            .collect::<Result<Vec<_>, EncodeError>>()
            .context("Failed to encode users preferences")?;

        let written = store
            .set_batch(entries)
            .context("Failed to write users preferences")?;
        info!("Uploaded {written} users preferences");
        Ok(written)
    }

    pub fn upload_artists<W: RecordWriter>(&self, store: &W) -> Result<usize> {
        info!("Uploading artists to store");
        let entries = self
            .artist_index()
            .into_par_iter()
            .map(|list| {
                let bytes = codec::encode_artist(&list)?;
                Ok((StoreKey::Artist(list.artist), bytes))
            })
            .collect::<Result<Vec<_>, EncodeError>>()
            .context("Failed to encode artists")?;

        let written = store.set_batch(entries).context("Failed to write artists")?;
        info!("Uploaded {written} artists");
        Ok(written)
    }

    /// Store the top-tracks list. An empty list leaves any stored one alone.
    pub fn upload_top_tracks<W: RecordWriter>(&self, store: &W) -> Result<usize> {
        if self.top_tracks.is_empty() {
            debug!("No top tracks to upload");
            return Ok(0);
        }

        let bytes = codec::encode_top_tracks(&self.top_tracks)
            .context("Failed to encode top tracks")?;
        store
            .set(StoreKey::TopTracks, bytes)
            .context("Failed to write top tracks")?;
        info!("Uploaded {} top tracks", self.top_tracks.len());
        Ok(self.top_tracks.len())
    }

    /// Write everything: tracks, users preferences, the artist index, then
    /// the top tracks.
    pub fn upload<W: RecordWriter>(&self, store: &W) -> Result<UploadSummary> {
        Ok(UploadSummary {
            tracks: self.upload_tracks(store)?,
            users: self.upload_users_preferences(store)?,
            artists: self.upload_artists(store)?,
            top_tracks: self.upload_top_tracks(store)?,
        })
    }
}

/// Top-tracks list saved by an earlier upload, if any.
///
/// # Errors
///
/// Fails when the store fails or the stored list cannot be decoded.
pub fn load_top_tracks<S: RecordStore + ?Sized>(store: &S) -> Result<Option<Vec<TrackId>>> {
    let Some(bytes) = store
        .get(&StoreKey::TopTracks)
        .context("Failed to read top tracks")?
    else {
        return Ok(None);
    };
    let top_tracks =
        codec::decode_top_tracks(&bytes).context("Stored top tracks are corrupt")?;
    Ok(Some(top_tracks))
}

/// Read encoded records, one per line. Blank lines are skipped.
///
/// # Errors
///
/// Fails on the first unreadable or undecodable line, naming its number.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = codec::decode(line.as_bytes())
            .with_context(|| format!("Invalid record on line {}", index + 1))?;
        records.push(record);
    }

    debug!("Read {} records", records.len());
    Ok(records)
}
