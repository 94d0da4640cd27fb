//! Record shapes kept in the store.
//!
//! Every record is written once by the offline [`catalog`](crate::catalog)
//! upload and is read-only afterwards. The recommendation path only ever
//! reads [`Track`] and [`UserPreferences`]; [`ArtistTrackList`] is a secondary
//! index stored through the same codec.

use serde::{Deserialize, Serialize};

/// Catalog track identifier.
pub type TrackId = u64;

/// Listener identifier.
pub type UserId = u64;

/// A catalog entry with static recommendation links to other tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub artist: String,
    pub title: String,
    /// Ordered links to related tracks. May be empty.
    #[serde(default)]
    pub recommendations: Vec<TrackId>,
}

/// The set of tracks a user is known to like.
///
/// Stored as a sequence, but only membership matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: UserId,
    #[serde(default)]
    pub preferences: Vec<TrackId>,
}

/// All tracks by one artist, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistTrackList {
    pub artist: String,
    #[serde(default)]
    pub track_ids: Vec<TrackId>,
}

/// Tagged union of everything the codec can put in a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Track(Track),
    UserPreferences(UserPreferences),
    ArtistTrackList(ArtistTrackList),
}

impl Record {
    /// Wire tag of this record, as written in the `kind` field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Track(_) => "track",
            Self::UserPreferences(_) => "user_preferences",
            Self::ArtistTrackList(_) => "artist_track_list",
        }
    }
}

impl From<Track> for Record {
    fn from(track: Track) -> Self {
        Self::Track(track)
    }
}

impl From<UserPreferences> for Record {
    fn from(preferences: UserPreferences) -> Self {
        Self::UserPreferences(preferences)
    }
}

impl From<ArtistTrackList> for Record {
    fn from(list: ArtistTrackList) -> Self {
        Self::ArtistTrackList(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_tags() {
        let track = Record::from(Track {
            id: 1,
            artist: "Artist".to_string(),
            title: "Title".to_string(),
            recommendations: vec![],
        });
        let prefs = Record::from(UserPreferences { user_id: 7, preferences: vec![1] });
        let artist = Record::from(ArtistTrackList {
            artist: "Artist".to_string(),
            track_ids: vec![1],
        });

        assert_eq!(track.kind(), "track");
        assert_eq!(prefs.kind(), "user_preferences");
        assert_eq!(artist.kind(), "artist_track_list");
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let track: Record =
            serde_json::from_str(r#"{"kind":"track","id":3,"artist":"A","title":"T"}"#)
                .expect("track without recommendations should parse");

        match track {
            Record::Track(track) => assert!(track.recommendations.is_empty()),
            other => panic!("unexpected record {other:?}"),
        }
    }
}
