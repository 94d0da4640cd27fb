//! Record codec: the byte format shared by the loader and the selector.
//!
//! Records are stored as JSON objects tagged with a `kind` field:
//!
//! ```text
//! {"kind":"track","id":12,"artist":"...","title":"...","recommendations":[4,9]}
//! {"kind":"user_preferences","user_id":3,"preferences":[9,12]}
//! {"kind":"artist_track_list","artist":"...","track_ids":[12,13]}
//! ```
//!
//! Sequences keep their order, so `decode(encode(r)) == r` for every shape.
//!
//! # Examples
//!
//! ```
//! use segue::codec;
//! use segue::record::Track;
//!
//! let track = Track {
//!     id: 12,
//!     artist: "Artist".to_string(),
//!     title: "Title".to_string(),
//!     recommendations: vec![4, 9],
//! };
//! let bytes = codec::encode_track(&track)?;
//! assert_eq!(codec::decode_track(&bytes)?, track);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::record::{ArtistTrackList, Record, Track, TrackId, UserPreferences};
use serde::Serialize;
use thiserror::Error;

/// Bytes could not be turned back into the expected record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed record bytes: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected a `{expected}` record, found `{found}`")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },
}

/// A record could not be serialized.
#[derive(Debug, Error)]
#[error("failed to encode `{kind}` record: {source}")]
pub struct EncodeError {
    kind: &'static str,
    #[source]
    source: serde_json::Error,
}

/// Borrowed mirror of [`Record`] so typed encoders don't have to clone.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RecordRef<'a> {
    Track(&'a Track),
    UserPreferences(&'a UserPreferences),
    ArtistTrackList(&'a ArtistTrackList),
}

impl RecordRef<'_> {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Track(_) => "track",
            Self::UserPreferences(_) => "user_preferences",
            Self::ArtistTrackList(_) => "artist_track_list",
        }
    }
}

fn encode_ref(record: &RecordRef<'_>) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(record).map_err(|source| EncodeError {
        kind: record.kind(),
        source,
    })
}

/// Serialize any record into its stored form.
pub fn encode(record: &Record) -> Result<Vec<u8>, EncodeError> {
    let borrowed = match record {
        Record::Track(track) => RecordRef::Track(track),
        Record::UserPreferences(prefs) => RecordRef::UserPreferences(prefs),
        Record::ArtistTrackList(list) => RecordRef::ArtistTrackList(list),
    };
    encode_ref(&borrowed)
}

/// Serialize a [`Track`] in its tagged form.
pub fn encode_track(track: &Track) -> Result<Vec<u8>, EncodeError> {
    encode_ref(&RecordRef::Track(track))
}

/// Serialize a [`UserPreferences`] in its tagged form.
pub fn encode_preferences(prefs: &UserPreferences) -> Result<Vec<u8>, EncodeError> {
    encode_ref(&RecordRef::UserPreferences(prefs))
}

/// Serialize an [`ArtistTrackList`] in its tagged form.
pub fn encode_artist(list: &ArtistTrackList) -> Result<Vec<u8>, EncodeError> {
    encode_ref(&RecordRef::ArtistTrackList(list))
}

/// Deserialize stored bytes into whichever record they hold.
pub fn decode(bytes: &[u8]) -> Result<Record, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode bytes that must hold a [`Track`].
pub fn decode_track(bytes: &[u8]) -> Result<Track, DecodeError> {
    match decode(bytes)? {
        Record::Track(track) => Ok(track),
        other => Err(DecodeError::UnexpectedKind {
            expected: "track",
            found: other.kind(),
        }),
    }
}

/// Decode bytes that must hold a [`UserPreferences`].
pub fn decode_preferences(bytes: &[u8]) -> Result<UserPreferences, DecodeError> {
    match decode(bytes)? {
        Record::UserPreferences(prefs) => Ok(prefs),
        other => Err(DecodeError::UnexpectedKind {
            expected: "user_preferences",
            found: other.kind(),
        }),
    }
}

/// Decode bytes that must hold an [`ArtistTrackList`].
pub fn decode_artist(bytes: &[u8]) -> Result<ArtistTrackList, DecodeError> {
    match decode(bytes)? {
        Record::ArtistTrackList(list) => Ok(list),
        other => Err(DecodeError::UnexpectedKind {
            expected: "artist_track_list",
            found: other.kind(),
        }),
    }
}

/// Serialize the top-tracks list as a plain JSON array of ids.
pub fn encode_top_tracks(top_tracks: &[TrackId]) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(top_tracks).map_err(|source| EncodeError {
        kind: "top_tracks",
        source,
    })
}

/// Decode the top-tracks list written by [`encode_top_tracks`].
pub fn decode_top_tracks(bytes: &[u8]) -> Result<Vec<TrackId>, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_track() -> Track {
        Track {
            id: 42,
            artist: "Nina Simone".to_string(),
            title: "Sinnerman".to_string(),
            recommendations: vec![7, 3, 99, 3],
        }
    }

    #[test]
    fn test_track_round_trip_keeps_order() {
        let track = sample_track();
        let bytes = encode_track(&track).unwrap();
        let decoded = decode_track(&bytes).unwrap();

        assert_eq!(decoded, track);
        assert_eq!(decoded.recommendations, vec![7, 3, 99, 3]);
    }

    #[test]
    fn test_preferences_round_trip_keeps_membership() {
        let prefs = UserPreferences { user_id: 5, preferences: vec![10, 2, 8] };
        let decoded = decode_preferences(&encode_preferences(&prefs).unwrap()).unwrap();

        assert_eq!(decoded.user_id, 5);
        let expected: HashSet<_> = prefs.preferences.iter().copied().collect();
        let actual: HashSet<_> = decoded.preferences.iter().copied().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_artist_round_trip() {
        let list = ArtistTrackList {
            artist: "Björk".to_string(),
            track_ids: vec![30, 11, 12],
        };
        assert_eq!(decode_artist(&encode_artist(&list).unwrap()).unwrap(), list);
    }

    #[test]
    fn test_generic_encode_matches_typed_encode() {
        let track = sample_track();
        let generic = encode(&Record::Track(track.clone())).unwrap();
        assert_eq!(generic, encode_track(&track).unwrap());
        assert_eq!(decode(&generic).unwrap(), Record::Track(track));
    }

    #[test]
    fn test_malformed_bytes_fail() {
        let err = decode_track(b"\x80not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));

        let err = decode(br#"{"kind":"track","id":"nope"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_top_tracks_round_trip() {
        let bytes = encode_top_tracks(&[40, 2, 17]).unwrap();
        assert_eq!(decode_top_tracks(&bytes).unwrap(), vec![40, 2, 17]);
        assert!(matches!(decode_top_tracks(b"{}"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_wrong_kind_is_reported() {
        let prefs = UserPreferences { user_id: 1, preferences: vec![] };
        let bytes = encode_preferences(&prefs).unwrap();
        let err = decode_track(&bytes).unwrap_err();

        match err {
            DecodeError::UnexpectedKind { expected, found } => {
                assert_eq!(expected, "track");
                assert_eq!(found, "user_preferences");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
