//! Key-value record storage.
//!
//! The selector only needs [`RecordStore::get`]; the offline upload uses
//! [`RecordWriter`]. Keys live in disjoint spaces (tracks, users, artists,
//! plus one slot for the top-tracks list) so a user id equal to a track id
//! never resolves to the wrong record.
//!
//! Two backends are provided:
//!
//! - [`MemoryStore`] - a `HashMap` behind a `RwLock`, for tests and embedding
//! - [`SqliteStore`] - a single `records` table in an SQLite file

use crate::record::{TrackId, UserId};
use log::{debug, trace};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use thiserror::Error;

/// Failures of the storage backend itself. An absent key is not one of them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store lock poisoned while {0}")]
    Poisoned(&'static str),
    #[error("stored key `{key}` in space `{space}` is not a valid id")]
    InvalidKey { space: &'static str, key: String },
}

/// Address of one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Track(TrackId),
    User(UserId),
    Artist(String),
    /// The single top-tracks list.
    TopTracks,
}

impl StoreKey {
    /// Name of the key space this key belongs to.
    #[must_use]
    pub const fn space(&self) -> &'static str {
        match self {
            Self::Track(_) => "track",
            Self::User(_) => "user",
            Self::Artist(_) => "artist",
            Self::TopTracks => "chart",
        }
    }

    /// Key within its space, as stored.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Track(id) | Self::User(id) => id.to_string(),
            Self::Artist(artist) => artist.clone(),
            Self::TopTracks => "top_tracks".to_string(),
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.space(), self.name())
    }
}

/// Read side of the store.
pub trait RecordStore: Send + Sync {
    /// Fetch the raw bytes stored under `key`, or `None` if nothing is there.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backend fails.
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Write side of the store, used by the offline upload.
pub trait RecordWriter {
    /// Store `bytes` under `key`, replacing anything already there.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the write.
    fn set(&self, key: StoreKey, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Store many entries, returning how many were written.
    ///
    /// # Errors
    ///
    /// Stops at the first failed write.
    fn set_batch<I>(&self, entries: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = (StoreKey, Vec<u8>)>,
    {
        let mut written = 0;
        for (key, bytes) in entries {
            self.set(key, bytes)?;
            written += 1;
        }
        Ok(written)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<StoreKey, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every track id present in the store, ascending.
    pub fn track_ids(&self) -> Result<Vec<TrackId>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned("listing track ids"))?;
        let mut ids: Vec<TrackId> = records
            .keys()
            .filter_map(|key| match key {
                StoreKey::Track(id) => Some(*id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Number of records in the given key space.
    pub fn count(&self, space: &str) -> Result<usize, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned("counting records"))?;
        Ok(records.keys().filter(|key| key.space() == space).count())
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Poisoned("reading a record"))?;
        Ok(records.get(key).cloned())
    }
}

impl RecordWriter for MemoryStore {
    fn set(&self, key: StoreKey, bytes: Vec<u8>) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Poisoned("writing a record"))?;
        records.insert(key, bytes);
        Ok(())
    }
}

/// SQLite-backed store. One row per record: `(space, key, bytes)`.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        debug!("Opening record store at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Store that lives only as long as the value. Good for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                space TEXT NOT NULL,
                key   TEXT NOT NULL,
                bytes BLOB NOT NULL,
                PRIMARY KEY (space, key)
            )",
            (),
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self, action: &'static str) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned(action))
    }

    /// Every track id present in the store, ascending.
    pub fn track_ids(&self) -> Result<Vec<TrackId>, StoreError> {
        let conn = self.lock("listing track ids")?;
        let mut stmt = conn.prepare("SELECT key FROM records WHERE space = 'track'")?;
        let keys = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for key in keys {
            let key = key?;
            let id = key
                .parse::<TrackId>()
                .map_err(|_| StoreError::InvalidKey { space: "track", key })?;
            ids.push(id);
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Number of records in the given key space.
    pub fn count(&self, space: &str) -> Result<usize, StoreError> {
        let conn = self.lock("counting records")?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE space = ?1",
            [space],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.lock("reading a record")?;
        let mut stmt =
            conn.prepare_cached("SELECT bytes FROM records WHERE space = ?1 AND key = ?2")?;
        let bytes = stmt
            .query_row((key.space(), key.name()), |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        trace!("Lookup {key}: {}", if bytes.is_some() { "hit" } else { "miss" });
        Ok(bytes)
    }
}

impl RecordWriter for SqliteStore {
    fn set(&self, key: StoreKey, bytes: Vec<u8>) -> Result<(), StoreError> {
        let conn = self.lock("writing a record")?;
        conn.execute(
            "INSERT OR REPLACE INTO records (space, key, bytes) VALUES (?1, ?2, ?3)",
            (key.space(), key.name(), bytes),
        )?;
        Ok(())
    }

    /// All entries go in one transaction.
    fn set_batch<I>(&self, entries: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = (StoreKey, Vec<u8>)>,
    {
        let mut conn = self.lock("writing a batch")?;
        let tx = conn.transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx
                .prepare("INSERT OR REPLACE INTO records (space, key, bytes) VALUES (?1, ?2, ?3)")?;
            for (key, bytes) in entries {
                stmt.execute((key.space(), key.name(), bytes))?;
                written += 1;
            }
        }

        tx.commit()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_spaces_are_disjoint() {
        let store = MemoryStore::new();
        store.set(StoreKey::Track(1), b"track".to_vec()).unwrap();
        store.set(StoreKey::User(1), b"user".to_vec()).unwrap();

        assert_eq!(store.get(&StoreKey::Track(1)).unwrap().unwrap(), b"track");
        assert_eq!(store.get(&StoreKey::User(1)).unwrap().unwrap(), b"user");
        assert!(store.get(&StoreKey::User(2)).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_listing() {
        let store = MemoryStore::new();
        store
            .set_batch(vec![
                (StoreKey::Track(9), vec![]),
                (StoreKey::Track(3), vec![]),
                (StoreKey::User(4), vec![]),
                (StoreKey::Artist("A".to_string()), vec![]),
            ])
            .unwrap();

        assert_eq!(store.track_ids().unwrap(), vec![3, 9]);
        assert_eq!(store.count("user").unwrap(), 1);
        assert_eq!(store.count("artist").unwrap(), 1);
    }

    #[test]
    fn test_sqlite_store_get_set() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get(&StoreKey::Track(5)).unwrap().is_none());

        store.set(StoreKey::Track(5), b"first".to_vec()).unwrap();
        store.set(StoreKey::Track(5), b"second".to_vec()).unwrap();
        store.set(StoreKey::Artist("Can".to_string()), b"artist".to_vec()).unwrap();

        assert_eq!(store.get(&StoreKey::Track(5)).unwrap().unwrap(), b"second");
        assert_eq!(store.get(&StoreKey::Artist("Can".to_string())).unwrap().unwrap(), b"artist");
        assert!(store.get(&StoreKey::User(5)).unwrap().is_none());
    }

    #[test]
    fn test_sqlite_batch_and_listing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let written = store
            .set_batch((1..=5).rev().map(|id| (StoreKey::Track(id), vec![id as u8])))
            .unwrap();

        assert_eq!(written, 5);
        assert_eq!(store.track_ids().unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(store.count("track").unwrap(), 5);
        assert_eq!(store.count("user").unwrap(), 0);
    }

    #[test]
    fn test_shared_handle_reads() {
        let store = Arc::new(MemoryStore::new());
        store.set(StoreKey::User(2), b"u".to_vec()).unwrap();

        let shared: Arc<MemoryStore> = Arc::clone(&store);
        assert!(shared.get(&StoreKey::User(2)).unwrap().is_some());
        assert_eq!(StoreKey::User(2).to_string(), "user:2");
        assert_eq!(StoreKey::TopTracks.to_string(), "chart:top_tracks");
    }
}
