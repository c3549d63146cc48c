//! SQLite-backed embedding store.
//!
//! Holds one row per file identity: the content hash the embedding was
//! computed from and the encoded vector. Hash and vector are always written
//! in the same statement so they can never drift apart.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::{Deserialize, Serialize};

use super::codec::{decode_vector, encode_vector};
use super::error::{StorageError, StorageResult};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS embeddings (
    id TEXT PRIMARY KEY,
    hash TEXT NOT NULL,
    embedding BLOB NOT NULL
)";

const UPSERT_SQL: &str = "INSERT INTO embeddings (id, hash, embedding) VALUES (?1, ?2, ?3)
    ON CONFLICT(id) DO UPDATE SET hash = excluded.hash, embedding = excluded.embedding";

/// Upper bound on bound parameters per `IN (...)` query.
const MAX_IDS_PER_QUERY: usize = 500;

/// How long a writer waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A single row of the embeddings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Stable file identity (the path as walked)
    pub id: String,
    /// Fingerprint of the content the vector was derived from
    pub hash: String,
    /// The embedding itself
    pub vector: Vec<f32>,
}

/// Durable id → (hash, vector) store.
///
/// Safe to share between worker threads: the connection sits behind an
/// internal mutex and every operation is a single statement.
pub struct EmbeddingStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for EmbeddingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingStore")
            .field("path", &self.path)
            .finish()
    }
}

impl EmbeddingStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::migrate(&conn)?;

        tracing::debug!("Opened embedding store at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory database. Contents vanish on drop.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn migrate(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(CREATE_TABLE_SQL)?;
        Ok(())
    }

    /// Path of the backing database, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Inserts a record or replaces the existing one for `id`.
    pub fn upsert(&self, id: &str, hash: &str, vector: &[f32]) -> StorageResult<()> {
        let blob = encode_vector(vector);
        let conn = self.conn.lock();
        conn.prepare_cached(UPSERT_SQL)?
            .execute(params![id, hash, blob])?;
        Ok(())
    }

    /// Returns true iff a record exists for `id` and its hash equals `hash`.
    pub fn match_hash(&self, id: &str, hash: &str) -> StorageResult<bool> {
        let conn = self.conn.lock();
        let stored: Option<String> = conn
            .prepare_cached("SELECT hash FROM embeddings WHERE id = ?1")?
            .query_row(params![id], |row| row.get(0))
            .optional()?;
        Ok(stored.as_deref() == Some(hash))
    }

    /// Fetches the records that exist among `ids`, in no particular order.
    ///
    /// Missing ids are silently absent from the result.
    pub fn get<S: AsRef<str>>(&self, ids: &[S]) -> StorageResult<Vec<EmbeddingRecord>> {
        let unique: BTreeSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        let unique: Vec<&str> = unique.into_iter().collect();

        let conn = self.conn.lock();
        let mut records = Vec::with_capacity(unique.len());
        for chunk in unique.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql =
                format!("SELECT id, hash, embedding FROM embeddings WHERE id IN ({placeholders})");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), read_row)?;
            for row in rows {
                let (id, hash, blob) = row?;
                records.push(into_record(id, hash, &blob)?);
            }
        }
        Ok(records)
    }

    /// Returns every stored record keyed by id.
    ///
    /// Rows whose vector cannot be decoded are logged and skipped.
    pub fn get_all(&self) -> StorageResult<HashMap<String, EmbeddingRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, hash, embedding FROM embeddings")?;
        let rows = stmt.query_map([], read_row)?;

        let mut records = HashMap::new();
        for row in rows {
            let (id, hash, blob) = row?;
            match into_record(id, hash, &blob) {
                Ok(record) => {
                    records.insert(record.id.clone(), record);
                }
                Err(e) => tracing::warn!("Skipping unreadable embedding row: {e}"),
            }
        }
        Ok(records)
    }

    /// Removes the record for `id`. Removing a missing id is not an error.
    pub fn delete(&self, id: &str) -> StorageResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM embeddings WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Number of stored records.
    pub fn len(&self) -> StorageResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// The store operations an indexing run relies on.
///
/// Implementations must be shareable between worker threads.
pub trait RecordStore: Send + Sync {
    /// Returns true iff a record exists for `id` and its hash equals `hash`.
    fn match_hash(&self, id: &str, hash: &str) -> StorageResult<bool>;

    /// The record for `id`, if one exists.
    fn fetch(&self, id: &str) -> StorageResult<Option<EmbeddingRecord>>;

    /// Writes hash and vector for `id` in one step.
    fn upsert(&self, id: &str, hash: &str, vector: &[f32]) -> StorageResult<()>;
}

impl RecordStore for EmbeddingStore {
    fn match_hash(&self, id: &str, hash: &str) -> StorageResult<bool> {
        EmbeddingStore::match_hash(self, id, hash)
    }

    fn fetch(&self, id: &str) -> StorageResult<Option<EmbeddingRecord>> {
        Ok(self.get(&[id])?.into_iter().next())
    }

    fn upsert(&self, id: &str, hash: &str, vector: &[f32]) -> StorageResult<()> {
        EmbeddingStore::upsert(self, id, hash, vector)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, Vec<u8>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_record(id: String, hash: String, blob: &[u8]) -> StorageResult<EmbeddingRecord> {
    match decode_vector(blob) {
        Ok(vector) => Ok(EmbeddingRecord { id, hash, vector }),
        Err(source) => Err(StorageError::Corrupt { id, source }),
    }
}
