//! Vector store schema and initialization

use super::vectors::bytes_to_embedding;
use super::DocumentChunk;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// SQLite-backed chunk store.
///
/// One table per embedding dimension (`rag_vectors_{dim}`); embeddings are
/// stored as little-endian f32 BLOBs and compared in Rust.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    dimension: usize,
    table: String,
}

impl SqliteVectorStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::with_connection(conn, dimension)
    }

    /// Open in-memory store (for testing)
    pub fn open_in_memory(dimension: usize) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, dimension)
    }

    fn with_connection(conn: Connection, dimension: usize) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            dimension,
            table: format!("rag_vectors_{}", dimension),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.lock().execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );",
            table = self.table
        ))?;
        Ok(())
    }

    /// Drop every stored chunk for this dimension
    pub fn reset(&self) -> Result<()> {
        self.lock()
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", self.table))?;
        self.initialize()?;
        info!("Reset vector table {}", self.table);
        Ok(())
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Number of stored chunks
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.lock().query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Fetch one chunk with its vector
    pub fn get(&self, id: &str) -> Result<Option<DocumentChunk>> {
        let row = self
            .lock()
            .query_row(
                &format!(
                    "SELECT id, text, metadata, embedding FROM {} WHERE id = ?1",
                    self.table
                ),
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, text, metadata, embedding)) => {
                let mut chunk = DocumentChunk::new(id, text, serde_json::from_str(&metadata)?);
                chunk.vector = Some(bytes_to_embedding(&embedding));
                Ok(Some(chunk))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves no partial transaction behind
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn dim(&self) -> usize {
        self.dimension
    }
}
