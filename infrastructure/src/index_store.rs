//! SQLite snapshot of an ingested document set and its vector index.
//!
//! Only documents and chunk vectors are stored; conversation history never
//! leaves the process.

use anyhow::{anyhow, Context};
use domain::models::{Document, DocumentFormat};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use shared::types::Result;
use std::path::Path;
use tracing::info;

use crate::vector_index::VectorIndex;

pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("opening index database {}", db_path.as_ref().display()))?;
        Self::setup_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup_db(&conn)?;
        Ok(Self { conn })
    }

    fn setup_db(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                source TEXT NOT NULL,
                format TEXT NOT NULL,
                text TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                chunk_ids TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS chunks (
                seq INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                vector BLOB NOT NULL,
                text TEXT NOT NULL,
                source TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        ",
        )
    }

    /// Replace the stored snapshot with `documents` and `index`.
    pub fn save(&self, documents: &[Document], index: &VectorIndex) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch("DELETE FROM documents; DELETE FROM chunks; DELETE FROM index_meta;")?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (seq, id, source, format, text, content_hash, chunk_ids)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;
            for (seq, document) in documents.iter().enumerate() {
                stmt.execute(params![
                    seq as i64,
                    document.id,
                    document.source,
                    document.format.as_str(),
                    document.text,
                    document.content_hash,
                    serde_json::to_string(&document.chunk_ids)?,
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (seq, id, vector, text, source) VALUES (?, ?, ?, ?, ?)",
            )?;
            for (seq, entry) in index.entries().iter().enumerate() {
                let vector_bytes = serde_json::to_vec(&entry.vector)?;
                stmt.execute(params![
                    seq as i64,
                    entry.chunk_id,
                    vector_bytes,
                    entry.text,
                    entry.source
                ])?;
            }
        }
        if let Some(dimension) = index.dimension() {
            tx.execute(
                "INSERT INTO index_meta (key, value) VALUES ('dimension', ?1)",
                params![dimension.to_string()],
            )?;
        }
        tx.commit()?;
        info!(documents = documents.len(), chunks = index.len(), "index snapshot saved");
        Ok(())
    }

    /// The stored snapshot, or `None` when nothing has been ingested yet.
    pub fn load(&self) -> Result<Option<(Vec<Document>, VectorIndex)>> {
        let dimension: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = 'dimension'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let Some(dimension) = dimension else {
            return Ok(None);
        };
        let dimension: usize = dimension
            .parse()
            .with_context(|| format!("corrupt index dimension '{dimension}'"))?;

        let documents = self.load_documents()?;
        let mut index = VectorIndex::with_dimension(dimension)?;
        let mut stmt = self
            .conn
            .prepare("SELECT id, vector, text, source FROM chunks ORDER BY seq")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let vector_bytes: Vec<u8> = row.get(1)?;
            let text: String = row.get(2)?;
            let source: String = row.get(3)?;
            let vector: Vec<f32> = serde_json::from_slice(&vector_bytes)?;
            index.insert(id, vector, text, source)?;
        }
        Ok(Some((documents, index)))
    }

    fn load_documents(&self) -> Result<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, format, text, content_hash, chunk_ids FROM documents ORDER BY seq",
        )?;
        let mut rows = stmt.query([])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let format: String = row.get(2)?;
            let chunk_ids: String = row.get(5)?;
            documents.push(Document {
                id: row.get(0)?,
                source: row.get(1)?,
                format: parse_format(&format)?,
                text: row.get(3)?,
                content_hash: row.get(4)?,
                chunk_ids: serde_json::from_str(&chunk_ids)?,
            });
        }
        Ok(documents)
    }

    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM documents; DELETE FROM chunks; DELETE FROM index_meta;")?;
        Ok(())
    }

    pub fn document_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn parse_format(name: &str) -> Result<DocumentFormat> {
    match name {
        "text" => Ok(DocumentFormat::PlainText),
        "pdf" => Ok(DocumentFormat::Pdf),
        "docx" => Ok(DocumentFormat::Docx),
        other => Err(anyhow!("unknown document format '{other}' in index database")),
    }
}
