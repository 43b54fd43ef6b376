use anyhow::{Result, anyhow};
use nohash_hasher::IntSet;
use queries::*;
use rusqlite::{Connection, params};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

pub mod queries;
mod tables;

use crate::domain::Track;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let mut db = Database { conn };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(tables::CREATE_TABLES)?;
        tx.commit()?;

        Ok(())
    }

    // ====================
    //   TRACK OPERATIONS
    // ====================

    pub(crate) fn insert_tracks(&mut self, tracks: &[Track]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_TRACK)?;

            for track in tracks {
                if let Err(e) = stmt.execute(params![
                    track.id.to_le_bytes(),
                    &track.title,
                    &track.artist,
                    &track.album,
                    track.duration_ms() as i64,
                    &track.source_uri,
                    &track.artwork_uri,
                    &track.format,
                ]) {
                    tracing::warn!(title = %track.title, error = %e, "Skipping track insert");
                }
            }
        }
        tx.commit()?;

        Ok(())
    }

    pub(crate) fn get_all_tracks(&mut self) -> Result<Vec<Arc<Track>>> {
        let mut stmt = self.conn.prepare(GET_ALL_TRACKS)?;

        let tracks = stmt
            .query_map([], |row| {
                let hash_bytes: Vec<u8> = row.get("id")?;
                let duration_ms: i64 = row.get("duration_ms")?;

                Ok(Track {
                    id: decode_hash(hash_bytes),
                    title: row.get("title")?,
                    artist: row.get("artist")?,
                    album: row.get("album")?,
                    duration: Duration::from_millis(duration_ms.max(0) as u64),
                    source_uri: row.get("path")?,
                    artwork_uri: row.get("artwork")?,
                    format: row.get("format")?,
                })
            })?
            .filter_map(Result::ok)
            .map(Arc::new)
            .collect();

        Ok(tracks)
    }

    pub(crate) fn delete_tracks(&mut self, to_delete: &[u64]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(DELETE_TRACK)?;
            for id in to_delete {
                stmt.execute([id.to_le_bytes()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn get_hashes(&mut self) -> Result<IntSet<u64>> {
        let hashes = self
            .conn
            .prepare(GET_HASHES)?
            .query_map([], |row| row.get::<_, Vec<u8>>("id"))?
            .filter_map(Result::ok)
            .map(decode_hash)
            .collect::<IntSet<u64>>();

        Ok(hashes)
    }

    // =========
    //   ROOTS
    // =========

    pub(crate) fn get_roots(&mut self) -> Result<Vec<String>> {
        let roots = self
            .conn
            .prepare(GET_ROOTS)?
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(roots)
    }

    pub(crate) fn set_root(&mut self, path: &PathBuf) -> Result<()> {
        let path = path
            .to_str()
            .ok_or_else(|| anyhow!("Root path is not valid UTF-8: {}", path.display()))?;
        self.conn.execute(SET_ROOT, params![path])?;
        Ok(())
    }

    pub(crate) fn delete_root(&mut self, path: &PathBuf) -> Result<()> {
        let path = path
            .to_str()
            .ok_or_else(|| anyhow!("Root path is not valid UTF-8: {}", path.display()))?;
        self.conn.execute(DELETE_ROOT, params![path])?;
        Ok(())
    }
}

// Rows written by older builds may carry a short blob; treat those as id 0
fn decode_hash(bytes: Vec<u8>) -> u64 {
    let hash_array: [u8; 8] = bytes.try_into().unwrap_or([0; 8]);
    u64::from_le_bytes(hash_array)
}
