use super::{LEGAL_EXTENSION, tags};
use crate::{
    calculate_signature,
    database::Database,
    domain::{Track, TrackList},
    expand_tilde,
};
use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use nohash_hasher::IntSet;
use rayon::prelude::*;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

pub struct Library {
    db: Database,
    pub roots: HashSet<PathBuf>,
    tracks: IndexMap<u64, Arc<Track>>,
}

impl Library {
    pub fn init(mut db: Database) -> Self {
        let mut roots = HashSet::new();

        if let Ok(db_roots) = db.get_roots() {
            for root in db_roots {
                if let Ok(canon) = PathBuf::from(root).canonicalize() {
                    roots.insert(canon);
                }
            }
        }

        Library {
            db,
            roots,
            tracks: IndexMap::new(),
        }
    }

    pub fn add_root(&mut self, root: impl AsRef<Path>) -> Result<()> {
        let expanded_path = expand_tilde(root.as_ref())?;
        let canon = expanded_path
            .canonicalize()
            .map_err(|_| anyhow!("Path does not exist! {}", root.as_ref().display()))?;

        if self.roots.insert(canon.clone()) {
            self.db.set_root(&canon)?;
        }

        Ok(())
    }

    pub fn delete_root(&mut self, root: &str) -> Result<()> {
        let expanded = expand_tilde(root)?;
        let bad_root = expanded.canonicalize().unwrap_or(expanded);
        match self.roots.remove(&bad_root) {
            true => self.db.delete_root(&bad_root),
            false => Err(anyhow!("Error deleting root")),
        }
    }

    /// Re-read the persisted catalog without touching the filesystem.
    pub fn load_tracks(&mut self) -> Result<()> {
        self.tracks = self
            .db
            .get_all_tracks()?
            .into_iter()
            .map(|track| (track.id, track))
            .collect();
        Ok(())
    }

    /// Walk every root, then bring the database and the in-memory catalog up to date.
    pub fn rescan(&mut self) -> Result<(usize, usize)> {
        let changes = match self.roots.is_empty() {
            true => (0, 0),
            false => self.update_db_by_root()?,
        };
        self.load_tracks()?;
        Ok(changes)
    }

    /// Walk through directories and update database based on changes made.
    pub fn update_db_by_root(&mut self) -> Result<(usize, usize)> {
        let mut existing_hashes = self.db.get_hashes()?;
        let mut new_files = Vec::new();
        let mut seen_files = 0;

        for root in &self.roots {
            let files: Vec<PathBuf> = Self::collect_valid_files(root).collect();
            seen_files += files.len();
            new_files.extend(Self::filter_files(files, &mut existing_hashes));
        }

        // An unmounted drive looks exactly like an emptied library
        if seen_files == 0 && !existing_hashes.is_empty() {
            tracing::warn!(
                known = existing_hashes.len(),
                "Scan found no files, keeping the existing catalog"
            );
            return Ok((0, 0));
        }

        let removed_ids = existing_hashes.into_iter().collect::<Vec<u64>>();
        let new_file_count = new_files.len();

        if !new_files.is_empty() {
            let tracks = Self::process_tracks(new_files);
            self.db.insert_tracks(&tracks)?;
        }

        if !removed_ids.is_empty() {
            self.db.delete_tracks(&removed_ids)?;
        }

        tracing::info!(
            added = new_file_count,
            removed = removed_ids.len(),
            "Library scan complete"
        );

        Ok((new_file_count, removed_ids.len()))
    }

    /// Collect valid files from a root directory
    ///
    /// Folders with a `.nomedia` file will be ignored
    fn collect_valid_files(dir: impl AsRef<Path>) -> impl ParallelIterator<Item = PathBuf> {
        WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| {
                !e.path().join(".nomedia").exists()
                    && !e.path().to_string_lossy().contains("$RECYCLE.BIN")
            })
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter(move |entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| LEGAL_EXTENSION.contains(ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .filter_map(|e| e.path().canonicalize().ok())
    }

    /// Files whose signature is already known are dropped, and their hash is
    /// removed from `existing_hashes`. Whatever is left in the set afterwards
    /// belongs to files that were deleted or modified.
    fn filter_files(all_paths: Vec<PathBuf>, existing_hashes: &mut IntSet<u64>) -> Vec<PathBuf> {
        all_paths
            .into_iter()
            .filter(|p| match calculate_signature(p) {
                Ok(hash) => !existing_hashes.remove(&hash),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "Unreadable file");
                    false
                }
            })
            .collect()
    }

    fn process_tracks(paths: Vec<PathBuf>) -> Vec<Track> {
        paths
            .into_par_iter()
            .filter_map(|path| match tags::read_track(&path) {
                Ok(track) => Some(track),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Skipping file");
                    None
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> TrackList {
        Arc::new(self.tracks.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
