pub const GET_ALL_TRACKS: &str = "
    SELECT
        id,
        title,
        artist,
        album,
        duration_ms,
        path,
        artwork,
        format
    FROM tracks
    ORDER BY
        title COLLATE NOCASE ASC,
        artist COLLATE NOCASE ASC
";

// Same path with a new signature replaces the stale row
pub const INSERT_TRACK: &str = "
    INSERT OR REPLACE INTO tracks (
        id,
        title,
        artist,
        album,
        duration_ms,
        path,
        artwork,
        format
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
";

pub const DELETE_TRACK: &str = "
    DELETE FROM tracks WHERE id = ?
";

pub const GET_HASHES: &str = "
    SELECT id FROM tracks
";

pub const GET_ROOTS: &str = "
    SELECT path FROM roots
";

pub const SET_ROOT: &str = "
    INSERT OR IGNORE INTO roots (path) VALUES (?)
";

pub const DELETE_ROOT: &str = "
    DELETE FROM roots WHERE path = ?
";
