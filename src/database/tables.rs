pub const CREATE_TABLES: &str = r"
    CREATE TABLE IF NOT EXISTS roots(
        id INTEGER PRIMARY KEY,
        path TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tracks(
        id BLOB PRIMARY KEY,
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        album TEXT NOT NULL,
        duration_ms INTEGER NOT NULL,
        path TEXT UNIQUE NOT NULL,
        artwork TEXT,
        format INTEGER
    );
";
