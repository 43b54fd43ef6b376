use crate::{
    CONFIG_FILENAME, DATABASE_FILENAME, LOG_DIRECTORY, default_config_dir, expand_tilde,
    search::SearchMode,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub playback: PlaybackConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub roots: Vec<String>,
    pub database: Option<PathBuf>,
    pub scan_on_start: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            roots: Vec::new(),
            database: None,
            scan_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub poll_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub mode: SearchMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            debounce_ms: 200,
            mode: SearchMode::Substring,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: Option<PathBuf>,
    pub filter: Option<String>,
}

impl Config {
    /// Read `path`, or the default location when `None`. A missing file is not an
    /// error and yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_dir()?.join(CONFIG_FILENAME),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let file_str = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::from_toml(&file_str).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(s)?)
    }

    pub fn roots(&self) -> Result<Vec<PathBuf>> {
        self.library.roots.iter().map(expand_tilde).collect()
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.library.database {
            Some(p) => expand_tilde(p),
            None => Ok(default_config_dir()?.join(DATABASE_FILENAME)),
        }
    }

    pub fn log_directory(&self) -> Result<PathBuf> {
        match &self.logging.directory {
            Some(p) => expand_tilde(p),
            None => Ok(default_config_dir()?.join(LOG_DIRECTORY)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(config.library.scan_on_start);
        assert_eq!(config.playback.poll_interval_ms, 500);
        assert_eq!(config.search.debounce_ms, 200);
        assert_eq!(config.search.mode, SearchMode::Substring);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [library]
            roots = ["/music", "/mnt/flac"]
            scan_on_start = false

            [search]
            mode = "fuzzy"
            "#,
        )
        .unwrap();

        assert_eq!(config.library.roots.len(), 2);
        assert!(!config.library.scan_on_start);
        assert_eq!(config.search.mode, SearchMode::Fuzzy);
        assert_eq!(config.search.debounce_ms, 200);
        assert_eq!(config.playback.poll_interval_ms, 500);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Config::from_toml("[search]\nmode = \"regex\"").is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap();
        assert_eq!(config.playback.poll_interval_ms, 500);
    }

    #[test]
    fn file_is_read_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[playback]\npoll_interval_ms = 250\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.playback.poll_interval_ms, 250);
    }
}
