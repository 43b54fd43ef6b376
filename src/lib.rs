use anyhow::{Result, anyhow};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, UNIX_EPOCH},
};
use xxhash_rust::xxh3::xxh3_64;

pub mod config;
pub mod console;
pub mod database;
pub mod domain;
pub mod engine;
pub mod library;
pub mod logging;
pub mod poller;
pub mod queue;
pub mod search;
pub mod session;

pub use config::Config;
pub use database::Database;
pub use library::{Catalog, Library};
pub use session::Session;

pub const CONFIG_DIRECTORY: &str = "cadence";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const DATABASE_FILENAME: &str = "cadence.db";
pub const LOG_DIRECTORY: &str = "logs";

// ~60fps, engine thread housekeeping
pub const REFRESH_RATE: Duration = Duration::from_millis(16);

/// Create a hash based on...
///  - date of last modification (millis)
///  - file size (bytes)
///  - path as str as bytes
pub fn calculate_signature<P: AsRef<Path>>(path: P) -> anyhow::Result<u64> {
    let metadata = fs::metadata(&path)?;

    let last_mod = metadata.modified()?.duration_since(UNIX_EPOCH)?.as_millis() as i64;
    let size = metadata.len();

    let mut data = Vec::with_capacity(path.as_ref().as_os_str().len() + 16);

    data.extend_from_slice(path.as_ref().as_os_str().as_encoded_bytes());
    data.extend_from_slice(&last_mod.to_le_bytes());
    data.extend_from_slice(&size.to_le_bytes());

    Ok(xxh3_64(&data))
}

pub enum DurationStyle {
    Clean,
    Compact,
}

pub fn get_readable_duration(duration: Duration, style: DurationStyle) -> String {
    let mut secs = duration.as_secs();
    let mins = secs / 60;
    secs %= 60;

    match style {
        DurationStyle::Clean => match mins {
            0 => format!("{secs:02}s"),
            _ => format!("{mins}m {secs:02}s"),
        },
        DurationStyle::Compact => format!("{mins}:{secs:02}"),
    }
}

pub fn expand_tilde<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.starts_with('~') {
        return Ok(path.to_path_buf());
    }

    if path_str == "~" {
        return Err(anyhow!(
            "Setting the home directory would read every file in your system. Please provide a more specific path!"
        ));
    }

    if path_str.starts_with("~/") || path_str.starts_with("~\\") {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory!"))?;
        return Ok(home.join(&path_str[2..]));
    }

    Err(anyhow!("Error reading directory with tilde (~)"))
}

/// Root of every file cadence writes when the config does not say otherwise.
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIRECTORY))
        .ok_or_else(|| anyhow!("Config folder not present on system!"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_duration_styles() {
        let d = Duration::from_secs(185);
        assert_eq!(get_readable_duration(d, DurationStyle::Compact), "3:05");
        assert_eq!(get_readable_duration(d, DurationStyle::Clean), "3m 05s");
        assert_eq!(
            get_readable_duration(Duration::from_secs(7), DurationStyle::Clean),
            "07s"
        );
    }

    #[test]
    fn tilde_alone_is_rejected() {
        assert!(expand_tilde("~").is_err());
    }

    #[test]
    fn plain_paths_pass_through() {
        let p = expand_tilde("/music/flac").unwrap();
        assert_eq!(p, PathBuf::from("/music/flac"));
    }

    #[test]
    fn signature_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"abc").unwrap();
        let first = calculate_signature(&path).unwrap();
        fs::write(&path, b"abcdef").unwrap();
        let second = calculate_signature(&path).unwrap();
        assert_ne!(first, second);
    }
}
