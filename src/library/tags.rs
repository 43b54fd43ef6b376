use crate::{
    calculate_signature,
    domain::{FileType, Track},
};
use anyhow::{Result, anyhow};
use lofty::{
    file::{AudioFile, TaggedFileExt},
    tag::Accessor,
};
use std::{borrow::Cow, path::Path};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";
const ARTWORK_STEMS: [&str; 3] = ["cover", "folder", "front"];
const ARTWORK_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Read tags and properties of a single file into a `Track`.
pub(super) fn read_track(path: &Path) -> Result<Track> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(FileType::from)
        .ok_or_else(|| anyhow!("Unsupported extension: {:?}", path.extension()))?;

    let tagged = lofty::read_from_path(path)?;
    let duration = tagged.properties().duration();
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());

    let title = non_empty(tag.and_then(|t| t.title())).unwrap_or_else(|| fallback_title(path));
    let artist = non_empty(tag.and_then(|t| t.artist())).unwrap_or_else(|| UNKNOWN_ARTIST.into());
    let album = non_empty(tag.and_then(|t| t.album())).unwrap_or_else(|| UNKNOWN_ALBUM.into());

    let track = Track::new(
        calculate_signature(path)?,
        title,
        artist,
        album,
        duration,
        path.to_string_lossy(),
    )
    .with_format(format)
    .with_artwork(find_artwork(path));

    Ok(track)
}

fn non_empty(field: Option<Cow<'_, str>>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn fallback_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Look for a conventional cover image next to the audio file.
fn find_artwork(path: &Path) -> Option<String> {
    let dir = path.parent()?;

    ARTWORK_STEMS
        .iter()
        .flat_map(|stem| {
            ARTWORK_EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("{stem}.{ext}")))
        })
        .find(|candidate| candidate.is_file())
        .map(|found| found.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_file_stem() {
        assert_eq!(fallback_title(Path::new("/m/01 Intro.flac")), "01 Intro");
    }

    #[test]
    fn artwork_is_found_next_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let song = dir.path().join("song.mp3");
        std::fs::write(&song, b"").unwrap();
        assert_eq!(find_artwork(&song), None);

        std::fs::write(dir.path().join("folder.png"), b"").unwrap();
        let found = find_artwork(&song).unwrap();
        assert!(found.ends_with("folder.png"));
    }

    #[test]
    fn garbage_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let song = dir.path().join("noise.mp3");
        std::fs::write(&song, b"definitely not audio").unwrap();
        assert!(read_track(&song).is_err());
    }
}
