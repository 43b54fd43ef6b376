use super::{FileType, TrackInfo};
use crate::get_readable_duration;
use std::{sync::Arc, time::Duration};

/// Shared, immutable snapshot of an ordered list of tracks.
pub type TrackList = Arc<Vec<Arc<Track>>>;

/// A single playable item. Created by the catalog, never mutated afterwards.
///
/// `source_uri` is the playback locator handed to the engine and doubles as the
/// identity key used to match engine-reported items back to queue entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) artist: String,
    pub(crate) album: String,
    pub(crate) duration: Duration,
    pub(crate) source_uri: String,
    pub(crate) artwork_uri: Option<String>,
    pub(crate) format: FileType,
}

impl Track {
    pub fn new(
        id: u64,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration: Duration,
        source_uri: impl Into<String>,
    ) -> Self {
        Track {
            id,
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration,
            source_uri: source_uri.into(),
            artwork_uri: None,
            format: FileType::default(),
        }
    }

    pub fn with_artwork(mut self, artwork_uri: Option<String>) -> Self {
        self.artwork_uri = artwork_uri;
        self
    }

    pub fn with_format(mut self, format: FileType) -> Self {
        self.format = format;
        self
    }

    pub fn locator(&self) -> &str {
        &self.source_uri
    }

    pub fn artwork_uri(&self) -> Option<&str> {
        self.artwork_uri.as_deref()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

impl TrackInfo for Track {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn get_title(&self) -> &str {
        &self.title
    }

    fn get_artist(&self) -> &str {
        &self.artist
    }

    fn get_album(&self) -> &str {
        &self.album
    }

    fn get_duration(&self) -> Duration {
        self.duration
    }

    fn get_duration_str(&self) -> String {
        get_readable_duration(self.duration, crate::DurationStyle::Compact)
    }
}
