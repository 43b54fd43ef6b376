//! One playback session per running application.
//!
//! `Session` is the handle the presentation layer holds. Every command and
//! every engine event is funnelled into a single actor thread which owns the
//! queue, so no two mutations ever interleave.

mod actor;
mod handle;

pub use handle::Session;

use crate::{
    Config,
    domain::{RepeatMode, Track, TrackList},
    engine::{EngineEvent, PlaybackEngine},
    search::SearchMode,
};
use crossbeam_channel::Receiver;
use std::{sync::Arc, time::Duration};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub poll_interval: Duration,
    pub search_debounce: Duration,
    pub search_mode: SearchMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            poll_interval: Duration::from_millis(500),
            search_debounce: Duration::from_millis(200),
            search_mode: SearchMode::Substring,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        SessionSettings {
            poll_interval: Duration::from_millis(config.playback.poll_interval_ms),
            search_debounce: Duration::from_millis(config.search.debounce_ms),
            search_mode: config.search.mode,
        }
    }
}

/// Everything the presentation layer may observe, as of `version`.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub library: TrackList,
    pub filtered: TrackList,
    pub queue: TrackList,
    pub current_index: Option<usize>,
    pub current_song: Option<Arc<Track>>,
    pub is_playing: bool,
    pub position: Duration,
    pub duration: Duration,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
    pub search_query: String,
    pub connected: bool,
    pub last_error: Option<String>,
    pub version: u64,
}

pub(crate) enum Message {
    Connect {
        engine: Box<dyn PlaybackEngine>,
        events: Receiver<EngineEvent>,
    },
    Disconnect,
    SetSearchQuery(String),
    TapTrack(Arc<Track>),
    SelectFromQueue(usize),
    ShuffleAndPlayAll,
    ToggleShuffle,
    RestoreLibraryOrder,
    TogglePlayPause,
    Seek(Duration),
    Next,
    Previous,
    ToggleRepeat,
    RequestLibraryLoad,
    Shutdown,
}
