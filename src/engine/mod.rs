//! Boundary to the audio engine.
//!
//! The session drives any `PlaybackEngine` and listens to the `EngineEvent`s it
//! emits. `RodioEngine` is the real implementation: a dedicated thread owns the
//! output stream and an `EnginePlaylist`, the handle talks to it over a channel
//! and answers synchronous reads from shared atomics.

mod backend_rodio;
mod command;
mod core;
mod handle;
mod metrics;
mod playlist;

#[cfg(test)]
pub(crate) mod fake;

pub use backend_rodio::{AudioBackend, RodioBackend};
pub use handle::RodioEngine;
pub use metrics::PlaybackMetrics;
pub use playlist::{Advance, EnginePlaylist, Previous};

use crate::domain::{RepeatMode, Track, TrackInfo};
use std::time::Duration;
use thiserror::Error;

pub(crate) use command::EngineCommand;

/// Restart the current item instead of going back when further in than this.
pub const MAX_SEEK_TO_PREVIOUS: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("playback engine is disconnected")]
    Disconnected,
    #[error("could not open audio output: {0}")]
    Output(String),
    #[error("could not decode {locator}: {reason}")]
    Decode { locator: String, reason: String },
}

pub type EngineResult = Result<(), EngineError>;

/// What the engine needs to know about one playlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineItem {
    pub locator: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork_uri: Option<String>,
}

impl From<&Track> for EngineItem {
    fn from(track: &Track) -> Self {
        EngineItem {
            locator: track.locator().to_string(),
            title: track.get_title().to_string(),
            artist: track.get_artist().to_string(),
            album: track.get_album().to_string(),
            artwork_uri: track.artwork_uri().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    /// The playlist was replaced or the current item was removed
    PlaylistChanged,
    /// The previous item finished and playback moved on
    Auto,
    /// The same item started over under `RepeatMode::One`
    Repeat,
    /// Explicit skip to another item
    Seek,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    IsPlayingChanged(bool),
    ItemTransitioned {
        locator: Option<String>,
        reason: TransitionReason,
    },
    ShuffleModeChanged(bool),
    RepeatModeChanged(RepeatMode),
    Error(String),
}

/// Contract the queue synchronization engine drives.
///
/// Commands are fire-and-forget: `Ok` only means the request was accepted, its
/// effect is confirmed later through an `EngineEvent`. Reads are best-effort and
/// must never block.
pub trait PlaybackEngine: Send {
    fn load_queue(
        &mut self,
        items: Vec<EngineItem>,
        start_index: usize,
        start_position: Duration,
    ) -> EngineResult;
    fn play(&mut self) -> EngineResult;
    fn pause(&mut self) -> EngineResult;
    fn seek(&mut self, position: Duration) -> EngineResult;
    fn skip_next(&mut self) -> EngineResult;
    fn skip_previous(&mut self) -> EngineResult;
    fn move_item(&mut self, from: usize, to: usize) -> EngineResult;
    fn insert_items(&mut self, at: usize, items: Vec<EngineItem>) -> EngineResult;
    fn remove_items(&mut self, from: usize, count: usize) -> EngineResult;
    fn set_repeat_mode(&mut self, mode: RepeatMode) -> EngineResult;
    fn set_shuffle_enabled(&mut self, enabled: bool) -> EngineResult;

    fn position(&self) -> Duration;
    /// `None` until the current item's length is known.
    fn duration(&self) -> Option<Duration>;
    fn is_playing(&self) -> bool;
    fn repeat_mode(&self) -> RepeatMode;
    fn current_index(&self) -> Option<usize>;
    fn current_locator(&self) -> Option<String>;
    fn item_count(&self) -> usize;
}
