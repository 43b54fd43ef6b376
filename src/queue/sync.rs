use super::shuffle::{pinned_first, position_of, shuffled, to_items};
use crate::{
    domain::{RepeatMode, Track, TrackList},
    engine::{EngineEvent, EngineResult, PlaybackEngine, TransitionReason},
};
use std::{sync::Arc, time::Duration};

/// Owner of the canonical queue and of the link to the playback engine.
///
/// The engine keeps a replica of `queue`; every command here either replaces
/// that replica wholesale (`load_queue`) or edits it in place, and local state
/// is reconciled from engine events by locator.
pub struct QueueSync {
    engine: Option<Box<dyn PlaybackEngine>>,

    library: TrackList,
    queue: TrackList,
    current_index: Option<usize>,
    shuffle_enabled: bool,
    repeat_mode: RepeatMode,
    is_playing: bool,
}

/// Outcome of applying one engine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Unchanged,
    /// `current_index` now points somewhere else (or nowhere)
    CurrentChanged,
    PlayingChanged,
    RepeatChanged,
}

impl Default for QueueSync {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueSync {
    pub fn new() -> Self {
        QueueSync {
            engine: None,
            library: TrackList::default(),
            queue: TrackList::default(),
            current_index: None,
            shuffle_enabled: false,
            repeat_mode: RepeatMode::Off,
            is_playing: false,
        }
    }

    pub fn library(&self) -> &TrackList {
        &self.library
    }

    pub fn queue(&self) -> &TrackList {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_song(&self) -> Option<&Arc<Track>> {
        self.current_index.and_then(|idx| self.queue.get(idx))
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_connected(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&dyn PlaybackEngine> {
        self.engine.as_deref()
    }
}

// ================
//    LIFECYCLE
// ================
impl QueueSync {
    /// Adopt a live engine. Its native shuffle is switched off, its repeat mode
    /// mirrored, and an existing queue pushed to it without starting playback.
    pub fn connect(&mut self, mut engine: Box<dyn PlaybackEngine>) {
        if let Err(e) = engine.set_shuffle_enabled(false) {
            tracing::warn!(error = %e, "Could not disable engine shuffle");
        }
        self.repeat_mode = engine.repeat_mode();
        self.is_playing = engine.is_playing();
        self.engine = Some(engine);
        tracing::info!(repeat = %self.repeat_mode, "Engine connected");

        if !self.queue.is_empty() {
            let items = to_items(&self.queue);
            let start = self.current_index.unwrap_or(0);
            self.issue("load", |e| e.load_queue(items, start, Duration::ZERO));
        }
    }

    /// Release the engine. The queue is kept for the next connection.
    pub fn disconnect(&mut self) -> Option<Box<dyn PlaybackEngine>> {
        self.is_playing = false;
        let engine = self.engine.take();
        if engine.is_some() {
            tracing::info!("Engine disconnected");
        }
        engine
    }

    /// New catalog snapshot. The first non-empty one seeds the queue.
    pub fn on_library_changed(&mut self, tracks: TrackList) {
        self.library = tracks;

        if !self.queue.is_empty() || self.library.is_empty() {
            return;
        }

        tracing::debug!(count = self.library.len(), "Seeding queue from library");
        self.queue = Arc::clone(&self.library);
        if self.is_connected() {
            let items = to_items(&self.queue);
            self.issue("load", |e| e.load_queue(items, 0, Duration::ZERO));
        }
    }
}

// ==============
//    COMMANDS
// ==============
impl QueueSync {
    pub fn tap_track(&mut self, track: &Arc<Track>) {
        if !self.accepting("tap_track") {
            return;
        }
        if position_of(&self.library, track.locator()).is_none() {
            tracing::warn!(locator = %track.locator(), "Tapped track is not in the library");
            return;
        }

        let queue = match self.shuffle_enabled {
            true => pinned_first(track, &self.library),
            false => self.library.to_vec(),
        };
        let Some(index) = position_of(&queue, track.locator()) else {
            return;
        };

        self.queue = Arc::new(queue);
        self.start_at(index);
    }

    pub fn select_from_queue(&mut self, index: usize) {
        if !self.accepting("select_from_queue") {
            return;
        }
        if index >= self.queue.len() {
            tracing::warn!(index, len = self.queue.len(), "Queue selection out of range");
            return;
        }
        self.start_at(index);
    }

    pub fn shuffle_and_play_all(&mut self) {
        if !self.accepting("shuffle_and_play_all") || self.library.is_empty() {
            return;
        }

        self.queue = Arc::new(shuffled(&self.library));
        self.shuffle_enabled = true;
        self.start_at(0);
    }

    /// Pin the playing track at the head and reshuffle everything after it,
    /// editing the engine's playlist in place so audio is not interrupted.
    pub fn toggle_shuffle_preserving_current(&mut self) {
        if !self.accepting("toggle_shuffle") {
            return;
        }
        let Some(live) = self.live_position() else {
            tracing::debug!("Nothing playing, shuffle toggle ignored");
            return;
        };

        let queue = pinned_first(&live.track, &self.library);
        let rest = to_items(&queue[1..]);

        tracing::debug!(locator = %live.track.locator(), from = live.index, "Reshuffling around current");
        self.issue("shuffle surgery", |e| {
            live.isolate(e)?;
            e.insert_items(1, rest)?;
            e.set_shuffle_enabled(false)
        });

        self.queue = Arc::new(queue);
        self.current_index = Some(0);
        self.shuffle_enabled = true;
    }

    /// Back to library order without interrupting the current track.
    pub fn restore_library_order(&mut self) {
        if !self.accepting("restore_library_order") {
            return;
        }

        let library = Arc::clone(&self.library);
        let Some(live) = self.live_position() else {
            self.shuffle_enabled = false;
            self.queue = Arc::clone(&library);
            let items = to_items(&library);
            self.issue("load", |e| e.load_queue(items, 0, Duration::ZERO));
            return;
        };
        let Some(target) = position_of(&library, live.track.locator()) else {
            tracing::debug!("Current track left the library, keeping shuffled order");
            return;
        };

        let before = to_items(&library[..target]);
        let after = to_items(&library[target + 1..]);

        self.issue("unshuffle surgery", |e| {
            live.isolate(e)?;
            e.insert_items(1, after)?;
            if !before.is_empty() {
                e.insert_items(0, before)?;
            }
            e.set_shuffle_enabled(false)
        });

        self.queue = library;
        self.current_index = Some(target);
        self.shuffle_enabled = false;
    }

    pub fn toggle_play_pause(&mut self) {
        match self.is_playing {
            true => self.issue("pause", |e| e.pause()),
            false => self.issue("play", |e| e.play()),
        };
    }

    pub fn seek(&mut self, position: Duration) {
        self.issue("seek", |e| e.seek(position));
    }

    pub fn next(&mut self) {
        self.issue("skip_next", |e| e.skip_next());
    }

    pub fn previous(&mut self) {
        self.issue("skip_previous", |e| e.skip_previous());
    }

    /// Off -> All -> One -> Off. Local state only moves on the engine's confirmation.
    pub fn toggle_repeat_mode(&mut self) {
        self.issue("repeat", |e| {
            let next = e.repeat_mode().next();
            e.set_repeat_mode(next)
        });
    }
}

// ====================
//    RECONCILIATION
// ====================
impl QueueSync {
    pub fn handle_event(&mut self, event: EngineEvent) -> Reconciled {
        match event {
            EngineEvent::IsPlayingChanged(playing) => {
                self.is_playing = playing;
                Reconciled::PlayingChanged
            }
            EngineEvent::ItemTransitioned { locator, reason } => {
                self.on_transition(locator.as_deref(), reason)
            }
            EngineEvent::ShuffleModeChanged(true) => {
                tracing::warn!("Engine enabled native shuffle, switching it back off");
                self.issue("shuffle off", |e| e.set_shuffle_enabled(false));
                Reconciled::Unchanged
            }
            EngineEvent::ShuffleModeChanged(false) => Reconciled::Unchanged,
            EngineEvent::RepeatModeChanged(mode) => {
                self.repeat_mode = mode;
                Reconciled::RepeatChanged
            }
            EngineEvent::Error(msg) => {
                tracing::warn!(%msg, "Engine reported an error");
                Reconciled::Unchanged
            }
        }
    }

    fn on_transition(&mut self, locator: Option<&str>, reason: TransitionReason) -> Reconciled {
        let before = self.current_index;

        match locator {
            Some(locator) if self.superseded(locator) => {
                tracing::debug!(%locator, ?reason, "Engine already moved past this item, ignored")
            }
            Some(locator) => match self.find(locator) {
                Some(idx) => self.current_index = Some(idx),
                None => {
                    tracing::debug!(%locator, ?reason, "Transition to item outside the queue, ignored")
                }
            },
            // Only clear once the engine itself agrees nothing is loaded
            None => {
                let engine_idle = self
                    .engine
                    .as_ref()
                    .is_none_or(|e| e.current_locator().is_none());
                if engine_idle {
                    self.current_index = None;
                }
            }
        }

        match self.current_index != before {
            true => {
                tracing::debug!(index = ?self.current_index, ?reason, "Current item reconciled");
                Reconciled::CurrentChanged
            }
            false => Reconciled::Unchanged,
        }
    }

    /// The engine reports a different item as current, so a newer transition
    /// event is already on its way.
    fn superseded(&self, locator: &str) -> bool {
        self.engine
            .as_ref()
            .and_then(|e| e.current_locator())
            .is_some_and(|live| live != locator)
    }

    /// Where the engine is right now. Local state only stands in while the
    /// engine reports no current item, or one this side does not know.
    fn live_position(&self) -> Option<LivePosition> {
        let engine = self.engine.as_deref()?;

        let remote = engine.current_index().zip(engine.current_locator());
        if let Some((index, locator)) = remote {
            let known = self
                .queue
                .get(index)
                .filter(|t| t.locator() == locator)
                .or_else(|| self.queue.iter().find(|t| t.locator() == locator))
                .or_else(|| self.library.iter().find(|t| t.locator() == locator));

            if let Some(track) = known {
                return Some(LivePosition {
                    index,
                    remote_len: engine.item_count(),
                    track: Arc::clone(track),
                });
            }
            tracing::debug!(%locator, "Engine plays an unknown item, using local position");
        }

        Some(LivePosition {
            index: self.current_index?,
            remote_len: self.queue.len(),
            track: Arc::clone(self.current_song()?),
        })
    }

    /// Queue position of `locator`, preferring the engine's own index when the
    /// same track appears more than once.
    fn find(&self, locator: &str) -> Option<usize> {
        let remote = self.engine.as_ref().and_then(|e| e.current_index());
        if let Some(idx) = remote {
            if self.queue.get(idx).is_some_and(|t| t.locator() == locator) {
                return Some(idx);
            }
        }
        position_of(&self.queue, locator)
    }
}

/// The engine's current item and playlist length, read right before surgery.
struct LivePosition {
    index: usize,
    remote_len: usize,
    track: Arc<Track>,
}

impl LivePosition {
    /// Leave the current item alone at remote index 0.
    fn isolate(&self, engine: &mut dyn PlaybackEngine) -> EngineResult {
        if self.index != 0 {
            engine.move_item(self.index, 0)?;
        }
        if self.remote_len > 1 {
            engine.remove_items(1, self.remote_len - 1)?;
        }
        Ok(())
    }
}

// ==============
//    HELPERS
// ==============
impl QueueSync {
    fn accepting(&self, op: &str) -> bool {
        if !self.is_connected() {
            tracing::debug!(op, "Engine not connected, command dropped");
        }
        self.is_connected()
    }

    /// Optimistically select `index`, then reload the engine there and play.
    fn start_at(&mut self, index: usize) {
        self.current_index = Some(index);
        let items = to_items(&self.queue);

        tracing::debug!(index, len = items.len(), "Loading queue");
        self.issue("load", |e| {
            e.load_queue(items, index, Duration::ZERO)?;
            e.play()
        });
    }

    fn issue<F>(&mut self, op: &str, f: F)
    where
        F: FnOnce(&mut dyn PlaybackEngine) -> EngineResult,
    {
        let Some(engine) = self.engine.as_deref_mut() else {
            tracing::debug!(op, "Engine not connected, command dropped");
            return;
        };
        if let Err(e) = f(engine) {
            tracing::warn!(op, error = %e, "Engine command failed");
        }
    }
}
