use super::{
    Advance, AudioBackend, EngineCommand, EngineError, EngineEvent, EngineItem, EnginePlaylist,
    PlaybackMetrics, Previous, TransitionReason,
};
use crate::{REFRESH_RATE, domain::RepeatMode};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

pub(crate) type BackendFactory =
    Box<dyn FnOnce() -> anyhow::Result<Box<dyn AudioBackend>> + Send + 'static>;

pub(crate) struct EngineCore {
    backend: Box<dyn AudioBackend>,
    commands: Receiver<EngineCommand>,
    events: Sender<EngineEvent>,
    metrics: Arc<PlaybackMetrics>,

    playlist: EnginePlaylist,
    play_when_ready: bool,
    // backend holds the current item
    loaded: bool,
    shuffle_enabled: bool,
}

impl EngineCore {
    /// The backend is built on the engine thread itself; `ready` reports
    /// whether that worked before any command is processed.
    pub(crate) fn spawn(
        factory: BackendFactory,
        commands: Receiver<EngineCommand>,
        events: Sender<EngineEvent>,
        metrics: Arc<PlaybackMetrics>,
        ready: Sender<Result<(), EngineError>>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("playback-engine".into())
            .spawn(move || {
                let backend = match factory() {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::error!(error = %e, "Audio output unavailable");
                        let _ = ready.send(Err(EngineError::Output(e.to_string())));
                        return;
                    }
                };
                let _ = ready.send(Ok(()));

                let mut core = EngineCore {
                    backend,
                    commands,
                    events,
                    metrics,

                    playlist: EnginePlaylist::default(),
                    play_when_ready: false,
                    loaded: false,
                    shuffle_enabled: false,
                };

                core.run();
            })
    }

    fn run(&mut self) {
        loop {
            match self.commands.recv_timeout(REFRESH_RATE) {
                Ok(EngineCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(cmd) => self.handle_command(cmd),
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.check_item_end();
            self.update_metrics();
        }

        self.backend.stop();
        self.metrics.reset();
        tracing::debug!("Playback engine shutting down");
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Load {
                items,
                start_index,
                start_position,
            } => self.load(items, start_index, start_position),
            EngineCommand::Play => self.play(),
            EngineCommand::Pause => self.pause(),
            EngineCommand::Seek(pos) => self.seek(pos),
            EngineCommand::SkipNext => self.skip_next(),
            EngineCommand::SkipPrevious => self.skip_previous(),
            EngineCommand::Move { from, to } => self.move_item(from, to),
            EngineCommand::Insert { at, items } => self.insert(at, items),
            EngineCommand::Remove { from, count } => self.remove(from, count),
            EngineCommand::SetRepeat(mode) => self.set_repeat(mode),
            EngineCommand::SetShuffle(enabled) => self.set_shuffle(enabled),
            EngineCommand::Shutdown => {}
        }
    }

    fn check_item_end(&mut self) {
        // `loaded` flips off below, so each end is handled once
        if !self.loaded || !self.backend.finished() {
            return;
        }

        match self.playlist.on_item_end() {
            Advance::Next(_) => self.open_current(Duration::ZERO, TransitionReason::Auto),
            Advance::Repeat(_) => self.open_current(Duration::ZERO, TransitionReason::Repeat),
            Advance::Ended => {
                tracing::debug!("Reached end of playlist");
                self.backend.stop();
                self.loaded = false;
            }
        }
    }

    fn update_metrics(&mut self) {
        if self.loaded {
            self.metrics.set_position(self.backend.position());
        }
        self.refresh_playing();
    }

    fn refresh_playing(&mut self) {
        let playing = self.loaded && self.play_when_ready && !self.backend.is_paused();
        if playing != self.metrics.is_playing() {
            self.metrics.set_playing(playing);
            self.emit(EngineEvent::IsPlayingChanged(playing));
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

// ==============
//    COMMANDS
// ==============
impl EngineCore {
    fn load(&mut self, items: Vec<EngineItem>, start_index: usize, start_position: Duration) {
        self.playlist.load(items, start_index);
        self.metrics.set_item_count(self.playlist.len());

        match self.playlist.is_empty() {
            true => self.unload(),
            false => self.open_current(start_position, TransitionReason::PlaylistChanged),
        }
    }

    fn play(&mut self) {
        self.play_when_ready = true;

        // Played through to the end: start the current item over
        if !self.loaded && !self.open(Duration::ZERO) {
            return;
        }
        self.backend.resume();
        self.refresh_playing();
    }

    fn pause(&mut self) {
        self.play_when_ready = false;
        self.backend.pause();
        self.refresh_playing();
    }

    fn seek(&mut self, position: Duration) {
        if !self.loaded {
            self.open(position);
            return;
        }

        match self.backend.seek(position) {
            Ok(()) => self.metrics.set_position(position),
            Err(e) => self.emit(EngineEvent::Error(e.to_string())),
        }
    }

    fn skip_next(&mut self) {
        if self.playlist.skip_next().is_some() {
            self.open_current(Duration::ZERO, TransitionReason::Seek);
        }
    }

    fn skip_previous(&mut self) {
        match self.playlist.skip_previous(self.backend.position()) {
            Some(Previous::Restart) => self.seek(Duration::ZERO),
            Some(Previous::Item(_)) => self.open_current(Duration::ZERO, TransitionReason::Seek),
            None => {}
        }
    }

    fn move_item(&mut self, from: usize, to: usize) {
        if !self.playlist.move_item(from, to) {
            tracing::warn!(from, to, len = self.playlist.len(), "Ignoring out of range move");
        }
        self.publish_current();
    }

    fn insert(&mut self, at: usize, items: Vec<EngineItem>) {
        let was_empty = self.playlist.current_index().is_none();
        self.playlist.insert(at, items);
        self.metrics.set_item_count(self.playlist.len());

        match was_empty && self.playlist.current_index().is_some() {
            true => self.open_current(Duration::ZERO, TransitionReason::PlaylistChanged),
            false => self.publish_current(),
        }
    }

    fn remove(&mut self, from: usize, count: usize) {
        let current_removed = self.playlist.remove(from, count);
        self.metrics.set_item_count(self.playlist.len());

        if !current_removed {
            self.publish_current();
            return;
        }

        match self.playlist.current_index() {
            Some(_) => self.open_current(Duration::ZERO, TransitionReason::PlaylistChanged),
            None => self.unload(),
        }
    }

    fn set_repeat(&mut self, mode: RepeatMode) {
        self.metrics.set_repeat(mode);
        if self.playlist.repeat() != mode {
            self.playlist.set_repeat(mode);
            self.emit(EngineEvent::RepeatModeChanged(mode));
        }
    }

    // Order is owned by whoever loads the playlist, so the flag is only reported
    fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffle_enabled != enabled {
            self.shuffle_enabled = enabled;
            self.emit(EngineEvent::ShuffleModeChanged(enabled));
        }
    }
}

// ==============
//    HELPERS
// ==============
impl EngineCore {
    /// Open the current item and announce the transition.
    fn open_current(&mut self, start: Duration, reason: TransitionReason) {
        self.open(start);
        let locator = self.playlist.current_item().map(|i| i.locator.clone());
        self.emit(EngineEvent::ItemTransitioned { locator, reason });
    }

    fn open(&mut self, start: Duration) -> bool {
        let Some(item) = self.playlist.current_item() else {
            return false;
        };
        let locator = item.locator.clone();
        self.publish_current();

        match self.backend.load(&locator, start) {
            Ok(length) => {
                tracing::debug!(%locator, ?length, "Opened item");
                self.loaded = true;
                self.metrics.set_duration(length);
                self.metrics.set_position(start);
                if self.play_when_ready {
                    self.backend.resume();
                }
            }
            Err(e) => {
                tracing::error!(%locator, error = %e, "Failed to open item");
                self.loaded = false;
                self.metrics.set_duration(None);
                self.metrics.set_position(Duration::ZERO);
                self.emit(EngineEvent::Error(
                    EngineError::Decode {
                        locator,
                        reason: e.to_string(),
                    }
                    .to_string(),
                ));
            }
        }
        self.refresh_playing();
        self.loaded
    }

    fn unload(&mut self) {
        self.backend.stop();
        self.loaded = false;
        self.metrics.set_duration(None);
        self.metrics.set_position(Duration::ZERO);
        self.publish_current();
        self.refresh_playing();
        self.emit(EngineEvent::ItemTransitioned {
            locator: None,
            reason: TransitionReason::PlaylistChanged,
        });
    }

    fn publish_current(&self) {
        let locator = self.playlist.current_item().map(|i| i.locator.clone());
        self.metrics
            .set_current(self.playlist.current_index(), locator);
    }
}
