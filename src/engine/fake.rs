//! In-process stand-in for the engine thread, used by queue and session tests.
//!
//! Commands take effect synchronously on an `EnginePlaylist` and queue the same
//! events the real engine emits. Every call is recorded by name so tests can
//! assert how the remote playlist was driven.

use super::{
    Advance, EngineError, EngineEvent, EngineItem, EnginePlaylist, EngineResult,
    PlaybackEngine, Previous, TransitionReason,
};
use crate::domain::RepeatMode;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

#[derive(Default)]
pub(crate) struct FakeState {
    pub playlist: EnginePlaylist,
    pub play_when_ready: bool,
    pub ended: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub shuffle: bool,
    pub calls: Vec<String>,
    pub disconnected: bool,
}

impl FakeState {
    fn is_playing(&self) -> bool {
        self.play_when_ready && !self.ended && self.playlist.current_index().is_some()
    }
}

#[derive(Clone)]
pub(crate) struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    events: Sender<EngineEvent>,
}

impl FakeEngine {
    pub fn new() -> (Self, Receiver<EngineEvent>) {
        let (tx, rx) = unbounded();
        let engine = FakeEngine {
            state: Arc::new(Mutex::new(FakeState {
                duration: Some(Duration::from_secs(200)),
                ..Default::default()
            })),
            events: tx,
        };
        (engine, rx)
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn locators(&self) -> Vec<String> {
        self.state()
            .playlist
            .items()
            .iter()
            .map(|i| i.locator.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear()
    }

    /// Simulate the current item playing through to its end.
    pub fn finish_current(&self) {
        let mut s = self.state();
        let reason = match s.playlist.on_item_end() {
            Advance::Next(_) => TransitionReason::Auto,
            Advance::Repeat(_) => TransitionReason::Repeat,
            Advance::Ended => {
                let was_playing = s.is_playing();
                s.ended = true;
                drop(s);
                if was_playing {
                    self.emit(EngineEvent::IsPlayingChanged(false));
                }
                return;
            }
        };
        s.position = Duration::ZERO;
        let event = transition(&s, reason);
        drop(s);
        self.emit(event);
    }

    /// Make every further command fail as if the engine thread had died.
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    /// Record the call and apply `f`, then emit whatever it returned plus an
    /// `IsPlayingChanged` if the call flipped the playing state.
    fn apply<F>(&mut self, call: String, f: F) -> EngineResult
    where
        F: FnOnce(&mut FakeState) -> Vec<EngineEvent>,
    {
        let mut s = self.state();
        if s.disconnected {
            return Err(EngineError::Disconnected);
        }
        s.calls.push(call);

        let was_playing = s.is_playing();
        let mut events = f(&mut s);
        let playing = s.is_playing();
        drop(s);

        if was_playing != playing {
            events.push(EngineEvent::IsPlayingChanged(playing));
        }
        for event in events {
            self.emit(event);
        }
        Ok(())
    }
}

fn transition(s: &FakeState, reason: TransitionReason) -> EngineEvent {
    EngineEvent::ItemTransitioned {
        locator: s.playlist.current_item().map(|i| i.locator.clone()),
        reason,
    }
}

impl PlaybackEngine for FakeEngine {
    fn load_queue(
        &mut self,
        items: Vec<EngineItem>,
        start_index: usize,
        start_position: Duration,
    ) -> EngineResult {
        let call = format!("load({},{start_index})", items.len());
        self.apply(call, |s| {
            s.playlist.load(items, start_index);
            s.ended = false;
            s.position = start_position;
            vec![transition(s, TransitionReason::PlaylistChanged)]
        })
    }

    fn play(&mut self) -> EngineResult {
        self.apply("play".into(), |s| {
            s.play_when_ready = true;
            if s.ended {
                s.ended = false;
                s.position = Duration::ZERO;
            }
            vec![]
        })
    }

    fn pause(&mut self) -> EngineResult {
        self.apply("pause".into(), |s| {
            s.play_when_ready = false;
            vec![]
        })
    }

    fn seek(&mut self, position: Duration) -> EngineResult {
        self.apply(format!("seek({})", position.as_millis()), |s| {
            s.position = position;
            vec![]
        })
    }

    fn skip_next(&mut self) -> EngineResult {
        self.apply("skip_next".into(), |s| match s.playlist.skip_next() {
            Some(_) => {
                s.position = Duration::ZERO;
                vec![transition(s, TransitionReason::Seek)]
            }
            None => vec![],
        })
    }

    fn skip_previous(&mut self) -> EngineResult {
        self.apply("skip_previous".into(), |s| {
            match s.playlist.skip_previous(s.position) {
                Some(Previous::Item(_)) => {
                    s.position = Duration::ZERO;
                    vec![transition(s, TransitionReason::Seek)]
                }
                Some(Previous::Restart) => {
                    s.position = Duration::ZERO;
                    vec![]
                }
                None => vec![],
            }
        })
    }

    fn move_item(&mut self, from: usize, to: usize) -> EngineResult {
        self.apply(format!("move({from},{to})"), |s| {
            s.playlist.move_item(from, to);
            vec![]
        })
    }

    fn insert_items(&mut self, at: usize, items: Vec<EngineItem>) -> EngineResult {
        self.apply(format!("insert({at},{})", items.len()), |s| {
            let was_empty = s.playlist.current_index().is_none();
            s.playlist.insert(at, items);
            match was_empty && s.playlist.current_index().is_some() {
                true => vec![transition(s, TransitionReason::PlaylistChanged)],
                false => vec![],
            }
        })
    }

    fn remove_items(&mut self, from: usize, count: usize) -> EngineResult {
        self.apply(format!("remove({from},{count})"), |s| {
            match s.playlist.remove(from, count) {
                true => vec![transition(s, TransitionReason::PlaylistChanged)],
                false => vec![],
            }
        })
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) -> EngineResult {
        self.apply(format!("repeat({mode})"), |s| {
            match s.playlist.repeat() == mode {
                true => vec![],
                false => {
                    s.playlist.set_repeat(mode);
                    vec![EngineEvent::RepeatModeChanged(mode)]
                }
            }
        })
    }

    fn set_shuffle_enabled(&mut self, enabled: bool) -> EngineResult {
        self.apply(format!("shuffle({enabled})"), |s| match s.shuffle == enabled {
            true => vec![],
            false => {
                s.shuffle = enabled;
                vec![EngineEvent::ShuffleModeChanged(enabled)]
            }
        })
    }

    fn position(&self) -> Duration {
        self.state().position
    }

    fn duration(&self) -> Option<Duration> {
        let s = self.state();
        s.playlist.current_index().and(s.duration)
    }

    fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    fn repeat_mode(&self) -> RepeatMode {
        self.state().playlist.repeat()
    }

    fn current_index(&self) -> Option<usize> {
        self.state().playlist.current_index()
    }

    fn current_locator(&self) -> Option<String> {
        self.state()
            .playlist
            .current_item()
            .map(|i| i.locator.clone())
    }

    fn item_count(&self) -> usize {
        self.state().playlist.len()
    }
}
