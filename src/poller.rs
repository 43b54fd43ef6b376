use crate::{domain::Track, engine::PlaybackEngine};
use std::{sync::Arc, time::Duration};

/// Transient view of the engine clock, overwritten on every poll tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub position: Duration,
    /// Zero while unknown
    pub duration: Duration,
    pub is_playing: bool,
}

/// Samples position and duration from the engine at a fixed period.
///
/// Duration comes from the live engine reading; the current track's metadata
/// only stands in while the engine has not resolved it yet.
#[derive(Debug)]
pub struct PositionPoller {
    interval: Duration,
    snapshot: PlaybackSnapshot,
}

impl PositionPoller {
    pub fn new(interval: Duration) -> Self {
        PositionPoller {
            interval,
            snapshot: PlaybackSnapshot::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot
    }

    pub fn sample(&mut self, engine: &dyn PlaybackEngine, current: Option<&Arc<Track>>) -> bool {
        let next = PlaybackSnapshot {
            position: engine.position(),
            duration: resolve_duration(engine.duration(), current),
            is_playing: engine.is_playing(),
        };
        tracing::trace!(?next, "Poll tick");

        let changed = next != self.snapshot;
        self.snapshot = next;
        changed
    }

    /// A new item became current: restart the clock before the next tick.
    pub fn on_transition(&mut self, current: Option<&Arc<Track>>) {
        self.snapshot.position = Duration::ZERO;
        self.snapshot.duration = current.map(|t| t.duration).unwrap_or_default();
    }

    pub fn on_seek(&mut self, position: Duration) {
        self.snapshot.position = position;
    }

    pub fn set_playing(&mut self, is_playing: bool) {
        self.snapshot.is_playing = is_playing;
    }

    pub fn reset(&mut self) {
        self.snapshot = PlaybackSnapshot::default();
    }
}

fn resolve_duration(live: Option<Duration>, current: Option<&Arc<Track>>) -> Duration {
    match live {
        Some(d) if !d.is_zero() => d,
        _ => current.map(|t| t.duration).unwrap_or_default(),
    }
}
