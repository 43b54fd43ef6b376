use crate::domain::RepeatMode;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU8, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

const NO_INDEX: usize = usize::MAX;

/// State the engine thread publishes for lock-free reads from the handle.
pub struct PlaybackMetrics {
    playing: AtomicBool,
    position_ms: AtomicU64,
    // 0 while unknown
    duration_ms: AtomicU64,
    repeat: AtomicU8,
    current_index: AtomicUsize,
    item_count: AtomicUsize,
    locator: Mutex<Option<String>>,
}

impl PlaybackMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(PlaybackMetrics {
            playing: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
            repeat: AtomicU8::new(RepeatMode::Off.into()),
            current_index: AtomicUsize::new(NO_INDEX),
            item_count: AtomicUsize::new(0),
            locator: Mutex::new(None),
        })
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn get_position(&self) -> Duration {
        Duration::from_millis(self.position_ms.load(Ordering::Relaxed))
    }

    pub fn get_duration(&self) -> Option<Duration> {
        match self.duration_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn get_repeat(&self) -> RepeatMode {
        self.repeat
            .load(Ordering::Relaxed)
            .try_into()
            .unwrap_or_default()
    }

    pub fn get_current_index(&self) -> Option<usize> {
        match self.current_index.load(Ordering::Relaxed) {
            NO_INDEX => None,
            idx => Some(idx),
        }
    }

    pub fn get_item_count(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    pub fn get_locator(&self) -> Option<String> {
        self.locator.lock().ok().and_then(|l| l.clone())
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed)
    }

    pub fn set_position(&self, d: Duration) {
        self.position_ms
            .store(d.as_millis() as u64, Ordering::Relaxed)
    }

    pub fn set_duration(&self, d: Option<Duration>) {
        let ms = d.map(|d| d.as_millis() as u64).unwrap_or(0);
        self.duration_ms.store(ms, Ordering::Relaxed)
    }

    pub fn set_repeat(&self, mode: RepeatMode) {
        self.repeat.store(mode.into(), Ordering::Relaxed)
    }

    pub fn set_item_count(&self, count: usize) {
        self.item_count.store(count, Ordering::Relaxed)
    }

    pub fn set_current(&self, index: Option<usize>, locator: Option<String>) {
        self.current_index
            .store(index.unwrap_or(NO_INDEX), Ordering::Relaxed);
        if let Ok(mut l) = self.locator.lock() {
            *l = locator;
        }
    }

    pub fn reset(&self) {
        self.set_playing(false);
        self.set_position(Duration::ZERO);
        self.set_duration(None);
        self.set_current(None, None);
    }
}
