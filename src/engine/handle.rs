use super::{
    AudioBackend, EngineCommand, EngineError, EngineEvent, EngineItem, EngineResult,
    PlaybackEngine, PlaybackMetrics, RodioBackend, core::EngineCore,
};
use crate::domain::RepeatMode;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::{sync::Arc, thread::JoinHandle, time::Duration};

/// Handle to the engine thread. Dropping it stops playback and joins the thread.
pub struct RodioEngine {
    commands: Sender<EngineCommand>,
    metrics: Arc<PlaybackMetrics>,
    handle: Option<JoinHandle<()>>,
}

impl RodioEngine {
    /// Open the default output device and start the engine thread.
    pub fn connect() -> Result<(Self, Receiver<EngineEvent>), EngineError> {
        Self::connect_with(|| {
            let backend = RodioBackend::new()?;
            Ok(Box::new(backend) as Box<dyn AudioBackend>)
        })
    }

    pub fn connect_with<F>(factory: F) -> Result<(Self, Receiver<EngineEvent>), EngineError>
    where
        F: FnOnce() -> anyhow::Result<Box<dyn AudioBackend>> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, evt_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let metrics = PlaybackMetrics::new();

        let handle = EngineCore::spawn(
            Box::new(factory),
            cmd_rx,
            evt_tx,
            Arc::clone(&metrics),
            ready_tx,
        )
        .map_err(|e| EngineError::Output(e.to_string()))?;

        // Sender is dropped without a message only if the thread died early
        ready_rx.recv().map_err(|_| EngineError::Disconnected)??;

        tracing::info!("Playback engine connected");
        let engine = RodioEngine {
            commands: cmd_tx,
            metrics,
            handle: Some(handle),
        };

        Ok((engine, evt_rx))
    }

    fn send(&self, cmd: EngineCommand) -> EngineResult {
        self.commands
            .send(cmd)
            .map_err(|_| EngineError::Disconnected)
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let _ = self.commands.send(EngineCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl PlaybackEngine for RodioEngine {
    fn load_queue(
        &mut self,
        items: Vec<EngineItem>,
        start_index: usize,
        start_position: Duration,
    ) -> EngineResult {
        let count = items.len();
        let start = start_index.min(count.saturating_sub(1));
        let locator = items.get(start).map(|i| i.locator.clone());

        self.send(EngineCommand::Load {
            items,
            start_index,
            start_position,
        })?;

        // Reads right after a reload describe the new playlist, not the old one
        self.metrics.set_item_count(count);
        self.metrics
            .set_current(locator.as_ref().map(|_| start), locator);
        Ok(())
    }

    fn play(&mut self) -> EngineResult {
        self.send(EngineCommand::Play)
    }

    fn pause(&mut self) -> EngineResult {
        self.send(EngineCommand::Pause)
    }

    fn seek(&mut self, position: Duration) -> EngineResult {
        self.send(EngineCommand::Seek(position))
    }

    fn skip_next(&mut self) -> EngineResult {
        self.send(EngineCommand::SkipNext)
    }

    fn skip_previous(&mut self) -> EngineResult {
        self.send(EngineCommand::SkipPrevious)
    }

    fn move_item(&mut self, from: usize, to: usize) -> EngineResult {
        self.send(EngineCommand::Move { from, to })
    }

    fn insert_items(&mut self, at: usize, items: Vec<EngineItem>) -> EngineResult {
        self.send(EngineCommand::Insert { at, items })
    }

    fn remove_items(&mut self, from: usize, count: usize) -> EngineResult {
        self.send(EngineCommand::Remove { from, count })
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) -> EngineResult {
        self.send(EngineCommand::SetRepeat(mode))?;
        self.metrics.set_repeat(mode);
        Ok(())
    }

    fn set_shuffle_enabled(&mut self, enabled: bool) -> EngineResult {
        self.send(EngineCommand::SetShuffle(enabled))
    }

    fn position(&self) -> Duration {
        self.metrics.get_position()
    }

    fn duration(&self) -> Option<Duration> {
        self.metrics.get_duration()
    }

    fn is_playing(&self) -> bool {
        self.metrics.is_playing()
    }

    fn repeat_mode(&self) -> RepeatMode {
        self.metrics.get_repeat()
    }

    fn current_index(&self) -> Option<usize> {
        self.metrics.get_current_index()
    }

    fn current_locator(&self) -> Option<String> {
        self.metrics.get_locator()
    }

    fn item_count(&self) -> usize {
        self.metrics.get_item_count()
    }
}
