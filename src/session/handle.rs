use super::{Message, SessionSettings, SessionView, actor::SessionActor};
use crate::{
    domain::Track,
    engine::{EngineEvent, PlaybackEngine},
    library::CatalogSource,
};
use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::{
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

/// Explicitly started, explicitly stopped playback session.
///
/// Commands are queued to the session thread and return as soon as they are
/// accepted. Their effect shows up in a later `view()`.
pub struct Session {
    messages: Sender<Message>,
    view: Arc<Mutex<SessionView>>,
    handle: Option<JoinHandle<()>>,
}

impl Session {
    pub fn start(catalog: Box<dyn CatalogSource>, settings: SessionSettings) -> Result<Self> {
        let (tx, rx) = unbounded();
        let view = Arc::new(Mutex::new(SessionView::default()));

        let actor = SessionActor::new(rx, catalog, settings, Arc::clone(&view));
        let handle = thread::Builder::new()
            .name("session".into())
            .spawn(move || actor.run())?;

        Ok(Session {
            messages: tx,
            view,
            handle: Some(handle),
        })
    }

    /// Latest published state.
    pub fn view(&self) -> SessionView {
        match self.view.lock() {
            Ok(view) => view.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stop the session thread, releasing any connected engine.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.messages.send(Message::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn send(&self, msg: Message) -> Result<()> {
        self.messages
            .send(msg)
            .map_err(|_| anyhow!("Session is no longer running"))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =====================
//    COMMAND HANDLER
// =====================
impl Session {
    pub fn connect(
        &self,
        engine: Box<dyn PlaybackEngine>,
        events: Receiver<EngineEvent>,
    ) -> Result<()> {
        self.send(Message::Connect { engine, events })
    }

    pub fn disconnect(&self) -> Result<()> {
        self.send(Message::Disconnect)
    }

    pub fn set_search_query(&self, query: impl Into<String>) -> Result<()> {
        self.send(Message::SetSearchQuery(query.into()))
    }

    pub fn tap_track(&self, track: Arc<Track>) -> Result<()> {
        self.send(Message::TapTrack(track))
    }

    pub fn select_from_queue(&self, index: usize) -> Result<()> {
        self.send(Message::SelectFromQueue(index))
    }

    pub fn shuffle_and_play_all(&self) -> Result<()> {
        self.send(Message::ShuffleAndPlayAll)
    }

    pub fn toggle_shuffle_preserving_current(&self) -> Result<()> {
        self.send(Message::ToggleShuffle)
    }

    pub fn restore_library_order(&self) -> Result<()> {
        self.send(Message::RestoreLibraryOrder)
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Message::TogglePlayPause)
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.send(Message::Seek(position))
    }

    pub fn next(&self) -> Result<()> {
        self.send(Message::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(Message::Previous)
    }

    pub fn toggle_repeat_mode(&self) -> Result<()> {
        self.send(Message::ToggleRepeat)
    }

    pub fn request_library_load(&self) -> Result<()> {
        self.send(Message::RequestLibraryLoad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RepeatMode, TrackInfo, TrackList},
        engine::fake::FakeEngine,
    };
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Instant,
    };

    struct FixedCatalog {
        tracks: TrackList,
        rescans: Arc<AtomicUsize>,
    }

    impl CatalogSource for FixedCatalog {
        fn subscribe(&self) -> Receiver<TrackList> {
            let (tx, rx) = unbounded();
            let _ = tx.send(Arc::clone(&self.tracks));
            rx
        }

        fn request_rescan(&self) {
            self.rescans.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn library() -> TrackList {
        Arc::new(
            ["Alpha", "Bravo", "Charlie"]
                .iter()
                .enumerate()
                .map(|(i, title)| {
                    Arc::new(Track::new(
                        i as u64,
                        *title,
                        "Band",
                        "Record",
                        Duration::from_secs(180),
                        format!("/music/{title}.flac"),
                    ))
                })
                .collect(),
        )
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            poll_interval: Duration::from_millis(20),
            search_debounce: Duration::from_millis(300),
            ..Default::default()
        }
    }

    fn start() -> (Session, Arc<AtomicUsize>) {
        let rescans = Arc::new(AtomicUsize::new(0));
        let catalog = FixedCatalog {
            tracks: library(),
            rescans: Arc::clone(&rescans),
        };
        let session = Session::start(Box::new(catalog), settings()).unwrap();
        (session, rescans)
    }

    fn wait_until<F>(session: &Session, what: &str, pred: F) -> SessionView
    where
        F: Fn(&SessionView) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            let view = session.view();
            if pred(&view) {
                return view;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn connected() -> (Session, FakeEngine, Arc<AtomicUsize>) {
        let (session, rescans) = start();
        wait_until(&session, "library", |v| v.library.len() == 3);

        let (engine, events) = FakeEngine::new();
        session.connect(Box::new(engine.clone()), events).unwrap();
        wait_until(&session, "connection", |v| v.connected);
        (session, engine, rescans)
    }

    fn current_title(view: &SessionView) -> Option<&str> {
        view.current_song.as_ref().map(|t| t.get_title())
    }

    #[test]
    fn library_seeds_queue_and_filter_before_connect() {
        let (session, _) = start();
        let view = wait_until(&session, "library", |v| v.library.len() == 3);

        assert_eq!(view.queue.len(), 3);
        assert_eq!(view.filtered.len(), 3);
        assert!(!view.connected);
        assert_eq!(view.current_index, None);
    }

    #[test]
    fn commands_are_dropped_until_connected() {
        let (session, _) = start();
        let view = wait_until(&session, "library", |v| v.library.len() == 3);

        session.tap_track(Arc::clone(&view.library[1])).unwrap();
        session.toggle_repeat_mode().unwrap();
        let later = wait_until(&session, "next publish", |v| v.version > view.version + 1);

        assert_eq!(later.current_index, None);
        assert_eq!(later.repeat_mode, RepeatMode::Off);
    }

    #[test]
    fn tap_plays_and_is_confirmed() {
        let (session, engine, _) = connected();
        let library = session.view().library;

        session.tap_track(Arc::clone(&library[1])).unwrap();
        let view = wait_until(&session, "playing", |v| {
            v.is_playing && v.duration == Duration::from_secs(200)
        });

        assert_eq!(current_title(&view), Some("Bravo"));
        assert_eq!(view.current_index, Some(1));
        assert_eq!(engine.current_index(), Some(1));
    }

    #[test]
    fn poller_publishes_engine_position() {
        let (session, engine, _) = connected();
        session.select_from_queue(0).unwrap();
        wait_until(&session, "playing", |v| v.is_playing);

        engine.state().position = Duration::from_secs(42);
        wait_until(&session, "position", |v| v.position == Duration::from_secs(42));
    }

    #[test]
    fn seek_moves_position_right_away() {
        let (session, engine, _) = connected();
        session.select_from_queue(0).unwrap();
        wait_until(&session, "playing", |v| v.is_playing);

        session.seek(Duration::from_secs(90)).unwrap();
        wait_until(&session, "seek", |v| v.position == Duration::from_secs(90));
        assert_eq!(engine.position(), Duration::from_secs(90));
    }

    #[test]
    fn search_waits_for_debounce() {
        let (session, _) = start();
        wait_until(&session, "library", |v| v.library.len() == 3);

        session.set_search_query("char").unwrap();
        let typed = wait_until(&session, "query", |v| v.search_query == "char");
        assert_eq!(typed.filtered.len(), 3);

        let view = wait_until(&session, "filter", |v| v.filtered.len() == 1);
        assert_eq!(view.filtered[0].get_title(), "Charlie");
        assert_eq!(view.queue.len(), 3);
    }

    #[test]
    fn shuffle_then_toggle_keep_current_first() {
        let (session, engine, _) = connected();
        session.shuffle_and_play_all().unwrap();
        let view = wait_until(&session, "shuffle", |v| v.shuffle_enabled && v.is_playing);
        assert_eq!(view.current_index, Some(0));

        session.next().unwrap();
        let view = wait_until(&session, "skip", |v| v.current_index == Some(1));
        let playing = current_title(&view).map(str::to_string);

        session.toggle_shuffle_preserving_current().unwrap();
        let view = wait_until(&session, "reshuffle", |v| v.current_index == Some(0));
        assert_eq!(current_title(&view).map(str::to_string), playing);
        assert_eq!(view.queue[0].locator(), engine.locators()[0]);
    }

    #[test]
    fn repeat_toggles_cycle_through_engine() {
        let (session, _, _) = connected();

        session.toggle_repeat_mode().unwrap();
        wait_until(&session, "all", |v| v.repeat_mode == RepeatMode::All);
        session.toggle_repeat_mode().unwrap();
        wait_until(&session, "one", |v| v.repeat_mode == RepeatMode::One);
        session.toggle_repeat_mode().unwrap();
        wait_until(&session, "off", |v| v.repeat_mode == RepeatMode::Off);
    }

    #[test]
    fn closed_event_stream_disconnects() {
        let (session, _) = start();
        let (engine, _events) = FakeEngine::new();
        let (tx, rx) = unbounded();

        session.connect(Box::new(engine), rx).unwrap();
        wait_until(&session, "connection", |v| v.connected);

        drop(tx);
        wait_until(&session, "disconnect", |v| !v.connected);
    }

    #[test]
    fn engine_errors_are_surfaced() {
        let (session, _) = start();
        let (engine, _events) = FakeEngine::new();
        let (tx, rx) = unbounded();
        session.connect(Box::new(engine), rx).unwrap();

        tx.send(EngineEvent::Error("could not decode /x.ogg".into()))
            .unwrap();
        let view = wait_until(&session, "error", |v| v.last_error.is_some());
        assert!(view.last_error.unwrap().contains("/x.ogg"));
    }

    #[test]
    fn rescan_is_forwarded_to_catalog() {
        let (session, rescans) = start();
        session.request_library_load().unwrap();
        session.stop();
        assert_eq!(rescans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_disconnect_keeps_queue() {
        let (session, _, _) = connected();
        session.select_from_queue(2).unwrap();
        wait_until(&session, "playing", |v| v.is_playing);

        session.disconnect().unwrap();
        let view = wait_until(&session, "disconnect", |v| !v.connected);
        assert_eq!(view.queue.len(), 3);
        assert!(!view.is_playing);
        assert_eq!(view.position, Duration::ZERO);
    }
}
