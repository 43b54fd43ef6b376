use super::{Message, SessionSettings, SessionView};
use crate::{
    domain::TrackList,
    engine::{EngineEvent, PlaybackEngine},
    library::CatalogSource,
    poller::PositionPoller,
    queue::{QueueSync, Reconciled},
    search::SearchFilter,
};
use crossbeam_channel::{Receiver, at, never, select, tick};
use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

pub(super) struct SessionActor {
    messages: Receiver<Message>,
    catalog: Box<dyn CatalogSource>,
    catalog_updates: Receiver<TrackList>,
    events: Option<Receiver<EngineEvent>>,
    // Only present while an engine is connected
    ticker: Option<Receiver<Instant>>,

    queue: QueueSync,
    search: SearchFilter,
    poller: PositionPoller,
    last_error: Option<String>,

    view: Arc<Mutex<SessionView>>,
    version: u64,
}

impl SessionActor {
    pub(super) fn new(
        messages: Receiver<Message>,
        catalog: Box<dyn CatalogSource>,
        settings: SessionSettings,
        view: Arc<Mutex<SessionView>>,
    ) -> Self {
        let catalog_updates = catalog.subscribe();

        SessionActor {
            messages,
            catalog,
            catalog_updates,
            events: None,
            ticker: None,

            queue: QueueSync::new(),
            search: SearchFilter::new(settings.search_mode, settings.search_debounce),
            poller: PositionPoller::new(settings.poll_interval),
            last_error: None,

            view,
            version: 0,
        }
    }

    pub(super) fn run(mut self) {
        tracing::info!("Session started");

        loop {
            // Receivers are cheap handles; cloning keeps `self` free for the arms
            let messages = self.messages.clone();
            let catalog = self.catalog_updates.clone();
            let events = self.events.clone().unwrap_or_else(never);
            let ticker = self.ticker.clone().unwrap_or_else(never);
            let debounce = self.search.deadline().map(at).unwrap_or_else(never);

            select! {
                recv(messages) -> msg => match msg {
                    Ok(Message::Shutdown) | Err(_) => break,
                    Ok(msg) => self.handle_message(msg),
                },
                recv(catalog) -> tracks => match tracks {
                    Ok(tracks) => self.on_library(tracks),
                    Err(_) => {
                        tracing::debug!("Catalog stopped publishing");
                        self.catalog_updates = never();
                    }
                },
                recv(events) -> event => match event {
                    Ok(event) => self.on_engine_event(event),
                    Err(_) => self.on_engine_lost(),
                },
                recv(ticker) -> _ => self.on_tick(),
                recv(debounce) -> _ => {
                    self.search.fire(Instant::now());
                }
            }

            self.publish();
        }

        self.release_engine();
        tracing::info!("Session stopped");
    }

    fn handle_message(&mut self, msg: Message) {
        match msg {
            Message::Connect { engine, events } => self.connect(engine, events),
            Message::Disconnect => self.release_engine(),
            Message::SetSearchQuery(query) => self.search.set_query(query, Instant::now()),
            Message::TapTrack(track) => {
                self.queue.tap_track(&track);
                self.restart_clock();
            }
            Message::SelectFromQueue(index) => {
                self.queue.select_from_queue(index);
                self.restart_clock();
            }
            Message::ShuffleAndPlayAll => {
                self.queue.shuffle_and_play_all();
                self.restart_clock();
            }
            Message::ToggleShuffle => self.queue.toggle_shuffle_preserving_current(),
            Message::RestoreLibraryOrder => self.queue.restore_library_order(),
            Message::TogglePlayPause => self.queue.toggle_play_pause(),
            Message::Seek(position) => {
                self.queue.seek(position);
                if self.queue.is_connected() {
                    self.poller.on_seek(position);
                }
            }
            Message::Next => self.queue.next(),
            Message::Previous => self.queue.previous(),
            Message::ToggleRepeat => self.queue.toggle_repeat_mode(),
            Message::RequestLibraryLoad => self.catalog.request_rescan(),
            Message::Shutdown => {}
        }
    }

    fn connect(&mut self, engine: Box<dyn PlaybackEngine>, events: Receiver<EngineEvent>) {
        self.release_engine();

        self.queue.connect(engine);
        self.events = Some(events);
        self.ticker = Some(tick(self.poller.interval()));
        self.last_error = None;
        self.on_tick();
    }

    fn release_engine(&mut self) {
        self.ticker = None;
        self.events = None;
        self.poller.reset();
        // Dropping the engine handle shuts its thread down
        drop(self.queue.disconnect());
    }

    fn on_engine_lost(&mut self) {
        tracing::warn!("Engine event stream closed, treating as disconnect");
        self.release_engine();
    }

    fn on_library(&mut self, tracks: TrackList) {
        tracing::debug!(count = tracks.len(), "Library snapshot received");
        self.queue.on_library_changed(Arc::clone(&tracks));
        self.search.on_library_changed(tracks);
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        let transitioned_to = match &event {
            EngineEvent::ItemTransitioned { locator, .. } => locator.clone(),
            EngineEvent::Error(msg) => {
                self.last_error = Some(msg.clone());
                None
            }
            _ => None,
        };

        match self.queue.handle_event(event) {
            Reconciled::CurrentChanged => self.restart_clock(),
            Reconciled::PlayingChanged => self.poller.set_playing(self.queue.is_playing()),
            Reconciled::Unchanged | Reconciled::RepeatChanged => {
                // Same item started over (repeat-one, restart)
                let current = self.queue.current_song().map(|t| t.locator());
                if transitioned_to.is_some() && transitioned_to.as_deref() == current {
                    self.restart_clock();
                }
            }
        }
    }

    fn on_tick(&mut self) {
        if let Some(engine) = self.queue.engine() {
            self.poller.sample(engine, self.queue.current_song());
        }
    }

    fn restart_clock(&mut self) {
        self.poller.on_transition(self.queue.current_song());
    }

    fn publish(&mut self) {
        self.version += 1;
        let snapshot = self.poller.snapshot();

        let view = SessionView {
            library: Arc::clone(self.queue.library()),
            filtered: Arc::clone(self.search.view()),
            queue: Arc::clone(self.queue.queue()),
            current_index: self.queue.current_index(),
            current_song: self.queue.current_song().cloned(),
            is_playing: self.queue.is_playing(),
            position: snapshot.position,
            duration: snapshot.duration,
            shuffle_enabled: self.queue.shuffle_enabled(),
            repeat_mode: self.queue.repeat_mode(),
            search_query: self.search.query().to_string(),
            connected: self.queue.is_connected(),
            last_error: self.last_error.clone(),
            version: self.version,
        };

        match self.view.lock() {
            Ok(mut shared) => *shared = view,
            Err(poisoned) => *poisoned.into_inner() = view,
        }
    }
}
