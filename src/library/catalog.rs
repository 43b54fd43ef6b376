use super::{CatalogSource, Library};
use crate::domain::TrackList;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::thread::{self, JoinHandle};

enum CatalogRequest {
    Subscribe(Sender<TrackList>),
    Rescan,
    Shutdown,
}

/// Owns the `Library` on a worker thread and pushes a fresh snapshot to every
/// subscriber whenever the catalog changes.
pub struct Catalog {
    requests: Sender<CatalogRequest>,
    handle: Option<JoinHandle<()>>,
}

impl Catalog {
    pub fn spawn(library: Library, scan_on_start: bool) -> Self {
        let (tx, rx) = unbounded();

        let handle = thread::Builder::new()
            .name("catalog".into())
            .spawn(move || CatalogWorker::new(library, rx).run(scan_on_start))
            .ok();

        if handle.is_none() {
            tracing::error!("Failed to spawn catalog worker");
        }

        Catalog {
            requests: tx,
            handle,
        }
    }
}

impl CatalogSource for Catalog {
    fn subscribe(&self) -> Receiver<TrackList> {
        let (tx, rx) = unbounded();
        if self.requests.send(CatalogRequest::Subscribe(tx)).is_err() {
            tracing::warn!("Catalog worker is gone, subscriber will never hear back");
        }
        rx
    }

    fn request_rescan(&self) {
        if self.requests.send(CatalogRequest::Rescan).is_err() {
            tracing::warn!("Catalog worker is gone, rescan dropped");
        }
    }
}

impl Drop for Catalog {
    fn drop(&mut self) {
        let _ = self.requests.send(CatalogRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct CatalogWorker {
    library: Library,
    requests: Receiver<CatalogRequest>,
    subscribers: Vec<Sender<TrackList>>,
    snapshot: TrackList,
}

impl CatalogWorker {
    fn new(library: Library, requests: Receiver<CatalogRequest>) -> Self {
        let snapshot = library.snapshot();
        CatalogWorker {
            library,
            requests,
            subscribers: Vec::new(),
            snapshot,
        }
    }

    fn run(mut self, scan_on_start: bool) {
        // Persisted catalog first so the UI has something before the walk finishes
        match self.library.load_tracks() {
            Ok(()) => self.publish(),
            Err(e) => tracing::error!(error = %e, "Failed to load persisted catalog"),
        }

        if scan_on_start {
            self.rescan();
        }

        while let Ok(request) = self.requests.recv() {
            match request {
                CatalogRequest::Subscribe(tx) => {
                    if tx.send(self.snapshot.clone()).is_ok() {
                        self.subscribers.push(tx);
                    }
                }
                CatalogRequest::Rescan => self.rescan(),
                CatalogRequest::Shutdown => break,
            }
        }

        tracing::debug!("Catalog worker shutting down");
    }

    fn rescan(&mut self) {
        match self.library.rescan() {
            Ok((0, 0)) => tracing::debug!("Rescan found no changes"),
            Ok(_) => self.publish(),
            Err(e) => tracing::error!(error = %e, "Library rescan failed"),
        }
    }

    fn publish(&mut self) {
        self.snapshot = self.library.snapshot();
        let snapshot = &self.snapshot;

        tracing::debug!(tracks = snapshot.len(), "Publishing catalog snapshot");
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, domain::Track};
    use std::time::Duration;

    fn seeded_library() -> Library {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_tracks(&[
            Track::new(1, "B", "x", "y", Duration::ZERO, "/b.mp3"),
            Track::new(2, "A", "x", "y", Duration::ZERO, "/a.mp3"),
        ])
        .unwrap();
        Library::init(db)
    }

    #[test]
    fn subscriber_gets_persisted_snapshot_immediately() {
        let catalog = Catalog::spawn(seeded_library(), false);
        let rx = catalog.subscribe();

        let snapshot = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let locators: Vec<&str> = snapshot.iter().map(|t| t.locator()).collect();
        assert_eq!(locators, ["/a.mp3", "/b.mp3"]);
    }

    #[test]
    fn unchanged_rescan_publishes_nothing() {
        let catalog = Catalog::spawn(seeded_library(), false);
        let rx = catalog.subscribe();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        catalog.request_rescan();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
