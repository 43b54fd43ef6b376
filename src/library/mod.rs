mod catalog;
mod library;
mod tags;

pub use catalog::Catalog;
pub use library::Library;

use crate::domain::TrackList;
use crossbeam_channel::Receiver;

static LEGAL_EXTENSION: std::sync::LazyLock<std::collections::HashSet<&'static str>> =
    std::sync::LazyLock::new(|| {
        std::collections::HashSet::from(["mp3", "m4a", "flac", "ogg", "wav"])
    });

/// Anything able to push the current ordered track list to the session.
pub trait CatalogSource: Send {
    /// The receiver yields the current snapshot right away, then one per change.
    fn subscribe(&self) -> Receiver<TrackList>;

    /// Fire-and-forget; the outcome arrives as a new snapshot, if anything changed.
    fn request_rescan(&self);
}
