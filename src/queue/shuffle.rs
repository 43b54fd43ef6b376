use crate::{domain::Track, engine::EngineItem};
use rand::seq::SliceRandom;
use std::sync::Arc;

pub fn shuffled(tracks: &[Arc<Track>]) -> Vec<Arc<Track>> {
    let mut tracks = tracks.to_vec();
    tracks.shuffle(&mut rand::rng());
    tracks
}

/// `pinned` followed by a fresh permutation of everything else in `library`.
///
/// Only the first entry sharing the pinned locator is taken out, so duplicates
/// elsewhere in the library survive.
pub fn pinned_first(pinned: &Arc<Track>, library: &[Arc<Track>]) -> Vec<Arc<Track>> {
    let mut rest = library.to_vec();
    if let Some(idx) = position_of(&rest, pinned.locator()) {
        rest.remove(idx);
    }
    rest.shuffle(&mut rand::rng());

    let mut queue = Vec::with_capacity(rest.len() + 1);
    queue.push(Arc::clone(pinned));
    queue.extend(rest);
    queue
}

pub fn position_of(tracks: &[Arc<Track>], locator: &str) -> Option<usize> {
    tracks.iter().position(|t| t.locator() == locator)
}

pub fn to_items(tracks: &[Arc<Track>]) -> Vec<EngineItem> {
    tracks.iter().map(|t| EngineItem::from(t.as_ref())).collect()
}
