//! Queue synchronization: the canonical play order and its engine replica.

mod shuffle;
mod sync;

pub use sync::{QueueSync, Reconciled};
