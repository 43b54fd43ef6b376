use super::{EngineItem, MAX_SEEK_TO_PREVIOUS};
use crate::domain::RepeatMode;
use std::time::Duration;

/// Ordered item list plus the index of the active item, as the engine sees it.
///
/// Every mutation keeps `current` pointing at the same item whenever that item
/// survives the mutation.
#[derive(Debug, Default, Clone)]
pub struct EnginePlaylist {
    items: Vec<EngineItem>,
    current: Option<usize>,
    repeat: RepeatMode,
}

/// What happens once the active item plays to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Repeat(usize),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Previous {
    Restart,
    Item(usize),
}

impl EnginePlaylist {
    pub fn load(&mut self, items: Vec<EngineItem>, start_index: usize) -> Option<&EngineItem> {
        self.items = items;
        self.current = match self.items.is_empty() {
            true => None,
            false => Some(start_index.min(self.items.len() - 1)),
        };
        self.current_item()
    }

    pub fn items(&self) -> &[EngineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_item(&self) -> Option<&EngineItem> {
        self.current.and_then(|idx| self.items.get(idx))
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode
    }

    /// Returns false (and changes nothing) when either index is out of bounds.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        if from == to {
            return true;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(cur) = self.current {
            self.current = Some(match cur {
                c if c == from => to,
                c if from < c && to >= c => c - 1,
                c if from > c && to <= c => c + 1,
                c => c,
            });
        }
        true
    }

    pub fn insert(&mut self, at: usize, items: Vec<EngineItem>) {
        let at = at.min(self.items.len());
        let count = items.len();
        self.items.splice(at..at, items);

        match self.current {
            Some(cur) if at <= cur => self.current = Some(cur + count),
            None if !self.items.is_empty() && count > 0 && self.items.len() == count => {
                self.current = Some(0)
            }
            _ => {}
        }
    }

    /// Remove up to `count` items starting at `from`.
    ///
    /// Returns true when the active item was among them, in which case the item
    /// now sitting at the removal point (or the new last item) becomes active.
    pub fn remove(&mut self, from: usize, count: usize) -> bool {
        if from >= self.items.len() || count == 0 {
            return false;
        }
        let end = (from + count).min(self.items.len());
        self.items.drain(from..end);

        let Some(cur) = self.current else {
            return false;
        };

        if cur >= end {
            self.current = Some(cur - (end - from));
            false
        } else if cur >= from {
            self.current = match self.items.is_empty() {
                true => None,
                false => Some(from.min(self.items.len() - 1)),
            };
            true
        } else {
            false
        }
    }

    pub fn on_item_end(&mut self) -> Advance {
        let Some(cur) = self.current else {
            return Advance::Ended;
        };

        match self.repeat {
            RepeatMode::One => Advance::Repeat(cur),
            RepeatMode::All => {
                let next = (cur + 1) % self.items.len();
                self.current = Some(next);
                Advance::Next(next)
            }
            RepeatMode::Off => match cur + 1 < self.items.len() {
                true => {
                    self.current = Some(cur + 1);
                    Advance::Next(cur + 1)
                }
                false => Advance::Ended,
            },
        }
    }

    /// Repeat-one behaves like repeat-off for explicit navigation.
    pub fn skip_next(&mut self) -> Option<usize> {
        let cur = self.current?;
        let next = match cur + 1 < self.items.len() {
            true => cur + 1,
            false if self.repeat == RepeatMode::All => 0,
            false => return None,
        };
        self.current = Some(next);
        Some(next)
    }

    pub fn skip_previous(&mut self, position: Duration) -> Option<Previous> {
        let cur = self.current?;
        if position > MAX_SEEK_TO_PREVIOUS {
            return Some(Previous::Restart);
        }

        let prev = match cur {
            0 if self.repeat == RepeatMode::All => self.items.len() - 1,
            0 => return Some(Previous::Restart),
            c => c - 1,
        };
        self.current = Some(prev);
        Some(Previous::Item(prev))
    }
}
