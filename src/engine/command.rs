use super::EngineItem;
use crate::domain::RepeatMode;
use std::time::Duration;

pub(crate) enum EngineCommand {
    Load {
        items: Vec<EngineItem>,
        start_index: usize,
        start_position: Duration,
    },
    Play,
    Pause,
    Seek(Duration),
    SkipNext,
    SkipPrevious,
    Move {
        from: usize,
        to: usize,
    },
    Insert {
        at: usize,
        items: Vec<EngineItem>,
    },
    Remove {
        from: usize,
        count: usize,
    },
    SetRepeat(RepeatMode),
    SetShuffle(bool),
    Shutdown,
}
