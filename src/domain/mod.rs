mod filetype;
mod repeat;
mod track;

pub use filetype::FileType;
pub use repeat::RepeatMode;
pub use track::{Track, TrackList};

use std::time::Duration;

pub trait TrackInfo {
    fn get_id(&self) -> u64;
    fn get_title(&self) -> &str;
    fn get_artist(&self) -> &str;
    fn get_album(&self) -> &str;
    fn get_duration(&self) -> Duration;
    fn get_duration_str(&self) -> String;
}
