use crate::domain::FileType;
use anyhow::{Result, anyhow};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source, decoder::builder::SeekMode};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

/// Whatever actually produces sound for the engine thread.
///
/// Implementations are created on that thread and never leave it, so they do
/// not need to be `Send`.
pub trait AudioBackend {
    /// Replace the active source, left paused at `start`.
    /// Returns the source length when the decoder knows it.
    fn load(&mut self, locator: &str, start: Duration) -> Result<Option<Duration>>;
    fn resume(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position: Duration) -> Result<()>;
    fn position(&self) -> Duration;
    fn is_paused(&self) -> bool;
    /// True once a loaded source has been played through.
    fn finished(&self) -> bool;
}

pub struct RodioBackend {
    sink: Sink,
    loaded: bool,
    _stream: OutputStream,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        Ok(Self {
            sink,
            loaded: false,
            _stream: stream,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn load(&mut self, locator: &str, start: Duration) -> Result<Option<Duration>> {
        let source = decode(Path::new(locator))?;
        let length = source.total_duration();

        // clear() leaves the sink paused
        self.sink.clear();
        self.sink.append(source);
        self.loaded = true;

        if !start.is_zero() {
            self.sink
                .try_seek(start)
                .map_err(|e| anyhow!("Seek to {start:?} failed: {e}"))?;
        }

        Ok(length)
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.clear();
        self.loaded = false;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.sink
            .try_seek(position)
            .map_err(|e| anyhow!("Seek to {position:?} failed: {e}"))
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn finished(&self) -> bool {
        self.loaded && self.sink.empty()
    }
}

fn decode(song: &Path) -> Result<Decoder<BufReader<File>>> {
    let path = PathBuf::from(&song);
    let file = File::open(&path)?;
    let len = file.metadata()?.len();

    let mut builder = Decoder::builder()
        .with_data(BufReader::new(file))
        .with_byte_len(len)
        .with_seek_mode(SeekMode::Fastest)
        .with_seekable(true);

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        builder = builder.with_hint(FileType::decoder_hint(ext));
    }

    Ok(builder.build()?)
}
