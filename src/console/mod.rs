//! Line-oriented front end. It only reads `SessionView`s and issues commands.

mod action;

pub use action::parse_line;

use crate::{
    DurationStyle, Session,
    domain::{TrackInfo, TrackList},
    get_readable_duration,
    session::SessionView,
};
use anyhow::Result;
use std::{
    io::{self, BufRead, Write},
    time::Duration,
};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    // Playback
    TogglePause,
    PlayNext,
    PlayPrev,
    Seek(Duration),
    CycleRepeat,

    // Queue
    PlayTrack(usize),
    JumpTo(usize),
    ShuffleAll,
    ToggleShuffle,
    Unshuffle,

    // Library & display
    Search(String),
    UpdateLibrary,
    ListLibrary,
    ListQueue,
    Status,
    Quit,
}

pub fn run(session: &Session) -> Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout().lock();

    writeln!(out, "cadence ready, type `status`, `ls`, or `quit`")?;
    prompt(&mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            prompt(&mut out)?;
            continue;
        }

        match parse_line(&line) {
            Some(Action::Quit) => break,
            Some(action) => {
                if let Err(e) = dispatch(session, action, &mut out) {
                    tracing::warn!(error = %e, "Command failed");
                    writeln!(out, "error: {e}")?;
                }
            }
            None => writeln!(out, "unknown command: {}", line.trim())?,
        }
        prompt(&mut out)?;
    }

    Ok(())
}

fn dispatch(session: &Session, action: Action, out: &mut impl Write) -> Result<()> {
    let view = session.view();

    match action {
        Action::TogglePause => session.toggle_play_pause()?,
        Action::PlayNext => session.next()?,
        Action::PlayPrev => session.previous()?,
        Action::Seek(pos) => session.seek(pos)?,
        Action::CycleRepeat => session.toggle_repeat_mode()?,

        Action::PlayTrack(n) => match view.filtered.get(n) {
            Some(track) => session.tap_track(track.clone())?,
            None => writeln!(out, "no track #{}", n + 1)?,
        },
        Action::JumpTo(n) => session.select_from_queue(n)?,
        Action::ShuffleAll => session.shuffle_and_play_all()?,
        Action::ToggleShuffle => session.toggle_shuffle_preserving_current()?,
        Action::Unshuffle => session.restore_library_order()?,

        Action::Search(query) => session.set_search_query(query)?,
        Action::UpdateLibrary => session.request_library_load()?,
        Action::ListLibrary => print_tracks(out, &view.filtered, None)?,
        Action::ListQueue => print_tracks(out, &view.queue, view.current_index)?,
        Action::Status => print_status(out, &view)?,
        Action::Quit => {}
    }
    Ok(())
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

fn print_tracks(out: &mut impl Write, tracks: &TrackList, current: Option<usize>) -> io::Result<()> {
    if tracks.is_empty() {
        return writeln!(out, "(empty)");
    }

    for (idx, track) in tracks.iter().enumerate() {
        let marker = match Some(idx) == current {
            true => '>',
            false => ' ',
        };
        writeln!(
            out,
            "{marker}{:>4}  {} - {}  [{}]",
            idx + 1,
            track.get_artist(),
            track.get_title(),
            track.get_duration_str()
        )?;
    }
    Ok(())
}

fn print_status(out: &mut impl Write, view: &SessionView) -> io::Result<()> {
    let state = match (view.connected, view.is_playing) {
        (false, _) => "disconnected",
        (true, true) => "playing",
        (true, false) => "paused",
    };

    match &view.current_song {
        Some(song) => writeln!(
            out,
            "[{state}] {} - {}  {} / {}",
            song.get_artist(),
            song.get_title(),
            get_readable_duration(view.position, DurationStyle::Compact),
            get_readable_duration(view.duration, DurationStyle::Compact),
        )?,
        None => writeln!(out, "[{state}] nothing loaded")?,
    }

    writeln!(
        out,
        "queue {}  shuffle {}  repeat {}  library {}  filter \"{}\" ({})",
        view.queue.len(),
        if view.shuffle_enabled { "on" } else { "off" },
        view.repeat_mode,
        view.library.len(),
        view.search_query,
        view.filtered.len(),
    )?;

    if let Some(e) = &view.last_error {
        writeln!(out, "last error: {e}")?;
    }
    Ok(())
}
