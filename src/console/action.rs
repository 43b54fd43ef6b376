use super::Action;
use std::time::Duration;

/// Map one input line to an `Action`. Indices are typed 1-based, as listed.
pub fn parse_line(line: &str) -> Option<Action> {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match (cmd, arg) {
        ("ls", "") => Some(Action::ListLibrary),
        ("queue" | "q", "") => Some(Action::ListQueue),
        ("search" | "/", query) => Some(Action::Search(query.to_string())),
        ("play" | "p", n) => index(n).map(Action::PlayTrack),
        ("jump" | "j", n) => index(n).map(Action::JumpTo),
        ("shuffle-all", "") => Some(Action::ShuffleAll),
        ("shuffle", "") => Some(Action::ToggleShuffle),
        ("unshuffle", "") => Some(Action::Unshuffle),
        ("toggle" | "t", "") => Some(Action::TogglePause),
        ("seek", secs) => secs
            .parse::<u64>()
            .ok()
            .map(|s| Action::Seek(Duration::from_secs(s))),
        ("next" | "n", "") => Some(Action::PlayNext),
        ("prev", "") => Some(Action::PlayPrev),
        ("repeat" | "r", "") => Some(Action::CycleRepeat),
        ("rescan", "") => Some(Action::UpdateLibrary),
        ("status" | "s", "") => Some(Action::Status),
        ("quit" | "exit", "") => Some(Action::Quit),
        _ => None,
    }
}

fn index(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_commands() {
        assert_eq!(parse_line("ls"), Some(Action::ListLibrary));
        assert_eq!(parse_line("  toggle "), Some(Action::TogglePause));
        assert_eq!(parse_line("repeat"), Some(Action::CycleRepeat));
        assert_eq!(parse_line("quit"), Some(Action::Quit));
        assert_eq!(parse_line("dance"), None);
        assert_eq!(parse_line("ls extra"), None);
    }

    #[test]
    fn indices_are_one_based() {
        assert_eq!(parse_line("play 1"), Some(Action::PlayTrack(0)));
        assert_eq!(parse_line("jump 12"), Some(Action::JumpTo(11)));
        assert_eq!(parse_line("play 0"), None);
        assert_eq!(parse_line("play x"), None);
    }

    #[test]
    fn search_keeps_inner_spaces() {
        assert_eq!(
            parse_line("search miles  davis"),
            Some(Action::Search("miles  davis".into()))
        );
        assert_eq!(parse_line("search"), Some(Action::Search(String::new())));
    }

    #[test]
    fn seek_takes_seconds() {
        assert_eq!(
            parse_line("seek 95"),
            Some(Action::Seek(Duration::from_secs(95)))
        );
        assert_eq!(parse_line("seek -3"), None);
    }
}
