use crate::domain::{TrackInfo, TrackList};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use serde::Deserialize;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use unicode_normalization::UnicodeNormalization;

const MATCH_THRESHOLD: i64 = 50;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Substring,
    Fuzzy,
}

fn normalize(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Tracks whose title or artist contains `query`, ignoring case.
/// An empty query yields the library unchanged.
pub fn filter_tracks(query: &str, library: &TrackList) -> TrackList {
    if query.is_empty() {
        return Arc::clone(library);
    }

    let needle = normalize(query);
    let matches = library
        .iter()
        .filter(|t| {
            normalize(t.get_title()).contains(&needle) || normalize(t.get_artist()).contains(&needle)
        })
        .cloned()
        .collect();

    Arc::new(matches)
}

fn fuzzy_filter(matcher: &SkimMatcherV2, query: &str, library: &TrackList) -> TrackList {
    if query.is_empty() {
        return Arc::clone(library);
    }

    let query = normalize(query);
    let mut scored: Vec<_> = library
        .iter()
        .filter_map(|track| {
            let haystack = normalize(&format!("{} {}", track.get_title(), track.get_artist()));
            matcher
                .fuzzy_match(&haystack, &query)
                .filter(|&score| score > MATCH_THRESHOLD)
                .map(|score| (Arc::clone(track), score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    Arc::new(scored.into_iter().map(|(track, _)| track).collect())
}

/// Debounced projection of the library through the search query.
///
/// Keystrokes only move the deadline; the view is recomputed once the deadline
/// passes, or immediately when the library itself changes.
pub struct SearchFilter {
    mode: SearchMode,
    debounce: Duration,
    matcher: SkimMatcherV2,

    query: String,
    applied: String,
    deadline: Option<Instant>,

    library: TrackList,
    view: TrackList,
}

impl SearchFilter {
    pub fn new(mode: SearchMode, debounce: Duration) -> Self {
        SearchFilter {
            mode,
            debounce,
            matcher: SkimMatcherV2::default(),
            query: String::new(),
            applied: String::new(),
            deadline: None,
            library: TrackList::default(),
            view: TrackList::default(),
        }
    }

    /// Latest query as typed, which may not be reflected in `view` yet.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn view(&self) -> &TrackList {
        &self.view
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn set_query(&mut self, query: impl Into<String>, now: Instant) {
        self.query = query.into();
        self.deadline = Some(now + self.debounce);
    }

    /// Apply the pending query if its debounce window has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                if self.applied != self.query {
                    self.applied = self.query.clone();
                    self.recompute();
                }
                true
            }
            _ => false,
        }
    }

    pub fn on_library_changed(&mut self, library: TrackList) {
        self.library = library;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.view = match self.mode {
            SearchMode::Substring => filter_tracks(&self.applied, &self.library),
            SearchMode::Fuzzy => fuzzy_filter(&self.matcher, &self.applied, &self.library),
        };
        tracing::debug!(query = %self.applied, matches = self.view.len(), "Search view updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Track;

    fn library() -> TrackList {
        let t = |id, title: &str, artist: &str| {
            Arc::new(Track::new(
                id,
                title,
                artist,
                "album",
                Duration::ZERO,
                format!("/music/{id}.flac"),
            ))
        };
        Arc::new(vec![
            t(1, "Blue in Green", "Miles Davis"),
            t(2, "Café Blue", "Ana Moura"),
            t(3, "So What", "Miles Davis"),
            t(4, "Naima", "John Coltrane"),
        ])
    }

    fn ids(view: &TrackList) -> Vec<u64> {
        view.iter().map(|t| t.get_id()).collect()
    }

    #[test]
    fn empty_query_is_identity() {
        let lib = library();
        let view = filter_tracks("", &lib);
        assert!(Arc::ptr_eq(&view, &lib));
    }

    #[test]
    fn matches_title_or_artist_ignoring_case() {
        let lib = library();
        assert_eq!(ids(&filter_tracks("BLUE", &lib)), [1, 2]);
        assert_eq!(ids(&filter_tracks("miles", &lib)), [1, 3]);
        assert_eq!(ids(&filter_tracks("zzz", &lib)), Vec::<u64>::new());
    }

    #[test]
    fn composed_and_decomposed_accents_match() {
        let lib = library();
        // "e" followed by a combining acute accent
        assert_eq!(ids(&filter_tracks("cafe\u{301}", &lib)), [2]);
    }

    #[test]
    fn every_match_contains_query() {
        let lib = library();
        for q in ["a", "i", "da", "so ", "n"] {
            let view = filter_tracks(q, &lib);
            for track in lib.iter() {
                let hit = track.get_title().to_lowercase().contains(q)
                    || track.get_artist().to_lowercase().contains(q);
                assert_eq!(view.iter().any(|t| t.get_id() == track.get_id()), hit, "{q}");
            }
        }
    }

    #[test]
    fn query_applies_only_after_debounce() {
        let start = Instant::now();
        let mut search = SearchFilter::new(SearchMode::Substring, Duration::from_millis(200));
        search.on_library_changed(library());
        assert_eq!(search.view().len(), 4);

        search.set_query("m", start);
        search.set_query("miles", start + Duration::from_millis(100));
        assert!(!search.fire(start + Duration::from_millis(250)));
        assert_eq!(search.view().len(), 4);
        assert_eq!(search.query(), "miles");

        assert!(search.fire(start + Duration::from_millis(300)));
        assert_eq!(search.applied, "miles");
        assert_eq!(ids(search.view()), [1, 3]);
        assert_eq!(search.deadline(), None);
    }

    #[test]
    fn library_change_reuses_applied_query() {
        let start = Instant::now();
        let mut search = SearchFilter::new(SearchMode::Substring, Duration::ZERO);
        search.set_query("naima", start);
        search.fire(start);

        search.on_library_changed(library());
        assert_eq!(ids(search.view()), [4]);
    }

    #[test]
    fn fuzzy_mode_ranks_matches() {
        let start = Instant::now();
        let mut search = SearchFilter::new(SearchMode::Fuzzy, Duration::ZERO);
        search.on_library_changed(library());
        search.set_query("so what", start);
        search.fire(start);

        assert_eq!(search.view().first().map(|t| t.get_id()), Some(3));
    }
}
