//! Date-range and genre filtering of the event log.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::events::{ListenEvent, MacroGenre};

/// User-selected filter over the event log.
///
/// Both date bounds are inclusive. An empty genre set means "no genre
/// filter": everything passes. Excluding every genre would only ever
/// produce an empty dashboard, so that state is not representable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSpec {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub genres: BTreeSet<MacroGenre>,
}

impl FilterSpec {
    /// Default spec covering the full date span of `events` with no genre
    /// restriction. `None` when the log is empty.
    pub fn full_span(events: &[ListenEvent]) -> Option<Self> {
        let mut dates = events.iter().map(|e| e.played_at.date());
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

        Some(FilterSpec {
            start_date: start,
            end_date: end,
            genres: BTreeSet::new(),
        })
    }

    pub fn matches(&self, event: &ListenEvent) -> bool {
        let date = event.played_at.date();
        let in_range = self.start_date <= date && date <= self.end_date;
        let in_genres = self.genres.is_empty() || self.genres.contains(&event.macro_genre);
        in_range && in_genres
    }
}

/// Applies `spec` to `events`, returning the surviving rows.
///
/// Pure: the input slice is never mutated.
pub fn apply(events: &[ListenEvent], spec: &FilterSpec) -> Vec<ListenEvent> {
    events
        .iter()
        .filter(|e| spec.matches(e))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EnergyLevel, Mood};
    use chrono::NaiveDateTime;

    fn event(ts: &str, genre: MacroGenre) -> ListenEvent {
        ListenEvent {
            played_at: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            artist: "a".into(),
            album: "b".into(),
            track: "c".into(),
            macro_genre: genre,
            energy_level: EnergyLevel::Medium,
            moods: vec![Mood::Happy],
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample() -> Vec<ListenEvent> {
        vec![
            event("2023-06-01 08:00:00", MacroGenre::Rock),
            event("2023-06-15 23:59:59", MacroGenre::Pop),
            event("2023-07-01 12:00:00", MacroGenre::Metal),
        ]
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let spec = FilterSpec {
            start_date: date("2023-06-01"),
            end_date: date("2023-06-15"),
            genres: BTreeSet::new(),
        };
        let filtered = apply(&sample(), &spec);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_single_day_range() {
        let spec = FilterSpec {
            start_date: date("2023-06-15"),
            end_date: date("2023-06-15"),
            genres: BTreeSet::new(),
        };
        let filtered = apply(&sample(), &spec);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].macro_genre, MacroGenre::Pop);
    }

    #[test]
    fn test_empty_genre_set_passes_all() {
        let spec = FilterSpec::full_span(&sample()).unwrap();
        assert!(spec.genres.is_empty());
        assert_eq!(apply(&sample(), &spec).len(), 3);
    }

    #[test]
    fn test_genre_predicate() {
        let mut spec = FilterSpec::full_span(&sample()).unwrap();
        spec.genres = [MacroGenre::Rock, MacroGenre::Metal].into_iter().collect();

        let filtered = apply(&sample(), &spec);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|e| e.macro_genre != MacroGenre::Pop));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let spec = FilterSpec {
            start_date: date("2023-06-01"),
            end_date: date("2023-06-30"),
            genres: [MacroGenre::Rock, MacroGenre::Pop].into_iter().collect(),
        };
        let once = apply(&sample(), &spec);
        let twice = apply(&once, &spec);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_full_span_is_lossless() {
        let events = sample();
        let spec = FilterSpec::full_span(&events).unwrap();
        assert_eq!(apply(&events, &spec), events);
    }

    #[test]
    fn test_full_span_of_empty_log() {
        assert!(FilterSpec::full_span(&[]).is_none());
    }

    #[test]
    fn test_full_span_ignores_event_order() {
        let mut events = sample();
        events.reverse();
        let spec = FilterSpec::full_span(&events).unwrap();
        assert_eq!(spec.start_date, date("2023-06-01"));
        assert_eq!(spec.end_date, date("2023-07-01"));
    }
}
