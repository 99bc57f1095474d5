//! Group-by ranking of the filtered event log.

use std::collections::HashMap;

use serde::Serialize;

use crate::events::ListenEvent;

/// Dimension an event can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupColumn {
    Artist,
    Album,
    Track,
}

impl GroupColumn {
    fn value_of<'a>(&self, event: &'a ListenEvent) -> &'a str {
        match self {
            GroupColumn::Artist => &event.artist,
            GroupColumn::Album => &event.album,
            GroupColumn::Track => &event.track,
        }
    }
}

/// One row of a ranking: the group key (one entry per grouped column, in
/// group-by order) and its play count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub key: Vec<String>,
    pub count: u64,
}

/// Counts events per group and returns the `n` largest groups.
///
/// Sorted descending by count; ties resolve lexicographically ascending on
/// the group key, so output order is deterministic regardless of input
/// order. Empty input yields an empty ranking.
pub fn top_n(events: &[ListenEvent], group_by: &[GroupColumn], n: usize) -> Vec<RankingRow> {
    let mut counts: HashMap<Vec<String>, u64> = HashMap::new();
    for event in events {
        let key: Vec<String> = group_by
            .iter()
            .map(|col| col.value_of(event).to_string())
            .collect();
        *counts.entry(key).or_default() += 1;
    }

    let mut rows: Vec<RankingRow> = counts
        .into_iter()
        .map(|(key, count)| RankingRow { key, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EnergyLevel, MacroGenre, Mood};
    use chrono::NaiveDateTime;

    fn event(artist: &str, album: &str, track: &str) -> ListenEvent {
        ListenEvent {
            played_at: NaiveDateTime::parse_from_str("2023-06-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            artist: artist.into(),
            album: album.into(),
            track: track.into(),
            macro_genre: MacroGenre::Rock,
            energy_level: EnergyLevel::High,
            moods: vec![Mood::Happy],
        }
    }

    #[test]
    fn test_top_n_counts_and_orders() {
        let events = vec![
            event("A", "x", "t1"),
            event("B", "y", "t2"),
            event("A", "x", "t3"),
        ];
        let rows = top_n(&events, &[GroupColumn::Artist], 5);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, vec!["A".to_string()]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].count, 1);
    }

    #[test]
    fn test_ties_break_lexicographically() {
        let events = vec![event("B", "x", "t"), event("A", "y", "t")];
        let rows = top_n(&events, &[GroupColumn::Artist], 5);

        assert_eq!(rows[0].key, vec!["A".to_string()]);
        assert_eq!(rows[1].key, vec!["B".to_string()]);
    }

    #[test]
    fn test_multi_column_key_is_preserved() {
        let events = vec![
            event("A", "First", "t1"),
            event("A", "First", "t2"),
            event("A", "Second", "t3"),
        ];
        let rows = top_n(&events, &[GroupColumn::Album, GroupColumn::Artist], 5);

        assert_eq!(rows[0].key, vec!["First".to_string(), "A".to_string()]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].key, vec!["Second".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_truncates_to_n() {
        let events = vec![event("A", "x", "t"), event("B", "x", "t"), event("C", "x", "t")];
        let rows = top_n(&events, &[GroupColumn::Artist], 2);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_empty_input_yields_empty_ranking() {
        assert!(top_n(&[], &[GroupColumn::Artist], 5).is_empty());
    }

    #[test]
    fn test_top_n_sum_never_exceeds_row_count() {
        let events = vec![
            event("A", "x", "t"),
            event("A", "x", "t"),
            event("B", "x", "t"),
            event("C", "x", "t"),
        ];

        let truncated: u64 = top_n(&events, &[GroupColumn::Artist], 2)
            .iter()
            .map(|r| r.count)
            .sum();
        assert!(truncated <= events.len() as u64);

        // With every distinct group included, counts sum to the row count.
        let full: u64 = top_n(&events, &[GroupColumn::Artist], 10)
            .iter()
            .map(|r| r.count)
            .sum();
        assert_eq!(full, events.len() as u64);
    }
}
