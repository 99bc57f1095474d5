//! Headline KPIs for the filtered period.
//!
//! The predominant-value KPIs are mode-over-a-single-column aggregations;
//! mood expands its multi-valued field first, so an event tagged
//! "happy, calm" contributes one count to each tag.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::events::{EnergyLevel, ListenEvent, MacroGenre, Mood};

/// Summary figures shown at the top of the dashboard.
///
/// Predominant values are `None` on an empty filtered set; the presentation
/// layer renders that as a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_plays: usize,
    pub top_genre: Option<MacroGenre>,
    pub top_energy: Option<EnergyLevel>,
    pub top_mood: Option<Mood>,
}

/// Most frequent value in `values`, or `None` when empty.
///
/// Ties resolve to the smallest value in the type's order, keeping the
/// result independent of input order.
pub fn predominant<T: Ord>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, u64> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(value, _)| value)
}

pub fn summarize(events: &[ListenEvent]) -> Kpis {
    Kpis {
        total_plays: events.len(),
        top_genre: predominant(events.iter().map(|e| e.macro_genre)),
        top_energy: predominant(events.iter().map(|e| e.energy_level)),
        top_mood: predominant(events.iter().flat_map(|e| e.moods.iter().copied())),
    }
}
