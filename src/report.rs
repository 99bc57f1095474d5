//! Report assembly and persistence.
//!
//! [`DashboardReport`] is the presenter boundary: everything the UI renders,
//! computed in one pass over the filtered log and serialized as JSON.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::events::ListenEvent;
use crate::filter::{self, FilterSpec};
use crate::views::heatmap::{self, HeatmapMatrix, HeatmapMetric};
use crate::views::kpi::{self, Kpis};
use crate::views::rank::{self, GroupColumn, RankingRow};
use crate::views::stream::{self, StreamCategory, StreamMatrix};

/// How many rows each ranking carries by default.
pub const DEFAULT_RANKING_SIZE: usize = 5;

#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub filter: FilterSpec,
    pub kpis: Kpis,
    pub top_artists: Vec<RankingRow>,
    pub top_albums: Vec<RankingRow>,
    pub top_tracks: Vec<RankingRow>,
    pub stream: StreamMatrix,
    pub heatmap: HeatmapMatrix,
}

/// Filters `events` by `spec` and computes every view over the result.
///
/// The three view families are independent computations over the same
/// filtered slice; none of them mutates shared state.
#[tracing::instrument(skip(events, spec), fields(events = events.len()))]
pub fn build(
    events: &[ListenEvent],
    spec: &FilterSpec,
    ranking_size: usize,
    stream_by: StreamCategory,
    heatmap_metric: HeatmapMetric,
) -> DashboardReport {
    let filtered = filter::apply(events, spec);
    info!(filtered = filtered.len(), "Filter applied");

    DashboardReport {
        generated_at: Utc::now(),
        filter: spec.clone(),
        kpis: kpi::summarize(&filtered),
        top_artists: rank::top_n(&filtered, &[GroupColumn::Artist], ranking_size),
        top_albums: rank::top_n(
            &filtered,
            &[GroupColumn::Album, GroupColumn::Artist],
            ranking_size,
        ),
        top_tracks: rank::top_n(
            &filtered,
            &[GroupColumn::Track, GroupColumn::Artist],
            ranking_size,
        ),
        stream: stream::build(&filtered, stream_by),
        heatmap: heatmap::build(&filtered, heatmap_metric),
    }
}

/// Writes the report as pretty-printed JSON to `path`.
pub fn write_json(path: &str, report: &DashboardReport) -> Result<()> {
    std::fs::write(path, serde_json::to_vec_pretty(report)?)?;
    info!(path, "Report written");
    Ok(())
}

/// Prints the report as pretty-printed JSON to stdout.
pub fn print_json(report: &DashboardReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EnergyLevel, MacroGenre, Mood};
    use chrono::NaiveDateTime;
    use std::env;
    use std::fs;

    fn event(ts: &str, artist: &str, genre: MacroGenre) -> ListenEvent {
        ListenEvent {
            played_at: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            artist: artist.into(),
            album: format!("{artist} album"),
            track: format!("{artist} track"),
            macro_genre: genre,
            energy_level: EnergyLevel::High,
            moods: vec![Mood::Happy],
        }
    }

    fn sample() -> Vec<ListenEvent> {
        vec![
            event("2023-06-01 10:00:00", "A", MacroGenre::Rock),
            event("2023-06-02 11:00:00", "A", MacroGenre::Rock),
            event("2023-06-03 12:00:00", "B", MacroGenre::Pop),
        ]
    }

    #[test]
    fn test_report_covers_all_views() {
        let events = sample();
        let spec = FilterSpec::full_span(&events).unwrap();
        let report = build(
            &events,
            &spec,
            DEFAULT_RANKING_SIZE,
            StreamCategory::Genre,
            HeatmapMetric::Volume,
        );

        assert_eq!(report.kpis.total_plays, 3);
        assert_eq!(report.kpis.top_genre, Some(MacroGenre::Rock));
        assert_eq!(report.top_artists[0].key, vec!["A".to_string()]);
        assert_eq!(report.top_albums[0].key, vec!["A album".to_string(), "A".to_string()]);
        assert_eq!(report.stream.months, vec!["2023-06"]);
        assert_eq!(report.heatmap.cells.len(), 7);
    }

    #[test]
    fn test_report_on_empty_filter_result() {
        let events = sample();
        let mut spec = FilterSpec::full_span(&events).unwrap();
        spec.genres = [MacroGenre::Reggae].into_iter().collect();

        let report = build(
            &events,
            &spec,
            DEFAULT_RANKING_SIZE,
            StreamCategory::Mood,
            HeatmapMetric::Energy,
        );

        assert_eq!(report.kpis.total_plays, 0);
        assert_eq!(report.kpis.top_mood, None);
        assert!(report.top_artists.is_empty());
        assert!(report.stream.months.is_empty());
        // the heatmap grid keeps its shape, every bucket empty
        assert!(report
            .heatmap
            .cells
            .iter()
            .all(|row| row.iter().all(|c| *c == heatmap::HeatCell::NoData)));
    }

    #[test]
    fn test_write_json_round_trips_as_valid_json() {
        let events = sample();
        let spec = FilterSpec::full_span(&events).unwrap();
        let report = build(
            &events,
            &spec,
            DEFAULT_RANKING_SIZE,
            StreamCategory::Genre,
            HeatmapMetric::Volume,
        );

        let path = env::temp_dir().join("scrobble_stats_report.json");
        write_json(path.to_str().unwrap(), &report).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed["kpis"]["total_plays"], 3);
        assert_eq!(parsed["kpis"]["top_genre"], "rock");

        fs::remove_file(&path).unwrap();
    }
}
