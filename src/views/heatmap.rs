//! Weekday-by-hour activity heatmap.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Timelike};
use serde::Serialize;

use crate::events::ListenEvent;
use crate::views::kpi::predominant;

/// Canonical row order, Monday first. Hardcoded: the ordering is an
/// invariant of the view, not a property of the system locale.
pub const WEEKDAY_LABELS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub const HOURS: usize = 24;

/// What each heatmap cell measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMetric {
    Volume,
    Energy,
    Mood,
}

impl HeatmapMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatmapMetric::Volume => "volume",
            HeatmapMetric::Energy => "energy",
            HeatmapMetric::Mood => "mood",
        }
    }
}

impl FromStr for HeatmapMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volume" => Ok(HeatmapMetric::Volume),
            "energy" => Ok(HeatmapMetric::Energy),
            "mood" => Ok(HeatmapMetric::Mood),
            other => Err(format!("unknown heatmap metric '{other}' (expected volume, energy or mood)")),
        }
    }
}

impl fmt::Display for HeatmapMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One heatmap bucket.
///
/// `NoData` keeps an empty bucket distinguishable from every real modal
/// value; it is never encoded as a palette index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatCell {
    Count(u64),
    Modal { label: &'static str, palette: u8 },
    NoData,
}

/// 7 weekday rows (Monday first) by 24 hour columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapMatrix {
    pub metric: HeatmapMetric,
    pub weekdays: [&'static str; 7],
    pub cells: Vec<Vec<HeatCell>>,
}

fn bucket_of(event: &ListenEvent) -> (usize, usize) {
    let weekday = event.played_at.weekday().num_days_from_monday() as usize;
    let hour = event.played_at.hour() as usize;
    (weekday, hour)
}

/// Builds the heatmap for `events` under the given metric.
pub fn build(events: &[ListenEvent], metric: HeatmapMetric) -> HeatmapMatrix {
    let cells = match metric {
        HeatmapMetric::Volume => volume_cells(events),
        HeatmapMetric::Energy => modal_cells(events, |event| vec![event.energy_level], |level| {
            HeatCell::Modal {
                label: level.as_str(),
                palette: level.ordinal(),
            }
        }),
        HeatmapMetric::Mood => modal_cells(events, |event| event.moods.clone(), |mood| {
            HeatCell::Modal {
                label: mood.as_str(),
                palette: mood.palette_index(),
            }
        }),
    };

    HeatmapMatrix {
        metric,
        weekdays: WEEKDAY_LABELS,
        cells,
    }
}

fn volume_cells(events: &[ListenEvent]) -> Vec<Vec<HeatCell>> {
    let mut counts = [[0u64; HOURS]; 7];
    for event in events {
        let (weekday, hour) = bucket_of(event);
        counts[weekday][hour] += 1;
    }

    counts
        .iter()
        .map(|row| row.iter().map(|&n| HeatCell::Count(n)).collect())
        .collect()
}

/// Shared shape of the two categorical modes: collect each event's values
/// into its bucket (fanning out multi-valued fields), then take the bucket
/// mode. Modal ties resolve to the smallest value in the enum's order.
fn modal_cells<T, F, E>(events: &[ListenEvent], values_of: F, encode: E) -> Vec<Vec<HeatCell>>
where
    T: Ord + Copy,
    F: Fn(&ListenEvent) -> Vec<T>,
    E: Fn(T) -> HeatCell,
{
    let mut buckets: Vec<Vec<Vec<T>>> = vec![vec![Vec::new(); HOURS]; 7];
    for event in events {
        let (weekday, hour) = bucket_of(event);
        buckets[weekday][hour].extend(values_of(event));
    }

    buckets
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|bucket| match predominant(bucket) {
                    Some(value) => encode(value),
                    None => HeatCell::NoData,
                })
                .collect()
        })
        .collect()
}
