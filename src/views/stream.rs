//! Month-by-category composition matrix backing the streamgraph.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::events::ListenEvent;
use crate::views::utility::mean;

/// Dimension the stream bands are split by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamCategory {
    Genre,
    Mood,
    Energy,
}

impl StreamCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamCategory::Genre => "genre",
            StreamCategory::Mood => "mood",
            StreamCategory::Energy => "energy",
        }
    }
}

impl FromStr for StreamCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genre" => Ok(StreamCategory::Genre),
            "mood" => Ok(StreamCategory::Mood),
            "energy" => Ok(StreamCategory::Energy),
            other => Err(format!("unknown stream category '{other}' (expected genre, mood or energy)")),
        }
    }
}

impl fmt::Display for StreamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wide-format pivot of play counts per calendar month and category value.
///
/// `counts` has one row per entry of `months` and one column per entry of
/// `categories`; absent combinations are exactly 0. `categories` is already
/// in display order (ascending per-column mean across months, which keeps
/// band crossings low in a stacked layout). `baseline` centers each month's
/// stack around zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamMatrix {
    pub category: StreamCategory,
    pub months: Vec<String>,
    pub categories: Vec<String>,
    pub counts: Vec<Vec<u64>>,
    pub baseline: Vec<f64>,
}

impl StreamMatrix {
    /// Total plays per month.
    pub fn totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Upper edge of each rendered band, stacking cumulatively from the
    /// centered baseline. Outer index follows `categories`, inner index
    /// follows `months`; the last band's edge sits at `+total/2`.
    pub fn bands(&self) -> Vec<Vec<f64>> {
        let mut running = self.baseline.clone();
        let mut bands = Vec::with_capacity(self.categories.len());
        for c in 0..self.categories.len() {
            for (m, edge) in running.iter_mut().enumerate() {
                *edge += self.counts[m][c] as f64;
            }
            bands.push(running.clone());
        }
        bands
    }
}

fn labels_for(event: &ListenEvent, category: StreamCategory) -> Vec<&'static str> {
    match category {
        StreamCategory::Genre => vec![event.macro_genre.as_str()],
        StreamCategory::Energy => vec![event.energy_level.as_str()],
        // Fan-out: an event tagged with two moods counts once in each band.
        StreamCategory::Mood => event.moods.iter().map(|m| m.as_str()).collect(),
    }
}

/// Builds the stream matrix for `events`, split by `category`.
pub fn build(events: &[ListenEvent], category: StreamCategory) -> StreamMatrix {
    let mut cell_counts: BTreeMap<(String, &'static str), u64> = BTreeMap::new();
    let mut months: BTreeSet<String> = BTreeSet::new();
    let mut labels: BTreeSet<&'static str> = BTreeSet::new();

    for event in events {
        let event_labels = labels_for(event, category);
        if event_labels.is_empty() {
            // An event with no mood tags has nothing to contribute to the
            // mood view.
            continue;
        }

        let month = event.played_at.format("%Y-%m").to_string();
        months.insert(month.clone());
        for label in event_labels {
            labels.insert(label);
            *cell_counts.entry((month.clone(), label)).or_default() += 1;
        }
    }

    // YYYY-MM sorts lexicographically in calendar order.
    let months: Vec<String> = months.into_iter().collect();
    let labels: Vec<&'static str> = labels.into_iter().collect();

    let grid: Vec<Vec<u64>> = months
        .iter()
        .map(|month| {
            labels
                .iter()
                .map(|label| {
                    cell_counts
                        .get(&(month.clone(), *label))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    let col_means: Vec<f64> = (0..labels.len())
        .map(|c| {
            let series: Vec<f64> = grid.iter().map(|row| row[c] as f64).collect();
            mean(&series)
        })
        .collect();

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        col_means[a]
            .partial_cmp(&col_means[b])
            .unwrap_or(Ordering::Equal)
            .then_with(|| labels[a].cmp(labels[b]))
    });

    let categories: Vec<String> = order.iter().map(|&c| labels[c].to_string()).collect();
    let counts: Vec<Vec<u64>> = grid
        .iter()
        .map(|row| order.iter().map(|&c| row[c]).collect())
        .collect();
    let baseline: Vec<f64> = counts
        .iter()
        .map(|row| -(row.iter().sum::<u64>() as f64) / 2.0)
        .collect();

    StreamMatrix {
        category,
        months,
        categories,
        counts,
        baseline,
    }
}
