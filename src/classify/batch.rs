//! Sequential batch runner over the ranked artist table.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use super::classifier::Classifier;
use super::provider::ChatModel;
use crate::events::{EnergyLevel, MacroGenre, Mood};
use crate::loader::DataLoadError;

pub const DEFAULT_TOP_N: usize = 1000;

/// Pause between successive model calls. Sequential processing plus this
/// delay is the pipeline's whole rate-limiting story.
const CALL_THROTTLE: Duration = Duration::from_millis(300);

/// One output row of the classification table.
#[derive(Debug, Serialize)]
struct ClassificationRecord {
    artist_clean: String,
    macro_genre: MacroGenre,
    sub_genre: String,
    energy_level: EnergyLevel,
    mood: String,
}

/// Reads the ranked artist-frequency table, preserving its order.
///
/// The input is already sorted by descending play count; rank is taken as
/// given, never re-derived.
pub fn read_artist_ranking(path: &Path) -> Result<Vec<String>, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::Missing {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers()?.clone();
    let artist_idx = headers
        .iter()
        .position(|h| h == "artist_clean")
        .ok_or(DataLoadError::MissingColumn {
            path: path.to_path_buf(),
            column: "artist_clean",
        })?;

    let mut artists = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(artist) = record.get(artist_idx) {
            artists.push(artist.to_string());
        }
    }

    Ok(artists)
}

/// Classifies the top `top_n` artists from `input` and writes the
/// classification table to `output`. Returns the number of rows written.
///
/// Artists are processed sequentially in rank order. A failed classification
/// has already degraded to the fallback record by the time it gets here, so
/// the batch always produces one row per artist.
#[tracing::instrument(skip(model), fields(input = %input.display(), output = %output.display(), top_n))]
pub async fn run<M: ChatModel>(
    model: M,
    input: &Path,
    output: &Path,
    top_n: usize,
) -> Result<usize> {
    let artists = read_artist_ranking(input)?;
    let total = artists.len().min(top_n);
    info!(total, "Classifying top artists");

    let classifier = Classifier::new(model);
    let mut records = Vec::with_capacity(total);

    for (i, artist) in artists.into_iter().take(top_n).enumerate() {
        info!(rank = i + 1, total, artist = %artist, "Classifying artist");

        let label = classifier.classify(&artist).await;
        records.push(ClassificationRecord {
            artist_clean: label.artist,
            macro_genre: label.macro_genre,
            sub_genre: label.sub_genre,
            energy_level: label.energy_level,
            mood: Mood::join_list(&label.moods),
        });

        if i + 1 < total {
            tokio::time::sleep(CALL_THROTTLE).await;
        }
    }

    write_classifications(output, &records)?;
    info!(count = records.len(), "Classification batch complete");
    Ok(records.len())
}

fn write_classifications(path: &Path, records: &[ClassificationRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
