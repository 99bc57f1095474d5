//! Loading and caching of the enriched listening log.
//!
//! [`EventStore`] is the data-access object both pipelines share: it parses a
//! source CSV at most once per process and hands out `Arc` clones of the
//! immutable event table on every subsequent request.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::events::{EnergyLevel, ListenEvent, MacroGenre, Mood};

/// Columns the enriched log must provide. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "played_at_br",
    "artist_clean",
    "album",
    "track",
    "macro_genre",
    "energy_level",
    "mood",
];

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("event log not found at '{}'", path.display())]
    Missing { path: PathBuf },
    #[error("'{}' is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("'{}' data row {row}: {message}", path.display())]
    InvalidRow {
        path: PathBuf,
        row: usize,
        message: String,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Raw CSV row as it appears on disk, before schema validation.
#[derive(Debug, Deserialize)]
struct RawEvent {
    played_at_br: String,
    artist_clean: String,
    album: String,
    track: String,
    macro_genre: String,
    energy_level: String,
    mood: String,
}

impl RawEvent {
    fn into_event(self) -> Result<ListenEvent, String> {
        Ok(ListenEvent {
            played_at: parse_played_at(&self.played_at_br)?,
            artist: self.artist_clean,
            album: self.album,
            track: self.track,
            macro_genre: self.macro_genre.parse::<MacroGenre>()?,
            energy_level: self.energy_level.parse::<EnergyLevel>()?,
            moods: Mood::parse_list(&self.mood)?,
        })
    }
}

/// Parses the `played_at_br` column into naive local time.
///
/// The source is assumed to already be in local time; an offset annotation,
/// when present, is stripped (the clock reading is kept as written) rather
/// than converted.
fn parse_played_at(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }

    Err(format!("unrecognized timestamp '{raw}'"))
}

/// Reads and validates the full event log from `path`.
///
/// The header row is checked against [`REQUIRED_COLUMNS`] up front so a
/// malformed export fails at startup instead of deep inside an aggregation.
pub fn read_events(path: &Path) -> Result<Vec<ListenEvent>, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::Missing {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DataLoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let mut events = Vec::new();
    for (i, result) in rdr.deserialize::<RawEvent>().enumerate() {
        let raw = result?;
        let event = raw.into_event().map_err(|message| DataLoadError::InvalidRow {
            path: path.to_path_buf(),
            row: i + 1,
            message,
        })?;
        events.push(event);
    }

    info!(path = %path.display(), events = events.len(), "Event log loaded");
    Ok(events)
}

/// Memoizing store for event logs, keyed by canonicalized source path.
///
/// Owned by the caller and passed by reference; there is no process-global
/// cache. Loaded tables are immutable, so handing out `Arc` clones is safe
/// for concurrent read-only use.
pub struct EventStore {
    cache: Mutex<HashMap<PathBuf, Arc<Vec<ListenEvent>>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the event table for `path`, reading it on first access only.
    pub fn load(&self, path: &Path) -> Result<Arc<Vec<ListenEvent>>, DataLoadError> {
        if !path.exists() {
            return Err(DataLoadError::Missing {
                path: path.to_path_buf(),
            });
        }
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(cached) = self.cache.lock().unwrap().get(&key) {
            debug!(path = %key.display(), "Event log cache hit");
            return Ok(Arc::clone(cached));
        }

        let events = Arc::new(read_events(path)?);
        self.cache
            .lock()
            .unwrap()
            .insert(key, Arc::clone(&events));
        Ok(events)
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn write_sample_csv(name: &str, body: &str) -> PathBuf {
        let path = temp_path(name);
        fs::write(&path, body).unwrap();
        path
    }

    const SAMPLE: &str = "\
played_at_br,artist_clean,album,track,macro_genre,energy_level,mood
2023-06-01 10:00:00,Boards of Canada,Geogaddi,Gyroscope,electronic,low,\"calm, psychedelic\"
2023-06-15T22:30:00,Gojira,Magma,Silvera,metal,very_high,aggressive
";

    #[test]
    fn test_read_events_parses_rows() {
        let path = write_sample_csv("scrobble_stats_load_ok.csv", SAMPLE);
        let events = read_events(&path).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].artist, "Boards of Canada");
        assert_eq!(events[0].macro_genre, MacroGenre::Electronic);
        assert_eq!(events[0].moods, vec![Mood::Calm, Mood::Psychedelic]);
        assert_eq!(events[1].energy_level, EnergyLevel::VeryHigh);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_distinct_error() {
        let err = read_events(Path::new("/no/such/scrobbles.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Missing { .. }));
    }

    #[test]
    fn test_missing_column_is_reported_by_name() {
        let body = "played_at_br,artist_clean,album,track,macro_genre,energy_level\n";
        let path = write_sample_csv("scrobble_stats_load_nocol.csv", body);

        let err = read_events(&path).unwrap_err();
        match err {
            DataLoadError::MissingColumn { column, .. } => assert_eq!(column, "mood"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_enum_value_fails_with_row_number() {
        let body = "\
played_at_br,artist_clean,album,track,macro_genre,energy_level,mood
2023-06-01 10:00:00,X,Y,Z,polka,low,calm
";
        let path = write_sample_csv("scrobble_stats_load_badrow.csv", body);

        let err = read_events(&path).unwrap_err();
        match err {
            DataLoadError::InvalidRow { row, message, .. } => {
                assert_eq!(row, 1);
                assert!(message.contains("macro_genre"));
            }
            other => panic!("expected InvalidRow, got {other:?}"),
        }

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_timezone_annotation_is_stripped_not_converted() {
        let body = "\
played_at_br,artist_clean,album,track,macro_genre,energy_level,mood
2023-06-01T10:00:00-03:00,X,Y,Z,rock,high,happy
";
        let path = write_sample_csv("scrobble_stats_load_tz.csv", body);

        let events = read_events(&path).unwrap();
        // The local clock reading survives, the offset does not.
        assert_eq!(
            events[0].played_at,
            NaiveDateTime::parse_from_str("2023-06-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_store_memoizes_per_source() {
        let path = write_sample_csv("scrobble_stats_store_memo.csv", SAMPLE);
        let store = EventStore::new();

        let first = store.load(&path).unwrap();
        let second = store.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        fs::remove_file(&path).unwrap();
    }
}
