//! # Library Input Model
//!
//! The data handed over by the external fetch/cache collaborator: a flat list
//! of [`Track`]s and an [`ArtistMap`] from artist id to name and genre labels.
//! Musemap never fetches anything itself; the [`LibrarySource`] trait marks
//! the seam, and [`JsonLibrary`] reads a library exported to a JSON file.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "tracks": [
//!     {
//!       "id": "4uLU6hMCjMI75M1A2tKUQC",
//!       "name": "Never Gonna Give You Up",
//!       "artists": [{ "id": "0gxyHStUsqpMadRV0Di1Qt", "name": "Rick Astley" }],
//!       "album": { "id": "6XhjNHCyCDyyGJRM5mg40G", "name": "Whenever You Need Somebody" },
//!       "duration_ms": 213573,
//!       "added_at": "2021-03-14T09:26:53Z",
//!       "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC"
//!     }
//!   ],
//!   "artists": {
//!     "0gxyHStUsqpMadRV0Di1Qt": { "name": "Rick Astley", "genres": ["dance pop", "new wave pop"] }
//!   }
//! }
//! ```
//!
//! `added_at` may be an RFC 3339 string, a plain `YYYY-MM-DD` date, integer
//! epoch milliseconds or `null`. Anything else is treated as missing, which
//! makes the track "always active" for the time cursor.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reference from a track to one of its artists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Album a track belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A saved track, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: AlbumRef,
    #[serde(default)]
    pub duration_ms: u64,
    /// When the track was added to the library, epoch milliseconds
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub added_at: Option<i64>,
    #[serde(default)]
    pub uri: String,
}

/// Name and genre labels of one artist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistGenreInfo {
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Lookup from artist id to its genre information.
pub type ArtistMap = HashMap<String, ArtistGenreInfo>;

/// Materialized library: everything one analysis run consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub artists: ArtistMap,
}

impl Library {
    /// Earliest and latest dated `added_at` across all tracks.
    #[must_use]
    pub fn time_range(&self) -> Option<(i64, i64)> {
        time_range(&self.tracks)
    }
}

/// Earliest and latest dated `added_at` of `tracks`, `None` when nothing is dated.
#[must_use]
pub fn time_range(tracks: &[Track]) -> Option<(i64, i64)> {
    tracks
        .iter()
        .filter_map(|t| t.added_at)
        .fold(None, |range, t| match range {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
}

/// Parse a timestamp as RFC 3339, a plain date or integer epoch milliseconds.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).timestamp_millis());
    }
    raw.parse::<i64>().ok()
}

/// Render epoch milliseconds as an RFC 3339 UTC string.
#[must_use]
pub fn format_timestamp(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| millis.to_string(), |dt| dt.to_rfc3339())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        _ => None,
    })
}

/// Shared cancellation flag for library loads.
///
/// Cloning shares the flag. A cancelled load must fail rather than hand
/// partial results to the aggregation pipeline.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Error out when cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            bail!("Library load was cancelled");
        }
        Ok(())
    }
}

/// Seam to the collaborator that fetches and caches the library.
pub trait LibrarySource {
    /// Load the complete library.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or `cancel` is raised before the
    /// library is complete.
    fn load(&self, cancel: &CancelFlag) -> Result<Library>;
}

/// Library exported to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonLibrary {
    path: PathBuf,
}

impl JsonLibrary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LibrarySource for JsonLibrary {
    fn load(&self, cancel: &CancelFlag) -> Result<Library> {
        cancel.check()?;
        debug!("Reading library file {}", self.path.display());

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read library file {}", self.path.display()))?;
        cancel.check()?;

        let library: Library = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid library JSON in {}", self.path.display()))?;
        cancel.check()?;

        info!(
            "Loaded {} tracks and {} artists from {}",
            library.tracks.len(),
            library.artists.len(),
            self.path.display()
        );
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:01Z"), Some(1000));
        assert_eq!(parse_timestamp("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_timestamp("12345"), Some(12345));
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_timestamp_round_trips_through_parse() {
        let t = 1_615_713_213_000;
        assert_eq!(parse_timestamp(&format_timestamp(t)), Some(t));
    }

    #[test]
    fn test_malformed_added_at_becomes_none() {
        let json = r#"{
            "id": "t1",
            "artists": [{ "id": "a1", "name": "A" }],
            "added_at": "yesterday-ish"
        }"#;
        let track: Track = serde_json::from_str(json).expect("track should parse");
        assert_eq!(track.added_at, None);
    }

    #[test]
    fn test_added_at_accepts_number_null_and_missing() {
        let with_number: Track =
            serde_json::from_str(r#"{"id":"t","artists":[],"added_at":42}"#).unwrap();
        assert_eq!(with_number.added_at, Some(42));

        let with_null: Track =
            serde_json::from_str(r#"{"id":"t","artists":[],"added_at":null}"#).unwrap();
        assert_eq!(with_null.added_at, None);

        let missing: Track = serde_json::from_str(r#"{"id":"t","artists":[]}"#).unwrap();
        assert_eq!(missing.added_at, None);
    }

    #[test]
    fn test_time_range_ignores_undated() {
        let track = |id: &str, added_at| Track {
            id: id.to_string(),
            name: String::new(),
            artists: vec![],
            album: AlbumRef::default(),
            duration_ms: 0,
            added_at,
            uri: String::new(),
        };
        let tracks = vec![track("a", Some(30)), track("b", None), track("c", Some(10))];
        assert_eq!(time_range(&tracks), Some((10, 30)));
        assert_eq!(time_range(&[track("d", None)]), None);
    }

    #[test]
    fn test_json_library_loads_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"tracks":[{{"id":"t1","artists":[{{"id":"a1","name":"A"}}],"added_at":"2020-01-01"}}],
               "artists":{{"a1":{{"name":"A","genres":["rock"]}}}}}}"#
        )?;

        let library = JsonLibrary::new(file.path()).load(&CancelFlag::new())?;
        assert_eq!(library.tracks.len(), 1);
        assert_eq!(library.artists["a1"].genres, vec!["rock".to_string()]);
        Ok(())
    }

    #[test]
    fn test_cancelled_load_fails_without_result() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = JsonLibrary::new("/nonexistent/library.json").load(&cancel);
        let err = result.expect_err("cancelled load must fail");
        assert!(err.to_string().contains("cancelled"));
    }
}
