//! CSV loaders for the GTFS `stops.txt` and `stop_times.txt` tables.
//!
//! Every column of the stops table is kept as text so it can be passed
//! through to the output unchanged; only the coordinates are typed.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FeedError;
use crate::geometry::LatLon;

/// Identifier of a stop, as given by the feed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row of the stops table.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: StopId,
    pub pos: LatLon,
    /// Every column of the row, keyed by header name.
    pub fields: BTreeMap<String, String>,
}

/// Stops keyed by id.
pub type Stops = BTreeMap<StopId, Stop>;

/// A row of the stop-times table, reduced to the columns used for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: StopId,
    pub stop_sequence: u32,
}

#[derive(Deserialize)]
struct StopRow {
    stop_id: StopId,
    stop_lat: f64,
    stop_lon: f64,
}

/// Loads the stops table from a file on disk.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_stops_file(path: &Path) -> Result<Stops, FeedError> {
    let file = open(path)?;
    load_stops(file, &path.display().to_string())
}

/// Loads the stop-times table from a file on disk, checking every row
/// against `stops`.
#[tracing::instrument(skip(stops), fields(path = %path.display()))]
pub fn load_stop_times_file(path: &Path, stops: &Stops) -> Result<Vec<StopTime>, FeedError> {
    let file = open(path)?;
    load_stop_times(file, &path.display().to_string(), stops)
}

fn open(path: &Path) -> Result<File, FeedError> {
    File::open(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Parses a stops table. `label` names the source in error messages.
///
/// # Errors
///
/// Fails on a row lacking `stop_id`/`stop_lat`/`stop_lon`, a ragged row,
/// unparseable or out-of-range coordinates, an empty id, or a duplicate id.
pub fn load_stops<R: Read>(reader: R, label: &str) -> Result<Stops, FeedError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| FeedError::from_csv(label, None, e))?
        .clone();

    let mut stops = Stops::new();
    for result in rdr.records() {
        let row = result.map_err(|e| FeedError::from_csv(label, None, e))?;
        let line = line_of(&row);

        let rec: StopRow = row
            .deserialize(Some(&headers))
            .map_err(|e| FeedError::from_csv(label, Some(&headers), e))?;
        let fields: BTreeMap<String, String> = row
            .deserialize(Some(&headers))
            .map_err(|e| FeedError::from_csv(label, Some(&headers), e))?;

        non_empty(label, line, "stop_id", rec.stop_id.as_str())?;
        check_coordinate(label, line, "stop_lat", rec.stop_lat, 90.0)?;
        check_coordinate(label, line, "stop_lon", rec.stop_lon, 180.0)?;

        if stops.contains_key(&rec.stop_id) {
            return Err(FeedError::integrity(
                label,
                line,
                format!("duplicate stop_id `{}`", rec.stop_id),
            ));
        }

        stops.insert(
            rec.stop_id.clone(),
            Stop {
                stop_id: rec.stop_id,
                pos: LatLon::new(rec.stop_lat, rec.stop_lon),
                fields,
            },
        );
    }

    info!(label, stops = stops.len(), "Stops loaded");
    Ok(stops)
}

/// Parses a stop-times table. Rows must reference a stop present in `stops`.
///
/// # Errors
///
/// Fails on a row lacking `trip_id`/`stop_id`/`stop_sequence`, a ragged row,
/// a `stop_sequence` that is not a non-negative integer, or an unknown
/// `stop_id`.
pub fn load_stop_times<R: Read>(
    reader: R,
    label: &str,
    stops: &Stops,
) -> Result<Vec<StopTime>, FeedError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| FeedError::from_csv(label, None, e))?
        .clone();

    let mut stop_times = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| FeedError::from_csv(label, None, e))?;
        let line = line_of(&row);

        let rec: StopTime = row
            .deserialize(Some(&headers))
            .map_err(|e| FeedError::from_csv(label, Some(&headers), e))?;

        non_empty(label, line, "trip_id", &rec.trip_id)?;
        non_empty(label, line, "stop_id", rec.stop_id.as_str())?;

        if !stops.contains_key(&rec.stop_id) {
            return Err(FeedError::integrity(
                label,
                line,
                format!(
                    "trip `{}` references unknown stop `{}`",
                    rec.trip_id, rec.stop_id
                ),
            ));
        }

        stop_times.push(rec);
    }

    info!(label, stop_times = stop_times.len(), "Stop times loaded");
    Ok(stop_times)
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn non_empty(label: &str, line: u64, column: &str, value: &str) -> Result<(), FeedError> {
    if value.is_empty() {
        return Err(FeedError::malformed(label, line, format!("`{column}` is empty")));
    }
    Ok(())
}

fn check_coordinate(
    label: &str,
    line: u64,
    column: &str,
    value: f64,
    limit: f64,
) -> Result<(), FeedError> {
    if !value.is_finite() || value.abs() > limit {
        return Err(FeedError::malformed(
            label,
            line,
            format!("`{column}` value {value} is outside ±{limit}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOPS: &str = "\
stop_id,stop_name,stop_lat,stop_lon
A,First St,38.90,-77.03
B,Second St,38.91,-77.03
C,Third St,38.92,-77.03
";

    fn stops() -> Stops {
        load_stops(STOPS.as_bytes(), "stops.txt").unwrap()
    }

    #[test]
    fn test_load_stops_keeps_all_columns() {
        let stops = stops();
        assert_eq!(stops.len(), 3);

        let b = &stops[&StopId::new("B")];
        assert_eq!(b.pos, LatLon::new(38.91, -77.03));
        assert_eq!(b.fields["stop_name"], "Second St");
        assert_eq!(b.fields["stop_lat"], "38.91");
        assert_eq!(b.fields.len(), 4);
    }

    #[test]
    fn test_load_stops_missing_column() {
        let data = "stop_id,stop_lat\nA,1.0\n";
        let err = load_stops(data.as_bytes(), "stops.txt").unwrap_err();
        match err {
            FeedError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("stop_lon"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_stops_bad_latitude() {
        let data = "stop_id,stop_lat,stop_lon\nA,1.0,2.0\nB,north,2.0\n";
        let err = load_stops(data.as_bytes(), "stops.txt").unwrap_err();
        match err {
            FeedError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.starts_with("`stop_lat`:"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_stops_out_of_range_longitude() {
        let data = "stop_id,stop_lat,stop_lon\nA,1.0,200.0\n";
        let err = load_stops(data.as_bytes(), "stops.txt").unwrap_err();
        assert!(matches!(err, FeedError::MalformedRecord { .. }));
    }

    #[test]
    fn test_load_stops_duplicate_id() {
        let data = "stop_id,stop_lat,stop_lon\nA,1.0,2.0\nA,1.5,2.5\n";
        let err = load_stops(data.as_bytes(), "stops.txt").unwrap_err();
        assert!(matches!(err, FeedError::DataIntegrity { line: 3, .. }));
    }

    #[test]
    fn test_load_stops_empty_id() {
        let data = "stop_id,stop_lat,stop_lon\n,1.0,2.0\n";
        let err = load_stops(data.as_bytes(), "stops.txt").unwrap_err();
        assert!(matches!(err, FeedError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_load_stop_times_parses_sequence_numerically() {
        let data = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
T1,08:00:00,08:00:00,A, 10
T1,08:01:00,08:01:00,B,2
";
        let st = load_stop_times(data.as_bytes(), "stop_times.txt", &stops()).unwrap();
        assert_eq!(st.len(), 2);
        assert_eq!(st[0].stop_sequence, 10);
        assert_eq!(st[1].stop_sequence, 2);
        assert_eq!(st[1].stop_id, StopId::new("B"));
    }

    #[test]
    fn test_load_stop_times_unknown_stop() {
        let data = "trip_id,stop_id,stop_sequence\nT1,A,1\nT1,Z,2\n";
        let err = load_stop_times(data.as_bytes(), "stop_times.txt", &stops()).unwrap_err();
        match err {
            FeedError::DataIntegrity { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("`Z`"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_stop_times_bad_sequence() {
        let data = "trip_id,stop_id,stop_sequence\nT1,A,first\n";
        let err = load_stop_times(data.as_bytes(), "stop_times.txt", &stops()).unwrap_err();
        match err {
            FeedError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.starts_with("`stop_sequence`:"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let data = "trip_id,stop_id,stop_sequence\nT1,B,-2\n";
        let err = load_stop_times(data.as_bytes(), "stop_times.txt", &stops()).unwrap_err();
        assert!(matches!(err, FeedError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_load_stop_times_missing_column() {
        let data = "trip_id,stop_id\nT1,A\n";
        let err = load_stop_times(data.as_bytes(), "stop_times.txt", &stops()).unwrap_err();
        match err {
            FeedError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("stop_sequence"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_stops_trims_padded_fields() {
        let data = "stop_id, stop_lat ,stop_lon\n A , 38.90,-77.03 \n";
        let stops = load_stops(data.as_bytes(), "stops.txt").unwrap();

        let a = &stops[&StopId::new("A")];
        assert_eq!(a.pos, LatLon::new(38.90, -77.03));
        assert_eq!(a.fields["stop_lat"], "38.90");
    }

    #[test]
    fn test_load_stops_file_missing() {
        let err = load_stops_file(Path::new("/nonexistent/stops.txt")).unwrap_err();
        assert!(matches!(err, FeedError::Io { .. }));
    }
}
