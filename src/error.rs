//! Feed error types.
//!
//! Malformed input and broken references abort the run; a stop that simply
//! lacks neighbors is not an error and never surfaces here.

use std::path::PathBuf;

/// Errors raised while loading a GTFS feed or deriving headings from it.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A row is missing a required column or a field fails to parse
    #[error("malformed record in {file} at line {line}: {reason}")]
    MalformedRecord {
        file: String,
        line: u64,
        reason: String,
    },

    /// A row refers to something the feed does not contain
    #[error("data integrity error in {file} at line {line}: {reason}")]
    DataIntegrity {
        file: String,
        line: u64,
        reason: String,
    },

    /// A resolved neighbor or headed stop has no row in the stops table
    #[error("resolved neighbors reference stop `{stop_id}`, which is not in the stops table")]
    DanglingStop { stop_id: String },

    /// Reading or writing a file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FeedError {
    pub(crate) fn malformed(file: &str, line: u64, reason: impl Into<String>) -> Self {
        FeedError::MalformedRecord {
            file: file.to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn integrity(file: &str, line: u64, reason: impl Into<String>) -> Self {
        FeedError::DataIntegrity {
            file: file.to_string(),
            line,
            reason: reason.into(),
        }
    }

    /// Maps a csv reader failure onto a malformed record at the reported line.
    /// With `headers`, deserialize failures name the offending column.
    pub(crate) fn from_csv(
        file: &str,
        headers: Option<&csv::StringRecord>,
        err: csv::Error,
    ) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(source) => FeedError::Io {
                path: PathBuf::from(file),
                source,
            },
            kind => FeedError::malformed(file, line, csv_reason(kind, headers)),
        }
    }
}

fn csv_reason(kind: csv::ErrorKind, headers: Option<&csv::StringRecord>) -> String {
    match kind {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, found {len}"),
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {err}"),
        csv::ErrorKind::Deserialize { err, .. } => {
            let column = err
                .field()
                .and_then(|i| headers?.get(usize::try_from(i).ok()?));
            match column {
                Some(name) => format!("`{name}`: {}", err.kind()),
                None => err.to_string(),
            }
        }
        other => format!("{other:?}"),
    }
}
