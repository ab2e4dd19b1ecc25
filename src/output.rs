//! Output records and persistence.
//!
//! Headed stops are written as a JSON array; run statistics can be appended
//! to a CSV file, one row per run.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::FeedError;
use crate::heading::HeadedStop;
use crate::parser::Stops;
use crate::stats::RunStats;

/// One output object: every input column, then `prev`, `next` and `heading`.
pub type StopRecord = Map<String, Value>;

/// Builds output records for `headed`. Computed keys replace input columns of
/// the same name.
///
/// # Errors
///
/// Fails if a headed stop has no row in `stops`.
pub fn stop_records(
    stops: &Stops,
    headed: &[HeadedStop],
) -> Result<Vec<StopRecord>, FeedError> {
    headed
        .iter()
        .map(|h| {
            let stop = stops.get(&h.stop_id).ok_or_else(|| FeedError::DanglingStop {
                stop_id: h.stop_id.to_string(),
            })?;
            let mut record: StopRecord = stop
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            record.insert("prev".into(), Value::String(h.prev.to_string()));
            record.insert("next".into(), Value::String(h.next.to_string()));
            record.insert("heading".into(), Value::from(h.heading));
            Ok(record)
        })
        .collect()
}

/// A fully written sibling temp file waiting to be renamed over its target.
///
/// Dropping it without [`StagedFile::commit`] removes the temp file and
/// leaves the target untouched.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn tmp_path(&self) -> &Path {
        &self.tmp
    }

    /// Renames the temp file over the target.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.target).with_context(|| {
            format!(
                "moving {} to {}",
                self.tmp.display(),
                self.target.display()
            )
        })?;
        self.committed = true;
        info!(path = %self.target.display(), "Output written");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            debug!(tmp = %self.tmp.display(), "Discarding staged output");
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Serializes `value` as JSON into a temp file beside `path`.
pub fn stage_json(path: &Path, value: &impl Serialize) -> Result<StagedFile> {
    let staged = StagedFile {
        tmp: temp_path(path),
        target: path.to_path_buf(),
        committed: false,
    };
    debug!(path = %path.display(), tmp = %staged.tmp.display(), "Staging JSON");

    let file = File::create(&staged.tmp)
        .with_context(|| format!("creating {}", staged.tmp.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("writing {}", staged.tmp.display()))?;
    writer
        .flush()
        .with_context(|| format!("writing {}", staged.tmp.display()))?;

    Ok(staged)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Logs run statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &RunStats) {
    debug!("{:#?}", stats);
}

/// Appends a [`RunStats`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, stats: &RunStats) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(stats)?;
    writer.flush()?;

    Ok(())
}
