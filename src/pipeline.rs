//! Load, resolve, estimate and write, as one all-or-nothing run.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::heading::{HeadedStop, estimate_all};
use crate::neighbors::{group_trips, resolve};
use crate::output::{StopRecord, append_record, print_pretty, stage_json, stop_records};
use crate::parser::{load_stop_times_file, load_stops_file};
use crate::stats::RunStats;

/// Everything a run computes, before anything is written.
#[derive(Debug)]
pub struct Computed {
    pub headed: Vec<HeadedStop>,
    pub records: Vec<StopRecord>,
    pub stats: RunStats,
}

/// Reads the feed named by `config` and derives headings, writing nothing.
#[tracing::instrument(skip_all, fields(stops = %config.stops_path.display()))]
pub fn compute(config: &Config) -> Result<Computed> {
    let stops = load_stops_file(&config.stops_path)
        .with_context(|| format!("loading stops from {}", config.stops_path.display()))?;
    let stop_times = load_stop_times_file(&config.stop_times_path, &stops).with_context(|| {
        format!(
            "loading stop times from {}",
            config.stop_times_path.display()
        )
    })?;

    let trips = group_trips(&stop_times);
    let neighbors = resolve(&trips);
    let headed = estimate_all(&stops, &neighbors, config.strategy)?;

    let stats = RunStats::from_run(
        &stops,
        stop_times.len(),
        &trips,
        &neighbors,
        &headed,
        config.strategy,
    );
    let records = stop_records(&stops, &headed)?;

    Ok(Computed {
        headed,
        records,
        stats,
    })
}

/// Runs [`compute`] and writes its output. The JSON is staged beside its
/// target and only moved into place once the summary row is appended, so a
/// failed run leaves the previous output as it was.
#[tracing::instrument(skip_all, fields(output = %config.output_path.display()))]
pub fn run(config: &Config) -> Result<RunStats> {
    let computed = compute(config)?;

    let staged = stage_json(&config.output_path, &computed.records)?;

    if let Some(summary) = &config.summary_path {
        append_record(summary, &computed.stats)
            .with_context(|| format!("appending run summary to {}", summary.display()))?;
    }

    staged.commit()?;
    log_stats(&computed.stats);

    Ok(computed.stats)
}

/// Logs the counts of a run at info level.
pub fn log_stats(stats: &RunStats) {
    print_pretty(stats);
    info!(
        strategy = %stats.strategy,
        stops = stats.stops,
        trips = stats.trips,
        single_stop_trips = stats.single_stop_trips,
        resolved = stats.resolved,
        partial_prev = stats.partial_prev,
        partial_next = stats.partial_next,
        unresolved = stats.unresolved,
        with_heading = stats.with_heading,
        heading_pct = stats.heading_pct(),
        "Run summary"
    );
}
