use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::heading::{HeadedStop, HeadingStrategy};
use crate::neighbors::{NeighborMap, Neighbors, Trip};
use crate::parser::Stops;

/// Outcome counts for one run, one CSV row per run.
#[derive(Debug, Default, Serialize)]
pub struct RunStats {
    pub timestamp: DateTime<Utc>,
    pub strategy: HeadingStrategy,

    // input
    pub stops: usize,
    pub stop_times: usize,
    pub trips: usize,
    pub single_stop_trips: usize,

    // resolution
    pub resolved: usize,
    pub partial_prev: usize,
    pub partial_next: usize,
    pub unresolved: usize,

    // output
    pub with_heading: usize,
}

impl RunStats {
    pub fn from_run(
        stops: &Stops,
        stop_times: usize,
        trips: &[Trip],
        neighbors: &NeighborMap,
        headed: &[HeadedStop],
        strategy: HeadingStrategy,
    ) -> Self {
        let mut s = RunStats {
            timestamp: Utc::now(),
            strategy,
            stops: stops.len(),
            stop_times,
            trips: trips.len(),
            single_stop_trips: trips.iter().filter(|t| t.stops.len() < 2).count(),
            with_heading: headed.len(),
            ..Default::default()
        };

        for stop_id in stops.keys() {
            match neighbors.get(stop_id) {
                Some(Neighbors::Resolved { .. }) => s.resolved += 1,
                Some(Neighbors::PartialPrev(_)) => s.partial_prev += 1,
                Some(Neighbors::PartialNext(_)) => s.partial_next += 1,
                Some(Neighbors::Unresolved) | None => s.unresolved += 1,
            }
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of stops that received a heading.
    pub fn heading_pct(&self) -> f64 {
        Self::pct(self.with_heading, self.stops)
    }
}
