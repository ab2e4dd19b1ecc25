//! Camera headings for stops with both neighbors resolved.
//!
//! The camera stands in the roadway and looks at the stop, which is assumed
//! to sit to the right of the direction of travel: the heading is the
//! travel bearing turned 90° clockwise.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use tracing::trace;

use crate::error::FeedError;
use crate::geometry::{LatLon, normalize_degrees};
use crate::neighbors::NeighborMap;
use crate::parser::{StopId, Stops};

/// How the travel direction at a stop is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HeadingStrategy {
    /// Tangent of the segment arriving from the previous stop.
    #[default]
    PrevTangent,
    /// Chord from the previous stop to the next, i.e. the sum of the
    /// arriving and leaving displacement vectors.
    Chord,
}

impl fmt::Display for HeadingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingStrategy::PrevTangent => f.write_str("prev-tangent"),
            HeadingStrategy::Chord => f.write_str("chord"),
        }
    }
}

/// Bearings around one stop and the heading derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Bearing of travel arriving at the stop.
    pub prev_bearing: f64,
    /// Bearing of travel leaving the stop.
    pub next_bearing: f64,
    /// Camera heading in `[0, 360)`.
    pub heading: f64,
}

/// Estimates the heading at `current` given its neighbors on one trip.
pub fn estimate(
    prev: LatLon,
    current: LatLon,
    next: LatLon,
    strategy: HeadingStrategy,
) -> Estimate {
    let prev_bearing = prev.bearing_to(&current);
    let next_bearing = current.bearing_to(&next);

    // TODO: weigh next_bearing into PrevTangent too; Chord is the first cut.
    let travel = match strategy {
        HeadingStrategy::PrevTangent => prev_bearing,
        HeadingStrategy::Chord => prev.bearing_to(&next),
    };

    Estimate {
        prev_bearing,
        next_bearing,
        heading: normalize_degrees(travel + 90.0),
    }
}

/// A stop together with its resolved neighbors and heading.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadedStop {
    pub stop_id: StopId,
    pub prev: StopId,
    pub next: StopId,
    pub heading: f64,
}

/// Computes a heading for every stop resolved on both sides, in stop id order.
///
/// Stops with only one neighbor, or none, are skipped.
///
/// # Errors
///
/// Fails if a stop or neighbor named in `neighbors` is missing from `stops`.
#[tracing::instrument(skip_all, fields(strategy = %strategy))]
pub fn estimate_all(
    stops: &Stops,
    neighbors: &NeighborMap,
    strategy: HeadingStrategy,
) -> Result<Vec<HeadedStop>, FeedError> {
    let lookup = |id: &StopId| {
        stops
            .get(id)
            .map(|s| s.pos)
            .ok_or_else(|| FeedError::DanglingStop {
                stop_id: id.to_string(),
            })
    };

    let mut headed = Vec::new();
    for (stop_id, state) in neighbors {
        let Some((prev, next)) = state.pair() else {
            continue;
        };

        let est = estimate(lookup(prev)?, lookup(stop_id)?, lookup(next)?, strategy);
        trace!(
            %stop_id,
            %prev,
            %next,
            prev_bearing = est.prev_bearing,
            next_bearing = est.next_bearing,
            heading = est.heading,
            "Heading estimated"
        );

        headed.push(HeadedStop {
            stop_id: stop_id.clone(),
            prev: prev.clone(),
            next: next.clone(),
            heading: est.heading,
        });
    }
    Ok(headed)
}
