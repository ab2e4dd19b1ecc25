//! Resolves each stop's previous and next stop from the trips that visit it.
//!
//! Resolution is a two-phase fold. [`group_trips`] builds an immutable,
//! ordered grouping of stop times per trip; [`resolve`] then folds the trips
//! in order of first appearance, applying [`Neighbors::offer`] to every stop
//! a trip visits.
//!
//! A stop serving several routes (inbound and outbound at the same platform,
//! say) must never end up with its predecessor taken from one trip and its
//! successor from another: the heading derived from such a pair is
//! meaningless. The first trip that offers a stop any neighbor therefore
//! decides that stop for good.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::parser::{StopId, StopTime};

/// One vehicle run, its stops in travel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub trip_id: String,
    pub stops: Vec<StopId>,
}

impl Trip {
    /// The `(prev, next)` pair this trip offers the stop at `i`.
    pub fn neighbors_at(&self, i: usize) -> (Option<&StopId>, Option<&StopId>) {
        let prev = i.checked_sub(1).and_then(|p| self.stops.get(p));
        let next = self.stops.get(i + 1);
        (prev, next)
    }
}

/// Neighbor state of a single stop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Neighbors {
    /// No trip has offered this stop a neighbor yet.
    #[default]
    Unresolved,
    /// First offering trip had a predecessor but no successor.
    PartialPrev(StopId),
    /// First offering trip had a successor but no predecessor.
    PartialNext(StopId),
    /// Both neighbors, from the same trip.
    Resolved { prev: StopId, next: StopId },
}

impl Neighbors {
    /// Applies one trip's offer. Only an unresolved stop changes; every other
    /// state is final.
    pub fn offer(self, prev: Option<&StopId>, next: Option<&StopId>) -> Neighbors {
        match (self, prev, next) {
            (Neighbors::Unresolved, Some(p), Some(n)) => Neighbors::Resolved {
                prev: p.clone(),
                next: n.clone(),
            },
            (Neighbors::Unresolved, Some(p), None) => Neighbors::PartialPrev(p.clone()),
            (Neighbors::Unresolved, None, Some(n)) => Neighbors::PartialNext(n.clone()),
            (state, _, _) => state,
        }
    }

    pub fn prev(&self) -> Option<&StopId> {
        match self {
            Neighbors::PartialPrev(p) | Neighbors::Resolved { prev: p, .. } => Some(p),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<&StopId> {
        match self {
            Neighbors::PartialNext(n) | Neighbors::Resolved { next: n, .. } => Some(n),
            _ => None,
        }
    }

    /// Both neighbors, when resolved from a single trip.
    pub fn pair(&self) -> Option<(&StopId, &StopId)> {
        match self {
            Neighbors::Resolved { prev, next } => Some((prev, next)),
            _ => None,
        }
    }
}

/// Resolved neighbor state per stop. Stops never offered a neighbor are absent.
pub type NeighborMap = BTreeMap<StopId, Neighbors>;

/// Groups stop times by trip, each trip sorted by `stop_sequence`.
///
/// Trips keep the order in which their `trip_id` first appears. Equal
/// sequence numbers within a trip keep their input order.
pub fn group_trips(stop_times: &[StopTime]) -> Vec<Trip> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<(&str, Vec<(u32, &StopId)>)> = Vec::new();

    for st in stop_times {
        let slot = *index.entry(st.trip_id.as_str()).or_insert_with(|| {
            grouped.push((st.trip_id.as_str(), Vec::new()));
            grouped.len() - 1
        });
        grouped[slot].1.push((st.stop_sequence, &st.stop_id));
    }

    grouped
        .into_iter()
        .map(|(trip_id, mut calls)| {
            // stable: ties keep record order
            calls.sort_by_key(|(seq, _)| *seq);
            if calls.windows(2).any(|w| w[0].0 == w[1].0) {
                warn!(trip_id, "Trip has duplicate stop_sequence values");
            }
            Trip {
                trip_id: trip_id.to_string(),
                stops: calls.into_iter().map(|(_, id)| id.clone()).collect(),
            }
        })
        .collect()
}

/// Folds one trip into the neighbor state.
pub fn apply_trip(mut state: NeighborMap, trip: &Trip) -> NeighborMap {
    if trip.stops.len() < 2 {
        debug!(trip_id = %trip.trip_id, "Trip offers no neighbors");
        return state;
    }

    for (i, stop_id) in trip.stops.iter().enumerate() {
        let (prev, next) = trip.neighbors_at(i);
        let current = state.remove(stop_id).unwrap_or_default();
        state.insert(stop_id.clone(), current.offer(prev, next));
    }
    state
}

/// Resolves neighbors for every stop visited by `trips`, folding in order.
#[tracing::instrument(skip_all, fields(trips = trips.len()))]
pub fn resolve(trips: &[Trip]) -> NeighborMap {
    let state = trips.iter().fold(NeighborMap::new(), apply_trip);

    let resolved = state.values().filter(|n| n.pair().is_some()).count();
    info!(
        stops = state.len(),
        resolved,
        partial = state.len() - resolved,
        "Neighbors resolved"
    );
    state
}
