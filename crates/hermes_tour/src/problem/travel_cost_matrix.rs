use std::sync::Arc;

use jiff::SignedDuration;
use serde::Deserialize;

use super::{
    location::{Location, LocationIdx},
    travel_time_oracle::{TravelTimeOracle, UnreachableError},
};

pub type Distance = f64;
pub type Cost = f64;

/// Average speed in m/s used to derive times from haversine distances.
const HAVERSINE_SPEED: f64 = 50.0 / 3.6;

/// This matrix use a flat structure to store distances, times (in seconds), and costs
/// between locations. The index of a pair is `from * num_locations + to`.
///
/// A missing or non-finite entry means the pair is unreachable.
#[derive(Deserialize, Debug, Clone)]
pub struct TravelMatrices {
    distances: Arc<Vec<Distance>>,
    times: Arc<Vec<f64>>,
    costs: Arc<Vec<Cost>>,
    num_locations: usize,
}

impl TravelMatrices {
    pub fn new(distances: Vec<Vec<Distance>>, times: Vec<Vec<f64>>, costs: Vec<Vec<Cost>>) -> Self {
        let num_locations = times.len();

        TravelMatrices {
            distances: Arc::new(distances.into_iter().flatten().collect()),
            times: Arc::new(times.into_iter().flatten().collect()),
            costs: Arc::new(costs.into_iter().flatten().collect()),
            num_locations,
        }
    }

    /// Times only, distances and costs mirror the times.
    pub fn from_times(times: Vec<Vec<f64>>) -> Self {
        let num_locations = times.len();
        let times = Arc::new(times.into_iter().flatten().collect::<Vec<_>>());

        TravelMatrices {
            distances: Arc::clone(&times),
            costs: Arc::clone(&times),
            times,
            num_locations,
        }
    }

    pub fn from_euclidean(locations: &[Location], round: bool) -> Self {
        let num_locations = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                let distance = from.euclidean_distance(to).unwrap_or(f64::INFINITY);
                distances[i * num_locations + j] = if round { distance.round() } else { distance };
            }
        }

        let distances = Arc::new(distances);

        TravelMatrices {
            times: Arc::clone(&distances),
            costs: Arc::clone(&distances),
            distances,
            num_locations,
        }
    }

    pub fn from_haversine(locations: &[Location]) -> Self {
        let num_locations = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_locations * num_locations];
        let mut times: Vec<f64> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                let distance = from.haversine_distance(to).unwrap_or(f64::INFINITY);
                distances[i * num_locations + j] = distance;
                times[i * num_locations + j] = distance / HAVERSINE_SPEED;
            }
        }

        let distances = Arc::new(distances);

        TravelMatrices {
            costs: Arc::clone(&distances),
            distances,
            times: Arc::new(times),
            num_locations,
        }
    }

    pub fn from_constant(num_locations: usize, time: f64, distance: f64, cost: f64) -> Self {
        let len = num_locations * num_locations;

        TravelMatrices {
            distances: Arc::new(vec![distance; len]),
            times: Arc::new(vec![time; len]),
            costs: Arc::new(vec![cost; len]),
            num_locations,
        }
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    fn check_bounds(&self, from: LocationIdx, to: LocationIdx) -> Result<(), UnreachableError> {
        if from.get() >= self.num_locations {
            return Err(UnreachableError::UnknownLocation(from));
        }

        if to.get() >= self.num_locations {
            return Err(UnreachableError::UnknownLocation(to));
        }

        Ok(())
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Option<Distance> {
        self.check_bounds(from, to).ok()?;
        self.distances.get(self.index(from, to)).copied()
    }

    #[inline(always)]
    pub fn travel_cost(&self, from: LocationIdx, to: LocationIdx) -> Option<Cost> {
        self.check_bounds(from, to).ok()?;
        self.costs.get(self.index(from, to)).copied()
    }
}

impl TravelTimeOracle for TravelMatrices {
    fn travel_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
    ) -> Result<SignedDuration, UnreachableError> {
        self.check_bounds(from, to)?;

        let seconds = self
            .times
            .get(self.index(from, to))
            .copied()
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .ok_or(UnreachableError::UnreachablePair { from, to })?;

        SignedDuration::try_from_secs_f64(seconds)
            .map_err(|_| UnreachableError::UnreachablePair { from, to })
    }
}
