use geo::{Distance, Euclidean, Haversine};
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// A stop of the problem. Only the index takes part in propagation, the
/// coordinate is used to derive travel matrices.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Location {
    point: Option<geo::Point>,
}

impl Location {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            point: Some(geo::Point::new(x, y)),
        }
    }

    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Self {
            point: Some(geo::Point::new(lon, lat)),
        }
    }

    pub fn opaque() -> Self {
        Self { point: None }
    }

    pub fn point(&self) -> Option<geo::Point> {
        self.point
    }

    pub fn has_coordinates(&self) -> bool {
        self.point.is_some()
    }

    pub fn euclidean_distance(&self, to: &Location) -> Option<f64> {
        match (self.point, to.point) {
            (Some(from), Some(to)) => Some(Euclidean.distance(&from, &to)),
            _ => None,
        }
    }

    pub fn haversine_distance(&self, to: &Location) -> Option<f64> {
        match (self.point, to.point) {
            (Some(from), Some(to)) => Some(Haversine.distance(from, to)),
            _ => None,
        }
    }
}
