use jiff::SignedDuration;
use thiserror::Error;

use super::location::LocationIdx;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableError {
    #[error("unknown location {0}")]
    UnknownLocation(LocationIdx),

    #[error("no finite travel time from location {from} to location {to}")]
    UnreachablePair { from: LocationIdx, to: LocationIdx },
}

/// Source of travel times between two locations, shared read-only between
/// concurrent evaluations.
pub trait TravelTimeOracle: Send + Sync {
    fn travel_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
    ) -> Result<SignedDuration, UnreachableError>;
}

impl<T: TravelTimeOracle + ?Sized> TravelTimeOracle for &T {
    fn travel_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
    ) -> Result<SignedDuration, UnreachableError> {
        (**self).travel_time(from, to)
    }
}

impl<T: TravelTimeOracle + ?Sized> TravelTimeOracle for std::sync::Arc<T> {
    fn travel_time(
        &self,
        from: LocationIdx,
        to: LocationIdx,
    ) -> Result<SignedDuration, UnreachableError> {
        (**self).travel_time(from, to)
    }
}
