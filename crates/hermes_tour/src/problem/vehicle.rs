use jiff::SignedDuration;
use serde::Serialize;
use thiserror::Error;

use crate::define_index_newtype;

use super::{
    activity::Activity,
    capacity::Capacity,
    location::LocationIdx,
    time_window::{INFINITE_TIME, Time, TimeWindow, TimeWindowError},
};

define_index_newtype!(VehicleIdx, Vehicle);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VehicleError {
    #[error("vehicle is missing an external id")]
    MissingId,

    #[error("vehicle {0} is missing a start location")]
    MissingStartLocation(String),

    #[error("vehicle {vehicle_id}: invalid operating window")]
    InvalidOperatingWindow {
        vehicle_id: String,
        #[source]
        source: TimeWindowError,
    },

    #[error("vehicle {vehicle_id}: depot duration {depot_duration:?} is negative")]
    NegativeDepotDuration {
        vehicle_id: String,
        depot_duration: SignedDuration,
    },
}

#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    start_location_id: LocationIdx,
    end_location_id: Option<LocationIdx>,
    earliest_start: Time,
    latest_end: Time,
    depot_duration: SignedDuration,
    capacity: Capacity,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn start_location_id(&self) -> LocationIdx {
        self.start_location_id
    }

    /// Falls back to the start location when the vehicle returns where it started.
    pub fn end_location_id(&self) -> LocationIdx {
        self.end_location_id.unwrap_or(self.start_location_id)
    }

    pub fn earliest_start(&self) -> Time {
        self.earliest_start
    }

    pub fn latest_end(&self) -> Time {
        self.latest_end
    }

    pub fn depot_duration(&self) -> SignedDuration {
        self.depot_duration
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    pub fn start_activity(&self) -> Activity {
        Activity::start(
            self.start_location_id,
            self.earliest_start,
            self.latest_end,
            self.depot_duration,
        )
    }

    pub fn end_activity(&self) -> Activity {
        Activity::end(self.end_location_id(), self.earliest_start, self.latest_end)
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    start_location_id: Option<usize>,
    end_location_id: Option<usize>,
    earliest_start: Option<Time>,
    latest_end: Option<Time>,
    depot_duration: Option<SignedDuration>,
    capacity: Option<Capacity>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: impl Into<String>) -> &mut VehicleBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_start_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.start_location_id = Some(location_id);
        self
    }

    pub fn set_end_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.end_location_id = Some(location_id);
        self
    }

    pub fn set_earliest_start(&mut self, earliest_start: Time) -> &mut VehicleBuilder {
        self.earliest_start = Some(earliest_start);
        self
    }

    pub fn set_latest_end(&mut self, latest_end: Time) -> &mut VehicleBuilder {
        self.latest_end = Some(latest_end);
        self
    }

    pub fn set_depot_duration(&mut self, duration: SignedDuration) -> &mut VehicleBuilder {
        self.depot_duration = Some(duration);
        self
    }

    pub fn set_capacity(&mut self, capacity: Capacity) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<Vehicle, VehicleError> {
        let external_id = self.external_id.ok_or(VehicleError::MissingId)?;
        let start_location_id = self
            .start_location_id
            .ok_or_else(|| VehicleError::MissingStartLocation(external_id.clone()))?;

        let earliest_start = self.earliest_start.unwrap_or(SignedDuration::ZERO);
        let latest_end = self.latest_end.unwrap_or(INFINITE_TIME);
        if let Err(source) = TimeWindow::new(earliest_start, latest_end).validate() {
            return Err(VehicleError::InvalidOperatingWindow {
                vehicle_id: external_id,
                source,
            });
        }

        let depot_duration = self.depot_duration.unwrap_or(SignedDuration::ZERO);
        if depot_duration.is_negative() {
            return Err(VehicleError::NegativeDepotDuration {
                vehicle_id: external_id,
                depot_duration,
            });
        }

        Ok(Vehicle {
            external_id,
            start_location_id: start_location_id.into(),
            end_location_id: self.end_location_id.map(LocationIdx::from),
            earliest_start,
            latest_end,
            depot_duration,
            capacity: self.capacity.unwrap_or(Capacity::EMPTY),
        })
    }
}
