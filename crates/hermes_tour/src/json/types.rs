use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::problem::{
    activity::Activity,
    capacity::Capacity,
    job::Job,
    job_builder::{ActivitySpec, ActivityType, JobActivitySpec, JobSpec, ValidationError, build_job},
    location::Location,
    time_window::{INFINITE_TIME, TimeWindow, TimeWindows},
    travel_cost_matrix::TravelMatrices,
    vehicle::{Vehicle, VehicleBuilder, VehicleError},
    vehicle_routing_problem::{ProblemError, VehicleRoutingProblem, VehicleRoutingProblemBuilder},
};

pub trait FromProblem<T> {
    fn from_problem(value: T, problem: &VehicleRoutingProblem) -> Self;
}

#[derive(Debug, Error)]
pub enum JsonProblemError {
    #[error(transparent)]
    Job(#[from] ValidationError),

    #[error(transparent)]
    Vehicle(#[from] VehicleError),

    #[error(transparent)]
    Problem(#[from] ProblemError),

    #[error("travel matrix {name} must be {expected}x{expected}")]
    MatrixDimension { name: &'static str, expected: usize },

    #[error("location {0} has no coordinates and no travel matrix was given")]
    MissingCoordinates(usize),
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "VehicleRoutingProblem")]
pub struct JsonVehicleRoutingProblem {
    pub id: Option<String>,
    pub locations: Vec<JsonLocation>,
    pub jobs: Vec<JsonJob>,
    pub vehicles: Vec<JsonVehicle>,
    /// Used to derive travel times when no matrix is given, defaults to haversine
    pub distance_method: Option<JsonDistanceMethod>,
    pub travel_matrices: Option<JsonTravelMatrices>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", rename = "DistanceMethod")]
pub enum JsonDistanceMethod {
    Euclidean,
    Haversine,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Location")]
pub struct JsonLocation {
    /// `[longitude, latitude]`, or `[x, y]` for euclidean problems
    pub coordinates: Option<[f64; 2]>,
}

impl FromProblem<&Location> for JsonLocation {
    fn from_problem(value: &Location, _problem: &VehicleRoutingProblem) -> Self {
        JsonLocation {
            coordinates: value.point().map(|point| [point.x(), point.y()]),
        }
    }
}

/// Travel times in seconds, indexed `[from][to]`.
#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "TravelMatrices")]
pub struct JsonTravelMatrices {
    pub times: Vec<Vec<f64>>,
    pub distances: Option<Vec<Vec<f64>>>,
    pub costs: Option<Vec<Vec<f64>>>,
}

impl JsonTravelMatrices {
    fn check_dimension(
        name: &'static str,
        rows: &[Vec<f64>],
        expected: usize,
    ) -> Result<(), JsonProblemError> {
        if rows.len() != expected || rows.iter().any(|row| row.len() != expected) {
            return Err(JsonProblemError::MatrixDimension { name, expected });
        }

        Ok(())
    }

    fn into_matrices(self, num_locations: usize) -> Result<TravelMatrices, JsonProblemError> {
        Self::check_dimension("times", &self.times, num_locations)?;

        match (self.distances, self.costs) {
            (None, None) => Ok(TravelMatrices::from_times(self.times)),
            (distances, costs) => {
                let distances = distances.unwrap_or_else(|| self.times.clone());
                let costs = costs.unwrap_or_else(|| self.times.clone());
                Self::check_dimension("distances", &distances, num_locations)?;
                Self::check_dimension("costs", &costs, num_locations)?;

                Ok(TravelMatrices::new(distances, self.times, costs))
            }
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Job")]
pub struct JsonJob {
    pub id: String,
    pub activities: Vec<JsonActivity>,
}

impl FromProblem<&Job> for JsonJob {
    fn from_problem(value: &Job, _problem: &VehicleRoutingProblem) -> Self {
        JsonJob {
            id: value.external_id().to_owned(),
            activities: value
                .activities()
                .iter()
                .filter_map(JsonActivity::from_activity)
                .collect(),
        }
    }
}

impl From<JsonJob> for JobSpec {
    fn from(value: JsonJob) -> Self {
        JobSpec {
            id: value.id,
            activities: value.activities.into_iter().map(JobActivitySpec::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Activity")]
pub struct JsonActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub location_id: usize,
    pub name: Option<String>,
    pub size: Option<Vec<f64>>,
    pub operation_time: Option<SignedDuration>,
    pub time_windows: Option<Vec<TimeWindow>>,
}

impl JsonActivity {
    /// `None` for the vehicle boundaries, which are not part of a job.
    pub fn from_activity(value: &Activity) -> Option<Self> {
        let activity_type = ActivityType::try_from(value.kind()).ok()?;

        Some(JsonActivity {
            activity_type,
            location_id: value.location_id().get(),
            name: Some(value.name().to_owned()),
            size: (!value.size().is_empty()).then(|| value.size().iter().collect()),
            operation_time: Some(value.operation_time()),
            time_windows: Some(value.time_windows().as_slice().to_vec()),
        })
    }
}

impl From<JsonActivity> for JobActivitySpec {
    fn from(value: JsonActivity) -> Self {
        let mut spec = ActivitySpec::at(value.location_id);

        if let Some(name) = value.name {
            spec = spec.with_name(name);
        }

        if let Some(size) = value.size {
            spec = spec.with_size(Capacity::from_vec(size));
        }

        if let Some(operation_time) = value.operation_time {
            spec = spec.with_operation_time(operation_time);
        }

        if let Some(time_windows) = value.time_windows {
            spec = spec.with_time_windows(TimeWindows::from_vec(time_windows));
        }

        JobActivitySpec {
            activity_type: value.activity_type,
            spec,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Vehicle")]
pub struct JsonVehicle {
    pub id: String,
    pub start_location_id: usize,
    /// Defaults to the start location
    pub end_location_id: Option<usize>,
    pub earliest_start: Option<SignedDuration>,
    pub latest_end: Option<SignedDuration>,
    pub depot_duration: Option<SignedDuration>,
    pub capacity: Option<Vec<f64>>,
}

impl FromProblem<&Vehicle> for JsonVehicle {
    fn from_problem(value: &Vehicle, _problem: &VehicleRoutingProblem) -> Self {
        JsonVehicle {
            id: value.external_id().to_owned(),
            start_location_id: value.start_location_id().get(),
            end_location_id: Some(value.end_location_id().get()),
            earliest_start: Some(value.earliest_start()),
            latest_end: (value.latest_end() != INFINITE_TIME).then_some(value.latest_end()),
            depot_duration: Some(value.depot_duration()),
            capacity: (!value.capacity().is_empty()).then(|| value.capacity().iter().collect()),
        }
    }
}

impl JsonVehicle {
    fn build(self) -> Result<Vehicle, VehicleError> {
        let mut builder = VehicleBuilder::default();

        builder
            .set_vehicle_id(self.id)
            .set_start_location_id(self.start_location_id);

        if let Some(end_location_id) = self.end_location_id {
            builder.set_end_location_id(end_location_id);
        }

        if let Some(earliest_start) = self.earliest_start {
            builder.set_earliest_start(earliest_start);
        }

        if let Some(latest_end) = self.latest_end {
            builder.set_latest_end(latest_end);
        }

        if let Some(depot_duration) = self.depot_duration {
            builder.set_depot_duration(depot_duration);
        }

        if let Some(capacity) = self.capacity {
            builder.set_capacity(Capacity::from_vec(capacity));
        }

        builder.build()
    }
}

impl FromProblem<&VehicleRoutingProblem> for JsonVehicleRoutingProblem {
    fn from_problem(value: &VehicleRoutingProblem, problem: &VehicleRoutingProblem) -> Self {
        JsonVehicleRoutingProblem {
            id: value.id().map(str::to_owned),
            locations: value
                .locations()
                .iter()
                .map(|location| JsonLocation::from_problem(location, problem))
                .collect(),
            jobs: value
                .jobs()
                .iter()
                .map(|job| JsonJob::from_problem(job, problem))
                .collect(),
            vehicles: value
                .vehicles()
                .iter()
                .map(|vehicle| JsonVehicle::from_problem(vehicle, problem))
                .collect(),
            distance_method: None,
            travel_matrices: None,
        }
    }
}

impl JsonVehicleRoutingProblem {
    /// Builds the problem and the travel matrices its locations are measured with.
    #[instrument(skip_all, level = "debug")]
    pub fn build_problem(self) -> Result<(VehicleRoutingProblem, TravelMatrices), JsonProblemError> {
        let distance_method = self.distance_method.unwrap_or(JsonDistanceMethod::Haversine);

        let locations = self
            .locations
            .iter()
            .map(|location| match (location.coordinates, distance_method) {
                (None, _) => Location::opaque(),
                (Some([x, y]), JsonDistanceMethod::Euclidean) => Location::from_cartesian(x, y),
                (Some([lon, lat]), JsonDistanceMethod::Haversine) => Location::from_lat_lon(lat, lon),
            })
            .collect::<Vec<_>>();

        let matrices = match self.travel_matrices {
            Some(matrices) => matrices.into_matrices(locations.len())?,
            None => {
                if let Some(index) = locations.iter().position(|location| !location.has_coordinates()) {
                    return Err(JsonProblemError::MissingCoordinates(index));
                }

                debug!(?distance_method, "deriving travel matrices from coordinates");
                match distance_method {
                    JsonDistanceMethod::Euclidean => TravelMatrices::from_euclidean(&locations, false),
                    JsonDistanceMethod::Haversine => TravelMatrices::from_haversine(&locations),
                }
            }
        };

        let jobs = self
            .jobs
            .into_iter()
            .map(|job| build_job(job.into()))
            .collect::<Result<Vec<_>, _>>()?;

        let vehicles = self
            .vehicles
            .into_iter()
            .map(JsonVehicle::build)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = VehicleRoutingProblemBuilder::default();

        if let Some(id) = self.id {
            builder.set_id(id);
        }

        builder
            .set_locations(locations)
            .set_jobs(jobs)
            .set_vehicles(vehicles);

        Ok((builder.build()?, matrices))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{
            activity::ActivityKind, job::JobIdx, location::LocationIdx,
            travel_time_oracle::TravelTimeOracle,
        },
        test_utils,
    };

    use super::*;

    const PROBLEM: &str = r#"{
        "id": "scenario",
        "locations": [{ "coordinates": null }, { "coordinates": null }, { "coordinates": null }],
        "jobs": [
            {
                "id": "shipment",
                "activities": [
                    { "type": "pickup", "location_id": 1, "size": [2.0], "operation_time": "PT10S",
                      "time_windows": [{ "start": "PT0S", "end": "PT100S" }] },
                    { "type": "delivery", "location_id": 2, "name": "drop", "size": [2.0] }
                ]
            }
        ],
        "vehicles": [{ "id": "van", "start_location_id": 0, "capacity": [4.0] }],
        "travel_matrices": { "times": [[0, 5, 10], [5, 0, 15], [5, 15, 0]] }
    }"#;

    #[test]
    fn test_build_problem() {
        let input: JsonVehicleRoutingProblem = serde_json::from_str(PROBLEM).unwrap();
        let (problem, matrices) = input.build_problem().unwrap();

        assert_eq!(problem.id(), Some("scenario"));
        assert_eq!(problem.jobs().len(), 1);
        assert_eq!(problem.vehicles().len(), 1);

        let job = problem.job(JobIdx::new(0));
        assert_eq!(job.external_id(), "shipment");
        assert_eq!(job.activities()[0].kind(), ActivityKind::Pickup);
        assert_eq!(job.activities()[0].operation_time(), SignedDuration::from_secs(10));
        assert_eq!(job.activities()[1].name(), "drop");
        assert_eq!(job.activities()[1].time_windows().end(), INFINITE_TIME);

        assert_eq!(
            matrices.travel_time(LocationIdx::new(1), LocationIdx::new(2)),
            Ok(SignedDuration::from_secs(15))
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = serde_json::from_str::<JsonJob>(
            r#"{ "id": "job", "activities": [], "skills": ["fragile"] }"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_job_is_rejected() {
        let input: JsonVehicleRoutingProblem = serde_json::from_str(
            r#"{
                "locations": [{ "coordinates": [0.0, 0.0] }],
                "jobs": [{ "id": "empty", "activities": [] }],
                "vehicles": []
            }"#,
        )
        .unwrap();

        assert!(matches!(
            input.build_problem(),
            Err(JsonProblemError::Job(ValidationError::NoActivities { .. }))
        ));
    }

    #[test]
    fn test_matrix_dimension_mismatch() {
        let input: JsonVehicleRoutingProblem = serde_json::from_str(
            r#"{
                "locations": [{ "coordinates": null }, { "coordinates": null }],
                "jobs": [],
                "vehicles": [],
                "travel_matrices": { "times": [[0, 1]] }
            }"#,
        )
        .unwrap();

        assert!(matches!(
            input.build_problem(),
            Err(JsonProblemError::MatrixDimension { name: "times", expected: 2 })
        ));
    }

    #[test]
    fn test_missing_coordinates_without_matrix() {
        let input: JsonVehicleRoutingProblem = serde_json::from_str(
            r#"{
                "locations": [{ "coordinates": [0.0, 0.0] }, { "coordinates": null }],
                "jobs": [],
                "vehicles": []
            }"#,
        )
        .unwrap();

        assert!(matches!(
            input.build_problem(),
            Err(JsonProblemError::MissingCoordinates(1))
        ));
    }

    #[test]
    fn test_euclidean_locations() {
        let input: JsonVehicleRoutingProblem = serde_json::from_str(
            r#"{
                "locations": [{ "coordinates": [0.0, 0.0] }, { "coordinates": [3.0, 4.0] }],
                "jobs": [],
                "vehicles": [],
                "distance_method": "euclidean"
            }"#,
        )
        .unwrap();

        let (_, matrices) = input.build_problem().unwrap();

        assert_eq!(
            matrices.travel_time(LocationIdx::new(0), LocationIdx::new(1)),
            Ok(SignedDuration::from_secs(5))
        );
    }

    #[test]
    fn test_from_problem_skips_defaults() {
        let problem = test_utils::create_scenario_problem((0, 200));
        let json = JsonVehicleRoutingProblem::from_problem(&problem, &problem);

        assert_eq!(json.jobs[0].activities.len(), 2);
        assert_eq!(json.jobs[0].activities[1].activity_type, ActivityType::Delivery);
        assert_eq!(json.jobs[0].activities[1].size, None);
        assert_eq!(json.vehicles[0].latest_end, None);
        assert!(json.locations.iter().all(|location| location.coordinates.is_none()));
    }
}
