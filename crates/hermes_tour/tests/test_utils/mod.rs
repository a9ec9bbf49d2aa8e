#![allow(dead_code)]

use hermes_tour::{
    problem::{
        capacity::Capacity,
        job::{ActivityId, Job, JobIdx},
        job_builder::{ActivitySpec, JobBuilder},
        location::Location,
        time_window::TimeWindow,
        travel_cost_matrix::TravelMatrices,
        vehicle::{Vehicle, VehicleBuilder, VehicleIdx},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solution::route::Route,
};
use jiff::SignedDuration;

//
//  Y-axis
//  ^
//  | (0.0, 2.0)  (1.0, 2.0)  (2.0, 2.0)
//  |
//  | (0.0, 1.0)  (1.0, 1.0)  (2.0, 1.0)
//  |
//  | (0.0, 0.0)  (1.0, 0.0)  (2.0, 0.0)
//  +------------------------------------> X-axis
pub fn create_location_grid(rows: usize, cols: usize, spacing: f64) -> Vec<Location> {
    let mut locations = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            locations.push(Location::from_cartesian(x as f64 * spacing, y as f64 * spacing));
        }
    }

    locations
}

pub fn create_vehicle(id: &str, location_id: usize) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder.set_vehicle_id(id).set_start_location_id(location_id);
    builder.build().unwrap()
}

pub fn create_service_job(
    id: &str,
    location_id: usize,
    operation_secs: i64,
    windows: &[(i64, i64)],
) -> Job {
    let mut spec =
        ActivitySpec::at(location_id).with_operation_time(SignedDuration::from_secs(operation_secs));
    for &(start, end) in windows {
        spec = spec.with_time_window(TimeWindow::from_secs(start, end));
    }

    let mut builder = JobBuilder::new(id);
    builder.add_service(spec);
    builder.build().unwrap()
}

pub fn create_pickup_delivery_job(
    id: &str,
    pickup_location_id: usize,
    delivery_location_id: usize,
    size: f64,
) -> Job {
    let mut builder = JobBuilder::new(id);
    builder
        .add_pickup(ActivitySpec::at(pickup_location_id).with_size(Capacity::from_vec(vec![size])))
        .add_delivery(
            ActivitySpec::at(delivery_location_id).with_size(Capacity::from_vec(vec![size])),
        );
    builder.build().unwrap()
}

pub fn create_test_problem(
    locations: Vec<Location>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_locations(locations)
        .set_jobs(jobs)
        .set_vehicles(vehicles);
    builder.build().unwrap()
}

/// Euclidean travel times, rounded to whole seconds.
pub fn create_grid_matrices(locations: &[Location]) -> TravelMatrices {
    TravelMatrices::from_euclidean(locations, true)
}

pub fn activity_id(job: usize, index: usize) -> ActivityId {
    ActivityId::new(JobIdx::new(job), index)
}

/// Route visiting the first activity of every job, in job order.
pub fn create_service_route(vehicle_id: usize, jobs: &[usize]) -> Route {
    Route::with_activities(
        VehicleIdx::new(vehicle_id),
        jobs.iter().map(|&job| activity_id(job, 0)).collect(),
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
