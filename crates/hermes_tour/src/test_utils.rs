use jiff::SignedDuration;

use crate::problem::{
    capacity::Capacity,
    job::Job,
    job_builder::{ActivitySpec, JobBuilder},
    location::Location,
    time_window::TimeWindow,
    travel_cost_matrix::TravelMatrices,
    vehicle::{Vehicle, VehicleBuilder},
    vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
};

//
//  Locations are laid out row by row:
//
//  (0.0, 1.0)  (1.0, 1.0)  (2.0, 1.0)
//  (0.0, 0.0)  (1.0, 0.0)  (2.0, 0.0)
//
pub fn create_location_grid(rows: usize, cols: usize) -> Vec<Location> {
    let mut locations = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            locations.push(Location::from_cartesian(x as f64, y as f64));
        }
    }

    locations
}

pub fn create_vehicle(location_id: usize) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder
        .set_vehicle_id(format!("vehicle-{location_id}"))
        .set_start_location_id(location_id);
    builder.build().unwrap()
}

pub fn create_service_job(location_id: usize, operation_secs: i64, window: Option<(i64, i64)>) -> Job {
    let mut spec =
        ActivitySpec::at(location_id).with_operation_time(SignedDuration::from_secs(operation_secs));
    if let Some((start, end)) = window {
        spec = spec.with_time_window(TimeWindow::from_secs(start, end));
    }

    let mut builder = JobBuilder::new(format!("service-{location_id}"));
    builder.add_service(spec);
    builder.build().unwrap()
}

pub fn create_pickup_delivery_job(pickup_location_id: usize, delivery_location_id: usize, size: f64) -> Job {
    let mut builder = JobBuilder::new(format!(
        "shipment-{pickup_location_id}-{delivery_location_id}"
    ));
    builder
        .add_pickup(ActivitySpec::at(pickup_location_id).with_size(Capacity::from_vec(vec![size])))
        .add_delivery(ActivitySpec::at(delivery_location_id).with_size(Capacity::from_vec(vec![size])));
    builder.build().unwrap()
}

pub fn create_delivery_job(location_id: usize, size: f64) -> Job {
    let mut builder = JobBuilder::new(format!("delivery-{location_id}"));
    builder.add_delivery(ActivitySpec::at(location_id).with_size(Capacity::from_vec(vec![size])));
    builder.build().unwrap()
}

/// Problem over opaque locations with a single vehicle based at location 0.
pub fn create_problem(num_locations: usize, jobs: Vec<Job>) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_locations(vec![Location::opaque(); num_locations])
        .set_jobs(jobs)
        .add_vehicle(create_vehicle(0));
    builder.build().unwrap()
}

/// Depot 0, pickup at 1 (window [0, 100], 10s) and delivery at 2 (5s) with
/// the given delivery window, see [`create_scenario_matrices`].
pub fn create_scenario_problem(delivery_window: (i64, i64)) -> VehicleRoutingProblem {
    let mut job = JobBuilder::new("shipment");
    job.add_pickup(
        ActivitySpec::at(1)
            .with_operation_time(SignedDuration::from_secs(10))
            .with_time_window(TimeWindow::from_secs(0, 100)),
    )
    .add_delivery(
        ActivitySpec::at(2)
            .with_operation_time(SignedDuration::from_secs(5))
            .with_time_window(TimeWindow::from_secs(delivery_window.0, delivery_window.1)),
    );

    create_problem(3, vec![job.build().unwrap()])
}

/// 0 -> 1 takes 5s, 1 -> 2 takes 15s and 2 -> 0 takes 5s.
pub fn create_scenario_matrices() -> TravelMatrices {
    TravelMatrices::from_times(vec![
        vec![0.0, 5.0, 10.0],
        vec![5.0, 0.0, 15.0],
        vec![5.0, 15.0, 0.0],
    ])
}
