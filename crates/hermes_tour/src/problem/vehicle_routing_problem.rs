use thiserror::Error;

use crate::problem::{
    activity::Activity,
    job::{ActivityId, Job, JobIdx},
};

use super::{
    location::{Location, LocationIdx},
    vehicle::{Vehicle, VehicleIdx},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProblemError {
    #[error("job {job_id} references unknown location {location_id}")]
    UnknownJobLocation {
        job_id: String,
        location_id: LocationIdx,
    },

    #[error("vehicle {vehicle_id} references unknown location {location_id}")]
    UnknownVehicleLocation {
        vehicle_id: String,
        location_id: LocationIdx,
    },
}

/// Registry of the locations, jobs and vehicles of one problem. Activities are
/// resolved through it by [`ActivityId`].
#[derive(Debug)]
pub struct VehicleRoutingProblem {
    id: Option<String>,
    locations: Vec<Location>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,

    start_activities: Vec<Activity>,
    end_activities: Vec<Activity>,

    has_time_windows: bool,
    capacity_dimensions: usize,
}

impl VehicleRoutingProblem {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job_id: JobIdx) -> &Job {
        &self.jobs[job_id]
    }

    pub fn try_job(&self, job_id: JobIdx) -> Option<&Job> {
        self.jobs.get(job_id.get())
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn try_vehicle(&self, vehicle_id: VehicleIdx) -> Option<&Vehicle> {
        self.vehicles.get(vehicle_id.get())
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationIdx) -> Option<&Location> {
        self.locations.get(location_id.get())
    }

    pub fn activity(&self, activity_id: ActivityId) -> &Activity {
        &self.jobs[activity_id.job_id()].activities()[activity_id.index()]
    }

    pub fn try_activity(&self, activity_id: ActivityId) -> Option<&Activity> {
        self.try_job(activity_id.job_id())
            .and_then(|job| job.activity(activity_id.index()))
    }

    pub fn vehicle_start(&self, vehicle_id: VehicleIdx) -> Option<&Activity> {
        self.start_activities.get(vehicle_id.get())
    }

    pub fn vehicle_end(&self, vehicle_id: VehicleIdx) -> Option<&Activity> {
        self.end_activities.get(vehicle_id.get())
    }

    pub fn activity_ids(&self) -> impl Iterator<Item = ActivityId> + '_ {
        self.jobs
            .iter()
            .enumerate()
            .flat_map(|(index, job)| job.activity_ids(JobIdx::new(index)))
    }

    pub fn has_time_windows(&self) -> bool {
        self.has_time_windows
    }

    pub fn capacity_dimensions(&self) -> usize {
        self.capacity_dimensions
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    id: Option<String>,
    locations: Vec<Location>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut VehicleRoutingProblemBuilder {
        self.id = Some(id.into());
        self
    }

    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut VehicleRoutingProblemBuilder {
        self.locations = locations;
        self
    }

    pub fn set_jobs(&mut self, jobs: Vec<Job>) -> &mut VehicleRoutingProblemBuilder {
        self.jobs = jobs;
        self
    }

    pub fn add_job(&mut self, job: Job) -> &mut VehicleRoutingProblemBuilder {
        self.jobs.push(job);
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut VehicleRoutingProblemBuilder {
        self.vehicles = vehicles;
        self
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> &mut VehicleRoutingProblemBuilder {
        self.vehicles.push(vehicle);
        self
    }

    pub fn build(self) -> Result<VehicleRoutingProblem, ProblemError> {
        let num_locations = self.locations.len();

        for job in &self.jobs {
            for activity in job.activities() {
                if activity.location_id().get() >= num_locations {
                    return Err(ProblemError::UnknownJobLocation {
                        job_id: job.external_id().to_owned(),
                        location_id: activity.location_id(),
                    });
                }
            }
        }

        for vehicle in &self.vehicles {
            for location_id in [vehicle.start_location_id(), vehicle.end_location_id()] {
                if location_id.get() >= num_locations {
                    return Err(ProblemError::UnknownVehicleLocation {
                        vehicle_id: vehicle.external_id().to_owned(),
                        location_id,
                    });
                }
            }
        }

        let has_time_windows = self.jobs.iter().any(|job| job.has_time_windows());
        let capacity_dimensions = self
            .jobs
            .iter()
            .flat_map(|job| job.activities().iter())
            .map(|activity| activity.size().len())
            .chain(self.vehicles.iter().map(|vehicle| vehicle.capacity().len()))
            .max()
            .unwrap_or(0);

        let start_activities = self.vehicles.iter().map(Vehicle::start_activity).collect();
        let end_activities = self.vehicles.iter().map(Vehicle::end_activity).collect();

        Ok(VehicleRoutingProblem {
            id: self.id,
            locations: self.locations,
            jobs: self.jobs,
            vehicles: self.vehicles,
            start_activities,
            end_activities,
            has_time_windows,
            capacity_dimensions,
        })
    }
}
