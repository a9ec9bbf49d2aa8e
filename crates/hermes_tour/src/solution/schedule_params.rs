use serde::Deserialize;

/// Options of a route schedule.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    /// Runs the backward pass after a feasible forward pass, required by insertion checks.
    pub compute_bounds: bool,

    /// Validates the intra-job visiting order of the route before propagating.
    pub check_job_ordering: bool,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        ScheduleParams {
            compute_bounds: true,
            check_job_ordering: false,
        }
    }
}
