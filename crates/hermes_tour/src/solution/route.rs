use fxhash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::problem::{
    activity::Activity,
    capacity::Capacity,
    job::{ActivityId, JobIdx},
    vehicle::VehicleIdx,
    vehicle_routing_problem::VehicleRoutingProblem,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteValidationError {
    #[error("route references unknown activity {0}")]
    UnknownActivity(ActivityId),

    #[error("activity {0} appears more than once in the route")]
    DuplicateActivity(ActivityId),

    #[error("job {job_id}: {later} is visited before {earlier}")]
    OutOfOrder {
        job_id: JobIdx,
        earlier: ActivityId,
        later: ActivityId,
    },

    #[error("job {job_id}: {missing} is missing from the route")]
    IncompleteJob { job_id: JobIdx, missing: ActivityId },
}

/// Ordered activities served by one vehicle. Start and End are implicit: for a
/// route of `n` activities, step `0` is the vehicle start, steps `1..=n` are the
/// activities and step `n + 1` is the vehicle end. Positions index the activity
/// list, so the activity at position `p` sits at step `p + 1`.
#[derive(Clone, Debug)]
pub struct Route {
    vehicle_id: VehicleIdx,

    /// List of activity ids in the route order
    activity_ids: Vec<ActivityId>,

    // Map of ActivityId to position in activity_ids
    positions: FxHashMap<ActivityId, usize>,
}

impl Route {
    pub fn new(vehicle_id: VehicleIdx) -> Self {
        Route {
            vehicle_id,
            activity_ids: Vec::new(),
            positions: FxHashMap::default(),
        }
    }

    pub fn with_activities(vehicle_id: VehicleIdx, activity_ids: Vec<ActivityId>) -> Self {
        let mut route = Route {
            vehicle_id,
            activity_ids,
            positions: FxHashMap::default(),
        };
        route.update_positions();
        route
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn len(&self) -> usize {
        self.activity_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activity_ids.is_empty()
    }

    /// Number of schedule steps, boundaries included.
    pub fn num_steps(&self) -> usize {
        self.activity_ids.len() + 2
    }

    pub fn activity_ids(&self) -> &[ActivityId] {
        &self.activity_ids
    }

    pub fn activity_id(&self, position: usize) -> ActivityId {
        self.activity_ids[position]
    }

    pub fn position_of(&self, activity_id: ActivityId) -> Option<usize> {
        self.positions.get(&activity_id).copied()
    }

    pub fn contains(&self, activity_id: ActivityId) -> bool {
        self.positions.contains_key(&activity_id)
    }

    /// Activity performed at `step`, `None` past the end or for an unknown id
    /// or vehicle.
    pub fn activity_at_step<'a>(
        &self,
        problem: &'a VehicleRoutingProblem,
        step: usize,
    ) -> Option<&'a Activity> {
        if step == 0 {
            problem.vehicle_start(self.vehicle_id)
        } else if step <= self.activity_ids.len() {
            problem.try_activity(self.activity_ids[step - 1])
        } else if step == self.activity_ids.len() + 1 {
            problem.vehicle_end(self.vehicle_id)
        } else {
            None
        }
    }

    /// Inserts the activity before `position`. Returns false when the activity
    /// is already routed or the position is past the end.
    pub fn insert(&mut self, position: usize, activity_id: ActivityId) -> bool {
        if self.contains(activity_id) || position > self.activity_ids.len() {
            return false;
        }

        self.activity_ids.insert(position, activity_id);
        self.update_positions_from(position);
        true
    }

    pub fn remove(&mut self, position: usize) -> Option<ActivityId> {
        if position >= self.activity_ids.len() {
            return None;
        }

        let activity_id = self.activity_ids.remove(position);
        self.positions.remove(&activity_id);
        self.update_positions_from(position);
        Some(activity_id)
    }

    pub fn duplicate(&self) -> Route {
        self.clone()
    }

    fn update_positions(&mut self) {
        self.positions.clear();
        self.update_positions_from(0);
    }

    fn update_positions_from(&mut self, position: usize) {
        for (index, &activity_id) in self.activity_ids.iter().enumerate().skip(position) {
            self.positions.insert(activity_id, index);
        }
    }

    /// Checks that every routed activity exists, appears once, that the
    /// activities of a job follow their list order and that no job is partially routed.
    pub fn validate_job_ordering(
        &self,
        problem: &VehicleRoutingProblem,
    ) -> Result<(), RouteValidationError> {
        let mut seen = FxHashSet::default();
        // (activity index, route position) of every routed activity, per job
        let mut visits: FxHashMap<JobIdx, Vec<(usize, usize)>> = FxHashMap::default();

        for (position, &activity_id) in self.activity_ids.iter().enumerate() {
            if problem.try_activity(activity_id).is_none() {
                return Err(RouteValidationError::UnknownActivity(activity_id));
            }

            if !seen.insert(activity_id) {
                return Err(RouteValidationError::DuplicateActivity(activity_id));
            }

            visits
                .entry(activity_id.job_id())
                .or_default()
                .push((activity_id.index(), position));
        }

        let mut visits = visits.into_iter().collect::<Vec<_>>();
        visits.sort_unstable_by_key(|(job_id, _)| *job_id);

        for (job_id, mut job_visits) in visits {
            job_visits.sort_unstable_by_key(|&(index, _)| index);

            for pair in job_visits.windows(2) {
                let (earlier_index, earlier_position) = pair[0];
                let (later_index, later_position) = pair[1];

                if later_position < earlier_position {
                    return Err(RouteValidationError::OutOfOrder {
                        job_id,
                        earlier: ActivityId::new(job_id, earlier_index),
                        later: ActivityId::new(job_id, later_index),
                    });
                }
            }

            let job_len = problem.job(job_id).len();
            if job_visits.len() < job_len {
                let missing = job_visits
                    .iter()
                    .enumerate()
                    .find(|&(expected, &(index, _))| expected != index)
                    .map_or(job_visits.len(), |(expected, _)| expected);

                return Err(RouteValidationError::IncompleteJob {
                    job_id,
                    missing: ActivityId::new(job_id, missing),
                });
            }
        }

        Ok(())
    }

    /// Load carried after every step. Goods whose job unloads more than it
    /// loads inside the route are assumed loaded at the start depot.
    pub fn loads(&self, problem: &VehicleRoutingProblem) -> Result<RouteLoads, RouteValidationError> {
        let mut net_demands: FxHashMap<JobIdx, Capacity> = FxHashMap::default();
        let mut demands = Vec::with_capacity(self.activity_ids.len());

        for &activity_id in &self.activity_ids {
            let activity = problem
                .try_activity(activity_id)
                .ok_or(RouteValidationError::UnknownActivity(activity_id))?;

            let demand = activity.capacity_demand();
            *net_demands.entry(activity_id.job_id()).or_default() += &demand;
            demands.push(demand);
        }

        let mut initial = Capacity::with_dimensions(problem.capacity_dimensions());
        for net_demand in net_demands.values() {
            let mut unloaded = Capacity::EMPTY;
            unloaded.update_min(net_demand);
            initial -= &unloaded;
        }

        let mut loads = Vec::with_capacity(self.num_steps());
        let mut peak = initial.clone();
        let mut current = initial.clone();
        loads.push(current.clone());

        for demand in &demands {
            current += demand;
            peak.update_max(&current);
            loads.push(current.clone());
        }

        // End unloads nothing
        loads.push(current);

        Ok(RouteLoads {
            initial,
            loads,
            peak,
        })
    }
}

/// Load profile of a route, indexed by step.
#[derive(Debug, Clone)]
pub struct RouteLoads {
    initial: Capacity,
    loads: Vec<Capacity>,
    peak: Capacity,
}

impl RouteLoads {
    pub fn initial(&self) -> &Capacity {
        &self.initial
    }

    pub fn load_at_step(&self, step: usize) -> Option<&Capacity> {
        self.loads.get(step)
    }

    pub fn loads(&self) -> &[Capacity] {
        &self.loads
    }

    pub fn peak(&self) -> &Capacity {
        &self.peak
    }

    /// First step at which some dimension becomes negative.
    pub fn first_negative_step(&self) -> Option<usize> {
        self.loads
            .iter()
            .position(|load| load.has_negative_dimension())
    }

    pub fn is_feasible(&self, capacity: &Capacity) -> bool {
        self.first_negative_step().is_none() && self.peak.is_capacity_satisfied(capacity)
    }
}
