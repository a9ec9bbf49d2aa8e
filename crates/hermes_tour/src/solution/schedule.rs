use std::{fmt, sync::Arc};

use jiff::SignedDuration;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{Level, debug, instrument, trace, warn};

use crate::{
    problem::{
        activity::{Activity, ActivityKind},
        job::ActivityId,
        location::LocationIdx,
        time_window::{INFINITE_TIME, Time, format_time},
        travel_time_oracle::{TravelTimeOracle, UnreachableError},
        vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{
        route::{Route, RouteValidationError},
        route_update_iterator::RouteUpdateIterator,
        schedule_params::ScheduleParams,
        statistics::PropagationStatistics,
        utils::{
            compute_arrival_time, compute_departure_time, compute_latest_start_bound,
            compute_time_slack, compute_waiting_duration,
        },
    },
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropagationError {
    #[error(transparent)]
    Unreachable(#[from] UnreachableError),

    #[error(transparent)]
    InvalidRoute(#[from] RouteValidationError),

    #[error("route vehicle {0} is not part of the problem")]
    UnknownVehicle(VehicleIdx),

    #[error("step {from} is out of bounds, the last step is {last}")]
    StepOutOfBounds { from: usize, last: usize },

    #[error("positions {start}..{end} are out of bounds for a route of {len} activities")]
    PositionOutOfBounds { start: usize, end: usize, len: usize },

    #[error("schedule has no latest start times for this route")]
    BoundsUnavailable,
}

/// Why and where a forward pass stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Infeasibility {
    pub step: usize,
    /// `None` for the vehicle boundaries
    pub activity_id: Option<ActivityId>,
    pub kind: ActivityKind,
    pub activity_name: String,
    pub arrival_time: Time,
    pub window_start: Time,
    pub window_end: Time,
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} ({}): arrival {} is after the last window [{}, {}]",
            self.step,
            self.activity_name,
            format_time(self.arrival_time),
            format_time(self.window_start),
            format_time(self.window_end)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    Feasible,
    InfeasibleAt(Infeasibility),
}

impl Propagation {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Propagation::Feasible)
    }

    pub fn infeasible_step(&self) -> Option<usize> {
        match self {
            Propagation::Feasible => None,
            Propagation::InfeasibleAt(infeasibility) => Some(infeasibility.step),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScheduleState {
    #[default]
    NotEvaluated,
    Feasible,
    InfeasibleAt(Infeasibility),
    /// Feasible, with latest start times and slacks
    BoundsComputed,
    /// The last propagation was aborted, nothing stored may be trusted
    Invalid,
}

/// Times of every step of one route, indexed by step (`0` is the vehicle
/// start, `route.len() + 1` the vehicle end).
///
/// Only the first `evaluated_steps` steps hold forward data. Latest start
/// times are only meaningful in [`ScheduleState::BoundsComputed`].
#[derive(Debug, Clone, Default)]
pub struct RouteSchedule {
    params: ScheduleParams,
    statistics: Option<Arc<PropagationStatistics>>,

    state: ScheduleState,
    vehicle_id: Option<VehicleIdx>,
    evaluated_steps: usize,

    /// Travel time from the previous step, zero for the start
    travel_times: Vec<SignedDuration>,
    arrival_times: Vec<Time>,
    start_times: Vec<Time>,
    departure_times: Vec<Time>,
    waiting_durations: Vec<SignedDuration>,
    latest_start_times: Vec<Time>,
}

impl RouteSchedule {
    pub fn new(params: ScheduleParams) -> Self {
        RouteSchedule {
            params,
            ..RouteSchedule::default()
        }
    }

    pub fn with_statistics(mut self, statistics: Arc<PropagationStatistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn is_feasible(&self) -> bool {
        matches!(
            self.state,
            ScheduleState::Feasible | ScheduleState::BoundsComputed
        )
    }

    pub fn has_bounds(&self) -> bool {
        self.state == ScheduleState::BoundsComputed
    }

    pub fn evaluated_steps(&self) -> usize {
        self.evaluated_steps
    }

    pub fn len(&self) -> usize {
        self.arrival_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrival_times.is_empty()
    }

    pub fn travel_time(&self, step: usize) -> SignedDuration {
        self.travel_times[step]
    }

    pub fn arrival_time(&self, step: usize) -> Time {
        self.arrival_times[step]
    }

    pub fn start_time(&self, step: usize) -> Time {
        self.start_times[step]
    }

    pub fn departure_time(&self, step: usize) -> Time {
        self.departure_times[step]
    }

    pub fn waiting_duration(&self, step: usize) -> SignedDuration {
        self.waiting_durations[step]
    }

    pub fn latest_start_time(&self, step: usize) -> Time {
        self.latest_start_times[step]
    }

    /// How much the start at `step` may be delayed without breaking a later window.
    pub fn time_slack(&self, step: usize) -> SignedDuration {
        compute_time_slack(self.start_times[step], self.latest_start_times[step])
    }

    pub fn arrival_times(&self) -> &[Time] {
        &self.arrival_times[..self.evaluated_steps]
    }

    pub fn start_times(&self) -> &[Time] {
        &self.start_times[..self.evaluated_steps]
    }

    pub fn departure_times(&self) -> &[Time] {
        &self.departure_times[..self.evaluated_steps]
    }

    pub fn total_waiting_duration(&self) -> SignedDuration {
        self.waiting_durations[..self.evaluated_steps].iter().sum()
    }

    pub fn transport_duration(&self) -> SignedDuration {
        self.travel_times[..self.evaluated_steps].iter().sum()
    }

    /// From the vehicle start to its arrival at the end, `None` unless feasible.
    pub fn route_duration(&self) -> Option<SignedDuration> {
        if !self.is_feasible() {
            return None;
        }

        let last = self.arrival_times.len().checked_sub(1)?;
        Some(self.arrival_times[last].saturating_sub(self.start_times[0]))
    }

    /// Full forward pass, followed by the backward pass when bounds are enabled.
    pub fn propagate<O>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        oracle: &O,
    ) -> Result<Propagation, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        if let Some(statistics) = &self.statistics {
            statistics.record_full_propagation();
        }

        self.run(problem, route, 0, oracle, false)
    }

    /// Re-evaluates the steps from `from` on, reusing the stored prefix. The
    /// route must be unchanged before `from` since the last evaluation.
    pub fn repropagate_suffix<O>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        from: usize,
        oracle: &O,
    ) -> Result<Propagation, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        let last = route.num_steps() - 1;
        if from > last {
            return Err(PropagationError::StepOutOfBounds { from, last });
        }

        if from == 0 || !self.covers_prefix(route, from) {
            if from > 0 {
                debug!(
                    from,
                    evaluated_steps = self.evaluated_steps,
                    "previous schedule does not cover the prefix, propagating the whole route"
                );

                if let Some(statistics) = &self.statistics {
                    statistics.record_suffix_fallback();
                }
            }

            return self.propagate(problem, route, oracle);
        }

        if let Some(statistics) = &self.statistics {
            statistics.record_suffix_propagation();
        }

        let reuse_bounds = self.state == ScheduleState::BoundsComputed;
        self.run(problem, route, from, oracle, reuse_bounds)
    }

    /// Whether replacing route positions `start..end` with `activity_ids` keeps
    /// the route feasible. Only the replaced segment and its first successor
    /// are evaluated, the rest is covered by the stored latest start times.
    pub fn check_change<O>(
        &self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        activity_ids: impl IntoIterator<Item = ActivityId>,
        start: usize,
        end: usize,
        oracle: &O,
    ) -> Result<bool, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        if let Some(statistics) = &self.statistics {
            statistics.record_change_check();
        }

        if start > end || end > route.len() {
            return Err(PropagationError::PositionOutOfBounds {
                start,
                end,
                len: route.len(),
            });
        }

        if !self.has_bounds_for(route) {
            return Err(PropagationError::BoundsUnavailable);
        }

        let updates = self.updated_activities_iter(
            problem,
            route,
            activity_ids.into_iter(),
            start,
            end,
            oracle,
        )?;

        for update in updates {
            let update = update?;

            let Some(start_time) = update.start_time else {
                return Ok(false);
            };

            if let Some(step) = update.current_step {
                return Ok(start_time <= self.latest_start_times[step]);
            }
        }

        Ok(true)
    }

    pub fn can_insert<O>(
        &self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        activity_id: ActivityId,
        position: usize,
        oracle: &O,
    ) -> Result<bool, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        self.check_change(problem, route, [activity_id], position, position, oracle)
    }

    /// Inserts `first` before `first_position` and `second` before
    /// `second_position`, both positions referring to the current route.
    pub fn can_insert_pair<O>(
        &self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        (first, first_position): (ActivityId, usize),
        (second, second_position): (ActivityId, usize),
        oracle: &O,
    ) -> Result<bool, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        if first_position > second_position || second_position > route.len() {
            return Err(PropagationError::PositionOutOfBounds {
                start: first_position,
                end: second_position,
                len: route.len(),
            });
        }

        let between = &route.activity_ids()[first_position..second_position];

        self.check_change(
            problem,
            route,
            std::iter::once(first)
                .chain(between.iter().copied())
                .chain(std::iter::once(second)),
            first_position,
            second_position,
            oracle,
        )
    }

    /// Timing of the steps that would follow `start` if positions `start..end`
    /// were replaced by `activity_ids`, continuing into the untouched successors.
    pub fn updated_activities_iter<'a, I, O>(
        &'a self,
        problem: &'a VehicleRoutingProblem,
        route: &'a Route,
        activity_ids: I,
        start: usize,
        end: usize,
        oracle: &'a O,
    ) -> Result<RouteUpdateIterator<'a, I, O>, PropagationError>
    where
        I: Iterator<Item = ActivityId>,
        O: TravelTimeOracle + ?Sized,
    {
        // The step right before position `start`
        if self.evaluated_steps <= start {
            return Err(PropagationError::BoundsUnavailable);
        }

        let previous = activity_at(problem, route, start)?;

        Ok(RouteUpdateIterator::new(
            problem,
            route,
            activity_ids,
            end + 1,
            previous.location_id(),
            self.departure_times[start],
            oracle,
            self.statistics.as_deref(),
        ))
    }

    fn covers_prefix(&self, route: &Route, from: usize) -> bool {
        self.vehicle_id == Some(route.vehicle_id())
            && !matches!(
                self.state,
                ScheduleState::NotEvaluated | ScheduleState::Invalid
            )
            && self.evaluated_steps >= from
    }

    fn has_bounds_for(&self, route: &Route) -> bool {
        self.state == ScheduleState::BoundsComputed
            && self.vehicle_id == Some(route.vehicle_id())
            && self.latest_start_times.len() == route.num_steps()
    }

    fn run<O>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        from: usize,
        oracle: &O,
        reuse_bounds: bool,
    ) -> Result<Propagation, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        match self.evaluate(problem, route, from, oracle, reuse_bounds) {
            Ok(propagation) => Ok(propagation),
            Err(error) => {
                warn!(vehicle_id = %route.vehicle_id(), %error, "route propagation aborted");
                self.invalidate();
                Err(error)
            }
        }
    }

    fn evaluate<O>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        from: usize,
        oracle: &O,
        reuse_bounds: bool,
    ) -> Result<Propagation, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        if problem.try_vehicle(route.vehicle_id()).is_none() {
            return Err(PropagationError::UnknownVehicle(route.vehicle_id()));
        }

        if self.params.check_job_ordering {
            route.validate_job_ordering(problem)?;
        }

        self.vehicle_id = Some(route.vehicle_id());
        self.resize(route.num_steps());

        if let Propagation::InfeasibleAt(infeasibility) =
            self.forward(problem, route, from, oracle)?
        {
            debug!(
                vehicle_id = %route.vehicle_id(),
                %infeasibility,
                "route is infeasible"
            );

            if let Some(statistics) = &self.statistics {
                statistics.record_infeasible();
            }

            self.state = ScheduleState::InfeasibleAt(infeasibility.clone());
            return Ok(Propagation::InfeasibleAt(infeasibility));
        }

        self.state = ScheduleState::Feasible;

        if self.params.compute_bounds {
            self.backward(problem, route, from, reuse_bounds)?;
            self.state = ScheduleState::BoundsComputed;
        }

        Ok(Propagation::Feasible)
    }

    fn forward<O>(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        from: usize,
        oracle: &O,
    ) -> Result<Propagation, PropagationError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        let mut previous: Option<(LocationIdx, Time)> = if from == 0 {
            None
        } else {
            let activity = activity_at(problem, route, from - 1)?;
            Some((activity.location_id(), self.departure_times[from - 1]))
        };

        self.evaluated_steps = from;

        for step in from..route.num_steps() {
            let activity = activity_at(problem, route, step)?;

            let (travel_time, arrival_time) = match previous {
                None => (
                    SignedDuration::ZERO,
                    problem.vehicle(route.vehicle_id()).earliest_start(),
                ),
                Some((location_id, departure_time)) => {
                    let travel_time =
                        self.query_oracle(oracle, location_id, activity.location_id())?;
                    (travel_time, compute_arrival_time(departure_time, travel_time))
                }
            };

            self.travel_times[step] = travel_time;
            self.arrival_times[step] = arrival_time;

            let Some(start_time) = activity.time_windows().earliest_start(arrival_time) else {
                return Ok(Propagation::InfeasibleAt(Infeasibility {
                    step,
                    activity_id: (1..=route.len())
                        .contains(&step)
                        .then(|| route.activity_id(step - 1)),
                    kind: activity.kind(),
                    activity_name: activity.name().to_owned(),
                    arrival_time,
                    window_start: activity.time_windows().start(),
                    window_end: activity.time_windows().end(),
                }));
            };

            let departure_time = compute_departure_time(start_time, activity.operation_time());

            self.start_times[step] = start_time;
            self.departure_times[step] = departure_time;
            self.waiting_durations[step] = compute_waiting_duration(arrival_time, start_time);
            self.evaluated_steps = step + 1;

            trace!(
                step,
                arrival_time = ?arrival_time,
                start_time = ?start_time,
                departure_time = ?departure_time,
                "step propagated"
            );

            previous = Some((activity.location_id(), departure_time));
        }

        Ok(Propagation::Feasible)
    }

    fn backward(
        &mut self,
        problem: &VehicleRoutingProblem,
        route: &Route,
        from: usize,
        reuse_bounds: bool,
    ) -> Result<(), PropagationError> {
        let last = route.num_steps() - 1;

        let end = activity_at(problem, route, last)?;
        self.latest_start_times[last] = end
            .time_windows()
            .latest_start(INFINITE_TIME)
            .unwrap_or(self.start_times[last]);

        for step in (0..last).rev() {
            let activity = activity_at(problem, route, step)?;

            let bound = compute_latest_start_bound(
                self.latest_start_times[step + 1],
                self.travel_times[step + 1],
                activity.operation_time(),
            );

            let latest_start_time = activity
                .time_windows()
                .latest_start(bound)
                .unwrap_or(self.start_times[step]);

            // Steps before `from` only depend on this value from here on
            if reuse_bounds && step < from && self.latest_start_times[step] == latest_start_time {
                trace!(step, "latest start unchanged, stopping backward pass");
                break;
            }

            self.latest_start_times[step] = latest_start_time;
        }

        Ok(())
    }

    fn query_oracle<O>(
        &self,
        oracle: &O,
        from: LocationIdx,
        to: LocationIdx,
    ) -> Result<SignedDuration, UnreachableError>
    where
        O: TravelTimeOracle + ?Sized,
    {
        if let Some(statistics) = &self.statistics {
            statistics.record_oracle_call();
        }

        oracle.travel_time(from, to)
    }

    fn resize(&mut self, num_steps: usize) {
        self.travel_times.resize(num_steps, SignedDuration::ZERO);
        self.arrival_times.resize(num_steps, INFINITE_TIME);
        self.start_times.resize(num_steps, INFINITE_TIME);
        self.departure_times.resize(num_steps, INFINITE_TIME);
        self.waiting_durations.resize(num_steps, SignedDuration::ZERO);
        self.latest_start_times.resize(num_steps, INFINITE_TIME);
    }

    fn invalidate(&mut self) {
        self.state = ScheduleState::Invalid;
        self.evaluated_steps = 0;
    }
}

fn activity_at<'a>(
    problem: &'a VehicleRoutingProblem,
    route: &Route,
    step: usize,
) -> Result<&'a Activity, PropagationError> {
    route.activity_at_step(problem, step).ok_or_else(|| {
        if problem.try_vehicle(route.vehicle_id()).is_none() {
            PropagationError::UnknownVehicle(route.vehicle_id())
        } else if (1..=route.len()).contains(&step) {
            PropagationError::InvalidRoute(RouteValidationError::UnknownActivity(
                route.activity_id(step - 1),
            ))
        } else {
            PropagationError::StepOutOfBounds {
                from: step,
                last: route.num_steps() - 1,
            }
        }
    })
}

/// Propagates independent routes in parallel, `routes[i]` into `schedules[i]`.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn propagate_all<O>(
    problem: &VehicleRoutingProblem,
    routes: &[Route],
    schedules: &mut [RouteSchedule],
    oracle: &O,
) -> Vec<Result<Propagation, PropagationError>>
where
    O: TravelTimeOracle + ?Sized,
{
    if routes.len() != schedules.len() {
        warn!(
            routes = routes.len(),
            schedules = schedules.len(),
            "mismatched routes and schedules, extra entries are ignored"
        );
    }

    schedules
        .par_iter_mut()
        .zip(routes.par_iter())
        .map(|(schedule, route)| schedule.propagate(problem, route, oracle))
        .collect()
}
