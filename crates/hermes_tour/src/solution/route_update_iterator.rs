use jiff::SignedDuration;

use crate::{
    problem::{
        job::ActivityId, location::LocationIdx, time_window::Time,
        travel_time_oracle::TravelTimeOracle, vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{
        route::{Route, RouteValidationError},
        schedule::PropagationError,
        statistics::PropagationStatistics,
        utils::{compute_arrival_time, compute_departure_time, compute_waiting_duration},
    },
};

#[derive(PartialEq, Eq, Debug)]
pub struct RouteUpdateActivityData {
    /// `None` for the vehicle end
    pub activity_id: Option<ActivityId>,
    pub arrival_time: Time,
    /// `None` when the arrival is after every window
    pub start_time: Option<Time>,
    pub departure_time: Option<Time>,
    pub waiting_duration: SignedDuration,
    /// Step of an untouched successor in the evaluated schedule
    pub current_step: Option<usize>,
}

/// Simulates a route change: first the new activities, then the untouched
/// successors of the current route. Stops after the first infeasible step.
pub struct RouteUpdateIterator<'a, I, O: ?Sized> {
    problem: &'a VehicleRoutingProblem,
    route: &'a Route,
    oracle: &'a O,
    statistics: Option<&'a PropagationStatistics>,
    activity_ids: I,

    next_step: usize,
    previous_location_id: LocationIdx,
    previous_departure_time: Time,
    done: bool,
}

impl<'a, I, O> RouteUpdateIterator<'a, I, O>
where
    I: Iterator<Item = ActivityId>,
    O: TravelTimeOracle + ?Sized,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        problem: &'a VehicleRoutingProblem,
        route: &'a Route,
        activity_ids: I,
        next_step: usize,
        previous_location_id: LocationIdx,
        previous_departure_time: Time,
        oracle: &'a O,
        statistics: Option<&'a PropagationStatistics>,
    ) -> Self {
        RouteUpdateIterator {
            problem,
            route,
            oracle,
            statistics,
            activity_ids,
            next_step,
            previous_location_id,
            previous_departure_time,
            done: false,
        }
    }

    fn fail(&mut self, error: PropagationError) -> Option<Result<RouteUpdateActivityData, PropagationError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl<I, O> Iterator for RouteUpdateIterator<'_, I, O>
where
    I: Iterator<Item = ActivityId>,
    O: TravelTimeOracle + ?Sized,
{
    type Item = Result<RouteUpdateActivityData, PropagationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let (activity_id, activity, current_step) = match self.activity_ids.next() {
            Some(activity_id) => match self.problem.try_activity(activity_id) {
                Some(activity) => (Some(activity_id), activity, None),
                None => {
                    return self.fail(PropagationError::InvalidRoute(
                        RouteValidationError::UnknownActivity(activity_id),
                    ));
                }
            },
            None => {
                let step = self.next_step;
                let Some(activity) = self.route.activity_at_step(self.problem, step) else {
                    self.done = true;
                    return None;
                };
                self.next_step += 1;

                let activity_id = (1..=self.route.len())
                    .contains(&step)
                    .then(|| self.route.activity_id(step - 1));

                (activity_id, activity, Some(step))
            }
        };

        if let Some(statistics) = self.statistics {
            statistics.record_oracle_call();
        }

        let travel_time = match self
            .oracle
            .travel_time(self.previous_location_id, activity.location_id())
        {
            Ok(travel_time) => travel_time,
            Err(error) => return self.fail(error.into()),
        };

        let arrival_time = compute_arrival_time(self.previous_departure_time, travel_time);
        let start_time = activity.time_windows().earliest_start(arrival_time);
        let departure_time =
            start_time.map(|start_time| compute_departure_time(start_time, activity.operation_time()));

        match departure_time {
            Some(departure_time) => {
                self.previous_location_id = activity.location_id();
                self.previous_departure_time = departure_time;
            }
            None => self.done = true,
        }

        Some(Ok(RouteUpdateActivityData {
            activity_id,
            arrival_time,
            start_time,
            departure_time,
            waiting_duration: start_time
                .map_or(SignedDuration::ZERO, |start_time| {
                    compute_waiting_duration(arrival_time, start_time)
                }),
            current_step,
        }))
    }
}
