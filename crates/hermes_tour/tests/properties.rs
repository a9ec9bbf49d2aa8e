use hermes_tour::{
    problem::{
        job::Job, travel_cost_matrix::TravelMatrices,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{
        route::Route,
        schedule::{Propagation, RouteSchedule},
    },
};
use jiff::SignedDuration;
use proptest::prelude::*;

mod test_utils;

/// `(location_id, operation_secs, window_start, window_length)`
type ServiceParams = (usize, i64, i64, i64);

fn service_params() -> impl Strategy<Value = ServiceParams> {
    (0usize..9, 0i64..20, 0i64..80, 0i64..240)
}

fn create_services(params: &[ServiceParams]) -> Vec<Job> {
    params
        .iter()
        .enumerate()
        .map(|(index, &(location_id, operation_secs, start, length))| {
            test_utils::create_service_job(
                &index.to_string(),
                location_id,
                operation_secs,
                &[(start, start + length)],
            )
        })
        .collect()
}

fn create_problem(params: &[ServiceParams]) -> (VehicleRoutingProblem, TravelMatrices) {
    let locations = test_utils::create_location_grid(3, 3, 10.0);
    let matrices = test_utils::create_grid_matrices(&locations);
    let problem = test_utils::create_test_problem(
        locations,
        create_services(params),
        vec![test_utils::create_vehicle("0", 0)],
    );

    (problem, matrices)
}

fn propagate(
    problem: &VehicleRoutingProblem,
    route: &Route,
    matrices: &TravelMatrices,
) -> (RouteSchedule, Propagation) {
    let mut schedule = RouteSchedule::default();
    let propagation = schedule.propagate(problem, route, matrices).unwrap();
    (schedule, propagation)
}

fn assert_same_schedule(left: &RouteSchedule, right: &RouteSchedule) -> Result<(), TestCaseError> {
    prop_assert_eq!(left.state(), right.state());
    prop_assert_eq!(left.arrival_times(), right.arrival_times());
    prop_assert_eq!(left.start_times(), right.start_times());
    prop_assert_eq!(left.departure_times(), right.departure_times());

    if left.has_bounds() {
        for step in 0..left.len() {
            prop_assert_eq!(left.latest_start_time(step), right.latest_start_time(step));
        }
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        max_global_rejects: 4096,
        ..ProptestConfig::default()
    })]

    #[test]
    fn propagation_is_idempotent(params in prop::collection::vec(service_params(), 0..8)) {
        let (problem, matrices) = create_problem(&params);
        let route = test_utils::create_service_route(0, &(0..params.len()).collect::<Vec<_>>());

        let (mut schedule, first) = propagate(&problem, &route, &matrices);
        let before = schedule.clone();
        let second = schedule.propagate(&problem, &route, &matrices).unwrap();

        prop_assert_eq!(first, second);
        assert_same_schedule(&schedule, &before)?;
    }

    #[test]
    fn departures_follow_arrivals_and_window_openings(
        params in prop::collection::vec(service_params(), 0..8),
    ) {
        let (problem, matrices) = create_problem(&params);
        let route = test_utils::create_service_route(0, &(0..params.len()).collect::<Vec<_>>());
        let (schedule, _) = propagate(&problem, &route, &matrices);

        for step in 0..schedule.evaluated_steps() {
            // Vehicle boundaries have no operation time and open at zero
            let (operation_secs, window_start) = match step.checked_sub(1).and_then(|i| params.get(i)) {
                Some(&(_, operation_secs, window_start, _)) => (operation_secs, window_start),
                None => (0, 0),
            };
            let operation_time = SignedDuration::from_secs(operation_secs);

            prop_assert!(schedule.departure_time(step) >= schedule.arrival_time(step));
            prop_assert!(schedule.start_time(step) >= schedule.arrival_time(step));
            prop_assert!(schedule.start_time(step) >= SignedDuration::from_secs(window_start));
            prop_assert_eq!(schedule.departure_time(step), schedule.start_time(step) + operation_time);
            prop_assert!(
                schedule.departure_time(step) >= SignedDuration::from_secs(window_start) + operation_time
            );
        }
    }

    #[test]
    fn suffix_propagation_matches_full_propagation(
        params in prop::collection::vec(service_params(), 1..8),
        removed in any::<prop::sample::Index>(),
    ) {
        let (problem, matrices) = create_problem(&params);
        let mut route = test_utils::create_service_route(0, &(0..params.len()).collect::<Vec<_>>());

        let (mut schedule, _) = propagate(&problem, &route, &matrices);

        let position = removed.index(route.len());
        route.remove(position);
        schedule.repropagate_suffix(&problem, &route, position + 1, &matrices).unwrap();

        let (expected, _) = propagate(&problem, &route, &matrices);
        assert_same_schedule(&schedule, &expected)?;
    }

    #[test]
    fn insertion_check_matches_full_propagation(
        params in prop::collection::vec(service_params(), 2..6),
        position in any::<prop::sample::Index>(),
    ) {
        let (problem, matrices) = create_problem(&params);
        let candidate = params.len() - 1;
        let mut route = test_utils::create_service_route(0, &(0..candidate).collect::<Vec<_>>());

        let (schedule, propagation) = propagate(&problem, &route, &matrices);
        prop_assume!(propagation.is_feasible());

        let position = position.index(route.len() + 1);
        let activity_id = test_utils::activity_id(candidate, 0);
        let accepted = schedule
            .can_insert(&problem, &route, activity_id, position, &matrices)
            .unwrap();

        route.insert(position, activity_id);
        let (_, propagation) = propagate(&problem, &route, &matrices);

        prop_assert_eq!(accepted, propagation.is_feasible());
    }

    #[test]
    fn longer_operation_never_advances_later_arrivals(
        params in prop::collection::vec(service_params(), 1..8),
        delayed in any::<prop::sample::Index>(),
        extra_secs in 1i64..30,
    ) {
        let route = test_utils::create_service_route(0, &(0..params.len()).collect::<Vec<_>>());
        let (problem, matrices) = create_problem(&params);
        let (schedule, propagation) = propagate(&problem, &route, &matrices);

        let mut slower = params.clone();
        let delayed = delayed.index(slower.len());
        slower[delayed].1 += extra_secs;
        let (slower_problem, _) = create_problem(&slower);
        let (slower_schedule, slower_propagation) = propagate(&slower_problem, &route, &matrices);

        if slower_propagation.is_feasible() {
            prop_assert!(propagation.is_feasible());
        }

        let evaluated = schedule.evaluated_steps().min(slower_schedule.evaluated_steps());
        for step in 0..evaluated {
            prop_assert!(slower_schedule.arrival_time(step) >= schedule.arrival_time(step));
        }
    }
}
