use jiff::SignedDuration;

use crate::problem::time_window::{INFINITE_TIME, Time};

#[inline]
pub(crate) fn compute_arrival_time(previous_departure_time: Time, travel_time: SignedDuration) -> Time {
    previous_departure_time.saturating_add(travel_time)
}

#[inline]
pub(crate) fn compute_departure_time(start_time: Time, operation_time: SignedDuration) -> Time {
    start_time.saturating_add(operation_time)
}

#[inline]
pub(crate) fn compute_waiting_duration(arrival_time: Time, start_time: Time) -> SignedDuration {
    if start_time > arrival_time {
        start_time - arrival_time
    } else {
        SignedDuration::ZERO
    }
}

/// Latest start at a step so that the next step can still start at `next_latest_start`.
#[inline]
pub(crate) fn compute_latest_start_bound(
    next_latest_start: Time,
    travel_time: SignedDuration,
    operation_time: SignedDuration,
) -> Time {
    if next_latest_start == INFINITE_TIME {
        return INFINITE_TIME;
    }

    next_latest_start
        .saturating_sub(travel_time)
        .saturating_sub(operation_time)
}

#[inline]
pub(crate) fn compute_time_slack(start_time: Time, latest_start_time: Time) -> SignedDuration {
    if latest_start_time == INFINITE_TIME {
        SignedDuration::MAX
    } else {
        latest_start_time.saturating_sub(start_time)
    }
}
