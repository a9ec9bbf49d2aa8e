use std::fmt;

use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    capacity::Capacity,
    location::LocationIdx,
    time_window::{Time, TimeWindow, TimeWindows, format_time},
};

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Start,
    End,
    Service,
    Pickup,
    Delivery,
    Exchange,
}

impl ActivityKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ActivityKind::Start => "start",
            ActivityKind::End => "end",
            ActivityKind::Service => "service",
            ActivityKind::Pickup => "pickup",
            ActivityKind::Delivery => "delivery",
            ActivityKind::Exchange => "exchange",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One stop of a job or a vehicle boundary. Carries no schedule state, the
/// times computed for it live in a route schedule.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Activity {
    kind: ActivityKind,
    name: String,
    location_id: LocationIdx,
    operation_time: SignedDuration,
    size: Capacity,
    time_windows: TimeWindows,
}

impl Activity {
    pub(crate) fn new(
        kind: ActivityKind,
        name: String,
        location_id: LocationIdx,
        operation_time: SignedDuration,
        size: Capacity,
        time_windows: TimeWindows,
    ) -> Self {
        Activity {
            kind,
            name,
            location_id,
            operation_time,
            size,
            time_windows,
        }
    }

    /// Vehicle departure, departing no earlier than `earliest_start` and no later than `latest_start`.
    pub fn start(
        location_id: LocationIdx,
        earliest_start: Time,
        latest_start: Time,
        depot_duration: SignedDuration,
    ) -> Self {
        Activity::new(
            ActivityKind::Start,
            ActivityKind::Start.tag().to_owned(),
            location_id,
            depot_duration,
            Capacity::EMPTY,
            TimeWindows::single(TimeWindow::new(earliest_start, latest_start)),
        )
    }

    /// Vehicle return, always with a zero operation time.
    pub fn end(location_id: LocationIdx, earliest_end: Time, latest_end: Time) -> Self {
        Activity::new(
            ActivityKind::End,
            ActivityKind::End.tag().to_owned(),
            location_id,
            SignedDuration::ZERO,
            Capacity::EMPTY,
            TimeWindows::single(TimeWindow::new(earliest_end, latest_end)),
        )
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn operation_time(&self) -> SignedDuration {
        self.operation_time
    }

    pub fn size(&self) -> &Capacity {
        &self.size
    }

    pub fn time_windows(&self) -> &TimeWindows {
        &self.time_windows
    }

    pub fn has_time_windows(&self) -> bool {
        self.time_windows.is_constrained()
    }

    /// Signed change of the vehicle load when this activity is performed.
    pub fn capacity_demand(&self) -> Capacity {
        match self.kind {
            ActivityKind::Start | ActivityKind::End | ActivityKind::Service => Capacity::EMPTY,
            ActivityKind::Pickup | ActivityKind::Exchange => self.size.clone(),
            ActivityKind::Delivery => self.size.negated(),
        }
    }

    pub fn duplicate(&self) -> Activity {
        self.clone()
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[type={}][location={}][twStart={}][twEnd={}]",
            self.name,
            self.location_id,
            format_time(self.time_windows.start()),
            format_time(self.time_windows.end())
        )
    }
}
