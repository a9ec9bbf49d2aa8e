use std::fmt;

use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Offset on the planning horizon, measured from its origin.
pub type Time = SignedDuration;

/// Upper bound of an unconstrained window, never the result of arithmetic on finite times.
pub const INFINITE_TIME: Time = SignedDuration::MAX;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindowError {
    #[error("start {start:?} is after end {end:?}")]
    StartAfterEnd { start: Time, end: Time },

    #[error("start {0:?} is before the horizon origin")]
    NegativeStart(Time),

    #[error("start cannot be unbounded")]
    UnboundedStart,
}

fn origin() -> Time {
    SignedDuration::ZERO
}

fn unbounded() -> Time {
    INFINITE_TIME
}

/// Closed interval `[start, end]` during which an operation may start.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    #[serde(default = "origin")]
    start: Time,
    #[serde(default = "unbounded")]
    end: Time,
}

impl TimeWindow {
    /// The universal window `[0, +oo)`.
    pub const ANY: TimeWindow = TimeWindow {
        start: SignedDuration::ZERO,
        end: INFINITE_TIME,
    };

    /// Creates a window without checking its bounds, see [`TimeWindow::validate`].
    pub fn new(start: Time, end: Time) -> Self {
        TimeWindow { start, end }
    }

    pub fn from_secs(start: i64, end: i64) -> Self {
        TimeWindow {
            start: SignedDuration::from_secs(start),
            end: SignedDuration::from_secs(end),
        }
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn end(&self) -> Time {
        self.end
    }

    pub fn is_bounded(&self) -> bool {
        self.end != INFINITE_TIME
    }

    pub fn validate(&self) -> Result<(), TimeWindowError> {
        if self.start == INFINITE_TIME {
            return Err(TimeWindowError::UnboundedStart);
        }

        if self.start.is_negative() {
            return Err(TimeWindowError::NegativeStart(self.start));
        }

        if self.start > self.end {
            return Err(TimeWindowError::StartAfterEnd {
                start: self.start,
                end: self.end,
            });
        }

        Ok(())
    }

    pub fn contains(&self, time: Time) -> bool {
        self.start <= time && time <= self.end
    }

    /// Earliest operation start inside this window for a vehicle arriving at `arrival`.
    pub fn earliest_start(&self, arrival: Time) -> Option<Time> {
        if arrival > self.end {
            None
        } else {
            Some(arrival.max(self.start))
        }
    }

    /// Latest operation start inside this window that is not later than `bound`.
    pub fn latest_start(&self, bound: Time) -> Option<Time> {
        if bound < self.start {
            None
        } else {
            Some(bound.min(self.end))
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::ANY
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]",
            format_time(self.start),
            format_time(self.end)
        )
    }
}

/// Renders a time in whole seconds, `oo` for the unbounded sentinel.
pub fn format_time(time: Time) -> String {
    if time == INFINITE_TIME {
        String::from("oo")
    } else {
        format!("{}", time.as_secs_f64().round())
    }
}

/// The feasible windows of one activity. An empty set behaves like [`TimeWindow::ANY`].
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TimeWindows(SmallVec<[TimeWindow; 1]>);

impl TimeWindows {
    pub fn any() -> Self {
        TimeWindows(SmallVec::new())
    }

    pub fn single(time_window: TimeWindow) -> Self {
        let mut windows = SmallVec::new();
        windows.push(time_window);
        TimeWindows(windows)
    }

    pub fn from_vec(time_windows: Vec<TimeWindow>) -> Self {
        TimeWindows(SmallVec::from_vec(time_windows))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeWindow> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TimeWindow] {
        &self.0
    }

    /// True when some window actually restricts the operation start.
    pub fn is_constrained(&self) -> bool {
        self.0
            .iter()
            .any(|tw| tw.start() > SignedDuration::ZERO || tw.is_bounded())
    }

    /// Earliest window opening.
    pub fn start(&self) -> Time {
        self.0
            .iter()
            .map(|tw| tw.start())
            .min()
            .unwrap_or(SignedDuration::ZERO)
    }

    /// Latest window closing, [`INFINITE_TIME`] when unconstrained.
    pub fn end(&self) -> Time {
        self.0
            .iter()
            .map(|tw| tw.end())
            .max()
            .unwrap_or(INFINITE_TIME)
    }

    pub fn earliest_start(&self, arrival: Time) -> Option<Time> {
        if self.0.is_empty() {
            return TimeWindow::ANY.earliest_start(arrival);
        }

        self.0
            .iter()
            .filter_map(|tw| tw.earliest_start(arrival))
            .min()
    }

    pub fn latest_start(&self, bound: Time) -> Option<Time> {
        if self.0.is_empty() {
            return TimeWindow::ANY.latest_start(bound);
        }

        self.0.iter().filter_map(|tw| tw.latest_start(bound)).max()
    }

    pub fn validate(&self) -> Result<(), TimeWindowError> {
        self.0.iter().try_for_each(TimeWindow::validate)
    }
}

impl FromIterator<TimeWindow> for TimeWindows {
    fn from_iter<I: IntoIterator<Item = TimeWindow>>(iter: I) -> Self {
        TimeWindows(iter.into_iter().collect())
    }
}

impl fmt::Display for TimeWindows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "{}", TimeWindow::ANY);
        }

        for (index, tw) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            write!(f, "{tw}")?;
        }

        Ok(())
    }
}
