use jiff::SignedDuration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    activity::{Activity, ActivityKind},
    capacity::Capacity,
    job::{ActivityList, Job},
    location::LocationIdx,
    time_window::{TimeWindow, TimeWindowError, TimeWindows},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("job {job_id} has no activities")]
    NoActivities { job_id: String },

    #[error("job {job_id}, activity {activity}: malformed time window")]
    MalformedTimeWindow {
        job_id: String,
        activity: usize,
        #[source]
        source: TimeWindowError,
    },

    #[error("job {job_id}, activity {activity}: operation time {operation_time:?} is negative")]
    NegativeOperationTime {
        job_id: String,
        activity: usize,
        operation_time: SignedDuration,
    },
}

/// Activity variants a job can be made of.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Service,
    Pickup,
    Delivery,
    Exchange,
}

impl From<ActivityType> for ActivityKind {
    fn from(value: ActivityType) -> Self {
        match value {
            ActivityType::Service => ActivityKind::Service,
            ActivityType::Pickup => ActivityKind::Pickup,
            ActivityType::Delivery => ActivityKind::Delivery,
            ActivityType::Exchange => ActivityKind::Exchange,
        }
    }
}

impl TryFrom<ActivityKind> for ActivityType {
    type Error = ActivityKind;

    fn try_from(value: ActivityKind) -> Result<Self, Self::Error> {
        match value {
            ActivityKind::Service => Ok(ActivityType::Service),
            ActivityKind::Pickup => Ok(ActivityType::Pickup),
            ActivityKind::Delivery => Ok(ActivityType::Delivery),
            ActivityKind::Exchange => Ok(ActivityType::Exchange),
            ActivityKind::Start | ActivityKind::End => Err(value),
        }
    }
}

/// Configuration of a single activity before it is attached to a job.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ActivitySpec {
    pub location_id: LocationIdx,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<Capacity>,
    #[serde(default)]
    pub operation_time: SignedDuration,
    #[serde(default)]
    pub time_windows: TimeWindows,
}

impl ActivitySpec {
    pub fn at(location_id: usize) -> Self {
        ActivitySpec {
            location_id: LocationIdx::new(location_id),
            ..ActivitySpec::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, size: Capacity) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_operation_time(mut self, operation_time: SignedDuration) -> Self {
        self.operation_time = operation_time;
        self
    }

    pub fn with_time_window(mut self, time_window: TimeWindow) -> Self {
        self.time_windows = self.time_windows.iter().copied().chain([time_window]).collect();
        self
    }

    pub fn with_time_windows(mut self, time_windows: TimeWindows) -> Self {
        self.time_windows = time_windows;
        self
    }
}

/// Creates an activity of the given type. An activity without windows gets the
/// universal window, an activity without name is named after its type.
pub fn create_activity(activity_type: ActivityType, spec: ActivitySpec) -> Activity {
    let kind = ActivityKind::from(activity_type);

    let time_windows = if spec.time_windows.is_empty() {
        TimeWindows::single(TimeWindow::ANY)
    } else {
        spec.time_windows
    };

    Activity::new(
        kind,
        spec.name.unwrap_or_else(|| kind.tag().to_owned()),
        spec.location_id,
        spec.operation_time,
        spec.size.unwrap_or_default(),
        time_windows,
    )
}

#[derive(Deserialize, Debug, Clone)]
pub struct JobActivitySpec {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(flatten)]
    pub spec: ActivitySpec,
}

/// Declarative description of a job.
#[derive(Deserialize, Debug, Clone)]
pub struct JobSpec {
    pub id: String,
    pub activities: Vec<JobActivitySpec>,
}

pub fn build_job(spec: JobSpec) -> Result<Job, ValidationError> {
    let mut builder = JobBuilder::new(spec.id);
    for activity in spec.activities {
        builder.add_activity(activity.activity_type, activity.spec);
    }
    builder.build()
}

pub struct JobBuilder {
    external_id: String,
    activities: Vec<(ActivityType, ActivitySpec)>,
}

impl JobBuilder {
    pub fn new(external_id: impl Into<String>) -> Self {
        JobBuilder {
            external_id: external_id.into(),
            activities: Vec::new(),
        }
    }

    pub fn add_activity(
        &mut self,
        activity_type: ActivityType,
        spec: ActivitySpec,
    ) -> &mut JobBuilder {
        self.activities.push((activity_type, spec));
        self
    }

    pub fn add_service(&mut self, spec: ActivitySpec) -> &mut JobBuilder {
        self.add_activity(ActivityType::Service, spec)
    }

    pub fn add_pickup(&mut self, spec: ActivitySpec) -> &mut JobBuilder {
        self.add_activity(ActivityType::Pickup, spec)
    }

    pub fn add_delivery(&mut self, spec: ActivitySpec) -> &mut JobBuilder {
        self.add_activity(ActivityType::Delivery, spec)
    }

    pub fn add_exchange(&mut self, spec: ActivitySpec) -> &mut JobBuilder {
        self.add_activity(ActivityType::Exchange, spec)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.activities.is_empty() {
            return Err(ValidationError::NoActivities {
                job_id: self.external_id.clone(),
            });
        }

        for (index, (_, spec)) in self.activities.iter().enumerate() {
            if spec.operation_time.is_negative() {
                return Err(ValidationError::NegativeOperationTime {
                    job_id: self.external_id.clone(),
                    activity: index,
                    operation_time: spec.operation_time,
                });
            }

            spec.time_windows
                .validate()
                .map_err(|source| ValidationError::MalformedTimeWindow {
                    job_id: self.external_id.clone(),
                    activity: index,
                    source,
                })?;
        }

        Ok(())
    }

    pub fn build(self) -> Result<Job, ValidationError> {
        self.validate()?;

        let activities = self
            .activities
            .into_iter()
            .map(|(activity_type, spec)| create_activity(activity_type, spec))
            .collect();

        Ok(Job::new(self.external_id, ActivityList::new(activities)))
    }
}
