use std::{fmt::Display, ops::Index};

use serde::Serialize;

use crate::{
    define_index_newtype,
    problem::{activity::Activity, capacity::Capacity, time_window::TimeWindows},
};

define_index_newtype!(JobIdx, Job);

/// Identity of an activity: the owning job and its position in the job's list.
#[derive(Serialize, Hash, Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub struct ActivityId {
    job: JobIdx,
    index: usize,
}

impl ActivityId {
    pub fn new(job: JobIdx, index: usize) -> Self {
        ActivityId { job, index }
    }

    pub fn job_id(&self) -> JobIdx {
        self.job
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Activity({}, {})", self.job, self.index)
    }
}

impl From<ActivityId> for JobIdx {
    fn from(activity_id: ActivityId) -> Self {
        activity_id.job_id()
    }
}

/// Ordered activities of one job. The order is the required visiting order.
#[derive(Serialize, Debug, Clone)]
#[serde(transparent)]
pub struct ActivityList(Vec<Activity>);

impl ActivityList {
    pub(crate) fn new(activities: Vec<Activity>) -> Self {
        ActivityList(activities)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Activity> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Activity] {
        &self.0
    }
}

impl Index<usize> for ActivityList {
    type Output = Activity;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a ActivityList {
    type Item = &'a Activity;
    type IntoIter = std::slice::Iter<'a, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Job {
    external_id: String,
    activities: ActivityList,
}

impl Job {
    pub(crate) fn new(external_id: String, activities: ActivityList) -> Self {
        Job {
            external_id,
            activities,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn activities(&self) -> &ActivityList {
        &self.activities
    }

    pub fn activity(&self, index: usize) -> Option<&Activity> {
        self.activities.get(index)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Ids of all activities of the job, in visiting order.
    pub fn activity_ids(&self, job_id: JobIdx) -> impl Iterator<Item = ActivityId> + use<> {
        (0..self.activities.len()).map(move |index| ActivityId::new(job_id, index))
    }

    pub fn has_time_windows(&self) -> bool {
        self.activities
            .iter()
            .any(|activity| activity.has_time_windows())
    }

    /// Sum of the capacity demands of the job's activities.
    pub fn net_demand(&self) -> Capacity {
        let mut demand = Capacity::EMPTY;
        for activity in &self.activities {
            demand += &activity.capacity_demand();
        }
        demand
    }

    pub fn time_windows(&self, index: usize) -> Option<&TimeWindows> {
        self.activities.get(index).map(|activity| activity.time_windows())
    }
}
