//! Time-weighted integration of theatre and recovery state, sample averages, and the per-replication summary.

use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::trace;

/// What the operating theatre is doing. Exactly one state holds at any instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TheatreState {
    #[default]
    Idle,
    /// Operating.
    Busy,
    /// Finished operating, held by a patient waiting for a recovery bed.
    Blocked,
}

/// Observed theatre time per state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TheatreTimes {
    pub idle: f64,
    pub busy: f64,
    pub blocked: f64,
}

impl TheatreTimes {
    pub fn total(&self) -> f64 {
        self.idle + self.busy + self.blocked
    }

    fn add(&mut self, state: TheatreState, duration: f64) {
        match state {
            TheatreState::Idle => self.idle += duration,
            TheatreState::Busy => self.busy += duration,
            TheatreState::Blocked => self.blocked += duration,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct RunningMean {
    sum: f64,
    count: u64,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Observes one replication and reduces it to a [`Summary`].
///
/// Durations are integrated by flushing `now - last_change` into the bucket of the state being left on every state
/// change, so arbitrarily short states are captured exactly. Nothing is integrated before
/// [`start_observation()`](Metrics::start_observation); state changes before then only move the timestamps along.
#[derive(Clone, Debug)]
pub struct Metrics {
    observing: bool,
    observation_start: f64,

    theatre_state: TheatreState,
    theatre_changed_at: f64,
    theatre: TheatreTimes,

    recovery_capacity: usize,
    recovery_count: usize,
    recovery_changed_at: f64,
    recovery_full_time: f64,

    prep_queue: RunningMean,
    prep_idle: RunningMean,
    recovery_wait: RunningMean,
    throughput: RunningMean,
}

impl Metrics {
    pub fn new(recovery_capacity: usize) -> Self {
        Self {
            observing: false,
            observation_start: 0.0,
            theatre_state: TheatreState::Idle,
            theatre_changed_at: 0.0,
            theatre: TheatreTimes::default(),
            recovery_capacity,
            recovery_count: 0,
            recovery_changed_at: 0.0,
            recovery_full_time: 0.0,
            prep_queue: RunningMean::default(),
            prep_idle: RunningMean::default(),
            recovery_wait: RunningMean::default(),
            throughput: RunningMean::default(),
        }
    }

    /// End warm-up: discard everything accumulated so far and re-synchronize the current state with the pools.
    ///
    /// `theatre_state` and `recovery_count` describe reality at `now`. Their durations are counted from `now`
    /// onward, so a theatre that is mid-operation when warm-up ends contributes busy time from the boundary.
    ///
    /// # Panics
    ///
    /// Observation can only start once per replication.
    pub fn start_observation(&mut self, now: f64, theatre_state: TheatreState, recovery_count: usize) {
        assert!(!self.observing, "observation already started");
        self.observing = true;
        self.observation_start = now;

        self.theatre = TheatreTimes::default();
        self.recovery_full_time = 0.0;
        self.prep_queue = RunningMean::default();
        self.prep_idle = RunningMean::default();
        self.recovery_wait = RunningMean::default();
        self.throughput = RunningMean::default();

        self.theatre_state = theatre_state;
        self.theatre_changed_at = now;
        self.recovery_count = recovery_count;
        self.recovery_changed_at = now;
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    pub fn theatre_state(&self) -> TheatreState {
        self.theatre_state
    }

    /// Observed theatre time per state, as of the last flush.
    pub fn theatre_times(&self) -> TheatreTimes {
        self.theatre
    }

    pub fn recovery_count(&self) -> usize {
        self.recovery_count
    }

    pub fn observation_start(&self) -> f64 {
        self.observation_start
    }

    fn flush_theatre(&mut self, now: f64) {
        if self.observing {
            let duration = now - self.theatre_changed_at;
            debug_assert!(duration >= 0.0, "theatre state flushed backwards in time");
            if duration > 0.0 {
                self.theatre.add(self.theatre_state, duration);
            }
        }
        self.theatre_changed_at = now;
    }

    fn flush_recovery(&mut self, now: f64) {
        if self.observing {
            let duration = now - self.recovery_changed_at;
            if duration > 0.0 && self.recovery_count == self.recovery_capacity {
                self.recovery_full_time += duration;
            }
        }
        self.recovery_changed_at = now;
    }

    pub fn set_theatre_state(&mut self, now: f64, state: TheatreState) {
        self.flush_theatre(now);
        trace!(now, from = ?self.theatre_state, to = ?state, "theatre state change");
        self.theatre_state = state;
    }

    /// A patient took a recovery bed.
    pub fn recovery_enter(&mut self, now: f64) {
        self.flush_recovery(now);
        self.recovery_count += 1;
        debug_assert!(self.recovery_count <= self.recovery_capacity);
        trace!(now, count = self.recovery_count, capacity = self.recovery_capacity, "recovery enter");
    }

    /// A patient left a recovery bed.
    pub fn recovery_leave(&mut self, now: f64) {
        self.flush_recovery(now);
        debug_assert!(self.recovery_count > 0, "recovery bed left while none was occupied");
        self.recovery_count -= 1;
        trace!(now, count = self.recovery_count, capacity = self.recovery_capacity, "recovery leave");
    }

    pub fn record_prep_sample(&mut self, queue_len: usize, idle_capacity: usize) {
        if self.observing {
            self.prep_queue.push(queue_len as f64);
            self.prep_idle.push(idle_capacity as f64);
        }
    }

    pub fn record_recovery_wait(&mut self, wait: f64) {
        if self.observing {
            self.recovery_wait.push(wait);
        }
    }

    pub fn record_departure(&mut self, exit: f64, arrival: f64) {
        if self.observing {
            self.throughput.push(exit - arrival);
        }
    }

    /// Final flush at `now`, then the summary of the observation window `[observation_start, now]`.
    pub fn summarize(&mut self, now: f64) -> Summary {
        self.flush_theatre(now);
        self.flush_recovery(now);

        let total = if self.observing { now - self.observation_start } else { 0.0 };
        let ratio = |part: f64| (total > 0.0).then(|| part / total);

        Summary {
            patients_done: self.throughput.count,
            theatre_utilization: ratio(self.theatre.busy),
            theatre_block_rate: ratio(self.theatre.blocked),
            avg_throughput_time: self.throughput.mean(),
            avg_prep_queue_length: self.prep_queue.mean(),
            avg_prep_idle_capacity: self.prep_idle.mean(),
            prob_recovery_all_busy: ratio(self.recovery_full_time),
            avg_rec_wait: self.recovery_wait.mean(),
        }
    }
}

/// Statistics of one replication. `None` marks a statistic that is undefined, e.g. an average over zero samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub patients_done: u64,
    pub theatre_utilization: Option<f64>,
    pub theatre_block_rate: Option<f64>,
    pub avg_throughput_time: Option<f64>,
    pub avg_prep_queue_length: Option<f64>,
    pub avg_prep_idle_capacity: Option<f64>,
    pub prob_recovery_all_busy: Option<f64>,
    pub avg_rec_wait: Option<f64>,
}

impl Summary {
    /// Look a statistic up by key.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::PatientsDone => Some(self.patients_done as f64),
            Metric::TheatreUtilization => self.theatre_utilization,
            Metric::TheatreBlockRate => self.theatre_block_rate,
            Metric::AvgThroughputTime => self.avg_throughput_time,
            Metric::AvgPrepQueueLength => self.avg_prep_queue_length,
            Metric::AvgPrepIdleCapacity => self.avg_prep_idle_capacity,
            Metric::ProbRecoveryAllBusy => self.prob_recovery_all_busy,
            Metric::AvgRecWait => self.avg_rec_wait,
        }
    }

    /// The summary as a string-keyed mapping.
    pub fn to_map(&self) -> BTreeMap<&'static str, Option<f64>> {
        Metric::ALL.iter().map(|metric| (metric.key(), self.get(*metric))).collect()
    }
}

/// Keys of the [`Summary`] schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PatientsDone,
    TheatreUtilization,
    TheatreBlockRate,
    AvgThroughputTime,
    AvgPrepQueueLength,
    AvgPrepIdleCapacity,
    ProbRecoveryAllBusy,
    AvgRecWait,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::PatientsDone,
        Metric::TheatreUtilization,
        Metric::TheatreBlockRate,
        Metric::AvgThroughputTime,
        Metric::AvgPrepQueueLength,
        Metric::AvgPrepIdleCapacity,
        Metric::ProbRecoveryAllBusy,
        Metric::AvgRecWait,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::PatientsDone => "patients_done",
            Metric::TheatreUtilization => "theatre_utilization",
            Metric::TheatreBlockRate => "theatre_block_rate",
            Metric::AvgThroughputTime => "avg_throughput_time",
            Metric::AvgPrepQueueLength => "avg_prep_queue_length",
            Metric::AvgPrepIdleCapacity => "avg_prep_idle_capacity",
            Metric::ProbRecoveryAllBusy => "prob_recovery_all_busy",
            Metric::AvgRecWait => "avg_rec_wait",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.key() == key)
            .ok_or_else(|| format!("unknown summary statistic `{key}`"))
    }
}
