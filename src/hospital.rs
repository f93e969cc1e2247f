//! The patient-flow model: simulation state plus the processes that run on it.

mod arrival;
mod monitor;
mod observation;
mod patient;

pub use arrival::ArrivalSource;
pub use monitor::Monitor;
pub use observation::StartObservation;
pub use patient::{Patient, PatientProcess, Stage};

use crate::config::Config;
use crate::error::ConfigError;
use crate::metrics::Metrics;
use crate::resource::ResourcePool;
use crate::streams::{RandomStreams, Samplers};
use crate::{SimState, Time};

/// Event queue specialised to the hospital model.
pub type EventQueue = crate::engine::EventQueue<Hospital, Time>;

/// Everything a replication mutates: the three pools, the random streams, and the metrics accumulator.
///
/// Processes receive `&mut Hospital` when they resume, one at a time, so the pools and metrics are shared by every
/// patient without any locking.
#[derive(Debug)]
pub struct Hospital {
    pub(crate) preparation: ResourcePool<PatientProcess>,
    pub(crate) theatre: ResourcePool<PatientProcess>,
    pub(crate) recovery: ResourcePool<PatientProcess>,
    pub(crate) metrics: Metrics,
    pub(crate) streams: RandomStreams,
    pub(crate) samplers: Samplers,
    next_pid: u64,
}

impl Hospital {
    /// Build the state for one replication.
    ///
    /// # Errors
    ///
    /// Any capacity of zero or invalid distribution parameter in `config`.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            preparation: ResourcePool::new("preparation", config.preparation_rooms)?,
            theatre: ResourcePool::new("theatre", config.theatres)?,
            recovery: ResourcePool::new("recovery", config.recovery_beds)?,
            metrics: Metrics::new(config.recovery_beds),
            streams: RandomStreams::from_seed(config.seed),
            samplers: Samplers::new(config)?,
            next_pid: 0,
        })
    }

    pub fn preparation(&self) -> &ResourcePool<PatientProcess> {
        &self.preparation
    }

    pub fn theatre(&self) -> &ResourcePool<PatientProcess> {
        &self.theatre
    }

    pub fn recovery(&self) -> &ResourcePool<PatientProcess> {
        &self.recovery
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of patients that have arrived so far.
    pub fn arrivals(&self) -> u64 {
        self.next_pid
    }

    /// Draw a new patient's service times from the dedicated streams and assign the next identifier.
    pub(crate) fn admit(&mut self, arrival: f64) -> Patient {
        self.next_pid += 1;
        let (operation, kind) = self.samplers.operation.sample(&mut self.streams.operation);
        let preparation = self.samplers.preparation.sample(&mut self.streams.preparation);
        let recovery = self.samplers.recovery.sample(&mut self.streams.recovery);
        Patient::new(self.next_pid, kind, arrival, preparation, operation, recovery)
    }
}

impl SimState<Time> for Hospital {}
