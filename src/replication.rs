//! One replication: wire the model together, run it to the horizon, summarize.

use crate::config::Config;
use crate::engine::Simulation;
use crate::hospital::{ArrivalSource, Hospital, Monitor, StartObservation};
use crate::metrics::Summary;
use crate::Time;
use ordered_float::OrderedFloat;
use tracing::debug;

/// A replication that has been built but not necessarily run.
///
/// [`run()`] is what experiment code wants. Building and advancing separately gives tests a look at the model's state
/// at the horizon before the summary flush.
///
/// [`run()`]: Replication::run
#[derive(Debug)]
pub struct Replication {
    simulation: Simulation<Hospital, Time>,
    horizon: f64,
}

impl Replication {
    /// Validate `config` and schedule the initial processes: the warm-up boundary first, so that with no warm-up
    /// observation begins before anything else happens at time zero, then the monitor and the arrival source.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) for any invalid parameter; nothing is scheduled in that case.
    pub fn new(config: &Config) -> crate::Result<Self> {
        config.validate()?;
        let mut simulation = Simulation::new(Hospital::new(config)?, OrderedFloat(0.0));

        simulation.schedule(StartObservation, OrderedFloat(config.warmup))?;
        simulation.schedule(Monitor::new(config.monitor_interval), OrderedFloat(0.0))?;
        ArrivalSource::start(&mut simulation)?;

        Ok(Self {
            simulation,
            horizon: config.horizon(),
        })
    }

    /// Run until the horizon. Patients still in the system at that point are abandoned where they are.
    ///
    /// # Errors
    ///
    /// Only [`Error::BackInTime`](crate::Error::BackInTime), which indicates a defect in an event.
    pub fn advance(&mut self) -> crate::Result {
        self.simulation.run_until(OrderedFloat(self.horizon))
    }

    /// Flush the metrics at the current clock and summarize.
    pub fn summarize(&mut self) -> Summary {
        let now = self.now();
        self.simulation.state_mut().metrics.summarize(now)
    }

    /// Run to the horizon and summarize.
    ///
    /// # Errors
    ///
    /// See [`Replication::advance()`].
    pub fn run(mut self) -> crate::Result<Summary> {
        self.advance()?;
        Ok(self.summarize())
    }

    pub fn hospital(&self) -> &Hospital {
        self.simulation.state()
    }

    pub fn now(&self) -> f64 {
        self.simulation.current_time().0
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }
}

/// Run one replication of `config` and return its summary.
///
/// Pure with respect to the seed: the same configuration always produces the same summary.
///
/// # Errors
///
/// [`Error::Config`](crate::Error::Config) if the configuration is rejected.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(
        seed = config.seed,
        preparation_rooms = config.preparation_rooms,
        recovery_beds = config.recovery_beds,
        theatres = config.theatres,
        scenario = ?config.operation,
    )
)]
pub fn run(config: &Config) -> crate::Result<Summary> {
    let replication = Replication::new(config)?;
    let summary = replication.run()?;
    debug!(
        patients_done = summary.patients_done,
        block_rate = ?summary.theatre_block_rate,
        avg_prep_queue = ?summary.avg_prep_queue_length,
        avg_prep_idle = ?summary.avg_prep_idle_capacity,
        prob_recovery_full = ?summary.prob_recovery_all_busy,
        avg_rec_wait = ?summary.avg_rec_wait,
        "replication finished"
    );
    Ok(summary)
}
