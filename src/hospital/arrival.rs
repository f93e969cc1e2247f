use super::{EventQueue, Hospital, PatientProcess};
use crate::engine::{Event, Simulation};
use crate::Time;
use ordered_float::OrderedFloat;
use tracing::trace;

/// Perpetual process that admits a new patient after every interarrival time.
#[derive(Debug, Default)]
pub struct ArrivalSource;

impl ArrivalSource {
    /// Draw the first interarrival time and schedule the first arrival.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::BackInTime`](crate::Error::BackInTime), which a validated configuration never produces.
    pub fn start(simulation: &mut Simulation<Hospital, Time>) -> crate::Result {
        let hospital = simulation.state_mut();
        let delay = hospital.samplers.interarrival.sample(&mut hospital.streams.arrival);
        simulation.schedule_with_delay(Self, OrderedFloat(delay))
    }
}

impl Event<Hospital, Time> for ArrivalSource {
    fn execute(self: Box<Self>, hospital: &mut Hospital, queue: &mut EventQueue) -> crate::Result {
        let now = queue.current_time().0;
        let patient = hospital.admit(now);
        trace!(
            pid = patient.pid,
            kind = %patient.kind,
            now,
            preparation = patient.preparation_time,
            operation = patient.operation_time,
            recovery = patient.recovery_time,
            "patient arrived"
        );
        queue.schedule_now(PatientProcess::new(patient))?;

        let delay = hospital.samplers.interarrival.sample(&mut hospital.streams.arrival);
        queue.schedule_with_delay(*self, OrderedFloat(delay))
    }
}
