use super::{EventQueue, Hospital};
use crate::engine::Event;
use crate::metrics::TheatreState;
use crate::resource::Acquire;
use crate::streams::PatientKind;
use crate::Time;
use ordered_float::OrderedFloat;
use tracing::trace;

/// One simulated patient and the service times drawn for them on arrival.
#[derive(Clone, Debug, PartialEq)]
pub struct Patient {
    pub pid: u64,
    pub kind: PatientKind,
    pub arrival: f64,
    pub preparation_time: f64,
    pub operation_time: f64,
    pub recovery_time: f64,
    /// Set on departure.
    pub exit: Option<f64>,
}

impl Patient {
    pub fn new(
        pid: u64,
        kind: PatientKind,
        arrival: f64,
        preparation_time: f64,
        operation_time: f64,
        recovery_time: f64,
    ) -> Self {
        Self {
            pid,
            kind,
            arrival,
            preparation_time,
            operation_time,
            recovery_time,
            exit: None,
        }
    }
}

/// Where a patient is in the flow. Stages are visited in declaration order and none is ever skipped; a request that
/// is granted on the spot still passes through its queued stage, at zero duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Arrived,
    PrepQueued,
    PrepBusy,
    TheatreQueued,
    TheatreBusy,
    /// Operation finished; the theatre stays occupied until a recovery bed is granted.
    TheatreBlocked,
    RecoveryBusy,
    Departed,
}

/// The state machine a patient executes.
///
/// The process is its own continuation: when it waits on a timer it moves itself into the event queue, when it waits
/// on a pool it moves itself into that pool's queue, and whichever of the two resumes it hands it back by value. The
/// stage it was left in says what the resumption means: a granted request for the `*Queued` stages and
/// [`Stage::TheatreBlocked`], an elapsed service time for the `*Busy` stages.
#[derive(Debug)]
pub struct PatientProcess {
    patient: Patient,
    stage: Stage,
    blocked_since: f64,
}

impl PatientProcess {
    pub fn new(patient: Patient) -> Self {
        Self {
            patient,
            stage: Stage::Arrived,
            blocked_since: 0.0,
        }
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage, now: f64) {
        debug_assert!(stage > self.stage, "patient {} moved backwards to {stage:?}", self.patient.pid);
        trace!(pid = self.patient.pid, from = ?self.stage, to = ?stage, now, "patient transition");
        self.stage = stage;
    }

    /// Advance until the process suspends or departs.
    fn step(self, hospital: &mut Hospital, queue: &mut EventQueue) -> crate::Result {
        let now = queue.current_time().0;
        match self.stage {
            Stage::Arrived => self.request_preparation(hospital, queue, now),
            Stage::PrepQueued => self.begin_preparation(queue, now),
            Stage::PrepBusy => self.finish_preparation(hospital, queue, now),
            Stage::TheatreQueued => self.begin_operation(hospital, queue, now),
            Stage::TheatreBusy => self.request_recovery(hospital, queue, now),
            Stage::TheatreBlocked => self.begin_recovery(hospital, queue, now),
            Stage::RecoveryBusy => self.depart(hospital, queue, now),
            Stage::Departed => unreachable!("departed patient {} was resumed", self.patient.pid),
        }
    }

    fn hold(self, queue: &mut EventQueue, duration: f64) -> crate::Result {
        queue.schedule_with_delay(self, OrderedFloat(duration))
    }

    fn request_preparation(mut self, hospital: &mut Hospital, queue: &mut EventQueue, now: f64) -> crate::Result {
        self.enter(Stage::PrepQueued, now);
        match hospital.preparation.acquire(self) {
            Acquire::Granted(process) => process.begin_preparation(queue, now),
            Acquire::Queued => Ok(()),
        }
    }

    fn begin_preparation(mut self, queue: &mut EventQueue, now: f64) -> crate::Result {
        self.enter(Stage::PrepBusy, now);
        let duration = self.patient.preparation_time;
        self.hold(queue, duration)
    }

    fn finish_preparation(mut self, hospital: &mut Hospital, queue: &mut EventQueue, now: f64) -> crate::Result {
        if let Some(next) = hospital.preparation.release() {
            trace!(pid = next.patient.pid, now, "preparation room handed off");
            queue.schedule_now(next)?;
        }

        self.enter(Stage::TheatreQueued, now);
        match hospital.theatre.acquire(self) {
            Acquire::Granted(process) => process.begin_operation(hospital, queue, now),
            Acquire::Queued => Ok(()),
        }
    }

    fn begin_operation(mut self, hospital: &mut Hospital, queue: &mut EventQueue, now: f64) -> crate::Result {
        self.enter(Stage::TheatreBusy, now);
        hospital.metrics.set_theatre_state(now, TheatreState::Busy);
        let duration = self.patient.operation_time;
        self.hold(queue, duration)
    }

    fn request_recovery(mut self, hospital: &mut Hospital, queue: &mut EventQueue, now: f64) -> crate::Result {
        // the theatre slot stays held until a bed is granted
        self.enter(Stage::TheatreBlocked, now);
        self.blocked_since = now;
        hospital.metrics.set_theatre_state(now, TheatreState::Blocked);
        match hospital.recovery.acquire(self) {
            Acquire::Granted(process) => process.begin_recovery(hospital, queue, now),
            Acquire::Queued => Ok(()),
        }
    }

    fn begin_recovery(mut self, hospital: &mut Hospital, queue: &mut EventQueue, now: f64) -> crate::Result {
        debug_assert!(
            hospital.theatre.capacity() > 1 || hospital.metrics.theatre_state() == TheatreState::Blocked,
            "theatre left the blocked state before patient {} got a bed",
            self.patient.pid
        );
        let wait = now - self.blocked_since;
        hospital.metrics.record_recovery_wait(wait);
        hospital.metrics.recovery_enter(now);
        hospital.metrics.set_theatre_state(now, TheatreState::Idle);

        if let Some(next) = hospital.theatre.release() {
            trace!(pid = next.patient.pid, now, "theatre handed off");
            queue.schedule_now(next)?;
        }

        self.enter(Stage::RecoveryBusy, now);
        let duration = self.patient.recovery_time;
        self.hold(queue, duration)
    }

    fn depart(mut self, hospital: &mut Hospital, queue: &mut EventQueue, now: f64) -> crate::Result {
        if let Some(next) = hospital.recovery.release() {
            trace!(pid = next.patient.pid, now, "recovery bed handed off");
            queue.schedule_now(next)?;
        }
        hospital.metrics.recovery_leave(now);

        self.enter(Stage::Departed, now);
        self.patient.exit = Some(now);
        hospital.metrics.record_departure(now, self.patient.arrival);
        trace!(
            pid = self.patient.pid,
            kind = %self.patient.kind,
            throughput = now - self.patient.arrival,
            "patient departed"
        );
        Ok(())
    }
}

impl Event<Hospital, Time> for PatientProcess {
    fn execute(self: Box<Self>, hospital: &mut Hospital, queue: &mut EventQueue) -> crate::Result {
        (*self).step(hospital, queue)
    }
}
