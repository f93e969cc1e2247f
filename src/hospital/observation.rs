use super::{EventQueue, Hospital};
use crate::engine::OkEvent;
use crate::metrics::TheatreState;
use crate::Time;
use tracing::debug;

/// Marks the end of warm-up.
///
/// Resets the metrics and hands them the state the pools are actually in, so a theatre or bed already occupied when
/// warm-up ends is counted from the boundary rather than forgotten.
#[derive(Debug, Default)]
pub struct StartObservation;

impl OkEvent<Hospital, Time> for StartObservation {
    fn execute(self, hospital: &mut Hospital, queue: &mut EventQueue) {
        let now = queue.current_time().0;
        let theatre_state = if hospital.theatre.occupancy() == 0 {
            TheatreState::Idle
        } else if hospital.metrics.theatre_state() == TheatreState::Blocked {
            TheatreState::Blocked
        } else {
            TheatreState::Busy
        };
        let recovery_count = hospital.recovery.occupancy();

        hospital.metrics.start_observation(now, theatre_state, recovery_count);
        debug!(
            now,
            ?theatre_state,
            recovery_count,
            recovery_capacity = hospital.recovery.capacity(),
            prep_queue = hospital.preparation.queue_len(),
            "warm-up finished, observation started"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Simulation;
    use crate::hospital::{Patient, PatientProcess};
    use crate::streams::PatientKind;
    use ordered_float::OrderedFloat;

    /// One bed: patient 1 recovers from 3 to 13, so patient 2 blocks the theatre from 5 to 13.
    fn blocked_at(warmup: f64) -> Simulation<Hospital, Time> {
        let config = Config {
            preparation_rooms: 1,
            recovery_beds: 1,
            ..Config::default()
        };
        let mut sim = Simulation::new(Hospital::new(&config).unwrap(), OrderedFloat(0.0));
        sim.schedule(StartObservation, OrderedFloat(warmup)).unwrap();
        for (pid, recovery) in [(1, 10.0), (2, 1.0)] {
            let patient = Patient::new(pid, PatientKind::Base, 0.0, 1.0, 2.0, recovery);
            sim.schedule(PatientProcess::new(patient), OrderedFloat(0.0)).unwrap();
        }
        sim
    }

    #[test]
    fn blocked_theatre_stays_blocked_across_warmup() {
        let mut sim = blocked_at(8.0);
        sim.run_until(OrderedFloat(9.0)).unwrap();

        let metrics = sim.state().metrics();
        assert!(metrics.is_observing());
        assert_eq!(8.0, metrics.observation_start());
        assert_eq!(TheatreState::Blocked, metrics.theatre_state());
        assert_eq!(1, metrics.recovery_count());

        sim.run_until(OrderedFloat(20.0)).unwrap();
        let summary = sim.state_mut().metrics.summarize(20.0);
        let times = sim.state().metrics().theatre_times();
        assert_eq!(5.0, times.blocked, "blocked from the boundary at 8 until the bed frees at 13");
        assert_eq!(0.0, times.busy);
        assert_eq!(7.0, times.idle);
        assert_eq!(Some(0.0), summary.theatre_utilization);
        assert_eq!(Some(5.0 / 12.0), summary.theatre_block_rate);
        assert_eq!(Some(0.5), summary.prob_recovery_all_busy, "bed taken from 8 to 14");
    }

    #[test]
    fn operating_theatre_is_busy_across_warmup() {
        let mut sim = blocked_at(4.0);
        sim.run_until(OrderedFloat(4.5)).unwrap();

        let metrics = sim.state().metrics();
        assert_eq!(TheatreState::Busy, metrics.theatre_state());
        assert_eq!(1, metrics.recovery_count());
    }

    #[test]
    fn empty_theatre_is_idle_across_warmup() {
        let mut sim = blocked_at(20.0);
        sim.run_until(OrderedFloat(20.5)).unwrap();
        assert_eq!(TheatreState::Idle, sim.state().metrics().theatre_state());
        assert_eq!(0, sim.state().metrics().recovery_count());
    }
}
