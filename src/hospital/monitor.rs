use super::{EventQueue, Hospital};
use crate::engine::Event;
use crate::Time;
use ordered_float::OrderedFloat;

/// Perpetual sampler of the preparation stage: queue length and idle rooms, every `interval`.
///
/// Sampling takes no simulated time and does not contend for any pool. Samples taken before observation starts are
/// dropped by the metrics accumulator.
#[derive(Debug, Clone, Copy)]
pub struct Monitor {
    interval: f64,
}

impl Monitor {
    pub fn new(interval: f64) -> Self {
        Self { interval }
    }
}

impl Event<Hospital, Time> for Monitor {
    fn execute(self: Box<Self>, hospital: &mut Hospital, queue: &mut EventQueue) -> crate::Result {
        let preparation = &hospital.preparation;
        hospital
            .metrics
            .record_prep_sample(preparation.queue_len(), preparation.idle_capacity());

        let interval = self.interval;
        queue.schedule_with_delay(*self, OrderedFloat(interval))
    }
}
