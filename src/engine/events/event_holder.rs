use super::Event;
use crate::{SimState, SimTime};
use std::cmp::Ordering;

/// A suspended process waiting in the event queue until `wake_time`.
///
/// Pool hand-offs resume the next waiter at the current instant, so many resumptions share a wake time: a bed freed
/// at `t` wakes the blocked patient at `t` while an arrival or a monitor sample may also be due at `t`. `sequence`
/// settles those ties in scheduling order, which keeps the interleaving, and therefore every replication summary, a
/// function of the seed alone.
#[derive(Debug)]
pub(super) struct Resumption<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    pub wake_time: Time,
    pub event: Box<dyn Event<State, Time>>,
    pub sequence: u64,
}

impl<State, Time> PartialEq<Self> for Resumption<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence && self.wake_time == other.wake_time
    }
}

impl<State, Time> Eq for Resumption<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
}

impl<State, Time> PartialOrd<Self> for Resumption<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<State, Time> Ord for Resumption<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.wake_time
            .cmp(&other.wake_time)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EventQueue, OkEvent};

    #[derive(Debug)]
    struct Ward;

    impl SimState<u32> for Ward {}

    #[derive(Debug)]
    struct Wake;

    impl OkEvent<Ward, u32> for Wake {
        fn execute(self, _: &mut Ward, _: &mut EventQueue<Ward, u32>) {}
    }

    fn resumption(wake_time: u32, sequence: u64) -> Resumption<Ward, u32> {
        Resumption {
            wake_time,
            event: Box::new(Wake),
            sequence,
        }
    }

    #[test]
    fn wake_time_orders_before_sequence() {
        assert!(resumption(3, 9) < resumption(4, 0));
        assert!(resumption(4, 1) < resumption(4, 2), "equal wake times resume in scheduling order");
        assert_eq!(Ordering::Equal, resumption(4, 2).cmp(&resumption(4, 2)));
    }
}
