mod event_holder;
pub(super) mod event_traits;

use crate::{SimState, SimTime};
use event_holder::Resumption;
use event_traits::Event;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::ops::Add;

/// Priority queue of pending resumptions, plus the simulation clock.
///
/// Events execute in ascending order of wake time, with ties broken by the order in which they were scheduled. The
/// tiebreaker matters here: a resource release hands the pool to its next waiter by scheduling that waiter "now",
/// behind anything else already due at the same instant, and replications with identical seeds must interleave such
/// hand-offs identically.
///
/// The queue supports scheduling from inside events but does not publicly support popping; popping only occurs
/// during [`Simulation::run_until()`].
///
/// # Errors
///
/// Every scheduling method compares the requested wake time against the current clock. Scheduling into the past
/// returns [`Error::BackInTime`] without modifying the queue.
///
/// [`Simulation::run_until()`]: crate::engine::Simulation::run_until
/// [`Error::BackInTime`]: crate::Error::BackInTime
#[derive(Debug)]
pub struct EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    events: BinaryHeap<Reverse<Resumption<State, Time>>>,
    now: Time,
    scheduled: u64,
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Construct an empty queue with the clock set to `start_time`.
    pub(crate) fn new(start_time: Time) -> Self {
        Self {
            events: BinaryHeap::new(),
            now: start_time,
            scheduled: 0,
        }
    }

    /// Schedule the provided event at the specified time.
    ///
    /// # Errors
    ///
    /// If `time` is less than the current clock time, returns an [`Error::BackInTime`] with no modifications to the
    /// queue.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn schedule<EventType>(&mut self, event: EventType, time: Time) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        if time < self.now {
            return Err(crate::Error::BackInTime);
        }

        let sequence = self.scheduled;
        self.scheduled += 1;
        self.events.push(Reverse(Resumption {
            wake_time: time,
            event: Box::new(event),
            sequence,
        }));
        Ok(())
    }

    /// Pop the next resumption and advance the clock to its wake time.
    pub(crate) fn next(&mut self) -> Option<Box<dyn Event<State, Time>>> {
        let Reverse(resumption) = self.events.pop()?;
        self.now = resumption.wake_time;
        Some(resumption.event)
    }

    /// Wake time of the next resumption, if any.
    pub(crate) fn peek_time(&self) -> Option<&Time> {
        self.events.peek().map(|Reverse(resumption)| &resumption.wake_time)
    }

    /// Move the clock forward without executing anything. Used to park the clock exactly on the horizon.
    pub(crate) fn advance_to(&mut self, time: Time) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Get a shared reference to the simulation's current clock time.
    pub fn current_time(&self) -> &Time {
        &self.now
    }

    /// Number of pending resumptions.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no resumptions are pending.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime + Clone,
{
    /// Schedule the provided event at the current sim time. Events previously scheduled for "now" still execute
    /// before this event does.
    ///
    /// # Errors
    ///
    /// Only fails if cloning the clock somehow produces an earlier time, see [`EventQueue::schedule()`].
    pub fn schedule_now<EventType>(&mut self, event: EventType) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        let event_time = self.now.clone();
        self.schedule(event, event_time)
    }
}

impl<State, Time> EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime + Clone + Add<Output = Time>,
{
    /// Schedule the provided event after the specified delay, i.e. at `self.current_time().clone() + delay`.
    ///
    /// # Errors
    ///
    /// If the delay is negative, the computed wake time is in the past and an [`Error::BackInTime`] is returned with
    /// no modifications to the queue.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn schedule_with_delay<EventType>(&mut self, event: EventType, delay: Time) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        let event_time = self.now.clone() + delay;
        self.schedule(event, event_time)
    }
}

impl<State, Time> std::fmt::Display for EventQueue<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            formatter,
            "EventQueue with {} scheduled events at current time {:?}",
            self.events.len(),
            self.now
        )
    }
}
