use super::EventQueue;
use crate::{SimState, SimTime};
use std::fmt::Debug;

/// One step of a suspended process, resumed by the scheduler at its wake time.
///
/// An event is consumed when it executes. A process that needs to suspend again moves itself back into the
/// [`EventQueue`] (a timed wait) or into a [`ResourcePool`] wait queue (a resource wait), so the state record of a
/// process always has exactly one owner.
///
/// Requiring implementors to be [`Debug`] enables printing the full contents of an [`EventQueue`] when necessary.
///
/// There is no cancellation: once scheduled, an event either executes or is dropped with the queue when the
/// simulation stops.
///
/// [`ResourcePool`]: crate::resource::ResourcePool
pub trait Event<State, Time>: Debug
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Resume the process. Exclusive access is provided to both the simulation's state and the event queue; the clock
    /// on `event_queue` has already advanced to this event's wake time.
    ///
    /// # Errors
    ///
    /// Any [`Error::BackInTime`] raised while scheduling follow-up events should be propagated; it halts
    /// [`Simulation::run_until()`] and indicates a logical bug rather than a recoverable condition.
    ///
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    /// [`Simulation::run_until()`]: crate::engine::Simulation::run_until
    fn execute(self: Box<Self>, state: &mut State, event_queue: &mut EventQueue<State, Time>) -> crate::Result;
}

/// An [`Event`] that is guaranteed not to return an error on execution.
///
/// An implementation of [`Event`] is provided for all implementors of this trait which simply invokes
/// [`OkEvent::execute()`] then returns `Ok(())`.
pub trait OkEvent<State, Time>: Debug
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Resume the process. See [`Event::execute()`].
    fn execute(self, state: &mut State, event_queue: &mut EventQueue<State, Time>);
}

impl<State, Time, OkEventType> Event<State, Time> for OkEventType
where
    State: SimState<Time>,
    Time: SimTime,
    OkEventType: OkEvent<State, Time>,
{
    fn execute(self: Box<Self>, state: &mut State, event_queue: &mut EventQueue<State, Time>) -> crate::Result {
        OkEvent::execute(*self, state, event_queue);
        Ok(())
    }
}
