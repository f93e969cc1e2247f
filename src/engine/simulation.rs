use super::{Event, EventQueue};
use crate::{SimState, SimTime};

use std::fmt::Formatter;
use std::ops::Add;

/// Contains the event queue and the state belonging to a simulation.
///
/// A [`Simulation`] owns both its state and its event queue, providing shared and mutable access to each so a
/// replication can schedule its initial processes, run to the horizon, and then read the final state.
///
/// The expected workflow for a Simulation is:
///
/// 1. Initialize a struct that implements [`SimState`].
/// 2. Pass this struct and the start time to [`new()`].
/// 3. Schedule the perpetual processes (arrivals, monitors) and any one-off events.
/// 4. Call [`run_until()`]. Handle any error it might return.
/// 5. Use the [`state()`] or [`state_mut()`] accessors to summarize the results.
///
/// [`new()`]: Simulation::new
/// [`run_until()`]: Simulation::run_until
/// [`state()`]: Simulation::state
/// [`state_mut()`]: Simulation::state_mut
#[derive(Debug)]
pub struct Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    event_queue: EventQueue<State, Time>,
    state: State,
}

impl<State, Time> Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    /// Initialize a Simulation instance with the provided starting state and an event queue with clock set to the
    /// provided starting time.
    pub fn new(initial_state: State, start_time: Time) -> Self {
        Self {
            event_queue: EventQueue::new(start_time),
            state: initial_state,
        }
    }

    /// Execute events one at a time, in ascending order of wake time, until the clock would reach `horizon`.
    ///
    /// Follows this loop:
    ///
    /// 1. Does [`state.is_complete()`] return true? If so, return `Ok(())` leaving the clock where it is.
    /// 2. Peek at the next wake time. If there is none, or it is not strictly before `horizon`, park the clock on
    ///    `horizon` and return `Ok(())`. Events due at or after the horizon are abandoned along with whatever process
    ///    they would have resumed.
    /// 3. Pop the event, advancing the clock, and pass exclusive references to the state and event queue to
    ///    [`event.execute()`]. Forward any error unchanged; otherwise go back to step 1.
    ///
    /// # Errors
    ///
    /// [`Error::BackInTime`] means an event attempted to schedule a follow-up in the simulation's past, which is a
    /// logical bug in the event.
    ///
    /// [`state.is_complete()`]: SimState::is_complete
    /// [`event.execute()`]: Event::execute
    /// [`Error::BackInTime`]: crate::Error::BackInTime
    pub fn run_until(&mut self, horizon: Time) -> crate::Result {
        loop {
            if self.state.is_complete(self.event_queue.current_time()) {
                return Ok(());
            }

            match self.event_queue.peek_time() {
                Some(wake_time) if *wake_time < horizon => {},
                _ => {
                    self.event_queue.advance_to(horizon);
                    return Ok(());
                },
            }

            if let Some(event) = self.event_queue.next() {
                event.execute(&mut self.state, &mut self.event_queue)?;
            }
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
        self.event_queue.schedule(event, time)
    }

    /// Get a shared reference to the simulation state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Get an exclusive reference to the simulation state.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Get a shared reference to the event queue.
    pub fn event_queue(&self) -> &EventQueue<State, Time> {
        &self.event_queue
    }

    /// Get an exclusive reference to the event queue.
    pub fn event_queue_mut(&mut self) -> &mut EventQueue<State, Time> {
        &mut self.event_queue
    }

    /// Get a shared reference to the current clock time.
    pub fn current_time(&self) -> &Time {
        self.event_queue.current_time()
    }
}

impl<State, Time> Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime + Clone + Add<Output = Time>,
{
    /// Schedule the provided event after the specified delay.
    ///
    /// # Errors
    ///
    /// See [`EventQueue::schedule_with_delay()`].
    pub fn schedule_with_delay<EventType>(&mut self, event: EventType, delay: Time) -> crate::Result
    where
        EventType: Event<State, Time> + 'static,
    {
        self.event_queue.schedule_with_delay(event, delay)
    }
}

impl<State, Time> std::fmt::Display for Simulation<State, Time>
where
    State: SimState<Time>,
    Time: SimTime,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Simulation at time {:?}", self.event_queue.current_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OkEvent;

    #[derive(Debug)]
    struct State {
        executed_event_values: Vec<u32>,
        complete: bool,
    }

    impl SimState<u32> for State {
        fn is_complete(&self, _: &u32) -> bool {
            self.complete
        }
    }

    #[derive(Debug)]
    struct TestEvent {
        value: u32,
    }

    impl Event<State, u32> for TestEvent {
        fn execute(self: Box<Self>, state: &mut State, _: &mut EventQueue<State, u32>) -> crate::Result {
            state.executed_event_values.push(self.value);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct CompletionEvent {}

    impl OkEvent<State, u32> for CompletionEvent {
        fn execute(self, state: &mut State, _: &mut EventQueue<State, u32>) {
            state.complete = true;
        }
    }

    /// Reschedules itself every `period` ticks, like an arrival source.
    #[derive(Debug)]
    struct Ticker {
        period: u32,
    }

    impl Event<State, u32> for Ticker {
        fn execute(self: Box<Self>, state: &mut State, event_queue: &mut EventQueue<State, u32>) -> crate::Result {
            state.executed_event_values.push(*event_queue.current_time());
            let period = self.period;
            event_queue.schedule_with_delay(*self, period)
        }
    }

    fn setup() -> Simulation<State, u32> {
        let mut sim = Simulation::new(
            State {
                executed_event_values: Vec::with_capacity(3),
                complete: false,
            },
            0,
        );

        let events: [TestEvent; 3] = [TestEvent { value: 1 }, TestEvent { value: 3 }, TestEvent { value: 2 }];

        for (i, event) in events.into_iter().enumerate() {
            sim.schedule(event, 2 * i as u32).unwrap();
        }
        sim
    }

    #[test]
    fn simulation_executes_events() {
        let mut sim = setup();
        sim.run_until(100).unwrap();

        let expected = vec![1, 3, 2];
        assert_eq!(
            expected, sim.state.executed_event_values,
            "events did not execute in correct order"
        );
        assert_eq!(100, *sim.current_time(), "clock should park on the horizon");
    }

    #[test]
    fn simulation_stops_with_events_still_in_queue() {
        let mut sim = setup();
        sim.schedule(CompletionEvent {}, 3).unwrap();
        sim.run_until(100).unwrap();

        let expected = vec![1, 3];
        assert_eq!(
            expected, sim.state.executed_event_values,
            "simulation did not terminate with completion event"
        );
        assert_eq!(3, *sim.current_time(), "completion should not move the clock to the horizon");
    }

    #[test]
    fn events_at_the_horizon_are_abandoned() {
        let mut sim = setup();
        sim.run_until(2).unwrap();

        assert_eq!(vec![1], sim.state.executed_event_values, "only events strictly before the horizon run");
        assert_eq!(2, sim.event_queue().len(), "later events should remain pending");
    }

    #[test]
    fn perpetual_process_stops_at_horizon() {
        let mut sim = Simulation::new(
            State {
                executed_event_values: Vec::new(),
                complete: false,
            },
            0,
        );
        sim.schedule(Ticker { period: 4 }, 0).unwrap();
        sim.run_until(10).unwrap();

        assert_eq!(vec![0, 4, 8], sim.state.executed_event_values, "ticker should fire every period");
        assert_eq!(10, *sim.current_time(), "clock should park on the horizon");
    }
}
