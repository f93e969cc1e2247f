use ordered_float::OrderedFloat;
use std::fmt::Debug;

/// Simulated time in minutes.
///
/// Durations drawn from the configured distributions are finite and nonnegative, so wrapping them in
/// [`OrderedFloat`] gives a total order without ever observing a NaN on the clock.
pub type Time = OrderedFloat<f64>;

/// The generic type used for a simulation's clock.
///
/// This trait is a superset of [`Ord`] and [`Debug`] with no additional requirements or functionality. The
/// [`EventQueue`] sequences events in ascending order of this type, and breaks any ties the [`Ord`] implementation
/// leaves open by the order in which the events were scheduled. That second rule is what makes two replications with
/// the same seed resume their processes in exactly the same order.
///
/// Implementations are provided for the unsigned integer types, which are convenient for unit tests of the engine, and
/// for [`OrderedFloat`], which backs the hospital model's [`Time`].
///
/// [`EventQueue`]: crate::engine::EventQueue
pub trait SimTime: Ord + Debug {}

impl SimTime for u32 {}
impl SimTime for u64 {}
impl SimTime for usize {}

impl<Float> SimTime for OrderedFloat<Float> where Float: ordered_float::FloatCore + Debug {}

/// The generic type used for a simulation's overall state.
///
/// For the hospital model this is the [`Hospital`], which owns the three resource pools, the random streams and the
/// metrics accumulator. Every executing event receives exclusive access to it, so no interior mutability or locking
/// is needed anywhere in a replication.
///
/// [`Hospital`]: crate::hospital::Hospital
pub trait SimState<Time>
where
    Time: SimTime,
{
    /// Reports whether the simulation should stop before reaching its horizon. [`Simulation::run_until()`] asks this
    /// before popping each event: `true` stops the loop without moving the clock, `false` continues with the next
    /// scheduled event.
    ///
    /// The default implementation always returns false, so a simulation runs until its horizon.
    ///
    /// [`Simulation::run_until()`]: crate::engine::Simulation::run_until
    // expect that other implementations will make use of the
    // argument even though this one doesn't
    #[allow(unused_variables)]
    fn is_complete(&self, current_time: &Time) -> bool {
        false
    }
}
