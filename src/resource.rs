//! Capacity-bounded resource pools with FIFO admission.

use crate::error::ConfigError;
use std::collections::VecDeque;

/// Outcome of [`ResourcePool::acquire()`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub enum Acquire<W> {
    /// A slot was free; the caller holds it now and gets its waiter back to keep running.
    Granted(W),
    /// Every slot is held; the waiter was moved to the back of the queue.
    Queued,
}

/// A server with a fixed number of slots and a FIFO wait queue, modelling preparation rooms, operating theatres and
/// recovery beds.
///
/// The pool owns whatever is waiting for it. A suspended process is moved into the queue by [`acquire()`] and handed
/// back, in arrival order, by [`release()`]; the caller is then responsible for resuming it. There is no priority, no
/// preemption and no timeout.
///
/// Occupancy is always within `0..=capacity`. Violating that is a defect in the caller and panics.
///
/// [`acquire()`]: ResourcePool::acquire
/// [`release()`]: ResourcePool::release
#[derive(Debug)]
pub struct ResourcePool<W> {
    name: &'static str,
    capacity: usize,
    occupancy: usize,
    waiters: VecDeque<W>,
}

impl<W> ResourcePool<W> {
    /// Create an empty pool.
    ///
    /// # Errors
    ///
    /// A capacity of zero would block every caller forever and is rejected as [`ConfigError::ZeroCapacity`].
    pub fn new(name: &'static str, capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity { resource: name });
        }

        Ok(Self {
            name,
            capacity,
            occupancy: 0,
            waiters: VecDeque::new(),
        })
    }

    /// Request a slot for `waiter`. Grants immediately if one is free, otherwise queues the waiter behind everyone
    /// already waiting.
    pub fn acquire(&mut self, waiter: W) -> Acquire<W> {
        if self.occupancy < self.capacity {
            self.occupancy += 1;
            Acquire::Granted(waiter)
        } else {
            self.waiters.push_back(waiter);
            Acquire::Queued
        }
    }

    /// Give a slot back. If anyone is waiting, the slot passes straight to the head of the queue and that waiter is
    /// returned for the caller to resume; occupancy is unchanged in that case.
    ///
    /// # Panics
    ///
    /// Releasing a pool that nobody holds is a bookkeeping defect.
    pub fn release(&mut self) -> Option<W> {
        assert!(self.occupancy > 0, "{} released with no slot held", self.name);
        self.occupancy -= 1;

        let next = self.waiters.pop_front()?;
        self.occupancy += 1;
        debug_assert!(self.occupancy <= self.capacity);
        Some(next)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently granted.
    pub fn occupancy(&self) -> usize {
        self.occupancy
    }

    /// Number of waiters queued for a slot.
    pub fn queue_len(&self) -> usize {
        self.waiters.len()
    }

    /// `capacity - occupancy`.
    pub fn idle_capacity(&self) -> usize {
        self.capacity - self.occupancy
    }

    /// Whether every slot is held.
    pub fn is_full(&self) -> bool {
        self.occupancy == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    #[test]
    fn zero_capacity_is_rejected() {
        let result = ResourcePool::<u32>::new("theatre", 0);
        assert!(matches!(
            result,
            Err(ConfigError::ZeroCapacity { resource: "theatre" })
        ));
    }

    #[test]
    fn grants_until_full_then_queues() {
        let mut pool = ResourcePool::new("prep", 2).unwrap();
        assert_eq!(Acquire::Granted(1), pool.acquire(1));
        assert_eq!(Acquire::Granted(2), pool.acquire(2));
        assert_eq!(Acquire::Queued, pool.acquire(3));
        assert_eq!(Acquire::Queued, pool.acquire(4));

        assert_eq!(2, pool.occupancy());
        assert_eq!(2, pool.queue_len());
        assert_eq!(0, pool.idle_capacity());
        assert!(pool.is_full());
    }

    #[test]
    fn release_hands_off_in_arrival_order() {
        let mut pool = ResourcePool::new("recovery", 1).unwrap();
        assert_eq!(Acquire::Granted('a'), pool.acquire('a'));
        for waiter in ['b', 'c', 'd'] {
            assert_eq!(Acquire::Queued, pool.acquire(waiter));
        }

        assert_eq!(Some('b'), pool.release());
        assert_eq!(Some('c'), pool.release());
        assert_eq!(1, pool.occupancy(), "hand-off should keep the slot held");
        assert_eq!(Some('d'), pool.release());
        assert_eq!(None, pool.release());
        assert_eq!(0, pool.occupancy());
        assert_eq!(1, pool.idle_capacity());
    }

    #[test]
    #[should_panic(expected = "released with no slot held")]
    fn releasing_an_idle_pool_panics() {
        let mut pool = ResourcePool::<()>::new("prep", 3).unwrap();
        let _ = pool.release();
    }

    #[test]
    fn occupancy_stays_within_bounds_under_random_load() {
        let mut rng = Pcg64::seed_from_u64(7);
        for capacity in 1..=5 {
            let mut pool = ResourcePool::new("pool", capacity).unwrap();
            let mut next_id = 0_u32;
            let mut granted_order = Vec::new();

            for _ in 0..2_000 {
                if pool.occupancy() == 0 || rng.random_bool(0.55) {
                    if let Acquire::Granted(id) = pool.acquire(next_id) {
                        granted_order.push(id);
                    }
                    next_id += 1;
                } else if let Some(id) = pool.release() {
                    granted_order.push(id);
                }

                assert!(pool.occupancy() <= capacity, "occupancy exceeded capacity {capacity}");
                assert_eq!(capacity - pool.occupancy(), pool.idle_capacity());
                if pool.queue_len() > 0 {
                    assert!(pool.is_full(), "waiters queued while a slot was free");
                }
            }

            let mut sorted = granted_order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, granted_order, "grants should follow request order");
        }
    }
}
