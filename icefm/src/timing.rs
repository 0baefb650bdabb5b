// SPDX-License-Identifier: MIT

//! Cycle-counter timing services: one-shot deadlines, blocking delays and
//! duty-cycle profiling.
//!
//! All arithmetic is performed on a free-running 32-bit counter that wraps
//! roughly every 2^32 ticks. Deadline comparisons use the signed difference
//! `(now - target) as i32`, which stays correct across the wrap as long as
//! no single interval exceeds 2^31 ticks.

/// Free-running 32-bit cycle counter.
///
/// The firmware implements this over the Cortex-M DWT CYCCNT register;
/// tests use a manually advanced counter. Implementations must already be
/// counting by the time a [`CycleClock`] is built around them.
pub trait CycleCounter {
    /// Current counter value. Wraps silently.
    fn now(&self) -> u32;
}

/// A future counter value to compare against.
///
/// Deadlines are transient: create one, poll it, throw it away. They stay
/// meaningful for at most 2^31 ticks after the instant they refer to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Deadline(u32);

/// Timing service bound to a counter and its tick rate.
pub struct CycleClock<C: CycleCounter> {
    counter: C,
    ticks_per_second: u32,

    // Profiling state (single logical thread of control assumed).
    meas_start: u32,
    active_ticks: u32,
    total_ticks: u32,
}

impl<C: CycleCounter> CycleClock<C> {
    /// Build the timing service around an already-running counter.
    ///
    /// `ticks_per_second` is the counter's tick rate (the system clock
    /// frequency when the counter is the DWT cycle counter).
    pub fn new(counter: C, ticks_per_second: u32) -> Self {
        Self {
            counter,
            ticks_per_second,
            meas_start: 0,
            active_ticks: 0,
            total_ticks: 0,
        }
    }

    #[inline]
    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    #[inline]
    pub fn now(&self) -> u32 {
        self.counter.now()
    }

    /// Deadline `n` counter ticks from now.
    #[inline]
    pub fn deadline_cycles(&self, n: u32) -> Deadline {
        Deadline(self.counter.now().wrapping_add(n))
    }

    /// Deadline `ms` milliseconds from now.
    #[inline]
    pub fn deadline_millis(&self, ms: u32) -> Deadline {
        self.deadline_cycles(ms.wrapping_mul(self.ticks_per_second / 1000))
    }

    /// True once the deadline has passed.
    ///
    /// The signed-difference form is what makes this wrap-safe; do not
    /// "simplify" it to an unsigned comparison.
    #[inline]
    pub fn reached(&self, deadline: Deadline) -> bool {
        self.counter.now().wrapping_sub(deadline.0) as i32 >= 0
    }

    /// Busy-poll for `n` cycles. Blocks the caller for the whole interval;
    /// the SysTick handler still runs underneath.
    pub fn sleep_cycles(&self, n: u32) {
        let deadline = self.deadline_cycles(n);
        while !self.reached(deadline) {}
    }

    /// Busy-poll for `ms` milliseconds.
    pub fn sleep_millis(&self, ms: u32) {
        self.sleep_cycles(ms.wrapping_mul(self.ticks_per_second / 1000));
    }

    /// Mark the start of the routine being profiled.
    ///
    /// Records the ticks elapsed since the previous `mark_start` as the
    /// "total" period of the recurring routine.
    pub fn mark_start(&mut self) {
        let now = self.counter.now();
        self.total_ticks = now.wrapping_sub(self.meas_start);
        self.meas_start = now;
    }

    /// Mark the end of the routine being profiled.
    ///
    /// Records the ticks elapsed since `mark_start` as the "active" time.
    pub fn mark_end(&mut self) {
        self.active_ticks = self.counter.now().wrapping_sub(self.meas_start);
    }

    /// Latest `(active_ticks, total_ticks)` measurement.
    #[inline]
    pub fn measurement(&self) -> (u32, u32) {
        (self.active_ticks, self.total_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Counter advanced by hand from the test body.
    struct MockCounter(Cell<u32>);

    impl MockCounter {
        fn at(start: u32) -> Self {
            Self(Cell::new(start))
        }

        fn advance(&self, n: u32) {
            self.0.set(self.0.get().wrapping_add(n));
        }
    }

    impl CycleCounter for &MockCounter {
        fn now(&self) -> u32 {
            self.0.get()
        }
    }

    #[test]
    fn deadline_not_reached_until_elapsed() {
        let cnt = MockCounter::at(1000);
        let clock = CycleClock::new(&cnt, 1_000_000);

        let d = clock.deadline_cycles(50);
        assert!(!clock.reached(d));

        cnt.advance(49);
        assert!(!clock.reached(d));

        cnt.advance(1);
        assert!(clock.reached(d));
    }

    #[test]
    fn zero_cycle_deadline_is_immediately_reached() {
        let cnt = MockCounter::at(7);
        let clock = CycleClock::new(&cnt, 1_000_000);
        assert!(clock.reached(clock.deadline_cycles(0)));
    }

    #[test]
    fn deadline_survives_counter_wraparound() {
        // Park the counter just below the wrap point, then arm a deadline
        // that lands on the far side of it.
        let cnt = MockCounter::at(u32::MAX - 10);
        let clock = CycleClock::new(&cnt, 1_000_000);

        let d = clock.deadline_cycles(100);
        assert!(!clock.reached(d));

        cnt.advance(50); // counter has wrapped to 39 here
        assert!(!clock.reached(d));

        cnt.advance(50);
        assert!(clock.reached(d));
    }

    #[test]
    fn millis_deadline_scales_by_tick_rate() {
        let cnt = MockCounter::at(0);
        let clock = CycleClock::new(&cnt, 8_000_000); // 8000 ticks/ms

        let d = clock.deadline_millis(3);
        cnt.advance(3 * 8000 - 1);
        assert!(!clock.reached(d));
        cnt.advance(1);
        assert!(clock.reached(d));
    }

    #[test]
    fn measurement_reports_active_and_total() {
        let cnt = MockCounter::at(100);
        let mut clock = CycleClock::new(&cnt, 1_000_000);

        clock.mark_start();
        cnt.advance(30);
        clock.mark_end();
        cnt.advance(70);
        clock.mark_start(); // period = 30 + 70 ticks since prior start

        let (active, total) = clock.measurement();
        assert_eq!(active, 30);
        assert_eq!(total, 100);
    }
}
