// SPDX-License-Identifier: MIT

//! Shift-register button debouncer.
//!
//! One `Debouncer` per physical input, advanced once per fixed sampling
//! tick (1 kHz from the SysTick handler in the firmware). The stable state
//! only changes when every sample in the configured history window agrees,
//! so single-sample glitches never get through.

/// Per-input debounce state.
pub struct Debouncer {
    /// Recent raw samples, newest in bit 0.
    pipe: u32,
    /// All-ones mask covering the history window.
    mask: u32,
    state: bool,
    prev_state: bool,
    rising: bool,
    falling: bool,
}

impl Debouncer {
    /// Create a debouncer with a `history_len`-sample consensus window.
    ///
    /// `history_len` must be in 1..=31.
    pub const fn new(history_len: u8) -> Self {
        Self {
            pipe: 0,
            mask: (1u32 << history_len) - 1,
            state: false,
            prev_state: false,
            rising: false,
            falling: false,
        }
    }

    /// Clear history, stable state and edge flags.
    pub fn reset(&mut self) {
        self.pipe = 0;
        self.state = false;
        self.prev_state = false;
        self.rising = false;
        self.falling = false;
    }

    /// Shift in one raw sample and update stable state and edge flags.
    ///
    /// Edge flags are valid only until the next `sample` call; callers that
    /// want edge-triggered behavior must consume them within the tick.
    pub fn sample(&mut self, raw: bool) {
        self.pipe = ((self.pipe << 1) | raw as u32) & self.mask;

        if self.pipe == self.mask {
            self.state = true;
        } else if self.pipe == 0 {
            self.state = false;
        }
        // Mixed history: leave stable state alone.

        self.rising = self.state && !self.prev_state;
        self.falling = !self.state && self.prev_state;
        self.prev_state = self.state;
    }

    /// Debounced stable state.
    #[inline]
    pub fn state(&self) -> bool {
        self.state
    }

    /// Stable state went 0 -> 1 on the last sample.
    #[inline]
    pub fn rising(&self) -> bool {
        self.rising
    }

    /// Stable state went 1 -> 0 on the last sample.
    #[inline]
    pub fn falling(&self) -> bool {
        self.falling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_high_after_full_window_of_ones() {
        let mut db = Debouncer::new(8);
        for i in 0..8 {
            assert!(!db.state(), "state flipped early at sample {}", i);
            db.sample(true);
        }
        assert!(db.state());
    }

    #[test]
    fn rising_edge_fires_exactly_once() {
        let mut db = Debouncer::new(4);
        for _ in 0..4 {
            db.sample(true);
        }
        assert!(db.rising());

        db.sample(true);
        assert!(db.state());
        assert!(!db.rising());
    }

    #[test]
    fn falling_edge_after_full_window_of_zeros() {
        let mut db = Debouncer::new(4);
        for _ in 0..4 {
            db.sample(true);
        }
        for _ in 0..3 {
            db.sample(false);
            assert!(db.state());
            assert!(!db.falling());
        }
        db.sample(false);
        assert!(!db.state());
        assert!(db.falling());
    }

    #[test]
    fn short_glitch_does_not_change_state() {
        let mut db = Debouncer::new(8);
        for _ in 0..8 {
            db.sample(true);
        }

        // Any mixed run shorter than the window must not move the state.
        for pattern in [[false, true, false], [false, false, true]] {
            for raw in pattern {
                db.sample(raw);
                assert!(db.state());
                assert!(!db.falling());
            }
            for _ in 0..8 {
                db.sample(true);
            }
        }
    }

    #[test]
    fn reset_clears_everything() {
        let mut db = Debouncer::new(4);
        for _ in 0..4 {
            db.sample(true);
        }
        db.reset();
        assert!(!db.state());
        assert!(!db.rising());
        assert!(!db.falling());

        // Needs a full window again after reset.
        for _ in 0..3 {
            db.sample(true);
            assert!(!db.state());
        }
        db.sample(true);
        assert!(db.state());
    }
}
