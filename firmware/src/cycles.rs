// SPDX-License-Identifier: MIT

//! DWT cycle counter bring-up.
//!
//! The CYCCNT register free-runs at the system clock once enabled; the
//! core crate's [`CycleClock`] does all deadline arithmetic on top of it.

use cortex_m::peripheral::{DCB, DWT};
use icefm::timing::{CycleClock, CycleCounter};

/// Zero-sized handle over the running DWT cycle counter.
pub struct DwtCycles;

impl CycleCounter for DwtCycles {
    #[inline]
    fn now(&self) -> u32 {
        DWT::cycle_count()
    }
}

/// Enable the cycle counter and build the timing service around it.
///
/// Call once at startup, before any deadline or delay is created.
pub fn enable(dcb: &mut DCB, dwt: &mut DWT, sysclk_hz: u32) -> CycleClock<DwtCycles> {
    dcb.enable_trace();
    dwt.enable_cycle_counter();
    CycleClock::new(DwtCycles, sysclk_hz)
}
