// SPDX-License-Identifier: MIT

//! 1 kHz SysTick: button debouncing and the millisecond counter.
//!
//! The debouncers live in the handler's own statics and are touched by no
//! other context. Everything the main loop consumes crosses over as a
//! single atomic word: the 2-bit stable gate state and the tick count.

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;
use icefm::debounce::Debouncer;
use stm32f7xx_hal::pac;

/// Debounce history length in ticks (31 ms to settle).
const DEBOUNCE_LEN: u8 = 31;

static MILLIS: AtomicU32 = AtomicU32::new(0);
static GATE_WORD: AtomicU32 = AtomicU32::new(0);

/// Start the 1 kHz tick. The button pins must already be configured as
/// pulled-up inputs on PC14/PC15.
pub fn start(mut syst: SYST, sysclk_hz: u32) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(sysclk_hz / 1000 - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Milliseconds since `start`. Wraps at 2^32.
#[inline]
pub fn millis() -> u32 {
    MILLIS.load(Ordering::Relaxed)
}

/// Debounced 2-bit gate word: bit 0 = button 1, bit 1 = button 2.
#[inline]
pub fn gate_word() -> u16 {
    GATE_WORD.load(Ordering::Relaxed) as u16
}

#[exception]
fn SysTick() {
    static mut BTN1: Debouncer = Debouncer::new(DEBOUNCE_LEN);
    static mut BTN2: Debouncer = Debouncer::new(DEBOUNCE_LEN);

    // Buttons are active-low on PC14/PC15; sample them inverted.
    let idr = unsafe { (*pac::GPIOC::ptr()).idr.read().bits() };
    BTN1.sample(idr & (1 << 14) == 0);
    BTN2.sample(idr & (1 << 15) == 0);

    let word = ((BTN2.state() as u32) << 1) | BTN1.state() as u32;
    GATE_WORD.store(word, Ordering::Relaxed);

    MILLIS.fetch_add(1, Ordering::Relaxed);
}
