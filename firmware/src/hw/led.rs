// SPDX-License-Identifier: MIT

//! Heartbeat LED wrapper.

use embedded_hal::digital::v2::OutputPin;

/// LED on a push-pull GPIO, remembering its wiring polarity and last
/// commanded state so it can toggle.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active_low: bool,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Wrap a pin wired LED-to-VCC (drive low to light).
    pub fn active_low(pin: PIN) -> Self {
        let mut led = Self {
            pin,
            active_low: true,
            is_on: false,
        };
        led.set(false);
        led
    }

    /// Wrap a pin wired LED-to-GND (drive high to light).
    pub fn active_high(pin: PIN) -> Self {
        let mut led = Self {
            pin,
            active_low: false,
            is_on: false,
        };
        led.set(false);
        led
    }

    /// Drive the LED logically ON (true) or OFF (false).
    pub fn set(&mut self, on: bool) {
        if on != self.active_low {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        self.is_on = on;
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }
}
