// SPDX-License-Identifier: MIT

//! MCU-level peripheral wrappers: USART console, SPI bus, LED.

pub mod led;
pub mod spi;
pub mod usart;

pub use led::Led;
pub use spi::{ChipSelect, SpiBus};
pub use usart::Usart;
