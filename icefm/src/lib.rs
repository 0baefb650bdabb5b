// SPDX-License-Identifier: MIT

//! # ICEFM Core
//!
//! Hardware-independent control plane for an iCE5 FPGA 8-operator, 2-voice
//! FM synthesizer. The firmware crate supplies the transports (USART
//! console, SPI register bus, DWT cycle counter); everything in here is
//! plain `no_std` logic and runs on the host for testing.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`timing`] | Wrap-safe cycle-counter deadlines, delays and profiling |
//! | [`debounce`] | Shift-register consensus filter for button inputs |
//! | [`synth`] | In-memory voice/patch model (2 voices × 8 operators) |
//! | [`protocol`] | FPGA register map, fixed-point frequency codec, commit sequencing |
//! | [`cmd`] | Line-oriented console command interpreter |

#![no_std]

pub mod cmd;
pub mod debounce;
pub mod protocol;
pub mod synth;
pub mod timing;

#[cfg(test)]
mod testutil;
