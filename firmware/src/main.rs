// SPDX-License-Identifier: MIT

//! ICEFM firmware entry point.
//!
//! Bring-up order: cycle counter, SysTick debounce tick, LED, USART
//! console, FPGA register interface, default patches. Then a single
//! polling loop drives everything: heartbeat LED on a 100 ms deadline,
//! gate writes on debounced button changes, and the command interpreter
//! on received console bytes.

#![no_main]
#![no_std]
#![allow(dead_code)]

use core::fmt::Write;

use cortex_m_rt::entry;
use panic_halt as _;

use hal::{
    pac,
    prelude::*,
    serial::{Config, Serial},
    spi::{Mode, Phase, Polarity, Spi},
};
use stm32f7xx_hal as hal;

use icefm::cmd::{CmdError, Interpreter};
use icefm::protocol::{self, reg};
use icefm::synth::FmSynth;

mod cycles;
mod fpga;
mod hw;
mod tick;

use hw::{ChipSelect, Led, SpiBus, Usart};

#[entry]
fn main() -> ! {
    // Peripherals
    let mut cp = cortex_m::Peripherals::take().unwrap();
    let dp = pac::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let mut apb2 = rcc.apb2;
    let sysclk_hz = clocks.sysclk().raw();

    // Cycle counter + timing service
    let mut clock = cycles::enable(&mut cp.DCB, &mut cp.DWT, sysclk_hz);

    // GPIO
    let gpioa = dp.GPIOA.split();
    let gpioc = dp.GPIOC.split();
    let gpiod = dp.GPIOD.split();
    let gpioe = dp.GPIOE.split();

    // Buttons on PC14/PC15, sampled by the SysTick handler.
    let _btn1 = gpioc.pc14.into_pull_up_input();
    let _btn2 = gpioc.pc15.into_pull_up_input();
    tick::start(cp.SYST, sysclk_hz);

    // Heartbeat LED
    let mut led = Led::active_low(gpiod.pd9);

    // USART1 console
    let tx = gpioa.pa9.into_alternate::<7>();
    let rx = gpioa.pa10.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (tx, rx), &clocks, usart_cfg);
    let mut usart = Usart::new(serial);
    usart.println("\r\nICEFM iCE5 FM synth console");

    // SPI4 to the FPGA, mode 0
    let sck = gpioe.pe12.into_alternate::<5>();
    let miso = gpioe.pe13.into_alternate::<5>();
    let mosi = gpioe.pe14.into_alternate::<5>();
    let spi_mode = Mode {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnFirstTransition,
    };
    let spi4 = Spi::new(dp.SPI4, (sck, miso, mosi)).enable::<u8>(spi_mode, 1.MHz(), &clocks, &mut apb2);
    let cs = ChipSelect::active_low(gpioe.pe4);
    let mut fpga = fpga::Fpga::new(SpiBus::new(spi4), cs);

    // ID register sanity check: the bitstream is loaded before we get
    // here, so a stuck bus shows up as all-zeros or all-ones.
    match fpga.read_reg(reg::ID) {
        Ok(id) => {
            let _ = write!(usart, "FPGA ID = 0x{:08X}\r\n", id);
            if id == 0 || id == 0xFFFF_FFFF {
                usart.println("warning: ID read looks like a stuck bus");
            }
        }
        Err(_) => usart.println("error: FPGA ID read failed"),
    }

    // Heartbeat divider on the FPGA side, then the default patches.
    let mut synth = FmSynth::new();
    let ok = fpga
        .write_reg(reg::BLINK, 1249)
        .and_then(|_| synth.commit_all(&mut fpga));
    match ok {
        Ok(()) => usart.println("FM configured."),
        Err(_) => usart.println("error: FM patch init failed"),
    }

    // Command loop
    let mut interp = Interpreter::new();
    let _ = interp.prompt(&mut usart);

    let mut heartbeat = clock.deadline_millis(100);
    let mut prev_gate: u16 = 0;

    loop {
        // Heartbeat
        if clock.reached(heartbeat) {
            led.toggle();
            heartbeat = clock.deadline_millis(100);
        }

        // Debounced keypress -> gate word
        let gate = tick::gate_word();
        if gate != prev_gate {
            if protocol::gate(&mut fpga, gate).is_err() {
                usart.println("spi error");
            }
            let _ = write!(usart, "Key = {}\r\n", gate);
            prev_gate = gate;
        }

        // Console command processing, duty-cycle profiled
        if let Some(ch) = usart.try_read() {
            clock.mark_start();
            match interp.feed(ch, &mut usart, &mut fpga, &mut synth) {
                Ok(()) => {}
                Err(CmdError::Bus(_)) => {
                    usart.println("\r\nspi error");
                    let _ = interp.prompt(&mut usart);
                }
                // The USART sink never reports a formatting error.
                Err(CmdError::Fmt(_)) => {}
            }
            clock.mark_end();
        }
    }
}
