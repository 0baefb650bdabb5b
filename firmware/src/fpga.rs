// SPDX-License-Identifier: MIT

//! iCE5 FPGA SPI slave interface.
//!
//! Register frame: one command byte (bit 7 = read flag, bits 6..0 =
//! register address) followed by four data bytes MSB-first, chip select
//! held low across the whole frame. On reads the FPGA shifts the register
//! contents out on the data bytes.
//!
//! Bitstream configuration is handled before this firmware touches the
//! device; this driver assumes a configured FPGA and only does register
//! traffic.

use icefm::protocol::RegisterBus;
use stm32f7xx_hal::spi;

use crate::hw::{ChipSelect, SpiBus};

const READ_FLAG: u8 = 1 << 7;

/// FPGA register transport owning the SPI bus and its chip select.
///
/// The FPGA is the only device on this bus, so the driver owns the bus
/// outright instead of borrowing it per transaction.
pub struct Fpga<I, PINS, const P: char, const N: u8> {
    spi: SpiBus<I, PINS>,
    cs: ChipSelect<P, N>,
}

impl<I, PINS, const P: char, const N: u8> Fpga<I, PINS, P, N>
where
    I: spi::Instance,
    PINS: spi::Pins<I>,
{
    pub fn new(spi: SpiBus<I, PINS>, cs: ChipSelect<P, N>) -> Self {
        Self { spi, cs }
    }

    fn frame(&mut self, cmd: u8, data: u32) -> Result<u32, spi::Error> {
        self.cs.select();
        let result = self.frame_inner(cmd, data);
        // Deassert even on a failed transfer so the slave resyncs.
        self.cs.deselect();
        result
    }

    fn frame_inner(&mut self, cmd: u8, data: u32) -> Result<u32, spi::Error> {
        self.spi.write_byte(cmd)?;
        let mut readback: u32 = 0;
        for shift in [24u32, 16, 8, 0] {
            let rx = self.spi.transfer_byte((data >> shift) as u8)?;
            readback |= (rx as u32) << shift;
        }
        Ok(readback)
    }

    pub fn read_reg(&mut self, addr: u8) -> Result<u32, spi::Error> {
        self.frame(READ_FLAG | (addr & 0x7F), 0)
    }

    pub fn write_reg(&mut self, addr: u8, value: u32) -> Result<(), spi::Error> {
        self.frame(addr & 0x7F, value)?;
        Ok(())
    }
}

impl<I, PINS, const P: char, const N: u8> RegisterBus for Fpga<I, PINS, P, N>
where
    I: spi::Instance,
    PINS: spi::Pins<I>,
{
    type Error = spi::Error;

    fn read(&mut self, addr: u8) -> Result<u32, spi::Error> {
        self.read_reg(addr)
    }

    fn write(&mut self, addr: u8, value: u32) -> Result<(), spi::Error> {
        self.write_reg(addr, value)
    }
}
