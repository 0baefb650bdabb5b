// SPDX-License-Identifier: MIT

//! Shared test doubles: a recording register bus and a fixed-capacity
//! console sink. Test-only; nothing here touches hardware.

use core::convert::Infallible;
use core::fmt;

use crate::protocol::RegisterBus;

const MAX_WRITES: usize = 256;

/// Register bus that records every write and serves reads from a local
/// register file.
pub struct MockBus {
    regs: [u32; 128],
    writes: [(u8, u32); MAX_WRITES],
    n_writes: usize,
    n_reads: usize,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            regs: [0; 128],
            writes: [(0, 0); MAX_WRITES],
            n_writes: 0,
            n_reads: 0,
        }
    }

    /// Preload a register value for subsequent reads.
    pub fn set_reg(&mut self, addr: u8, value: u32) {
        self.regs[addr as usize] = value;
    }

    /// All writes issued so far, in order.
    pub fn writes(&self) -> &[(u8, u32)] {
        &self.writes[..self.n_writes]
    }

    pub fn read_count(&self) -> usize {
        self.n_reads
    }

    /// Total number of register transactions (reads + writes).
    pub fn transaction_count(&self) -> usize {
        self.n_reads + self.n_writes
    }

    pub fn clear(&mut self) {
        self.n_writes = 0;
        self.n_reads = 0;
    }
}

impl RegisterBus for MockBus {
    type Error = Infallible;

    fn read(&mut self, addr: u8) -> Result<u32, Infallible> {
        self.n_reads += 1;
        Ok(self.regs[(addr & 0x7F) as usize])
    }

    fn write(&mut self, addr: u8, value: u32) -> Result<(), Infallible> {
        self.regs[(addr & 0x7F) as usize] = value;
        assert!(self.n_writes < MAX_WRITES, "mock bus write log full");
        self.writes[self.n_writes] = (addr, value);
        self.n_writes += 1;
        Ok(())
    }
}

const SINK_CAP: usize = 4096;

/// `fmt::Write` sink over a fixed buffer, standing in for the USART.
pub struct SinkConsole {
    buf: [u8; SINK_CAP],
    len: usize,
}

impl SinkConsole {
    pub fn new() -> Self {
        Self {
            buf: [0; SINK_CAP],
            len: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl fmt::Write for SinkConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        assert!(self.len + bytes.len() <= SINK_CAP, "console sink full");
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}
