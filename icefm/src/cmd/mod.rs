// SPDX-License-Identifier: MIT

//! Line-oriented console command interpreter.
//!
//! Characters arrive one at a time from the USART poll loop and accumulate
//! in a fixed line buffer until a carriage return, which tokenizes the line
//! and dispatches it against the static command table. Backspace edits the
//! buffer; anything typed past the buffer limit is silently dropped so the
//! already-accepted input is never corrupted.
//!
//! User input errors (unknown command, missing or malformed arguments) are
//! console text, not `Err` values; `Err` is reserved for transport faults
//! bubbling up from the register bus.

mod table;

pub use table::{lookup, Cmd, Entry, COMMANDS};

use core::fmt::{self, Write};

use crate::protocol::{self, RegisterBus};
use crate::synth::FmSynth;

/// Line buffer capacity in bytes.
pub const LINE_CAP: usize = 256;

/// Write cursor limit, leaving room for the line terminator.
const LINE_LIMIT: usize = LINE_CAP - 2;

/// Maximum tokens per line: the command name plus three arguments. Extra
/// tokens are ignored.
const MAX_TOKENS: usize = 4;

const BS: u8 = 0x08;
const CR: u8 = 0x0D;

/// Interpreter failure: a transport fault or a console formatting error.
/// User input mistakes never produce one of these.
#[derive(Debug)]
pub enum CmdError<E> {
    Bus(E),
    Fmt(fmt::Error),
}

impl<E> From<fmt::Error> for CmdError<E> {
    fn from(e: fmt::Error) -> Self {
        CmdError::Fmt(e)
    }
}

/// Console command interpreter with its line accumulation state.
pub struct Interpreter {
    buf: [u8; LINE_CAP],
    len: usize,
}

impl Interpreter {
    pub const fn new() -> Self {
        Self {
            buf: [0; LINE_CAP],
            len: 0,
        }
    }

    /// Reset the line buffer and print the prompt. Called once at startup
    /// and after every dispatched line.
    pub fn prompt<W: Write>(&mut self, con: &mut W) -> fmt::Result {
        self.len = 0;
        con.write_str("\rCommand>")
    }

    /// Process one received character.
    ///
    /// Printable characters are echoed and accumulated, backspace edits,
    /// and carriage return dispatches the buffered line. Dispatch may
    /// touch FPGA registers through `bus` and the patch model in `synth`.
    pub fn feed<W, B>(
        &mut self,
        ch: u8,
        con: &mut W,
        bus: &mut B,
        synth: &mut FmSynth,
    ) -> Result<(), CmdError<B::Error>>
    where
        W: Write,
        B: RegisterBus,
    {
        match ch {
            BS => {
                if self.len > 0 {
                    self.len -= 1;
                    con.write_str("\x08 \x08")?; // erase and back up
                }
            }
            CR => {
                self.dispatch(con, bus, synth)?;
                self.prompt(con)?;
            }
            _ => {
                // Full buffer: drop the character, keep what we have.
                if self.len < LINE_LIMIT {
                    self.buf[self.len] = ch;
                    self.len += 1;
                    con.write_char(ch as char)?;
                }
            }
        }
        Ok(())
    }

    /// Tokenize the buffered line and run the matching command handler.
    fn dispatch<W, B>(
        &mut self,
        con: &mut W,
        bus: &mut B,
        synth: &mut FmSynth,
    ) -> Result<(), CmdError<B::Error>>
    where
        W: Write,
        B: RegisterBus,
    {
        let line = core::str::from_utf8(&self.buf[..self.len]).unwrap_or("");

        let mut argv = [""; MAX_TOKENS];
        let mut argc = 0;
        for tok in line.split_ascii_whitespace() {
            if argc == MAX_TOKENS {
                break;
            }
            argv[argc] = tok;
            argc += 1;
        }

        // Empty line: nothing to dispatch.
        if argc == 0 {
            return Ok(());
        }

        let entry = match lookup(argv[0]) {
            Some(e) => e,
            None => {
                con.write_str("Unknown command\r\n")?;
                return Ok(());
            }
        };

        con.write_str("\r\n")?;

        if argc - 1 < entry.min_args {
            write!(con, "{} - missing arg(s)\r\n", entry.name)?;
            return Ok(());
        }

        let args = &argv[1..argc];
        match entry.cmd {
            Cmd::Help => help(con)?,
            Cmd::SpiRead => spi_read(con, bus, args)?,
            Cmd::SpiWrite => spi_write(con, bus, args)?,
            Cmd::ReadBus => readbus(con, bus)?,
            Cmd::ReadReg => readreg(con, bus)?,
            Cmd::SetVoiceFreq => setvfreq(con, bus, synth, args)?,
            Cmd::SetOpFreq => setofreq(con, synth, args)?,
            Cmd::SetOpAtten => setoatten(con, bus, synth, args)?,
            Cmd::SetOpWave => setowave(con, bus, synth, args)?,
        }
        Ok(())
    }
}

/// Parse an unsigned integer argument, decimal or `0x`-prefixed hex.
fn parse_int(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Parse a frequency argument, standard decimal float syntax.
fn parse_float(s: &str) -> Option<f32> {
    s.parse().ok()
}

fn bad_arg<W: Write>(con: &mut W, name: &str) -> fmt::Result {
    write!(con, "{} - bad argument\r\n", name)
}

fn help<W: Write>(con: &mut W) -> fmt::Result {
    con.write_str("help - this message\r\n")?;
    con.write_str("spi_read <addr> - FPGA SPI read reg\r\n")?;
    con.write_str("spi_write <addr> <data> - FPGA SPI write reg, data\r\n")?;
    con.write_str("readbus - parse readbus diags\r\n")?;
    con.write_str("readreg - dump param regs\r\n")?;
    con.write_str("setvfreq <voice> <freq> - set voice freq (Hz)\r\n")?;
    con.write_str("setofreq <voice> <op> <freq> - set op freq (ratio / -Hz)\r\n")?;
    con.write_str("setoatten <voice> <op> <atten> - set op atten\r\n")?;
    con.write_str("setowave <voice> <op> <wave> - set op wave\r\n")
}

fn spi_read<W, B>(con: &mut W, bus: &mut B, args: &[&str]) -> Result<(), CmdError<B::Error>>
where
    W: Write,
    B: RegisterBus,
{
    let addr = match parse_int(args[0]) {
        Some(a) => (a & 0x7F) as u8,
        None => return Ok(bad_arg(con, "spi_read")?),
    };
    let data = bus.read(addr).map_err(CmdError::Bus)?;
    write!(con, "spi_read: 0x{:02X} = 0x{:08X}\r\n", addr, data)?;
    Ok(())
}

fn spi_write<W, B>(con: &mut W, bus: &mut B, args: &[&str]) -> Result<(), CmdError<B::Error>>
where
    W: Write,
    B: RegisterBus,
{
    let (addr, data) = match (parse_int(args[0]), parse_int(args[1])) {
        (Some(a), Some(d)) => ((a & 0x7F) as u8, d),
        _ => return Ok(bad_arg(con, "spi_write")?),
    };
    bus.write(addr, data).map_err(CmdError::Bus)?;
    write!(con, "spi_write: 0x{:02X} 0x{:08X}\r\n", addr, data)?;
    Ok(())
}

/// Dump the packed diagnostic bus words, one field per line.
fn readbus<W, B>(con: &mut W, bus: &mut B) -> Result<(), CmdError<B::Error>>
where
    W: Write,
    B: RegisterBus,
{
    let diag = protocol::DiagWords::read(bus).map_err(CmdError::Bus)?;
    write!(con, "freq: 0x{:05X}\r\n", diag.freq())?;
    write!(con, "  wv: 0x{:01X}\r\n", diag.wave())?;
    write!(con, " adj: 0x{:03X}\r\n", diag.atten())?;
    write!(con, "  ar: 0x{:05X}\r\n", diag.ar())?;
    write!(con, "  dr: 0x{:05X}\r\n", diag.dr())?;
    write!(con, "  sl: 0x{:05X}\r\n", diag.sl())?;
    write!(con, "  rr: 0x{:05X}\r\n", diag.rr())?;
    write!(con, "  li: 0x{:01X}\r\n", diag.left())?;
    write!(con, "  ri: 0x{:01X}\r\n", diag.right())?;
    write!(con, " mod: 0x{:01X}\r\n", diag.mod_en())?;
    write!(con, " acc: 0x{:01X}\r\n", diag.acc_en())?;
    write!(con, " clr: 0x{:01X}\r\n", diag.acc_clr())?;
    write!(con, "  fb: 0x{:01X}\r\n", diag.fb())?;
    Ok(())
}

/// Dump the staged parameter registers for the currently addressed
/// operator, each field masked to its width.
fn readreg<W, B>(con: &mut W, bus: &mut B) -> Result<(), CmdError<B::Error>>
where
    W: Write,
    B: RegisterBus,
{
    use crate::protocol::reg;

    let mut rd = |addr| bus.read(addr).map_err(CmdError::Bus);

    let freq = rd(reg::FREQ)?;
    write!(con, "freq: 0x{:05X}\r\n", freq & protocol::FREQ_MASK)?;
    let wave = rd(reg::WAVE)?;
    write!(con, "  wv: 0x{:01X}\r\n", wave & 0x7)?;
    let atten = rd(reg::ATTEN)?;
    write!(con, " adj: 0x{:03X}\r\n", atten & 0x1FF)?;
    let ar = rd(reg::ATTACK)?;
    write!(con, "  ar: 0x{:05X}\r\n", ar & 0x3F)?;
    let dr = rd(reg::DECAY)?;
    write!(con, "  dr: 0x{:05X}\r\n", dr & 0x3F)?;
    let sl = rd(reg::SUSTAIN)?;
    write!(con, "  sl: 0x{:05X}\r\n", sl & 0x1F)?;
    let rr = rd(reg::RELEASE)?;
    write!(con, "  rr: 0x{:05X}\r\n", rr & 0x3F)?;
    let flags = rd(reg::FLAGS)?;
    write!(con, "  li: 0x{:01X}\r\n", (flags >> 4) & 0x1)?;
    write!(con, "  ri: 0x{:01X}\r\n", (flags >> 5) & 0x1)?;
    write!(con, " mod: 0x{:01X}\r\n", (flags >> 3) & 0x1)?;
    write!(con, " acc: 0x{:01X}\r\n", (flags >> 2) & 0x1)?;
    write!(con, " clr: 0x{:01X}\r\n", (flags >> 1) & 0x1)?;
    write!(con, "  fb: 0x{:01X}\r\n", flags & 0x1)?;
    Ok(())
}

/// Set a voice's base frequency and re-commit its entire patch.
fn setvfreq<W, B>(
    con: &mut W,
    bus: &mut B,
    synth: &mut FmSynth,
    args: &[&str],
) -> Result<(), CmdError<B::Error>>
where
    W: Write,
    B: RegisterBus,
{
    let (voice, freq) = match (parse_int(args[0]), parse_float(args[1])) {
        (Some(v), Some(f)) => ((v & 0x1) as usize, f),
        _ => return Ok(bad_arg(con, "setvfreq")?),
    };
    synth.commit_voice(bus, voice, freq).map_err(CmdError::Bus)?;
    con.write_str("OK\r\n")?;
    Ok(())
}

/// Update one operator's frequency field in memory only. The change is
/// realized on the next full-patch commit (`setvfreq`).
fn setofreq<W, E>(
    con: &mut W,
    synth: &mut FmSynth,
    args: &[&str],
) -> Result<(), CmdError<E>>
where
    W: Write,
{
    let (voice, op, freq) = match (parse_int(args[0]), parse_int(args[1]), parse_float(args[2])) {
        (Some(v), Some(o), Some(f)) => ((v & 0x1) as usize, (o & 0x7) as usize, f),
        _ => return Ok(bad_arg(con, "setofreq")?),
    };
    synth.set_op_freq(voice, op, freq);
    con.write_str("OK\r\n")?;
    Ok(())
}

/// Update one operator's attenuation and push that operator immediately.
fn setoatten<W, B>(
    con: &mut W,
    bus: &mut B,
    synth: &mut FmSynth,
    args: &[&str],
) -> Result<(), CmdError<B::Error>>
where
    W: Write,
    B: RegisterBus,
{
    let (voice, op, atten) = match (parse_int(args[0]), parse_int(args[1]), parse_int(args[2])) {
        (Some(v), Some(o), Some(a)) => ((v & 0x1) as usize, (o & 0x7) as usize, (a & 0x1FF) as u16),
        _ => return Ok(bad_arg(con, "setoatten")?),
    };
    synth.set_op_atten(voice, op, atten);
    synth.commit_op(bus, voice, op).map_err(CmdError::Bus)?;
    write!(con, "setoatten: {} {} {}\r\n", voice, op, atten)?;
    Ok(())
}

/// Update one operator's waveform and push that operator immediately.
fn setowave<W, B>(
    con: &mut W,
    bus: &mut B,
    synth: &mut FmSynth,
    args: &[&str],
) -> Result<(), CmdError<B::Error>>
where
    W: Write,
    B: RegisterBus,
{
    let (voice, op, wave) = match (parse_int(args[0]), parse_int(args[1]), parse_int(args[2])) {
        (Some(v), Some(o), Some(w)) => ((v & 0x1) as usize, (o & 0x7) as usize, (w & 0x7) as u8),
        _ => return Ok(bad_arg(con, "setowave")?),
    };
    synth.set_op_wave(voice, op, wave);
    synth.commit_op(bus, voice, op).map_err(CmdError::Bus)?;
    write!(con, "setowave: {} {} {}\r\n", voice, op, wave)?;
    Ok(())
}
