// SPDX-License-Identifier: MIT

//! FPGA register protocol: address map, fixed-point frequency codec and
//! the staged commit sequence for operator parameters.
//!
//! The per-operator register file inside the FPGA is wider than one SPI
//! transaction can address, so parameters are staged into shadow registers
//! (FREQ..FLAGS), then the target operator address is written and a strobe
//! latches everything into that operator's slot in one go. Operators never
//! see a half-updated parameter set.

use micromath::F32Ext;

use crate::synth::{Operator, Voice, OPS_PER_VOICE};

/// FPGA register addresses (7-bit address space).
pub mod reg {
    /// Device ID, read-only.
    pub const ID: u8 = 0;
    /// Heartbeat LED blink-rate divider.
    pub const BLINK: u8 = 1;
    /// Staged operator frequency code (19 bits).
    pub const FREQ: u8 = 2;
    /// Gate/trigger word, bit n = voice n.
    pub const GATE: u8 = 3;
    /// Staged waveform select (3 bits).
    pub const WAVE: u8 = 4;
    /// Staged envelope attack rate (6 bits).
    pub const ATTACK: u8 = 5;
    /// Staged envelope decay rate (6 bits).
    pub const DECAY: u8 = 6;
    /// Staged envelope sustain level (5 bits).
    pub const SUSTAIN: u8 = 7;
    /// Staged envelope release rate (6 bits).
    pub const RELEASE: u8 = 8;
    /// Staged attenuation (9 bits).
    pub const ATTEN: u8 = 9;
    /// Staged routing flags (6 bits).
    pub const FLAGS: u8 = 10;
    /// Target operator address for the next strobe.
    pub const OP_ADDR: u8 = 11;
    /// Commit strobe; writing 1 latches the staged parameters.
    pub const STROBE: u8 = 12;
    /// Packed diagnostic status word, low half.
    pub const DIAG_LO: u8 = 14;
    /// Packed diagnostic status word, high half.
    pub const DIAG_HI: u8 = 15;
}

/// FPGA audio sample rate in Hz.
pub const SAMPLE_RATE: f32 = 48_000.0;

/// Width of the phase accumulator / frequency code.
pub const FREQ_BITS: u32 = 19;

/// Mask for a frequency code.
pub const FREQ_MASK: u32 = (1 << FREQ_BITS) - 1;

/// Addressed 32-bit register transport to the FPGA.
///
/// Implemented over SPI by the firmware and by a recording mock in tests.
/// Both operations are synchronous and blocking; errors are whatever the
/// transport reports (SPI bus faults), surfaced here so callers can
/// propagate them with `?`.
pub trait RegisterBus {
    type Error;

    fn read(&mut self, addr: u8) -> Result<u32, Self::Error>;
    fn write(&mut self, addr: u8, value: u32) -> Result<(), Self::Error>;
}

/// Encode a frequency in Hz as a 19-bit phase-increment code.
///
/// Codes wrap modulo 2^19 by design; that matches the width of the
/// hardware phase accumulator, so a frequency of `SAMPLE_RATE` aliases
/// back to code 0.
pub fn freq_to_code(freq_hz: f32) -> u32 {
    let code = ((1u32 << FREQ_BITS) as f32 * (freq_hz / SAMPLE_RATE)).round();
    (code as u32) & FREQ_MASK
}

/// Decode a 19-bit phase-increment code back to Hz. Diagnostic use only.
pub fn code_to_freq(code: u32) -> f32 {
    (code & FREQ_MASK) as f32 * SAMPLE_RATE / (1u32 << FREQ_BITS) as f32
}

/// Resolve an operator frequency field against the voice base frequency:
/// negative values are ratios to the base, non-negative values absolute Hz.
pub fn resolve_freq(op_freq: f32, base_freq: f32) -> f32 {
    if op_freq < 0.0 {
        -op_freq * base_freq
    } else {
        op_freq
    }
}

/// Stage and strobe one operator's full parameter set.
///
/// `global_op` addresses the FPGA register file directly
/// (`voice * 8 + operator`, masked to 7 bits).
pub fn commit_operator<B: RegisterBus>(
    bus: &mut B,
    global_op: u8,
    op: &Operator,
    base_freq: f32,
) -> Result<(), B::Error> {
    bus.write(reg::FREQ, freq_to_code(resolve_freq(op.freq, base_freq)))?;
    bus.write(reg::WAVE, (op.wave & 0x7) as u32)?;
    bus.write(reg::ATTACK, (op.ar & 0x3F) as u32)?;
    bus.write(reg::DECAY, (op.dr & 0x3F) as u32)?;
    bus.write(reg::SUSTAIN, (op.sl & 0x1F) as u32)?;
    bus.write(reg::RELEASE, (op.rr & 0x3F) as u32)?;
    bus.write(reg::ATTEN, (op.atten & 0x1FF) as u32)?;
    bus.write(reg::FLAGS, (op.flags & 0x3F) as u32)?;
    bus.write(reg::OP_ADDR, (global_op & 0x7F) as u32)?;
    bus.write(reg::STROBE, 1)
}

/// Commit all eight operators of a voice in index order.
pub fn commit_voice<B: RegisterBus>(
    bus: &mut B,
    voice: u8,
    ops: &Voice,
    base_freq: f32,
) -> Result<(), B::Error> {
    for (i, op) in ops.iter().enumerate() {
        commit_operator(bus, voice * OPS_PER_VOICE as u8 + i as u8, op, base_freq)?;
    }
    Ok(())
}

/// Trigger voices by bit position: bit 0 = voice 0, bit 1 = voice 1.
pub fn gate<B: RegisterBus>(bus: &mut B, word: u16) -> Result<(), B::Error> {
    bus.write(reg::GATE, word as u32)
}

/// The two packed diagnostic status words (registers 14 and 15).
///
/// The attack-rate field straddles the word boundary: its LSB is the top
/// bit of the low word.
#[derive(Copy, Clone, Debug)]
pub struct DiagWords {
    pub lo: u32,
    pub hi: u32,
}

impl DiagWords {
    pub fn read<B: RegisterBus>(bus: &mut B) -> Result<Self, B::Error> {
        let lo = bus.read(reg::DIAG_LO)?;
        let hi = bus.read(reg::DIAG_HI)?;
        Ok(Self { lo, hi })
    }

    /// Frequency code of the currently addressed operator.
    #[inline]
    pub fn freq(&self) -> u32 {
        self.lo & FREQ_MASK
    }

    #[inline]
    pub fn wave(&self) -> u32 {
        (self.lo >> 19) & 0x7
    }

    #[inline]
    pub fn atten(&self) -> u32 {
        (self.lo >> 22) & 0x1FF
    }

    /// Attack rate, reassembled across the word boundary.
    #[inline]
    pub fn ar(&self) -> u32 {
        ((self.hi << 1) | (self.lo >> 31)) & 0x3F
    }

    #[inline]
    pub fn dr(&self) -> u32 {
        (self.hi >> 5) & 0x3F
    }

    #[inline]
    pub fn sl(&self) -> u32 {
        (self.hi >> 11) & 0x1F
    }

    #[inline]
    pub fn rr(&self) -> u32 {
        (self.hi >> 16) & 0x3F
    }

    /// Left-output routing bit.
    #[inline]
    pub fn left(&self) -> u32 {
        (self.hi >> 22) & 0x1
    }

    /// Right-output routing bit.
    #[inline]
    pub fn right(&self) -> u32 {
        (self.hi >> 23) & 0x1
    }

    /// Modulator-enable bit.
    #[inline]
    pub fn mod_en(&self) -> u32 {
        (self.hi >> 24) & 0x1
    }

    /// Accumulator-enable bit.
    #[inline]
    pub fn acc_en(&self) -> u32 {
        (self.hi >> 25) & 0x1
    }

    /// Accumulator-clear bit.
    #[inline]
    pub fn acc_clr(&self) -> u32 {
        (self.hi >> 26) & 0x1
    }

    /// Feedback-enable bit.
    #[inline]
    pub fn fb(&self) -> u32 {
        (self.hi >> 27) & 0x1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBus;
    use crate::synth::flags;

    #[test]
    fn freq_code_matches_phase_increment() {
        // 440 Hz at 48 kHz with a 19-bit accumulator.
        let expected = (524288.0f32 * 440.0 / 48000.0).round() as u32;
        assert_eq!(freq_to_code(440.0), expected);
        assert_eq!(freq_to_code(0.0), 0);
    }

    #[test]
    fn freq_code_wraps_at_sample_rate_multiples() {
        for k in 1..=4 {
            assert_eq!(freq_to_code(SAMPLE_RATE * k as f32), 0, "k = {}", k);
        }
    }

    #[test]
    fn code_roundtrips_through_decode() {
        for code in [0u32, 1, 1234, 4800, FREQ_MASK / 2, FREQ_MASK] {
            assert_eq!(freq_to_code(code_to_freq(code)), code);
        }
    }

    #[test]
    fn resolve_freq_sign_convention() {
        assert_eq!(resolve_freq(440.0, 100.0), 440.0);
        assert_eq!(resolve_freq(-2.0, 100.0), 200.0);
        assert_eq!(resolve_freq(0.0, 100.0), 0.0);
    }

    #[test]
    fn commit_operator_stages_then_strobes() {
        let mut bus = MockBus::new();
        let op = Operator {
            freq: -2.0,
            atten: 40,
            wave: 3,
            ar: 20,
            dr: 21,
            sl: 2,
            rr: 22,
            flags: flags::ACC_CLR | flags::ACC_EN,
        };

        commit_operator(&mut bus, 11, &op, 100.0).unwrap();

        let expected = [
            (reg::FREQ, freq_to_code(200.0)),
            (reg::WAVE, 3),
            (reg::ATTACK, 20),
            (reg::DECAY, 21),
            (reg::SUSTAIN, 2),
            (reg::RELEASE, 22),
            (reg::ATTEN, 40),
            (reg::FLAGS, (flags::ACC_CLR | flags::ACC_EN) as u32),
            (reg::OP_ADDR, 11),
            (reg::STROBE, 1),
        ];
        assert_eq!(bus.writes(), &expected);
    }

    #[test]
    fn commit_voice_walks_all_eight_global_addresses() {
        let mut bus = MockBus::new();
        let synth = crate::synth::FmSynth::new();

        commit_voice(&mut bus, 1, synth.voice(1), 1000.0).unwrap();

        let mut addrs = [0u32; 8];
        let mut n = 0;
        for &(a, v) in bus.writes() {
            if a == reg::OP_ADDR {
                addrs[n] = v;
                n += 1;
            }
        }
        assert_eq!(n, 8);
        assert_eq!(addrs, [8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn diag_words_unpack_documented_layout() {
        // freq = 0x12345, wave = 5, atten = 0x155, ar = 0b101011 (LSB in
        // the top bit of the low word), dr = 0x2A, sl = 0x15, rr = 0x2A,
        // flag bits all set.
        let lo = 0x12345 | (5 << 19) | (0x155 << 22) | (1 << 31);
        let hi = 0b10101 | (0x2A << 5) | (0x15 << 11) | (0x2A << 16) | (0x3F << 22);
        let diag = DiagWords { lo, hi };

        assert_eq!(diag.freq(), 0x12345);
        assert_eq!(diag.wave(), 5);
        assert_eq!(diag.atten(), 0x155);
        assert_eq!(diag.ar(), 0b101011);
        assert_eq!(diag.dr(), 0x2A);
        assert_eq!(diag.sl(), 0x15);
        assert_eq!(diag.rr(), 0x2A);
        assert_eq!(diag.left(), 1);
        assert_eq!(diag.right(), 1);
        assert_eq!(diag.mod_en(), 1);
        assert_eq!(diag.acc_en(), 1);
        assert_eq!(diag.acc_clr(), 1);
        assert_eq!(diag.fb(), 1);
    }
}
