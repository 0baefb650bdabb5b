// SPDX-License-Identifier: MIT

//! In-memory voice/patch model for the 8-operator FM synth.
//!
//! Two voices of eight operators each, mirrored into the FPGA's
//! per-operator register file through [`crate::protocol`]. The model is a
//! single-owner object: the main loop owns it and lends it to the command
//! interpreter by `&mut`.

use crate::protocol::{self, RegisterBus};

/// Operators per voice, fixed by the FPGA design.
pub const OPS_PER_VOICE: usize = 8;

/// Number of voices implemented by the FPGA.
pub const NUM_VOICES: usize = 2;

/// Operator routing/flag bits (FLAGS register layout).
pub mod flags {
    /// Feedback enable.
    pub const FB_EN: u8 = 1 << 0;
    /// Clear the mix accumulator before adding.
    pub const ACC_CLR: u8 = 1 << 1;
    /// Add this operator into the mix accumulator.
    pub const ACC_EN: u8 = 1 << 2;
    /// Use the previous operator as phase modulator.
    pub const MOD_EN: u8 = 1 << 3;
    /// Route to the left output.
    pub const LEFT: u8 = 1 << 4;
    /// Route to the right output.
    pub const RIGHT: u8 = 1 << 5;
}

/// One FM operator's parameter set.
///
/// `freq` follows the sign convention of the wire protocol: a non-negative
/// value is an absolute frequency in Hz, a negative value is a ratio to the
/// voice's base frequency (`-2.0` = twice the base).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Operator {
    pub freq: f32,
    /// Attenuation, 0..=511.
    pub atten: u16,
    /// Waveform select, 0..=7.
    pub wave: u8,
    /// Envelope attack rate, 0..=63.
    pub ar: u8,
    /// Envelope decay rate, 0..=63.
    pub dr: u8,
    /// Envelope sustain level, 0..=31.
    pub sl: u8,
    /// Envelope release rate, 0..=63.
    pub rr: u8,
    /// Routing flags, see [`flags`].
    pub flags: u8,
}

impl Operator {
    const fn patch(freq: f32, atten: u16, flags: u8) -> Self {
        Self {
            freq,
            atten,
            wave: 0,
            ar: 20,
            dr: 20,
            sl: 2,
            rr: 20,
            flags,
        }
    }
}

/// A complete 8-operator voice.
pub type Voice = [Operator; OPS_PER_VOICE];

/// Built-in startup patch: four carrier/modulator pairs at harmonic
/// ratios, panned to one side.
const fn default_voice(pan: u8) -> Voice {
    [
        Operator::patch(-2.0, 40, flags::ACC_CLR | flags::ACC_EN),
        Operator::patch(-1.0, 0, pan | flags::MOD_EN),
        Operator::patch(-4.0, 40, flags::ACC_CLR | flags::ACC_EN),
        Operator::patch(-2.0, 2, pan | flags::MOD_EN),
        Operator::patch(-6.0, 40, flags::ACC_CLR | flags::ACC_EN),
        Operator::patch(-3.0, 4, pan | flags::MOD_EN),
        Operator::patch(-8.0, 40, flags::ACC_CLR | flags::ACC_EN),
        Operator::patch(-4.0, 6, pan | flags::MOD_EN),
    ]
}

/// Startup base frequencies for the two voices, in Hz.
pub const DEFAULT_BASE_FREQ: [f32; NUM_VOICES] = [100.0, 1000.0];

/// The two-voice patch state plus the base frequency each voice was last
/// committed at. The base frequency is what resolves ratio-mode operator
/// frequencies when a single operator is re-committed.
pub struct FmSynth {
    voices: [Voice; NUM_VOICES],
    base_freq: [f32; NUM_VOICES],
}

impl FmSynth {
    /// Model initialized with the built-in default patches, voice 0 panned
    /// left and voice 1 panned right.
    pub const fn new() -> Self {
        Self {
            voices: [default_voice(flags::LEFT), default_voice(flags::RIGHT)],
            base_freq: DEFAULT_BASE_FREQ,
        }
    }

    #[inline]
    pub fn voice(&self, voice: usize) -> &Voice {
        &self.voices[voice]
    }

    #[inline]
    pub fn base_freq(&self, voice: usize) -> f32 {
        self.base_freq[voice]
    }

    /// Set an operator's frequency field. In-memory only; the new value
    /// takes effect on the next commit of that operator or voice.
    pub fn set_op_freq(&mut self, voice: usize, op: usize, freq: f32) {
        self.voices[voice][op].freq = freq;
    }

    pub fn set_op_atten(&mut self, voice: usize, op: usize, atten: u16) {
        self.voices[voice][op].atten = atten;
    }

    pub fn set_op_wave(&mut self, voice: usize, op: usize, wave: u8) {
        self.voices[voice][op].wave = wave;
    }

    /// Push one operator of one voice to the hardware at the voice's
    /// current base frequency.
    pub fn commit_op<B: RegisterBus>(
        &self,
        bus: &mut B,
        voice: usize,
        op: usize,
    ) -> Result<(), B::Error> {
        protocol::commit_operator(
            bus,
            (voice * OPS_PER_VOICE + op) as u8,
            &self.voices[voice][op],
            self.base_freq[voice],
        )
    }

    /// Record a new base frequency for a voice and push its whole patch.
    pub fn commit_voice<B: RegisterBus>(
        &mut self,
        bus: &mut B,
        voice: usize,
        base_freq: f32,
    ) -> Result<(), B::Error> {
        self.base_freq[voice] = base_freq;
        protocol::commit_voice(bus, voice as u8, &self.voices[voice], base_freq)
    }

    /// Push both voices at their recorded base frequencies. Used once at
    /// startup after the FPGA comes up.
    pub fn commit_all<B: RegisterBus>(&mut self, bus: &mut B) -> Result<(), B::Error> {
        for v in 0..NUM_VOICES {
            protocol::commit_voice(bus, v as u8, &self.voices[v], self.base_freq[v])?;
        }
        Ok(())
    }
}

impl Default for FmSynth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patch_shape() {
        let synth = FmSynth::new();

        // Even operators are carriers into the accumulator, odd operators
        // are panned modulator outputs.
        for v in 0..NUM_VOICES {
            for (i, op) in synth.voice(v).iter().enumerate() {
                if i % 2 == 0 {
                    assert_eq!(op.flags, flags::ACC_CLR | flags::ACC_EN);
                } else {
                    let pan = if v == 0 { flags::LEFT } else { flags::RIGHT };
                    assert_eq!(op.flags, pan | flags::MOD_EN);
                }
                assert!(op.freq < 0.0, "default patch is all ratio-mode");
            }
        }
        assert_eq!(synth.base_freq(0), 100.0);
        assert_eq!(synth.base_freq(1), 1000.0);
    }

    #[test]
    fn field_mutators_touch_only_their_field() {
        let mut synth = FmSynth::new();
        let before = synth.voice(0)[3];

        synth.set_op_atten(0, 3, 123);
        let after = synth.voice(0)[3];
        assert_eq!(after.atten, 123);
        assert_eq!(after.freq, before.freq);
        assert_eq!(after.wave, before.wave);
        assert_eq!(after.flags, before.flags);

        synth.set_op_wave(0, 3, 5);
        assert_eq!(synth.voice(0)[3].wave, 5);
        assert_eq!(synth.voice(0)[3].atten, 123);

        synth.set_op_freq(0, 3, 440.0);
        assert_eq!(synth.voice(0)[3].freq, 440.0);
    }
}
