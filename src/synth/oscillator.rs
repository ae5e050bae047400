use super::params::{LfoTarget, VoiceParameters};
use super::prelude::TAU;

/// Normalized phase accumulator in `[0, 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phasor {
    phase: f32,
}

impl Phasor {
    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Step by `frequency / sample_rate` cycles.
    #[inline]
    pub fn step(&mut self, frequency: f32, sample_rate: f32) {
        self.advance(frequency / sample_rate);
    }

    #[inline]
    fn advance(&mut self, cycles: f32) {
        let next = (self.phase + cycles).rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs
        self.phase = if next.is_finite() && next < 1.0 { next } else { 0.0 };
    }
}

/// Two-operator FM pair: one modulator feeding the carrier's phase.
#[derive(Debug, Clone, Default)]
pub struct FmPair {
    carrier: Phasor,
    modulator: Phasor,
}

impl FmPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output `sin(2π·carrier + index·sin(2π·modulator))` for the current
    /// phases, then advance both accumulators.
    #[inline]
    pub fn next(&mut self, carrier_hz: f32, mod_ratio: f32, fm_index: f32, sample_rate: f32) -> f32 {
        let modulator = (self.modulator.phase() * TAU).sin();
        let out = (self.carrier.phase() * TAU + fm_index * modulator).sin();

        self.carrier.step(carrier_hz, sample_rate);
        self.modulator.step(carrier_hz * mod_ratio, sample_rate);
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lfo {
    phasor: Phasor,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sine value at the current phase; the phase then advances by
    /// `rate / sample_rate`.
    #[inline]
    pub fn next(&mut self, rate: f32, sample_rate: f32) -> f32 {
        let value = (self.phasor.phase() * TAU).sin();
        self.phasor.step(rate, sample_rate);
        value
    }
}

/// Effective oscillator settings for one sample after the LFO is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulated {
    pub carrier_hz: f32,
    pub mod_ratio: f32,
    pub fm_index: f32,
    pub amplitude: f32,
}

impl Modulated {
    pub fn new(params: &VoiceParameters, lfo: f32) -> Self {
        let depth = params.depth();
        let mut out = Self {
            carrier_hz: params.carrier(),
            mod_ratio: params.ratio(),
            fm_index: params.fm_index,
            amplitude: 1.0,
        };

        match params.lfo_target {
            LfoTarget::Pitch => {
                // ±0.5 semitone at full depth
                out.carrier_hz *= ((lfo * depth * 0.5) / 12.0).exp2();
            }
            LfoTarget::Amplitude => {
                out.amplitude = 1.0 + lfo * depth * 0.3;
            }
            LfoTarget::FmIndex => {
                out.fm_index *= (1.0 + lfo * depth * 1.2).max(0.0);
            }
            LfoTarget::ModRatio => {
                out.mod_ratio = (out.mod_ratio + lfo * depth * 0.8).max(0.25);
            }
            LfoTarget::DelayTime => {}
        }
        out
    }
}
