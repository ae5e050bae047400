use serde::{Deserialize, Serialize};

/// One cell of the step pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerStep {
    pub on: bool,
    /// Semitone offset from the root, before scale quantization.
    pub pitch: i32,
    /// MIDI-style velocity, 1-127.
    pub velocity: u8,
    /// Fraction of the step duration the note is held.
    pub gate: f32,
    pub probability: f32,
    /// Repeats inside the gate, 1-4.
    pub ratchet: u8,
}

impl Default for SequencerStep {
    fn default() -> Self {
        Self {
            on: false,
            pitch: 0,
            velocity: 100,
            gate: 0.5,
            probability: 1.0,
            ratchet: 1,
        }
    }
}

impl SequencerStep {
    pub fn velocity_scale(&self) -> f32 {
        self.velocity.clamp(1, 127) as f32 / 127.0
    }

    pub fn ratchet_count(&self) -> usize {
        self.ratchet.clamp(1, 4) as usize
    }

    pub fn gate_fraction(&self) -> f32 {
        if self.gate.is_finite() {
            self.gate.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    #[default]
    Forward,
    PingPong,
    Random,
}

impl PlaybackMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "forward" => Some(PlaybackMode::Forward),
            "pingpong" => Some(PlaybackMode::PingPong),
            "random" => Some(PlaybackMode::Random),
            _ => None,
        }
    }
}
