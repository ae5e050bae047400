use super::params::VoiceParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Stage timings read once per sample from the live parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain: sustain.clamp(0.0, 1.0),
            release,
        }
    }
}

impl From<&VoiceParameters> for Adsr {
    fn from(params: &VoiceParameters) -> Self {
        Adsr::new(
            params.attack_time,
            params.decay_time,
            params.sustain_level,
            params.release_time,
        )
    }
}

/// Sample-stepped ADSR state machine for the single voice.
///
/// Zero-length stages are passed through within the same sample, so a note
/// with no attack and no decay sits at the sustain level on its first sample.
#[derive(Debug, Clone)]
pub struct Envelope {
    stage: EnvelopeStage,
    elapsed: f32,
    level: f32,
    release_start: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// True from trigger until release is requested.
    pub fn is_held(&self) -> bool {
        matches!(
            self.stage,
            EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Sustain
        )
    }

    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    /// Restart from the attack stage, whatever the current stage is.
    pub fn trigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.elapsed = 0.0;
    }

    /// Begin the release ramp from the current level. Has no effect unless the
    /// note is held, so repeated calls never restart an ongoing release.
    pub fn release(&mut self) -> bool {
        if !self.is_held() {
            return false;
        }
        self.stage = EnvelopeStage::Release;
        self.elapsed = 0.0;
        self.release_start = self.level;
        true
    }

    /// Advance by `dt` seconds and return the new level.
    pub fn next(&mut self, dt: f32, adsr: &Adsr) -> f32 {
        self.elapsed += dt;

        // Each pass either settles the level or moves through a zero-length
        // stage; at most four transitions can happen in one sample.
        for _ in 0..4 {
            match self.stage {
                EnvelopeStage::Idle => {
                    self.level = 0.0;
                    break;
                }
                EnvelopeStage::Attack => {
                    if adsr.attack > 0.0 {
                        self.level = (self.elapsed / adsr.attack).min(1.0);
                        if self.elapsed >= adsr.attack {
                            self.stage = EnvelopeStage::Decay;
                            self.elapsed = 0.0;
                        }
                        break;
                    }
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                    self.elapsed = 0.0;
                }
                EnvelopeStage::Decay => {
                    if adsr.decay > 0.0 {
                        let remaining = (1.0 - self.elapsed / adsr.decay).max(0.0);
                        self.level = adsr.sustain + (1.0 - adsr.sustain) * remaining;
                        if self.elapsed >= adsr.decay {
                            self.stage = EnvelopeStage::Sustain;
                            self.level = adsr.sustain;
                        }
                        break;
                    }
                    self.stage = EnvelopeStage::Sustain;
                }
                EnvelopeStage::Sustain => {
                    self.level = adsr.sustain;
                    break;
                }
                EnvelopeStage::Release => {
                    if adsr.release > 0.0 && self.elapsed < adsr.release {
                        self.level = self.release_start * (1.0 - self.elapsed / adsr.release);
                    } else {
                        self.stage = EnvelopeStage::Idle;
                        self.level = 0.0;
                    }
                    break;
                }
            }
        }

        self.level = self.level.max(0.0);
        self.level
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            elapsed: 0.0,
            level: 0.0,
            release_start: 0.0,
        }
    }
}
