use serde::{Deserialize, Serialize};

/// Which voice parameter the LFO perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LfoTarget {
    Pitch,
    #[serde(alias = "amp")]
    Amplitude,
    FmIndex,
    ModRatio,
    /// Accepted for compatibility; has no effect.
    DelayTime,
}

impl LfoTarget {
    pub const ALL: [LfoTarget; 5] = [
        LfoTarget::Pitch,
        LfoTarget::Amplitude,
        LfoTarget::FmIndex,
        LfoTarget::ModRatio,
        LfoTarget::DelayTime,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "pitch" => Some(LfoTarget::Pitch),
            "amp" | "amplitude" => Some(LfoTarget::Amplitude),
            "fmIndex" => Some(LfoTarget::FmIndex),
            "modRatio" => Some(LfoTarget::ModRatio),
            "delayTime" => Some(LfoTarget::DelayTime),
            _ => None,
        }
    }

    /// Numeric selector as sent by knob-style controls (0 = pitch).
    pub fn from_index(index: f32) -> Option<Self> {
        if !index.is_finite() || index < 0.0 {
            return None;
        }
        Self::ALL.get(index.round() as usize).copied()
    }
}

/// Closed set of voice parameter identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKey {
    CarrierHz,
    ModRatio,
    FmIndex,
    AttackTime,
    DecayTime,
    SustainLevel,
    ReleaseTime,
    LfoRate,
    LfoDepth,
    LfoTarget,
}

impl ParamKey {
    /// Parse the wire name of a parameter. Unknown names yield `None` and are
    /// ignored by callers.
    pub fn parse(name: &str) -> Option<Self> {
        let key = match name {
            "carrierHz" => ParamKey::CarrierHz,
            "modRatio" => ParamKey::ModRatio,
            "fmIndex" => ParamKey::FmIndex,
            "attackTime" => ParamKey::AttackTime,
            "decayTime" => ParamKey::DecayTime,
            "sustainLevel" => ParamKey::SustainLevel,
            "releaseTime" => ParamKey::ReleaseTime,
            "lfoRate" => ParamKey::LfoRate,
            "lfoDepth" => ParamKey::LfoDepth,
            "lfoTarget" => ParamKey::LfoTarget,
            _ => return None,
        };
        Some(key)
    }
}

/// A value carried by a parameter change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Target(LfoTarget),
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Number(value)
    }
}

impl From<LfoTarget> for ParamValue {
    fn from(target: LfoTarget) -> Self {
        ParamValue::Target(target)
    }
}

/// The hot-swappable parameter set of the voice.
///
/// Setters store raw numbers; range limits are applied where the values are
/// consumed (see the accessor methods), so a bad value never stops the voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VoiceParameters {
    pub carrier_hz: f32,
    pub mod_ratio: f32,
    pub fm_index: f32,
    pub attack_time: f32,
    pub decay_time: f32,
    pub sustain_level: f32,
    pub release_time: f32,
    pub lfo_rate: f32,
    pub lfo_depth: f32,
    pub lfo_target: LfoTarget,
}

impl Default for VoiceParameters {
    fn default() -> Self {
        Self {
            carrier_hz: 220.0,
            mod_ratio: 2.0,
            fm_index: 60.0,
            attack_time: 0.02,
            decay_time: 0.12,
            sustain_level: 0.6,
            release_time: 0.2,
            lfo_rate: 5.0,
            lfo_depth: 0.25,
            lfo_target: LfoTarget::Pitch,
        }
    }
}

impl VoiceParameters {
    /// Overwrite one field. Returns `false` when the value was rejected
    /// (non-finite number, or a value of the wrong kind for the key).
    pub fn set(&mut self, key: ParamKey, value: ParamValue) -> bool {
        let number = match (key, value) {
            (ParamKey::LfoTarget, ParamValue::Target(target)) => {
                self.lfo_target = target;
                return true;
            }
            (ParamKey::LfoTarget, ParamValue::Number(index)) => {
                return match LfoTarget::from_index(index) {
                    Some(target) => {
                        self.lfo_target = target;
                        true
                    }
                    None => false,
                };
            }
            (_, ParamValue::Target(_)) => return false,
            (_, ParamValue::Number(n)) if !n.is_finite() => return false,
            (_, ParamValue::Number(n)) => n,
        };

        let field = match key {
            ParamKey::CarrierHz => &mut self.carrier_hz,
            ParamKey::ModRatio => &mut self.mod_ratio,
            ParamKey::FmIndex => &mut self.fm_index,
            ParamKey::AttackTime => &mut self.attack_time,
            ParamKey::DecayTime => &mut self.decay_time,
            ParamKey::SustainLevel => &mut self.sustain_level,
            ParamKey::ReleaseTime => &mut self.release_time,
            ParamKey::LfoRate => &mut self.lfo_rate,
            ParamKey::LfoDepth => &mut self.lfo_depth,
            ParamKey::LfoTarget => return false,
        };
        *field = number;
        true
    }

    /// Set by wire name; unknown names are ignored.
    pub fn set_named(&mut self, name: &str, value: ParamValue) -> bool {
        match ParamKey::parse(name) {
            Some(key) => self.set(key, value),
            None => false,
        }
    }

    pub fn get(&self, key: ParamKey) -> ParamValue {
        let number = match key {
            ParamKey::CarrierHz => self.carrier_hz,
            ParamKey::ModRatio => self.mod_ratio,
            ParamKey::FmIndex => self.fm_index,
            ParamKey::AttackTime => self.attack_time,
            ParamKey::DecayTime => self.decay_time,
            ParamKey::SustainLevel => self.sustain_level,
            ParamKey::ReleaseTime => self.release_time,
            ParamKey::LfoRate => self.lfo_rate,
            ParamKey::LfoDepth => self.lfo_depth,
            ParamKey::LfoTarget => return ParamValue::Target(self.lfo_target),
        };
        ParamValue::Number(number)
    }

    pub fn sustain(&self) -> f32 {
        self.sustain_level.clamp(0.0, 1.0)
    }

    pub fn depth(&self) -> f32 {
        self.lfo_depth.clamp(0.0, 1.0)
    }

    pub fn carrier(&self) -> f32 {
        self.carrier_hz.max(0.0)
    }

    pub fn ratio(&self) -> f32 {
        self.mod_ratio.max(0.0)
    }
}
