use crate::error::EngineError;
use crate::sequencer::scale::{self, DEFAULT_ROOT};
use crate::sequencer::scheduler::{LookaheadScheduler, SchedulerConfig};
use crate::sequencer::step::{PlaybackMode, SequencerStep};
use crate::synth::chain::DelaySettings;
use crate::synth::params::VoiceParameters;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration, loadable from JSON.
///
/// Every field has a default so a config file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fallback for runtimes that are handed no rate by their host.
    pub sample_rate: u32,
    /// Preferred fixed block size; `None` lets the host decide.
    pub block_size: Option<u32>,
    /// Substring of the preferred output device name.
    pub output_device: Option<String>,
    pub voice: VoiceParameters,
    pub delay: DelaySettings,
    pub master_gain: f32,
    /// FFT window of the analysis tap, rounded up to a power of two.
    pub analysis_size: usize,
    pub scheduler: SchedulerConfig,
    pub sequencer: SequencerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: Some(256),
            output_device: None,
            voice: VoiceParameters::default(),
            delay: DelaySettings::default(),
            master_gain: 0.5,
            analysis_size: 2048,
            scheduler: SchedulerConfig::default(),
            sequencer: SequencerConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| EngineError::read_config(path, e))?;
        Self::from_json(&text)
    }
}

/// Initial pattern and transport settings for the step sequencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub bpm: f32,
    /// Fraction of a quarter note per step (0.25 = sixteenth notes).
    pub step_length: f32,
    pub swing: f32,
    pub loop_length: usize,
    pub mode: PlaybackMode,
    pub root: i32,
    /// Name from the scale table, e.g. "major" or "hirajoshi".
    pub scale: String,
    pub steps: Vec<SequencerStep>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let pitches = [0, 2, 4, 7, 9, 7, 4, 2, 0, 4, 7, 12, 9, 7, 4, 2];
        let steps = pitches
            .iter()
            .enumerate()
            .map(|(i, &pitch)| SequencerStep {
                on: i % 4 != 3,
                pitch,
                velocity: if i % 4 == 0 { 118 } else { 96 },
                ratchet: if i == 14 { 2 } else { 1 },
                ..SequencerStep::default()
            })
            .collect();

        Self {
            bpm: 120.0,
            step_length: 0.25,
            swing: 0.0,
            loop_length: 16,
            mode: PlaybackMode::Forward,
            root: DEFAULT_ROOT,
            scale: "major".to_string(),
            steps,
        }
    }
}

impl SequencerConfig {
    /// Push these settings into a scheduler.
    pub fn apply<R: Rng>(&self, scheduler: &mut LookaheadScheduler<R>) -> Result<(), EngineError> {
        let intervals = scale::scale_intervals(&self.scale)
            .ok_or_else(|| EngineError::UnknownScale(self.scale.clone()))?;
        scheduler.set_steps(self.steps.clone());
        scheduler.set_loop_length(self.loop_length);
        scheduler.set_bpm(self.bpm);
        scheduler.set_step_length(self.step_length);
        scheduler.set_swing(self.swing);
        scheduler.set_mode(self.mode);
        scheduler.set_scale(self.root, intervals.to_vec());
        Ok(())
    }
}
