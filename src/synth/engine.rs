use super::analysis::{analysis_tap, Analyser, TapWriter};
use super::chain::{ChainMessage, DelaySettings, SignalChain};
use super::clock::AudioClock;
use super::event::VoiceMessage;
use super::params::{ParamKey, ParamValue, VoiceParameters};
use super::voice::VoiceEngine;
use crate::config::EngineConfig;
use crate::sequencer::scheduler::NoteSink;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

/// Everything the control side can tell the render side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Voice(VoiceMessage),
    Chain(ChainMessage),
}

/// Build a connected control handle, renderer and analysis reader for the
/// given sample rate.
pub fn build_engine(config: &EngineConfig, sample_rate: u32) -> (EngineHandle, Renderer, Analyser) {
    let clock = AudioClock::new(sample_rate);
    let (tx, rx) = unbounded();
    let (tap, analyser) = analysis_tap(config.analysis_size);

    let voice = VoiceEngine::with_clock(config.voice.clone(), clock.clone());
    let chain = SignalChain::new(sample_rate as f32, config.delay, config.master_gain);

    let handle = EngineHandle { tx, clock };
    let renderer = Renderer {
        voice,
        chain,
        inbox: rx,
        tap,
        left: Vec::new(),
        right: Vec::new(),
    };
    (handle, renderer, analyser)
}

/// Control-side handle. Every call is fire-and-forget: it posts a message
/// that the renderer picks up at the start of its next block.
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<Message>,
    clock: AudioClock,
}

impl EngineHandle {
    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Current audio-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    fn send(&self, message: Message) {
        if self.tx.send(message).is_err() {
            debug!("renderer gone, dropping {:?}", message);
        }
    }

    pub fn trigger_note(&self, freq: f32, velocity: f32) {
        self.send(Message::Voice(VoiceMessage::NoteOn { freq, velocity }));
    }

    pub fn release_note(&self) {
        self.send(Message::Voice(VoiceMessage::NoteOff));
    }

    pub fn set_parameter(&self, key: ParamKey, value: impl Into<ParamValue>) {
        self.send(Message::Voice(VoiceMessage::Set {
            key,
            value: value.into(),
        }));
    }

    /// Set a parameter by wire name. Unknown names are ignored.
    pub fn set_named_parameter(&self, name: &str, value: impl Into<ParamValue>) {
        match ParamKey::parse(name) {
            Some(key) => self.set_parameter(key, value),
            None => debug!("ignoring unknown parameter '{}'", name),
        }
    }

    pub fn schedule_note_at(&self, freq: f32, velocity: f32, time: f64, length: f64) {
        self.send(Message::Voice(VoiceMessage::NoteAt {
            freq,
            velocity,
            time,
            length,
        }));
    }

    pub fn schedule_parameter_at(&self, key: ParamKey, value: impl Into<ParamValue>, time: f64) {
        self.send(Message::Voice(VoiceMessage::ParamAt {
            key,
            value: value.into(),
            time,
        }));
    }

    pub fn set_delay(&self, time_ms: f32, feedback: f32, wet: f32) {
        let requested = DelaySettings {
            time_ms,
            feedback,
            wet,
        };
        let settings = requested.sanitized();
        if settings.feedback < requested.feedback {
            warn!(
                "delay feedback limited to {} (requested {})",
                settings.feedback, requested.feedback
            );
        }
        self.send(Message::Chain(ChainMessage::Delay(settings)));
    }

    pub fn set_master_gain(&self, gain: f32) {
        self.send(Message::Chain(ChainMessage::MasterGain(gain)));
    }

    /// Apply a whole parameter set, one message per field.
    pub fn load_parameters(&self, params: &VoiceParameters) {
        for key in [
            ParamKey::CarrierHz,
            ParamKey::ModRatio,
            ParamKey::FmIndex,
            ParamKey::AttackTime,
            ParamKey::DecayTime,
            ParamKey::SustainLevel,
            ParamKey::ReleaseTime,
            ParamKey::LfoRate,
            ParamKey::LfoDepth,
            ParamKey::LfoTarget,
        ] {
            self.set_parameter(key, params.get(key));
        }
    }
}

impl NoteSink for EngineHandle {
    fn note_on_at(&mut self, freq: f32, velocity: f32, time: f64, length: f64) {
        self.schedule_note_at(freq, velocity, time, length);
    }

    fn param_at(&mut self, key: ParamKey, value: ParamValue, time: f64) {
        self.schedule_parameter_at(key, value, time);
    }
}

/// Render-side owner of the voice, signal chain and analysis writer.
///
/// Lives inside the host audio callback; it is never shared, so no locking
/// is involved. Messages are drained at the start of every block.
pub struct Renderer {
    voice: VoiceEngine,
    chain: SignalChain,
    inbox: Receiver<Message>,
    tap: TapWriter,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Renderer {
    pub fn voice(&self) -> &VoiceEngine {
        &self.voice
    }

    pub fn chain(&self) -> &SignalChain {
        &self.chain
    }

    /// Apply every message posted since the last block.
    pub fn drain_inbox(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            match message {
                Message::Voice(m) => self.voice.handle_message(m),
                Message::Chain(m) => self.chain.handle_message(m),
            }
        }
    }

    /// Render one stereo block in place. Both slices should have the same
    /// length; extra samples in the longer one are zeroed.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.drain_inbox();
        self.voice.render_stereo(left, right);
        self.chain.process(left, right);
        self.tap.push_stereo(left, right);
    }

    /// Render into an interleaved device buffer with `channels` channels.
    /// The first two channels get left and right (a mono device gets left);
    /// any further channels get the mono mix.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = data.len() / channels;
        if self.left.len() != frames {
            // only reallocates when the host changes its block size
            self.left.resize(frames, 0.0);
            self.right.resize(frames, 0.0);
        }

        let mut left = std::mem::take(&mut self.left);
        let mut right = std::mem::take(&mut self.right);
        self.render(&mut left, &mut right);

        for (i, frame) in data.chunks_mut(channels).enumerate() {
            let (l, r) = match (left.get(i), right.get(i)) {
                (Some(&l), Some(&r)) => (l, r),
                _ => (0.0, 0.0),
            };
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample = match c {
                    0 => l,
                    1 => r,
                    _ => (l + r) * 0.5,
                };
            }
        }
        self.left = left;
        self.right = right;
    }
}
