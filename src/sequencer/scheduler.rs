//! Lookahead step scheduler.
//!
//! Runs in the control context. Each `poll` looks a short window ahead of the
//! audio clock and hands every step that starts inside that window to a
//! [`NoteSink`] with its exact audio-clock timestamp. The renderer then plays
//! the notes at the right sample no matter how late the poll itself ran, as
//! long as it ran before the window closed.

use super::notify::{AccentNotice, Notice, NoteNotice, NotificationBus};
use super::scale::{midi_to_freq, quantize_pitch, DEFAULT_ROOT, MAJOR};
use super::step::{PlaybackMode, SequencerStep};
use crate::synth::note::NoteSource;
use crate::synth::params::{ParamKey, ParamValue};
use crate::synth::prelude::random_seed;
use crate::synth::voice::VoiceEngine;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const MIN_BPM: f32 = 20.0;
pub const MAX_BPM: f32 = 320.0;
pub const MIN_STEP_LENGTH: f32 = 1.0 / 16.0;
pub const MAX_STEP_LENGTH: f32 = 1.0;
pub const MAX_SWING: f32 = 0.6;
// Shortest step a swung pair may produce, in seconds.
const MIN_SWUNG_STEP: f64 = 0.01;

/// Receiver of timestamped events.
pub trait NoteSink {
    fn note_on_at(&mut self, freq: f32, velocity: f32, time: f64, length: f64);

    fn param_at(&mut self, _key: ParamKey, _value: ParamValue, _time: f64) {}
}

impl NoteSink for VoiceEngine {
    fn note_on_at(&mut self, freq: f32, velocity: f32, time: f64, length: f64) {
        self.schedule_note_at(freq, velocity, time, length);
    }

    fn param_at(&mut self, key: ParamKey, value: ParamValue, time: f64) {
        self.schedule_parameter_at(key, value, time);
    }
}

/// Timing windows, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How often the control loop polls.
    pub lookahead_secs: f64,
    /// How far past "now" each poll schedules.
    pub schedule_ahead_secs: f64,
    /// Delay between `start` and the first step.
    pub start_offset_secs: f64,
    /// Floor for a step's gate so very short gates stay audible.
    pub min_gate_secs: f64,
    /// Share of each ratchet slice the note is held.
    pub duty_cycle: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead_secs: 0.025,
            schedule_ahead_secs: 0.12,
            start_offset_secs: 0.08,
            min_gate_secs: 0.03,
            duty_cycle: 0.95,
        }
    }
}

impl SchedulerConfig {
    pub fn lookahead(&self) -> Duration {
        Duration::from_secs_f64(self.lookahead_secs.max(0.001))
    }
}

/// Playback position, owned by the scheduler and reset on every start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerClock {
    pub pointer: usize,
    pub direction: i32,
    pub next_event_time: f64,
    pub step_counter: u64,
}

impl Default for SchedulerClock {
    fn default() -> Self {
        Self {
            pointer: 0,
            direction: 1,
            next_event_time: 0.0,
            step_counter: 0,
        }
    }
}

/// Counters for what the scheduler did and silently skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub steps_visited: u64,
    pub steps_played: u64,
    pub skipped_by_probability: u64,
    pub notes_emitted: u64,
    /// Steps passed over because a poll came after their start time.
    pub steps_missed: u64,
}

pub struct LookaheadScheduler<R: Rng = SmallRng> {
    config: SchedulerConfig,
    steps: Vec<SequencerStep>,
    bpm: f32,
    step_length: f32,
    swing: f32,
    loop_length: usize,
    mode: PlaybackMode,
    root: i32,
    scale: Vec<i32>,
    clock: SchedulerClock,
    playing: bool,
    rng: R,
    bus: NotificationBus,
    pending_params: Vec<(ParamKey, ParamValue)>,
    stats: SchedulerStats,
}

impl LookaheadScheduler<SmallRng> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(random_seed()))
    }
}

impl<R: Rng> LookaheadScheduler<R> {
    pub fn with_rng(config: SchedulerConfig, rng: R) -> Self {
        Self {
            config,
            steps: Vec::new(),
            bpm: 120.0,
            step_length: 0.25,
            swing: 0.0,
            loop_length: 16,
            mode: PlaybackMode::Forward,
            root: DEFAULT_ROOT,
            scale: MAJOR.to_vec(),
            clock: SchedulerClock::default(),
            playing: false,
            rng,
            bus: NotificationBus::new(),
            pending_params: Vec::new(),
            stats: SchedulerStats::default(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn steps(&self) -> &[SequencerStep] {
        &self.steps
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn step_length(&self) -> f32 {
        self.step_length
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    pub fn loop_length(&self) -> usize {
        self.loop_length
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn clock(&self) -> &SchedulerClock {
        &self.clock
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn bus(&mut self) -> &mut NotificationBus {
        &mut self.bus
    }

    /// Replace the pattern. A loop shorter than the new pattern is kept;
    /// coming from an empty pattern, the loop spans the whole new one.
    pub fn set_steps(&mut self, steps: Vec<SequencerStep>) {
        let was_empty = self.steps.is_empty() || self.loop_length == 0;
        self.steps = steps;
        self.loop_length = if was_empty {
            self.steps.len()
        } else {
            self.loop_length.min(self.steps.len())
        };
        if self.loop_length > 0 {
            self.clock.pointer %= self.loop_length;
        } else {
            self.clock.pointer = 0;
        }
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        if !bpm.is_nan() {
            self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        }
    }

    /// Step length as a fraction of a quarter note.
    pub fn set_step_length(&mut self, length: f32) {
        if !length.is_nan() {
            self.step_length = length.clamp(MIN_STEP_LENGTH, MAX_STEP_LENGTH);
        }
    }

    pub fn set_swing(&mut self, amount: f32) {
        if !amount.is_nan() {
            self.swing = amount.clamp(0.0, MAX_SWING);
        }
    }

    pub fn set_loop_length(&mut self, length: usize) {
        self.loop_length = length.min(self.steps.len()).max(1);
        self.clock.pointer %= self.loop_length;
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn set_scale(&mut self, root: i32, intervals: Vec<i32>) {
        self.root = root;
        self.scale = intervals;
    }

    /// Send a parameter change timed to the next step boundary.
    pub fn queue_parameter(&mut self, key: ParamKey, value: impl Into<ParamValue>) {
        self.pending_params.push((key, value.into()));
    }

    /// Begin playback with the first step shortly after `now`.
    /// Does nothing if already playing or the pattern is empty.
    pub fn start(&mut self, now: f64) -> bool {
        if self.playing || self.steps.is_empty() {
            return false;
        }
        self.playing = true;
        self.clock = SchedulerClock {
            next_event_time: now + self.config.start_offset_secs,
            ..SchedulerClock::default()
        };
        info!(bpm = self.bpm, steps = self.steps.len(), "sequencer started");
        true
    }

    /// Halt scheduling and drop notices not yet delivered. Notes already
    /// handed to the sink are left to play out.
    pub fn stop(&mut self) {
        if self.playing {
            info!("sequencer stopped");
        }
        self.playing = false;
        self.bus.cancel_pending();
    }

    /// Base duration of one step in seconds.
    pub fn step_duration(&self) -> f64 {
        (60.0 / self.bpm as f64) * self.step_length as f64
    }

    /// One tick of the control loop. Schedules every step that starts before
    /// `now + schedule_ahead` and returns how many steps were visited.
    pub fn poll<S: NoteSink + ?Sized>(&mut self, now: f64, sink: &mut S) -> usize {
        self.bus.dispatch_due(now);
        if !self.playing || !now.is_finite() {
            return 0;
        }

        // Steps whose start has already passed are skipped, never played late.
        while self.clock.next_event_time < now {
            self.advance();
            self.stats.steps_missed += 1;
        }

        let horizon = now + self.config.schedule_ahead_secs;
        let mut visited = 0;
        while self.clock.next_event_time < horizon {
            let time = self.clock.next_event_time;
            if !self.steps.is_empty() {
                let index = self.clock.pointer % self.steps.len();
                self.flush_params(time, sink);
                self.schedule_step(index, time, sink);
            }
            self.advance();
            visited += 1;
        }
        visited
    }

    fn flush_params<S: NoteSink + ?Sized>(&mut self, time: f64, sink: &mut S) {
        for (key, value) in self.pending_params.drain(..) {
            sink.param_at(key, value, time);
        }
    }

    fn schedule_step<S: NoteSink + ?Sized>(&mut self, index: usize, time: f64, sink: &mut S) {
        let step = self.steps[index];
        self.stats.steps_visited += 1;
        let sounds = step.on && self.passes_probability(&step);
        self.bus.defer(Notice::Accent(AccentNotice {
            time,
            step: index,
            on: sounds,
        }));
        if !sounds {
            return;
        }

        let midi = quantize_pitch(self.root, step.pitch, &self.scale);
        let freq = midi_to_freq(midi);
        let velocity = step.velocity_scale();
        let gate = (self.step_duration() * step.gate_fraction() as f64).max(self.config.min_gate_secs);
        let ratchet = step.ratchet_count();
        let slice = gate / ratchet as f64;
        let length = slice * self.config.duty_cycle;

        for i in 0..ratchet {
            let event_time = time + i as f64 * slice;
            sink.note_on_at(freq, velocity, event_time, length);
            self.bus.defer(Notice::Note(NoteNotice {
                time: event_time,
                midi,
                velocity,
                source: NoteSource::Sequencer,
            }));
        }
        self.stats.steps_played += 1;
        self.stats.notes_emitted += ratchet as u64;
        debug!(step = index, midi, time, ratchet, "scheduled step");
    }

    fn passes_probability(&mut self, step: &SequencerStep) -> bool {
        let probability = if step.probability.is_nan() {
            0.0
        } else {
            step.probability.clamp(0.0, 1.0)
        };
        if probability < 1.0 && self.rng.random::<f32>() > probability {
            self.stats.skipped_by_probability += 1;
            return false;
        }
        true
    }

    fn advance(&mut self) {
        let base = self.step_duration();
        let mut duration = base;
        if self.swing > 0.0 {
            let swing = base * self.swing as f64;
            if self.clock.step_counter % 2 == 0 {
                duration = (duration - swing).max(MIN_SWUNG_STEP);
            } else {
                duration += swing;
            }
        }
        self.clock.next_event_time += duration;
        self.clock.step_counter += 1;

        let len = self.loop_length;
        if len == 0 {
            self.clock.pointer = 0;
            return;
        }
        self.clock.pointer = match self.mode {
            PlaybackMode::Forward => (self.clock.pointer + 1) % len,
            PlaybackMode::PingPong => self.bounce(len),
            PlaybackMode::Random => self.rng.random_range(0..len),
        };
    }

    fn bounce(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let next = self.clock.pointer as i64 + self.clock.direction as i64;
        if next >= len as i64 {
            self.clock.direction = -1;
            len - 2
        } else if next < 0 {
            self.clock.direction = 1;
            1
        } else {
            next as usize
        }
    }
}
