use super::clock::AudioClock;
use super::envelope::{Adsr, Envelope};
use super::event::{EventQueue, ScheduledEvent, VoiceMessage, DUE_EPSILON};
use super::oscillator::{FmPair, Lfo, Modulated};
use super::params::{ParamKey, ParamValue, VoiceParameters};

/// Fixed output scaling that leaves room for the delay feedback downstream.
pub const HEADROOM_GAIN: f32 = 0.3;

// Scratch capacity reserved up front so ordinary blocks never reallocate.
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
enum Trigger {
    On { offset: usize, freq: f32, velocity: f32 },
    Off { offset: usize },
}

impl Trigger {
    fn offset(&self) -> usize {
        match *self {
            Trigger::On { offset, .. } | Trigger::Off { offset } => offset,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Automation {
    offset: usize,
    key: ParamKey,
    value: ParamValue,
}

/// The monophonic FM voice together with its queue of timed events.
///
/// `render_block` is called once per host block. Events due inside the block
/// are applied at their exact sample offset; everything later stays queued.
pub struct VoiceEngine {
    params: VoiceParameters,
    envelope: Envelope,
    fm: FmPair,
    lfo: Lfo,
    velocity: f32,
    sample_rate: f32,
    clock: AudioClock,
    queue: EventQueue,
    due: Vec<ScheduledEvent>,
    triggers: Vec<Trigger>,
    automation: Vec<Automation>,
}

impl VoiceEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_clock(VoiceParameters::default(), AudioClock::new(sample_rate))
    }

    pub fn with_clock(params: VoiceParameters, clock: AudioClock) -> Self {
        Self {
            params,
            envelope: Envelope::new(),
            fm: FmPair::new(),
            lfo: Lfo::new(),
            velocity: 1.0,
            sample_rate: clock.sample_rate() as f32,
            clock,
            queue: EventQueue::with_capacity(EVENT_CAPACITY),
            due: Vec::with_capacity(EVENT_CAPACITY),
            triggers: Vec::with_capacity(EVENT_CAPACITY),
            automation: Vec::with_capacity(EVENT_CAPACITY),
        }
    }

    pub fn params(&self) -> &VoiceParameters {
        &self.params
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of events still waiting for a future block.
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Start a note now. Always succeeds; velocity is clamped to `[0, 1]`.
    pub fn trigger_note(&mut self, freq: f32, velocity: f32) {
        if freq.is_finite() {
            self.params.carrier_hz = freq;
        }
        self.velocity = if velocity.is_nan() {
            0.0
        } else {
            velocity.clamp(0.0, 1.0)
        };
        self.envelope.trigger();
    }

    /// Release the sounding note, if any.
    pub fn release_note(&mut self) {
        self.envelope.release();
    }

    /// Overwrite a parameter immediately. Rejected values are ignored.
    pub fn set_parameter(&mut self, key: ParamKey, value: ParamValue) {
        self.params.set(key, value);
    }

    pub fn schedule_note_at(&mut self, freq: f32, velocity: f32, time: f64, length: f64) {
        self.queue.push(ScheduledEvent::Note {
            time,
            freq,
            velocity,
            length,
        });
    }

    pub fn schedule_parameter_at(&mut self, key: ParamKey, value: ParamValue, time: f64) {
        self.queue.push(ScheduledEvent::Param { time, key, value });
    }

    pub fn handle_message(&mut self, message: VoiceMessage) {
        match message {
            VoiceMessage::NoteOn { freq, velocity } => self.trigger_note(freq, velocity),
            VoiceMessage::NoteOff => self.release_note(),
            VoiceMessage::Set { key, value } => self.set_parameter(key, value),
            VoiceMessage::NoteAt {
                freq,
                velocity,
                time,
                length,
            } => self.schedule_note_at(freq, velocity, time, length),
            VoiceMessage::ParamAt { key, value, time } => {
                self.schedule_parameter_at(key, value, time)
            }
        }
    }

    /// Render one block (`output.len()` frames) and advance the audio clock.
    pub fn render_block(&mut self, output: &mut [f32]) {
        let frames = output.len();
        if frames == 0 {
            return;
        }

        let block_start = self.clock.now();
        let block_end = block_start + frames as f64 / self.sample_rate as f64;
        self.collect_due(block_start, block_end, frames);

        let dt = 1.0 / self.sample_rate;
        let mut next_trigger = 0;
        let mut next_automation = 0;

        for (i, sample) in output.iter_mut().enumerate() {
            while let Some(&trigger) = self.triggers.get(next_trigger) {
                if trigger.offset() != i {
                    break;
                }
                match trigger {
                    Trigger::On { freq, velocity, .. } => self.trigger_note(freq, velocity),
                    Trigger::Off { .. } => self.release_note(),
                }
                next_trigger += 1;
            }

            while let Some(&change) = self.automation.get(next_automation) {
                if change.offset != i {
                    break;
                }
                self.params.set(change.key, change.value);
                next_automation += 1;
            }

            *sample = self.next_sample(dt);
        }

        self.clock.advance(frames);
    }

    /// Render into two channels carrying the same signal.
    pub fn render_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.render_block(left);
        let n = left.len().min(right.len());
        right[..n].copy_from_slice(&left[..n]);
        right[n..].fill(0.0);
    }

    /// Split due events into offset-sorted trigger and automation lists.
    /// Anything that lands on or past the block end is pushed back.
    fn collect_due(&mut self, block_start: f64, block_end: f64, frames: usize) {
        self.due.clear();
        self.triggers.clear();
        self.automation.clear();
        self.queue.drain_due(block_end + DUE_EPSILON, &mut self.due);

        let sample_rate = self.sample_rate as f64;
        for event in self.due.drain(..) {
            let Some(offset) = block_offset(event.time(), block_start, sample_rate, frames) else {
                self.queue.push(event);
                continue;
            };

            match event {
                ScheduledEvent::Note {
                    time,
                    freq,
                    velocity,
                    length,
                } => {
                    insert_trigger(
                        &mut self.triggers,
                        Trigger::On {
                            offset,
                            freq,
                            velocity,
                        },
                    );
                    let off_time = time + length.max(0.0);
                    match block_offset(off_time, block_start, sample_rate, frames) {
                        Some(off) => insert_trigger(&mut self.triggers, Trigger::Off { offset: off }),
                        None => {
                            self.queue.push(ScheduledEvent::NoteOff { time: off_time });
                        }
                    }
                }
                ScheduledEvent::NoteOff { .. } => {
                    insert_trigger(&mut self.triggers, Trigger::Off { offset });
                }
                ScheduledEvent::Param { key, value, .. } => {
                    let index = self.automation.partition_point(|a| a.offset <= offset);
                    self.automation.insert(index, Automation { offset, key, value });
                }
            }
        }
    }

    #[inline]
    fn next_sample(&mut self, dt: f32) -> f32 {
        let adsr = Adsr::from(&self.params);
        let level = self.envelope.next(dt, &adsr);
        let lfo = self.lfo.next(self.params.lfo_rate, self.sample_rate);
        let m = Modulated::new(&self.params, lfo);
        let carrier = self
            .fm
            .next(m.carrier_hz, m.mod_ratio, m.fm_index, self.sample_rate);
        carrier * level * m.amplitude * self.velocity * HEADROOM_GAIN
    }
}

/// Sample offset of `time` inside the block, or `None` if it falls on or past
/// the block end. Late events land at offset 0.
fn block_offset(time: f64, block_start: f64, sample_rate: f64, frames: usize) -> Option<usize> {
    let offset = ((time - block_start) * sample_rate).floor().max(0.0);
    if offset < frames as f64 {
        Some(offset as usize)
    } else {
        None
    }
}

fn insert_trigger(triggers: &mut Vec<Trigger>, trigger: Trigger) {
    let index = triggers.partition_point(|t| t.offset() <= trigger.offset());
    triggers.insert(index, trigger);
}
