use serde::{Deserialize, Serialize};

const MIN_DELAY_SECS: f32 = 0.03;
const MAX_DELAY_SECS: f32 = 1.2;
const MAX_FEEDBACK: f32 = 0.8;
// Feedback ceiling when the mix is fully wet, to keep the loop from howling.
const WET_ONLY_FEEDBACK: f32 = 0.7;
const MAX_MASTER_GAIN: f32 = 0.5;
// Time constant for parameter glides, in seconds.
const SMOOTHING_SECS: f32 = 0.01;

/// User-facing delay settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaySettings {
    pub time_ms: f32,
    pub feedback: f32,
    pub wet: f32,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            time_ms: 300.0,
            feedback: 0.3,
            wet: 0.3,
        }
    }
}

impl DelaySettings {
    /// Clamp into the ranges the chain can run safely.
    pub fn sanitized(&self) -> Self {
        let wet = finite_or(self.wet, 0.0).clamp(0.0, 1.0);
        let mut feedback = finite_or(self.feedback, 0.0);
        if wet >= 0.99 && feedback > WET_ONLY_FEEDBACK {
            feedback = WET_ONLY_FEEDBACK;
        }
        Self {
            time_ms: (finite_or(self.time_ms, 300.0) / 1000.0).clamp(MIN_DELAY_SECS, MAX_DELAY_SECS)
                * 1000.0,
            feedback: feedback.clamp(0.0, MAX_FEEDBACK),
            wet,
        }
    }
}

/// Control-to-render messages for the signal chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChainMessage {
    Delay(DelaySettings),
    MasterGain(f32),
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// One-pole glide toward a target value.
#[derive(Debug, Clone, Copy)]
struct Smoothed {
    current: f32,
    target: f32,
    coeff: f32,
}

impl Smoothed {
    fn new(value: f32, sample_rate: f32) -> Self {
        Self {
            current: value,
            target: value,
            coeff: 1.0 - (-1.0 / (SMOOTHING_SECS * sample_rate)).exp(),
        }
    }

    fn set(&mut self, target: f32) {
        self.target = target;
    }

    #[inline]
    fn next(&mut self) -> f32 {
        if (self.current - self.target).abs() > 1e-6 {
            self.current += (self.target - self.current) * self.coeff;
        } else {
            self.current = self.target;
        }
        self.current
    }
}

/// Fractional delay line with linear interpolation.
#[derive(Debug, Clone)]
struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    fn new(max_delay_samples: usize) -> Self {
        Self {
            // One extra slot so the longest delay can still interpolate.
            buffer: vec![0.0; max_delay_samples + 2],
            write_pos: 0,
        }
    }

    #[inline]
    fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, (len - 2) as f32);
        let whole = delay.floor();
        let fraction = delay - whole;
        // Integer indexing; an f32 read position loses precision on long lines.
        let newer = (self.write_pos + len - whole as usize) % len;
        let older = (newer + len - 1) % len;
        let a = self.buffer[newer];
        a + fraction * (self.buffer[older] - a)
    }

    #[inline]
    fn write(&mut self, input: f32) {
        self.buffer[self.write_pos] = input;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }
}

/// Dry/wet ping-pong delay followed by the master gain.
///
/// Each channel's delay output feeds the other channel's delay input, so
/// repeats bounce between left and right.
pub struct SignalChain {
    sample_rate: f32,
    left: DelayLine,
    right: DelayLine,
    delay_samples: Smoothed,
    feedback: Smoothed,
    wet: Smoothed,
    master: Smoothed,
    settings: DelaySettings,
}

impl SignalChain {
    pub fn new(sample_rate: f32, delay: DelaySettings, master_gain: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        let max_samples = (MAX_DELAY_SECS * sample_rate).ceil() as usize;
        let settings = delay.sanitized();
        Self {
            sample_rate,
            left: DelayLine::new(max_samples),
            right: DelayLine::new(max_samples),
            delay_samples: Smoothed::new(settings.time_ms / 1000.0 * sample_rate, sample_rate),
            feedback: Smoothed::new(settings.feedback, sample_rate),
            wet: Smoothed::new(settings.wet, sample_rate),
            master: Smoothed::new(clamp_master(master_gain), sample_rate),
            settings,
        }
    }

    pub fn settings(&self) -> DelaySettings {
        self.settings
    }

    pub fn master_gain(&self) -> f32 {
        self.master.target
    }

    pub fn set_delay(&mut self, delay: DelaySettings) {
        self.settings = delay.sanitized();
        self.delay_samples
            .set(self.settings.time_ms / 1000.0 * self.sample_rate);
        self.feedback.set(self.settings.feedback);
        self.wet.set(self.settings.wet);
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master.set(clamp_master(gain));
    }

    pub fn handle_message(&mut self, message: ChainMessage) {
        match message {
            ChainMessage::Delay(settings) => self.set_delay(settings),
            ChainMessage::MasterGain(gain) => self.set_master_gain(gain),
        }
    }

    /// Process a stereo block in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let delay = self.delay_samples.next();
            let feedback = self.feedback.next();
            let wet = self.wet.next();
            let master = self.master.next();

            let delayed_l = self.left.read(delay);
            let delayed_r = self.right.read(delay);
            self.left.write(*l + delayed_r * feedback);
            self.right.write(*r + delayed_l * feedback);

            let dry = 1.0 - wet;
            *l = (*l * dry + delayed_l * wet) * master;
            *r = (*r * dry + delayed_r * wet) * master;
        }
    }
}

fn clamp_master(gain: f32) -> f32 {
    finite_or(gain, MAX_MASTER_GAIN).clamp(0.0, MAX_MASTER_GAIN)
}
