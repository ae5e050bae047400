use super::params::{ParamKey, ParamValue};

/// Slack added to the block end when deciding which events are due, to
/// absorb rounding in the clock arithmetic.
pub const DUE_EPSILON: f64 = 1e-5;

/// An event stamped with an audio-clock time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledEvent {
    Note {
        time: f64,
        freq: f32,
        velocity: f32,
        length: f64,
    },
    NoteOff {
        time: f64,
    },
    Param {
        time: f64,
        key: ParamKey,
        value: ParamValue,
    },
}

impl ScheduledEvent {
    pub fn time(&self) -> f64 {
        match *self {
            ScheduledEvent::Note { time, .. }
            | ScheduledEvent::NoteOff { time }
            | ScheduledEvent::Param { time, .. } => time,
        }
    }
}

/// Control-to-render messages for the voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceMessage {
    NoteOn { freq: f32, velocity: f32 },
    NoteOff,
    Set { key: ParamKey, value: ParamValue },
    NoteAt { freq: f32, velocity: f32, time: f64, length: f64 },
    ParamAt { key: ParamKey, value: ParamValue, time: f64 },
}

/// Pending events, kept sorted by time.
///
/// New events go after every queued event with the same or an earlier time,
/// so equal timestamps come out in arrival order.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<ScheduledEvent>,
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Insert in sorted position. Events with a non-finite time could never
    /// become due and are dropped.
    pub fn push(&mut self, event: ScheduledEvent) -> bool {
        let time = event.time();
        if !time.is_finite() {
            return false;
        }
        let index = self.events.partition_point(|e| e.time() <= time);
        self.events.insert(index, event);
        true
    }

    /// Move every event with `time <= until` into `out`, oldest first.
    pub fn drain_due(&mut self, until: f64, out: &mut Vec<ScheduledEvent>) {
        let due = self.events.partition_point(|e| e.time() <= until);
        out.extend(self.events.drain(..due));
    }
}
