//! Best-effort notification bus for visuals.
//!
//! The scheduler queues notices stamped with the audio time they belong to
//! and the bus publishes them once that time has arrived. Publishing never
//! blocks: a subscriber whose channel is full misses the notice, and one that
//! hung up is dropped. None of this touches note scheduling.

use crate::synth::note::NoteSource;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// A note started sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteNotice {
    pub time: f64,
    pub midi: i32,
    pub velocity: f32,
    pub source: NoteSource,
}

/// The sequencer entered a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccentNotice {
    pub time: f64,
    pub step: usize,
    /// False when the step is off or lost its probability draw.
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    Note(NoteNotice),
    Accent(AccentNotice),
}

impl Notice {
    pub fn time(&self) -> f64 {
        match self {
            Notice::Note(n) => n.time,
            Notice::Accent(a) => a.time,
        }
    }
}

#[derive(Default)]
pub struct NotificationBus {
    subscribers: Vec<Sender<Notice>>,
    pending: Vec<Notice>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener with room for `capacity` undelivered notices.
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<Notice> {
        let (tx, rx) = bounded(capacity.max(1));
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a notice for delivery once the audio clock reaches its time.
    pub fn defer(&mut self, notice: Notice) {
        let index = self.pending.partition_point(|n| n.time() <= notice.time());
        self.pending.insert(index, notice);
    }

    /// Deliver every pending notice due at or before `now`.
    pub fn dispatch_due(&mut self, now: f64) -> usize {
        let due = self.pending.partition_point(|n| n.time() <= now);
        if due == 0 {
            return 0;
        }
        let notices: Vec<Notice> = self.pending.drain(..due).collect();
        for notice in &notices {
            self.publish(*notice);
        }
        notices.len()
    }

    /// Send to every subscriber right away.
    pub fn publish(&mut self, notice: Notice) {
        self.subscribers.retain(|tx| match tx.try_send(notice) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Forget everything not yet delivered.
    pub fn cancel_pending(&mut self) {
        self.pending.clear();
    }
}
