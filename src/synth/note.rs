use crate::error::EngineError;
use crate::sequencer::scale::midi_to_freq;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteSource {
    Keyboard,
    Midi,
    Sequencer,
}

/// A live note on/off coming from a keyboard or MIDI controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub note_number: u8, // MIDI note number (0-127)
    pub velocity: u8,    // MIDI velocity (0-127)
    pub is_on: bool,
    pub source: NoteSource,
    pub frequency: f32,
}

impl NoteEvent {
    pub fn new(
        note_number: u8,
        velocity: u8,
        is_on: bool,
        source: NoteSource,
    ) -> Result<Self, EngineError> {
        if note_number > 127 {
            return Err(EngineError::InvalidNote(note_number));
        }
        Ok(Self {
            note_number,
            velocity: velocity.min(127),
            is_on,
            source,
            frequency: midi_to_freq(note_number as i32),
        })
    }

    /// Velocity scaled to 0.0-1.0.
    pub fn velocity_scale(&self) -> f32 {
        self.velocity as f32 / 127.0
    }
}
