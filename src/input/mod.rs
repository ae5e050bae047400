#[cfg(not(target_arch = "wasm32"))]
mod keyboard;
#[cfg(not(target_arch = "wasm32"))]
mod midi;
#[cfg(not(target_arch = "wasm32"))]
pub use self::keyboard::KeyboardHandler;
#[cfg(not(target_arch = "wasm32"))]
pub use self::midi::MidiHandler;

use crate::synth::note::NoteEvent;

/// What live input asks the runtime to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Note(NoteEvent),
    ToggleSequencer,
    Quit,
}
