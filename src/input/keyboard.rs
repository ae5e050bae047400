use super::InputEvent;
use crate::synth::note::{NoteEvent, NoteSource};
use crossbeam_channel::Sender;
use device_query::{DeviceQuery, DeviceState, Keycode};
use std::collections::HashMap;
use tracing::{debug, warn};

const KEY_VELOCITY: u8 = 100;

/// Polls the computer keyboard and turns key edges into input events.
pub struct KeyboardHandler {
    device_state: DeviceState,
    key_states: HashMap<Keycode, bool>,
    key_to_note: HashMap<Keycode, u8>,
    transport_down: bool,
    quit_down: bool,
    sender: Sender<InputEvent>,
}

impl KeyboardHandler {
    pub fn new(sender: Sender<InputEvent>) -> Self {
        // Two rows laid out like a piano: naturals on the home row,
        // accidentals above.
        let key_to_note: HashMap<Keycode, u8> = [
            (Keycode::A, 57),         // A3
            (Keycode::S, 59),         // B3
            (Keycode::D, 60),         // C4
            (Keycode::F, 62),         // D4
            (Keycode::G, 64),         // E4
            (Keycode::H, 65),         // F4
            (Keycode::J, 67),         // G4
            (Keycode::K, 69),         // A4
            (Keycode::L, 71),         // B4
            (Keycode::Semicolon, 72), // C5
            (Keycode::W, 58),           // A#3
            (Keycode::R, 61),           // C#4
            (Keycode::T, 63),           // D#4
            (Keycode::U, 66),           // F#4
            (Keycode::I, 68),           // G#4
            (Keycode::O, 70),           // A#4
            (Keycode::LeftBracket, 73), // C#5
        ]
        .into_iter()
        .collect();

        let key_states = key_to_note.keys().map(|key| (*key, false)).collect();

        Self {
            device_state: DeviceState::new(),
            key_states,
            key_to_note,
            transport_down: false,
            quit_down: false,
            sender,
        }
    }

    pub fn update(&mut self) {
        let keys: Vec<Keycode> = self.device_state.get_keys();

        for (key, note) in &self.key_to_note {
            let is_pressed = keys.contains(key);
            let was_pressed = self.key_states.get(key).copied().unwrap_or(false);
            if is_pressed == was_pressed {
                continue;
            }
            self.key_states.insert(*key, is_pressed);

            let velocity = if is_pressed { KEY_VELOCITY } else { 0 };
            debug!(?key, note, pressed = is_pressed, "key edge");
            match NoteEvent::new(*note, velocity, is_pressed, NoteSource::Keyboard) {
                Ok(event) => {
                    if let Err(e) = self.sender.send(InputEvent::Note(event)) {
                        warn!("error sending note event: {}", e);
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }

        let space = keys.contains(&Keycode::Space);
        if space && !self.transport_down {
            self.send(InputEvent::ToggleSequencer);
        }
        self.transport_down = space;

        let escape = keys.contains(&Keycode::Escape);
        if escape && !self.quit_down {
            self.send(InputEvent::Quit);
        }
        self.quit_down = escape;
    }

    fn send(&self, event: InputEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!("error sending {:?}: {}", event, e);
        }
    }
}
