use super::InputEvent;
use crate::error::EngineError;
use crate::synth::note::{NoteEvent, NoteSource};
use crossbeam_channel::{unbounded, Receiver, Sender};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{info, warn};

pub struct MidiHandler {
    /// Holds the connection to keep it alive
    #[allow(dead_code)]
    connection: Option<MidiInputConnection<()>>,
    receiver: Option<Receiver<(u8, u8, u8)>>, // (status, data1, data2)
    sender: Sender<InputEvent>,
}

impl MidiHandler {
    /// Connect to the first input port whose name contains `port_hint`
    /// (or the first port at all). MIDI stays disabled if that fails.
    pub fn new(sender: Sender<InputEvent>, port_hint: Option<&str>) -> Self {
        match Self::try_new(sender.clone(), port_hint) {
            Ok(handler) => handler,
            Err(e) => {
                info!("MIDI input disabled: {}", e);
                Self {
                    connection: None,
                    receiver: None,
                    sender,
                }
            }
        }
    }

    fn try_new(sender: Sender<InputEvent>, port_hint: Option<&str>) -> Result<Self, EngineError> {
        let midi_in =
            MidiInput::new("rustfmseq input").map_err(|e| EngineError::Midi(e.to_string()))?;
        let port = Self::select_input_port(&midi_in, port_hint)?;
        let port_name = midi_in
            .port_name(&port)
            .map_err(|e| EngineError::Midi(e.to_string()))?;

        let (tx, rx) = unbounded();
        let connection = midi_in
            .connect(
                &port,
                "rustfmseq-read-input",
                move |_, message, _| {
                    if message.len() >= 3 {
                        let _ = tx.send((message[0], message[1], message[2]));
                    }
                },
                (),
            )
            .map_err(|e| EngineError::Midi(e.to_string()))?;

        info!("opened MIDI port: {}", port_name);

        Ok(Self {
            connection: Some(connection),
            receiver: Some(rx),
            sender,
        })
    }

    fn select_input_port(
        midi_in: &MidiInput,
        port_hint: Option<&str>,
    ) -> Result<MidiInputPort, EngineError> {
        let ports = midi_in.ports();
        let matches_hint = |port: &MidiInputPort| match port_hint {
            Some(hint) => midi_in
                .port_name(port)
                .map(|name| name.to_lowercase().contains(&hint.to_lowercase()))
                .unwrap_or(false),
            None => true,
        };
        ports
            .iter()
            .find(|port| matches_hint(port))
            .cloned()
            .ok_or_else(|| EngineError::Midi("no matching MIDI input port".to_string()))
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn update(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        while let Ok((status, data1, data2)) = receiver.try_recv() {
            let Some((is_on, velocity)) = decode(status, data2) else {
                continue;
            };
            match NoteEvent::new(data1, velocity, is_on, NoteSource::Midi) {
                Ok(event) => {
                    if let Err(e) = self.sender.send(InputEvent::Note(event)) {
                        warn!("failed to send MIDI note event: {}", e);
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    }
}

/// Classify a channel message as note on/off. Note-on with zero velocity
/// counts as note-off.
fn decode(status: u8, velocity: u8) -> Option<(bool, u8)> {
    match status & 0xF0 {
        0x90 if velocity > 0 => Some((true, velocity)),
        0x90 | 0x80 => Some((false, 0)),
        _ => None,
    }
}
