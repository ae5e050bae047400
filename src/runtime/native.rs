use crate::audio::{AudioBackend, CpalBackend};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::{InputEvent, KeyboardHandler, MidiHandler};
use crate::sequencer::scheduler::LookaheadScheduler;
use crate::synth::analysis::Analyser;
use crate::synth::note::{NoteEvent, NoteSource};
use crate::synth::{build_engine, EngineHandle};
use crossbeam_channel::unbounded;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Running,
    Stopped,
}

/// The owned audio graph: output device, renderer (inside the stream
/// callback), control handle and analysis reader.
///
/// Lifecycle: `new` (construct and wire) → `start` → `stop` → `dispose`.
pub struct AudioEngine {
    backend: CpalBackend,
    handle: EngineHandle,
    analyser: Analyser,
    state: EngineState,
}

impl AudioEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut backend = CpalBackend::new(config)?;
        let (handle, renderer, analyser) = build_engine(config, backend.sample_rate());
        backend.attach(renderer)?;
        info!(sample_rate = backend.sample_rate(), "audio engine wired");

        Ok(Self {
            backend,
            handle,
            analyser,
            state: EngineState::Ready,
        })
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    pub fn analyser(&mut self) -> &mut Analyser {
        &mut self.analyser
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        self.backend.start()?;
        self.state = EngineState::Running;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.backend.stop()?;
        self.state = EngineState::Stopped;
        Ok(())
    }

    /// Stop the stream and release the device.
    pub fn dispose(mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Running {
            self.stop()?;
        }
        info!("audio engine disposed");
        Ok(())
    }
}

/// Maps live note on/off onto the single voice. Releasing a key only
/// releases the voice if that key is the one currently sounding.
#[derive(Debug, Default)]
pub struct LiveInput {
    current: Option<(u8, NoteSource)>,
}

impl LiveInput {
    pub fn handle(&mut self, event: &NoteEvent, engine: &EngineHandle) {
        let id = (event.note_number, event.source);
        if event.is_on {
            engine.trigger_note(event.frequency, event.velocity_scale());
            self.current = Some(id);
        } else if self.current == Some(id) {
            engine.release_note();
            self.current = None;
        }
    }
}

/// Run the instrument: audio stream, live input and sequencer control loop.
pub fn start(config: EngineConfig) -> Result<(), EngineError> {
    let mut engine = AudioEngine::new(&config)?;
    engine.start()?;

    let mut scheduler = LookaheadScheduler::new(config.scheduler);
    config.sequencer.apply(&mut scheduler)?;
    let notices = scheduler.bus().subscribe(64);

    let (input_tx, input_rx) = unbounded();
    let mut keyboard = KeyboardHandler::new(input_tx.clone());
    let mut midi = MidiHandler::new(input_tx, None);
    if !midi.is_connected() {
        info!("no MIDI input; computer keyboard only");
    }
    let mut live = LiveInput::default();
    let mut handle = engine.handle().clone();
    let tick = config.scheduler.lookahead();

    info!("play with A-; (naturals) and W R T U I O [ (sharps); space toggles the sequencer, esc quits");

    let mut ticks: u64 = 0;
    'control: loop {
        keyboard.update();
        midi.update();

        while let Ok(event) = input_rx.try_recv() {
            match event {
                InputEvent::Note(note) => live.handle(&note, &handle),
                InputEvent::ToggleSequencer => {
                    if scheduler.is_playing() {
                        scheduler.stop();
                    } else {
                        scheduler.start(handle.now());
                    }
                }
                InputEvent::Quit => break 'control,
            }
        }

        scheduler.poll(handle.now(), &mut handle);

        while let Ok(notice) = notices.try_recv() {
            debug!(?notice, "visual notice");
        }

        let analyser = engine.analyser();
        analyser.update();
        ticks += 1;
        if ticks % 40 == 0 {
            let level = analyser.level();
            debug!(rms = level.rms, peak = level.peak, "output level");
        }

        std::thread::sleep(tick);
    }

    scheduler.stop();
    engine.dispose()
}
