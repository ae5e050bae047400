use crate::config::EngineConfig;
use crate::sequencer::scale::scale_intervals;
use crate::sequencer::scheduler::LookaheadScheduler;
use crate::sequencer::step::{PlaybackMode, SequencerStep};
use crate::synth::analysis::Analyser;
use crate::synth::note::{NoteEvent, NoteSource};
use crate::synth::params::LfoTarget;
use crate::synth::{build_engine, EngineHandle, Renderer};
use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

/// Browser runtime: the page's audio worklet calls `render` and a timer
/// calls `tick`. Everything runs on one thread, so the handle's messages are
/// simply drained at the start of the next render.
#[wasm_bindgen]
pub struct WasmSynth {
    handle: EngineHandle,
    renderer: Renderer,
    analyser: Analyser,
    scheduler: LookaheadScheduler,
    current_note: Option<u8>,
    temp_buffer: Vec<f32>,
}

#[wasm_bindgen]
impl WasmSynth {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: u32) -> Result<WasmSynth, JsValue> {
        let config = EngineConfig::default();
        let sample_rate = if sample_rate > 0 {
            sample_rate
        } else {
            config.sample_rate
        };
        let (handle, renderer, analyser) = build_engine(&config, sample_rate);
        let mut scheduler = LookaheadScheduler::new(config.scheduler);
        config
            .sequencer
            .apply(&mut scheduler)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        web_sys::console::log_1(&format!("rustfmseq ready at {} Hz", sample_rate).into());

        Ok(WasmSynth {
            handle,
            renderer,
            analyser,
            scheduler,
            current_note: None,
            temp_buffer: Vec::new(),
        })
    }

    /// Render `frames` frames of interleaved audio with `channels` channels.
    #[wasm_bindgen]
    pub fn render(&mut self, frames: usize, channels: usize) -> Float32Array {
        let len = frames * channels.max(1);
        if self.temp_buffer.len() != len {
            self.temp_buffer = vec![0.0; len];
        }
        self.renderer
            .render_interleaved(&mut self.temp_buffer, channels);
        Float32Array::from(self.temp_buffer.as_slice())
    }

    /// Current audio-clock time in seconds.
    #[wasm_bindgen]
    pub fn now(&self) -> f64 {
        self.handle.now()
    }

    #[wasm_bindgen]
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        if let Ok(event) = NoteEvent::new(note, velocity, true, NoteSource::Keyboard) {
            self.handle
                .trigger_note(event.frequency, event.velocity_scale());
            self.current_note = Some(note);
        }
    }

    #[wasm_bindgen]
    pub fn note_off(&mut self, note: u8) {
        if self.current_note == Some(note) {
            self.handle.release_note();
            self.current_note = None;
        }
    }

    #[wasm_bindgen]
    pub fn trigger_frequency(&mut self, freq: f32, velocity: f32) {
        self.handle.trigger_note(freq, velocity);
    }

    #[wasm_bindgen]
    pub fn release(&mut self) {
        self.handle.release_note();
        self.current_note = None;
    }

    /// Set a voice parameter by its camelCase name. Unknown names are ignored.
    #[wasm_bindgen]
    pub fn set_parameter(&mut self, name: &str, value: f32) {
        self.handle.set_named_parameter(name, value);
    }

    #[wasm_bindgen]
    pub fn set_lfo_target(&mut self, name: &str) {
        if let Some(target) = LfoTarget::parse(name) {
            self.handle.set_named_parameter("lfoTarget", target);
        }
    }

    #[wasm_bindgen]
    pub fn set_delay(&mut self, time_ms: f32, feedback: f32, wet: f32) {
        self.handle.set_delay(time_ms, feedback, wet);
    }

    #[wasm_bindgen]
    pub fn set_master_gain(&mut self, gain: f32) {
        self.handle.set_master_gain(gain);
    }

    /// Replace the pattern with an array of step objects.
    #[wasm_bindgen]
    pub fn set_steps(&mut self, steps: JsValue) -> Result<(), JsValue> {
        let steps: Vec<SequencerStep> = serde_wasm_bindgen::from_value(steps)?;
        self.scheduler.set_steps(steps);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_bpm(&mut self, bpm: f32) {
        self.scheduler.set_bpm(bpm);
    }

    #[wasm_bindgen]
    pub fn set_step_length(&mut self, length: f32) {
        self.scheduler.set_step_length(length);
    }

    #[wasm_bindgen]
    pub fn set_swing(&mut self, swing: f32) {
        self.scheduler.set_swing(swing);
    }

    #[wasm_bindgen]
    pub fn set_loop_length(&mut self, length: usize) {
        self.scheduler.set_loop_length(length);
    }

    #[wasm_bindgen]
    pub fn set_mode(&mut self, mode: &str) {
        if let Some(mode) = PlaybackMode::parse(mode) {
            self.scheduler.set_mode(mode);
        }
    }

    #[wasm_bindgen]
    pub fn set_scale(&mut self, root: i32, name: &str) -> Result<(), JsValue> {
        let intervals = scale_intervals(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown scale: {}", name)))?;
        self.scheduler.set_scale(root, intervals.to_vec());
        Ok(())
    }

    #[wasm_bindgen]
    pub fn start(&mut self) -> bool {
        self.scheduler.start(self.handle.now())
    }

    #[wasm_bindgen]
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    #[wasm_bindgen]
    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// One pass of the lookahead loop; call every 25 ms or so.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> usize {
        let now = self.handle.now();
        self.scheduler.poll(now, &mut self.handle)
    }

    /// Smoothed magnitude spectrum of the most recent output.
    #[wasm_bindgen]
    pub fn frequency_data(&mut self) -> Float32Array {
        self.analyser.update();
        Float32Array::from(self.analyser.frequency_data())
    }
}
