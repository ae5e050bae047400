pub mod analysis;
pub mod chain;
pub mod clock;
pub mod engine;
pub mod envelope;
pub mod event;
pub mod note;
pub mod oscillator;
pub mod params;
pub mod prelude;
pub mod voice;

pub use engine::{build_engine, EngineHandle, Message, Renderer};
pub use voice::VoiceEngine;
