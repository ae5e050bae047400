#[cfg(not(target_arch = "wasm32"))]
pub mod audio;
pub mod config;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod input;
pub mod runtime;
pub mod sequencer;
pub mod synth;

pub use config::EngineConfig;
pub use error::EngineError;
