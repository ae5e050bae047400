#[cfg(not(target_arch = "wasm32"))]
mod cpal_backend;
#[cfg(not(target_arch = "wasm32"))]
pub use self::cpal_backend::CpalBackend;

use crate::error::EngineError;

pub trait AudioBackend {
    fn start(&mut self) -> Result<(), EngineError>;
    fn stop(&mut self) -> Result<(), EngineError>;
}
