// Platform shims shared by the native and wasm builds

// OnceLock / OnceCell
#[cfg(target_arch = "wasm32")]
pub use once_cell::sync::OnceCell as OnceLock;
#[cfg(not(target_arch = "wasm32"))]
pub use std::sync::OnceLock;

// collections
#[cfg(target_arch = "wasm32")]
pub use hashbrown::HashMap;
#[cfg(not(target_arch = "wasm32"))]
pub use std::collections::HashMap;

// TAU constant
pub use core::f32::consts::TAU;

/// Seed for the sequencer's random draws.
#[cfg(target_arch = "wasm32")]
pub fn random_seed() -> u64 {
    fastrand::u64(..)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn random_seed() -> u64 {
    use rand::Rng;
    rand::rng().random()
}
