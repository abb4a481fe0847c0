//! # Sprig Core
//!
//! GPU-agnostic data shared by the Sprig graphics crate: vertex layouts,
//! mesh descriptors, sampler state, image sources and 2D transform math.

pub mod math;
pub mod mesh;
pub mod sampler;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core crate version.
pub fn init() {
    log::info!("Sprig Core v{} initialized", VERSION);
}
