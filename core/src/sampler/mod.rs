//! CPU-side sampler state.
//!
//! Provides [`Filter`] and [`Wrap`], the per-texture sampling state mirrored
//! on the CPU, along with the [`FilterMode`], [`MipmapFilter`] and
//! [`AddressMode`] enums shared between CPU and GPU code.

mod types;

pub use types::{AddressMode, Filter, FilterMode, MipmapFilter, Wrap};
