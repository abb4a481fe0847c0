//! Common types and descriptors for graphics resources.
//!
//! This module contains usage flags, descriptor structs and the vertex
//! struct used for textured quads.

mod buffer;
mod vertex;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use vertex::TexturedVertex;
