//! Common utilities for graphics integration tests.
//!
//! This module provides shared test infrastructure that can be reused
//! across tests parameterized by driver capability profile.

#![allow(dead_code)]

use std::sync::Arc;

use sprig_core::mesh::{MeshDescriptor, PrimitiveTopology, UsageHint, VertexAttribute, VertexLayout};
use sprig_core::texture::{CompressedData, CompressedFormat, CompressedLevel, ImageData};
use sprig_graphics::{
    Capabilities, DrawCommand, DummyBackend, GraphicsConfig, GraphicsDevice, Image, Mesh,
};

// ============================================================================
// Capability Profiles
// ============================================================================

/// Driver profiles tests run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Everything supported.
    Modern,
    /// Power-of-two textures, automatic mipmaps only, no LOD bias, no
    /// compression, no instancing.
    Legacy,
}

impl Profile {
    /// Capabilities reported by this profile.
    pub fn capabilities(self) -> Capabilities {
        match self {
            Profile::Modern => Capabilities::modern(),
            Profile::Legacy => Capabilities::legacy(),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Test context providing access to the device and the recording backend.
pub struct TestContext {
    /// The recording backend, for inspecting driver state.
    pub backend: Arc<DummyBackend>,
    /// Graphics device for creating resources.
    pub device: Arc<GraphicsDevice>,
}

impl TestContext {
    /// Create a context for a profile with the default configuration.
    pub fn new(profile: Profile) -> Self {
        Self::with_capabilities(profile.capabilities(), GraphicsConfig::default())
    }

    /// Create a context with explicit capabilities and configuration.
    pub fn with_capabilities(capabilities: Capabilities, config: GraphicsConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let backend = Arc::new(DummyBackend::new(capabilities));
        let device = GraphicsDevice::new(backend.clone(), capabilities, config);
        Self { backend, device }
    }

    /// Draw commands submitted so far.
    pub fn draws(&self) -> Vec<DrawCommand> {
        self.backend.draw_calls()
    }

    /// Create an image from zeroed RGBA8 pixels.
    pub fn create_image(&self, width: u32, height: u32) -> Arc<Image> {
        self.device
            .create_image(ImageData::zeroed(width, height).unwrap().into())
            .unwrap()
    }

    /// Create a mesh with position (float3) and texcoord (float2) attributes.
    pub fn create_textured_mesh(&self, vertex_count: usize, topology: PrimitiveTopology) -> Mesh {
        self.device
            .create_mesh(
                &MeshDescriptor::new(textured_layout())
                    .with_vertex_count(vertex_count)
                    .with_topology(topology)
                    .with_usage(UsageHint::Static),
            )
            .unwrap()
    }
}

// ============================================================================
// Data Helpers
// ============================================================================

/// Position (float3) followed by texcoord (float2), 20 bytes per vertex.
pub fn textured_layout() -> Arc<VertexLayout> {
    Arc::new(
        VertexLayout::new(vec![VertexAttribute::position_3d(), VertexAttribute::texcoord()])
            .unwrap(),
    )
}

/// Bytes of a slice of floats.
pub fn floats(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

/// Compressed data with levels from `width`x`height` down to `min_size` on
/// each axis, filled with zeroed blocks.
pub fn compressed_chain(
    format: CompressedFormat,
    width: u32,
    height: u32,
    min_size: u32,
) -> CompressedData {
    let mut levels = Vec::new();
    let (mut w, mut h) = (width, height);
    loop {
        levels.push(CompressedLevel {
            width: w,
            height: h,
            data: vec![0; format.level_size(w, h)],
        });
        if (w <= min_size && h <= min_size) || (w == 1 && h == 1) {
            break;
        }
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    CompressedData::new(format, levels).unwrap()
}
