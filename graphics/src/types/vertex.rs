//! Vertex struct for textured quads.

/// Position and texture coordinate of one quad corner.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexturedVertex {
    /// Position x.
    pub x: f32,
    /// Position y.
    pub y: f32,
    /// Texture coordinate s.
    pub s: f32,
    /// Texture coordinate t.
    pub t: f32,
}

impl TexturedVertex {
    /// Create a vertex.
    pub const fn new(x: f32, y: f32, s: f32, t: f32) -> Self {
        Self { x, y, s, t }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_bytes() {
        let quad = [
            TexturedVertex::new(0.0, 0.0, 0.0, 0.0),
            TexturedVertex::new(0.0, 1.0, 0.0, 1.0),
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&quad);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[20..24], &1.0f32.to_ne_bytes());
    }
}
