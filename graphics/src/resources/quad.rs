//! Sub-rectangles of a texture.

use crate::types::TexturedVertex;

/// A rectangle in texture pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// A viewport into a texture of a reference size, as four ready-made corners.
///
/// Positions span `(0, 0)` to `(w, h)`; texture coordinates are the
/// viewport divided by the reference size.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    viewport: Viewport,
    sw: f32,
    sh: f32,
    vertices: [TexturedVertex; 4],
}

impl Quad {
    /// Create a quad selecting `viewport` out of a `sw` x `sh` texture.
    pub fn new(viewport: Viewport, sw: f32, sh: f32) -> Self {
        let mut quad = Self {
            viewport,
            sw,
            sh,
            vertices: [TexturedVertex::default(); 4],
        };
        quad.refresh();
        quad
    }

    /// Move or resize the selected rectangle.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.refresh();
    }

    /// The selected rectangle.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Reference texture size.
    pub fn texture_size(&self) -> (f32, f32) {
        (self.sw, self.sh)
    }

    /// Corners in fan order.
    pub fn vertices(&self) -> &[TexturedVertex; 4] {
        &self.vertices
    }

    fn refresh(&mut self) {
        let Viewport { x, y, w, h } = self.viewport;
        let (s0, t0) = (x / self.sw, y / self.sh);
        let (s1, t1) = ((x + w) / self.sw, (y + h) / self.sh);
        self.vertices = [
            TexturedVertex::new(0.0, 0.0, s0, t0),
            TexturedVertex::new(0.0, h, s0, t1),
            TexturedVertex::new(w, h, s1, t1),
            TexturedVertex::new(w, 0.0, s1, t0),
        ];
    }
}
