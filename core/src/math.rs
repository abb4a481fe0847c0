//! Math type aliases and 2D transform helpers.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Position, rotation, scale, origin and shear of a 2D draw.
///
/// The origin is subtracted before scaling and rotating, so `(ox, oy)` is
/// the point of the drawable that lands on `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2d {
    /// Destination x.
    pub x: f32,
    /// Destination y.
    pub y: f32,
    /// Rotation in radians.
    pub angle: f32,
    /// Scale along x.
    pub sx: f32,
    /// Scale along y.
    pub sy: f32,
    /// Origin offset along x.
    pub ox: f32,
    /// Origin offset along y.
    pub oy: f32,
    /// Shear along x.
    pub kx: f32,
    /// Shear along y.
    pub ky: f32,
}

impl Default for Transform2d {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            sx: 1.0,
            sy: 1.0,
            ox: 0.0,
            oy: 0.0,
            kx: 0.0,
            ky: 0.0,
        }
    }
}

impl Transform2d {
    /// Create a translation-only transform.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    /// Set the rotation in radians.
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Set the scale factors.
    pub fn with_scale(mut self, sx: f32, sy: f32) -> Self {
        self.sx = sx;
        self.sy = sy;
        self
    }

    /// Set the origin offset.
    pub fn with_origin(mut self, ox: f32, oy: f32) -> Self {
        self.ox = ox;
        self.oy = oy;
        self
    }

    /// Set the shear factors.
    pub fn with_shear(mut self, kx: f32, ky: f32) -> Self {
        self.kx = kx;
        self.ky = ky;
        self
    }

    /// Build the 4x4 matrix for this transform.
    pub fn to_matrix(&self) -> Mat4 {
        let (s, c) = self.angle.sin_cos();
        let a = c * self.sx - self.ky * s * self.sy;
        let b = s * self.sx + self.ky * c * self.sy;
        let cc = self.kx * c * self.sx - s * self.sy;
        let d = self.kx * s * self.sx + c * self.sy;
        let tx = self.x - self.ox * a - self.oy * cc;
        let ty = self.y - self.ox * b - self.oy * d;
        #[rustfmt::skip]
        let result = Mat4::new(
            a,   cc,  0.0, tx,
            b,   d,   0.0, ty,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        result
    }
}

/// Apply a transform matrix to a 2D point.
pub fn transform_point(m: &Mat4, x: f32, y: f32) -> Vec2 {
    let p = m * nalgebra::Vector4::new(x, y, 0.0, 1.0);
    Vec2::new(p.x, p.y)
}
