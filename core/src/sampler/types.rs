//! Filter and wrap state definitions.

/// Texture filtering mode for minification and magnification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

/// Filtering between mipmap levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipmapFilter {
    /// Mipmaps are not used.
    #[default]
    None,
    /// Use the nearest mipmap level.
    Nearest,
    /// Blend between the two nearest levels.
    Linear,
}

impl MipmapFilter {
    /// Returns true if this mode samples from a mipmap chain.
    pub fn uses_mipmaps(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
    /// Clamp to a transparent black border.
    ClampToBorder,
}

/// Filtering state of a texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filter {
    /// Minification filter.
    pub min: FilterMode,
    /// Magnification filter.
    pub mag: FilterMode,
    /// Mipmap filter.
    pub mipmap: MipmapFilter,
    /// Anisotropic filtering level (1.0 disables it).
    pub anisotropy: f32,
}

impl Filter {
    /// Create a linear filter without mipmaps.
    pub fn linear() -> Self {
        Self::default()
    }

    /// Create a nearest neighbor filter without mipmaps.
    pub fn nearest() -> Self {
        Self {
            min: FilterMode::Nearest,
            mag: FilterMode::Nearest,
            ..Default::default()
        }
    }

    /// Set the mipmap filter.
    pub fn with_mipmap(mut self, mipmap: MipmapFilter) -> Self {
        self.mipmap = mipmap;
        self
    }

    /// Set the anisotropic filtering level.
    pub fn with_anisotropy(mut self, level: f32) -> Self {
        self.anisotropy = level;
        self
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            min: FilterMode::Linear,
            mag: FilterMode::Linear,
            mipmap: MipmapFilter::None,
            anisotropy: 1.0,
        }
    }
}

/// Wrapping state of a texture, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap {
    /// Address mode for the horizontal (s) coordinate.
    pub s: AddressMode,
    /// Address mode for the vertical (t) coordinate.
    pub t: AddressMode,
}

impl Wrap {
    /// Use the same address mode on both axes.
    pub fn uniform(mode: AddressMode) -> Self {
        Self { s: mode, t: mode }
    }

    /// Create a wrap state from per-axis modes.
    pub fn new(s: AddressMode, t: AddressMode) -> Self {
        Self { s, t }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let filter = Filter::default();
        assert_eq!(filter.min, FilterMode::Linear);
        assert_eq!(filter.mipmap, MipmapFilter::None);
        assert_eq!(filter.anisotropy, 1.0);
        assert!(!filter.mipmap.uses_mipmaps());
    }

    #[test]
    fn test_filter_builders() {
        let filter = Filter::nearest()
            .with_mipmap(MipmapFilter::Linear)
            .with_anisotropy(8.0);
        assert_eq!(filter.mag, FilterMode::Nearest);
        assert!(filter.mipmap.uses_mipmaps());
        assert_eq!(filter.anisotropy, 8.0);
    }

    #[test]
    fn test_wrap() {
        let wrap = Wrap::uniform(AddressMode::Repeat);
        assert_eq!(wrap.s, AddressMode::Repeat);
        assert_eq!(wrap.t, AddressMode::Repeat);
        assert_eq!(Wrap::default().s, AddressMode::ClampToEdge);
    }
}
