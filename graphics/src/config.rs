//! Graphics configuration.

use sprig_core::sampler::{Filter, FilterMode, MipmapFilter, Wrap};

/// Defaults applied to every image created by a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsConfig {
    /// Min/mag filter and anisotropy for new images.
    pub default_filter: Filter,
    /// Mipmap filter for new images.
    pub default_mipmap_filter: MipmapFilter,
    /// Mipmap sharpness for new images.
    pub default_mipmap_sharpness: f32,
    /// Wrap mode for new images.
    pub default_wrap: Wrap,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            default_filter: Filter::default(),
            default_mipmap_filter: MipmapFilter::None,
            default_mipmap_sharpness: 0.0,
            default_wrap: Wrap::default(),
        }
    }
}

impl GraphicsConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default min/mag filter.
    pub fn with_filter(mut self, min: FilterMode, mag: FilterMode) -> Self {
        self.default_filter.min = min;
        self.default_filter.mag = mag;
        self
    }

    /// Set the default anisotropy.
    pub fn with_anisotropy(mut self, anisotropy: f32) -> Self {
        self.default_filter.anisotropy = anisotropy;
        self
    }

    /// Set the default mipmap filter.
    pub fn with_mipmap_filter(mut self, filter: MipmapFilter) -> Self {
        self.default_mipmap_filter = filter;
        self
    }

    /// Set the default mipmap sharpness.
    pub fn with_mipmap_sharpness(mut self, sharpness: f32) -> Self {
        self.default_mipmap_sharpness = sharpness;
        self
    }

    /// Set the default wrap mode.
    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.default_wrap = wrap;
        self
    }

    /// The full filter a new image starts with.
    pub fn initial_filter(&self) -> Filter {
        self.default_filter.with_mipmap(self.default_mipmap_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::sampler::AddressMode;

    #[test]
    fn test_initial_filter() {
        let config = GraphicsConfig::new()
            .with_filter(FilterMode::Nearest, FilterMode::Linear)
            .with_mipmap_filter(MipmapFilter::Linear)
            .with_wrap(Wrap::uniform(AddressMode::Repeat));

        let filter = config.initial_filter();
        assert_eq!(filter.min, FilterMode::Nearest);
        assert_eq!(filter.mag, FilterMode::Linear);
        assert_eq!(filter.mipmap, MipmapFilter::Linear);
        assert_eq!(config.default_wrap.s, AddressMode::Repeat);
    }
}
