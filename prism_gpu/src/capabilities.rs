//! Capability queries: optional features and hard limits
//!
//! Callers are expected to check descriptors against these before creating
//! resources. Backends re-validate the limits they depend on.

/// Optional features a device may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    /// Anisotropic texture filtering
    pub anisotropy: bool,
    /// ASTC compressed texture formats
    pub astc: bool,
    /// DXT / BC1-3 compressed texture formats
    pub dxt: bool,
}

impl Features {
    /// Every optional feature enabled
    pub const ALL: Self = Self { anisotropy: true, astc: true, dxt: true };
}

/// Hard device limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest texture dimension (width, height or depth)
    pub texture_size: u32,
    /// Largest canvas width and height
    pub framebuffer_size: [u32; 2],
    /// Largest canvas sample count
    pub framebuffer_samples: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            texture_size: 16384,
            framebuffer_size: [16384, 16384],
            framebuffer_samples: 8,
        }
    }
}
