/// Canvas trait - a render target bundle of color and depth/stencil attachments
///
/// A canvas does not own its attachment textures: destroying it releases the
/// render-pass object only.

use crate::texture::{Texture, TextureFormat};

/// Maximum number of color attachments per canvas
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

/// What happens to an attachment's previous contents when a render pass begins
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp<V> {
    /// Keep the existing contents
    Load,
    /// Replace the contents with a clear value
    Clear(V),
    /// Contents become undefined
    Discard,
}

/// A color attachment: one layer range of one mip level of a texture
#[derive(Debug)]
pub struct ColorAttachment<'a, T: ?Sized> {
    /// Target texture (must have `CANVAS` usage)
    pub texture: &'a T,
    /// First layer rendered to (the canvas renders `views` consecutive layers)
    pub layer: u32,
    /// Mip level rendered to
    pub level: u32,
    /// Load operation, clear value is RGBA
    pub load: LoadOp<[f32; 4]>,
}

impl<'a, T: ?Sized> ColorAttachment<'a, T> {
    /// Attachment on layer 0, mip 0, cleared to `color`
    pub fn cleared(texture: &'a T, color: [f32; 4]) -> Self {
        Self { texture, layer: 0, level: 0, load: LoadOp::Clear(color) }
    }
}

/// The depth/stencil attachment
#[derive(Debug)]
pub struct DepthAttachment<'a, T: ?Sized> {
    /// Depth texture (must use a depth format and have `CANVAS` usage)
    pub texture: &'a T,
    /// Depth load operation
    pub load: LoadOp<f32>,
    /// Stencil load operation (ignored for formats without stencil)
    pub stencil_load: LoadOp<u8>,
}

impl<'a, T: ?Sized> DepthAttachment<'a, T> {
    /// Attachment with depth cleared to `depth` and stencil cleared to 0
    pub fn cleared(texture: &'a T, depth: f32) -> Self {
        Self { texture, load: LoadOp::Clear(depth), stencil_load: LoadOp::Clear(0) }
    }
}

/// Descriptor for creating a canvas
#[derive(Debug)]
pub struct CanvasDesc<'a, T: ?Sized> {
    /// Color attachments (at most `MAX_COLOR_ATTACHMENTS`)
    pub color: Vec<ColorAttachment<'a, T>>,
    /// Optional depth/stencil attachment
    pub depth: Option<DepthAttachment<'a, T>>,
    /// Render area in pixels; every attachment must have exactly this size
    pub size: [u32; 2],
    /// Number of layers rendered at once (multiview), at least 1
    pub views: u32,
    /// Multisample count (1 = no MSAA)
    pub samples: u32,
    /// Debug label
    pub label: Option<&'a str>,
}

impl<'a, T: Texture> CanvasDesc<'a, T> {
    /// Single-view, single-sample canvas sized after the first attachment
    pub fn new(color: Vec<ColorAttachment<'a, T>>, depth: Option<DepthAttachment<'a, T>>) -> Self {
        let size = color
            .first()
            .map(|a| {
                let e = a.texture.info().mip_extent(a.level);
                [e[0], e[1]]
            })
            .or_else(|| {
                depth.as_ref().map(|d| {
                    let s = d.texture.info().size;
                    [s[0], s[1]]
                })
            })
            .unwrap_or([0, 0]);
        Self { color, depth, size, views: 1, samples: 1, label: None }
    }

    /// Set the multisample count
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    /// Set the view count
    pub fn with_views(mut self, views: u32) -> Self {
        self.views = views;
        self
    }

    /// Set the debug label
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }
}

/// Attachment formats and sample/view counts a pipeline must agree with
///
/// Two canvases with equal layouts are interchangeable for any pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderPassLayout {
    /// Format of each color attachment, in slot order
    pub color_formats: Vec<TextureFormat>,
    /// Format of the depth attachment, if any
    pub depth_format: Option<TextureFormat>,
    /// Multisample count
    pub samples: u32,
    /// View count
    pub views: u32,
}

/// Read-only properties of a created canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasInfo {
    /// Render area in pixels
    pub size: [u32; 2],
    /// Formats and counts
    pub layout: RenderPassLayout,
    /// Debug label
    pub label: Option<String>,
}

/// Canvas resource trait
///
/// Implemented by backend-specific canvas types (e.g., HeadlessCanvas).
pub trait Canvas: Send + Sync {
    /// Get the read-only properties of this canvas
    fn info(&self) -> &CanvasInfo;

    /// Release the render-pass object (attachment textures are untouched)
    fn destroy(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}
