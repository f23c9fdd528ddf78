/// Texture trait, texture descriptors, view descriptors and texture info

use bitflags::bitflags;

use crate::error::Result;

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Single 2D image (`size[2] == 1`, one layer)
    D2,
    /// Volume texture (`size[2]` is the depth, one layer)
    D3,
    /// Cubemap (square faces, six layers)
    Cube,
    /// 2D texture array (`layers` images of the same size)
    Array,
}

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    // Color formats
    Rgba8,
    Rgba4,
    R16f,
    Rg16f,
    Rgba16f,
    R32f,
    Rg32f,
    Rgba32f,
    Rgb10a2,
    Rg11b10f,

    // Depth/stencil formats
    D16,
    D32f,
    D24s8,

    // Compressed formats (4x4 blocks)
    /// DXT1
    Bc1,
    /// DXT3
    Bc2,
    /// DXT5
    Bc3,
    Astc4x4,
}

impl TextureFormat {
    /// Bytes per texel block (one pixel for uncompressed formats)
    pub fn block_size(&self) -> u32 {
        match self {
            TextureFormat::Rgba4 | TextureFormat::R16f | TextureFormat::D16 => 2,
            TextureFormat::Rgba8
            | TextureFormat::Rg16f
            | TextureFormat::R32f
            | TextureFormat::Rgb10a2
            | TextureFormat::Rg11b10f
            | TextureFormat::D32f
            | TextureFormat::D24s8 => 4,
            TextureFormat::Rgba16f | TextureFormat::Rg32f | TextureFormat::Bc1 => 8,
            TextureFormat::Rgba32f
            | TextureFormat::Bc2
            | TextureFormat::Bc3
            | TextureFormat::Astc4x4 => 16,
        }
    }

    /// Width and height of one texel block in pixels
    pub fn block_extent(&self) -> (u32, u32) {
        if self.is_compressed() { (4, 4) } else { (1, 1) }
    }

    /// Returns true for depth and depth/stencil formats
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::D16 | TextureFormat::D32f | TextureFormat::D24s8)
    }

    /// Returns true if the format carries a stencil component
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24s8)
    }

    /// Returns true for block-compressed formats
    pub fn is_compressed(&self) -> bool {
        self.is_dxt() || self.is_astc()
    }

    /// Returns true for the BC1-3 (DXT) family
    pub fn is_dxt(&self) -> bool {
        matches!(self, TextureFormat::Bc1 | TextureFormat::Bc2 | TextureFormat::Bc3)
    }

    /// Returns true for ASTC formats
    pub fn is_astc(&self) -> bool {
        matches!(self, TextureFormat::Astc4x4)
    }

    /// Bytes needed for a `width` x `height` region, rounded up to whole blocks
    pub fn region_size(&self, width: u32, height: u32) -> u64 {
        let (bw, bh) = self.block_extent();
        let blocks_x = width.div_ceil(bw) as u64;
        let blocks_y = height.div_ceil(bh) as u64;
        blocks_x * blocks_y * self.block_size() as u64
    }
}

bitflags! {
    /// Texture usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Sampled in shaders
        const SAMPLE   = 1 << 0;
        /// Canvas (render target) attachment
        const CANVAS   = 1 << 1;
        /// Storage image for compute
        const COMPUTE  = 1 << 2;
        /// Source of a copy
        const COPY_SRC = 1 << 3;
        /// Destination of a copy (including `Texture::write`)
        const COPY_DST = 1 << 4;
    }
}

// ===== TEXTURE DESC =====

/// Descriptor for creating a texture
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    /// Dimensionality
    pub kind: TextureType,
    /// Pixel format
    pub format: TextureFormat,
    /// Width, height, depth in pixels (depth is 1 unless `kind` is `D3`)
    pub size: [u32; 3],
    /// Number of layers (1 for `D2`/`D3`, 6 for `Cube`)
    pub layers: u32,
    /// Number of mip levels (1 = no mipmaps)
    pub mipmaps: u32,
    /// Usage flags
    pub usage: TextureUsage,
    /// Debug label
    pub label: Option<&'a str>,
}

impl<'a> TextureDesc<'a> {
    /// Descriptor for a single 2D texture with one mip level
    pub fn new_2d(format: TextureFormat, width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            kind: TextureType::D2,
            format,
            size: [width, height, 1],
            layers: 1,
            mipmaps: 1,
            usage,
            label: None,
        }
    }

    /// Descriptor for a 2D texture array
    pub fn new_array(
        format: TextureFormat,
        width: u32,
        height: u32,
        layers: u32,
        usage: TextureUsage,
    ) -> Self {
        Self {
            kind: TextureType::Array,
            layers,
            ..Self::new_2d(format, width, height, usage)
        }
    }

    /// Set the mip level count
    pub fn with_mipmaps(mut self, mipmaps: u32) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    /// Set the debug label
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }
}

/// Descriptor for creating a view of an existing texture
///
/// The view shares the source's memory. It must not outlive the source.
#[derive(Debug)]
pub struct TextureViewDesc<'a, T: ?Sized> {
    /// Texture whose storage is reinterpreted
    pub source: &'a T,
    /// Dimensionality of the view
    pub kind: TextureType,
    /// Format of the view (same block size as the source's format)
    pub format: TextureFormat,
    /// First source mip level visible through the view
    pub base_mipmap: u32,
    /// Number of mip levels in the view
    pub mipmap_count: u32,
    /// First source layer visible through the view
    pub base_layer: u32,
    /// Number of layers in the view
    pub layer_count: u32,
    /// Debug label
    pub label: Option<&'a str>,
}

impl<'a, T: Texture> TextureViewDesc<'a, T> {
    /// View covering every mip level and layer of `source`, same type and format
    pub fn whole(source: &'a T) -> Self {
        let info = source.info();
        Self {
            source,
            kind: info.kind,
            format: info.format,
            base_mipmap: 0,
            mipmap_count: info.mipmaps,
            base_layer: 0,
            layer_count: info.layers,
            label: None,
        }
    }

    /// 2D view of a single layer and a single mip level of `source`
    pub fn layer(source: &'a T, layer: u32, mipmap: u32) -> Self {
        Self {
            kind: TextureType::D2,
            base_mipmap: mipmap,
            mipmap_count: 1,
            base_layer: layer,
            layer_count: 1,
            ..Self::whole(source)
        }
    }
}

// ===== TEXTURE INFO =====

/// Read-only properties of a created texture or view
///
/// For a view, `size` is the extent of the view's first mip level and
/// `layers`/`mipmaps` are the view's own counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    /// Dimensionality
    pub kind: TextureType,
    /// Pixel format
    pub format: TextureFormat,
    /// Width, height, depth in pixels
    pub size: [u32; 3],
    /// Number of layers
    pub layers: u32,
    /// Number of mip levels
    pub mipmaps: u32,
    /// Usage flags
    pub usage: TextureUsage,
    /// Debug label
    pub label: Option<String>,
}

impl TextureInfo {
    /// Extent of mip level `mip` (depth only shrinks for 3D textures)
    pub fn mip_extent(&self, mip: u32) -> [u32; 3] {
        let shrink = |v: u32| (v >> mip).max(1);
        let depth = if self.kind == TextureType::D3 { shrink(self.size[2]) } else { self.size[2] };
        [shrink(self.size[0]), shrink(self.size[1]), depth]
    }

    /// Number of independently addressable 2D slices at mip level `mip`
    ///
    /// Layers for 2D/cube/array textures, depth slices for 3D textures.
    pub fn slice_count(&self, mip: u32) -> u32 {
        if self.kind == TextureType::D3 { self.mip_extent(mip)[2] } else { self.layers }
    }
}

/// Longest possible mip chain for a texture of `size`
pub fn max_mipmap_count(size: [u32; 3]) -> u32 {
    let largest = size[0].max(size[1]).max(size[2]).max(1);
    32 - largest.leading_zeros()
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
///
/// Implemented by backend-specific texture types (e.g., HeadlessTexture).
/// A single type covers both standalone textures and views.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;

    /// Returns true if this object is a view of another texture's memory
    fn is_view(&self) -> bool;

    /// Upload a region at mip level `mip`
    ///
    /// `offset` and `extent` are `[x, y, z, layer]`. For 3D textures `z`
    /// selects depth slices and the layer range must be `[0, 1)`; for every
    /// other type `z` must be `[0, 1)` and the 4th component selects layers.
    /// `data` must hold exactly the region's bytes, rows tightly packed.
    /// The region is validated as a whole: nothing is written on failure.
    fn write(&self, data: &[u8], offset: [u16; 4], extent: [u16; 4], mip: u16) -> Result<()>;

    /// Release the texture (for a view, only the view object)
    fn destroy(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
