/// HeadlessTexture - host-memory implementation of the Texture trait
///
/// A standalone texture owns a `TextureStorage`; a view holds another
/// `Arc` of the same storage plus the mip/layer window it exposes. The
/// storage counts live views so destroying a source with views still alive
/// trips a debug assertion.
///
/// Storage layout: mip levels back to back, each mip a run of 2D slices
/// (layers, or depth slices for 3D textures), each slice rows of texel blocks
/// tightly packed.

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use prism_gpu::validation::validate_texture_region;
use prism_gpu::{gpu_error, gpu_trace};
use prism_gpu::{
    Error, Result, Texture, TextureDesc, TextureFormat, TextureInfo, TextureType, TextureViewDesc,
};

use crate::headless_buffer::allocate;
use crate::headless_context::{HeadlessContext, SOURCE};
use crate::registry::{ResourceKey, ResourceKind};

/// Pixel memory shared by a texture and its views
pub(crate) struct TextureStorage {
    /// Properties of the texture that allocated the memory
    info: TextureInfo,
    /// Byte offset of each mip level
    mip_offsets: Vec<u64>,
    /// Pixel bytes
    bytes: RwLock<Vec<u8>>,
    /// Live views of this storage
    views: AtomicU32,
}

impl TextureStorage {
    fn new(info: TextureInfo) -> Result<Self> {
        let mut mip_offsets = Vec::with_capacity(info.mipmaps as usize);
        let mut total = 0u64;
        for mip in 0..info.mipmaps {
            mip_offsets.push(total);
            total = Self::slice_size_of(&info, mip)
                .checked_mul(u64::from(info.slice_count(mip)))
                .and_then(|size| total.checked_add(size))
                .ok_or(Error::OutOfMemory)?;
        }
        let bytes = allocate(total, 0)?;
        Ok(Self { info, mip_offsets, bytes: RwLock::new(bytes), views: AtomicU32::new(0) })
    }

    fn slice_size_of(info: &TextureInfo, mip: u32) -> u64 {
        let [w, h, _] = info.mip_extent(mip);
        info.format.region_size(w, h)
    }

    /// Properties of the texture that allocated the memory
    pub(crate) fn info(&self) -> &TextureInfo {
        &self.info
    }

    /// Byte range of `slices` consecutive 2D slices starting at `first_slice` of `mip`
    pub(crate) fn slice_range(&self, mip: u32, first_slice: u32, slices: u32) -> Range<usize> {
        let slice_size = Self::slice_size_of(&self.info, mip);
        let start = self.mip_offsets[mip as usize] + slice_size * u64::from(first_slice);
        start as usize..(start + slice_size * u64::from(slices)) as usize
    }

    /// Run `f` with exclusive access to the pixel bytes
    pub(crate) fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.bytes.write())
    }

    /// Storage and packed-data byte ranges of every block row in `region`
    fn rows(&self, region: &Region) -> Vec<(Range<usize>, Range<usize>)> {
        let format = self.info.format;
        let (bw, bh) = format.block_extent();
        let block = format.block_size() as usize;
        let [mip_w, _, _] = self.info.mip_extent(region.mip);

        let row_pitch = mip_w.div_ceil(bw) as usize * block;
        let row_len = region.size[0].div_ceil(bw) as usize * block;
        let rows = region.size[1].div_ceil(bh) as usize;
        let x = (region.origin[0] / bw) as usize * block;
        let y = (region.origin[1] / bh) as usize;

        let mut ranges = Vec::with_capacity(region.slices as usize * rows);
        for slice in 0..region.slices {
            let base = self.slice_range(region.mip, region.first_slice + slice, 1).start;
            for row in 0..rows {
                let stored = base + (y + row) * row_pitch + x;
                let packed = (slice as usize * rows + row) * row_len;
                ranges.push((stored..stored + row_len, packed..packed + row_len));
            }
        }
        ranges
    }

    fn upload(&self, region: &Region, data: &[u8]) {
        let mut bytes = self.bytes.write();
        for (stored, packed) in self.rows(region) {
            bytes[stored].copy_from_slice(&data[packed]);
        }
    }

    fn download(&self, region: &Region, data: &mut [u8]) {
        let bytes = self.bytes.read();
        for (stored, packed) in self.rows(region) {
            data[packed].copy_from_slice(&bytes[stored]);
        }
    }
}

/// A validated region translated into storage coordinates
struct Region {
    mip: u32,
    origin: [u32; 2],
    size: [u32; 2],
    first_slice: u32,
    slices: u32,
}

/// One mip level and slice range of a texture, as used by canvas attachments
#[derive(Clone)]
pub(crate) struct AttachmentTarget {
    pub storage: Arc<TextureStorage>,
    /// Format the attachment is rendered as (the view's, not the storage's)
    pub format: TextureFormat,
    pub mip: u32,
    pub first_slice: u32,
    pub slices: u32,
}

/// Host-memory texture or texture view
pub struct HeadlessTexture {
    /// Shared device context
    ctx: Arc<HeadlessContext>,
    /// Registry key
    key: ResourceKey,
    /// Read-only properties (the view's own for a view)
    info: TextureInfo,
    /// Pixel memory
    storage: Arc<TextureStorage>,
    /// First storage mip level visible through this object
    base_mipmap: u32,
    /// First storage layer visible through this object
    base_layer: u32,
    /// True for views
    view: bool,
}

impl HeadlessTexture {
    /// Allocate a texture
    pub(crate) fn new(ctx: Arc<HeadlessContext>, desc: &TextureDesc) -> Result<Self> {
        let info = TextureInfo {
            kind: desc.kind,
            format: desc.format,
            size: desc.size,
            layers: desc.layers,
            mipmaps: desc.mipmaps,
            usage: desc.usage,
            label: desc.label.map(str::to_string),
        };
        let storage = Arc::new(TextureStorage::new(info.clone())?);

        let key = ctx.register(ResourceKind::Texture, desc.label);
        gpu_trace!(
            ctx.logger,
            SOURCE,
            "Created texture {:?} ({:?} {:?} {:?}, {} layers, {} mips)",
            desc.label, desc.kind, desc.format, desc.size, desc.layers, desc.mipmaps
        );

        Ok(Self { ctx, key, info, storage, base_mipmap: 0, base_layer: 0, view: false })
    }

    /// Create a view sharing the source's storage (descriptor already validated)
    pub(crate) fn new_view(ctx: Arc<HeadlessContext>, desc: &TextureViewDesc<'_, HeadlessTexture>) -> Self {
        let source = desc.source;
        let info = TextureInfo {
            kind: desc.kind,
            format: desc.format,
            size: source.info.mip_extent(desc.base_mipmap),
            layers: desc.layer_count,
            mipmaps: desc.mipmap_count,
            usage: source.info.usage,
            label: desc.label.map(str::to_string),
        };
        source.storage.views.fetch_add(1, Ordering::AcqRel);

        let key = ctx.register(ResourceKind::TextureView, desc.label);
        gpu_trace!(
            ctx.logger,
            SOURCE,
            "Created view {:?} of {:?} (mips {}+{}, layers {}+{})",
            desc.label, source.info.label, desc.base_mipmap, desc.mipmap_count, desc.base_layer, desc.layer_count
        );

        Self {
            ctx,
            key,
            info,
            storage: Arc::clone(&source.storage),
            base_mipmap: source.base_mipmap + desc.base_mipmap,
            base_layer: source.base_layer + desc.base_layer,
            view: true,
        }
    }

    /// Number of live views of this texture's memory
    pub fn view_count(&self) -> u32 {
        self.storage.views.load(Ordering::Acquire)
    }

    /// True if both objects address the same pixel memory
    pub fn shares_storage_with(&self, other: &HeadlessTexture) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Read a region back (same addressing as `Texture::write`)
    pub fn read(&self, offset: [u16; 4], extent: [u16; 4], mip: u16) -> Result<Vec<u8>> {
        let (region, size) = self
            .region(offset, extent, mip)
            .inspect_err(|e| gpu_error!(self.ctx.logger, SOURCE, "Texture read failed: {}", e))?;
        let mut data = allocate(size, 0)?;
        self.storage.download(&region, &mut data);
        Ok(data)
    }

    /// Storage window used by a canvas attachment
    pub(crate) fn attachment_target(&self, level: u32, layer: u32, views: u32) -> AttachmentTarget {
        let first_slice = if self.info.kind == TextureType::D3 { layer } else { self.base_layer + layer };
        AttachmentTarget {
            storage: Arc::clone(&self.storage),
            format: self.info.format,
            mip: self.base_mipmap + level,
            first_slice,
            slices: views,
        }
    }

    fn region(&self, offset: [u16; 4], extent: [u16; 4], mip: u16) -> Result<(Region, u64)> {
        let size = validate_texture_region(&self.info, offset, extent, mip)?;
        let (first_slice, slices) = if self.info.kind == TextureType::D3 {
            (u32::from(offset[2]), u32::from(extent[2]))
        } else {
            (self.base_layer + u32::from(offset[3]), u32::from(extent[3]))
        };
        let region = Region {
            mip: self.base_mipmap + u32::from(mip),
            origin: [u32::from(offset[0]), u32::from(offset[1])],
            size: [u32::from(extent[0]), u32::from(extent[1])],
            first_slice,
            slices,
        };
        Ok((region, size))
    }
}

impl Texture for HeadlessTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn is_view(&self) -> bool {
        self.view
    }

    fn write(&self, data: &[u8], offset: [u16; 4], extent: [u16; 4], mip: u16) -> Result<()> {
        let result = self.region(offset, extent, mip).and_then(|(region, size)| {
            if data.len() as u64 != size {
                return Err(Error::ValidationFailed(format!(
                    "texture write expects {} bytes, got {}",
                    size,
                    data.len()
                )));
            }
            Ok(region)
        });
        let region =
            result.inspect_err(|e| gpu_error!(self.ctx.logger, SOURCE, "Texture write failed: {}", e))?;

        self.storage.upload(&region, data);
        Ok(())
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        if self.view {
            self.storage.views.fetch_sub(1, Ordering::AcqRel);
        } else {
            debug_assert!(
                self.storage.views.load(Ordering::Acquire) == 0,
                "texture {:?} destroyed while views of it are still alive",
                self.info.label
            );
        }
        self.ctx.unregister(self.key);
    }
}
