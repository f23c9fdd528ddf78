//! Construction-time descriptor validation shared by backends
//!
//! Every function is pure: it inspects a descriptor (plus device features and
//! limits) and returns `Error::ValidationFailed` describing the first problem
//! found (`Error::InvalidResource` when a referenced resource is the wrong
//! kind). Backends call these before allocating anything and log the failure
//! through their context logger.

use rustc_hash::FxHashSet;

use crate::buffer::BufferDesc;
use crate::canvas::{Canvas, CanvasDesc, MAX_COLOR_ATTACHMENTS};
use crate::capabilities::{Features, Limits};
use crate::error::{Error, Result};
use crate::pipeline::{PipelineDesc, MAX_VERTEX_ATTRIBUTES, MAX_VERTEX_BUFFERS};
use crate::shader::{Shader, ShaderDesc, ShaderKind};
use crate::texture::{
    max_mipmap_count, Texture, TextureDesc, TextureInfo, TextureType, TextureUsage,
    TextureViewDesc,
};

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

fn fail<T>(message: String) -> Result<T> {
    Err(Error::ValidationFailed(message))
}

// ===== BUFFERS =====

/// Check a buffer descriptor
pub fn validate_buffer(desc: &BufferDesc) -> Result<()> {
    if desc.size == 0 {
        return fail("buffer size must be greater than zero".to_string());
    }
    if desc.usage.is_empty() {
        return fail("buffer usage must not be empty".to_string());
    }
    if let Some(data) = desc.data {
        if data.len() as u64 > desc.size {
            return fail(format!(
                "initial data ({} bytes) is larger than the buffer ({} bytes)",
                data.len(),
                desc.size
            ));
        }
    }
    Ok(())
}

/// Check that `[offset, offset + size)` is a non-empty range inside a buffer of `buffer_size` bytes
pub fn validate_buffer_range(buffer_size: u64, offset: u64, size: u64) -> Result<()> {
    if size == 0 {
        return fail("mapped range must not be empty".to_string());
    }
    match offset.checked_add(size) {
        Some(end) if end <= buffer_size => Ok(()),
        _ => fail(format!(
            "range [{offset}, {offset} + {size}) exceeds buffer size {buffer_size}"
        )),
    }
}

// ===== TEXTURES =====

/// Check a texture descriptor against device features and limits
pub fn validate_texture(desc: &TextureDesc, features: &Features, limits: &Limits) -> Result<()> {
    let [width, height, depth] = desc.size;

    if width == 0 || height == 0 || depth == 0 {
        return fail(format!("texture size {:?} has a zero dimension", desc.size));
    }
    if desc.layers == 0 {
        return fail("texture layer count must be at least 1".to_string());
    }
    if desc.usage.is_empty() {
        return fail("texture usage must not be empty".to_string());
    }

    match desc.kind {
        TextureType::D2 => {
            if depth != 1 || desc.layers != 1 {
                return fail("2D textures must have depth 1 and a single layer".to_string());
            }
        }
        TextureType::D3 => {
            if desc.layers != 1 {
                return fail("3D textures must have a single layer".to_string());
            }
        }
        TextureType::Cube => {
            if width != height || depth != 1 || desc.layers != 6 {
                return fail(format!(
                    "cubemaps must have square faces and 6 layers (got {}x{}x{}, {} layers)",
                    width, height, depth, desc.layers
                ));
            }
        }
        TextureType::Array => {
            if depth != 1 {
                return fail("array textures must have depth 1".to_string());
            }
        }
    }

    if width > limits.texture_size || height > limits.texture_size || depth > limits.texture_size {
        return fail(format!(
            "texture size {:?} exceeds the device limit of {}",
            desc.size, limits.texture_size
        ));
    }

    let max_mips = max_mipmap_count(desc.size);
    if desc.mipmaps == 0 || desc.mipmaps > max_mips {
        return fail(format!(
            "mipmap count {} is outside 1..={} for size {:?}",
            desc.mipmaps, max_mips, desc.size
        ));
    }

    if desc.format.is_dxt() && !features.dxt {
        return Err(Error::UnsupportedFeature(format!("{:?} requires DXT support", desc.format)));
    }
    if desc.format.is_astc() && !features.astc {
        return Err(Error::UnsupportedFeature(format!("{:?} requires ASTC support", desc.format)));
    }
    if desc.format.is_compressed() {
        let (bw, bh) = desc.format.block_extent();
        if desc.kind == TextureType::D3 {
            return fail("compressed formats are not supported for 3D textures".to_string());
        }
        if width % bw != 0 || height % bh != 0 {
            return fail(format!(
                "{:?} textures must be a multiple of {}x{} pixels (got {}x{})",
                desc.format, bw, bh, width, height
            ));
        }
        if desc.usage.intersects(TextureUsage::CANVAS | TextureUsage::COMPUTE) {
            return fail(format!("{:?} textures cannot be rendered or written by compute", desc.format));
        }
    }

    if desc.format.is_depth() && desc.kind == TextureType::D3 {
        return fail("depth formats are not supported for 3D textures".to_string());
    }

    Ok(())
}

/// Check a texture view descriptor against its source
pub fn validate_texture_view<T: Texture + ?Sized>(desc: &TextureViewDesc<'_, T>) -> Result<()> {
    if desc.source.is_view() {
        return Err(Error::InvalidResource("cannot create a view of a texture view".to_string()));
    }
    let source = desc.source.info();

    if desc.mipmap_count == 0 || desc.layer_count == 0 {
        return fail("texture views must cover at least one mip level and one layer".to_string());
    }
    match desc.base_mipmap.checked_add(desc.mipmap_count) {
        Some(end) if end <= source.mipmaps => {}
        _ => {
            return fail(format!(
                "view mip range {}+{} exceeds the source's {} mip levels",
                desc.base_mipmap, desc.mipmap_count, source.mipmaps
            ))
        }
    }
    match desc.base_layer.checked_add(desc.layer_count) {
        Some(end) if end <= source.layers => {}
        _ => {
            return fail(format!(
                "view layer range {}+{} exceeds the source's {} layers",
                desc.base_layer, desc.layer_count, source.layers
            ))
        }
    }

    if desc.format.block_size() != source.format.block_size()
        || desc.format.block_extent() != source.format.block_extent()
    {
        return fail(format!(
            "view format {:?} is not size-compatible with {:?}",
            desc.format, source.format
        ));
    }

    let from_3d = source.kind == TextureType::D3;
    let to_3d = desc.kind == TextureType::D3;
    if from_3d != to_3d {
        return fail("3D textures can only be viewed as 3D textures".to_string());
    }
    match desc.kind {
        TextureType::D2 if desc.layer_count != 1 => {
            fail(format!("2D views cover exactly one layer (got {})", desc.layer_count))
        }
        TextureType::Cube if desc.layer_count != 6 => {
            fail(format!("cube views cover exactly 6 layers (got {})", desc.layer_count))
        }
        _ => Ok(()),
    }
}

/// Check a region write/read and return the region's byte size
///
/// `offset` and `extent` are `[x, y, z, layer]`; see `Texture::write`.
pub fn validate_texture_region(
    info: &TextureInfo,
    offset: [u16; 4],
    extent: [u16; 4],
    mip: u16,
) -> Result<u64> {
    let mip = u32::from(mip);
    if mip >= info.mipmaps {
        return fail(format!("mip level {} out of range (texture has {})", mip, info.mipmaps));
    }
    if extent.contains(&0) {
        return fail(format!("region extent {:?} has a zero component", extent));
    }

    let [mw, mh, md] = info.mip_extent(mip);
    let (layers, depth) = if info.kind == TextureType::D3 { (1, md) } else { (info.layers, 1) };
    let bounds = [mw, mh, depth, layers];

    for axis in 0..4 {
        let end = u32::from(offset[axis]) + u32::from(extent[axis]);
        if end > bounds[axis] {
            return fail(format!(
                "region offset {:?} extent {:?} exceeds {:?} at mip {}",
                offset, extent, bounds, mip
            ));
        }
    }

    if info.format.is_compressed() {
        let (bw, bh) = info.format.block_extent();
        let aligned = |start: u16, len: u16, block: u32, limit: u32| {
            let end = u32::from(start) + u32::from(len);
            u32::from(start) % block == 0 && (end % block == 0 || end == limit)
        };
        if !aligned(offset[0], extent[0], bw, mw) || !aligned(offset[1], extent[1], bh, mh) {
            return fail(format!(
                "region offset {:?} extent {:?} is not aligned to {}x{} blocks",
                offset, extent, bw, bh
            ));
        }
    }

    let slice = info.format.region_size(u32::from(extent[0]), u32::from(extent[1]));
    Ok(slice * u64::from(extent[2]) * u64::from(extent[3]))
}

// ===== CANVASES =====

/// Check a canvas descriptor against device limits
pub fn validate_canvas<T: Texture + ?Sized>(desc: &CanvasDesc<'_, T>, limits: &Limits) -> Result<()> {
    if desc.color.is_empty() && desc.depth.is_none() {
        return fail("canvas needs at least one attachment".to_string());
    }
    if desc.color.len() > MAX_COLOR_ATTACHMENTS {
        return fail(format!(
            "canvas has {} color attachments (max {})",
            desc.color.len(),
            MAX_COLOR_ATTACHMENTS
        ));
    }

    let [width, height] = desc.size;
    if width == 0 || height == 0 {
        return fail(format!("canvas size {:?} has a zero dimension", desc.size));
    }
    if width > limits.framebuffer_size[0] || height > limits.framebuffer_size[1] {
        return fail(format!(
            "canvas size {:?} exceeds the device limit {:?}",
            desc.size, limits.framebuffer_size
        ));
    }
    if desc.views == 0 {
        return fail("canvas view count must be at least 1".to_string());
    }
    if !desc.samples.is_power_of_two() || desc.samples > limits.framebuffer_samples {
        return fail(format!(
            "sample count {} must be a power of two no larger than {}",
            desc.samples, limits.framebuffer_samples
        ));
    }

    for (slot, attachment) in desc.color.iter().enumerate() {
        let info = attachment.texture.info();
        if info.format.is_depth() || info.format.is_compressed() {
            return fail(format!("color attachment {} has non-color format {:?}", slot, info.format));
        }
        check_attachment(info, attachment.level, attachment.layer, desc, &format!("color attachment {slot}"))?;
    }

    if let Some(depth) = &desc.depth {
        let info = depth.texture.info();
        if !info.format.is_depth() {
            return fail(format!("depth attachment has non-depth format {:?}", info.format));
        }
        check_attachment(info, 0, 0, desc, "depth attachment")?;
    }

    Ok(())
}

fn check_attachment<T: ?Sized>(
    info: &TextureInfo,
    level: u32,
    layer: u32,
    desc: &CanvasDesc<'_, T>,
    what: &str,
) -> Result<()> {
    if !info.usage.contains(TextureUsage::CANVAS) {
        return fail(format!("{what} texture was not created with CANVAS usage"));
    }
    if level >= info.mipmaps {
        return fail(format!("{what} mip level {level} out of range"));
    }
    let [w, h, _] = info.mip_extent(level);
    if [w, h] != desc.size {
        return fail(format!(
            "{what} size {:?} does not match canvas size {:?}",
            [w, h],
            desc.size
        ));
    }
    let slices = info.slice_count(level);
    match layer.checked_add(desc.views) {
        Some(end) if end <= slices => Ok(()),
        _ => fail(format!(
            "{what} layers {}+{} exceed the texture's {} layers",
            layer, desc.views, slices
        )),
    }
}

// ===== SHADERS =====

/// Check which stages are present and return the resulting shader kind
pub fn validate_shader_stages(desc: &ShaderDesc) -> Result<ShaderKind> {
    match (desc.vertex.is_some(), desc.fragment.is_some(), desc.compute.is_some()) {
        (true, true, false) => Ok(ShaderKind::Graphics),
        (false, false, true) => Ok(ShaderKind::Compute),
        (true, false, false) | (false, true, false) => {
            fail("graphics shaders need both a vertex and a fragment stage".to_string())
        }
        (false, false, false) => fail("shader has no stages".to_string()),
        _ => fail("compute stages cannot be combined with graphics stages".to_string()),
    }
}

/// Check the SPIR-V container and decode it into words
pub fn decode_spirv(code: &[u8]) -> Result<Vec<u32>> {
    if code.is_empty() {
        return fail("shader bytecode is empty".to_string());
    }
    if code.len() % 4 != 0 {
        return fail(format!("SPIR-V length {} is not a multiple of 4", code.len()));
    }
    let words: Vec<u32> = code
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect();
    if words.len() < 5 || words[0] != SPIRV_MAGIC {
        return fail("bytecode is not a SPIR-V module (bad header)".to_string());
    }
    Ok(words)
}

// ===== PIPELINES =====

/// Check a pipeline descriptor
///
/// Attachment format compatibility with the canvas later bound at draw time
/// is not checked here.
pub fn validate_pipeline<S, C>(desc: &PipelineDesc<'_, S, C>) -> Result<()>
where
    S: Shader + ?Sized,
    C: Canvas + ?Sized,
{
    if desc.shader.kind() != ShaderKind::Graphics {
        return fail("pipelines need a graphics shader".to_string());
    }

    let layout = &desc.vertex;
    if layout.buffers.len() > MAX_VERTEX_BUFFERS {
        return fail(format!(
            "{} vertex buffers declared (max {})",
            layout.buffers.len(),
            MAX_VERTEX_BUFFERS
        ));
    }
    if layout.attributes.len() > MAX_VERTEX_ATTRIBUTES {
        return fail(format!(
            "{} vertex attributes declared (max {})",
            layout.attributes.len(),
            MAX_VERTEX_ATTRIBUTES
        ));
    }

    let mut locations = FxHashSet::default();
    for attribute in &layout.attributes {
        if attribute.location as usize >= MAX_VERTEX_ATTRIBUTES {
            return fail(format!("attribute location {} out of range", attribute.location));
        }
        if !locations.insert(attribute.location) {
            return fail(format!("attribute location {} declared twice", attribute.location));
        }
        let Some(buffer) = layout.buffers.get(attribute.buffer as usize) else {
            return fail(format!(
                "attribute {} references undeclared vertex buffer {}",
                attribute.location, attribute.buffer
            ));
        };
        let end = attribute.offset.saturating_add(attribute.format.size_bytes());
        if buffer.stride != 0 && end > u32::from(buffer.stride) {
            return fail(format!(
                "attribute {} ({:?} at offset {}) overruns stride {}",
                attribute.location, attribute.format, attribute.offset, buffer.stride
            ));
        }
    }

    if desc.multisample.alpha_to_coverage && desc.canvas.info().layout.samples <= 1 {
        return fail("alpha-to-coverage requires a multisampled canvas".to_string());
    }

    Ok(())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
