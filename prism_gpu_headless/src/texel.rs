/// Texel encoding for clear values
///
/// Turns float clear colors and depth/stencil values into the byte layout
/// the headless backend stores for each format. Packed formats follow the
/// usual GPU conventions: RGB10A2 is `A2B10G10R10` (red in the low bits),
/// RG11B10F is `B10G11R11` unsigned floats, D24S8 is depth in the low 24 bits
/// and stencil in the high 8.

use half::f16;
use prism_gpu::TextureFormat;

fn unorm(value: f32, max: u32) -> u32 {
    (value.clamp(0.0, 1.0) * max as f32).round() as u32
}

/// Unsigned small float from an `f16`: drop the sign, keep 5 exponent bits and `mantissa` bits
fn small_float(value: f32, mantissa: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let bits = u32::from(f16::from_f32(value).to_bits()) & 0x7FFF;
    bits >> (10 - mantissa)
}

/// Encode one texel of a color format, or `None` for depth and compressed formats
pub fn encode_color(format: TextureFormat, color: [f32; 4]) -> Option<Vec<u8>> {
    let [r, g, b, a] = color;
    let bytes = match format {
        TextureFormat::Rgba8 => color.iter().map(|&c| unorm(c, 255) as u8).collect(),
        TextureFormat::Rgba4 => {
            let packed = (unorm(r, 15) << 12) | (unorm(g, 15) << 8) | (unorm(b, 15) << 4) | unorm(a, 15);
            (packed as u16).to_le_bytes().to_vec()
        }
        TextureFormat::R16f => f16::from_f32(r).to_le_bytes().to_vec(),
        TextureFormat::Rg16f => [r, g].iter().flat_map(|&c| f16::from_f32(c).to_le_bytes()).collect(),
        TextureFormat::Rgba16f => color.iter().flat_map(|&c| f16::from_f32(c).to_le_bytes()).collect(),
        TextureFormat::R32f => r.to_le_bytes().to_vec(),
        TextureFormat::Rg32f => [r, g].iter().flat_map(|c| c.to_le_bytes()).collect(),
        TextureFormat::Rgba32f => color.iter().flat_map(|c| c.to_le_bytes()).collect(),
        TextureFormat::Rgb10a2 => {
            let packed = unorm(r, 1023) | (unorm(g, 1023) << 10) | (unorm(b, 1023) << 20) | (unorm(a, 3) << 30);
            packed.to_le_bytes().to_vec()
        }
        TextureFormat::Rg11b10f => {
            let packed = small_float(r, 6) | (small_float(g, 6) << 11) | (small_float(b, 5) << 22);
            packed.to_le_bytes().to_vec()
        }
        TextureFormat::D16
        | TextureFormat::D32f
        | TextureFormat::D24s8
        | TextureFormat::Bc1
        | TextureFormat::Bc2
        | TextureFormat::Bc3
        | TextureFormat::Astc4x4 => return None,
    };
    Some(bytes)
}

/// Apply depth and/or stencil clears to a run of depth texels in place
///
/// `None` leaves that component untouched. Stencil is ignored for formats
/// without a stencil component.
pub fn clear_depth_stencil(format: TextureFormat, texels: &mut [u8], depth: Option<f32>, stencil: Option<u8>) {
    match format {
        TextureFormat::D16 => {
            if let Some(d) = depth {
                let value = (unorm(d, 0xFFFF) as u16).to_le_bytes();
                texels.chunks_exact_mut(2).for_each(|t| t.copy_from_slice(&value));
            }
        }
        TextureFormat::D32f => {
            if let Some(d) = depth {
                let value = d.to_le_bytes();
                texels.chunks_exact_mut(4).for_each(|t| t.copy_from_slice(&value));
            }
        }
        TextureFormat::D24s8 => {
            let depth_bits = depth.map(|d| unorm(d, 0x00FF_FFFF));
            for texel in texels.chunks_exact_mut(4) {
                let old = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
                let d = depth_bits.unwrap_or(old & 0x00FF_FFFF);
                let s = stencil.map(u32::from).unwrap_or(old >> 24);
                texel.copy_from_slice(&(d | (s << 24)).to_le_bytes());
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "texel_tests.rs"]
mod tests;
