//! Unit tests for texel.rs
//!
//! Clear-value encoding for every storable format.

use half::f16;
use prism_gpu::TextureFormat;

use crate::texel::{clear_depth_stencil, encode_color};

#[test]
fn test_encoded_size_matches_block_size() {
    let formats = [
        TextureFormat::Rgba8,
        TextureFormat::Rgba4,
        TextureFormat::R16f,
        TextureFormat::Rg16f,
        TextureFormat::Rgba16f,
        TextureFormat::R32f,
        TextureFormat::Rg32f,
        TextureFormat::Rgba32f,
        TextureFormat::Rgb10a2,
        TextureFormat::Rg11b10f,
    ];
    for format in formats {
        let texel = encode_color(format, [0.25, 0.5, 0.75, 1.0]).unwrap();
        assert_eq!(texel.len() as u32, format.block_size(), "{:?}", format);
    }
}

#[test]
fn test_rgba8_clamps_and_rounds() {
    assert_eq!(encode_color(TextureFormat::Rgba8, [1.0, 0.0, 0.5, 2.0]).unwrap(), vec![255, 0, 128, 255]);
    assert_eq!(encode_color(TextureFormat::Rgba8, [-1.0, 0.0, 0.0, 0.0]).unwrap(), vec![0, 0, 0, 0]);
}

#[test]
fn test_rgba4_packing() {
    let texel = encode_color(TextureFormat::Rgba4, [1.0, 0.0, 0.0, 1.0]).unwrap();
    assert_eq!(u16::from_le_bytes([texel[0], texel[1]]), 0xF00F);
}

#[test]
fn test_half_float_formats() {
    let texel = encode_color(TextureFormat::Rg16f, [1.5, -2.0, 0.0, 0.0]).unwrap();
    assert_eq!(f16::from_le_bytes([texel[0], texel[1]]).to_f32(), 1.5);
    assert_eq!(f16::from_le_bytes([texel[2], texel[3]]).to_f32(), -2.0);
}

#[test]
fn test_float_formats() {
    let texel = encode_color(TextureFormat::Rgba32f, [0.1, 0.2, 0.3, 0.4]).unwrap();
    assert_eq!(f32::from_le_bytes([texel[12], texel[13], texel[14], texel[15]]), 0.4);
}

#[test]
fn test_rgb10a2_packing() {
    let texel = encode_color(TextureFormat::Rgb10a2, [1.0, 0.0, 1.0, 1.0]).unwrap();
    let packed = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
    assert_eq!(packed & 0x3FF, 1023);
    assert_eq!((packed >> 10) & 0x3FF, 0);
    assert_eq!((packed >> 20) & 0x3FF, 1023);
    assert_eq!(packed >> 30, 3);
}

#[test]
fn test_rg11b10f_one() {
    // 1.0 = exponent 15, mantissa 0
    let texel = encode_color(TextureFormat::Rg11b10f, [1.0, 1.0, 1.0, 0.0]).unwrap();
    let packed = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
    assert_eq!(packed & 0x7FF, 15 << 6);
    assert_eq!((packed >> 11) & 0x7FF, 15 << 6);
    assert_eq!(packed >> 22, 15 << 5);
}

#[test]
fn test_rg11b10f_negative_is_zero() {
    let texel = encode_color(TextureFormat::Rg11b10f, [-1.0, 0.0, 0.0, 0.0]).unwrap();
    assert_eq!(texel, vec![0, 0, 0, 0]);
}

#[test]
fn test_depth_and_compressed_have_no_color_encoding() {
    assert!(encode_color(TextureFormat::D32f, [0.0; 4]).is_none());
    assert!(encode_color(TextureFormat::Bc1, [0.0; 4]).is_none());
}

#[test]
fn test_clear_d32f_and_d16() {
    let mut texels = vec![0u8; 8];
    clear_depth_stencil(TextureFormat::D32f, &mut texels, Some(1.0), None);
    assert_eq!(&texels[4..8], &1.0f32.to_le_bytes());

    let mut texels = vec![0u8; 4];
    clear_depth_stencil(TextureFormat::D16, &mut texels, Some(1.0), Some(7));
    assert_eq!(texels, vec![0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn test_clear_d24s8_components_independently() {
    let mut texels = vec![0u8; 4];
    clear_depth_stencil(TextureFormat::D24s8, &mut texels, Some(1.0), Some(0x42));
    assert_eq!(u32::from_le_bytes([texels[0], texels[1], texels[2], texels[3]]), 0x42FF_FFFF);

    // Depth only: stencil survives
    clear_depth_stencil(TextureFormat::D24s8, &mut texels, Some(0.0), None);
    assert_eq!(u32::from_le_bytes([texels[0], texels[1], texels[2], texels[3]]), 0x4200_0000);

    // Stencil only: depth survives
    clear_depth_stencil(TextureFormat::D24s8, &mut texels, None, Some(1));
    assert_eq!(u32::from_le_bytes([texels[0], texels[1], texels[2], texels[3]]), 0x0100_0000);
}
