//! Unit tests for texture.rs
//!
//! Format block sizes, mip extents and descriptor helpers.

use crate::texture::{
    max_mipmap_count, TextureDesc, TextureFormat, TextureInfo, TextureType, TextureUsage,
};

fn info(kind: TextureType, size: [u32; 3], layers: u32, mipmaps: u32) -> TextureInfo {
    TextureInfo {
        kind,
        format: TextureFormat::Rgba8,
        size,
        layers,
        mipmaps,
        usage: TextureUsage::SAMPLE,
        label: None,
    }
}

// ============================================================================
// FORMAT TESTS
// ============================================================================

#[test]
fn test_block_size_color_formats() {
    assert_eq!(TextureFormat::Rgba8.block_size(), 4);
    assert_eq!(TextureFormat::Rgba4.block_size(), 2);
    assert_eq!(TextureFormat::R16f.block_size(), 2);
    assert_eq!(TextureFormat::Rg16f.block_size(), 4);
    assert_eq!(TextureFormat::Rgba16f.block_size(), 8);
    assert_eq!(TextureFormat::R32f.block_size(), 4);
    assert_eq!(TextureFormat::Rg32f.block_size(), 8);
    assert_eq!(TextureFormat::Rgba32f.block_size(), 16);
    assert_eq!(TextureFormat::Rgb10a2.block_size(), 4);
    assert_eq!(TextureFormat::Rg11b10f.block_size(), 4);
}

#[test]
fn test_block_size_depth_and_compressed_formats() {
    assert_eq!(TextureFormat::D16.block_size(), 2);
    assert_eq!(TextureFormat::D32f.block_size(), 4);
    assert_eq!(TextureFormat::D24s8.block_size(), 4);
    assert_eq!(TextureFormat::Bc1.block_size(), 8);
    assert_eq!(TextureFormat::Bc3.block_size(), 16);
    assert_eq!(TextureFormat::Astc4x4.block_size(), 16);
}

#[test]
fn test_format_classification() {
    assert!(TextureFormat::D24s8.is_depth());
    assert!(TextureFormat::D24s8.has_stencil());
    assert!(!TextureFormat::D32f.has_stencil());
    assert!(!TextureFormat::Rgba8.is_depth());
    assert!(TextureFormat::Bc2.is_dxt());
    assert!(TextureFormat::Astc4x4.is_astc());
    assert!(TextureFormat::Astc4x4.is_compressed());
    assert!(!TextureFormat::Rgba32f.is_compressed());
}

#[test]
fn test_region_size_rounds_up_to_blocks() {
    assert_eq!(TextureFormat::Rgba8.region_size(256, 256), 262_144);
    // 5x5 pixels of BC1 = 2x2 blocks of 8 bytes
    assert_eq!(TextureFormat::Bc1.region_size(5, 5), 32);
    assert_eq!(TextureFormat::Astc4x4.region_size(4, 4), 16);
}

// ============================================================================
// MIP EXTENT TESTS
// ============================================================================

#[test]
fn test_max_mipmap_count() {
    assert_eq!(max_mipmap_count([1, 1, 1]), 1);
    assert_eq!(max_mipmap_count([256, 256, 1]), 9);
    assert_eq!(max_mipmap_count([1024, 512, 1]), 11);
    assert_eq!(max_mipmap_count([3, 1, 1]), 2);
}

#[test]
fn test_mip_extent_2d_keeps_depth() {
    let tex = info(TextureType::Array, [64, 32, 1], 4, 7);
    assert_eq!(tex.mip_extent(0), [64, 32, 1]);
    assert_eq!(tex.mip_extent(1), [32, 16, 1]);
    assert_eq!(tex.mip_extent(6), [1, 1, 1]);
    assert_eq!(tex.slice_count(3), 4);
}

#[test]
fn test_mip_extent_3d_shrinks_depth() {
    let tex = info(TextureType::D3, [16, 16, 8], 1, 5);
    assert_eq!(tex.mip_extent(1), [8, 8, 4]);
    assert_eq!(tex.mip_extent(4), [1, 1, 1]);
    assert_eq!(tex.slice_count(0), 8);
    assert_eq!(tex.slice_count(2), 2);
}

// ============================================================================
// DESCRIPTOR HELPERS
// ============================================================================

#[test]
fn test_texture_desc_helpers() {
    let desc = TextureDesc::new_array(TextureFormat::Rgba8, 128, 64, 3, TextureUsage::SAMPLE)
        .with_mipmaps(4)
        .with_label("atlas");

    assert_eq!(desc.kind, TextureType::Array);
    assert_eq!(desc.size, [128, 64, 1]);
    assert_eq!(desc.layers, 3);
    assert_eq!(desc.mipmaps, 4);
    assert_eq!(desc.label, Some("atlas"));
}
