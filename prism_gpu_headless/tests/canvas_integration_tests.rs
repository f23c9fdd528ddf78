//! Integration tests for headless canvases and attachment load operations
//!
//! Run with: cargo test --test canvas_integration_tests


use prism_gpu::{
    Canvas, CanvasDesc, ColorAttachment, DepthAttachment, Device, Error, LoadOp, Texture,
    TextureDesc, TextureFormat, TextureUsage, TextureViewDesc,
};
use prism_gpu_headless::{HeadlessCanvas, HeadlessDevice, HeadlessTexture};
use test_utils::debug_device;

fn target(device: &mut HeadlessDevice, format: TextureFormat, size: u32) -> HeadlessTexture {
    device
        .create_texture(&TextureDesc::new_2d(format, size, size, TextureUsage::CANVAS | TextureUsage::SAMPLE))
        .unwrap()
}

/// Record and complete one frame with an empty render pass on `canvas`
fn run_empty_pass(device: &mut HeadlessDevice, canvas: &HeadlessCanvas) {
    device.frame_wait();
    device.render_begin(canvas);
    device.render_finish();
    device.frame_finish();
    device.wait_idle();
}

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_canvas_info_reflects_attachments() {
    let (mut device, _logger) = debug_device();
    let color = target(&mut device, TextureFormat::Rgba8, 16);
    let depth = target(&mut device, TextureFormat::D32f, 16);

    let canvas = device
        .create_canvas(
            &CanvasDesc::new(
                vec![ColorAttachment::cleared(&color, [0.0; 4])],
                Some(DepthAttachment::cleared(&depth, 1.0)),
            )
            .with_label("main"),
        )
        .unwrap();

    let info = canvas.info();
    assert_eq!(info.size, [16, 16]);
    assert_eq!(info.layout.color_formats, vec![TextureFormat::Rgba8]);
    assert_eq!(info.layout.depth_format, Some(TextureFormat::D32f));
    assert_eq!(info.layout.samples, 1);
    assert_eq!(info.layout.views, 1);
    assert_eq!(info.label.as_deref(), Some("main"));
}

#[test]
fn test_mismatched_attachment_sizes_are_rejected() {
    let (mut device, _logger) = debug_device();
    let color = target(&mut device, TextureFormat::Rgba8, 4);
    let depth = target(&mut device, TextureFormat::D32f, 8);

    let result = device.create_canvas(&CanvasDesc::new(
        vec![ColorAttachment::cleared(&color, [0.0; 4])],
        Some(DepthAttachment::cleared(&depth, 1.0)),
    ));

    assert!(matches!(result, Err(Error::ValidationFailed(_))));
    assert_eq!(device.stats().live_canvases, 0);
}

#[test]
fn test_attachment_without_canvas_usage_is_rejected() {
    let (mut device, _logger) = debug_device();
    let sampled = device
        .create_texture(&TextureDesc::new_2d(TextureFormat::Rgba8, 4, 4, TextureUsage::SAMPLE))
        .unwrap();

    let result = device.create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&sampled, [0.0; 4])], None));

    assert!(matches!(result, Err(Error::ValidationFailed(_))));
}

#[test]
fn test_depth_format_as_color_is_rejected() {
    let (mut device, _logger) = debug_device();
    let depth = target(&mut device, TextureFormat::D16, 4);

    let result = device.create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&depth, [0.0; 4])], None));

    assert!(matches!(result, Err(Error::ValidationFailed(_))));
}

#[test]
fn test_canvas_does_not_own_its_textures() {
    let (mut device, _logger) = debug_device();
    let color = target(&mut device, TextureFormat::Rgba8, 4);
    let canvas = device
        .create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&color, [0.0; 4])], None))
        .unwrap();
    assert_eq!(device.stats().live_canvases, 1);

    canvas.destroy();

    let stats = device.stats();
    assert_eq!(stats.live_canvases, 0);
    assert_eq!(stats.live_textures, 1);
    assert_eq!(color.info().size, [4, 4, 1]);
}

// ============================================================================
// LOAD OPERATIONS
// ============================================================================

#[test]
fn test_clear_color_is_visible_after_wait_idle() {
    let (mut device, _logger) = debug_device();
    let color = target(&mut device, TextureFormat::Rgba8, 4);
    let canvas = device
        .create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&color, [1.0, 0.0, 0.0, 1.0])], None))
        .unwrap();

    run_empty_pass(&mut device, &canvas);

    let bytes = color.read([0, 0, 0, 0], [4, 4, 1, 1], 0).unwrap();
    assert!(bytes.chunks_exact(4).all(|texel| texel == [255, 0, 0, 255]));
    assert_eq!(device.stats().render_passes, 1);
}

#[test]
fn test_load_keeps_previous_contents() {
    let (mut device, _logger) = debug_device();
    let color = target(&mut device, TextureFormat::Rgba8, 2);
    let contents: Vec<u8> = (0..16).collect();
    color.write(&contents, [0, 0, 0, 0], [2, 2, 1, 1], 0).unwrap();

    let attachment = ColorAttachment { load: LoadOp::Load, ..ColorAttachment::cleared(&color, [0.0; 4]) };
    let canvas = device.create_canvas(&CanvasDesc::new(vec![attachment], None)).unwrap();

    run_empty_pass(&mut device, &canvas);

    assert_eq!(color.read([0, 0, 0, 0], [2, 2, 1, 1], 0).unwrap(), contents);
}

#[test]
fn test_depth_stencil_clear_values_are_independent() {
    let (mut device, _logger) = debug_device();
    let depth = target(&mut device, TextureFormat::D24s8, 2);
    let attachment = DepthAttachment { texture: &depth, load: LoadOp::Clear(1.0), stencil_load: LoadOp::Clear(0x80) };
    let canvas = device.create_canvas(&CanvasDesc::new(vec![], Some(attachment))).unwrap();

    run_empty_pass(&mut device, &canvas);

    let bytes = depth.read([0, 0, 0, 0], [2, 2, 1, 1], 0).unwrap();
    assert!(bytes.chunks_exact(4).all(|texel| texel == [0xFF, 0xFF, 0xFF, 0x80]));

    // Clear stencil only
    let stencil_only = DepthAttachment { texture: &depth, load: LoadOp::Load, stencil_load: LoadOp::Clear(3) };
    let canvas = device.create_canvas(&CanvasDesc::new(vec![], Some(stencil_only))).unwrap();

    run_empty_pass(&mut device, &canvas);

    let bytes = depth.read([0, 0, 0, 0], [2, 2, 1, 1], 0).unwrap();
    assert!(bytes.chunks_exact(4).all(|texel| texel == [0xFF, 0xFF, 0xFF, 0x03]));
}

#[test]
fn test_multiview_clears_every_layer() {
    let (mut device, _logger) = debug_device();
    let array = device
        .create_texture(&TextureDesc::new_array(TextureFormat::R32f, 2, 2, 3, TextureUsage::CANVAS))
        .unwrap();
    let canvas = device
        .create_canvas(
            &CanvasDesc::new(vec![ColorAttachment::cleared(&array, [0.5, 0.0, 0.0, 0.0])], None).with_views(2),
        )
        .unwrap();
    assert_eq!(canvas.info().layout.views, 2);

    run_empty_pass(&mut device, &canvas);

    let cleared = 0.5f32.to_le_bytes();
    for layer in 0..2 {
        let bytes = array.read([0, 0, 0, layer], [2, 2, 1, 1], 0).unwrap();
        assert!(bytes.chunks_exact(4).all(|texel| texel == cleared));
    }
    let untouched = array.read([0, 0, 0, 2], [2, 2, 1, 1], 0).unwrap();
    assert!(untouched.iter().all(|&b| b == 0));
}

#[test]
fn test_too_many_views_are_rejected() {
    let (mut device, _logger) = debug_device();
    let array = device
        .create_texture(&TextureDesc::new_array(TextureFormat::Rgba8, 2, 2, 2, TextureUsage::CANVAS))
        .unwrap();

    let result = device
        .create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&array, [0.0; 4])], None).with_views(3));

    assert!(matches!(result, Err(Error::ValidationFailed(_))));
}

// ============================================================================
// VIEWS AS ATTACHMENTS
// ============================================================================

#[test]
fn test_clear_through_reinterpreting_view_uses_view_format() {
    let (mut device, _logger) = debug_device();
    let color = target(&mut device, TextureFormat::Rgba8, 2);
    let as_float = device
        .create_texture_view(&TextureViewDesc { format: TextureFormat::R32f, ..TextureViewDesc::whole(&color) })
        .unwrap();
    let canvas = device
        .create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&as_float, [0.5; 4])], None))
        .unwrap();
    assert_eq!(canvas.info().layout.color_formats, vec![TextureFormat::R32f]);

    run_empty_pass(&mut device, &canvas);

    let cleared = 0.5f32.to_le_bytes();
    let through_view = as_float.read([0, 0, 0, 0], [2, 2, 1, 1], 0).unwrap();
    assert!(through_view.chunks_exact(4).all(|texel| texel == cleared));
    assert_eq!(color.read([0, 0, 0, 0], [2, 2, 1, 1], 0).unwrap(), through_view);
}

#[test]
fn test_clear_through_layer_view_touches_only_that_layer() {
    let (mut device, _logger) = debug_device();
    let array = device
        .create_texture(&TextureDesc::new_array(TextureFormat::Rgba8, 2, 2, 3, TextureUsage::CANVAS))
        .unwrap();
    let middle = device.create_texture_view(&TextureViewDesc::layer(&array, 1, 0)).unwrap();
    let canvas = device
        .create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&middle, [0.0, 0.0, 1.0, 1.0])], None))
        .unwrap();

    run_empty_pass(&mut device, &canvas);

    let blue = [0, 0, 255, 255];
    let through_view = middle.read([0, 0, 0, 0], [2, 2, 1, 1], 0).unwrap();
    assert!(through_view.chunks_exact(4).all(|texel| texel == blue));
    assert_eq!(array.read([0, 0, 0, 1], [2, 2, 1, 1], 0).unwrap(), through_view);
    for untouched in [0, 2] {
        let bytes = array.read([0, 0, 0, untouched], [2, 2, 1, 1], 0).unwrap();
        assert!(bytes.iter().all(|&b| b == 0));
    }
}
