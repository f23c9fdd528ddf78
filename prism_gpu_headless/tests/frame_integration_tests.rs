//! Integration tests for the frame lifecycle, command recording and statistics
//!
//! Run with: cargo test --test frame_integration_tests


use std::sync::{Arc, Mutex};

use prism_gpu::log::LogSeverity;
use prism_gpu::pipeline::IndexFormat;
use prism_gpu::{
    Buffer, BufferDesc, BufferUsage, CanvasDesc, ColorAttachment, Device, DrawIndexedIndirectArgs,
    DrawIndirectArgs, Error, FrameState, GpuConfig, PipelineDesc, ProcAddressResolver, ShaderDesc, ShaderSource,
    TextureDesc, TextureFormat, TextureUsage,
};
use prism_gpu_headless::{
    HeadlessCanvas, HeadlessConfig, HeadlessDevice, HeadlessPipeline, HeadlessShader, HeadlessTexture,
};
use test_utils::{compute_spirv, debug_device, device_with, fragment_spirv, vertex_spirv};

/// Color target, canvas, shader and pipeline for draw tests
struct DrawSetup {
    pipeline: HeadlessPipeline,
    canvas: HeadlessCanvas,
    _shader: HeadlessShader,
    _color: HeadlessTexture,
}

fn draw_setup(device: &mut HeadlessDevice, index_format: IndexFormat) -> DrawSetup {
    let vs = vertex_spirv();
    let fs = fragment_spirv();
    let shader = device
        .create_shader(&ShaderDesc::graphics(ShaderSource::main(&vs), ShaderSource::main(&fs)))
        .unwrap();
    let color = device
        .create_texture(&TextureDesc::new_2d(TextureFormat::Rgba8, 4, 4, TextureUsage::CANVAS))
        .unwrap();
    let canvas = device
        .create_canvas(&CanvasDesc::new(vec![ColorAttachment::cleared(&color, [0.0; 4])], None))
        .unwrap();
    let pipeline = device
        .create_pipeline(&PipelineDesc { index_format, ..PipelineDesc::new(&shader, &canvas) })
        .unwrap();
    DrawSetup { pipeline, canvas, _shader: shader, _color: color }
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
fn test_zero_frames_in_flight_is_rejected() {
    let result = HeadlessDevice::new(
        GpuConfig::default().with_logger(test_utils::TestLogger::new()),
        HeadlessConfig::default().with_frames_in_flight(0),
    );

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_resolver_is_accepted_and_ignored() {
    let logger = test_utils::TestLogger::new();
    let requested = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requested);
    let resolver: ProcAddressResolver = Arc::new(move |name: &str| {
        seen.lock().unwrap().push(name.to_string());
        None
    });
    let config = GpuConfig::default()
        .with_logger(logger.clone())
        .with_proc_address_resolver(resolver);

    let device = HeadlessDevice::new(config, HeadlessConfig::default()).unwrap();

    assert_eq!(device.frame_state(), FrameState::Idle);
    assert!(logger.contains(LogSeverity::Debug, "resolver ignored"));
    assert!(logger.contains(LogSeverity::Debug, "vkGetInstanceProcAddr unknown"));
    assert_eq!(*requested.lock().unwrap(), vec!["vkGetInstanceProcAddr".to_string()]);
}

// ============================================================================
// FRAME LIFECYCLE
// ============================================================================

#[test]
fn test_empty_frames_complete() {
    let (mut device, _logger) = debug_device();

    for _ in 0..3 {
        device.frame_wait();
        assert_eq!(device.frame_state(), FrameState::FrameActive);
        device.frame_finish();
        assert_eq!(device.frame_state(), FrameState::Idle);
    }
    device.wait_idle();

    let stats = device.stats();
    assert_eq!(stats.frames_submitted, 3);
    assert_eq!(stats.frames_completed, 3);
    assert_eq!(device.frames_pending(), 0);
}

#[test]
fn test_frame_wait_bounds_frames_in_flight() {
    for frames_in_flight in [1, 2, 3] {
        let (mut device, _logger) =
            device_with(true, HeadlessConfig::default().with_frames_in_flight(frames_in_flight));

        for _ in 0..8 {
            device.frame_wait();
            assert!(device.frames_pending() < u64::from(frames_in_flight));
            device.frame_finish();
        }
        device.wait_idle();
        assert_eq!(device.stats().frames_completed, 8);
    }
}

#[test]
fn test_render_pass_state_transitions() {
    let (mut device, _logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);

    device.frame_wait();
    device.render_begin(&setup.canvas);
    assert_eq!(device.frame_state(), FrameState::RenderPassActive);
    device.render_finish();
    assert_eq!(device.frame_state(), FrameState::FrameActive);
    device.frame_finish();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "render_begin called while a render pass is already active")]
fn test_nested_render_pass_panics() {
    let (mut device, _logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.render_begin(&setup.canvas);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "draw called without a bound pipeline")]
fn test_draw_without_pipeline_panics() {
    let (mut device, _logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.draw(3, 1, 0);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "compute called inside a render pass")]
fn test_compute_inside_render_pass_panics() {
    let (mut device, _logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);
    let cs = compute_spirv();
    let shader = device.create_shader(&ShaderDesc::compute(ShaderSource::main(&cs))).unwrap();

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.compute(&shader, 1, 1, 1);
}

#[test]
fn test_unfinished_frame_is_reported_on_drop() {
    let (mut device, logger) = debug_device();

    device.frame_wait();
    drop(device);

    assert!(logger.contains(LogSeverity::Warn, "unfinished frame"));
}

// ============================================================================
// DRAWING
// ============================================================================

#[test]
fn test_draws_are_counted() {
    let (mut device, logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);
    let indices: Vec<u8> = [0u16, 1, 2, 2, 1, 3].iter().flat_map(|i| i.to_le_bytes()).collect();
    let index_buffer = device
        .create_buffer(&BufferDesc::new(indices.len() as u64, BufferUsage::INDEX).with_data(&indices))
        .unwrap();

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.set_pipeline(&setup.pipeline);
    device.draw(3, 2, 0);
    device.set_index_buffer(&index_buffer, 0);
    device.draw_indexed(6, 1, 0, 0);
    device.render_finish();
    device.frame_finish();
    device.wait_idle();

    let stats = device.stats();
    assert_eq!(stats.render_passes, 1);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.vertices, 6);
    assert_eq!(stats.indices, 6);
    assert_eq!(logger.count(LogSeverity::Warn), 0);
}

#[test]
fn test_short_index_buffer_is_diagnosed() {
    let (mut device, logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U32);
    let index_buffer = device.create_buffer(&BufferDesc::new(8, BufferUsage::INDEX)).unwrap();

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.set_pipeline(&setup.pipeline);
    device.set_index_buffer(&index_buffer, 0);
    device.draw_indexed(3, 1, 0, 0);
    device.render_finish();
    device.frame_finish();
    device.wait_idle();

    assert!(logger.contains(LogSeverity::Warn, "12 bytes of a 8 byte index buffer"));
    assert_eq!(device.stats().draw_calls, 1);
}

#[test]
fn test_indirect_draws_read_records_at_execution() {
    let (mut device, logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);
    let size = 2 * DrawIndirectArgs::SIZE;
    let indirect = device
        .create_buffer(&BufferDesc::new(size, BufferUsage::COMPUTE))
        .unwrap();

    {
        let mut mapped = indirect.map(0, size).unwrap();
        let records = [
            DrawIndirectArgs { vertex_count: 3, instance_count: 1, first_vertex: 0, first_instance: 0 },
            DrawIndirectArgs { vertex_count: 6, instance_count: 4, first_vertex: 3, first_instance: 0 },
        ];
        mapped.copy_from_slice(bytemuck::cast_slice(&records));
    }

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.set_pipeline(&setup.pipeline);
    device.draw_indirect(&indirect, 0, 2);
    // Asks for one record more than the buffer holds
    device.draw_indirect(&indirect, DrawIndirectArgs::SIZE, 2);
    device.render_finish();
    device.frame_finish();
    device.wait_idle();

    let stats = device.stats();
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(stats.vertices, 3 + 24 + 24);
    assert!(logger.contains(LogSeverity::Warn, "holds 1 of 2 draw records"));
}

#[test]
fn test_indexed_indirect_draws() {
    let (mut device, _logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);
    let record = DrawIndexedIndirectArgs {
        index_count: 4,
        instance_count: 3,
        first_index: 0,
        base_vertex: -2,
        first_instance: 0,
    };
    let desc = BufferDesc::new(DrawIndexedIndirectArgs::SIZE, BufferUsage::COMPUTE).with_data(bytemuck::bytes_of(&record));
    let indirect = device.create_buffer(&desc).unwrap();
    let index_buffer = device.create_buffer(&BufferDesc::new(8, BufferUsage::INDEX)).unwrap();

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.set_pipeline(&setup.pipeline);
    device.set_index_buffer(&index_buffer, 0);
    device.draw_indirect_indexed(&indirect, 0, 1);
    device.render_finish();
    device.frame_finish();
    device.wait_idle();

    let stats = device.stats();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.indices, 12);
}

#[test]
fn test_oversized_indirect_records_keep_the_timeline_alive() {
    let (mut device, logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);
    let huge = DrawIndirectArgs { vertex_count: u32::MAX, instance_count: u32::MAX, first_vertex: 0, first_instance: 0 };
    let records = [huge, huge];
    let desc = BufferDesc::new(2 * DrawIndirectArgs::SIZE, BufferUsage::COMPUTE)
        .with_data(bytemuck::cast_slice(&records));
    let indirect = device.create_buffer(&desc).unwrap();

    device.frame_wait();
    device.render_begin(&setup.canvas);
    device.set_pipeline(&setup.pipeline);
    device.draw_indirect(&indirect, 0, 2);
    // Record address past the end of the address space
    device.draw_indirect(&indirect, u64::MAX - 4, 2);
    device.render_finish();
    device.frame_finish();

    // A second frame still executes
    device.frame_wait();
    device.frame_finish();
    device.wait_idle();

    let stats = device.stats();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.vertices, u64::MAX);
    assert_eq!(stats.frames_completed, 2);
    assert!(logger.contains(LogSeverity::Warn, "holds 0 of 2 draw records"));
    assert_eq!(logger.count(LogSeverity::Error), 0);
}

// ============================================================================
// COMPUTE
// ============================================================================

#[test]
fn test_compute_dispatches_are_counted() {
    let (mut device, _logger) = debug_device();
    let cs = compute_spirv();
    let shader = device.create_shader(&ShaderDesc::compute(ShaderSource::main(&cs))).unwrap();

    device.frame_wait();
    device.compute(&shader, 4, 2, 1);
    device.compute(&shader, 1, 1, 1);
    device.frame_finish();
    device.wait_idle();

    let stats = device.stats();
    assert_eq!(stats.compute_dispatches, 2);
    assert_eq!(stats.workgroups, 9);
    assert_eq!(stats.render_passes, 0);
}

#[test]
fn test_huge_dispatch_grids_saturate_workgroup_count() {
    let (mut device, _logger) = debug_device();
    let cs = compute_spirv();
    let shader = device.create_shader(&ShaderDesc::compute(ShaderSource::main(&cs))).unwrap();

    device.frame_wait();
    device.compute(&shader, u32::MAX, u32::MAX, u32::MAX);
    device.compute(&shader, 2, 1, 1);
    device.frame_finish();
    device.wait_idle();

    let stats = device.stats();
    assert_eq!(stats.compute_dispatches, 2);
    assert_eq!(stats.workgroups, u64::MAX);
    assert_eq!(stats.frames_completed, 1);
}

// ============================================================================
// RESOURCE TRACKING
// ============================================================================

#[test]
fn test_live_resource_counts() {
    let (mut device, _logger) = debug_device();
    let setup = draw_setup(&mut device, IndexFormat::U16);
    let buffer = device.create_buffer(&BufferDesc::new(4, BufferUsage::UNIFORM)).unwrap();

    let stats = device.stats();
    assert_eq!(stats.live_buffers, 1);
    assert_eq!(stats.live_textures, 1);
    assert_eq!(stats.live_canvases, 1);
    assert_eq!(stats.live_shaders, 1);
    assert_eq!(stats.live_pipelines, 1);

    drop(setup);
    drop(buffer);

    let stats = device.stats();
    assert_eq!(stats.live_buffers + stats.live_textures + stats.live_canvases, 0);
    assert_eq!(stats.live_shaders + stats.live_pipelines, 0);
}

#[test]
fn test_leaked_resources_are_reported() {
    let (mut device, logger) = debug_device();
    let buffer = device
        .create_buffer(&BufferDesc::new(4, BufferUsage::UNIFORM).with_label("orphan"))
        .unwrap();

    drop(device);

    assert!(logger.contains(LogSeverity::Warn, "1 resources outlive their device"));
    assert!(logger.contains(LogSeverity::Warn, "orphan"));
    drop(buffer);
}
