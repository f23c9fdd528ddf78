/// Device trait - resource factory and command/frame driver

use crate::buffer::{Buffer, BufferDesc};
use crate::canvas::{Canvas, CanvasDesc};
use crate::capabilities::{Features, Limits};
use crate::command::GpuStats;
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineDesc};
use crate::shader::{Shader, ShaderDesc};
use crate::texture::{Texture, TextureDesc, TextureViewDesc};

/// Main device trait
///
/// The central interface for creating GPU resources and recording work.
/// Implemented by backend-specific devices (e.g., HeadlessDevice). Each
/// backend has its own resource types, so resources from two different
/// backends can never be mixed.
///
/// One thread drives a device. Construction-time problems are returned as
/// `Err`; command methods are infallible and only check their ordering
/// (see `FrameStateMachine`) in debug builds.
pub trait Device {
    type Buffer: Buffer;
    type Texture: Texture;
    type Canvas: Canvas;
    type Shader: Shader;
    type Pipeline: Pipeline;

    // ===== CAPABILITIES =====

    /// Optional features supported by the device
    fn features(&self) -> Features;

    /// Hard limits of the device
    fn limits(&self) -> Limits;

    // ===== RESOURCE CREATION =====

    /// Create a buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor; `desc.data` is copied in before first use
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Self::Buffer>;

    /// Create a texture
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture descriptor
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Self::Texture>;

    /// Create a view sharing the memory of an existing texture
    ///
    /// # Arguments
    ///
    /// * `desc` - View descriptor; the source must not itself be a view
    ///   (`Error::InvalidResource` otherwise)
    fn create_texture_view(&mut self, desc: &TextureViewDesc<'_, Self::Texture>) -> Result<Self::Texture>;

    /// Create a canvas (render target)
    ///
    /// # Arguments
    ///
    /// * `desc` - Canvas descriptor with color and depth attachments
    fn create_canvas(&mut self, desc: &CanvasDesc<'_, Self::Texture>) -> Result<Self::Canvas>;

    /// Create a shader from SPIR-V stage bytecode
    ///
    /// # Arguments
    ///
    /// * `desc` - Shader descriptor (vertex + fragment, or compute)
    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Self::Shader>;

    /// Create a graphics pipeline
    ///
    /// # Arguments
    ///
    /// * `desc` - Pipeline descriptor
    fn create_pipeline(
        &mut self,
        desc: &PipelineDesc<'_, Self::Shader, Self::Canvas>,
    ) -> Result<Self::Pipeline>;

    // ===== FRAME =====

    /// Begin a frame, blocking while too many frames are in flight
    fn frame_wait(&mut self);

    /// Submit the recorded frame
    fn frame_finish(&mut self);

    /// Block until every submitted frame has completed
    fn wait_idle(&mut self);

    // ===== RENDER PASS =====

    /// Begin a render pass on `canvas`, applying its load operations
    fn render_begin(&mut self, canvas: &Self::Canvas);

    /// End the active render pass
    fn render_finish(&mut self);

    // ===== BINDING =====

    /// Bind a pipeline
    ///
    /// The pipeline's canvas layout must match the active canvas. This is
    /// the caller's responsibility and is not reported as an error.
    fn set_pipeline(&mut self, pipeline: &Self::Pipeline);

    /// Bind vertex buffers to consecutive slots starting at 0
    ///
    /// # Arguments
    ///
    /// * `buffers` - One buffer per slot
    /// * `offsets` - Byte offset per slot (same length as `buffers`)
    fn set_vertex_buffers(&mut self, buffers: &[&Self::Buffer], offsets: &[u64]);

    /// Bind the index buffer (element width comes from the pipeline)
    fn set_index_buffer(&mut self, buffer: &Self::Buffer, offset: u64);

    // ===== DRAWING =====

    /// Draw non-indexed primitives
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32);

    /// Draw indexed primitives
    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, base_vertex: i32);

    /// Draw with `draw_count` `DrawIndirectArgs` records read from `buffer`
    /// at execution time
    fn draw_indirect(&mut self, buffer: &Self::Buffer, offset: u64, draw_count: u32);

    /// Draw with `draw_count` `DrawIndexedIndirectArgs` records read from
    /// `buffer` at execution time
    fn draw_indirect_indexed(&mut self, buffer: &Self::Buffer, offset: u64, draw_count: u32);

    // ===== COMPUTE =====

    /// Dispatch `x * y * z` workgroups of a compute shader, outside render passes
    fn compute(&mut self, shader: &Self::Shader, x: u32, y: u32, z: u32);

    // ===== STATISTICS =====

    /// Current counters
    fn stats(&self) -> GpuStats;
}
