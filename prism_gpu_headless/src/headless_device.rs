/// HeadlessDevice - host-memory implementation of the Device trait

use std::sync::Arc;

use prism_gpu::validation::{
    validate_buffer, validate_canvas, validate_pipeline, validate_texture, validate_texture_view,
};
use prism_gpu::{gpu_debug, gpu_error, gpu_info, gpu_trace, gpu_warn};
use prism_gpu::{
    BufferDesc, Canvas, CanvasDesc, Device, Error, Features, FrameState, FrameStateMachine,
    GpuConfig, GpuStats, Limits, Pipeline, PipelineDesc, RenderPassLayout, Result, Shader,
    ShaderDesc, ShaderKind, TextureDesc, TextureViewDesc,
};
use prism_gpu::pipeline::MAX_VERTEX_BUFFERS;

use crate::headless_buffer::HeadlessBuffer;
use crate::headless_canvas::HeadlessCanvas;
use crate::headless_context::{HeadlessContext, SOURCE};
use crate::headless_pipeline::{HeadlessPipeline, PipelineCache, PipelineKey};
use crate::headless_shader::HeadlessShader;
use crate::headless_texture::HeadlessTexture;
use crate::headless_timeline::{Command, GpuTimeline};
use crate::registry::ResourceKind;

/// Entry point a driver-backed device would resolve first
const LOADER_ENTRY_POINT: &str = "vkGetInstanceProcAddr";

/// Backend-specific configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessConfig {
    /// Frames that may be submitted but not yet completed (at least 1)
    pub frames_in_flight: u32,
    /// Features the device reports and enforces
    pub features: Features,
    /// Limits the device reports and enforces
    pub limits: Limits,
}

impl HeadlessConfig {
    /// Set the frames-in-flight bound
    pub fn with_frames_in_flight(mut self, frames_in_flight: u32) -> Self {
        self.frames_in_flight = frames_in_flight;
        self
    }

    /// Set the reported features
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Set the reported limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            features: Features::ALL,
            limits: Limits::default(),
        }
    }
}

/// Host-memory GPU device
///
/// Resources live in ordinary memory and submitted frames run on a worker
/// thread (the GPU timeline). Load operations are applied to attachment
/// memory and indirect draw records are read at execution time, so tests
/// can observe both. Draws and dispatches are counted, not rasterized.
pub struct HeadlessDevice {
    /// Shared context handed to every resource
    ctx: Arc<HeadlessContext>,
    /// Backend configuration
    headless: HeadlessConfig,
    /// Worker executing submitted frames
    timeline: GpuTimeline,
    /// Frame/render-pass ordering
    frame: FrameStateMachine,
    /// Commands of the frame being recorded
    recording: Vec<Command>,
    /// Layout of the canvas of the active render pass
    active_layout: Option<RenderPassLayout>,
    /// Compiled pipeline state
    pipeline_cache: PipelineCache,
    /// Next shader id
    next_shader_id: u64,
    /// Pipelines created
    pipelines_created: u64,
    /// Pipelines served from the cache
    pipeline_cache_hits: u64,
}

impl HeadlessDevice {
    /// Initialize a device
    ///
    /// # Arguments
    ///
    /// * `config` - Debug flag, resolver and logger
    /// * `headless` - Frames in flight, features and limits
    pub fn new(config: GpuConfig, headless: HeadlessConfig) -> Result<Self> {
        let ctx = Arc::new(HeadlessContext::new(&config));

        if headless.frames_in_flight == 0 {
            gpu_error!(ctx.logger, SOURCE, "frames_in_flight must be at least 1");
            return Err(Error::InitializationFailed("frames_in_flight must be at least 1".to_string()));
        }
        if config.get_proc_address.is_some() {
            let loader = config.resolve(LOADER_ENTRY_POINT);
            gpu_debug!(
                ctx.logger,
                SOURCE,
                "Headless backend does not load driver entry points, resolver ignored ({} {})",
                LOADER_ENTRY_POINT,
                if loader.is_some() { "available" } else { "unknown" }
            );
        }

        let timeline = GpuTimeline::start(Arc::clone(&ctx.logger), config.debug)?;

        gpu_info!(
            ctx.logger,
            SOURCE,
            "Headless device initialized ({} frames in flight, debug: {})",
            headless.frames_in_flight, config.debug
        );

        Ok(Self {
            ctx,
            headless,
            timeline,
            frame: FrameStateMachine::new(),
            recording: Vec::new(),
            active_layout: None,
            pipeline_cache: PipelineCache::default(),
            next_shader_id: 1,
            pipelines_created: 0,
            pipeline_cache_hits: 0,
        })
    }

    /// Current frame state
    pub fn frame_state(&self) -> FrameState {
        self.frame.state()
    }

    /// Frames submitted but not yet completed, as last observed
    pub fn frames_pending(&self) -> u64 {
        self.timeline.pending()
    }

    /// Log a construction failure and pass it on
    fn log_and_return_error<T>(&self, what: &str, result: Result<T>) -> Result<T> {
        result.inspect_err(|e| gpu_error!(self.ctx.logger, SOURCE, "{} failed: {}", what, e))
    }

    fn record(&mut self, command: Command) {
        self.recording.push(command);
    }
}

impl Device for HeadlessDevice {
    type Buffer = HeadlessBuffer;
    type Texture = HeadlessTexture;
    type Canvas = HeadlessCanvas;
    type Shader = HeadlessShader;
    type Pipeline = HeadlessPipeline;

    // ===== CAPABILITIES =====

    fn features(&self) -> Features {
        self.headless.features
    }

    fn limits(&self) -> Limits {
        self.headless.limits
    }

    // ===== RESOURCE CREATION =====

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<HeadlessBuffer> {
        let result = validate_buffer(desc).and_then(|_| HeadlessBuffer::new(Arc::clone(&self.ctx), desc));
        self.log_and_return_error("create_buffer", result)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<HeadlessTexture> {
        let result = validate_texture(desc, &self.headless.features, &self.headless.limits)
            .and_then(|_| HeadlessTexture::new(Arc::clone(&self.ctx), desc));
        self.log_and_return_error("create_texture", result)
    }

    fn create_texture_view(&mut self, desc: &TextureViewDesc<'_, HeadlessTexture>) -> Result<HeadlessTexture> {
        let result = validate_texture_view(desc)
            .map(|_| HeadlessTexture::new_view(Arc::clone(&self.ctx), desc));
        self.log_and_return_error("create_texture_view", result)
    }

    fn create_canvas(&mut self, desc: &CanvasDesc<'_, HeadlessTexture>) -> Result<HeadlessCanvas> {
        let result = validate_canvas(desc, &self.headless.limits)
            .map(|_| HeadlessCanvas::new(Arc::clone(&self.ctx), desc));
        self.log_and_return_error("create_canvas", result)
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<HeadlessShader> {
        let id = self.next_shader_id;
        let result = HeadlessShader::new(Arc::clone(&self.ctx), id, desc);
        if result.is_ok() {
            self.next_shader_id += 1;
        }
        self.log_and_return_error("create_shader", result)
    }

    fn create_pipeline(
        &mut self,
        desc: &PipelineDesc<'_, HeadlessShader, HeadlessCanvas>,
    ) -> Result<HeadlessPipeline> {
        self.log_and_return_error("create_pipeline", validate_pipeline(desc))?;

        let (compiled, cached) = self.pipeline_cache.get_or_compile(PipelineKey::new(desc));
        self.pipelines_created += 1;
        if cached {
            self.pipeline_cache_hits += 1;
            gpu_trace!(self.ctx.logger, SOURCE, "Pipeline {:?} reuses compiled state", desc.label);
        } else {
            gpu_debug!(
                self.ctx.logger,
                SOURCE,
                "Compiled pipeline {:?} ({} states cached)",
                desc.label,
                self.pipeline_cache.len()
            );
        }

        Ok(HeadlessPipeline::new(Arc::clone(&self.ctx), compiled, desc.label))
    }

    // ===== FRAME =====

    fn frame_wait(&mut self) {
        self.frame.begin_frame();
        self.timeline.wait_until_pending_below(u64::from(self.headless.frames_in_flight));
        self.recording.clear();
    }

    fn frame_finish(&mut self) {
        self.frame.end_frame();
        let commands = std::mem::take(&mut self.recording);
        self.timeline.submit(commands);
    }

    fn wait_idle(&mut self) {
        self.timeline.wait_idle();
    }

    // ===== RENDER PASS =====

    fn render_begin(&mut self, canvas: &HeadlessCanvas) {
        self.frame.begin_render_pass();
        self.active_layout = Some(canvas.info().layout.clone());
        self.record(Command::BeginPass(canvas.targets().clone()));
    }

    fn render_finish(&mut self) {
        self.frame.end_render_pass();
        self.active_layout = None;
        self.record(Command::EndPass);
    }

    // ===== BINDING =====

    fn set_pipeline(&mut self, pipeline: &HeadlessPipeline) {
        self.frame.bind_pipeline();

        if self.ctx.debug {
            let expected = pipeline.compiled().layout();
            if let Some(active) = self.active_layout.as_ref().filter(|active| *active != expected) {
                gpu_warn!(
                    self.ctx.logger,
                    SOURCE,
                    "Pipeline {:?} was built for {:?} but the active canvas is {:?}",
                    pipeline.info().label, expected, active
                );
            }
        }

        self.record(Command::BindPipeline(Arc::clone(pipeline.compiled())));
    }

    fn set_vertex_buffers(&mut self, buffers: &[&HeadlessBuffer], offsets: &[u64]) {
        self.frame.check_in_render_pass("set_vertex_buffers");
        debug_assert!(
            buffers.len() == offsets.len(),
            "set_vertex_buffers called with {} buffers and {} offsets",
            buffers.len(),
            offsets.len()
        );
        debug_assert!(
            buffers.len() <= MAX_VERTEX_BUFFERS,
            "set_vertex_buffers called with {} buffers (max {})",
            buffers.len(),
            MAX_VERTEX_BUFFERS
        );

        let bound = buffers
            .iter()
            .zip(offsets)
            .map(|(buffer, &offset)| (buffer.snapshot(), offset))
            .collect();
        self.record(Command::BindVertexBuffers(bound));
    }

    fn set_index_buffer(&mut self, buffer: &HeadlessBuffer, offset: u64) {
        self.frame.check_in_render_pass("set_index_buffer");
        self.record(Command::BindIndexBuffer(buffer.snapshot(), offset));
    }

    // ===== DRAWING =====

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) {
        self.frame.check_can_draw("draw");
        self.record(Command::Draw { vertex_count, instance_count, first_vertex });
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, base_vertex: i32) {
        self.frame.check_can_draw("draw_indexed");
        self.record(Command::DrawIndexed { index_count, instance_count, first_index, base_vertex });
    }

    fn draw_indirect(&mut self, buffer: &HeadlessBuffer, offset: u64, draw_count: u32) {
        self.frame.check_can_draw("draw_indirect");
        self.record(Command::DrawIndirect { buffer: buffer.snapshot(), offset, draw_count, indexed: false });
    }

    fn draw_indirect_indexed(&mut self, buffer: &HeadlessBuffer, offset: u64, draw_count: u32) {
        self.frame.check_can_draw("draw_indirect_indexed");
        self.record(Command::DrawIndirect { buffer: buffer.snapshot(), offset, draw_count, indexed: true });
    }

    // ===== COMPUTE =====

    fn compute(&mut self, shader: &HeadlessShader, x: u32, y: u32, z: u32) {
        self.frame.check_can_dispatch("compute");
        debug_assert!(shader.kind() == ShaderKind::Compute, "compute called with a graphics shader");
        self.record(Command::Dispatch { x, y, z });
    }

    // ===== STATISTICS =====

    fn stats(&self) -> GpuStats {
        let totals = self.timeline.totals();
        GpuStats {
            frames_submitted: self.timeline.submitted(),
            frames_completed: self.timeline.completed(),
            render_passes: totals.render_passes,
            draw_calls: totals.draw_calls,
            vertices: totals.vertices,
            indices: totals.indices,
            compute_dispatches: totals.compute_dispatches,
            workgroups: totals.workgroups,
            pipelines_created: self.pipelines_created,
            pipeline_cache_hits: self.pipeline_cache_hits,
            live_buffers: self.ctx.live(ResourceKind::Buffer),
            live_textures: self.ctx.live(ResourceKind::Texture) + self.ctx.live(ResourceKind::TextureView),
            live_canvases: self.ctx.live(ResourceKind::Canvas),
            live_shaders: self.ctx.live(ResourceKind::Shader),
            live_pipelines: self.ctx.live(ResourceKind::Pipeline),
        }
    }
}

impl Drop for HeadlessDevice {
    fn drop(&mut self) {
        if self.frame.state() != FrameState::Idle {
            gpu_warn!(self.ctx.logger, SOURCE, "Device dropped with an unfinished frame, recorded commands discarded");
        }
        self.timeline.shutdown();

        let leaked = self.ctx.live_total();
        if self.ctx.debug && leaked > 0 {
            gpu_warn!(self.ctx.logger, SOURCE, "{} resources outlive their device", leaked);
            for (kind, label) in self.ctx.survivors() {
                gpu_warn!(self.ctx.logger, SOURCE, "{:?} {:?} is still alive at device destruction", kind, label);
            }
        }
        gpu_info!(
            self.ctx.logger,
            SOURCE,
            "Headless device destroyed ({} frames completed)",
            self.timeline.completed()
        );
    }
}
