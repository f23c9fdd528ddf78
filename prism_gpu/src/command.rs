/// Frame and render-pass state tracking, indirect draw records and statistics

use bytemuck::{Pod, Zeroable};

/// Where the command driver is in the frame lifecycle
///
/// ```text
/// Idle --frame_wait--> FrameActive --render_begin--> RenderPassActive
///  ^                        |  ^                            |
///  +------frame_finish------+  +-------render_finish--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameState {
    /// No frame is being recorded
    Idle,
    /// Between `frame_wait` and `frame_finish`, outside any render pass
    FrameActive,
    /// Between `render_begin` and `render_finish`
    RenderPassActive,
}

/// Debug-checked frame state machine shared by backends
///
/// Out-of-order calls are contract violations. Debug builds panic with one of
/// the messages below; release builds skip the checks and simply move to the
/// next state.
///
/// - `frame_wait called while a frame is already active`
/// - `frame_finish called outside of a frame`
/// - `frame_finish called inside a render pass`
/// - `render_begin called outside of a frame`
/// - `render_begin called while a render pass is already active`
/// - `render_finish called without an active render pass`
/// - `<op> called outside of a render pass`
/// - `<op> called without a bound pipeline`
/// - `<op> called inside a render pass` / `<op> called outside of a frame`
#[derive(Debug, Clone)]
pub struct FrameStateMachine {
    state: FrameState,
    pipeline_bound: bool,
}

impl FrameStateMachine {
    pub fn new() -> Self {
        Self { state: FrameState::Idle, pipeline_bound: false }
    }

    /// Current state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// True if a pipeline was bound in the current render pass
    pub fn pipeline_bound(&self) -> bool {
        self.pipeline_bound
    }

    /// `Idle -> FrameActive`
    pub fn begin_frame(&mut self) {
        debug_assert!(
            self.state == FrameState::Idle,
            "frame_wait called while a frame is already active"
        );
        self.state = FrameState::FrameActive;
    }

    /// `FrameActive -> Idle`
    pub fn end_frame(&mut self) {
        debug_assert!(self.state != FrameState::Idle, "frame_finish called outside of a frame");
        debug_assert!(
            self.state != FrameState::RenderPassActive,
            "frame_finish called inside a render pass"
        );
        self.state = FrameState::Idle;
    }

    /// `FrameActive -> RenderPassActive`
    pub fn begin_render_pass(&mut self) {
        debug_assert!(self.state != FrameState::Idle, "render_begin called outside of a frame");
        debug_assert!(
            self.state != FrameState::RenderPassActive,
            "render_begin called while a render pass is already active"
        );
        self.state = FrameState::RenderPassActive;
        self.pipeline_bound = false;
    }

    /// `RenderPassActive -> FrameActive`
    pub fn end_render_pass(&mut self) {
        debug_assert!(
            self.state == FrameState::RenderPassActive,
            "render_finish called without an active render pass"
        );
        self.state = FrameState::FrameActive;
        self.pipeline_bound = false;
    }

    /// Record that a pipeline was bound (`set_pipeline`)
    pub fn bind_pipeline(&mut self) {
        self.check_in_render_pass("set_pipeline");
        self.pipeline_bound = true;
    }

    /// Binding commands are only legal inside a render pass
    pub fn check_in_render_pass(&self, op: &str) {
        debug_assert!(
            self.state == FrameState::RenderPassActive,
            "{op} called outside of a render pass"
        );
    }

    /// Draw commands need a render pass and a bound pipeline
    pub fn check_can_draw(&self, op: &str) {
        self.check_in_render_pass(op);
        debug_assert!(self.pipeline_bound, "{op} called without a bound pipeline");
    }

    /// Compute dispatches need a frame and no active render pass
    pub fn check_can_dispatch(&self, op: &str) {
        debug_assert!(self.state != FrameState::Idle, "{op} called outside of a frame");
        debug_assert!(
            self.state != FrameState::RenderPassActive,
            "{op} called inside a render pass"
        );
    }
}

impl Default for FrameStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ===== INDIRECT ARGUMENTS =====

/// One non-indexed indirect draw record, as read from a buffer
///
/// Tightly packed little-endian, 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndirectArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// One indexed indirect draw record, as read from a buffer
///
/// Tightly packed little-endian, 20 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

impl DrawIndirectArgs {
    /// Record size in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

impl DrawIndexedIndirectArgs {
    /// Record size in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

// ===== STATISTICS =====

/// Device counters
///
/// Frame-execution counters (draws, vertices, workgroups...) are only updated
/// once the frame has completed on the GPU timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuStats {
    /// Frames handed to the GPU by `frame_finish`
    pub frames_submitted: u64,
    /// Frames the GPU has finished executing
    pub frames_completed: u64,
    /// Render passes executed
    pub render_passes: u64,
    /// Draw calls executed (each indirect record counts as one)
    pub draw_calls: u64,
    /// Vertices processed by non-indexed draws (times instances, saturating)
    pub vertices: u64,
    /// Indices processed by indexed draws (times instances, saturating)
    pub indices: u64,
    /// Compute dispatches executed
    pub compute_dispatches: u64,
    /// Total compute workgroups (x * y * z summed over dispatches, saturating)
    pub workgroups: u64,
    /// Pipelines created
    pub pipelines_created: u64,
    /// Pipeline creations served by already-compiled state
    pub pipeline_cache_hits: u64,
    /// Live buffers
    pub live_buffers: u64,
    /// Live textures (including views)
    pub live_textures: u64,
    /// Live canvases
    pub live_canvases: u64,
    /// Live shaders
    pub live_shaders: u64,
    /// Live pipelines
    pub live_pipelines: u64,
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
