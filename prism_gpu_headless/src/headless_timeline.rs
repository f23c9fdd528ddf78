/// GPU timeline - worker thread that executes submitted frames
///
/// The device records commands into a `Vec<Command>` and hands the whole
/// frame to the worker at `frame_finish`. Commands carry `Arc` snapshots of
/// the memory they touch, so the worker never looks at device state. The
/// worker answers every frame with a `FrameReport`, in submission order.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use prism_gpu::log::Logger;
use prism_gpu::{gpu_bail, gpu_error, gpu_trace, gpu_warn};
use prism_gpu::{DrawIndexedIndirectArgs, DrawIndirectArgs, LoadOp, Result};

use crate::headless_buffer::{SharedBytes, DISCARD_POISON};
use crate::headless_canvas::CanvasTargets;
use crate::headless_context::SOURCE;
use crate::headless_pipeline::CompiledPipeline;
use crate::texel::{clear_depth_stencil, encode_color};

/// One recorded command
pub(crate) enum Command {
    BeginPass(CanvasTargets),
    EndPass,
    BindPipeline(Arc<CompiledPipeline>),
    BindVertexBuffers(Vec<(SharedBytes, u64)>),
    BindIndexBuffer(SharedBytes, u64),
    Draw { vertex_count: u32, instance_count: u32, first_vertex: u32 },
    DrawIndexed { index_count: u32, instance_count: u32, first_index: u32, base_vertex: i32 },
    DrawIndirect { buffer: SharedBytes, offset: u64, draw_count: u32, indexed: bool },
    Dispatch { x: u32, y: u32, z: u32 },
}

/// A recorded frame
pub(crate) struct FrameSubmission {
    pub index: u64,
    pub commands: Vec<Command>,
}

/// Work done by one frame (or, summed, by every completed frame)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrameReport {
    pub frames: u64,
    pub render_passes: u64,
    pub draw_calls: u64,
    pub vertices: u64,
    pub indices: u64,
    pub compute_dispatches: u64,
    pub workgroups: u64,
}

impl FrameReport {
    fn accumulate(&mut self, other: &FrameReport) {
        self.frames += other.frames;
        self.render_passes += other.render_passes;
        self.draw_calls += other.draw_calls;
        self.vertices = self.vertices.saturating_add(other.vertices);
        self.indices = self.indices.saturating_add(other.indices);
        self.compute_dispatches += other.compute_dispatches;
        self.workgroups = self.workgroups.saturating_add(other.workgroups);
    }
}

// ===== EXECUTION (worker side) =====

/// Executes one frame's commands
struct Executor<'a> {
    logger: &'a dyn Logger,
    debug: bool,
    frame: u64,
    pipeline: Option<Arc<CompiledPipeline>>,
    vertex_buffers: Vec<(SharedBytes, u64)>,
    index_buffer: Option<(SharedBytes, u64)>,
    report: FrameReport,
}

impl<'a> Executor<'a> {
    fn new(logger: &'a dyn Logger, debug: bool, frame: u64) -> Self {
        Self {
            logger,
            debug,
            frame,
            pipeline: None,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            report: FrameReport { frames: 1, ..FrameReport::default() },
        }
    }

    fn execute(mut self, commands: Vec<Command>) -> FrameReport {
        for command in commands {
            match command {
                Command::BeginPass(targets) => self.begin_pass(&targets),
                Command::EndPass => {
                    self.pipeline = None;
                    self.vertex_buffers.clear();
                    self.index_buffer = None;
                }
                Command::BindPipeline(pipeline) => self.pipeline = Some(pipeline),
                Command::BindVertexBuffers(buffers) => self.vertex_buffers = buffers,
                Command::BindIndexBuffer(buffer, offset) => self.index_buffer = Some((buffer, offset)),
                Command::Draw { vertex_count, instance_count, first_vertex } => {
                    self.draw(vertex_count, instance_count, first_vertex)
                }
                Command::DrawIndexed { index_count, instance_count, first_index, base_vertex } => {
                    self.draw_indexed(index_count, instance_count, first_index, base_vertex)
                }
                Command::DrawIndirect { buffer, offset, draw_count, indexed } => {
                    self.draw_indirect(&buffer, offset, draw_count, indexed)
                }
                Command::Dispatch { x, y, z } => {
                    self.report.compute_dispatches += 1;
                    let groups = u64::from(x).saturating_mul(u64::from(y)).saturating_mul(u64::from(z));
                    self.report.workgroups = self.report.workgroups.saturating_add(groups);
                }
            }
        }
        self.report
    }

    fn begin_pass(&mut self, targets: &CanvasTargets) {
        self.report.render_passes += 1;

        for color in &targets.color {
            let target = &color.target;
            let range = target.storage.slice_range(target.mip, target.first_slice, target.slices);
            match color.load {
                LoadOp::Clear(value) => match encode_color(target.format, value) {
                    Some(texel) => target.storage.with_bytes_mut(|bytes| {
                        for chunk in bytes[range].chunks_exact_mut(texel.len()) {
                            chunk.copy_from_slice(&texel);
                        }
                    }),
                    None => gpu_warn!(self.logger, SOURCE, "Cannot clear {:?} attachment", target.format),
                },
                LoadOp::Discard if self.debug => {
                    target.storage.with_bytes_mut(|bytes| bytes[range].fill(DISCARD_POISON))
                }
                LoadOp::Discard | LoadOp::Load => {}
            }
        }

        if let Some(depth) = &targets.depth {
            let target = &depth.target;
            let range = target.storage.slice_range(target.mip, target.first_slice, target.slices);
            let depth_clear = match depth.load {
                LoadOp::Clear(value) => Some(value),
                _ => None,
            };
            let stencil_clear = match depth.stencil_load {
                LoadOp::Clear(value) => Some(value),
                _ => None,
            };
            if depth_clear.is_some() || stencil_clear.is_some() {
                target.storage.with_bytes_mut(|bytes| {
                    clear_depth_stencil(target.format, &mut bytes[range], depth_clear, stencil_clear)
                });
            }
        }
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32) {
        self.report.draw_calls += 1;
        let vertices = u64::from(vertex_count) * u64::from(instance_count);
        self.report.vertices = self.report.vertices.saturating_add(vertices);

        if self.debug && vertex_count > 0 {
            self.check_vertex_range(u64::from(first_vertex) + u64::from(vertex_count));
        }
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, _base_vertex: i32) {
        self.report.draw_calls += 1;
        let indices = u64::from(index_count) * u64::from(instance_count);
        self.report.indices = self.report.indices.saturating_add(indices);

        if !self.debug || index_count == 0 {
            return;
        }
        let (Some(pipeline), Some((buffer, offset))) = (&self.pipeline, &self.index_buffer) else {
            gpu_warn!(self.logger, SOURCE, "Frame {}: indexed draw without an index buffer", self.frame);
            return;
        };
        let stride = u64::from(pipeline.index_format().size_bytes());
        let needed = offset.saturating_add((u64::from(first_index) + u64::from(index_count)) * stride);
        let available = buffer.read().len() as u64;
        if needed > available {
            gpu_warn!(
                self.logger,
                SOURCE,
                "Frame {}: indexed draw reads {} bytes of a {} byte index buffer",
                self.frame, needed, available
            );
        }
    }

    /// Warn when per-vertex buffers are too short for `vertex_end` vertices
    fn check_vertex_range(&self, vertex_end: u64) {
        let Some(pipeline) = &self.pipeline else { return };
        for (slot, layout) in pipeline.vertex().buffers.iter().enumerate() {
            if layout.divisor != 0 || layout.stride == 0 {
                continue;
            }
            let Some((buffer, offset)) = self.vertex_buffers.get(slot) else {
                gpu_warn!(self.logger, SOURCE, "Frame {}: vertex buffer slot {} is not bound", self.frame, slot);
                continue;
            };
            let needed = offset.saturating_add(vertex_end * u64::from(layout.stride));
            let available = buffer.read().len() as u64;
            if needed > available {
                gpu_warn!(
                    self.logger,
                    SOURCE,
                    "Frame {}: draw reads {} bytes of a {} byte vertex buffer (slot {})",
                    self.frame, needed, available, slot
                );
            }
        }
    }

    fn draw_indirect(&mut self, buffer: &SharedBytes, offset: u64, draw_count: u32, indexed: bool) {
        let record_size = if indexed { DrawIndexedIndirectArgs::SIZE } else { DrawIndirectArgs::SIZE };
        // Copy the records out so draws can inspect other buffers
        let records: Vec<Vec<u8>> = {
            let bytes = buffer.read();
            (0..u64::from(draw_count))
                .map_while(|i| {
                    let start = i.checked_mul(record_size).and_then(|rel| offset.checked_add(rel))?;
                    let end = start.checked_add(record_size)?;
                    (end <= bytes.len() as u64).then(|| bytes[start as usize..end as usize].to_vec())
                })
                .collect()
        };
        if records.len() < draw_count as usize {
            gpu_warn!(
                self.logger,
                SOURCE,
                "Frame {}: indirect buffer holds {} of {} draw records",
                self.frame, records.len(), draw_count
            );
        }

        for record in records {
            if indexed {
                let args: DrawIndexedIndirectArgs = bytemuck::pod_read_unaligned(&record);
                self.draw_indexed(args.index_count, args.instance_count, args.first_index, args.base_vertex);
            } else {
                let args: DrawIndirectArgs = bytemuck::pod_read_unaligned(&record);
                self.draw(args.vertex_count, args.instance_count, args.first_vertex);
            }
        }
    }
}

fn run_worker(
    submissions: Receiver<FrameSubmission>,
    reports: Sender<FrameReport>,
    logger: Arc<dyn Logger>,
    debug: bool,
) {
    for frame in submissions {
        gpu_trace!(logger, SOURCE, "Executing frame {} ({} commands)", frame.index, frame.commands.len());
        let report = Executor::new(&*logger, debug, frame.index).execute(frame.commands);
        if reports.send(report).is_err() {
            break;
        }
    }
}

// ===== TIMELINE (device side) =====

/// Device-side handle on the worker thread
pub(crate) struct GpuTimeline {
    logger: Arc<dyn Logger>,
    submissions: Option<Sender<FrameSubmission>>,
    reports: Receiver<FrameReport>,
    worker: Option<JoinHandle<()>>,
    submitted: u64,
    completed: u64,
    totals: FrameReport,
}

impl GpuTimeline {
    /// Spawn the worker thread
    pub fn start(logger: Arc<dyn Logger>, debug: bool) -> Result<Self> {
        let (submission_tx, submission_rx) = mpsc::channel();
        let (report_tx, report_rx) = mpsc::channel();

        let worker_logger = Arc::clone(&logger);
        let spawned = thread::Builder::new()
            .name("prism-gpu-timeline".to_string())
            .spawn(move || run_worker(submission_rx, report_tx, worker_logger, debug));
        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => gpu_bail!(logger, SOURCE, "Failed to spawn GPU timeline thread: {}", e),
        };

        Ok(Self {
            logger,
            submissions: Some(submission_tx),
            reports: report_rx,
            worker: Some(worker),
            submitted: 0,
            completed: 0,
            totals: FrameReport::default(),
        })
    }

    /// Hand a frame to the worker
    pub fn submit(&mut self, commands: Vec<Command>) {
        self.submitted += 1;
        let frame = FrameSubmission { index: self.submitted, commands };
        let sent = self.submissions.as_ref().is_some_and(|tx| tx.send(frame).is_ok());
        if !sent {
            gpu_error!(self.logger, SOURCE, "GPU timeline is gone, frame {} dropped", self.submitted);
            self.completed = self.submitted;
        }
        self.collect();
    }

    /// Fold in every report that is already available
    pub fn collect(&mut self) {
        while let Ok(report) = self.reports.try_recv() {
            self.complete(&report);
        }
    }

    /// Block until fewer than `limit` frames are pending
    pub fn wait_until_pending_below(&mut self, limit: u64) {
        self.collect();
        while self.pending() >= limit.max(1) {
            if !self.receive_one() {
                break;
            }
        }
    }

    /// Block until every submitted frame has completed
    pub fn wait_idle(&mut self) {
        while self.pending() > 0 {
            if !self.receive_one() {
                break;
            }
        }
    }

    /// Frames submitted but not yet reported complete
    pub fn pending(&self) -> u64 {
        self.submitted - self.completed
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Work done by every completed frame
    pub fn totals(&self) -> FrameReport {
        self.totals
    }

    fn receive_one(&mut self) -> bool {
        match self.reports.recv() {
            Ok(report) => {
                self.complete(&report);
                true
            }
            Err(_) => {
                gpu_error!(self.logger, SOURCE, "GPU timeline stopped with {} frames pending", self.pending());
                self.completed = self.submitted;
                false
            }
        }
    }

    fn complete(&mut self, report: &FrameReport) {
        self.completed += 1;
        self.totals.accumulate(report);
    }

    /// Drain pending frames and join the worker
    pub fn shutdown(&mut self) {
        self.wait_idle();
        self.submissions = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                gpu_error!(self.logger, SOURCE, "GPU timeline thread panicked");
            }
        }
    }
}

impl Drop for GpuTimeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
