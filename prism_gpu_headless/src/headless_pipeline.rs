/// HeadlessPipeline - immutable pipeline state and the compiled-state cache
///
/// Every field that affects rasterization goes into a `PipelineKey`.
/// Descriptors with equal keys share one `CompiledPipeline`; the cache only
/// holds weak references, so compiled state dies with its last pipeline.

use std::sync::{Arc, Weak};

use prism_gpu::pipeline::{
    BlendState, ColorMask, CullMode, DepthStencilState, IndexFormat, MultisampleState, Topology,
    VertexLayout, Winding,
};
use prism_gpu::{Canvas, Pipeline, PipelineDesc, PipelineInfo, RenderPassLayout};
use rustc_hash::FxHashMap;

use crate::headless_canvas::HeadlessCanvas;
use crate::headless_context::HeadlessContext;
use crate::headless_shader::HeadlessShader;
use crate::registry::{ResourceKey, ResourceKind};

/// Hashable identity of a pipeline's baked state
///
/// Depth offsets are compared bit for bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    shader: u64,
    layout: RenderPassLayout,
    vertex: VertexLayout,
    index_format: IndexFormat,
    topology: Topology,
    cull_mode: CullMode,
    winding: Winding,
    depth_offset: u32,
    depth_offset_sloped: u32,
    depth_stencil: DepthStencilState,
    multisample: MultisampleState,
    color_mask: ColorMask,
    blend: BlendState,
}

impl PipelineKey {
    pub(crate) fn new(desc: &PipelineDesc<'_, HeadlessShader, HeadlessCanvas>) -> Self {
        Self {
            shader: desc.shader.id(),
            layout: desc.canvas.info().layout.clone(),
            vertex: desc.vertex.clone(),
            index_format: desc.index_format,
            topology: desc.topology,
            cull_mode: desc.rasterization.cull_mode,
            winding: desc.rasterization.winding,
            depth_offset: desc.rasterization.depth_offset.to_bits(),
            depth_offset_sloped: desc.rasterization.depth_offset_sloped.to_bits(),
            depth_stencil: desc.depth_stencil,
            multisample: desc.multisample,
            color_mask: desc.color_mask,
            blend: desc.blend,
        }
    }
}

/// Baked state the GPU timeline executes against
#[derive(Debug)]
pub(crate) struct CompiledPipeline {
    pub key: PipelineKey,
}

impl CompiledPipeline {
    pub fn index_format(&self) -> IndexFormat {
        self.key.index_format
    }

    pub fn vertex(&self) -> &VertexLayout {
        &self.key.vertex
    }

    pub fn layout(&self) -> &RenderPassLayout {
        &self.key.layout
    }
}

/// Compiled pipeline state keyed by descriptor contents
#[derive(Default)]
pub(crate) struct PipelineCache {
    entries: FxHashMap<PipelineKey, Weak<CompiledPipeline>>,
}

impl PipelineCache {
    /// Return the compiled state for `key` and whether it was already compiled
    pub fn get_or_compile(&mut self, key: PipelineKey) -> (Arc<CompiledPipeline>, bool) {
        if let Some(compiled) = self.entries.get(&key).and_then(Weak::upgrade) {
            return (compiled, true);
        }
        // Entries whose pipelines are all gone
        self.entries.retain(|_, weak| weak.strong_count() > 0);

        let compiled = Arc::new(CompiledPipeline { key: key.clone() });
        self.entries.insert(key, Arc::downgrade(&compiled));
        (compiled, false)
    }

    /// Number of live compiled states
    pub fn len(&self) -> usize {
        self.entries.values().filter(|weak| weak.strong_count() > 0).count()
    }
}

/// Immutable pipeline
pub struct HeadlessPipeline {
    /// Shared device context
    ctx: Arc<HeadlessContext>,
    /// Registry key
    key: ResourceKey,
    /// Read-only properties
    info: PipelineInfo,
    /// Shared baked state
    compiled: Arc<CompiledPipeline>,
}

impl HeadlessPipeline {
    pub(crate) fn new(
        ctx: Arc<HeadlessContext>,
        compiled: Arc<CompiledPipeline>,
        label: Option<&str>,
    ) -> Self {
        let info = PipelineInfo {
            layout: compiled.key.layout.clone(),
            index_format: compiled.key.index_format,
            topology: compiled.key.topology,
            label: label.map(str::to_string),
        };
        let key = ctx.register(ResourceKind::Pipeline, label);
        Self { ctx, key, info, compiled }
    }

    pub(crate) fn compiled(&self) -> &Arc<CompiledPipeline> {
        &self.compiled
    }

    /// True if both pipelines were built from identical state and share it
    pub fn shares_state_with(&self, other: &HeadlessPipeline) -> bool {
        Arc::ptr_eq(&self.compiled, &other.compiled)
    }
}

impl Pipeline for HeadlessPipeline {
    fn info(&self) -> &PipelineInfo {
        &self.info
    }
}

impl Drop for HeadlessPipeline {
    fn drop(&mut self) {
        self.ctx.unregister(self.key);
    }
}
