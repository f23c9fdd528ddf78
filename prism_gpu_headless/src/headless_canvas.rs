/// HeadlessCanvas - host-memory implementation of the Canvas trait
///
/// Holds the storage windows of its attachments and their load operations.
/// The attachment textures are not owned: dropping the canvas leaves them
/// alive, and the canvas keeps their memory reachable for frames in flight.

use std::sync::Arc;

use prism_gpu::gpu_trace;
use prism_gpu::{Canvas, CanvasDesc, CanvasInfo, LoadOp, RenderPassLayout, Texture};

use crate::headless_context::{HeadlessContext, SOURCE};
use crate::headless_texture::{AttachmentTarget, HeadlessTexture};
use crate::registry::{ResourceKey, ResourceKind};

/// A color attachment ready for the GPU timeline
#[derive(Clone)]
pub(crate) struct ColorTarget {
    pub target: AttachmentTarget,
    pub load: LoadOp<[f32; 4]>,
}

/// The depth/stencil attachment ready for the GPU timeline
#[derive(Clone)]
pub(crate) struct DepthTarget {
    pub target: AttachmentTarget,
    pub load: LoadOp<f32>,
    pub stencil_load: LoadOp<u8>,
}

/// Everything a render pass needs from a canvas, cloned into the recorded frame
#[derive(Clone)]
pub(crate) struct CanvasTargets {
    pub color: Vec<ColorTarget>,
    pub depth: Option<DepthTarget>,
}

/// Host-memory canvas
pub struct HeadlessCanvas {
    /// Shared device context
    ctx: Arc<HeadlessContext>,
    /// Registry key
    key: ResourceKey,
    /// Read-only properties
    info: CanvasInfo,
    /// Attachment storage and load ops
    targets: CanvasTargets,
}

impl HeadlessCanvas {
    /// Build a canvas (descriptor already validated)
    pub(crate) fn new(ctx: Arc<HeadlessContext>, desc: &CanvasDesc<'_, HeadlessTexture>) -> Self {
        let color: Vec<ColorTarget> = desc
            .color
            .iter()
            .map(|a| ColorTarget {
                target: a.texture.attachment_target(a.level, a.layer, desc.views),
                load: a.load,
            })
            .collect();
        let depth = desc.depth.as_ref().map(|d| DepthTarget {
            target: d.texture.attachment_target(0, 0, desc.views),
            load: d.load,
            stencil_load: d.stencil_load,
        });

        let layout = RenderPassLayout {
            color_formats: desc.color.iter().map(|a| a.texture.info().format).collect(),
            depth_format: desc.depth.as_ref().map(|d| d.texture.info().format),
            samples: desc.samples,
            views: desc.views,
        };

        let key = ctx.register(ResourceKind::Canvas, desc.label);
        gpu_trace!(
            ctx.logger,
            SOURCE,
            "Created canvas {:?} ({}x{}, {} color, depth: {}, {} samples, {} views)",
            desc.label, desc.size[0], desc.size[1], color.len(), depth.is_some(), desc.samples, desc.views
        );

        Self {
            ctx,
            key,
            info: CanvasInfo { size: desc.size, layout, label: desc.label.map(str::to_string) },
            targets: CanvasTargets { color, depth },
        }
    }

    pub(crate) fn targets(&self) -> &CanvasTargets {
        &self.targets
    }
}

impl Canvas for HeadlessCanvas {
    fn info(&self) -> &CanvasInfo {
        &self.info
    }
}

impl Drop for HeadlessCanvas {
    fn drop(&mut self) {
        self.ctx.unregister(self.key);
    }
}
