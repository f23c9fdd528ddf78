/*!
# Prism GPU

Core traits and types for the Prism GPU abstraction layer.

This crate describes graphics resources and the command-submission protocol
independently of any graphics API. Backends (e.g. `prism_gpu_headless`)
implement the `Device` trait with their own concrete resource types, so a
program is compiled against exactly one backend (static dispatch).

## Architecture

- **Device**: Resource factory and frame/command driver
- **Buffer**: Linear memory with map/discard
- **Texture**: Pixel storage, including views that share another texture's memory
- **Canvas**: Color + depth/stencil attachments rendered together
- **Shader**: Validated SPIR-V stages (graphics or compute)
- **Pipeline**: Shader + canvas layout + fixed-function state, immutable

## Frame lifecycle

```text
frame_wait
    render_begin(canvas)
        set_pipeline / set_vertex_buffers / set_index_buffer
        draw / draw_indexed / draw_indirect / draw_indirect_indexed
    render_finish
    compute(shader, x, y, z)
frame_finish
```

Construction-time problems are reported as `Err`. Out-of-order commands are
contract violations checked by debug assertions only.
*/

pub mod buffer;
pub mod canvas;
pub mod capabilities;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod log;
pub mod pipeline;
pub mod shader;
pub mod texture;
pub mod validation;

// Error types
pub use crate::error::{Error, Result};

// Context
pub use crate::config::{GpuConfig, ProcAddressResolver};
pub use crate::capabilities::{Features, Limits};

// Device and resource traits
pub use crate::device::Device;
pub use crate::buffer::{Buffer, BufferDesc, BufferInfo, BufferUsage, MappedRange};
pub use crate::texture::{
    Texture, TextureDesc, TextureFormat, TextureInfo, TextureType, TextureUsage, TextureViewDesc,
};
pub use crate::canvas::{
    Canvas, CanvasDesc, CanvasInfo, ColorAttachment, DepthAttachment, LoadOp, RenderPassLayout,
};
pub use crate::shader::{Shader, ShaderDesc, ShaderKind, ShaderSource, ShaderStage};
pub use crate::pipeline::{Pipeline, PipelineDesc, PipelineInfo};

// Commands
pub use crate::command::{
    DrawIndexedIndirectArgs, DrawIndirectArgs, FrameState, FrameStateMachine, GpuStats,
};
