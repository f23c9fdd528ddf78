/// Pipeline trait and pipeline descriptor
///
/// A pipeline bakes a shader, a canvas layout, the vertex layout and every
/// piece of fixed-function state into one immutable object. Binding it at
/// draw time is a single state swap.

use bitflags::bitflags;

use crate::canvas::RenderPassLayout;

/// Maximum number of vertex buffer layout slots
pub const MAX_VERTEX_BUFFERS: usize = 16;

/// Maximum number of vertex attributes
pub const MAX_VERTEX_ATTRIBUTES: usize = 16;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

impl IndexFormat {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// Vertex attribute data format and encoding
///
/// `N` suffix: normalized integer (read as float in [0, 1] or [-1, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    F32,
    Vec2F32,
    Vec2F16,
    Vec2U16N,
    Vec2I16N,
    Vec3F32,
    Vec4F32,
    Vec4F16,
    Vec4U16N,
    Vec4I16N,
    Vec4U8N,
    Vec4I8N,
    U32,
    UVec2U32,
    UVec3U32,
    UVec4U32,
    I32,
    IVec2I32,
    IVec3I32,
    IVec4I32,
}

impl VertexFormat {
    /// Size in bytes of one attribute value
    pub fn size_bytes(&self) -> u32 {
        match self {
            VertexFormat::Vec4U8N | VertexFormat::Vec4I8N => 4,
            VertexFormat::F32 | VertexFormat::U32 | VertexFormat::I32 => 4,
            VertexFormat::Vec2F16 | VertexFormat::Vec2U16N | VertexFormat::Vec2I16N => 4,
            VertexFormat::Vec2F32 | VertexFormat::UVec2U32 | VertexFormat::IVec2I32 => 8,
            VertexFormat::Vec4F16 | VertexFormat::Vec4U16N | VertexFormat::Vec4I16N => 8,
            VertexFormat::Vec3F32 | VertexFormat::UVec3U32 | VertexFormat::IVec3I32 => 12,
            VertexFormat::Vec4F32 | VertexFormat::UVec4U32 | VertexFormat::IVec4I32 => 16,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Index into `VertexLayout::buffers`
    pub buffer: u32,
    /// Data format of the attribute
    pub format: VertexFormat,
    /// Offset in bytes from the start of the element
    pub offset: u32,
}

/// Vertex buffer slot description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    /// Stride in bytes between consecutive elements (0 = every vertex reads the same element)
    pub stride: u16,
    /// Instance divisor (0 = per-vertex, N = advance once every N instances)
    pub divisor: u16,
}

/// Vertex input layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Buffer slots (at most `MAX_VERTEX_BUFFERS`)
    pub buffers: Vec<VertexBufferLayout>,
    /// Attributes (at most `MAX_VERTEX_ATTRIBUTES`)
    pub attributes: Vec<VertexAttribute>,
}

// ===== RASTERIZATION ENUMS =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    /// Counter-clockwise vertices define the front face
    CounterClockwise,
    /// Clockwise vertices define the front face
    Clockwise,
}

// ===== DEPTH/STENCIL ENUMS =====

/// Comparison for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareMode {
    /// Test disabled (always passes)
    None,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Stencil action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilAction {
    Keep,
    Zero,
    Replace,
    Increment,
    Decrement,
    IncrementWrap,
    DecrementWrap,
    Invert,
}

/// Per-face stencil state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    /// Action when the stencil test fails
    pub fail: StencilAction,
    /// Action when the stencil test passes and the depth test fails
    pub depth_fail: StencilAction,
    /// Action when both tests pass
    pub pass: StencilAction,
    /// Comparison against the reference value
    pub test: CompareMode,
    /// Bits read for the comparison
    pub read_mask: u8,
    /// Bits written
    pub write_mask: u8,
    /// Reference value
    pub reference: u8,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            fail: StencilAction::Keep,
            depth_fail: StencilAction::Keep,
            pass: StencilAction::Keep,
            test: CompareMode::None,
            read_mask: 0xFF,
            write_mask: 0xFF,
            reference: 0,
        }
    }
}

// ===== COLOR BLEND ENUMS =====

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    /// src * srcFactor + dst * dstFactor
    Add,
    /// src * srcFactor - dst * dstFactor
    Sub,
    /// dst * dstFactor - src * srcFactor
    RevSub,
    /// min(src, dst)
    Min,
    /// max(src, dst)
    Max,
}

/// Blend equation for one set of channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub op: BlendOp,
}

impl BlendComponent {
    /// Source replaces destination
    pub const REPLACE: Self = Self { src: BlendFactor::One, dst: BlendFactor::Zero, op: BlendOp::Add };

    /// Premultiplied-alpha "over"
    pub const ALPHA: Self = Self {
        src: BlendFactor::One,
        dst: BlendFactor::OneMinusSrcAlpha,
        op: BlendOp::Add,
    };
}

/// Color blending state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// RGB equation
    pub color: BlendComponent,
    /// Alpha equation
    pub alpha: BlendComponent,
    /// Enable blending
    pub enabled: bool,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            color: BlendComponent::REPLACE,
            alpha: BlendComponent::REPLACE,
            enabled: false,
        }
    }
}

bitflags! {
    /// Per-channel color write mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorMask: u8 {
        const R = 1 << 0;
        const G = 1 << 1;
        const B = 1 << 2;
        const A = 1 << 3;
    }
}

// ===== FIXED-FUNCTION STATE =====

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    /// Face culling mode
    pub cull_mode: CullMode,
    /// Front face winding order
    pub winding: Winding,
    /// Constant depth offset
    pub depth_offset: f32,
    /// Slope-scaled depth offset
    pub depth_offset_sloped: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::None,
            winding: Winding::CounterClockwise,
            depth_offset: 0.0,
            depth_offset_sloped: 0.0,
        }
    }
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// Write to the depth buffer
    pub depth_write: bool,
    /// Depth comparison (`None` disables the test)
    pub depth_test: CompareMode,
    /// Stencil state for front faces
    pub stencil_front: StencilState,
    /// Stencil state for back faces
    pub stencil_back: StencilState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_write: false,
            depth_test: CompareMode::None,
            stencil_front: StencilState::default(),
            stencil_back: StencilState::default(),
        }
    }
}

/// Multisampling state (the sample count comes from the canvas)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MultisampleState {
    /// Enable alpha-to-coverage
    pub alpha_to_coverage: bool,
}

// ===== PIPELINE DESCRIPTOR =====

/// Descriptor for creating a graphics pipeline
///
/// The shader and canvas are borrowed, not owned: the pipeline records what
/// it needs from them at creation.
#[derive(Debug)]
pub struct PipelineDesc<'a, S: ?Sized, C: ?Sized> {
    /// Graphics shader
    pub shader: &'a S,
    /// Canvas whose layout the pipeline renders into
    pub canvas: &'a C,
    /// Vertex input layout
    pub vertex: VertexLayout,
    /// Index element width used by indexed draws
    pub index_format: IndexFormat,
    /// Primitive topology
    pub topology: Topology,
    /// Rasterization state
    pub rasterization: RasterizationState,
    /// Depth and stencil state
    pub depth_stencil: DepthStencilState,
    /// Multisample state
    pub multisample: MultisampleState,
    /// Channels written to color attachments
    pub color_mask: ColorMask,
    /// Blend state
    pub blend: BlendState,
    /// Debug label
    pub label: Option<&'a str>,
}

impl<'a, S: ?Sized, C: ?Sized> PipelineDesc<'a, S, C> {
    /// Triangle-list pipeline with default fixed-function state and no vertex input
    pub fn new(shader: &'a S, canvas: &'a C) -> Self {
        Self {
            shader,
            canvas,
            vertex: VertexLayout::default(),
            index_format: IndexFormat::U16,
            topology: Topology::Triangles,
            rasterization: RasterizationState::default(),
            depth_stencil: DepthStencilState::default(),
            multisample: MultisampleState::default(),
            color_mask: ColorMask::all(),
            blend: BlendState::default(),
            label: None,
        }
    }

    /// Set the vertex layout
    pub fn with_vertex_layout(mut self, vertex: VertexLayout) -> Self {
        self.vertex = vertex;
        self
    }

    /// Set the debug label
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }
}

/// Read-only properties of a created pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineInfo {
    /// Layout of the canvas the pipeline was built against
    pub layout: RenderPassLayout,
    /// Index element width
    pub index_format: IndexFormat,
    /// Primitive topology
    pub topology: Topology,
    /// Debug label
    pub label: Option<String>,
}

/// Pipeline resource trait
///
/// Implemented by backend-specific pipeline types (e.g., HeadlessPipeline).
pub trait Pipeline: Send + Sync {
    /// Get the read-only properties of this pipeline
    fn info(&self) -> &PipelineInfo;

    /// Release the pipeline (the shader and canvas are untouched)
    fn destroy(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
