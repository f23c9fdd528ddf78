/// Shader trait and shader descriptor

/// One shader stage: SPIR-V bytecode and the name of its entry point
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    /// SPIR-V words as little-endian bytes
    pub code: &'a [u8],
    /// Entry point name
    pub entry: &'a str,
}

impl<'a> ShaderSource<'a> {
    /// Stage with the conventional `main` entry point
    pub fn main(code: &'a [u8]) -> Self {
        Self { code, entry: "main" }
    }
}

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

/// Which pipeline type a shader can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Vertex + fragment
    Graphics,
    /// Compute only
    Compute,
}

/// Descriptor for creating a shader
///
/// Exactly one of the two layouts is valid: `vertex` + `fragment`, or
/// `compute` alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderDesc<'a> {
    /// Vertex stage
    pub vertex: Option<ShaderSource<'a>>,
    /// Fragment stage
    pub fragment: Option<ShaderSource<'a>>,
    /// Compute stage
    pub compute: Option<ShaderSource<'a>>,
    /// Debug label
    pub label: Option<&'a str>,
}

impl<'a> ShaderDesc<'a> {
    /// Graphics shader descriptor
    pub fn graphics(vertex: ShaderSource<'a>, fragment: ShaderSource<'a>) -> Self {
        Self { vertex: Some(vertex), fragment: Some(fragment), compute: None, label: None }
    }

    /// Compute shader descriptor
    pub fn compute(compute: ShaderSource<'a>) -> Self {
        Self { vertex: None, fragment: None, compute: Some(compute), label: None }
    }

    /// Set the debug label
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Stages present in the descriptor, in pipeline order
    pub fn stages(&self) -> Vec<(ShaderStage, ShaderSource<'a>)> {
        [
            (ShaderStage::Vertex, self.vertex),
            (ShaderStage::Fragment, self.fragment),
            (ShaderStage::Compute, self.compute),
        ]
        .into_iter()
        .filter_map(|(stage, source)| source.map(|s| (stage, s)))
        .collect()
    }
}

/// Shader resource trait
///
/// Implemented by backend-specific shader types (e.g., HeadlessShader).
/// Immutable after creation.
pub trait Shader: Send + Sync {
    /// Graphics or compute
    fn kind(&self) -> ShaderKind;

    /// Debug label
    fn label(&self) -> Option<&str>;

    /// Release the shader
    fn destroy(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}
