/// HeadlessShader - SPIR-V validated shader
///
/// Each stage is decoded, reflected with spirq, and checked for an entry
/// point with the requested name and the stage's execution model. Nothing is
/// executed: the headless timeline only counts the work shaders would do.

use std::sync::Arc;

use prism_gpu::validation::{decode_spirv, validate_shader_stages};
use prism_gpu::{gpu_debug, Error, Result, Shader, ShaderDesc, ShaderKind, ShaderSource, ShaderStage};

use crate::headless_context::{HeadlessContext, SOURCE};
use crate::registry::{ResourceKey, ResourceKind};

/// Name spirq gives the execution model each stage needs
fn execution_model_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "Vertex",
        ShaderStage::Fragment => "Fragment",
        ShaderStage::Compute => "GLCompute",
    }
}

/// Check one stage and return its word count
pub(crate) fn validate_stage(stage: ShaderStage, source: &ShaderSource) -> Result<usize> {
    let words = decode_spirv(source.code)?;

    let entry_points = spirq::ReflectConfig::new()
        .spv(words.as_slice())
        .reflect()
        .map_err(|e| Error::ValidationFailed(format!("{:?} stage: SPIR-V reflection failed: {:?}", stage, e)))?;

    let wanted = execution_model_name(stage);
    let entry = entry_points.iter().find(|ep| ep.name == source.entry).ok_or_else(|| {
        Error::ValidationFailed(format!("{:?} stage has no entry point named '{}'", stage, source.entry))
    })?;

    let model = format!("{:?}", entry.exec_model);
    if model != wanted {
        return Err(Error::ValidationFailed(format!(
            "entry point '{}' is a {} shader, expected {}",
            source.entry, model, wanted
        )));
    }

    Ok(words.len())
}

/// Validated shader
pub struct HeadlessShader {
    /// Shared device context
    ctx: Arc<HeadlessContext>,
    /// Registry key
    key: ResourceKey,
    /// Device-unique id, part of the pipeline cache key
    id: u64,
    /// Graphics or compute
    kind: ShaderKind,
    /// Stage and entry point name
    entry_points: Vec<(ShaderStage, String)>,
    /// Debug label
    label: Option<String>,
}

impl HeadlessShader {
    /// Validate every stage and build the shader
    pub(crate) fn new(ctx: Arc<HeadlessContext>, id: u64, desc: &ShaderDesc) -> Result<Self> {
        let kind = validate_shader_stages(desc)?;

        let mut entry_points = Vec::new();
        for (stage, source) in desc.stages() {
            let words = validate_stage(stage, &source)?;
            gpu_debug!(ctx.logger, SOURCE, "{:?} stage '{}' ok ({} words)", stage, source.entry, words);
            entry_points.push((stage, source.entry.to_string()));
        }

        let key = ctx.register(ResourceKind::Shader, desc.label);
        Ok(Self { ctx, key, id, kind, entry_points, label: desc.label.map(str::to_string) })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Stages and their entry point names, in pipeline order
    pub fn entry_points(&self) -> &[(ShaderStage, String)] {
        &self.entry_points
    }
}

impl Shader for HeadlessShader {
    fn kind(&self) -> ShaderKind {
        self.kind
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Drop for HeadlessShader {
    fn drop(&mut self) {
        self.ctx.unregister(self.key);
    }
}
