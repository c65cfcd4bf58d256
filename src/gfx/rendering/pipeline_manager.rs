//! Render pipeline management for wgpu
//!
//! Pipelines are registered as configurations, built in one batch once the
//! device is ready, and looked up by name every frame.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Everything that varies between the editor's render pipelines
///
/// Topology is always a triangle list and multisampling is off.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub depth_write: bool,
    pub depth_compare: CompareFunction,
    pub color_targets: Vec<Option<ColorTargetState>>,
    /// For fullscreen passes that generate their vertices in the shader
    pub no_vertex_buffers: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "scene".to_string(),
            bind_group_layouts: Vec::new(),
            cull_mode: Some(Face::Back),
            depth_format: None,
            depth_write: true,
            depth_compare: CompareFunction::Less,
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            no_vertex_buffers: false,
        }
    }
}

impl PipelineConfig {
    pub fn default_with_shader(shader: &str) -> Self {
        Self {
            shader: shader.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a buffer of `format`
    pub fn with_depth(mut self, format: TextureFormat, write: bool, compare: CompareFunction) -> Self {
        self.depth_format = Some(format);
        self.depth_write = write;
        self.depth_compare = compare;
        self
    }

    /// Single color target of `format` with the given blend state
    pub fn with_color_target(mut self, format: TextureFormat, blend: Option<BlendState>) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend,
            write_mask: ColorWrites::ALL,
        })];
        self
    }

    pub fn with_no_vertex_buffers(mut self) -> Self {
        self.no_vertex_buffers = true;
        self
    }

    pub fn depth_stencil(&self) -> Option<DepthStencilState> {
        self.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: self.depth_write,
            depth_compare: self.depth_compare,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        })
    }

    pub fn blend(&self) -> Option<BlendState> {
        self.color_targets
            .first()
            .and_then(|target| target.as_ref())
            .and_then(|target| target.blend)
    }
}

/// Failure to turn a registered configuration into a pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline '{pipeline}' needs shader '{shader}', which was never loaded")]
    MissingShader { pipeline: String, shader: String },
}

/// Named pipelines built from registered configurations
///
/// Configurations are kept after creation so a pipeline can be rebuilt by
/// registering its name again.
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    configs: HashMap<String, PipelineConfig>,
    shaders: HashMap<String, ShaderModule>,
    pending: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            configs: HashMap::new(),
            shaders: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Registers a configuration; re-registering drops the built pipeline
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.remove(name);
        self.configs.insert(name.to_string(), config);
        if !self.pending.iter().any(|n| n == name) {
            self.pending.push(name.to_string());
        }
    }

    /// Compiles a WGSL shader module under `name`
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shaders.insert(name.to_string(), module);
    }

    pub fn pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Builds every pending pipeline
    ///
    /// Failed ones stay pending and their errors are returned together.
    pub fn create_all_pipelines(&mut self) -> Result<(), Vec<PipelineError>> {
        let mut errors = Vec::new();

        for name in std::mem::take(&mut self.pending) {
            let Some(config) = self.configs.get(&name) else {
                continue;
            };
            match self.create_pipeline(&name, config) {
                Ok(pipeline) => {
                    log::debug!("Created pipeline '{}'", name);
                    self.pipelines.insert(name, pipeline);
                }
                Err(err) => {
                    errors.push(err);
                    self.pending.push(name);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn create_pipeline(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, PipelineError> {
        let shader = self
            .shaders
            .get(&config.shader)
            .ok_or_else(|| PipelineError::MissingShader {
                pipeline: name.to_string(),
                shader: config.shader.clone(),
            })?;

        let layouts: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let vertex_buffers: &[VertexBufferLayout] = if config.no_vertex_buffers {
            &[]
        } else {
            &[Vertex3D::desc()]
        };

        Ok(self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    ..Default::default()
                },
                depth_stencil: config.depth_stencil(),
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_opaque_depth_less() {
        let config = PipelineConfig::default_with_shader("scene");
        assert_eq!(config.shader, "scene");
        assert_eq!(config.blend(), Some(BlendState::REPLACE));
        assert!(config.depth_format.is_none());
        assert!(config.depth_write);
        assert_eq!(config.depth_compare, CompareFunction::Less);
    }

    #[test]
    fn test_builder_sets_depth_and_blend() {
        let config = PipelineConfig::default()
            .with_label("Sky")
            .with_depth(TextureFormat::Depth32Float, false, CompareFunction::LessEqual)
            .with_color_target(TextureFormat::Rgba8Unorm, Some(BlendState::ALPHA_BLENDING))
            .with_cull_mode(None)
            .with_no_vertex_buffers();

        assert_eq!(config.label, "Sky");
        assert_eq!(config.depth_format, Some(TextureFormat::Depth32Float));
        assert!(!config.depth_write);
        assert_eq!(config.depth_compare, CompareFunction::LessEqual);
        assert_eq!(config.blend(), Some(BlendState::ALPHA_BLENDING));
        assert!(config.cull_mode.is_none());
        assert!(config.no_vertex_buffers);

        let depth = config.depth_stencil().unwrap();
        assert!(!depth.depth_write_enabled);
        assert_eq!(depth.format, TextureFormat::Depth32Float);
    }

    #[test]
    fn test_missing_shader_error_names_both() {
        let err = PipelineError::MissingShader {
            pipeline: "Opaque".into(),
            shader: "scene".into(),
        };
        let message = err.to_string();
        assert!(message.contains("Opaque") && message.contains("scene"));
    }
}
