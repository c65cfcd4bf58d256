//! WGPU-based rendering engine for the editor
//!
//! Owns the surface, device and pipelines. Each frame it uploads whatever
//! scene resources are still CPU-only, writes the global and per-object
//! uniforms, then executes the [`FramePlan`] in a single render pass with the
//! UI overlay on top.

use std::sync::Arc;
use wgpu::{Device, TextureFormat};

use crate::{
    config::WindowConfig,
    gfx::{
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform},
            material::Material,
            texture::Texture,
            texture_resource::DepthBuffer,
        },
        scene::{
            object::{DrawObject, ShadingMode},
            scene::Scene,
        },
    },
    wgpu_utils::{binding_types, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
};

use super::{
    frame_composer::{DrawItem, FramePlan},
    pipeline_manager::{PipelineConfig, PipelineManager},
};

const SKY_PIPELINE: &str = "Sky";
const OPAQUE_PIPELINE: &str = "Opaque";
const TRANSPARENT_PIPELINE: &str = "Transparent";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_buffer: DepthBuffer,
    format: TextureFormat,
    clear_color: wgpu::Color,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    object_layout: BindGroupLayoutWithDesc,
    material_layout: BindGroupLayoutWithDesc,
    texture_layout: BindGroupLayoutWithDesc,
}

impl RenderEngine {
    /// Creates a render engine for the given window
    ///
    /// # Panics
    /// Panics if no adapter or device is available; nothing can run without one.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        window_config: &WindowConfig,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .expect("Failed to create a surface for the window!");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");
        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request a device!");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(window_config.vsync),
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_buffer = DepthBuffer::new(&device, &config);

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let object_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(&device, "Object Bind Group Layout");
        let material_layout = Material::bind_group_layout(&device);
        let texture_layout = Texture::bind_group_layout(&device);

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));
        pipeline_manager.load_shader("sky", include_str!("sky.wgsl"));

        // Sky sits at the far plane: drawn first, never writes depth
        pipeline_manager.register_pipeline(
            SKY_PIPELINE,
            PipelineConfig::default_with_shader("sky")
                .with_label("SKY")
                .with_bind_group_layouts(vec![global_bindings.bind_group_layout().clone()])
                .with_depth(DepthBuffer::FORMAT, false, wgpu::CompareFunction::LessEqual)
                .with_color_target(format, Some(wgpu::BlendState::REPLACE))
                .with_cull_mode(None)
                .with_no_vertex_buffers(),
        );

        let scene_layouts = vec![
            global_bindings.bind_group_layout().clone(),
            object_layout.layout.clone(),
            material_layout.layout.clone(),
            texture_layout.layout.clone(),
        ];

        pipeline_manager.register_pipeline(
            OPAQUE_PIPELINE,
            PipelineConfig::default_with_shader("scene")
                .with_label("OPAQUE")
                .with_bind_group_layouts(scene_layouts.clone())
                .with_depth(DepthBuffer::FORMAT, true, wgpu::CompareFunction::Less)
                .with_color_target(format, None)
                .with_cull_mode(None),
        );

        pipeline_manager.register_pipeline(
            TRANSPARENT_PIPELINE,
            PipelineConfig::default_with_shader("scene")
                .with_label("TRANSPARENT")
                .with_bind_group_layouts(scene_layouts)
                .with_depth(DepthBuffer::FORMAT, false, wgpu::CompareFunction::Less)
                .with_color_target(format, Some(wgpu::BlendState::ALPHA_BLENDING))
                .with_cull_mode(None),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }

        let [r, g, b, a] = window_config.clear_color;

        RenderEngine {
            device: device_handle,
            config,
            format,
            surface,
            queue: queue_handle,
            depth_buffer,
            clear_color: wgpu::Color { r, g, b, a },
            pipeline_manager,
            global_bindings,
            global_ubo,
            object_layout,
            material_layout,
            texture_layout,
        }
    }

    /// Uploads pending GPU resources and writes this frame's uniforms
    pub fn prepare(&mut self, scene: &mut Scene) -> FramePlan {
        scene
            .objects_mut()
            .init_gpu_resources(&self.device, &self.object_layout);
        scene
            .materials
            .update_gpu_resources(&self.device, &self.queue, &self.material_layout);
        scene
            .textures
            .update_gpu_resources(&self.device, &self.queue, &self.texture_layout);

        let globals = GlobalUniform::new(
            &scene.camera().uniform,
            scene.lights(),
            scene.settings(),
        );
        self.global_ubo.update_content(&self.queue, globals);

        let plan = FramePlan::compose(scene.objects(), scene.camera().position, scene.settings());
        let objects = scene.objects_mut();
        for item in plan.draw_order() {
            if let Some(object) = objects.get_mut(item.index) {
                object.update_uniform(&self.queue, item.uniform);
            }
        }
        plan
    }

    /// Renders one frame with an optional UI overlay
    ///
    /// Surface errors are returned so the caller can reconfigure or skip the frame.
    pub fn render_frame<F>(
        &mut self,
        scene: &mut Scene,
        ui_callback: Option<F>,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = self.surface.get_current_texture()?;
        let plan = self.prepare(scene);
        let scene: &Scene = scene;

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_buffer.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if plan.draw_sky {
                if let Some(pipeline) = self.pipeline_manager.pipeline(SKY_PIPELINE) {
                    render_pass.set_pipeline(pipeline);
                    render_pass.draw(0..3, 0..1);
                }
            }

            if let Some(pipeline) = self.pipeline_manager.pipeline(OPAQUE_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                for item in &plan.opaque {
                    draw_item(&mut render_pass, scene, item);
                }
            }

            if let Some(pipeline) = self.pipeline_manager.pipeline(TRANSPARENT_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                for item in &plan.transparent {
                    draw_item(&mut render_pass, scene, item);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the surface and recreates the depth buffer; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_buffer = DepthBuffer::new(&self.device, &self.config);
    }

    /// Reconfigures the surface at its current size, after it was lost or outdated
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = present_mode(enable);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Binds one object's uniform, material and texture, then draws its geometry
///
/// Objects whose resources are not on the GPU yet are skipped for this frame.
fn draw_item<'a>(render_pass: &mut wgpu::RenderPass<'a>, scene: &'a Scene, item: &DrawItem) {
    let Some(object) = scene.objects().get(item.index) else {
        return;
    };
    let Some(resources) = object.gpu_resources() else {
        log::debug!("Skipping {}, not uploaded yet", object.name());
        return;
    };

    let material = match item.mode {
        ShadingMode::Pbr(handle) => handle,
        _ => scene.materials.default_handle(),
    };
    let texture = match item.mode {
        ShadingMode::Texture(handle) => handle,
        _ => scene.textures.default_handle(),
    };
    let (Some(material_group), Some(texture_group)) = (
        scene.materials.bind_group(material),
        scene.textures.bind_group(texture),
    ) else {
        log::debug!("Skipping {}, material or texture not uploaded", object.name());
        return;
    };

    render_pass.set_bind_group(1, &resources.bind_group, &[]);
    render_pass.set_bind_group(2, material_group, &[]);
    render_pass.set_bind_group(3, texture_group, &[]);
    render_pass.draw_geometry(object.geometry());
}
