use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::gpu::mesh::{self, Mesh, MeshRegistry, Vertex};
use crate::gpu::overlay::Overlay;
use crate::gpu::texture::{self, TextureRegistry, DEPTH_FORMAT};
use crate::renderer::{OverlayState, RenderBackend, RenderCommand, SceneUniforms};

/// Dynamic-offset stride for per-object uniforms; matches the default
/// min_uniform_buffer_offset_alignment.
const OBJECT_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniformsGpu {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    light_view_projection: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_position: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
}

impl From<&SceneUniforms> for FrameUniformsGpu {
    fn from(u: &SceneUniforms) -> Self {
        Self {
            view: u.view.to_cols_array_2d(),
            projection: u.projection.to_cols_array_2d(),
            light_view_projection: u.light_view_projection.to_cols_array_2d(),
            camera_position: u.camera_position.extend(1.0).to_array(),
            light_position: u.light_position.extend(1.0).to_array(),
            ambient: u.ambient.extend(1.0).to_array(),
            diffuse: u.diffuse.extend(1.0).to_array(),
            specular: u.specular.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct AxisVertex {
    position: [f32; 3],
    color: [f32; 3],
}

const AXIS_VERTICES: [AxisVertex; 6] = [
    AxisVertex { position: [0.0, 0.0, 0.0], color: [1.0, 0.2, 0.2] },
    AxisVertex { position: [2.0, 0.0, 0.0], color: [1.0, 0.2, 0.2] },
    AxisVertex { position: [0.0, 0.0, 0.0], color: [0.2, 1.0, 0.2] },
    AxisVertex { position: [0.0, 2.0, 0.0], color: [0.2, 1.0, 0.2] },
    AxisVertex { position: [0.0, 0.0, 0.0], color: [0.3, 0.4, 1.0] },
    AxisVertex { position: [0.0, 0.0, 2.0], color: [0.3, 0.4, 1.0] },
];

/// The frame's draw schedule regrouped per pass, with each draw's dynamic
/// uniform offset already assigned. Offsets follow command order, matching
/// the model-matrix upload.
#[derive(Default)]
struct FramePlan<'a> {
    shadow_view_projection: Option<Mat4>,
    shadow_draws: Vec<(&'a str, u32)>,
    main: Option<(wgpu::Color, FrameUniformsGpu)>,
    axes_view_projection: Option<Mat4>,
    object_draws: Vec<(&'a str, &'a str, u32)>,
    skybox: Option<Mat4>,
    axes_draws: Vec<u32>,
    overlay: Option<&'a OverlayState>,
}

/// wgpu renderer: owns the surface, depth and shadow targets, the four
/// pipelines, and the mesh/texture registries. Replays the frame's command
/// list as three render passes plus the egui overlay.
pub struct WgpuBackend {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,

    depth_view: wgpu::TextureView,
    shadow_view: wgpu::TextureView,
    shadow_map_layout: wgpu::BindGroupLayout,
    shadow_map_sampler: wgpu::Sampler,
    shadow_map_bind_group: wgpu::BindGroup,

    frame_buffer: wgpu::Buffer,
    shadow_pass_buffer: wgpu::Buffer,
    skybox_buffer: wgpu::Buffer,
    axes_pass_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    shadow_pass_bind_group: wgpu::BindGroup,
    skybox_bind_group: wgpu::BindGroup,
    axes_pass_bind_group: wgpu::BindGroup,

    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: u64,

    shadow_pipeline: wgpu::RenderPipeline,
    scene_pipeline: wgpu::RenderPipeline,
    skybox_pipeline: wgpu::RenderPipeline,
    axes_pipeline: wgpu::RenderPipeline,
    axes_vertex_buffer: wgpu::Buffer,

    meshes: MeshRegistry,
    textures: TextureRegistry,
    overlay: Overlay,
}

impl WgpuBackend {
    pub async fn new(window: Arc<Window>, cat_model: Option<&Path>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("device request failed")?;

        let config = Self::create_surface_config(&surface, &adapter, size);
        surface.configure(&device, &config);

        let depth_view = texture::create_depth_texture(&device, size.width, size.height, "depth");
        let shadow_view =
            texture::create_depth_texture(&device, size.width, size.height, "shadow map");

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("pass_uniform_layout"),
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(64),
                },
                count: None,
            }],
            label: Some("object_layout"),
        });
        let shadow_map_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("shadow_map_layout"),
        });

        let shadow_map_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadow_map_bind_group = Self::create_shadow_map_bind_group(
            &device,
            &shadow_map_layout,
            &shadow_view,
            &shadow_map_sampler,
        );

        let make_uniform = |label: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let frame_buffer = make_uniform(
            "frame uniforms",
            std::mem::size_of::<FrameUniformsGpu>() as u64,
        );
        let shadow_pass_buffer = make_uniform("shadow pass uniforms", 64);
        let skybox_buffer = make_uniform("skybox uniforms", 64);
        let axes_pass_buffer = make_uniform("axes pass uniforms", 64);

        let make_bind_group = |label: &str, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some(label),
            })
        };
        let frame_bind_group = make_bind_group("frame uniforms", &frame_buffer);
        let shadow_pass_bind_group = make_bind_group("shadow pass uniforms", &shadow_pass_buffer);
        let skybox_bind_group = make_bind_group("skybox uniforms", &skybox_buffer);
        let axes_pass_bind_group = make_bind_group("axes pass uniforms", &axes_pass_buffer);

        let object_capacity = 1024;
        let (object_buffer, object_bind_group) =
            Self::create_object_buffer(&device, &object_layout, object_capacity);

        let mut textures = TextureRegistry::new(&device);
        textures.insert_builtins(&device, &queue);

        let mut meshes = MeshRegistry::default();
        let (vertices, indices) = mesh::cube();
        meshes.insert("cube", Mesh::upload(&device, "cube", &vertices, &indices));
        let (vertices, indices) = mesh::sphere(32, 16);
        meshes.insert("sphere", Mesh::upload(&device, "sphere", &vertices, &indices));
        let (vertices, indices) = match cat_model {
            Some(path) => mesh::load_gltf(path)?,
            None => mesh::cat_placeholder(),
        };
        meshes.insert("cat", Mesh::upload(&device, "cat", &vertices, &indices));

        let shadow_pipeline =
            Self::create_shadow_pipeline(&device, &uniform_layout, &object_layout);
        let scene_pipeline = Self::create_scene_pipeline(
            &device,
            config.format,
            &uniform_layout,
            &object_layout,
            textures.layout(),
            &shadow_map_layout,
        );
        let skybox_pipeline = Self::create_skybox_pipeline(&device, config.format, &uniform_layout);
        let axes_pipeline =
            Self::create_axes_pipeline(&device, config.format, &uniform_layout, &object_layout);

        let axes_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("axes vertices"),
            contents: bytemuck::cast_slice(&AXIS_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let overlay = Overlay::new(&device, config.format, &window);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            shadow_view,
            shadow_map_layout,
            shadow_map_sampler,
            shadow_map_bind_group,
            frame_buffer,
            shadow_pass_buffer,
            skybox_buffer,
            axes_pass_buffer,
            frame_bind_group,
            shadow_pass_bind_group,
            skybox_bind_group,
            axes_pass_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_capacity,
            shadow_pipeline,
            scene_pipeline,
            skybox_pipeline,
            axes_pipeline,
            axes_vertex_buffer,
            meshes,
            textures,
            overlay,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view =
            texture::create_depth_texture(&self.device, new_size.width, new_size.height, "depth");
        self.shadow_view = texture::create_depth_texture(
            &self.device,
            new_size.width,
            new_size.height,
            "shadow map",
        );
        self.shadow_map_bind_group = Self::create_shadow_map_bind_group(
            &self.device,
            &self.shadow_map_layout,
            &self.shadow_view,
            &self.shadow_map_sampler,
        );
    }

    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.overlay.handle_event(&self.window, event)
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> wgpu::SurfaceConfiguration {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    fn create_shadow_map_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        shadow_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("shadow_map_bind_group"),
        })
    }

    fn create_object_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object uniforms"),
            size: capacity * OBJECT_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(64),
                }),
            }],
            label: Some("object_bind_group"),
        });
        (buffer, bind_group)
    }

    fn create_shadow_pipeline(
        device: &wgpu::Device,
        uniform_layout: &wgpu::BindGroupLayout,
        object_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow pipeline layout"),
            bind_group_layouts: &[uniform_layout, object_layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_scene_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        uniform_layout: &wgpu::BindGroupLayout,
        object_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
        shadow_map_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene pipeline layout"),
            bind_group_layouts: &[
                uniform_layout,
                object_layout,
                texture_layout,
                shadow_map_layout,
            ],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_skybox_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        uniform_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/skybox.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox pipeline layout"),
            bind_group_layouts: &[uniform_layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            // Drawn at the far plane; LessEqual lets it fill exactly the
            // pixels no opaque object claimed.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_axes_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        uniform_layout: &wgpu::BindGroupLayout,
        object_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("axes shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/axes.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("axes pipeline layout"),
            bind_group_layouts: &[uniform_layout, object_layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("axes pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<AxisVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            // Gizmos ignore scene depth; compare Always is the depth-test-off
            // state for this pipeline.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Regroup the command list per pass and assign dynamic offsets, also
    /// collecting the model matrices in the same order.
    fn build_plan<'a>(commands: &'a [RenderCommand]) -> (FramePlan<'a>, Vec<Mat4>) {
        let mut plan = FramePlan::default();
        let mut models: Vec<Mat4> = Vec::new();

        for command in commands {
            match command {
                RenderCommand::BeginShadowPass {
                    light_view_projection,
                } => plan.shadow_view_projection = Some(*light_view_projection),
                RenderCommand::DrawShadow { mesh, model } => {
                    let offset = (models.len() as u64 * OBJECT_STRIDE) as u32;
                    models.push(*model);
                    plan.shadow_draws.push((mesh.as_str(), offset));
                }
                RenderCommand::BeginMainPass {
                    clear_color,
                    uniforms,
                } => {
                    let [r, g, b, a] = clear_color.map(f64::from);
                    plan.main = Some((wgpu::Color { r, g, b, a }, uniforms.into()));
                    plan.axes_view_projection = Some(uniforms.projection * uniforms.view);
                }
                RenderCommand::DrawObject {
                    mesh,
                    texture,
                    model,
                } => {
                    let offset = (models.len() as u64 * OBJECT_STRIDE) as u32;
                    models.push(*model);
                    plan.object_draws.push((mesh.as_str(), texture.as_str(), offset));
                }
                RenderCommand::DrawSkybox {
                    inverse_projection_view,
                } => plan.skybox = Some(*inverse_projection_view),
                RenderCommand::DrawAxes { model } => {
                    let offset = (models.len() as u64 * OBJECT_STRIDE) as u32;
                    models.push(*model);
                    plan.axes_draws.push(offset);
                }
                RenderCommand::DrawOverlay { overlay } => plan.overlay = Some(overlay),
                // Depth state is baked into each pipeline.
                RenderCommand::EndShadowPass
                | RenderCommand::EndMainPass
                | RenderCommand::SetDepthTest(_) => {}
            }
        }
        (plan, models)
    }

    fn upload_objects(&mut self, models: &[Mat4]) {
        let needed = models.len() as u64;
        if needed > self.object_capacity {
            self.object_capacity = needed.next_power_of_two();
            let (buffer, bind_group) = Self::create_object_buffer(
                &self.device,
                &self.object_layout,
                self.object_capacity,
            );
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
        }
        if models.is_empty() {
            return;
        }
        let mut bytes = vec![0u8; models.len() * OBJECT_STRIDE as usize];
        for (i, model) in models.iter().enumerate() {
            let start = i * OBJECT_STRIDE as usize;
            bytes[start..start + 64]
                .copy_from_slice(bytemuck::cast_slice(&model.to_cols_array()));
        }
        self.queue.write_buffer(&self.object_buffer, 0, &bytes);
    }
}

impl RenderBackend for WgpuBackend {
    fn has_mesh(&self, name: &str) -> bool {
        self.meshes.contains(name)
    }

    fn has_texture(&self, name: &str) -> bool {
        self.textures.contains(name)
    }

    fn execute(&mut self, commands: &[RenderCommand]) -> Result<()> {
        let (plan, models) = Self::build_plan(commands);
        self.upload_objects(&models);

        if let Some(view_projection) = plan.shadow_view_projection {
            self.queue.write_buffer(
                &self.shadow_pass_buffer,
                0,
                bytemuck::cast_slice(&view_projection.to_cols_array()),
            );
        }
        if let Some((_, uniforms)) = &plan.main {
            self.queue
                .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
        }
        if let Some(view_projection) = plan.axes_view_projection {
            self.queue.write_buffer(
                &self.axes_pass_buffer,
                0,
                bytemuck::cast_slice(&view_projection.to_cols_array()),
            );
        }
        if let Some(inverse) = plan.skybox {
            self.queue.write_buffer(
                &self.skybox_buffer,
                0,
                bytemuck::cast_slice(&inverse.to_cols_array()),
            );
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        // Shadow pass: depth only, from the light.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.shadow_pass_bind_group, &[]);
            for (mesh_name, offset) in &plan.shadow_draws {
                if let Some(mesh) = self.meshes.get(mesh_name) {
                    pass.set_bind_group(1, &self.object_bind_group, &[*offset]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        // Main pass: opaque objects, then the skybox.
        if let Some((clear_color, _)) = &plan.main {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(*clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.scene_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(3, &self.shadow_map_bind_group, &[]);
            for (mesh_name, texture_name, offset) in &plan.object_draws {
                let (Some(mesh), Some(texture)) =
                    (self.meshes.get(mesh_name), self.textures.get(texture_name))
                else {
                    continue;
                };
                pass.set_bind_group(1, &self.object_bind_group, &[*offset]);
                pass.set_bind_group(2, texture, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }

            if plan.skybox.is_some() {
                pass.set_pipeline(&self.skybox_pipeline);
                pass.set_bind_group(0, &self.skybox_bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }

        // Gizmo pass: depth test off.
        if !plan.axes_draws.is_empty() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("axes pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.axes_pipeline);
            pass.set_bind_group(0, &self.axes_pass_bind_group, &[]);
            pass.set_vertex_buffer(0, self.axes_vertex_buffer.slice(..));
            for offset in &plan.axes_draws {
                pass.set_bind_group(1, &self.object_bind_group, &[*offset]);
                pass.draw(0..AXIS_VERTICES.len() as u32, 0..1);
            }
        }

        if let Some(overlay) = plan.overlay {
            let window = Arc::clone(&self.window);
            self.overlay.draw(
                &self.device,
                &self.queue,
                &mut encoder,
                window.as_ref(),
                &view,
                self.size,
                overlay,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
