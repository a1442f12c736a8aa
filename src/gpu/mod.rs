//! GPU state: device bring-up, the two point-cloud pipelines, and the
//! per-frame uniform push.
//!
//! The instance buffer is exclusively owned here; it is replaced wholesale
//! by [`GpuState::upload_instances`] when the field regenerates and never
//! mutated in place. Uniforms are the only per-frame GPU writes.

#[cfg(feature = "egui")]
pub mod egui_integration;

use std::sync::Arc;

use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::GpuError;
use crate::params::GalaxyParams;
use crate::shader::{RenderMode, StarInstance, Uniforms, GALAXY_SHADER, POINTS_SHADER, STAR_ATTRIBUTES};

#[cfg(feature = "egui")]
use egui_integration::{EguiFrameOutput, EguiLayer};

/// Orbit camera around the galactic center.
pub struct Camera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
}

impl Camera {
    fn new(distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.55,
            distance,
            target: Vec3::ZERO,
        }
    }

    fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// None when the animated shader failed validation; the classic path
    /// then serves as the fallback.
    animated_pipeline: Option<wgpu::RenderPipeline>,
    classic_pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    pub camera: Camera,
    mode: RenderMode,
    /// Cumulative rotation for the classic mode's model matrix.
    model_angle: f32,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        instances: &[StarInstance],
        mode: RenderMode,
        camera_distance: f32,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Instance Buffer"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Galaxy Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        // The classic pipeline is the baseline; a failure here is fatal.
        let classic_module = create_shader_checked(&device, "Points Shader", POINTS_SHADER)?;
        let classic_pipeline = build_pipeline(
            &device,
            &classic_module,
            &pipeline_layout,
            config.format,
            "Points Pipeline",
        );

        // The animated pipeline falls back to classic points if its shader
        // does not validate, rather than silently rendering nothing.
        let animated_pipeline =
            match create_shader_checked(&device, "Galaxy Shader", GALAXY_SHADER) {
                Ok(module) => Some(build_pipeline(
                    &device,
                    &module,
                    &pipeline_layout,
                    config.format,
                    "Galaxy Pipeline",
                )),
                Err(e) => {
                    log::warn!("animated shader unavailable, using classic points: {}", e);
                    None
                }
            };

        let mut state = Self {
            surface,
            device,
            queue,
            config,
            animated_pipeline,
            classic_pipeline,
            instance_buffer,
            instance_count: instances.len() as u32,
            uniform_buffer,
            uniform_bind_group,
            camera: Camera::new(camera_distance),
            mode: RenderMode::Classic,
            model_angle: 0.0,
        };
        state.set_mode(mode);
        Ok(state)
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Replace the instance buffer wholesale after a regeneration or a mode
    /// switch. O(count); never runs on a purely cosmetic change.
    pub fn upload_instances(&mut self, instances: &[StarInstance]) {
        self.instance_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Star Instance Buffer"),
                contents: bytemuck::cast_slice(instances),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.instance_count = instances.len() as u32;
    }

    /// Select the render mode, falling back to classic when the animated
    /// pipeline is unavailable. Returns the mode actually in effect.
    pub fn set_mode(&mut self, mode: RenderMode) -> RenderMode {
        self.mode = match mode {
            RenderMode::Animated if self.animated_pipeline.is_none() => RenderMode::Classic,
            m => m,
        };
        self.mode
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn animated_available(&self) -> bool {
        self.animated_pipeline.is_some()
    }

    /// Push this frame's uniforms. Touches exactly one uniform buffer and
    /// never the vertex data, keeping the per-frame cost independent of the
    /// particle count.
    pub fn push_frame_uniforms(&mut self, params: &GalaxyParams, time: f32, delta: f32) {
        let model = match self.mode {
            RenderMode::Animated => Mat4::IDENTITY,
            RenderMode::Classic => {
                // The classic path rotates the whole cloud cumulatively.
                self.model_angle += delta * params.rotation_speed;
                Mat4::from_rotation_y(self.model_angle)
            }
        };

        let aspect = self.config.width as f32 / self.config.height as f32;
        let uniforms = Uniforms {
            view: self.camera.view_matrix().to_cols_array_2d(),
            proj: projection_matrix(aspect).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            inside_color: params.inside_color.to_array(),
            time,
            outside_color: params.outside_color.to_array(),
            rotation_speed: params.rotation_speed,
            size: params.size,
            max_radius: params.radius.max(f32::EPSILON),
            delta_time: delta,
            _pad: 0.0,
        };

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn render(
        &mut self,
        #[cfg(feature = "egui")] egui_frame: Option<(&mut EguiLayer, EguiFrameOutput)>,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        #[cfg(feature = "egui")]
        let egui_prepared = egui_frame.map(|(layer, frame)| {
            let screen = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: frame.pixels_per_point,
            };
            layer.prepare(&self.device, &self.queue, &mut encoder, &frame, &screen);
            (layer, frame, screen)
        });

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            let pipeline = match self.mode {
                RenderMode::Animated => self
                    .animated_pipeline
                    .as_ref()
                    .unwrap_or(&self.classic_pipeline),
                RenderMode::Classic => &self.classic_pipeline,
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            render_pass.draw(0..6, 0..self.instance_count);

            #[cfg(feature = "egui")]
            if let Some((layer, frame, screen)) = &egui_prepared {
                layer.renderer().render(&mut render_pass, &frame.paint_jobs, screen);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        #[cfg(feature = "egui")]
        if let Some((layer, frame, _)) = egui_prepared {
            layer.cleanup(&frame);
        }

        Ok(())
    }

    #[cfg(feature = "egui")]
    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }
}

/// Wide 75-degree vertical field of view; the galaxy fills the frame at the
/// default camera distance.
fn projection_matrix(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(75.0_f32.to_radians(), aspect, 0.1, 100.0)
}

/// Create a shader module, surfacing validation failures as an error
/// instead of the default uncaptured-error panic.
fn create_shader_checked(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(GpuError::ShaderValidation(error.to_string()));
    }
    Ok(module)
}

fn build_pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    // Additive blending: overlapping particles brighten instead of occlude,
    // so no depth buffer is needed.
    let additive = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<StarInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &STAR_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(additive),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
