//! Grid render pipeline.
//!
//! Owns the plane geometry, the uniform buffers and one pipeline per
//! [`GridSide`]. Parameter updates are written into a CPU mirror of
//! [`GridUniforms`] and uploaded by [`GridRenderer::prepare`] only when dirty.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use gridfloor_core::geometry::{PlaneGeometry, PlaneVertex};
use gridfloor_core::{FogSettings, FrameState, GridParam, GridParams, GridSide, GridUniforms};

use crate::camera::CameraView;
use crate::error::GpuError;
use crate::offscreen::{COLOR_FORMAT, DEPTH_FORMAT, OffscreenTarget};

const GRID_SHADER: &str = include_str!("../shaders/grid.wgsl");

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

const SIDES: [GridSide; 3] = [GridSide::Front, GridSide::Back, GridSide::Double];

/// Camera and model matrices, `@group(0) @binding(0)` in `grid.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct ViewUniforms {
    clip_from_world: [[f32; 4]; 4],
    view_from_world: [[f32; 4]; 4],
    world_from_local: [[f32; 4]; 4],
    local_from_world: [[f32; 4]; 4],
    /// `xyz` = camera world position, for distance fog.
    camera_position: [f32; 4],
}

/// Draws one grid plane.
pub struct GridRenderer {
    params: GridParams,
    uniforms: GridUniforms,
    uniforms_dirty: bool,
    world_from_local: Mat4,
    camera: Option<CameraView>,

    pipelines: [wgpu::RenderPipeline; 3],
    bind_group: wgpu::BindGroup,
    view_buffer: wgpu::Buffer,
    grid_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GridRenderer {
    /// Build the renderer for a color target of `color_format`, with an
    /// optional depth attachment. Compiles `grid.wgsl`.
    pub fn new(
        device: &wgpu::Device,
        params: GridParams,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gridfloor_grid_shader"),
            source: wgpu::ShaderSource::Wgsl(GRID_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gridfloor_grid_layout"),
            entries: &[
                // binding 0: view/model matrices
                uniform_layout_entry(0, std::mem::size_of::<ViewUniforms>()),
                // binding 1: grid parameters + frame state
                uniform_layout_entry(1, std::mem::size_of::<GridUniforms>()),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gridfloor_grid_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = SIDES.map(|side| {
            create_pipeline(device, &pipeline_layout, &shader, side, color_format, depth_format)
        });

        let uniforms = GridUniforms::new(&params);
        let world_from_local = Mat4::IDENTITY;

        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gridfloor_view_uniform"),
            contents: bytemuck::bytes_of(&view_uniforms(None, world_from_local)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let grid_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gridfloor_grid_uniform"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gridfloor_grid_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: view_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: grid_buffer.as_entire_binding(),
                },
            ],
        });

        let plane = PlaneGeometry::from_args(params.args);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gridfloor_plane_vertices"),
            contents: bytemuck::cast_slice(plane.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gridfloor_plane_indices"),
            contents: bytemuck::cast_slice(plane.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        tracing::info!(
            "grid pipeline created ({}x{}, {:?})",
            params.args[0],
            params.args[1],
            color_format
        );

        Self {
            params,
            uniforms,
            uniforms_dirty: false,
            world_from_local,
            camera: None,
            pipelines,
            bind_group,
            view_buffer,
            grid_buffer,
            vertex_buffer,
            index_buffer,
            index_count: plane.indices().len() as u32,
        }
    }

    /// Renderer targeting [`OffscreenTarget`] formats.
    pub fn new_offscreen(device: &wgpu::Device, params: GridParams) -> Self {
        Self::new(device, params, COLOR_FORMAT, Some(DEPTH_FORMAT))
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    pub fn uniforms(&self) -> &GridUniforms {
        &self.uniforms
    }

    /// Whether the CPU uniform mirror has changes not yet uploaded.
    pub fn is_dirty(&self) -> bool {
        self.uniforms_dirty
    }

    // ── Parameter binding ───────────────────────────────────────────

    /// Apply one parameter update. Side changes select another pipeline;
    /// everything else is written into the uniform mirror.
    pub fn set_param(&mut self, param: GridParam) {
        self.params.apply(param);
        if self.uniforms.apply(&param) {
            tracing::debug!("grid param updated: {param:?}");
            self.uniforms_dirty = true;
        }
    }

    /// Apply every field that differs from the current parameter set.
    /// Plane extent is fixed at construction and is not updated.
    pub fn set_params(&mut self, next: &GridParams) {
        if self.params.extent_changed(next) {
            tracing::warn!(
                "grid plane size is fixed at construction; ignoring {:?}",
                next.args
            );
        }
        for change in self.params.diff(next) {
            self.set_param(change);
        }
    }

    /// Place the plane in the world.
    pub fn set_transform(&mut self, world_from_local: Mat4) {
        self.world_from_local = world_from_local;
        if let Some(camera) = self.camera {
            self.update_frame(&camera);
        }
    }

    pub fn transform(&self) -> Mat4 {
        self.world_from_local
    }

    /// Mirror the scene's fog.
    pub fn set_fog(&mut self, fog: &FogSettings) {
        if self.uniforms.set_fog(fog) {
            tracing::debug!("grid fog updated: {:?}", fog.mode);
            self.uniforms_dirty = true;
        }
    }

    // ── Per-frame ───────────────────────────────────────────────────

    /// Re-derive the camera-relative frame state. Call once per frame
    /// before [`prepare`](Self::prepare).
    pub fn update_frame(&mut self, camera: &CameraView) {
        self.camera = Some(*camera);
        let frame = FrameState::compute(camera.position, self.world_from_local);
        if self.uniforms.set_frame(&frame) {
            self.uniforms_dirty = true;
        }
    }

    /// Upload matrices, and the grid uniforms if they changed.
    pub fn prepare(&mut self, queue: &wgpu::Queue) {
        if self.camera.is_none() {
            tracing::warn!("grid prepared before any frame update; using an identity camera");
        }
        let view = view_uniforms(self.camera.as_ref(), self.world_from_local);
        queue.write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&view));

        if self.uniforms_dirty {
            queue.write_buffer(&self.grid_buffer, 0, bytemuck::bytes_of(&self.uniforms));
            self.uniforms_dirty = false;
        }
    }

    /// Record the draw into an open render pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipelines[self.params.side.to_u32() as usize]);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Render one frame into `target` and read it back as sRGB RGBA8.
    pub fn render_offscreen(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &OffscreenTarget,
        camera: &CameraView,
        clear: wgpu::Color,
    ) -> Result<Vec<u8>, GpuError> {
        self.update_frame(camera);
        self.prepare(queue);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gridfloor_offscreen_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gridfloor_offscreen_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.draw(&mut pass);
        }
        queue.submit(std::iter::once(encoder.finish()));

        target.read_pixels(device, queue)
    }
}

fn view_uniforms(camera: Option<&CameraView>, world_from_local: Mat4) -> ViewUniforms {
    let (clip_from_world, view_from_world, position) = match camera {
        Some(camera) => (camera.clip_from_world(), camera.view, camera.position),
        None => (Mat4::IDENTITY, Mat4::IDENTITY, glam::Vec3::ZERO),
    };
    ViewUniforms {
        clip_from_world: clip_from_world.to_cols_array_2d(),
        view_from_world: view_from_world.to_cols_array_2d(),
        world_from_local: world_from_local.to_cols_array_2d(),
        local_from_world: world_from_local.inverse().to_cols_array_2d(),
        camera_position: [position.x, position.y, position.z, 1.0],
    }
}

fn uniform_layout_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

/// Face culled for a side. Plane triangles wind counter-clockwise from +Y.
pub fn cull_mode(side: GridSide) -> Option<wgpu::Face> {
    match side {
        GridSide::Front => Some(wgpu::Face::Back),
        GridSide::Back => Some(wgpu::Face::Front),
        GridSide::Double => None,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    side: GridSide,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(match side {
            GridSide::Front => "gridfloor_grid_pipeline_front",
            GridSide::Back => "gridfloor_grid_pipeline_back",
            GridSide::Double => "gridfloor_grid_pipeline_double",
        }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PlaneVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: cull_mode(side),
            ..Default::default()
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}
