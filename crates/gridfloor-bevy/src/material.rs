//! `GridMaterial`: the grid shader as a Bevy `Material`.
//!
//! The material keeps a [`GridUniforms`] mirror and converts it to an
//! encase-compatible [`GridMaterialUniform`] when the bind group is built.
//! Render side is pipeline state and travels in [`GridMaterialKey`].

use bevy::mesh::MeshVertexBufferLayoutRef;
use bevy::pbr::{Material, MaterialPipeline, MaterialPipelineKey};
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssets;
use bevy::render::render_resource::{
    AsBindGroup, AsBindGroupShaderType, Face, RenderPipelineDescriptor, ShaderType,
    SpecializedMeshPipelineError,
};
use bevy::render::texture::GpuImage;
use bevy::shader::ShaderRef;
use bytemuck::{Pod, Zeroable};

use gridfloor_core::{FogSettings, FrameState, GridParam, GridParams, GridSide, GridUniforms};

const GRID_SHADER_PATH: &str = "embedded://gridfloor_bevy/shaders/grid.wgsl";

// ── Material ────────────────────────────────────────────────────────────────

/// Procedural ground grid material.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
#[uniform(0, GridMaterialUniform)]
#[bind_group_data(GridMaterialKey)]
pub struct GridMaterial {
    pub uniforms: GridUniforms,
    pub side: GridSide,
}

impl GridMaterial {
    pub fn from_params(params: &GridParams) -> Self {
        Self {
            uniforms: GridUniforms::new(params),
            side: params.side,
        }
    }

    /// Apply one parameter update in place.
    pub fn apply(&mut self, param: GridParam) {
        if let GridParam::Side(side) = param {
            self.side = side;
        }
        self.uniforms.apply(&param);
    }

    pub fn set_frame(&mut self, frame: &FrameState) -> bool {
        self.uniforms.set_frame(frame)
    }

    pub fn set_fog(&mut self, fog: &FogSettings) -> bool {
        self.uniforms.set_fog(fog)
    }
}

impl Default for GridMaterial {
    fn default() -> Self {
        Self::from_params(&GridParams::default())
    }
}

impl Material for GridMaterial {
    fn vertex_shader() -> ShaderRef {
        GRID_SHADER_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        GRID_SHADER_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }

    fn enable_prepass() -> bool {
        false
    }

    fn enable_shadows() -> bool {
        false
    }

    fn specialize(
        _pipeline: &MaterialPipeline,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout
            .0
            .get_layout(&[Mesh::ATTRIBUTE_POSITION.at_shader_location(0)])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode =
            cull_mode(GridSide::from_u32(key.bind_group_data.side));
        Ok(())
    }
}

/// Face culled for a side. Bevy's plane winds counter-clockwise from +Y.
pub fn cull_mode(side: GridSide) -> Option<Face> {
    match side {
        GridSide::Front => Some(Face::Back),
        GridSide::Back => Some(Face::Front),
        GridSide::Double => None,
    }
}

// ── Pipeline key ────────────────────────────────────────────────────────────

/// Specialization key: one pipeline per render side.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct GridMaterialKey {
    pub side: u32,
}

impl From<&GridMaterial> for GridMaterialKey {
    fn from(material: &GridMaterial) -> Self {
        Self {
            side: material.side.to_u32(),
        }
    }
}

// ── Uniform ─────────────────────────────────────────────────────────────────

/// `@group(#{MATERIAL_BIND_GROUP}) @binding(0)` in `shaders/grid.wgsl`.
#[derive(Clone, Default, ShaderType)]
pub struct GridMaterialUniform {
    pub cell_color: Vec4,
    pub section_color: Vec4,
    pub fog_color: Vec4,
    pub fog_extinction: Vec4,
    pub fog_inscattering: Vec4,
    pub cam_proj_position: Vec4,
    pub plane_position: Vec4,
    pub cell_size: f32,
    pub section_size: f32,
    pub cell_thickness: f32,
    pub section_thickness: f32,
    pub fade_distance: f32,
    pub fade_strength: f32,
    pub fade_from: f32,
    pub infinite_scale: f32,
    pub fog_near: f32,
    pub fog_far: f32,
    pub fog_density: f32,
    pub fog_mode: u32,
    pub fog_convention: u32,
    pub flags: u32,
    /// Padding on the GPU, see [`GridUniforms::min_half_extent`].
    pub min_half_extent: f32,
}

impl From<&GridUniforms> for GridMaterialUniform {
    fn from(u: &GridUniforms) -> Self {
        Self {
            cell_color: Vec4::from_array(u.cell_color),
            section_color: Vec4::from_array(u.section_color),
            fog_color: Vec4::from_array(u.fog_color),
            fog_extinction: Vec4::from_array(u.fog_extinction),
            fog_inscattering: Vec4::from_array(u.fog_inscattering),
            cam_proj_position: Vec4::from_array(u.cam_proj_position),
            plane_position: Vec4::from_array(u.plane_position),
            cell_size: u.cell_size,
            section_size: u.section_size,
            cell_thickness: u.cell_thickness,
            section_thickness: u.section_thickness,
            fade_distance: u.fade_distance,
            fade_strength: u.fade_strength,
            fade_from: u.fade_from,
            infinite_scale: u.infinite_scale,
            fog_near: u.fog_near,
            fog_far: u.fog_far,
            fog_density: u.fog_density,
            fog_mode: u.fog_mode,
            fog_convention: u.fog_convention,
            flags: u.flags,
            min_half_extent: u.min_half_extent,
        }
    }
}

impl AsBindGroupShaderType<GridMaterialUniform> for GridMaterial {
    fn as_bind_group_shader_type(&self, _images: &RenderAssets<GpuImage>) -> GridMaterialUniform {
        GridMaterialUniform::from(&self.uniforms)
    }
}
