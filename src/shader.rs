//! Shader sources and the GPU-facing data layout.
//!
//! Two interchangeable WGSL modules implement the same generator-to-renderer
//! contract. `galaxy.wgsl` re-derives the spiral rotation and radial color
//! gradient on the GPU every frame from static attributes plus uniforms.
//! `points.wgsl` is the classic fixed-function path: colors are baked on the
//! CPU and the whole cloud rotates through a model matrix uniform.

use bytemuck::{Pod, Zeroable};

/// WGSL for the animated, GPU-shaded galaxy.
pub const GALAXY_SHADER: &str = include_str!("galaxy.wgsl");
/// WGSL for the classic CPU-colored point cloud.
pub const POINTS_SHADER: &str = include_str!("points.wgsl");

/// Which of the two render paths is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Spiral rotation and color gradient computed per frame in the vertex
    /// stage; jitter stored as a separate attribute and added after rotation.
    Animated,
    /// Colors and jitter baked into the attributes; rotation applied through
    /// a cumulative model matrix.
    Classic,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Animated => RenderMode::Classic,
            RenderMode::Classic => RenderMode::Animated,
        }
    }
}

/// Per-particle instance data, interleaved for a single upload.
///
/// Matches the vertex buffer layout in both WGSL modules: position at
/// location 0, scale at 1, random offset at 2, baked color at 3. The
/// animated shader ignores the color, the classic shader the offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct StarInstance {
    pub position: [f32; 3],
    pub scale: f32,
    pub random_offset: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub _pad1: f32,
}

/// Vertex attributes shared by both pipelines.
pub const STAR_ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3, // position
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32, // scale
    },
    wgpu::VertexAttribute {
        offset: 16,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x3, // random offset
    },
    wgpu::VertexAttribute {
        offset: 32,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32x3, // baked color
    },
];

/// Per-frame uniforms, written once per presented frame.
///
/// Layout mirrors the `Uniforms` struct in both WGSL modules. The vec3
/// colors share 16-byte slots with the scalar that follows them.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Uniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub inside_color: [f32; 3],
    pub time: f32,
    pub outside_color: [f32; 3],
    pub rotation_speed: f32,
    pub size: f32,
    pub max_radius: f32,
    pub delta_time: f32,
    pub _pad: f32,
}
