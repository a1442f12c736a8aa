//! Error types for galaxia.
//!
//! Parameter validation errors fire before any generation work, GPU errors
//! cover device bring-up and shader validation, and viewer errors wrap the
//! windowing layer.

use std::fmt;

/// Errors produced by [`crate::GalaxyParams::validate`] or by field
/// generation itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// `count` must be at least 1.
    ZeroCount,
    /// `branches` is used as a modulus and must be at least 1.
    ZeroBranches,
    /// `radius` may be zero (degenerate galaxy) but never negative.
    NegativeRadius(f32),
    /// `size` must be strictly positive.
    NonPositiveSize(f32),
    /// `randomness` must be non-negative.
    NegativeRandomness(f32),
    /// `randomness_power` below 1 would spread jitter away from the branch.
    PowerBelowOne(f32),
    /// A field is NaN or infinite.
    NonFinite(&'static str),
    /// Attribute allocation failed at this count; retry with a smaller one.
    Allocation(u32),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::ZeroCount => write!(f, "particle count must be at least 1"),
            ParamError::ZeroBranches => write!(f, "branch count must be at least 1"),
            ParamError::NegativeRadius(r) => write!(f, "radius must be non-negative, got {}", r),
            ParamError::NonPositiveSize(s) => write!(f, "size must be positive, got {}", s),
            ParamError::NegativeRandomness(r) => {
                write!(f, "randomness must be non-negative, got {}", r)
            }
            ParamError::PowerBelowOne(p) => {
                write!(f, "randomness power must be at least 1, got {}", p)
            }
            ParamError::NonFinite(field) => write!(f, "parameter `{}` is not finite", field),
            ParamError::Allocation(count) => write!(
                f,
                "failed to allocate particle attributes for {} particles; retry with a smaller count",
                count
            ),
        }
    }
}

impl std::error::Error for ParamError {}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// A shader module failed validation.
    ShaderValidation(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(
                f,
                "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."
            ),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::ShaderValidation(msg) => write!(f, "Shader failed validation: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when running the viewer.
#[derive(Debug)]
pub enum ViewerError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Initial parameters were invalid.
    Params(ParamError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            ViewerError::Window(e) => write!(f, "Failed to create window: {}", e),
            ViewerError::Gpu(e) => write!(f, "GPU error: {}", e),
            ViewerError::Params(e) => write!(f, "Invalid galaxy parameters: {}", e),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::EventLoop(e) => Some(e),
            ViewerError::Window(e) => Some(e),
            ViewerError::Gpu(e) => Some(e),
            ViewerError::Params(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ViewerError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for ViewerError {
    fn from(e: winit::error::OsError) -> Self {
        ViewerError::Window(e)
    }
}

impl From<GpuError> for ViewerError {
    fn from(e: GpuError) -> Self {
        ViewerError::Gpu(e)
    }
}

impl From<ParamError> for ViewerError {
    fn from(e: ParamError) -> Self {
        ViewerError::Params(e)
    }
}
