//! # Galaxia
//!
//! Procedural spiral galaxy as a GPU point cloud.
//!
//! Galaxia generates a few tens of thousands of star particles on the CPU
//! from a small set of shape parameters (branch count, spin, randomness
//! falloff, radial color gradient), uploads them once, and renders them as
//! additively-blended billboards that rotate in the vertex shader.
//!
//! ## Quick Start
//!
//! ```ignore
//! use galaxia::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     let params = GalaxyParams {
//!         branches: 5,
//!         spin: 1.5,
//!         ..GalaxyParams::default()
//!     };
//!     Viewer::new().with_params(params).run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Parameters
//!
//! [`GalaxyParams`] is the single source of truth for what the galaxy looks
//! like. Edits are classified by [`ParamChange::classify`]: *shape* changes
//! (count, radius, branches, spin, randomness) regenerate the particle
//! field, *cosmetic* changes (size, colors, rotation speed, camera) only
//! touch per-frame uniforms.
//!
//! ### Generation
//!
//! [`ParticleField::generate`] builds a [`ParticleField`] deterministically from
//! a parameter set and an RNG. [`FieldCache`] wraps it with the
//! rebuild-or-patch policy the viewer drives.
//!
//! ### Rendering
//!
//! Two pipelines share one instance buffer: the animated galaxy rotates in
//! the shader with its jitter applied after rotation, the classic variant
//! bakes jitter into positions and rotates the whole model matrix. If the
//! animated shader fails validation the renderer falls back to classic
//! points instead of aborting.

pub mod error;
pub mod generate;
mod gpu;
pub mod params;
pub mod shader;
pub mod time;
mod viewer;

pub use error::{GpuError, ParamError, ViewerError};
pub use generate::{FieldCache, ParticleField};
pub use glam::Vec3;
pub use params::{GalaxyParams, ParamChange};
pub use shader::RenderMode;
pub use time::Clock;
pub use viewer::Viewer;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use galaxia::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{GpuError, ParamError, ViewerError};
    pub use crate::generate::{FieldCache, ParticleField};
    pub use crate::params::{GalaxyParams, ParamChange};
    pub use crate::shader::RenderMode;
    pub use crate::time::Clock;
    pub use crate::viewer::Viewer;
    pub use crate::Vec3;
}
