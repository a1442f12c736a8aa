//! Particle field generation.
//!
//! [`ParticleField::generate`] is a pure function from parameters (plus an
//! injected random source) to attribute arrays: deterministic shape,
//! stochastic detail, O(count) time and memory, no state carried between
//! calls. [`FieldCache`] wraps it with the rebuild-or-patch policy driven by
//! [`ParamChange`].

use std::f32::consts::TAU;
use std::time::Instant;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::ParamError;
use crate::params::{GalaxyParams, ParamChange};
use crate::shader::{RenderMode, StarInstance};

/// Generated per-particle attributes, as parallel arrays.
///
/// Owned exclusively by whoever uploaded it; replaced wholesale on
/// regeneration, never patched field-by-field.
#[derive(Debug, Clone)]
pub struct ParticleField {
    /// Model-space base positions, y = 0, on the branch spiral.
    pub positions: Vec<Vec3>,
    /// Per-axis jitter, applied after rotation by the animated shader.
    pub random_offsets: Vec<Vec3>,
    /// Per-particle size multipliers in [0, 2.5).
    pub scales: Vec<f32>,
    /// CPU-baked radial gradient, used by the classic render mode.
    pub colors: Vec<Vec3>,
}

impl ParticleField {
    /// Generate a field from validated parameters, drawing all randomness
    /// from `rng`. Seed the RNG to get reproducible fields.
    pub fn generate(params: &GalaxyParams, rng: &mut impl Rng) -> Result<Self, ParamError> {
        params.validate()?;

        let count = params.count as usize;

        // Guard the big allocations so extreme counts fail cleanly instead
        // of aborting the process.
        let mut positions = Vec::new();
        let mut random_offsets = Vec::new();
        let mut scales = Vec::new();
        let mut colors = Vec::new();
        positions
            .try_reserve_exact(count)
            .and_then(|_| random_offsets.try_reserve_exact(count))
            .and_then(|_| scales.try_reserve_exact(count))
            .and_then(|_| colors.try_reserve_exact(count))
            .map_err(|_| ParamError::Allocation(params.count))?;

        for i in 0..count {
            let r = rng.gen::<f32>() * params.radius;
            // Round-robin assignment to evenly spaced arms.
            let branch_angle =
                (i as u32 % params.branches) as f32 / params.branches as f32 * TAU;
            // Larger radius means more twist; this is what makes the spiral.
            let spin_angle = r * params.spin;
            let angle = branch_angle + spin_angle;

            positions.push(Vec3::new(angle.cos() * r, 0.0, angle.sin() * r));
            random_offsets.push(Vec3::new(
                jitter_axis(rng, params.randomness, params.randomness_power, r),
                jitter_axis(rng, params.randomness, params.randomness_power, r),
                jitter_axis(rng, params.randomness, params.randomness_power, r),
            ));
            scales.push(rng.gen::<f32>() * 2.5);
            colors.push(radial_color(
                params.inside_color,
                params.outside_color,
                r,
                params.radius,
            ));
        }

        Ok(Self {
            positions,
            random_offsets,
            scales,
            colors,
        })
    }

    /// Generate with a fresh entropy-seeded RNG. Each call yields a new
    /// stochastic detail layout; the overall shape depends only on `params`.
    pub fn generate_random(params: &GalaxyParams) -> Result<Self, ParamError> {
        Self::generate(params, &mut SmallRng::from_entropy())
    }

    /// Number of particles in the field.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Interleave the parallel arrays into GPU instances for a single upload.
    ///
    /// The classic mode folds the jitter into the position (it cannot be
    /// applied post-rotation without the animated shader) and relies on the
    /// baked colors; the animated mode keeps the jitter as its own attribute.
    pub fn to_instances(&self, mode: RenderMode) -> Vec<StarInstance> {
        (0..self.len())
            .map(|i| {
                let (position, random_offset) = match mode {
                    RenderMode::Animated => (self.positions[i], self.random_offsets[i]),
                    RenderMode::Classic => {
                        (self.positions[i] + self.random_offsets[i], Vec3::ZERO)
                    }
                };
                StarInstance {
                    position: position.to_array(),
                    scale: self.scales[i],
                    random_offset: random_offset.to_array(),
                    _pad0: 0.0,
                    color: self.colors[i].to_array(),
                    _pad1: 0.0,
                }
            })
            .collect()
    }
}

/// One axis of the post-rotation jitter.
///
/// The power concentrates offsets toward the branch line: magnitudes are
/// drawn as `U(0,1)^power`, signed with equal probability, and scaled by
/// both the randomness parameter and the particle's own radius.
fn jitter_axis(rng: &mut impl Rng, randomness: f32, power: f32, r: f32) -> f32 {
    let magnitude = rng.gen::<f32>().powf(power);
    let sign = if rng.gen::<f32>() < 0.5 { 1.0 } else { -1.0 };
    sign * magnitude * randomness * r
}

/// Gradient color at radius `r`, exact at both endpoints.
///
/// A zero galaxy radius degenerates to the inside color rather than
/// dividing by zero.
pub fn radial_color(inside: Vec3, outside: Vec3, r: f32, radius: f32) -> Vec3 {
    if radius <= f32::EPSILON {
        return inside;
    }
    let t = (r / radius).clamp(0.0, 1.0);
    if t <= 0.0 {
        inside
    } else if t >= 1.0 {
        outside
    } else {
        inside.lerp(outside, t)
    }
}

/// Rebuild-or-patch cache around the particle field.
///
/// Each incoming parameter snapshot is classified; the field is regenerated
/// only when a shape-affecting field changed. The latest snapshot always
/// wins, and a failed regeneration leaves the previous field and parameters
/// in place.
pub struct FieldCache {
    params: GalaxyParams,
    field: ParticleField,
    rng: SmallRng,
}

impl FieldCache {
    pub fn new(params: GalaxyParams) -> Result<Self, ParamError> {
        Self::with_rng(params, SmallRng::from_entropy())
    }

    /// Deterministic variant for tests and reproducible captures.
    pub fn seeded(params: GalaxyParams, seed: u64) -> Result<Self, ParamError> {
        Self::with_rng(params, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(params: GalaxyParams, mut rng: SmallRng) -> Result<Self, ParamError> {
        let started = Instant::now();
        let field = ParticleField::generate(&params, &mut rng)?;
        log::info!(
            "generated particle field: {} particles in {:?}",
            field.len(),
            started.elapsed()
        );
        Ok(Self { params, field, rng })
    }

    pub fn params(&self) -> &GalaxyParams {
        &self.params
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// Apply a new parameter snapshot: classify, rebuild only on shape
    /// changes, and report what happened so the renderer can decide between
    /// a buffer re-upload and a uniform patch.
    pub fn apply(&mut self, new: GalaxyParams) -> Result<ParamChange, ParamError> {
        let change = ParamChange::classify(&self.params, &new);
        if change == ParamChange::Shape {
            let started = Instant::now();
            self.field = ParticleField::generate(&new, &mut self.rng)?;
            log::info!(
                "regenerated particle field: {} particles in {:?}",
                self.field.len(),
                started.elapsed()
            );
        }
        self.params = new;
        Ok(change)
    }
}
