//! Galaxy parameters and change classification.
//!
//! [`GalaxyParams`] is an immutable snapshot of every tunable input. The UI
//! replaces it wholesale on each interaction; nothing mutates a shared copy.
//! [`ParamChange::classify`] decides whether a replacement invalidates the
//! particle buffers or only requires a uniform update.

use glam::Vec3;

use crate::error::ParamError;

/// Snapshot of all tunable galaxy inputs.
///
/// Invariants (enforced by [`GalaxyParams::validate`]): `count >= 1`,
/// `branches >= 1` (used as a modulus), `radius >= 0`, `size > 0`,
/// `randomness >= 0`, `randomness_power >= 1`, all fields finite.
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyParams {
    /// Number of particles.
    pub count: u32,
    /// Base point size, scaled per particle by the generated scale attribute.
    pub size: f32,
    /// Galaxy radius in world units.
    pub radius: f32,
    /// Number of spiral arms. Particles are assigned round-robin.
    pub branches: u32,
    /// Twist per unit radius. Larger radius means more twist.
    pub spin: f32,
    /// Magnitude of the per-axis jitter, proportional to each particle's radius.
    pub randomness: f32,
    /// Exponent concentrating jitter toward the branch line. Higher is tighter.
    pub randomness_power: f32,
    /// Color at the galactic core.
    pub inside_color: Vec3,
    /// Color at the rim.
    pub outside_color: Vec3,
    /// Rotation speed in radians per second.
    pub rotation_speed: f32,
    /// Initial orbit camera distance.
    pub camera_distance: f32,
}

impl Default for GalaxyParams {
    /// Defaults for the animated (GPU-shaded) galaxy.
    fn default() -> Self {
        Self {
            count: 50_000,
            size: 20.0,
            radius: 5.0,
            branches: 8,
            spin: 1.0,
            randomness: 0.5,
            randomness_power: 3.0,
            inside_color: Vec3::new(1.0, 0.376, 0.188),  // #ff6030
            outside_color: Vec3::new(0.106, 0.224, 0.518), // #1b3984
            rotation_speed: 0.5,
            camera_distance: 6.0,
        }
    }
}

impl GalaxyParams {
    /// Defaults tuned for the classic CPU-colored point cloud, which reads
    /// better with fewer, tighter particles.
    pub fn classic() -> Self {
        Self {
            count: 10_000,
            randomness: 0.2,
            ..Self::default()
        }
    }

    /// Check the structural invariants, failing fast before any generation
    /// work. A zero radius is legal and degenerates every particle to the
    /// origin; a negative one is not.
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.count == 0 {
            return Err(ParamError::ZeroCount);
        }
        if self.branches == 0 {
            return Err(ParamError::ZeroBranches);
        }
        if self.radius < 0.0 {
            return Err(ParamError::NegativeRadius(self.radius));
        }
        if self.size <= 0.0 {
            return Err(ParamError::NonPositiveSize(self.size));
        }
        if self.randomness < 0.0 {
            return Err(ParamError::NegativeRandomness(self.randomness));
        }
        if self.randomness_power < 1.0 {
            return Err(ParamError::PowerBelowOne(self.randomness_power));
        }
        for (name, value) in [
            ("size", self.size),
            ("radius", self.radius),
            ("spin", self.spin),
            ("randomness", self.randomness),
            ("randomness_power", self.randomness_power),
            ("rotation_speed", self.rotation_speed),
            ("camera_distance", self.camera_distance),
        ] {
            if !value.is_finite() {
                return Err(ParamError::NonFinite(name));
            }
        }
        Ok(())
    }

    /// Clamp every field into the control surface's slider ranges. Out-of-range
    /// values from the boundary are clamped here rather than rejected.
    pub fn clamped(mut self) -> Self {
        self.count = self.count.clamp(100, 200_000);
        self.size = self.size.clamp(0.001, 100.0);
        self.radius = self.radius.clamp(0.1, 20.0);
        self.branches = self.branches.clamp(1, 20);
        self.spin = self.spin.clamp(-5.0, 5.0);
        self.randomness = self.randomness.clamp(0.0, 2.0);
        self.randomness_power = self.randomness_power.clamp(1.0, 10.0);
        self.inside_color = self.inside_color.clamp(Vec3::ZERO, Vec3::ONE);
        self.outside_color = self.outside_color.clamp(Vec3::ZERO, Vec3::ONE);
        self.rotation_speed = self.rotation_speed.clamp(0.0, 2.0);
        self.camera_distance = self.camera_distance.clamp(3.0, 20.0);
        self
    }
}

/// Outcome of replacing one [`GalaxyParams`] with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamChange {
    /// Nothing changed.
    Unchanged,
    /// Only cosmetic/animation fields changed; push new uniforms, keep buffers.
    Cosmetic,
    /// A shape-affecting field changed; the particle field must be rebuilt
    /// and re-uploaded.
    Shape,
}

impl ParamChange {
    /// Classify the difference between two parameter snapshots.
    ///
    /// Shape-affecting fields are `count`, `radius`, `branches`, `spin`,
    /// `randomness`, and `randomness_power`. Everything else only feeds
    /// per-frame uniforms and is O(1) to apply.
    pub fn classify(old: &GalaxyParams, new: &GalaxyParams) -> Self {
        if old.count != new.count
            || old.radius != new.radius
            || old.branches != new.branches
            || old.spin != new.spin
            || old.randomness != new.randomness
            || old.randomness_power != new.randomness_power
        {
            ParamChange::Shape
        } else if old == new {
            ParamChange::Unchanged
        } else {
            ParamChange::Cosmetic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GalaxyParams::default().validate().is_ok());
        assert!(GalaxyParams::classic().validate().is_ok());
    }

    #[test]
    fn test_zero_branches_rejected() {
        let params = GalaxyParams {
            branches: 0,
            ..GalaxyParams::default()
        };
        assert_eq!(params.validate(), Err(ParamError::ZeroBranches));
    }

    #[test]
    fn test_zero_count_rejected() {
        let params = GalaxyParams {
            count: 0,
            ..GalaxyParams::default()
        };
        assert_eq!(params.validate(), Err(ParamError::ZeroCount));
    }

    #[test]
    fn test_zero_radius_is_legal_degenerate() {
        let params = GalaxyParams {
            radius: 0.0,
            ..GalaxyParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_negative_radius_rejected() {
        let params = GalaxyParams {
            radius: -1.0,
            ..GalaxyParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamError::NegativeRadius(_))
        ));
    }

    #[test]
    fn test_nan_rejected() {
        let params = GalaxyParams {
            spin: f32::NAN,
            ..GalaxyParams::default()
        };
        assert_eq!(params.validate(), Err(ParamError::NonFinite("spin")));
    }

    #[test]
    fn test_clamp_pulls_into_slider_ranges() {
        let params = GalaxyParams {
            count: 5_000_000,
            radius: -3.0,
            branches: 0,
            spin: 40.0,
            ..GalaxyParams::default()
        }
        .clamped();

        assert_eq!(params.count, 200_000);
        assert_eq!(params.radius, 0.1);
        assert_eq!(params.branches, 1);
        assert_eq!(params.spin, 5.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_classify_unchanged() {
        let params = GalaxyParams::default();
        assert_eq!(
            ParamChange::classify(&params, &params.clone()),
            ParamChange::Unchanged
        );
    }

    #[test]
    fn test_classify_rotation_speed_is_cosmetic() {
        let old = GalaxyParams::default();
        let new = GalaxyParams {
            rotation_speed: 1.5,
            ..old.clone()
        };
        assert_eq!(ParamChange::classify(&old, &new), ParamChange::Cosmetic);
    }

    #[test]
    fn test_classify_colors_are_cosmetic() {
        let old = GalaxyParams::default();
        let new = GalaxyParams {
            inside_color: Vec3::ONE,
            outside_color: Vec3::ZERO,
            size: 40.0,
            ..old.clone()
        };
        assert_eq!(ParamChange::classify(&old, &new), ParamChange::Cosmetic);
    }

    #[test]
    fn test_classify_shape_fields() {
        let old = GalaxyParams::default();
        for new in [
            GalaxyParams { count: 1000, ..old.clone() },
            GalaxyParams { radius: 2.0, ..old.clone() },
            GalaxyParams { branches: 3, ..old.clone() },
            GalaxyParams { spin: -1.0, ..old.clone() },
            GalaxyParams { randomness: 0.0, ..old.clone() },
            GalaxyParams { randomness_power: 5.0, ..old.clone() },
        ] {
            assert_eq!(ParamChange::classify(&old, &new), ParamChange::Shape);
        }
    }

    #[test]
    fn test_classify_shape_wins_over_cosmetic() {
        let old = GalaxyParams::default();
        let new = GalaxyParams {
            count: 1000,
            rotation_speed: 2.0,
            ..old.clone()
        };
        assert_eq!(ParamChange::classify(&old, &new), ParamChange::Shape);
    }
}
