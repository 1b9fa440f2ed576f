use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::{euler_rotation, model_matrix};

/// Position / Euler rotation (radians) / scale triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        model_matrix(self.position, self.rotation, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Scale animation: elapsed phase-shifted time in, scale factors out.
pub type ScaleAnimation = fn(f32) -> Vec3;

/// Continuous spin as an explicit accumulated angle per axis. The matrix is
/// regenerated from the running total every update, so the result depends on
/// total elapsed rotation only, not on how many frames delivered it.
#[derive(Debug, Clone, Copy)]
struct Spin {
    /// Radians per second per axis.
    rate: Vec3,
    accumulated: Vec3,
}

/// One drawable thing in the scene: a mesh handle, a texture handle, a
/// transform and optional animation strategies. Variants of the original's
/// subclass ladder are all expressed through composition here.
pub struct SceneObject {
    pub mesh: String,
    pub texture: String,
    pub transform: Transform,
    pub model_matrix: Mat4,
    pub casts_shadow: bool,
    /// Stable index assigned by the scene, used as the serialization key.
    pub scene_index: usize,

    spin: Option<Spin>,
    scale_animation: Option<(ScaleAnimation, f32)>,
}

impl SceneObject {
    pub fn new(mesh: impl Into<String>, texture: impl Into<String>, transform: Transform) -> Self {
        Self {
            mesh: mesh.into(),
            texture: texture.into(),
            model_matrix: transform.matrix(),
            transform,
            casts_shadow: true,
            scene_index: 0,
            spin: None,
            scale_animation: None,
        }
    }

    /// Spin continuously at `rate` radians per second per axis.
    pub fn with_spin(mut self, rate: Vec3) -> Self {
        if rate != Vec3::ZERO {
            self.spin = Some(Spin {
                rate,
                accumulated: Vec3::ZERO,
            });
        }
        self
    }

    /// Animate scale via `animation(time + phase)`.
    pub fn with_scale_animation(mut self, animation: ScaleAnimation, phase: f32) -> Self {
        self.scale_animation = Some((animation, phase));
        self
    }

    pub fn without_shadow(mut self) -> Self {
        self.casts_shadow = false;
        self
    }

    pub fn spin_rate(&self) -> Vec3 {
        self.spin.map(|s| s.rate).unwrap_or(Vec3::ZERO)
    }

    /// Advance animations and regenerate the model matrix. Static objects
    /// keep their construction-time matrix untouched.
    pub fn update(&mut self, time: f32, dt: f32) {
        if self.spin.is_none() && self.scale_animation.is_none() {
            return;
        }

        if let Some(spin) = &mut self.spin {
            spin.accumulated += spin.rate * dt;
        }

        let scale = match self.scale_animation {
            Some((animation, phase)) => self.transform.scale * animation(time + phase),
            None => self.transform.scale,
        };

        let mut matrix = Mat4::from_translation(self.transform.position)
            * euler_rotation(self.transform.rotation);
        if let Some(spin) = &self.spin {
            matrix *= euler_rotation(spin.accumulated);
        }
        self.model_matrix = matrix * Mat4::from_scale(scale);
    }

    pub fn record(&self) -> SceneObjectRecord {
        SceneObjectRecord {
            mesh: self.mesh.clone(),
            texture: self.texture.clone(),
            position: self.transform.position.to_array(),
            rotation: self.transform.rotation.to_array(),
            scale: self.transform.scale.to_array(),
            spin_rate: self.spin_rate().to_array(),
        }
    }
}

/// Flat serialized form of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObjectRecord {
    pub mesh: String,
    pub texture: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub spin_rate: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrices_close(a: Mat4, b: Mat4, tol: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < tol)
    }

    #[test]
    fn initial_matrix_transforms_origin_to_position() {
        let obj = SceneObject::new(
            "cube",
            "crate0",
            Transform::at(Vec3::new(1.0, 2.0, 3.0)),
        );
        let p = obj.model_matrix.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn static_object_matrix_never_moves() {
        let mut obj = SceneObject::new("cube", "crate0", Transform::at(Vec3::X));
        let initial = obj.model_matrix;
        for i in 0..100 {
            obj.update(i as f32 * 0.016, 0.016);
        }
        assert_eq!(obj.model_matrix, initial);
    }

    #[test]
    fn accumulated_spin_matches_one_big_step() {
        let rate = Vec3::new(0.0, 0.7, 0.0);
        let dt = 0.01;
        let n = 250;

        let mut stepped = SceneObject::new("cube", "crate0", Transform::at(Vec3::X))
            .with_spin(rate);
        for i in 0..n {
            stepped.update(i as f32 * dt, dt);
        }

        let mut single = SceneObject::new("cube", "crate0", Transform::at(Vec3::X))
            .with_spin(rate);
        single.update(0.0, n as f32 * dt);

        assert!(matrices_close(
            stepped.model_matrix,
            single.model_matrix,
            1e-3
        ));
    }

    #[test]
    fn multi_axis_spin_is_frame_rate_independent() {
        let rate = Vec3::new(1.1, -0.4, 0.25);

        let mut fine = SceneObject::new("cat", "cat", Transform::default()).with_spin(rate);
        for _ in 0..1000 {
            fine.update(0.0, 0.001);
        }

        let mut coarse = SceneObject::new("cat", "cat", Transform::default()).with_spin(rate);
        for _ in 0..10 {
            coarse.update(0.0, 0.1);
        }

        assert!(matrices_close(fine.model_matrix, coarse.model_matrix, 1e-3));
    }

    #[test]
    fn spin_composes_after_base_rotation() {
        let base = Transform {
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            ..Transform::default()
        };
        let mut obj = SceneObject::new("cube", "crate0", base).with_spin(Vec3::Y);
        obj.update(0.0, std::f32::consts::FRAC_PI_2);

        // Quarter base turn plus a quarter spin: X maps to -X.
        let p = obj.model_matrix.transform_point3(Vec3::X);
        assert!((p - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn scale_animation_tracks_time_and_phase() {
        fn pulse(t: f32) -> Vec3 {
            Vec3::splat(1.0 + t)
        }

        let mut obj = SceneObject::new("cat", "cat", Transform::default())
            .with_scale_animation(pulse, 1.0);
        obj.update(2.0, 0.016);

        // scale = 1 + (time + phase) = 4
        let p = obj.model_matrix.transform_point3(Vec3::X);
        assert!((p.x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn zero_spin_rate_is_dropped() {
        let obj = SceneObject::new("cube", "crate0", Transform::default()).with_spin(Vec3::ZERO);
        assert_eq!(obj.spin_rate(), Vec3::ZERO);
        assert!(obj.spin.is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let obj = SceneObject::new("cat", "cat", Transform::at(Vec3::new(1.0, -1.0, 15.0)))
            .with_spin(Vec3::new(0.0, 2.5, 0.0));
        let record = obj.record();

        let json = serde_json::to_string(&record).unwrap();
        let back: SceneObjectRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
