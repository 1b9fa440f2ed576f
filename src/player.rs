use glam::Vec3;

use crate::camera::Camera;
use crate::input::{Button, Controller};
use crate::math::{clamp_length_or_zero, normalize_or_zero, EPS};
use crate::settings::PlayerSettings;

/// FPS player kinematics on a flat ground plane.
///
/// Two states: grounded and jumping. Grounded input feeds the move force
/// directly; while airborne the input only bends the trajectory through the
/// air-control accumulator, and the horizontal momentum snapshotted at
/// jump time (the carry vector) is what actually travels.
pub struct PlayerController {
    /// Feet reference point. The camera eye sits `eye_offset` above it.
    pub position: Vec3,
    /// Horizontal-plane basis derived from the camera look direction.
    forward: Vec3,
    right: Vec3,

    /// Vertical physics velocity (only the Y component is ever nonzero).
    force_vector: Vec3,
    /// Horizontal locomotion velocity while grounded.
    move_force: Vec3,
    /// Horizontal momentum frozen at the moment of the jump.
    jump_force_vector: Vec3,
    jump_force_direction: Vec3,
    /// Input redirected mid-air, perpendicular to the jump direction.
    air_control_vector: Vec3,
    is_jumping: bool,

    settings: PlayerSettings,
}

impl PlayerController {
    pub fn new(settings: PlayerSettings) -> Self {
        assert!(settings.landing_boost > 1.0, "landing boost must exceed 1");
        assert!(settings.eye_offset > 0.0, "eye offset must be positive");

        Self {
            position: Vec3::new(0.0, settings.ground_level, 0.0),
            forward: -Vec3::Z,
            right: Vec3::X,
            force_vector: Vec3::ZERO,
            move_force: Vec3::ZERO,
            jump_force_vector: Vec3::ZERO,
            jump_force_direction: Vec3::ZERO,
            air_control_vector: Vec3::ZERO,
            is_jumping: false,
            settings,
        }
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn move_force(&self) -> Vec3 {
        self.move_force
    }

    pub fn vertical_force(&self) -> Vec3 {
        self.force_vector
    }

    pub fn on_ground(&self) -> bool {
        self.position.y <= self.settings.ground_level + EPS && self.force_vector.y <= 0.0
    }

    /// Per-frame keyboard locomotion while in FPS mode.
    pub fn walk(&mut self, input: &dyn Controller, dt: f32) {
        let mut axes = 0;
        let mut direction = Vec3::ZERO;

        if input.is_down(Button::KeyW) {
            direction += self.forward;
            axes += 1;
        }
        if input.is_down(Button::KeyS) {
            direction -= self.forward;
            axes += 1;
        }
        if input.is_down(Button::KeyA) {
            direction -= self.right;
            axes += 1;
        }
        if input.is_down(Button::KeyD) {
            direction += self.right;
            axes += 1;
        }
        // Normalizing a single-axis direction would be a no-op; two active
        // axes would otherwise walk √2 faster on the diagonal.
        if axes > 1 {
            direction = normalize_or_zero(direction);
        }

        if self.on_ground() {
            let sprinting = input.is_down(Button::Shift);
            let accel = if sprinting {
                self.settings.walk_accel * self.settings.sprint_multiplier
            } else {
                self.settings.walk_accel
            };
            let max_force = if sprinting {
                self.settings.max_sprint_force
            } else {
                self.settings.max_walk_force
            };

            self.move_force += direction * accel * dt;
            self.move_force = clamp_length_or_zero(self.move_force, EPS, max_force);

            if input.is_down(Button::Space) {
                self.jump();
            }
        } else {
            // Airborne: input only redirects, and only across the jump axis.
            let perpendicular =
                direction - self.jump_force_direction * direction.dot(self.jump_force_direction);
            self.air_control_vector += perpendicular * self.settings.air_control * dt;
        }
    }

    fn jump(&mut self) {
        self.force_vector.y += self.settings.jump_impulse;
        self.jump_force_vector = self.move_force;
        self.jump_force_direction = normalize_or_zero(self.move_force);
        self.move_force = Vec3::ZERO;
        self.air_control_vector = Vec3::ZERO;
        self.is_jumping = true;
    }

    /// Physics integration step. Called once per frame today; kept separate
    /// from `walk` so it can move to a fixed timestep without touching input.
    pub fn process_physics(&mut self, dt: f32) {
        if !self.on_ground() {
            self.force_vector.y -= self.settings.gravity * dt;
        }

        let velocity =
            self.force_vector + self.move_force + self.jump_force_vector + self.air_control_vector;
        self.position += velocity * dt;

        // Ground friction: the move force bleeds off linearly, never
        // overshooting through zero.
        let len = self.move_force.length();
        if len > 0.0 {
            let decayed = (len - self.settings.deceleration * dt).max(0.0);
            self.move_force = normalize_or_zero(self.move_force) * decayed;
        }

        if self.position.y <= self.settings.ground_level && self.force_vector.y <= 0.0 {
            self.land();
        }
    }

    fn land(&mut self) {
        self.position.y = self.settings.ground_level;
        self.force_vector.y = 0.0;

        if self.is_jumping {
            // Landing converts the jump carry back into locomotion with a
            // momentum boost.
            self.move_force = self.jump_force_vector * self.settings.landing_boost;
            self.jump_force_vector = Vec3::ZERO;
            self.jump_force_direction = Vec3::ZERO;
            self.air_control_vector = Vec3::ZERO;
            self.is_jumping = false;
        }
    }

    /// Sync the camera to the player and re-derive the walking basis from
    /// where the camera looks. Pitch is dropped so looking at the floor
    /// doesn't slow walking; a degenerate projection (straight up/down)
    /// keeps the previous basis instead of normalizing a zero vector.
    pub fn update(&mut self, camera: &mut Camera) {
        camera.position = self.position + Vec3::Y * self.settings.eye_offset;

        let flat_forward = camera.horizontal_forward();
        if flat_forward != Vec3::ZERO {
            self.forward = flat_forward;
            self.right = normalize_or_zero(self.forward.cross(Vec3::Y));
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }
}
