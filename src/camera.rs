use glam::{Mat4, Vec3};

use crate::input::{Button, Controller};
use crate::math::normalize_or_zero;
use crate::recording::CameraPose;
use crate::settings::CameraSettings;

/// First-person camera: yaw/pitch orientation, derived orthonormal basis, and
/// the view/projection matrices the render pipeline reads every frame.
///
/// The view matrix is recomputed on every `update`; the projection matrix only
/// when the FOV or aspect ratio changed since the last update (dirty flag).
pub struct Camera {
    pub position: Vec3,
    /// Degrees. Yaw -90 looks down -Z.
    pub yaw: f32,
    /// Degrees, clamped into `pitch_bounds`.
    pub pitch: f32,
    pub fov: f32,
    pub aspect_ratio: f32,

    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,

    pub view: Mat4,
    pub projection: Mat4,

    settings: CameraSettings,
    initial: (Vec3, f32, f32, f32),
    projection_dirty: bool,
}

impl Camera {
    pub fn new(settings: CameraSettings, aspect_ratio: f32) -> Self {
        assert!(
            settings.near_plane > 0.0 && settings.near_plane < settings.far_plane,
            "near plane must be positive and below the far plane"
        );
        assert!(
            settings.fov_bounds.0 < settings.fov_bounds.1
                && settings.fov >= settings.fov_bounds.0
                && settings.fov <= settings.fov_bounds.1,
            "initial fov must sit inside its bounds"
        );
        assert!(aspect_ratio > 0.0, "aspect ratio must be positive");

        let initial = (
            settings.initial_position,
            settings.initial_yaw,
            settings.initial_pitch,
            settings.fov,
        );

        let mut camera = Self {
            position: settings.initial_position,
            yaw: settings.initial_yaw,
            pitch: settings.initial_pitch,
            fov: settings.fov,
            aspect_ratio,
            forward: -Vec3::Z,
            right: Vec3::X,
            up: Vec3::Y,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            settings,
            initial,
            projection_dirty: true,
        };
        camera.update();
        camera
    }

    /// Apply a raw mouse delta (pixels since the last sample). Pitch is
    /// clamped so the look direction never crosses the poles.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.settings.sensitivity;
        self.pitch -= dy * self.settings.sensitivity;

        let (lo, hi) = self.settings.pitch_bounds;
        self.pitch = self.pitch.clamp(lo, hi);
    }

    /// Nudge the FOV (mouse wheel). Returns true when the FOV actually
    /// changed; the projection matrix is then rebuilt on the next `update`.
    pub fn adjust_fov(&mut self, delta: f32) -> bool {
        let (lo, hi) = self.settings.fov_bounds;
        let new_fov = (self.fov + delta).clamp(lo, hi);
        if (new_fov - self.fov).abs() < f32::EPSILON {
            return false;
        }
        self.fov = new_fov;
        self.projection_dirty = true;
        true
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio > 0.0 && (aspect_ratio - self.aspect_ratio).abs() > f32::EPSILON {
            self.aspect_ratio = aspect_ratio;
            self.projection_dirty = true;
        }
    }

    /// Recompute the basis vectors from yaw/pitch, then the view matrix, and
    /// the projection matrix if it was marked dirty.
    pub fn update(&mut self) {
        // pitch is a public field; enforce the bounds here too so a direct
        // write of ±90 can't degenerate the basis.
        let (lo, hi) = self.settings.pitch_bounds;
        self.pitch = self.pitch.clamp(lo, hi);

        self.update_vectors();

        if self.projection_dirty {
            self.projection = Mat4::perspective_rh(
                self.fov.to_radians(),
                self.aspect_ratio,
                self.settings.near_plane,
                self.settings.far_plane,
            );
            self.projection_dirty = false;
        }

        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());

        self.forward = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.forward.cross(Vec3::Y).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }

    /// Free-floating camera movement. No collision, the camera just flies
    /// through everything.
    pub fn fly(&mut self, input: &dyn Controller, dt: f32) {
        let velocity = if input.is_down(Button::Shift) {
            self.settings.speed_turbo * dt
        } else {
            self.settings.speed * dt
        };

        if input.is_down(Button::KeyW) {
            self.position += self.forward * velocity;
        }
        if input.is_down(Button::KeyS) {
            self.position -= self.forward * velocity;
        }
        if input.is_down(Button::KeyA) {
            self.position -= self.right * velocity;
        }
        if input.is_down(Button::KeyD) {
            self.position += self.right * velocity;
        }
        if input.is_down(Button::ArrowUp) {
            self.position += self.up * velocity;
        }
        if input.is_down(Button::ArrowDown) {
            self.position -= self.up * velocity;
        }
    }

    /// Restore the pose captured at construction.
    pub fn reset(&mut self) {
        let (position, yaw, pitch, fov) = self.initial;
        self.position = position;
        self.yaw = yaw;
        self.pitch = pitch;
        self.fov = fov;
        self.projection_dirty = true;
    }

    /// Horizontal projection of the look direction, or zero when looking
    /// straight up/down.
    pub fn horizontal_forward(&self) -> Vec3 {
        normalize_or_zero(crate::math::horizontal(self.forward))
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position.to_array(),
            pitch: self.pitch,
            yaw: self.yaw,
        }
    }

    pub fn apply_pose(&mut self, pose: &CameraPose) {
        self.position = Vec3::from_array(pose.position);
        self.pitch = pose.pitch;
        self.yaw = pose.yaw;
    }
}
