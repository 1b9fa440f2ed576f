use glam::Vec3;

/// Camera construction parameters. Angles are in degrees.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub initial_position: Vec3,
    pub initial_yaw: f32,
    pub initial_pitch: f32,
    pub fov: f32,
    pub fov_bounds: (f32, f32),
    pub pitch_bounds: (f32, f32),
    pub near_plane: f32,
    pub far_plane: f32,
    pub speed: f32,
    pub speed_turbo: f32,
    pub sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            initial_position: Vec3::new(0.0, 6.0, 14.0),
            initial_yaw: -90.0,
            initial_pitch: -10.0,
            fov: 60.0,
            fov_bounds: (20.0, 110.0),
            pitch_bounds: (-89.0, 89.0),
            near_plane: 0.1,
            far_plane: 150.0,
            speed: 12.0,
            speed_turbo: 30.0,
            sensitivity: 0.05,
        }
    }
}

/// Player movement constants. The original demo scattered these across
/// revisions as magic literals; they are named configuration here.
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    /// Feet reference plane the player stands on and lands back onto.
    pub ground_level: f32,
    /// Camera eye height above the feet reference point.
    pub eye_offset: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    /// Horizontal acceleration while grounded, per second.
    pub walk_accel: f32,
    pub sprint_multiplier: f32,
    /// Upper bound on the walk move-force magnitude.
    pub max_walk_force: f32,
    pub max_sprint_force: f32,
    /// Scale on redirecting velocity while airborne.
    pub air_control: f32,
    /// Multiplier (> 1) applied to the jump carry vector on landing.
    pub landing_boost: f32,
    /// Linear decay of the move force toward zero, per second.
    pub deceleration: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            ground_level: 3.0,
            eye_offset: 1.8,
            gravity: 25.0,
            jump_impulse: 9.0,
            walk_accel: 40.0,
            sprint_multiplier: 2.0,
            max_walk_force: 6.0,
            max_sprint_force: 12.0,
            air_control: 2.0,
            landing_boost: 1.2,
            deceleration: 30.0,
        }
    }
}

/// Clear color for the main pass. Anything this leaks through is a bug, so it
/// is a loud magenta rather than a silent black.
pub const MISSING_TEXTURE_COLOR: [f32; 4] = [0.9, 0.0, 0.9, 1.0];

pub const DEFAULT_WINDOW_WIDTH: u32 = 1600;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 900;
pub const DEFAULT_FPS_TARGET: u32 = 60;

/// Mouse wheel FOV step in degrees.
pub const FOV_SCROLL_STEP: f32 = 5.0;
