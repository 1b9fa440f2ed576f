use glam::{Mat4, Vec3};

/// Single directional-ish light with Phong intensity terms derived from its
/// color. Static after construction.
///
/// Intensity split follows the classic ambient/diffuse/specular weighting:
/// <https://learnopengl.com/Advanced-Lighting/Advanced-Lighting>
#[derive(Debug, Clone)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    /// Point the light looks at for the shadow pass.
    pub target: Vec3,

    pub intensity_ambient: Vec3,
    pub intensity_diffuse: Vec3,
    pub intensity_specular: Vec3,

    pub view: Mat4,
    /// Orthographic projection covering the playfield for the depth pass.
    pub projection: Mat4,
}

impl Light {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        let target = Vec3::ZERO;
        let view = Mat4::look_at_rh(position, target, Vec3::Y);
        let extent = 60.0;
        let projection = Mat4::orthographic_rh(-extent, extent, -extent, extent, 1.0, 200.0);

        Self {
            position,
            color,
            target,
            intensity_ambient: 0.06 * color,
            intensity_diffuse: 0.8 * color,
            intensity_specular: 1.0 * color,
            view,
            projection,
        }
    }

    /// Combined transform the shadow pass renders with and the main pass
    /// samples the shadow map through.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::new(50.0, 50.0, -10.0), Vec3::ONE)
    }
}
