use glam::{Mat4, Vec3};

/// Tolerance below which a vector is treated as zero.
pub const EPS: f32 = 1e-4;

/// Normalizing a zero-length vector produces NaN, which then poisons every
/// matrix it touches. Always go through this when the input can be degenerate.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    if v.length() < EPS {
        Vec3::ZERO
    } else {
        v.normalize()
    }
}

/// Clamps the length of `v` into `[lower, upper]`, mapping near-zero vectors
/// to zero instead of blowing them up to `lower`.
pub fn clamp_length_or_zero(v: Vec3, lower: f32, upper: f32) -> Vec3 {
    assert!(lower < upper, "lower bound must be below upper bound");

    let direction = normalize_or_zero(v);
    if direction == Vec3::ZERO {
        return direction;
    }

    let len = v.length();
    if len < lower {
        lower * direction
    } else if len > upper {
        upper * direction
    } else {
        v
    }
}

/// Projects `v` onto the horizontal (XZ) plane.
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Rotation matrix applying the X, then Y, then Z Euler angle (radians).
pub fn euler_rotation(angles: Vec3) -> Mat4 {
    Mat4::from_rotation_x(angles.x)
        * Mat4::from_rotation_y(angles.y)
        * Mat4::from_rotation_z(angles.z)
}

/// Local-to-world transform: translate, rotate (X, Y, Z order), scale.
pub fn model_matrix(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(position) * euler_rotation(rotation) * Mat4::from_scale(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_or_zero_unit_length() {
        let v = normalize_or_zero(Vec3::new(3.0, -4.0, 12.0));
        assert!((v.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn normalize_or_zero_swallows_degenerate_input() {
        assert_eq!(normalize_or_zero(Vec3::ZERO), Vec3::ZERO);
        assert_eq!(normalize_or_zero(Vec3::splat(1e-6)), Vec3::ZERO);
    }

    #[test]
    fn clamp_length_caps_above() {
        let v = clamp_length_or_zero(Vec3::new(10.0, 0.0, 0.0), EPS, 2.0);
        assert!((v.length() - 2.0).abs() < EPS);
        assert!(v.x > 0.0);
    }

    #[test]
    fn clamp_length_raises_below() {
        let v = clamp_length_or_zero(Vec3::new(0.001, 0.0, 0.0), 0.01, 2.0);
        assert!((v.length() - 0.01).abs() < EPS);
    }

    #[test]
    fn clamp_length_passes_through_in_range() {
        let v = Vec3::new(0.0, 1.5, 0.0);
        assert_eq!(clamp_length_or_zero(v, EPS, 2.0), v);
    }

    #[test]
    fn clamp_length_zero_stays_zero() {
        assert_eq!(clamp_length_or_zero(Vec3::ZERO, EPS, 2.0), Vec3::ZERO);
    }

    #[test]
    #[should_panic]
    fn clamp_length_rejects_inverted_bounds() {
        clamp_length_or_zero(Vec3::X, 2.0, 1.0);
    }

    #[test]
    fn horizontal_drops_y() {
        assert_eq!(horizontal(Vec3::new(1.0, 5.0, -2.0)), Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn model_matrix_translates_origin() {
        let m = model_matrix(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::ONE);
        let p = m.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn model_matrix_applies_scale_before_translation() {
        let m = model_matrix(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::splat(2.0));
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(p, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn euler_rotation_quarter_turn_y() {
        let m = euler_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
