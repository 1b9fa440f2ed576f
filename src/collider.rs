use glam::Vec3;

use crate::math::normalize_or_zero;

/// Half-line `origin + t * direction` for `0 <= t`, optionally capped at
/// `length`. Direction is normalized on construction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: Option<f32>,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize_or_zero(direction),
            length: None,
        }
    }

    pub fn with_length(origin: Vec3, direction: Vec3, length: f32) -> Self {
        Self {
            length: Some(length),
            ..Self::new(origin, direction)
        }
    }

    /// Closest approach to `point`: the distance plus the parameter `t` that
    /// attains it. `t` is clamped to the ray's valid range, so points behind
    /// the origin measure against the origin itself.
    pub fn distance_to_point_minimizer(&self, point: Vec3) -> (f32, f32) {
        let mut t = (point - self.origin).dot(self.direction).max(0.0);
        if let Some(length) = self.length {
            t = t.min(length);
        }
        let closest = self.origin + t * self.direction;
        (closest.distance(point), t)
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.distance_to_point_minimizer(point).0
    }

    /// Where this ray first touches `sphere`, or `None` on a miss. A ray
    /// starting inside the sphere collides immediately at its own origin.
    pub fn intersect_sphere(&self, sphere: &SphereCollider) -> Option<Vec3> {
        if self.origin.distance(sphere.center) <= sphere.radius {
            return Some(self.origin);
        }
        let (dist, t) = self.distance_to_point_minimizer(sphere.center);
        if dist <= sphere.radius {
            // Back off from the closest approach by one radius. Slightly
            // conservative compared to the exact quadratic root, which is
            // fine for a collision probe.
            Some(self.origin + (t - sphere.radius) * self.direction)
        } else {
            None
        }
    }
}

/// Sphere with a strictly positive radius.
#[derive(Debug, Clone, Copy)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        assert!(radius > 0.0, "sphere collider needs a positive radius");
        Self { center, radius }
    }

    pub fn check_ray(&self, ray: &Ray) -> Option<Vec3> {
        ray.intersect_sphere(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn distance_to_point_ahead_of_the_ray() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let (dist, t) = ray.distance_to_point_minimizer(Vec3::new(5.0, 3.0, 0.0));
        assert!((dist - 3.0).abs() < 1e-6);
        assert!((t - 5.0).abs() < 1e-6);
    }

    #[test]
    fn points_behind_measure_from_the_origin() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let (dist, t) = ray.distance_to_point_minimizer(Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(t, 0.0);
        assert!((dist - 4.0).abs() < 1e-6);
    }

    #[test]
    fn length_caps_the_minimizer() {
        let ray = Ray::with_length(Vec3::ZERO, Vec3::X, 2.0);
        let (dist, t) = ray.distance_to_point_minimizer(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(t, 2.0);
        assert!((dist - 8.0).abs() < 1e-6);
    }

    #[test]
    fn ray_hits_sphere_ahead() {
        let sphere = SphereCollider::new(Vec3::new(10.0, 0.0, 0.0), 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        let hit = ray.intersect_sphere(&sphere).unwrap();
        assert!((hit - Vec3::new(8.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn ray_misses_offset_sphere() {
        let sphere = SphereCollider::new(Vec3::new(10.0, 5.0, 0.0), 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(ray.intersect_sphere(&sphere).is_none());
    }

    #[test]
    fn sphere_behind_the_ray_is_a_miss() {
        let sphere = SphereCollider::new(Vec3::new(-10.0, 0.0, 0.0), 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(ray.intersect_sphere(&sphere).is_none());
    }

    #[test]
    fn origin_inside_sphere_collides_immediately() {
        let sphere = SphereCollider::new(Vec3::ZERO, 5.0);
        let ray = Ray::new(Vec3::new(1.0, 1.0, 1.0), Vec3::Y);
        assert_eq!(ray.intersect_sphere(&sphere), Some(ray.origin));
    }

    #[test]
    fn check_ray_matches_intersect() {
        let sphere = SphereCollider::new(Vec3::new(0.0, 0.0, -6.0), 1.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(sphere.check_ray(&ray), ray.intersect_sphere(&sphere));
    }

    #[test]
    #[should_panic]
    fn zero_radius_is_rejected() {
        SphereCollider::new(Vec3::ZERO, 0.0);
    }
}
