use glam::Vec3;

use catwalk::settings::CameraSettings;
use catwalk::Camera;

#[cfg(test)]
mod camera_tests {
    use super::*;

    #[test]
    fn test_view_matrix_maps_camera_position_to_origin() {
        let settings = CameraSettings {
            initial_position: Vec3::new(0.0, 0.0, 4.0),
            initial_yaw: -90.0,
            initial_pitch: 16.0,
            fov: 60.0,
            near_plane: 0.1,
            far_plane: 150.0,
            ..CameraSettings::default()
        };
        let mut camera = Camera::new(settings, 16.0 / 9.0);
        camera.update();

        let eye = camera.view * camera.position.extend(1.0);
        assert!(eye.truncate().length() < 1e-4);
        assert!((eye.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_yaw_minus_ninety_looks_down_negative_z() {
        let settings = CameraSettings {
            initial_yaw: -90.0,
            initial_pitch: 0.0,
            ..CameraSettings::default()
        };
        let mut camera = Camera::new(settings, 1.0);
        camera.update();

        assert!((camera.forward - Vec3::NEG_Z).length() < 1e-5);
        assert!((camera.right - Vec3::X).length() < 1e-5);
        assert!((camera.up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_full_yaw_turn_returns_to_start() {
        let mut camera = Camera::new(CameraSettings::default(), 1.0);
        camera.update();
        let forward = camera.forward;

        // sensitivity 0.05 deg per count: 7200 counts is a full turn.
        camera.rotate(7200.0, 0.0);
        camera.update();

        assert!((camera.forward - forward).length() < 1e-4);
    }

    #[test]
    fn test_projection_changes_only_after_update() {
        let mut camera = Camera::new(CameraSettings::default(), 16.0 / 9.0);
        camera.update();
        let initial = camera.projection;

        assert!(camera.adjust_fov(-15.0));
        assert_eq!(camera.projection, initial);

        camera.update();
        assert_ne!(camera.projection, initial);

        // A plain update with nothing dirty leaves it alone.
        let rebuilt = camera.projection;
        camera.update();
        assert_eq!(camera.projection, rebuilt);
    }

    #[test]
    fn test_aspect_ratio_change_marks_projection_dirty() {
        let mut camera = Camera::new(CameraSettings::default(), 16.0 / 9.0);
        camera.update();
        let before = camera.projection;

        camera.set_aspect_ratio(21.0 / 9.0);
        camera.update();
        assert_ne!(camera.projection, before);
    }

    #[test]
    fn test_pitch_clamp_holds_through_wild_input() {
        let mut camera = Camera::new(CameraSettings::default(), 1.0);
        camera.rotate(0.0, -1e6);
        camera.update();
        assert!(camera.pitch <= 89.0);
        assert!(camera.forward.y > 0.0);

        camera.rotate(0.0, 1e7);
        camera.update();
        assert!(camera.pitch >= -89.0);
        assert!(camera.forward.y < 0.0);
    }

    #[test]
    fn test_reset_after_flight_restores_construction_pose() {
        let mut camera = Camera::new(CameraSettings::default(), 16.0 / 9.0);
        let home = camera.position;

        camera.rotate(333.0, -123.0);
        camera.position += Vec3::new(10.0, -4.0, 2.5);
        camera.adjust_fov(-30.0);
        camera.update();

        camera.reset();
        camera.update();

        assert_eq!(camera.position, home);
        assert_eq!(camera.fov, 60.0);
        let eye = camera.view * camera.position.extend(1.0);
        assert!(eye.truncate().length() < 1e-4);
    }
}
