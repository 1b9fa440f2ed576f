use glam::Vec3;

use catwalk::input::{Button, Controller};
use catwalk::settings::{CameraSettings, PlayerSettings};
use catwalk::{Camera, PlayerController};

struct HeldKeys(Vec<Button>);

impl Controller for HeldKeys {
    fn is_down(&self, button: Button) -> bool {
        self.0.contains(&button)
    }

    fn get_down_keys(&self) -> &[Button] {
        &self.0
    }
}

const DT: f32 = 1.0 / 60.0;

fn rig() -> (PlayerController, Camera) {
    (
        PlayerController::new(PlayerSettings::default()),
        Camera::new(CameraSettings::default(), 16.0 / 9.0),
    )
}

/// One frame of the FPS-mode dispatch: input, physics, camera sync.
fn step(player: &mut PlayerController, camera: &mut Camera, input: &dyn Controller) {
    camera.update();
    player.walk(input, DT);
    player.process_physics(DT);
    player.update(camera);
    camera.update();
}

#[cfg(test)]
mod player_tests {
    use super::*;

    #[test]
    fn test_walking_follows_look_direction() {
        let (mut player, mut camera) = rig();
        // Look along +X.
        camera.yaw = 0.0;
        camera.pitch = 0.0;

        let input = HeldKeys(vec![Button::KeyW]);
        let start = player.position;
        for _ in 0..120 {
            step(&mut player, &mut camera, &input);
        }

        let moved = player.position - start;
        assert!(moved.x > 1.0, "should have walked along +X, got {moved}");
        assert!(moved.z.abs() < 1e-3);
        assert_eq!(moved.y, 0.0);
    }

    #[test]
    fn test_looking_down_does_not_stall_walking() {
        let (mut player, mut camera) = rig();
        camera.yaw = 0.0;
        camera.pitch = -80.0;

        let input = HeldKeys(vec![Button::KeyW]);
        let start = player.position;
        for _ in 0..120 {
            step(&mut player, &mut camera, &input);
        }

        // Pitch is dropped from the walk basis, so ground speed is full.
        let moved = player.position - start;
        assert!(moved.x > 1.0);
        assert_eq!(moved.y, 0.0);
    }

    #[test]
    fn test_camera_eye_tracks_jump_arc() {
        let (mut player, mut camera) = rig();
        let eye = player.settings().eye_offset;

        step(&mut player, &mut camera, &HeldKeys(vec![Button::Space]));
        assert!(player.is_jumping());

        let mut peak = f32::MIN;
        let idle = HeldKeys(vec![]);
        let mut steps = 0;
        while player.is_jumping() {
            step(&mut player, &mut camera, &idle);
            peak = peak.max(player.position.y);
            assert_eq!(camera.position.y, player.position.y + eye);
            steps += 1;
            assert!(steps < 10_000, "never landed");
        }

        assert!(peak > player.settings().ground_level + 0.5);
        assert_eq!(player.position.y, player.settings().ground_level);
    }

    #[test]
    fn test_running_jump_conserves_direction_and_boosts_momentum() {
        let (mut player, mut camera) = rig();
        camera.yaw = 0.0;
        camera.pitch = 0.0;

        let run = HeldKeys(vec![Button::KeyW, Button::Shift]);
        for _ in 0..60 {
            step(&mut player, &mut camera, &run);
        }
        // Sample momentum right before the jump, before friction decays it.
        player.walk(&run, DT);
        let before = player.move_force();
        assert!(before.length() > 0.0);

        player.walk(
            &HeldKeys(vec![Button::KeyW, Button::Shift, Button::Space]),
            DT,
        );
        assert!(player.is_jumping());

        while player.is_jumping() {
            player.process_physics(DT);
        }

        let after = player.move_force();
        assert!(after.length() > before.length());
        // Same heading as takeoff.
        assert!(after.normalize().dot(before.normalize()) > 0.999);
    }

    #[test]
    fn test_air_strafe_bends_the_arc_sideways() {
        let (mut player, mut camera) = rig();
        camera.yaw = 0.0;
        camera.pitch = 0.0;

        let run = HeldKeys(vec![Button::KeyW]);
        for _ in 0..60 {
            step(&mut player, &mut camera, &run);
        }
        step(
            &mut player,
            &mut camera,
            &HeldKeys(vec![Button::KeyW, Button::Space]),
        );

        let z_before = player.position.z;
        let strafe = HeldKeys(vec![Button::KeyD]);
        while player.is_jumping() {
            player.walk(&strafe, DT);
            player.process_physics(DT);
        }

        // Forward is +X here, so strafing right pushes +Z.
        assert!(player.position.z > z_before);
    }

    #[test]
    fn test_released_keys_glide_to_a_stop() {
        let (mut player, mut camera) = rig();
        let run = HeldKeys(vec![Button::KeyW]);
        for _ in 0..60 {
            step(&mut player, &mut camera, &run);
        }
        assert!(player.move_force().length() > 0.0);

        let idle = HeldKeys(vec![]);
        for _ in 0..120 {
            step(&mut player, &mut camera, &idle);
        }
        assert_eq!(player.move_force(), Vec3::ZERO);
        assert!(player.on_ground());
    }
}
