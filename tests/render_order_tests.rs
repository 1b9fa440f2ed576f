use anyhow::Result;

use catwalk::model::{SceneObject, Transform};
use catwalk::settings::CameraSettings;
use catwalk::{
    Camera, FrameContext, Light, OverlayState, RenderBackend, RenderCommand, Scene, SceneRenderer,
};

/// Backend that records the replayed schedule instead of drawing.
#[derive(Default)]
struct RecordingBackend {
    executed: Vec<RenderCommand>,
    missing_meshes: Vec<&'static str>,
}

impl RenderBackend for RecordingBackend {
    fn has_mesh(&self, name: &str) -> bool {
        !self.missing_meshes.contains(&name)
    }

    fn has_texture(&self, _name: &str) -> bool {
        true
    }

    fn execute(&mut self, commands: &[RenderCommand]) -> Result<()> {
        self.executed.extend_from_slice(commands);
        Ok(())
    }
}

fn overlay() -> OverlayState {
    OverlayState {
        fps: 60.0,
        frame: 0,
        camera_position: [0.0; 3],
        mode_label: "fps",
        menu_open: false,
    }
}

fn test_scene() -> Scene {
    let mut scene = Scene::new();
    scene.add(SceneObject::new("cube", "crate0", Transform::default()));
    scene.add(SceneObject::new(
        "cat",
        "cat",
        Transform::at(glam::Vec3::new(3.0, 0.0, 0.0)),
    ));
    scene
}

fn prepare(scene: &mut Scene, backend: &RecordingBackend, debug: bool) -> Vec<RenderCommand> {
    let camera = Camera::new(CameraSettings::default(), 16.0 / 9.0);
    let light = Light::default();
    let frame = FrameContext {
        debug_overlay: debug,
        ..FrameContext::default()
    };
    SceneRenderer::new().prepare(scene, &camera, &light, &frame, overlay(), backend)
}

fn index_of(commands: &[RenderCommand], pred: impl Fn(&RenderCommand) -> bool) -> usize {
    commands
        .iter()
        .position(pred)
        .expect("expected command missing from schedule")
}

#[cfg(test)]
mod render_order_tests {
    use super::*;

    #[test]
    fn test_shadow_pass_completes_before_main_pass_starts() {
        let backend = RecordingBackend::default();
        let mut scene = test_scene();
        let commands = prepare(&mut scene, &backend, false);

        let shadow_begin =
            index_of(&commands, |c| matches!(c, RenderCommand::BeginShadowPass { .. }));
        let shadow_end = index_of(&commands, |c| matches!(c, RenderCommand::EndShadowPass));
        let main_begin =
            index_of(&commands, |c| matches!(c, RenderCommand::BeginMainPass { .. }));

        assert!(shadow_begin < shadow_end);
        assert!(shadow_end < main_begin);

        // Every shadow draw sits strictly inside the shadow pass.
        for (i, command) in commands.iter().enumerate() {
            if matches!(command, RenderCommand::DrawShadow { .. }) {
                assert!(shadow_begin < i && i < shadow_end);
            }
        }
    }

    #[test]
    fn test_skybox_is_drawn_after_all_opaque_objects() {
        let backend = RecordingBackend::default();
        let mut scene = test_scene();
        let commands = prepare(&mut scene, &backend, false);

        let skybox = index_of(&commands, |c| matches!(c, RenderCommand::DrawSkybox { .. }));
        let main_end = index_of(&commands, |c| matches!(c, RenderCommand::EndMainPass));

        for (i, command) in commands.iter().enumerate() {
            if matches!(command, RenderCommand::DrawObject { .. }) {
                assert!(i < skybox, "opaque draw after the skybox");
            }
        }
        assert!(skybox < main_end, "skybox must be part of the main pass");
    }

    #[test]
    fn test_overlay_and_gizmos_run_depth_off_then_restore() {
        let backend = RecordingBackend::default();
        let mut scene = test_scene();
        let commands = prepare(&mut scene, &backend, true);

        let main_end = index_of(&commands, |c| matches!(c, RenderCommand::EndMainPass));
        let depth_off = index_of(&commands, |c| *c == RenderCommand::SetDepthTest(false));
        let depth_on = index_of(&commands, |c| *c == RenderCommand::SetDepthTest(true));
        let overlay = index_of(&commands, |c| matches!(c, RenderCommand::DrawOverlay { .. }));

        assert!(main_end < depth_off);
        assert!(depth_off < overlay && overlay < depth_on);
        for (i, command) in commands.iter().enumerate() {
            if matches!(command, RenderCommand::DrawAxes { .. }) {
                assert!(depth_off < i && i < depth_on);
            }
        }
        // Depth test is restored as the final step of the schedule.
        assert_eq!(depth_on, commands.len() - 1);
    }

    #[test]
    fn test_axes_appear_only_with_the_debug_flag() {
        let backend = RecordingBackend::default();

        let mut scene = test_scene();
        let plain = prepare(&mut scene, &backend, false);
        assert!(!plain
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawAxes { .. })));

        let mut scene = test_scene();
        let debug = prepare(&mut scene, &backend, true);
        let axes = debug
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawAxes { .. }))
            .count();
        assert_eq!(axes, scene.len());
    }

    #[test]
    fn test_missing_mesh_is_skipped_but_frame_continues() {
        let backend = RecordingBackend {
            missing_meshes: vec!["cat"],
            ..RecordingBackend::default()
        };
        let mut scene = test_scene();
        let commands = prepare(&mut scene, &backend, false);

        let draws: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawObject { mesh, .. } => Some(mesh.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec!["cube"]);

        // The rest of the schedule is intact.
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawSkybox { .. })));
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawOverlay { .. })));
    }

    #[test]
    fn test_scene_animations_advance_before_either_pass_reads_matrices() {
        let backend = RecordingBackend::default();
        let mut scene = Scene::new();
        scene.add(
            SceneObject::new("cube", "crate0", Transform::default())
                .with_spin(glam::Vec3::new(0.0, 1.0, 0.0)),
        );

        let camera = Camera::new(CameraSettings::default(), 16.0 / 9.0);
        let light = Light::default();
        let frame = FrameContext {
            delta: 0.5,
            ..FrameContext::default()
        };
        let commands =
            SceneRenderer::new().prepare(&mut scene, &camera, &light, &frame, overlay(), &backend);

        let spun = scene.objects()[0].model_matrix;
        let shadow_model = commands.iter().find_map(|c| match c {
            RenderCommand::DrawShadow { model, .. } => Some(*model),
            _ => None,
        });
        let main_model = commands.iter().find_map(|c| match c {
            RenderCommand::DrawObject { model, .. } => Some(*model),
            _ => None,
        });

        // Both passes see the same already-updated matrix.
        assert_eq!(shadow_model, Some(spun));
        assert_eq!(main_model, Some(spun));
    }

    #[test]
    fn test_executed_schedule_round_trips_through_the_backend() {
        let mut backend = RecordingBackend::default();
        let mut scene = test_scene();
        let commands = prepare(&mut scene, &backend, false);

        backend.execute(&commands).unwrap();
        assert_eq!(backend.executed, commands);
    }
}
