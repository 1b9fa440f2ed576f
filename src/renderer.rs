use std::collections::HashSet;

use anyhow::Result;
use glam::{Mat3, Mat4, Vec3};

use crate::camera::Camera;
use crate::frame::FrameContext;
use crate::light::Light;
use crate::scene::Scene;
use crate::settings::MISSING_TEXTURE_COLOR;

/// Per-frame uniforms shared by every object draw in the main pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub light_position: Vec3,
    pub light_view_projection: Mat4,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// Everything the 2D overlay shows.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub fps: f32,
    pub frame: u64,
    pub camera_position: [f32; 3],
    pub mode_label: &'static str,
    pub menu_open: bool,
}

/// One step of the frame's draw schedule. The renderer emits these in strict
/// order; backends replay them without reordering.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    BeginShadowPass { light_view_projection: Mat4 },
    DrawShadow { mesh: String, model: Mat4 },
    EndShadowPass,
    BeginMainPass { clear_color: [f32; 4], uniforms: SceneUniforms },
    DrawObject { mesh: String, texture: String, model: Mat4 },
    DrawSkybox { inverse_projection_view: Mat4 },
    EndMainPass,
    SetDepthTest(bool),
    DrawAxes { model: Mat4 },
    DrawOverlay { overlay: OverlayState },
}

/// Draw-schedule contract between the frame loop and the GPU side. Resource
/// lookups are by the scene's string handles.
pub trait RenderBackend {
    fn has_mesh(&self, name: &str) -> bool;
    fn has_texture(&self, name: &str) -> bool;
    fn execute(&mut self, commands: &[RenderCommand]) -> Result<()>;
}

/// Builds each frame's command list: scene update, then the shadow depth
/// pass, then the main color pass (skybox last), then depth-off overlay and
/// debug gizmos with depth restored afterwards.
pub struct SceneRenderer {
    /// Handles already reported missing, so a broken object logs once, not
    /// once per frame.
    missing_reported: HashSet<String>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self {
            missing_reported: HashSet::new(),
        }
    }

    pub fn prepare<B: RenderBackend + ?Sized>(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        light: &Light,
        frame: &FrameContext,
        overlay: OverlayState,
        backend: &B,
    ) -> Vec<RenderCommand> {
        // Animations advance exactly once, before either pass reads matrices.
        scene.update(frame.time, frame.delta);

        let mut commands = Vec::with_capacity(scene.len() * 2 + 8);

        commands.push(RenderCommand::BeginShadowPass {
            light_view_projection: light.view_projection(),
        });
        for object in scene.objects() {
            if !object.casts_shadow {
                continue;
            }
            if !self.check_mesh(backend, &object.mesh) {
                continue;
            }
            commands.push(RenderCommand::DrawShadow {
                mesh: object.mesh.clone(),
                model: object.model_matrix,
            });
        }
        commands.push(RenderCommand::EndShadowPass);

        commands.push(RenderCommand::BeginMainPass {
            clear_color: MISSING_TEXTURE_COLOR,
            uniforms: SceneUniforms {
                view: camera.view,
                projection: camera.projection,
                camera_position: camera.position,
                light_position: light.position,
                light_view_projection: light.view_projection(),
                ambient: light.intensity_ambient,
                diffuse: light.intensity_diffuse,
                specular: light.intensity_specular,
            },
        });
        for object in scene.objects() {
            if !self.check_mesh(backend, &object.mesh)
                || !self.check_texture(backend, &object.texture)
            {
                continue;
            }
            commands.push(RenderCommand::DrawObject {
                mesh: object.mesh.clone(),
                texture: object.texture.clone(),
                model: object.model_matrix,
            });
        }
        if scene.skybox {
            // Rotation-only view keeps the box glued to the camera.
            let rotation = Mat4::from_mat3(Mat3::from_mat4(camera.view));
            commands.push(RenderCommand::DrawSkybox {
                inverse_projection_view: (camera.projection * rotation).inverse(),
            });
        }
        commands.push(RenderCommand::EndMainPass);

        commands.push(RenderCommand::SetDepthTest(false));
        if frame.debug_overlay {
            for object in scene.objects() {
                commands.push(RenderCommand::DrawAxes {
                    model: object.model_matrix,
                });
            }
        }
        commands.push(RenderCommand::DrawOverlay { overlay });
        commands.push(RenderCommand::SetDepthTest(true));

        commands
    }

    fn check_mesh<B: RenderBackend + ?Sized>(&mut self, backend: &B, name: &str) -> bool {
        if backend.has_mesh(name) {
            return true;
        }
        if self.missing_reported.insert(format!("mesh:{name}")) {
            log::warn!("mesh '{name}' not loaded, skipping its draws");
        }
        false
    }

    fn check_texture<B: RenderBackend + ?Sized>(&mut self, backend: &B, name: &str) -> bool {
        if backend.has_texture(name) {
            return true;
        }
        if self.missing_reported.insert(format!("texture:{name}")) {
            log::warn!("texture '{name}' not loaded, skipping its draws");
        }
        false
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SceneObject, Transform};
    use crate::settings::CameraSettings;

    struct StubBackend {
        meshes: Vec<&'static str>,
        textures: Vec<&'static str>,
    }

    impl RenderBackend for StubBackend {
        fn has_mesh(&self, name: &str) -> bool {
            self.meshes.contains(&name)
        }
        fn has_texture(&self, name: &str) -> bool {
            self.textures.contains(&name)
        }
        fn execute(&mut self, _commands: &[RenderCommand]) -> Result<()> {
            Ok(())
        }
    }

    fn overlay() -> OverlayState {
        OverlayState {
            fps: 60.0,
            frame: 1,
            camera_position: [0.0; 3],
            mode_label: "fps",
            menu_open: false,
        }
    }

    fn prepare_with(backend: &StubBackend, scene: &mut Scene) -> Vec<RenderCommand> {
        let camera = Camera::new(CameraSettings::default(), 16.0 / 9.0);
        let light = Light::default();
        SceneRenderer::new().prepare(
            scene,
            &camera,
            &light,
            &FrameContext::default(),
            overlay(),
            backend,
        )
    }

    #[test]
    fn missing_mesh_skips_both_passes() {
        let backend = StubBackend {
            meshes: vec!["cube"],
            textures: vec!["crate0"],
        };
        let mut scene = Scene::new();
        scene.add(SceneObject::new("cube", "crate0", Transform::default()));
        scene.add(SceneObject::new("ghost", "crate0", Transform::default()));

        let commands = prepare_with(&backend, &mut scene);
        let shadows = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawShadow { .. }))
            .count();
        let draws = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawObject { .. }))
            .count();
        assert_eq!(shadows, 1);
        assert_eq!(draws, 1);
    }

    #[test]
    fn missing_texture_skips_main_draw_only() {
        let backend = StubBackend {
            meshes: vec!["cube"],
            textures: vec![],
        };
        let mut scene = Scene::new();
        scene.add(SceneObject::new("cube", "crate0", Transform::default()));

        let commands = prepare_with(&backend, &mut scene);
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawShadow { .. })));
        assert!(!commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawObject { .. })));
    }

    #[test]
    fn non_casting_object_still_draws_in_main_pass() {
        let backend = StubBackend {
            meshes: vec!["cube"],
            textures: vec!["crate0"],
        };
        let mut scene = Scene::new();
        scene.add(SceneObject::new("cube", "crate0", Transform::default()).without_shadow());

        let commands = prepare_with(&backend, &mut scene);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawShadow { .. })));
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawObject { .. })));
    }

    #[test]
    fn main_pass_clears_to_the_sentinel_color() {
        let backend = StubBackend {
            meshes: vec![],
            textures: vec![],
        };
        let mut scene = Scene::new();
        let commands = prepare_with(&backend, &mut scene);

        let clear = commands.iter().find_map(|c| match c {
            RenderCommand::BeginMainPass { clear_color, .. } => Some(*clear_color),
            _ => None,
        });
        assert_eq!(clear, Some(MISSING_TEXTURE_COLOR));
    }

    #[test]
    fn skybox_can_be_disabled() {
        let backend = StubBackend {
            meshes: vec![],
            textures: vec![],
        };
        let mut scene = Scene::new();
        scene.skybox = false;
        let commands = prepare_with(&backend, &mut scene);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawSkybox { .. })));
    }
}
