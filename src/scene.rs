use std::collections::BTreeMap;

use glam::Vec3;

use crate::model::{SceneObject, SceneObjectRecord, Transform};

/// Mesh handle names the GPU collaborator is expected to provide.
pub const MESH_CUBE: &str = "cube";
pub const MESH_SPHERE: &str = "sphere";
pub const MESH_CAT: &str = "cat";

const CRATE_TEXTURES: [&str; 3] = ["crate0", "crate1", "crate2"];

/// Scene graph, flat: a list of objects plus a skybox flag. Object indices
/// are stable across the scene's lifetime.
pub struct Scene {
    objects: Vec<SceneObject>,
    next_index: usize,
    pub skybox: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            next_index: 0,
            skybox: true,
        }
    }

    /// Build the named scene layout, falling back to the cat ring.
    pub fn load(name: &str) -> Self {
        let mut scene = Self::new();
        match name {
            "debug" => scene.populate_debug(),
            "field" => scene.populate_cube_field(),
            _ => scene.populate_cat_ring(),
        }
        log::info!("scene '{name}': {} objects", scene.objects.len());
        scene
    }

    pub fn add(&mut self, mut object: SceneObject) {
        object.scene_index = self.next_index;
        self.next_index += 1;
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Advance every object's animation state. Must run before any draw of
    /// the frame so both passes see the same matrices.
    pub fn update(&mut self, time: f32, dt: f32) {
        for object in &mut self.objects {
            object.update(time, dt);
        }
    }

    /// Serialized object records keyed by stable scene index.
    pub fn records(&self) -> BTreeMap<usize, SceneObjectRecord> {
        self.objects
            .iter()
            .map(|obj| (obj.scene_index, obj.record()))
            .collect()
    }

    /// Minimal layout for poking at individual object kinds.
    fn populate_debug(&mut self) {
        self.add(SceneObject::new(MESH_CUBE, CRATE_TEXTURES[0], Transform::default()));
        self.add(SceneObject::new(
            MESH_CAT,
            "cat",
            Transform::at(Vec3::new(4.0, 0.0, 0.0)),
        ));
        self.add(SceneObject::new(
            MESH_SPHERE,
            CRATE_TEXTURES[1],
            Transform::at(Vec3::new(-4.0, 2.0, 0.0)),
        ));
    }

    /// Flat floor of crates with one slowly tumbling cube above it.
    fn populate_cube_field(&mut self) {
        let (n, step): (i32, usize) = (30, 2);
        for x in (-n..n).step_by(step) {
            for z in (-n..n).step_by(step) {
                let tex = CRATE_TEXTURES[((x + z).rem_euclid(3)) as usize];
                self.add(SceneObject::new(
                    MESH_CUBE,
                    tex,
                    Transform::at(Vec3::new(x as f32, -(step as f32), z as f32)),
                ));
            }
        }
        self.add(SceneObject::new(
            MESH_CAT,
            "cat",
            Transform::at(Vec3::new(0.0, -1.0, -15.0)),
        ));
        self.add(
            SceneObject::new(MESH_CUBE, CRATE_TEXTURES[0], Transform::at(Vec3::new(5.0, 5.0, 5.0)))
                .with_spin(Vec3::new(1.2, 1.2, 0.0)),
        );
    }

    /// The main layout: a bowl-shaped crate floor, a ring of cats breathing
    /// in and out, and spinning marker cubes above each cat.
    fn populate_cat_ring(&mut self) {
        let (n, step): (i32, usize) = (40, 2);
        let spin_axes = [
            Vec3::new(2.5, 0.0, 0.0),
            Vec3::new(0.0, 2.5, 0.0),
            Vec3::new(0.0, 0.0, 2.5),
        ];

        for (i, x) in (-n..=n).step_by(step).enumerate() {
            for (j, z) in (-n..=n).step_by(step).enumerate() {
                let rim = (x.abs().max(z.abs()) - (n - 15)).max(0);
                let y = -2.0 + 4.0 * rim as f32;
                let tex = CRATE_TEXTURES[(i + j) % 3];
                self.add(
                    SceneObject::new(
                        MESH_CUBE,
                        tex,
                        Transform::at(Vec3::new(x as f32, y, z as f32)),
                    )
                    .with_spin(if rim > 0 { spin_axes[(i + j) % 3] } else { Vec3::ZERO }),
                );
            }
        }

        let cats = 15;
        let radius = 15.0;
        for k in 0..cats {
            let alpha = k as f32 / cats as f32 * std::f32::consts::TAU;
            let (x, z) = (radius * alpha.cos(), radius * alpha.sin());

            self.add(
                SceneObject::new(
                    MESH_CAT,
                    "cat",
                    Transform {
                        position: Vec3::new(x, -1.0, z),
                        rotation: Vec3::new(0.0, -alpha - std::f32::consts::FRAC_PI_2, 0.0),
                        scale: Vec3::ONE,
                    },
                )
                .with_scale_animation(cat_breathing, alpha),
            );
            self.add(
                SceneObject::new(
                    MESH_CUBE,
                    CRATE_TEXTURES[k % 3],
                    Transform::at(Vec3::new(x, 12.0, z)),
                )
                .with_spin(Vec3::new(2.5, 2.5, 0.0)),
            );
        }

        self.add(SceneObject::new(
            MESH_SPHERE,
            CRATE_TEXTURES[2],
            Transform::at(Vec3::new(0.0, 2.0, 0.0)),
        ));
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Cats swell between their rest shape and a flattened-wide shape.
fn cat_breathing(sigma: f32) -> Vec3 {
    let blend = 0.5 * (1.0 - (2.0 * sigma).cos());
    Vec3::ONE.lerp(Vec3::new(1.0, 1.0, 0.3), blend)
}
