use std::collections::HashMap;
use std::f32::consts::{PI, TAU};
use std::path::Path;

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

/// Interleaved vertex for all 3D meshes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3],
    };
}

/// GPU-resident indexed mesh.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl Mesh {
    pub fn upload(
        device: &wgpu::Device,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// Named mesh store the scene's string handles resolve through.
#[derive(Default)]
pub struct MeshRegistry {
    meshes: HashMap<String, Mesh>,
}

impl MeshRegistry {
    pub fn insert(&mut self, name: impl Into<String>, mesh: Mesh) {
        self.meshes.insert(name.into(), mesh);
    }

    pub fn get(&self, name: &str) -> Option<&Mesh> {
        self.meshes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }
}

/// Unit cube centered at the origin, one quad per face so normals stay flat.
pub fn cube() -> (Vec<Vertex>, Vec<u32>) {
    // Per-face corners in CCW order when viewed from outside.
    const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0], [
            [-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0],
        ]),
        ([0.0, 0.0, -1.0], [
            [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0],
        ]),
        ([1.0, 0.0, 0.0], [
            [1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
        ]),
        ([-1.0, 0.0, 0.0], [
            [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0],
        ]),
        ([0.0, 1.0, 0.0], [
            [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0],
        ]),
        ([0.0, -1.0, 0.0], [
            [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0],
        ]),
    ];
    const UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in FACES {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(UVS) {
            vertices.push(Vertex {
                position: corner.map(|c| c * 0.5),
                tex_coord: uv,
                normal,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// UV sphere of radius 1.
pub fn sphere(sectors: u32, stacks: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for stack in 0..=stacks {
        let phi = PI / 2.0 - stack as f32 / stacks as f32 * PI;
        let (y, ring) = (phi.sin(), phi.cos());
        for sector in 0..=sectors {
            let theta = sector as f32 / sectors as f32 * TAU;
            let normal = Vec3::new(ring * theta.cos(), y, ring * theta.sin());
            vertices.push(Vertex {
                position: normal.to_array(),
                tex_coord: Vec2::new(
                    sector as f32 / sectors as f32,
                    stack as f32 / stacks as f32,
                )
                .to_array(),
                normal: normal.to_array(),
            });
        }
    }

    for stack in 0..stacks {
        for sector in 0..sectors {
            let a = stack * (sectors + 1) + sector;
            let b = a + sectors + 1;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    (vertices, indices)
}

/// Stand-in cat: a stretched box body with a smaller box head, used when no
/// model file is supplied.
pub fn cat_placeholder() -> (Vec<Vertex>, Vec<u32>) {
    let (mut vertices, mut indices) = (Vec::new(), Vec::new());

    let mut add_box = |center: Vec3, half: Vec3| {
        let (cube_vertices, cube_indices) = cube();
        let base = vertices.len() as u32;
        vertices.extend(cube_vertices.into_iter().map(|v| Vertex {
            position: (Vec3::from_array(v.position) * 2.0 * half + center).to_array(),
            ..v
        }));
        indices.extend(cube_indices.into_iter().map(|i| i + base));
    };

    add_box(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.4, 0.5, 1.0));
    add_box(Vec3::new(0.0, 1.3, -1.1), Vec3::new(0.35, 0.35, 0.35));
    (vertices, indices)
}

/// Loads every mesh primitive from a glTF file into a single vertex/index
/// list, node transforms applied.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<(Vec<Vertex>, Vec<u32>)> {
    let path = path.as_ref();
    let (document, buffers, _images) =
        gltf::import(path).context(format!("failed to load glTF file {path:?}"))?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for scene in document.scenes() {
        for node in scene.nodes() {
            collect_node(&node, &buffers, Mat4::IDENTITY, &mut vertices, &mut indices)?;
        }
    }

    anyhow::ensure!(!vertices.is_empty(), "no geometry in glTF file {path:?}");
    log::info!(
        "loaded {path:?}: {} vertices, {} triangles",
        vertices.len(),
        indices.len() / 3
    );
    Ok((vertices, indices))
}

fn collect_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: Mat4,
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
) -> Result<()> {
    let transform =
        parent_transform * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .context("mesh primitive has no positions")?
                .collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
            let tex_coords: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

            let base = vertices.len() as u32;
            for ((position, normal), tex_coord) in
                positions.iter().zip(&normals).zip(&tex_coords)
            {
                vertices.push(Vertex {
                    position: transform
                        .transform_point3(Vec3::from_array(*position))
                        .to_array(),
                    tex_coord: *tex_coord,
                    normal: transform
                        .transform_vector3(Vec3::from_array(*normal))
                        .normalize_or_zero()
                        .to_array(),
                });
            }

            match reader.read_indices() {
                Some(read) => indices.extend(read.into_u32().map(|i| i + base)),
                None => indices.extend(base..vertices.len() as u32),
            }
        }
    }

    for child in node.children() {
        collect_node(&child, buffers, transform, vertices, indices)?;
    }
    Ok(())
}
