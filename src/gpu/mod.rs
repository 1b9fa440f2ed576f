pub mod backend;
pub mod mesh;
pub mod overlay;
pub mod texture;

pub use backend::WgpuBackend;
pub use mesh::{Mesh, MeshRegistry, Vertex};
pub use texture::TextureRegistry;
