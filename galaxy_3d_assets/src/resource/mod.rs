//! Resource management module
//!
//! GPU-backed assets (buffers, meshes, textures, materials) and the manager
//! that owns them.

pub mod buffer_data;
pub mod buffer;
pub mod mesh;
mod mesh_builder;
pub mod texture;
pub mod material;
pub mod asset_reader;
mod resource_manager;

pub use buffer_data::BufferData;
pub use buffer::{AttributeBuffer, IndexBuffer};
pub use mesh::{Mesh, Uniforms, CONVENTIONAL_SLOTS, conventional_slot};
pub use mesh_builder::{MeshDesc, TRIANGLE_CENTROID_HEIGHT};
pub use texture::Texture;
pub use material::Material;
pub use asset_reader::{AssetReader, FileSystemReader, MemoryReader};
pub use resource_manager::{ResourceManager, ResourceManagerConfig, StageSet};
