/// Graphics device module - the GPU interface consumed by the asset layer

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod shader;
pub mod vertex_array;
pub mod headless_device;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use texture::*;
pub use shader::*;
pub use vertex_array::*;
pub use headless_device::{HeadlessDevice, DrawCall, UniformWrite, VertexAttribute};
