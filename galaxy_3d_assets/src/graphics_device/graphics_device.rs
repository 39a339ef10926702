/// GraphicsDevice trait - the narrow GPU interface consumed by the asset layer
///
/// The asset layer never talks to a graphics API directly. It decides when and
/// with what parameters GPU objects are created, filled, bound and deleted, and
/// forwards those decisions to a `GraphicsDevice`. Backends (an OpenGL binding,
/// the in-process `HeadlessDevice`, ...) implement this trait.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::graphics_device::{
    BufferTarget, BufferUsage, ScalarType, IndexType,
    SamplerDesc, TextureCopy,
    ShaderStage, UniformValue, AttributeBindingError,
    PrimitiveTopology,
};

// ============================================================================
// Handles
// ============================================================================

macro_rules! device_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a backend-specific raw identifier
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Backend-specific raw identifier
            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

device_handle!(
    /// Opaque handle to a device buffer (vertex, index or staging storage)
    BufferHandle
);
device_handle!(
    /// Opaque handle to a 2D texture image store
    TextureHandle
);
device_handle!(
    /// Opaque handle to a vertex-array binding object
    VertexArrayHandle
);
device_handle!(
    /// Opaque handle to a compiled shader stage
    ShaderHandle
);
device_handle!(
    /// Opaque handle to a linked shader program
    ProgramHandle
);
device_handle!(
    /// Resolved uniform location within a linked program
    UniformLocation
);

// ============================================================================
// Device trait
// ============================================================================

/// Device shared by every resource created on it.
///
/// The asset layer is single-threaded: all resources and managers built on a
/// device live on the thread that owns the graphics context.
pub type SharedDevice = Rc<RefCell<dyn GraphicsDevice>>;

/// Graphics device trait
///
/// Object-safe so resources can hold a [`SharedDevice`].
pub trait GraphicsDevice {
    // ===== BUFFERS =====

    /// Create a buffer sized to `data` and upload it
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<BufferHandle>;

    /// Create a zero-filled buffer of `size` bytes
    fn allocate_buffer(&mut self, target: BufferTarget, size: usize, usage: BufferUsage) -> Result<BufferHandle>;

    /// Overwrite `data.len()` bytes starting at `offset` (sub-range upload)
    fn update_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()>;

    /// Map the whole buffer for CPU writes
    ///
    /// The buffer must be unmapped with [`GraphicsDevice::unmap_buffer`] before
    /// the GPU reads from it.
    fn map_buffer(&mut self, buffer: BufferHandle) -> Result<&mut [u8]>;

    /// Release a mapping obtained with [`GraphicsDevice::map_buffer`]
    fn unmap_buffer(&mut self, buffer: BufferHandle) -> Result<()>;

    /// Release the buffer's storage
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Make `buffer` the index source of the bound vertex array
    fn bind_index_buffer(&mut self, buffer: BufferHandle);

    // ===== VERTEX ARRAYS =====

    /// Create an empty vertex-array binding object
    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle>;

    /// Bind a vertex array (or unbind with `None`)
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>);

    /// Enable attribute slot `location` of the bound vertex array and point it
    /// at `buffer`, read as tightly packed groups of `components` scalars
    fn vertex_attribute_pointer(&mut self, location: u32, buffer: BufferHandle, components: u32, scalar: ScalarType);

    /// Release a vertex-array binding object
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    // ===== TEXTURES =====

    /// Create a 2D texture with eagerly allocated RGBA8 storage
    fn create_texture(&mut self, width: u32, height: u32, sampler: &SamplerDesc) -> Result<TextureHandle>;

    /// Replace the full content of one mip level with tightly packed RGBA8 pixels
    fn upload_texture(&mut self, texture: TextureHandle, mip_level: u32, width: u32, height: u32, rgba: &[u8]) -> Result<()>;

    /// Copy a region from a staging buffer into one mip level of `texture`
    fn copy_buffer_to_texture(&mut self, texture: TextureHandle, mip_level: u32, buffer: BufferHandle, copy: &TextureCopy) -> Result<()>;

    /// Bind a texture to a texture unit (or unbind with `None`)
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>);

    /// Release the texture's storage
    fn delete_texture(&mut self, texture: TextureHandle);

    // ===== SHADERS & PROGRAMS =====

    /// Compile a shader stage
    ///
    /// Compilation problems are not errors at this level: they show up as a
    /// non-empty [`GraphicsDevice::shader_info_log`].
    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle>;

    /// Compiler log of a shader stage (empty on success)
    fn shader_info_log(&self, shader: ShaderHandle) -> String;

    /// Release a shader stage
    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Link a program from compiled stages
    ///
    /// Link problems show up as a non-empty [`GraphicsDevice::program_info_log`].
    fn link_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle>;

    /// Linker log of a program (empty on success)
    fn program_info_log(&self, program: ProgramHandle) -> String;

    /// Release a program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Bind a vertex attribute name to an attribute slot of `program`
    fn bind_attribute_location(
        &mut self,
        program: ProgramHandle,
        location: u32,
        name: &str,
    ) -> std::result::Result<(), AttributeBindingError>;

    /// Location of an active uniform, `None` if the program does not declare it
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Make `program` current (or clear with `None`)
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Write a uniform of the current program
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    // ===== DRAW =====

    /// Issue one indexed draw over `count` indices of the bound vertex array
    fn draw_elements(&mut self, topology: PrimitiveTopology, count: usize, index_type: IndexType);
}
