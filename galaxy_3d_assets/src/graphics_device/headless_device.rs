/// In-process graphics device (no GPU required)
///
/// `HeadlessDevice` implements the full `GraphicsDevice` contract on CPU memory.
/// Every object lives in generational slot storage, so a stale handle (double
/// delete, use after delete) is detected instead of aliasing a newer object.
///
/// It is the backend used by the test suite and by offline tools, and records
/// what happened for later inspection:
/// - live object counts per kind
/// - number of link operations
/// - every draw call and uniform write
///
/// Shader "compilation" discovers `uniform <type> <name>;` declarations and
/// reports a compiler log for any source containing an `#error` directive.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice,
    BufferHandle, TextureHandle, VertexArrayHandle, ShaderHandle, ProgramHandle, UniformLocation,
    BufferTarget, BufferUsage, ScalarType, IndexType,
    SamplerDesc, TextureCopy,
    ShaderStage, UniformValue, AttributeBindingError,
    PrimitiveTopology,
};

new_key_type! {
    struct BufferKey;
    struct TextureKey;
    struct VertexArrayKey;
    struct ShaderKey;
    struct ProgramKey;
}

/// Default number of vertex attribute slots
pub const DEFAULT_MAX_VERTEX_ATTRIBUTES: u32 = 16;

/// Attribute names starting with this prefix are reserved
pub const RESERVED_ATTRIBUTE_PREFIX: &str = "gl_";

// ============================================================================
// Stored objects
// ============================================================================

struct BufferObject {
    target: BufferTarget,
    usage: BufferUsage,
    data: Vec<u8>,
    mapped: bool,
}

struct TextureObject {
    width: u32,
    height: u32,
    sampler: SamplerDesc,
    levels: FxHashMap<u32, Vec<u8>>,
}

/// One enabled attribute slot of a vertex array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub buffer: BufferHandle,
    pub components: u32,
    pub scalar: ScalarType,
}

#[derive(Default)]
struct VertexArrayObject {
    attributes: FxHashMap<u32, VertexAttribute>,
    index_buffer: Option<BufferHandle>,
}

struct ShaderObject {
    stage: ShaderStage,
    uniforms: Vec<String>,
    info_log: String,
}

struct ProgramObject {
    uniforms: Vec<String>,
    attribute_locations: FxHashMap<String, u32>,
    info_log: String,
}

/// A recorded `draw_elements` call with the state it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub topology: PrimitiveTopology,
    pub count: usize,
    pub index_type: IndexType,
    pub program: Option<ProgramHandle>,
    pub vertex_array: Option<VertexArrayHandle>,
    pub index_buffer: Option<BufferHandle>,
    /// Bound textures as (unit, texture), sorted by unit
    pub textures: Vec<(u32, TextureHandle)>,
}

/// A recorded `set_uniform` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformWrite {
    pub program: Option<ProgramHandle>,
    pub location: UniformLocation,
    pub value: UniformValue,
}

// ============================================================================
// Handle conversions
// ============================================================================

fn buffer_key(handle: BufferHandle) -> BufferKey {
    KeyData::from_ffi(handle.raw()).into()
}

fn texture_key(handle: TextureHandle) -> TextureKey {
    KeyData::from_ffi(handle.raw()).into()
}

fn vertex_array_key(handle: VertexArrayHandle) -> VertexArrayKey {
    KeyData::from_ffi(handle.raw()).into()
}

fn shader_key(handle: ShaderHandle) -> ShaderKey {
    KeyData::from_ffi(handle.raw()).into()
}

fn program_key(handle: ProgramHandle) -> ProgramKey {
    KeyData::from_ffi(handle.raw()).into()
}

/// Extract `uniform <type> <name>;` declarations from a stage source
fn parse_uniforms(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| line.trim().strip_prefix("uniform "))
        .filter_map(|decl| {
            let decl = decl.split(';').next()?;
            let name = decl.split_whitespace().last()?;
            // Strip array suffixes: `u_lights[4]` declares `u_lights`
            Some(name.split('[').next().unwrap_or(name).to_string())
        })
        .collect()
}

/// Build a compiler log for `#error` directives
fn compile_log(source: &str) -> String {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            line.trim()
                .strip_prefix("#error")
                .map(|rest| format!("0:{}: '#error' : {}", index + 1, rest.trim()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// HeadlessDevice
// ============================================================================

/// CPU-side graphics device
pub struct HeadlessDevice {
    buffers: SlotMap<BufferKey, BufferObject>,
    textures: SlotMap<TextureKey, TextureObject>,
    vertex_arrays: SlotMap<VertexArrayKey, VertexArrayObject>,
    shaders: SlotMap<ShaderKey, ShaderObject>,
    programs: SlotMap<ProgramKey, ProgramObject>,

    max_vertex_attributes: u32,

    bound_vertex_array: Option<VertexArrayHandle>,
    bound_program: Option<ProgramHandle>,
    bound_textures: FxHashMap<u32, TextureHandle>,

    pending_link_failure: Option<String>,
    link_count: usize,
    stale_deletes: usize,
    draw_calls: Vec<DrawCall>,
    uniform_writes: Vec<UniformWrite>,
}

impl HeadlessDevice {
    /// Create a device with [`DEFAULT_MAX_VERTEX_ATTRIBUTES`] attribute slots
    pub fn new() -> Self {
        Self {
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            max_vertex_attributes: DEFAULT_MAX_VERTEX_ATTRIBUTES,
            bound_vertex_array: None,
            bound_program: None,
            bound_textures: FxHashMap::default(),
            pending_link_failure: None,
            link_count: 0,
            stale_deletes: 0,
            draw_calls: Vec::new(),
            uniform_writes: Vec::new(),
        }
    }

    /// Override the number of vertex attribute slots
    pub fn with_max_vertex_attributes(mut self, count: u32) -> Self {
        self.max_vertex_attributes = count;
        self
    }

    /// Make the next `link_program` report `log` as its linker log
    pub fn fail_next_link(&mut self, log: impl Into<String>) {
        self.pending_link_failure = Some(log.into());
    }

    // ===== INSPECTION =====

    pub fn live_buffers(&self) -> usize { self.buffers.len() }

    pub fn live_textures(&self) -> usize { self.textures.len() }

    pub fn live_vertex_arrays(&self) -> usize { self.vertex_arrays.len() }

    pub fn live_shaders(&self) -> usize { self.shaders.len() }

    pub fn live_programs(&self) -> usize { self.programs.len() }

    /// Number of `link_program` calls so far
    pub fn link_count(&self) -> usize { self.link_count }

    /// Number of deletes that targeted an already released object
    pub fn stale_deletes(&self) -> usize { self.stale_deletes }

    pub fn draw_calls(&self) -> &[DrawCall] { &self.draw_calls }

    pub fn uniform_writes(&self) -> &[UniformWrite] { &self.uniform_writes }

    pub fn bound_program(&self) -> Option<ProgramHandle> { self.bound_program }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayHandle> { self.bound_vertex_array }

    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.bound_textures.get(&unit).copied()
    }

    /// Content of a live buffer
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer_key(buffer)).map(|b| b.data.as_slice())
    }

    /// Target and usage a live buffer was created with
    pub fn buffer_info(&self, buffer: BufferHandle) -> Option<(BufferTarget, BufferUsage)> {
        self.buffers.get(buffer_key(buffer)).map(|b| (b.target, b.usage))
    }

    /// RGBA8 content of a texture level (None if never written)
    pub fn texture_level(&self, texture: TextureHandle, mip_level: u32) -> Option<&[u8]> {
        self.textures
            .get(texture_key(texture))
            .and_then(|t| t.levels.get(&mip_level))
            .map(|level| level.as_slice())
    }

    /// Sampling state of a live texture
    pub fn texture_sampler(&self, texture: TextureHandle) -> Option<SamplerDesc> {
        self.textures.get(texture_key(texture)).map(|t| t.sampler)
    }

    /// Attribute slot of a live vertex array
    pub fn vertex_attribute(&self, vertex_array: VertexArrayHandle, location: u32) -> Option<VertexAttribute> {
        self.vertex_arrays
            .get(vertex_array_key(vertex_array))
            .and_then(|va| va.attributes.get(&location).copied())
    }

    /// Number of enabled attribute slots of a live vertex array
    pub fn vertex_attribute_count(&self, vertex_array: VertexArrayHandle) -> usize {
        self.vertex_arrays
            .get(vertex_array_key(vertex_array))
            .map_or(0, |va| va.attributes.len())
    }

    /// Index buffer recorded in a live vertex array
    pub fn vertex_array_index_buffer(&self, vertex_array: VertexArrayHandle) -> Option<BufferHandle> {
        self.vertex_arrays
            .get(vertex_array_key(vertex_array))
            .and_then(|va| va.index_buffer)
    }

    /// Attribute location bound by name on a live program
    pub fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs
            .get(program_key(program))
            .and_then(|p| p.attribute_locations.get(name).copied())
    }

    /// Uniform name behind a location of a live program
    pub fn uniform_name(&self, program: ProgramHandle, location: UniformLocation) -> Option<&str> {
        self.programs
            .get(program_key(program))
            .and_then(|p| p.uniforms.get(location.raw() as usize))
            .map(|name| name.as_str())
    }

    /// Stage a live shader was compiled for
    pub fn shader_stage(&self, shader: ShaderHandle) -> Option<ShaderStage> {
        self.shaders.get(shader_key(shader)).map(|s| s.stage)
    }

    fn buffer_mut(&mut self, buffer: BufferHandle) -> Result<&mut BufferObject> {
        self.buffers
            .get_mut(buffer_key(buffer))
            .ok_or_else(|| Error::BackendError(format!("Invalid buffer handle {:?}", buffer)))
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for HeadlessDevice {
    // ===== BUFFERS =====

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<BufferHandle> {
        let key = self.buffers.insert(BufferObject {
            target,
            usage,
            data: data.to_vec(),
            mapped: false,
        });
        Ok(BufferHandle::from_raw(key.data().as_ffi()))
    }

    fn allocate_buffer(&mut self, target: BufferTarget, size: usize, usage: BufferUsage) -> Result<BufferHandle> {
        let key = self.buffers.insert(BufferObject {
            target,
            usage,
            data: vec![0u8; size],
            mapped: false,
        });
        Ok(BufferHandle::from_raw(key.data().as_ffi()))
    }

    fn update_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        let object = self.buffer_mut(buffer)?;
        if object.mapped {
            return Err(Error::BackendError(format!("Buffer {:?} is mapped", buffer)));
        }
        let end = offset + data.len();
        if end > object.data.len() {
            return Err(Error::BackendError(format!(
                "Write of {} bytes at offset {} exceeds buffer size {}",
                data.len(), offset, object.data.len()
            )));
        }
        object.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn map_buffer(&mut self, buffer: BufferHandle) -> Result<&mut [u8]> {
        let object = self.buffer_mut(buffer)?;
        if object.mapped {
            return Err(Error::BackendError(format!("Buffer {:?} is already mapped", buffer)));
        }
        object.mapped = true;
        Ok(object.data.as_mut_slice())
    }

    fn unmap_buffer(&mut self, buffer: BufferHandle) -> Result<()> {
        let object = self.buffer_mut(buffer)?;
        if !object.mapped {
            return Err(Error::BackendError(format!("Buffer {:?} is not mapped", buffer)));
        }
        object.mapped = false;
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(buffer_key(buffer)).is_none() {
            self.stale_deletes += 1;
        }
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        if let Some(bound) = self.bound_vertex_array {
            if let Some(va) = self.vertex_arrays.get_mut(vertex_array_key(bound)) {
                va.index_buffer = Some(buffer);
            }
        }
    }

    // ===== VERTEX ARRAYS =====

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle> {
        let key = self.vertex_arrays.insert(VertexArrayObject::default());
        Ok(VertexArrayHandle::from_raw(key.data().as_ffi()))
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) {
        self.bound_vertex_array = vertex_array;
    }

    fn vertex_attribute_pointer(&mut self, location: u32, buffer: BufferHandle, components: u32, scalar: ScalarType) {
        if let Some(bound) = self.bound_vertex_array {
            if let Some(va) = self.vertex_arrays.get_mut(vertex_array_key(bound)) {
                va.attributes.insert(location, VertexAttribute { buffer, components, scalar });
            }
        }
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        if self.vertex_arrays.remove(vertex_array_key(vertex_array)).is_none() {
            self.stale_deletes += 1;
        }
        if self.bound_vertex_array == Some(vertex_array) {
            self.bound_vertex_array = None;
        }
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, width: u32, height: u32, sampler: &SamplerDesc) -> Result<TextureHandle> {
        if width == 0 || height == 0 {
            return Err(Error::BackendError(format!("Invalid texture size {}x{}", width, height)));
        }
        let mut levels = FxHashMap::default();
        levels.insert(0, vec![0u8; (width * height * 4) as usize]);
        let key = self.textures.insert(TextureObject {
            width,
            height,
            sampler: *sampler,
            levels,
        });
        Ok(TextureHandle::from_raw(key.data().as_ffi()))
    }

    fn upload_texture(&mut self, texture: TextureHandle, mip_level: u32, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
        let object = self.textures
            .get_mut(texture_key(texture))
            .ok_or_else(|| Error::BackendError(format!("Invalid texture handle {:?}", texture)))?;
        if width > object.width >> mip_level || height > object.height >> mip_level {
            return Err(Error::BackendError(format!(
                "Level {} upload of {}x{} exceeds texture size {}x{}",
                mip_level, width, height, object.width, object.height
            )));
        }
        if rgba.len() != (width * height * 4) as usize {
            return Err(Error::BackendError(format!(
                "Pixel data is {} bytes, expected {}", rgba.len(), width * height * 4
            )));
        }
        object.levels.insert(mip_level, rgba.to_vec());
        Ok(())
    }

    fn copy_buffer_to_texture(&mut self, texture: TextureHandle, mip_level: u32, buffer: BufferHandle, copy: &TextureCopy) -> Result<()> {
        let source = self.buffers
            .get(buffer_key(buffer))
            .ok_or_else(|| Error::BackendError(format!("Invalid buffer handle {:?}", buffer)))?;
        if source.mapped {
            return Err(Error::BackendError(format!("Buffer {:?} is mapped", buffer)));
        }
        let object = self.textures
            .get_mut(texture_key(texture))
            .ok_or_else(|| Error::BackendError(format!("Invalid texture handle {:?}", texture)))?;

        let level_width = (object.width >> mip_level).max(1);
        let level_height = (object.height >> mip_level).max(1);
        if copy.x + copy.width > level_width || copy.y + copy.height > level_height {
            return Err(Error::BackendError(format!(
                "Copy region exceeds level {} size {}x{}", mip_level, level_width, level_height
            )));
        }

        let level = object.levels
            .entry(mip_level)
            .or_insert_with(|| vec![0u8; (level_width * level_height * 4) as usize]);
        let row_bytes = copy.width as usize * 4;
        let source_stride = copy.buffer_row_pixels as usize * 4;
        for row in 0..copy.height as usize {
            let src = copy.buffer_offset + row * source_stride;
            let dst = ((copy.y as usize + row) * level_width as usize + copy.x as usize) * 4;
            let src_row = source.data.get(src..src + row_bytes).ok_or_else(|| {
                Error::BackendError("Copy region exceeds staging buffer".to_string())
            })?;
            level[dst..dst + row_bytes].copy_from_slice(src_row);
        }
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) {
        match texture {
            Some(texture) => {
                self.bound_textures.insert(unit, texture);
            }
            None => {
                self.bound_textures.remove(&unit);
            }
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(texture_key(texture)).is_none() {
            self.stale_deletes += 1;
        }
        self.bound_textures.retain(|_, bound| *bound != texture);
    }

    // ===== SHADERS & PROGRAMS =====

    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        let key = self.shaders.insert(ShaderObject {
            stage,
            uniforms: parse_uniforms(source),
            info_log: compile_log(source),
        });
        Ok(ShaderHandle::from_raw(key.data().as_ffi()))
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.shaders
            .get(shader_key(shader))
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        if self.shaders.remove(shader_key(shader)).is_none() {
            self.stale_deletes += 1;
        }
    }

    fn link_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle> {
        self.link_count += 1;

        let mut uniforms: Vec<String> = Vec::new();
        for &shader in shaders {
            let object = self.shaders
                .get(shader_key(shader))
                .ok_or_else(|| Error::BackendError(format!("Invalid shader handle {:?}", shader)))?;
            for name in &object.uniforms {
                if !uniforms.contains(name) {
                    uniforms.push(name.clone());
                }
            }
        }

        let info_log = self.pending_link_failure.take().unwrap_or_default();
        let key = self.programs.insert(ProgramObject {
            uniforms,
            attribute_locations: FxHashMap::default(),
            info_log,
        });
        Ok(ProgramHandle::from_raw(key.data().as_ffi()))
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.programs
            .get(program_key(program))
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(program_key(program)).is_none() {
            self.stale_deletes += 1;
        }
        if self.bound_program == Some(program) {
            self.bound_program = None;
        }
    }

    fn bind_attribute_location(
        &mut self,
        program: ProgramHandle,
        location: u32,
        name: &str,
    ) -> std::result::Result<(), AttributeBindingError> {
        if location >= self.max_vertex_attributes {
            return Err(AttributeBindingError::LocationOutOfRange);
        }
        if name.starts_with(RESERVED_ATTRIBUTE_PREFIX) {
            return Err(AttributeBindingError::ReservedName);
        }
        if let Some(object) = self.programs.get_mut(program_key(program)) {
            object.attribute_locations.insert(name.to_string(), location);
        }
        Ok(())
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.programs
            .get(program_key(program))?
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| UniformLocation::from_raw(index as u64))
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.bound_program = program;
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.uniform_writes.push(UniformWrite {
            program: self.bound_program,
            location,
            value: *value,
        });
    }

    // ===== DRAW =====

    fn draw_elements(&mut self, topology: PrimitiveTopology, count: usize, index_type: IndexType) {
        let index_buffer = self.bound_vertex_array
            .and_then(|va| self.vertex_arrays.get(vertex_array_key(va)))
            .and_then(|va| va.index_buffer);
        let mut textures: Vec<(u32, TextureHandle)> = self.bound_textures
            .iter()
            .map(|(&unit, &texture)| (unit, texture))
            .collect();
        textures.sort_by_key(|&(unit, _)| unit);

        self.draw_calls.push(DrawCall {
            topology,
            count,
            index_type,
            program: self.bound_program,
            vertex_array: self.bound_vertex_array,
            index_buffer,
            textures,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "headless_device_tests.rs"]
mod tests;
