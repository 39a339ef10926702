/// Resource-level material.
///
/// A `Material` groups the textures, sampler names and linked program used to
/// draw a mesh, plus the attribute and uniform locations resolved against that
/// program.
///
/// The material does not own its textures or its program: both belong to the
/// resource manager that loaded them. `clean()` only drops the program reference.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AttributeBindingError, ProgramHandle, SharedDevice, UniformLocation, UniformValue,
};
use crate::resource::texture::Texture;

pub struct Material {
    device: SharedDevice,
    name: String,
    /// Texture N is bound to texture unit N
    textures: Vec<Rc<Texture>>,
    /// Sampler uniform N reads texture N
    samplers: Vec<String>,
    program: Option<ProgramHandle>,
    attribute_locations: FxHashMap<String, u32>,
    uniform_locations: FxHashMap<String, UniformLocation>,
}

impl Material {
    /// Create an empty material (no textures, no program)
    pub fn new(device: SharedDevice, name: impl Into<String>) -> Self {
        Self {
            device,
            name: name.into(),
            textures: Vec::new(),
            samplers: Vec::new(),
            program: None,
            attribute_locations: FxHashMap::default(),
            uniform_locations: FxHashMap::default(),
        }
    }

    pub fn add_textures(&mut self, textures: impl IntoIterator<Item = Rc<Texture>>) {
        self.textures.extend(textures);
    }

    pub fn add_samplers<S: Into<String>>(&mut self, samplers: impl IntoIterator<Item = S>) {
        self.samplers.extend(samplers.into_iter().map(Into::into));
    }

    pub fn attach_program(&mut self, program: ProgramHandle) {
        self.program = Some(program);
    }

    /// Bind vertex attribute `attribute` to slot `location` of the program
    ///
    /// # Errors
    ///
    /// - `NoProgram` if no program is attached
    /// - `LocationOutOfRange` if `location` exceeds the device's attribute slots
    /// - `ReservedName` if `attribute` starts with `gl_`
    pub fn bind_attribute_location(&mut self, attribute: &str, location: u32) -> Result<()> {
        let program = self.require_program()?;

        let bound = self.device
            .borrow_mut()
            .bind_attribute_location(program, location, attribute);

        match bound {
            Ok(()) => {
                self.attribute_locations.insert(attribute.to_string(), location);
                Ok(())
            }
            Err(AttributeBindingError::LocationOutOfRange) => Err(Error::LocationOutOfRange {
                material: self.name.clone(),
                attribute: attribute.to_string(),
                location,
            }),
            Err(AttributeBindingError::ReservedName) => Err(Error::ReservedName {
                material: self.name.clone(),
                attribute: attribute.to_string(),
            }),
        }
    }

    /// Resolve and record the location of each named uniform
    ///
    /// Stops at the first unknown name; names resolved before it stay recorded.
    ///
    /// # Errors
    ///
    /// - `NoProgram` if no program is attached
    /// - `UnknownUniform` naming the material and the missing uniform
    pub fn resolve_uniforms<S: AsRef<str>>(&mut self, names: impl IntoIterator<Item = S>) -> Result<()> {
        let program = self.require_program()?;

        for name in names {
            let name = name.as_ref();
            let location = self.device.borrow().uniform_location(program, name);
            match location {
                Some(location) => {
                    self.uniform_locations.insert(name.to_string(), location);
                }
                None => {
                    return Err(Error::UnknownUniform {
                        material: self.name.clone(),
                        uniform: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Bind textures to units 0..n and make the program current
    ///
    /// Sampler uniforms with a resolved location are pointed at their unit.
    pub fn bind(&self) {
        for (unit, texture) in self.textures.iter().enumerate() {
            texture.bind(unit as u32);
        }

        let mut device = self.device.borrow_mut();
        device.use_program(self.program);
        for (unit, sampler) in self.samplers.iter().enumerate().take(self.textures.len()) {
            if let Some(&location) = self.uniform_locations.get(sampler) {
                device.set_uniform(location, &UniformValue::Int(unit as i32));
            }
        }
    }

    /// Clear the current program and unbind every texture unit used by `bind`
    pub fn release(&self) {
        self.device.borrow_mut().use_program(None);
        for (unit, texture) in self.textures.iter().enumerate() {
            texture.release(unit as u32);
        }
    }

    /// Drop the program reference (the program itself is not deleted)
    pub fn clean(&mut self) {
        self.program = None;
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn textures(&self) -> &[Rc<Texture>] {
        &self.textures
    }

    pub fn samplers(&self) -> &[String] {
        &self.samplers
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    pub fn attribute_locations(&self) -> &FxHashMap<String, u32> {
        &self.attribute_locations
    }

    pub fn attribute_location(&self, attribute: &str) -> Option<u32> {
        self.attribute_locations.get(attribute).copied()
    }

    pub fn uniform_location(&self, uniform: &str) -> Option<UniformLocation> {
        self.uniform_locations.get(uniform).copied()
    }

    fn require_program(&self) -> Result<ProgramHandle> {
        self.program.ok_or_else(|| Error::NoProgram {
            material: self.name.clone(),
        })
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("textures", &self.textures.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("samplers", &self.samplers)
            .field("program", &self.program)
            .field("attribute_locations", &self.attribute_locations)
            .field("uniform_locations", &self.uniform_locations)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
