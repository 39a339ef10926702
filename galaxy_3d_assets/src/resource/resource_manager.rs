/// Central resource manager.
///
/// Stores materials, meshes and textures by name, compiled shader stages by
/// file name, and linked programs by the set of stages they were linked from.
///
/// # Scopes
///
/// A manager may have a parent (see [`ResourceManager::child`]). Lookups
/// (`get_*`, and the reuse step of every `load_*`) search the local maps first,
/// then each parent in turn. Registration (`add_*`) only checks the local maps,
/// so a child can register a name its parent already holds; from then on the
/// child sees its own resource and the parent is unaffected.
///
/// A child borrows its parent, so the parent chain is always finite and acyclic
/// and the parent outlives the child.
///
/// # Ownership
///
/// Everything registered in a manager is owned by it. `clean()` (also run on
/// drop) releases the local resources and never touches the parent's.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{ProgramHandle, ShaderHandle, ShaderStage, SharedDevice};
use crate::log::{Logger, NullLogger};
use crate::resource::asset_reader::{AssetReader, FileSystemReader};
use crate::resource::material::Material;
use crate::resource::mesh::Mesh;
use crate::resource::texture::Texture;
use crate::{engine_error, engine_info};

const LOG_SOURCE: &str = "galaxy3d::ResourceManager";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Where assets are read from
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceManagerConfig {
    /// Root of every asset path
    pub asset_root: PathBuf,
    /// Shader sources, relative to `asset_root`
    pub shader_dir: PathBuf,
    /// Texture images, relative to `asset_root`
    pub texture_dir: PathBuf,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            shader_dir: PathBuf::from("shaders"),
            texture_dir: PathBuf::from("textures"),
        }
    }
}

impl ResourceManagerConfig {
    /// Conventional path of a shader source (`assets/shaders/<name>`)
    pub fn shader_path(&self, name: &str) -> PathBuf {
        self.asset_root.join(&self.shader_dir).join(name)
    }

    /// Conventional path of a texture image (`assets/textures/<name>`)
    pub fn texture_path(&self, name: &str) -> PathBuf {
        self.asset_root.join(&self.texture_dir).join(name)
    }
}

// ============================================================================
// STAGE SET
// ============================================================================

/// The stages a program is linked from; identifies one linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageSet {
    pub vertex: ShaderHandle,
    pub fragment: ShaderHandle,
    pub geometry: Option<ShaderHandle>,
}

impl StageSet {
    /// Stages in link order
    pub fn stages(&self) -> Vec<ShaderHandle> {
        let mut stages = vec![self.vertex, self.fragment];
        stages.extend(self.geometry);
        stages
    }
}

impl fmt::Display for StageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.geometry {
            Some(geometry) => write!(
                f,
                "({:#x}, {:#x}, {:#x})",
                self.vertex.raw(), self.fragment.raw(), geometry.raw()
            ),
            None => write!(f, "({:#x}, {:#x}, -)", self.vertex.raw(), self.fragment.raw()),
        }
    }
}

// ============================================================================
// RESOURCE MANAGER
// ============================================================================

pub struct ResourceManager<'p> {
    device: SharedDevice,
    reader: Rc<dyn AssetReader>,
    logger: Arc<dyn Logger>,
    config: ResourceManagerConfig,

    materials: FxHashMap<String, Material>,
    meshes: FxHashMap<String, Mesh>,
    textures: FxHashMap<String, Rc<Texture>>,
    shaders: FxHashMap<String, ShaderHandle>,
    programs: FxHashMap<StageSet, ProgramHandle>,

    parent: Option<&'p ResourceManager<'p>>,
}

/// Walks a manager and its parents, nearest first
struct Scopes<'a> {
    next: Option<&'a ResourceManager<'a>>,
}

impl<'a> Iterator for Scopes<'a> {
    type Item = &'a ResourceManager<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

impl ResourceManager<'static> {
    /// Create a root manager reading from the file system, with a silent logger
    pub fn new(device: SharedDevice) -> Self {
        Self::with_scope(
            device,
            Rc::new(FileSystemReader),
            Arc::new(NullLogger),
            ResourceManagerConfig::default(),
            None,
        )
    }
}

impl<'p> ResourceManager<'p> {
    fn with_scope(
        device: SharedDevice,
        reader: Rc<dyn AssetReader>,
        logger: Arc<dyn Logger>,
        config: ResourceManagerConfig,
        parent: Option<&'p ResourceManager<'p>>,
    ) -> Self {
        Self {
            device,
            reader,
            logger,
            config,
            materials: FxHashMap::default(),
            meshes: FxHashMap::default(),
            textures: FxHashMap::default(),
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            parent,
        }
    }

    /// Replace the asset reader
    pub fn with_reader(mut self, reader: Rc<dyn AssetReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Replace the logger
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ResourceManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Create an empty child scope sharing this manager's device, reader,
    /// logger and configuration
    pub fn child(&self) -> ResourceManager<'_> {
        ResourceManager::with_scope(
            self.device.clone(),
            self.reader.clone(),
            self.logger.clone(),
            self.config.clone(),
            Some(self),
        )
    }

    fn scopes(&self) -> Scopes<'_> {
        Scopes { next: Some(self) }
    }

    // ===== MATERIALS =====

    /// Register a material under its name
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if this manager already holds a material of that name.
    pub fn add_material(&mut self, material: Material) -> Result<()> {
        if self.materials.contains_key(material.name()) {
            return Err(Error::AlreadyExists {
                kind: "Material",
                name: material.name().to_string(),
            });
        }
        engine_info!(self.logger, LOG_SOURCE, "Adding Material '{}'", material.name());
        self.materials.insert(material.name().to_string(), material);
        Ok(())
    }

    /// Find a material here or in a parent
    pub fn get_material(&self, name: &str) -> Option<&Material> {
        self.scopes().find_map(|scope| scope.materials.get(name))
    }

    /// Mutable access to a local material
    pub fn get_material_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.get_mut(name)
    }

    // ===== MESHES =====

    /// Register a mesh under its name
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if this manager already holds a mesh of that name. The
    /// rejected mesh is dropped and its GPU resources released.
    pub fn add_mesh(&mut self, mesh: Mesh) -> Result<()> {
        if self.meshes.contains_key(mesh.name()) {
            return Err(Error::AlreadyExists {
                kind: "Mesh",
                name: mesh.name().to_string(),
            });
        }
        engine_info!(self.logger, LOG_SOURCE, "Adding Mesh '{}'", mesh.name());
        self.meshes.insert(mesh.name().to_string(), mesh);
        Ok(())
    }

    /// Find a mesh here or in a parent
    pub fn get_mesh(&self, name: &str) -> Option<&Mesh> {
        self.scopes().find_map(|scope| scope.meshes.get(name))
    }

    /// Mutable access to a local mesh (finalizing, channel updates)
    pub fn get_mesh_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.meshes.get_mut(name)
    }

    // ===== TEXTURES =====

    /// Register a texture under its name
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if this manager already holds a texture of that name.
    pub fn add_texture(&mut self, texture: Rc<Texture>) -> Result<()> {
        if self.textures.contains_key(texture.name()) {
            return Err(Error::AlreadyExists {
                kind: "Texture",
                name: texture.name().to_string(),
            });
        }
        engine_info!(self.logger, LOG_SOURCE, "Adding Texture '{}'", texture.name());
        self.textures.insert(texture.name().to_string(), texture);
        Ok(())
    }

    /// Find a texture here or in a parent
    pub fn get_texture(&self, name: &str) -> Option<Rc<Texture>> {
        self.scopes().find_map(|scope| scope.textures.get(name)).cloned()
    }

    /// Return the texture `name`, loading it from `assets/textures/<name>` if no
    /// scope holds it yet
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `ImageDecode` if it is not a supported
    /// image, or any texture creation error.
    pub fn load_texture(&mut self, name: &str) -> Result<Rc<Texture>> {
        if let Some(texture) = self.get_texture(name) {
            return Ok(texture);
        }

        engine_info!(self.logger, LOG_SOURCE, "Loading Texture '{}'", name);
        let bytes = self.read_asset(&self.config.texture_path(name))?;
        let image = image::load_from_memory(&bytes).map_err(|err| {
            engine_error!(self.logger, LOG_SOURCE, "Cannot decode Texture '{}': {}", name, err);
            Error::ImageDecode {
                name: name.to_string(),
                message: err.to_string(),
            }
        })?;

        let texture = Rc::new(Texture::from_image(self.device.clone(), name, &image)?);
        self.add_texture(texture.clone())?;
        Ok(texture)
    }

    /// Load several textures, all or nothing
    ///
    /// The first failure is returned and no texture is; textures loaded before
    /// the failure stay registered.
    pub fn load_textures<S: AsRef<str>>(&mut self, names: impl IntoIterator<Item = S>) -> Result<Vec<Rc<Texture>>> {
        names
            .into_iter()
            .map(|name| self.load_texture(name.as_ref()))
            .collect()
    }

    // ===== SHADERS =====

    /// Register a compiled shader stage under its file name
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if this manager already holds a shader of that name.
    pub fn add_shader(&mut self, name: &str, shader: ShaderHandle) -> Result<()> {
        if self.shaders.contains_key(name) {
            return Err(Error::AlreadyExists {
                kind: "Shader",
                name: name.to_string(),
            });
        }
        engine_info!(self.logger, LOG_SOURCE, "Adding Shader '{}'", name);
        self.shaders.insert(name.to_string(), shader);
        Ok(())
    }

    /// Find a shader stage here or in a parent
    pub fn get_shader(&self, name: &str) -> Option<ShaderHandle> {
        self.scopes().find_map(|scope| scope.shaders.get(name).copied())
    }

    /// Return the stage compiled from `name`, compiling `assets/shaders/<name>`
    /// if no scope holds it yet
    ///
    /// # Errors
    ///
    /// `Io` if the source cannot be read, `CompileFailed` carrying the compiler
    /// log. A stage that fails to compile is deleted and not registered.
    pub fn load_shader_stage(&mut self, stage: ShaderStage, name: &str) -> Result<ShaderHandle> {
        if let Some(shader) = self.get_shader(name) {
            return Ok(shader);
        }

        engine_info!(self.logger, LOG_SOURCE, "Loading Shader '{}'", name);
        let bytes = self.read_asset(&self.config.shader_path(name))?;
        let source = String::from_utf8_lossy(&bytes);

        let shader = self.device.borrow_mut().create_shader(stage, &source)?;
        let log = self.device.borrow().shader_info_log(shader);
        if !log.is_empty() {
            self.device.borrow_mut().delete_shader(shader);
            engine_error!(self.logger, LOG_SOURCE, "Shader '{}' failed to compile: {}", name, log);
            return Err(Error::CompileFailed {
                shader: name.to_string(),
                log,
            });
        }

        self.add_shader(name, shader)?;
        Ok(shader)
    }

    // ===== PROGRAMS =====

    /// Register a linked program under its stage set
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if this manager already holds a program for that set.
    pub fn add_program(&mut self, stages: StageSet, program: ProgramHandle) -> Result<()> {
        if self.programs.contains_key(&stages) {
            return Err(Error::AlreadyExists {
                kind: "Program",
                name: stages.to_string(),
            });
        }
        engine_info!(self.logger, LOG_SOURCE, "Adding Program {}", stages);
        self.programs.insert(stages, program);
        Ok(())
    }

    /// Find a program here or in a parent
    pub fn get_program(&self, stages: &StageSet) -> Option<ProgramHandle> {
        self.scopes().find_map(|scope| scope.programs.get(stages).copied())
    }

    /// Return the program linked from the given stage files, loading the stages
    /// and linking as needed
    ///
    /// An empty `geometry` name means no geometry stage. Identical stage sets
    /// always resolve to the same program, across scopes.
    ///
    /// # Errors
    ///
    /// Any stage loading error, or `LinkFailed` carrying the linker log. A
    /// program that fails to link is deleted and not registered.
    pub fn load_program(&mut self, vertex: &str, fragment: &str, geometry: &str) -> Result<ProgramHandle> {
        let stages = StageSet {
            vertex: self.load_shader_stage(ShaderStage::Vertex, vertex)?,
            fragment: self.load_shader_stage(ShaderStage::Fragment, fragment)?,
            geometry: if geometry.is_empty() {
                None
            } else {
                Some(self.load_shader_stage(ShaderStage::Geometry, geometry)?)
            },
        };

        if let Some(program) = self.get_program(&stages) {
            return Ok(program);
        }

        let label = format!("({}, {}, {})", vertex, fragment, geometry);
        engine_info!(self.logger, LOG_SOURCE, "Linking Program {}", label);

        let program = self.device.borrow_mut().link_program(&stages.stages())?;
        let log = self.device.borrow().program_info_log(program);
        if !log.is_empty() {
            self.device.borrow_mut().delete_program(program);
            engine_error!(self.logger, LOG_SOURCE, "Program {} failed to link: {}", label, log);
            return Err(Error::LinkFailed {
                program: label,
                log,
            });
        }

        self.add_program(stages, program)?;
        Ok(program)
    }

    // ===== TEARDOWN =====

    /// Release every local resource and empty the local maps
    ///
    /// Materials only drop their program reference; meshes, programs, shader
    /// stages and textures are deleted on the device. Parents are untouched.
    pub fn clean(&mut self) {
        for (name, mut material) in self.materials.drain() {
            engine_info!(self.logger, LOG_SOURCE, "Deleting Material '{}'", name);
            material.clean();
        }
        for (name, mut mesh) in self.meshes.drain() {
            engine_info!(self.logger, LOG_SOURCE, "Deleting Mesh '{}'", name);
            mesh.destroy();
        }
        for (stages, program) in self.programs.drain() {
            engine_info!(self.logger, LOG_SOURCE, "Deleting Program {}", stages);
            self.device.borrow_mut().delete_program(program);
        }
        for (name, shader) in self.shaders.drain() {
            engine_info!(self.logger, LOG_SOURCE, "Deleting Shader '{}'", name);
            self.device.borrow_mut().delete_shader(shader);
        }
        for (name, texture) in self.textures.drain() {
            engine_info!(self.logger, LOG_SOURCE, "Deleting Texture '{}'", name);
            texture.destroy();
        }
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn config(&self) -> &ResourceManagerConfig {
        &self.config
    }

    pub fn parent(&self) -> Option<&'p ResourceManager<'p>> {
        self.parent
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    fn read_asset(&self, path: &Path) -> Result<Vec<u8>> {
        self.reader.read(path).map_err(|err| {
            engine_error!(self.logger, LOG_SOURCE, "Cannot read '{}': {}", path.display(), err);
            Error::Io {
                path: path.display().to_string(),
                message: err.to_string(),
            }
        })
    }
}

impl Drop for ResourceManager<'_> {
    fn drop(&mut self) {
        if self.device.try_borrow_mut().is_ok() {
            self.clean();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
