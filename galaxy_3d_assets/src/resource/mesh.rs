//! Resource-level mesh.
//!
//! A `Mesh` owns a set of named attribute channels, one index buffer and the
//! vertex-array object binding them together.
//!
//! # Lifecycle
//!
//! ```text
//! Mesh::new ─► add_channels / set_indices ─► finalize ─► draw (any number of times)
//!                                                 │
//!                                                 └─► destroy / Drop
//! ```
//!
//! Every channel must hold the same number of vertices. The count is adopted
//! from the first channel added, and channel content is replaced through
//! [`Mesh::update_channel`] so the count cannot drift.
//!
//! # Conventional attribute slots
//!
//! | channel     | slot |
//! |-------------|------|
//! | `pos`       | 0    |
//! | `color`     | 1    |
//! | `normal`    | 2    |
//! | `texcoord0` | 3    |
//! | `texcoord1` | 4    |
//! | `texcoord2` | 5    |
//!
//! Channels with other names are only bound by [`Mesh::finalize_with`], through
//! the material's attribute-location table.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{PrimitiveTopology, SharedDevice, UniformValue, VertexArrayHandle};
use crate::resource::buffer::{AttributeBuffer, IndexBuffer};
use crate::resource::buffer_data::BufferData;
use crate::resource::material::Material;

/// Uniform values supplied at draw time, by uniform name
pub type Uniforms = FxHashMap<String, UniformValue>;

/// Scene-wide attribute slots of the well-known channels
pub const CONVENTIONAL_SLOTS: [(&str, u32); 6] = [
    ("pos", 0),
    ("color", 1),
    ("normal", 2),
    ("texcoord0", 3),
    ("texcoord1", 4),
    ("texcoord2", 5),
];

/// Conventional attribute slot of a channel name
pub fn conventional_slot(name: &str) -> Option<u32> {
    CONVENTIONAL_SLOTS
        .iter()
        .find(|(channel, _)| *channel == name)
        .map(|&(_, slot)| slot)
}

// ============================================================================
// MESH
// ============================================================================

pub struct Mesh {
    device: SharedDevice,
    name: String,
    channels: FxHashMap<String, AttributeBuffer>,
    indices: Option<IndexBuffer>,
    topology: PrimitiveTopology,
    /// Unset until the first channel is added
    vertex_count: Option<usize>,
    vertex_array: Option<VertexArrayHandle>,
}

impl Mesh {
    /// Create an empty mesh (triangle topology, no channels)
    pub fn new(device: SharedDevice, name: impl Into<String>) -> Self {
        Self {
            device,
            name: name.into(),
            channels: FxHashMap::default(),
            indices: None,
            topology: PrimitiveTopology::default(),
            vertex_count: None,
            vertex_array: None,
        }
    }

    // ===== COMPOSITION =====

    /// Add channels in order
    ///
    /// Each channel is keyed by its buffer name and replaces any channel of the
    /// same name. Stops at the first channel whose vertex count differs from the
    /// mesh's; channels added earlier in the same call stay in place, and the
    /// rejected buffer (plus any following it) is released.
    ///
    /// # Errors
    ///
    /// `InconsistentVertexCount` naming the mesh and the rejected channel.
    pub fn add_channels(&mut self, buffers: impl IntoIterator<Item = AttributeBuffer>) -> Result<()> {
        for buffer in buffers {
            self.add_channel(buffer)?;
        }
        Ok(())
    }

    /// Add a single channel (see [`Mesh::add_channels`])
    pub fn add_channel(&mut self, buffer: AttributeBuffer) -> Result<()> {
        let count = buffer.element_group_count();
        match self.vertex_count {
            None => self.vertex_count = Some(count),
            Some(expected) if expected != count => {
                return Err(Error::InconsistentVertexCount {
                    mesh: self.name.clone(),
                    channel: buffer.name().to_string(),
                    expected,
                    found: count,
                });
            }
            Some(_) => {}
        }

        self.channels.insert(buffer.name().to_string(), buffer);
        Ok(())
    }

    /// Set the index buffer, releasing the previous one
    pub fn set_indices(&mut self, indices: IndexBuffer) {
        self.indices = Some(indices);
    }

    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
    }

    // ===== FINALIZATION =====

    /// Build the vertex-array binding using the conventional slots
    ///
    /// Calling it again replaces the previous binding object.
    ///
    /// # Errors
    ///
    /// `MissingIndexBuffer` if no index buffer was set.
    pub fn finalize(&mut self) -> Result<()> {
        self.build_vertex_array(|_| None)
    }

    /// Like [`Mesh::finalize`], additionally binding non-conventional channels
    /// at the locations `material` has bound for them
    pub fn finalize_with(&mut self, material: &Material) -> Result<()> {
        self.build_vertex_array(|name| material.attribute_location(name))
    }

    fn build_vertex_array<F>(&mut self, extra_slot: F) -> Result<()>
    where
        F: Fn(&str) -> Option<u32>,
    {
        let indices = self.indices.as_ref().ok_or_else(|| Error::MissingIndexBuffer {
            mesh: self.name.clone(),
        })?;

        if let Some(previous) = self.vertex_array.take() {
            self.device.borrow_mut().delete_vertex_array(previous);
        }

        let vertex_array = self.device.borrow_mut().create_vertex_array()?;
        self.device.borrow_mut().bind_vertex_array(Some(vertex_array));

        for (name, channel) in &self.channels {
            if let Some(slot) = conventional_slot(name).or_else(|| extra_slot(name)) {
                channel.bind(slot);
            }
        }
        indices.bind();

        self.device.borrow_mut().bind_vertex_array(None);
        self.vertex_array = Some(vertex_array);
        Ok(())
    }

    // ===== DRAW =====

    /// Draw the whole index buffer with `material`
    ///
    /// Only uniforms the material has resolved a location for are written;
    /// the others are skipped.
    ///
    /// # Panics
    ///
    /// Panics if the mesh was never finalized (or has been destroyed).
    pub fn draw(&self, material: &Material, uniforms: &Uniforms) {
        let (vertex_array, indices) = match (self.vertex_array, self.indices.as_ref()) {
            (Some(vertex_array), Some(indices)) => (vertex_array, indices),
            _ => panic!("Mesh '{}': draw before finalize", self.name),
        };

        material.bind();
        {
            let mut device = self.device.borrow_mut();
            for (name, value) in uniforms {
                if let Some(location) = material.uniform_location(name) {
                    device.set_uniform(location, value);
                }
            }
            device.bind_vertex_array(Some(vertex_array));
            device.draw_elements(self.topology, indices.len(), indices.index_type());
            device.bind_vertex_array(None);
        }
        material.release();
    }

    // ===== TEARDOWN =====

    /// Release the binding object, every channel and the index buffer
    ///
    /// The mesh is left empty and can be recomposed.
    pub fn destroy(&mut self) {
        if let Some(vertex_array) = self.vertex_array.take() {
            self.device.borrow_mut().delete_vertex_array(vertex_array);
        }
        for channel in self.channels.values_mut() {
            channel.destroy();
        }
        self.channels.clear();
        if let Some(mut indices) = self.indices.take() {
            indices.destroy();
        }
        self.vertex_count = None;
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertices per channel, `None` before the first channel is added
    pub fn vertex_count(&self) -> Option<usize> {
        self.vertex_count
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn channel(&self, name: &str) -> Option<&AttributeBuffer> {
        self.channels.get(name)
    }

    /// Replace the content of channel `name` through [`AttributeBuffer::update`]
    ///
    /// The vertex count of a mesh with several channels is fixed, a mesh with a
    /// single channel adopts the new count.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the mesh has no channel `name`
    /// - `InconsistentVertexCount` if the update would change the vertex count
    ///   of a mesh with several channels; the channel is left untouched
    /// - any error of [`AttributeBuffer::update`]
    pub fn update_channel<'a>(
        &mut self,
        name: &str,
        data: impl Into<BufferData<'a>>,
    ) -> Result<()> {
        let data = data.into();
        let shared = self.channels.len() > 1;
        let buffer = self.channels.get_mut(name).ok_or_else(|| Error::NotFound {
            kind: "Channel",
            name: name.to_string(),
        })?;

        let dimensions = buffer.dimensions();
        let count = data.len() / dimensions;
        let well_formed =
            data.scalar_type() == buffer.scalar_type() && data.len() % dimensions == 0;
        if shared && well_formed && self.vertex_count != Some(count) {
            return Err(Error::InconsistentVertexCount {
                mesh: self.name.clone(),
                channel: name.to_string(),
                expected: self.vertex_count.unwrap_or(0),
                found: count,
            });
        }

        buffer.update(data)?;
        self.vertex_count = Some(buffer.element_group_count());
        Ok(())
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.keys().map(|k| k.as_str()).collect()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn indices(&self) -> Option<&IndexBuffer> {
        self.indices.as_ref()
    }

    pub fn indices_mut(&mut self) -> Option<&mut IndexBuffer> {
        self.indices.as_mut()
    }

    pub fn vertex_array(&self) -> Option<VertexArrayHandle> {
        self.vertex_array
    }

    pub fn is_finalized(&self) -> bool {
        self.vertex_array.is_some()
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        // Channels and indices release themselves
        if let Some(vertex_array) = self.vertex_array.take() {
            if let Ok(mut device) = self.device.try_borrow_mut() {
                device.delete_vertex_array(vertex_array);
            }
        }
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("channels", &self.channels)
            .field("indices", &self.indices)
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("vertex_array", &self.vertex_array)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
