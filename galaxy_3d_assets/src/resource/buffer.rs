/// Resource-level GPU buffers.
///
/// - **AttributeBuffer**: one named vertex channel (positions, colors, ...),
///   `dimensions` scalars per vertex
/// - **IndexBuffer**: element indices for an indexed draw
///
/// Both are allocated at creation to exactly fit their initial data. That size
/// becomes the `capacity`: later updates may shrink or regrow the live length
/// up to it, never beyond, and never reallocate.
///
/// Lengths and capacities are counted in scalars (a `Vec3` counts as 3).

use std::fmt;

use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferHandle, BufferTarget, BufferUsage, IndexType, ScalarType, SharedDevice,
};
use crate::resource::buffer_data::BufferData;

/// Index buffers are not named; errors refer to them by this label
const INDEX_BUFFER_LABEL: &str = "IndexBuffer";

// ============================================================================
// ATTRIBUTE BUFFER
// ============================================================================

/// A vertex attribute channel backed by a GPU buffer
pub struct AttributeBuffer {
    device: SharedDevice,
    name: String,
    handle: Option<BufferHandle>,
    dimensions: usize,
    scalar_type: ScalarType,
    len: usize,
    capacity: usize,
}

impl AttributeBuffer {
    /// Create a channel and upload its initial data
    ///
    /// Accepted element kinds: `u8`, `f32`, `f64` and the `Vec2`/`Vec3`/`DVec2`/`DVec3`
    /// groupings, which are expanded to scalars before the dimension check.
    ///
    /// # Errors
    ///
    /// - `EmptyData` if `data` is empty
    /// - `UnsupportedType` for `u16`/`u32` data
    /// - `InvalidDimensions` if `dimensions` is zero or the scalar count is not a
    ///   multiple of it
    ///
    /// No GPU storage is allocated when validation fails.
    pub fn new<'a>(
        device: SharedDevice,
        name: impl Into<String>,
        dimensions: usize,
        data: impl Into<BufferData<'a>>,
        usage: BufferUsage,
    ) -> Result<Self> {
        let name = name.into();
        let data = data.into();

        if data.is_empty() {
            return Err(Error::EmptyData { resource: name });
        }
        if !Self::accepts(&data) {
            return Err(Error::UnsupportedType {
                resource: name,
                type_name: data.type_name(),
            });
        }

        let (scalar_type, len, bytes) = data.flatten();
        if dimensions == 0 || len % dimensions != 0 {
            return Err(Error::InvalidDimensions {
                resource: name,
                length: len,
                dimensions,
            });
        }

        let handle = device.borrow_mut().create_buffer(BufferTarget::Vertex, bytes, usage)?;

        Ok(Self {
            device,
            name,
            handle: Some(handle),
            dimensions,
            scalar_type,
            len,
            capacity: len,
        })
    }

    /// Element kinds an attribute channel can be built from
    fn accepts(data: &BufferData) -> bool {
        !matches!(data, BufferData::U16(_) | BufferData::U32(_))
    }

    /// Replace the channel content in place
    ///
    /// Empty data is accepted and sets the length to 0. Capacity never changes.
    ///
    /// # Errors
    ///
    /// - `TypeMismatch` if the scalar type differs from the creation type
    /// - `CapacityExceeded` if the scalar count exceeds `capacity()`
    /// - `InvalidDimensions` if the scalar count is not a multiple of `dimensions()`
    ///
    /// # Panics
    ///
    /// Panics if the buffer has been destroyed.
    pub fn update<'a>(&mut self, data: impl Into<BufferData<'a>>) -> Result<()> {
        let handle = match self.handle {
            Some(handle) => handle,
            None => panic!("AttributeBuffer '{}': update after destroy", self.name),
        };

        let (scalar_type, len, bytes) = data.into().flatten();
        if scalar_type != self.scalar_type {
            return Err(Error::TypeMismatch {
                resource: self.name.clone(),
                expected: self.scalar_type.name(),
                found: scalar_type.name(),
            });
        }
        if len == 0 {
            self.len = 0;
            return Ok(());
        }
        if len > self.capacity {
            return Err(Error::CapacityExceeded {
                resource: self.name.clone(),
                length: len,
                capacity: self.capacity,
            });
        }
        if len % self.dimensions != 0 {
            return Err(Error::InvalidDimensions {
                resource: self.name.clone(),
                length: len,
                dimensions: self.dimensions,
            });
        }

        self.device.borrow_mut().update_buffer(handle, 0, bytes)?;
        self.len = len;
        Ok(())
    }

    /// Point vertex attribute slot `location` of the bound vertex array at this buffer
    ///
    /// # Panics
    ///
    /// Panics if the buffer has been destroyed.
    pub fn bind(&self, location: u32) {
        let handle = match self.handle {
            Some(handle) => handle,
            None => panic!("AttributeBuffer '{}': bind after destroy", self.name),
        };
        self.device.borrow_mut().vertex_attribute_pointer(
            location,
            handle,
            self.dimensions as u32,
            self.scalar_type,
        );
    }

    /// Release the GPU storage (no-op if already released)
    pub fn destroy(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.borrow_mut().delete_buffer(handle);
        }
    }

    /// Number of vertices currently held (`len / dimensions`)
    pub fn element_group_count(&self) -> usize {
        self.len / self.dimensions
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// Live scalar count
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Scalar count the GPU storage can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    pub fn is_destroyed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for AttributeBuffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Ok(mut device) = self.device.try_borrow_mut() {
                device.delete_buffer(handle);
            }
        }
    }
}

impl fmt::Debug for AttributeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeBuffer")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("dimensions", &self.dimensions)
            .field("scalar_type", &self.scalar_type)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ============================================================================
// INDEX BUFFER
// ============================================================================

/// Element indices backed by a GPU buffer
pub struct IndexBuffer {
    device: SharedDevice,
    handle: Option<BufferHandle>,
    index_type: IndexType,
    len: usize,
    capacity: usize,
}

impl IndexBuffer {
    /// Create an index buffer from `u8` or `u32` indices
    ///
    /// # Errors
    ///
    /// - `EmptyData` if `data` is empty
    /// - `UnsupportedType` for any other element kind
    pub fn new<'a>(device: SharedDevice, data: impl Into<BufferData<'a>>, usage: BufferUsage) -> Result<Self> {
        let data = data.into();

        if data.is_empty() {
            return Err(Error::EmptyData {
                resource: INDEX_BUFFER_LABEL.to_string(),
            });
        }
        let index_type = match data {
            BufferData::U8(_) => IndexType::U8,
            BufferData::U32(_) => IndexType::U32,
            _ => {
                return Err(Error::UnsupportedType {
                    resource: INDEX_BUFFER_LABEL.to_string(),
                    type_name: data.type_name(),
                })
            }
        };

        let (_, len, bytes) = data.flatten();
        let handle = device.borrow_mut().create_buffer(BufferTarget::Index, bytes, usage)?;

        Ok(Self {
            device,
            handle: Some(handle),
            index_type,
            len,
            capacity: len,
        })
    }

    /// Replace the indices in place
    ///
    /// # Errors
    ///
    /// - `TypeMismatch` if the element type differs from the creation type
    /// - `CapacityExceeded` if `data` holds more than `capacity()` indices
    ///
    /// # Panics
    ///
    /// Panics if the buffer has been destroyed.
    pub fn update<'a>(&mut self, data: impl Into<BufferData<'a>>) -> Result<()> {
        let handle = match self.handle {
            Some(handle) => handle,
            None => panic!("IndexBuffer: update after destroy"),
        };

        let (scalar_type, len, bytes) = data.into().flatten();
        if IndexType::from_scalar(scalar_type) != Some(self.index_type) {
            return Err(Error::TypeMismatch {
                resource: INDEX_BUFFER_LABEL.to_string(),
                expected: self.scalar_type().name(),
                found: scalar_type.name(),
            });
        }
        if len > self.capacity {
            return Err(Error::CapacityExceeded {
                resource: INDEX_BUFFER_LABEL.to_string(),
                length: len,
                capacity: self.capacity,
            });
        }

        if len > 0 {
            self.device.borrow_mut().update_buffer(handle, 0, bytes)?;
        }
        self.len = len;
        Ok(())
    }

    /// Make this buffer the index source of the bound vertex array
    ///
    /// # Panics
    ///
    /// Panics if the buffer has been destroyed.
    pub fn bind(&self) {
        let handle = match self.handle {
            Some(handle) => handle,
            None => panic!("IndexBuffer: bind after destroy"),
        };
        self.device.borrow_mut().bind_index_buffer(handle);
    }

    /// Release the GPU storage (no-op if already released)
    pub fn destroy(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.borrow_mut().delete_buffer(handle);
        }
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self.index_type {
            IndexType::U8 => ScalarType::U8,
            IndexType::U16 => ScalarType::U16,
            IndexType::U32 => ScalarType::U32,
        }
    }

    /// Live index count
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    pub fn is_destroyed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Ok(mut device) = self.device.try_borrow_mut() {
                device.delete_buffer(handle);
            }
        }
    }
}

impl fmt::Debug for IndexBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuffer")
            .field("handle", &self.handle)
            .field("index_type", &self.index_type)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
