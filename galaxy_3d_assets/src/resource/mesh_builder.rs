/// Composite mesh construction from raw channel data.
///
/// [`Mesh::from_desc`] builds every channel buffer and the index buffer of a
/// mesh in one call. Either the whole mesh is returned, or every buffer built so
/// far is released before the error is returned.
///
/// The returned mesh is not finalized.

use glam::Vec2;

use crate::error::Result;
use crate::graphics_device::{BufferUsage, PrimitiveTopology, SharedDevice};
use crate::resource::buffer::{AttributeBuffer, IndexBuffer};
use crate::resource::buffer_data::BufferData;
use crate::resource::mesh::Mesh;

/// Distance from the base of a unit equilateral triangle to its centroid (sqrt(1/12))
pub const TRIANGLE_CENTROID_HEIGHT: f32 = 0.288_675_134_594_812_882_254_574_390_250_98;

/// Components per color value (RGBA)
const COLOR_DIMENSIONS: usize = 4;
/// Components per normal
const NORMAL_DIMENSIONS: usize = 3;
/// Components per texture coordinate
const TEXCOORD_DIMENSIONS: usize = 2;

/// Descriptor for building a mesh from raw channel data
pub struct MeshDesc<'a> {
    /// Device the buffers are created on
    pub device: SharedDevice,
    /// Mesh name
    pub name: String,
    /// Components per position (2 or 3 in practice)
    pub dimensions: usize,
    pub topology: PrimitiveTopology,
    /// Positions, stored in channel `pos`
    pub positions: BufferData<'a>,
    /// RGBA colors, stored in channel `color`
    pub colors: Option<BufferData<'a>>,
    /// 3D normals, stored in channel `normal`
    pub normals: Option<BufferData<'a>>,
    /// 2D coordinate sets, stored in channels `texcoord0`, `texcoord1`, ...
    pub texcoords: Vec<BufferData<'a>>,
    /// Element indices (`u8` or `u32`)
    pub indices: BufferData<'a>,
    /// Usage hint for every buffer
    pub usage: BufferUsage,
}

impl Mesh {
    /// Build a mesh from a [`MeshDesc`]
    ///
    /// # Errors
    ///
    /// Any error raised while creating a channel, the index buffer, or while
    /// adding the channels to the mesh. No buffer outlives a failed call.
    pub fn from_desc(desc: MeshDesc) -> Result<Mesh> {
        let mut channels: Vec<AttributeBuffer> = Vec::new();
        if let Err(err) = build_channels(&desc, &mut channels) {
            release_all(channels);
            return Err(err);
        }

        let indices = match IndexBuffer::new(desc.device.clone(), desc.indices, desc.usage) {
            Ok(indices) => indices,
            Err(err) => {
                release_all(channels);
                return Err(err);
            }
        };

        let mut mesh = Mesh::new(desc.device, desc.name);
        mesh.set_topology(desc.topology);
        mesh.set_indices(indices);
        if let Err(err) = mesh.add_channels(channels) {
            mesh.destroy();
            return Err(err);
        }

        Ok(mesh)
    }

    /// Axis-aligned quad centered on `offset`, 2D positions, two triangles
    pub fn quad(
        device: SharedDevice,
        name: impl Into<String>,
        width: f32,
        height: f32,
        offset: Vec2,
    ) -> Result<Mesh> {
        let hw = width * 0.5;
        let hh = height * 0.5;
        let positions = [
            offset + Vec2::new(-hw, -hh),
            offset + Vec2::new(-hw, hh),
            offset + Vec2::new(hw, hh),
            offset + Vec2::new(hw, -hh),
        ];
        let indices: [u8; 6] = [0, 1, 2, 0, 2, 3];

        Mesh::from_desc(MeshDesc {
            device,
            name: name.into(),
            dimensions: 2,
            topology: PrimitiveTopology::Triangles,
            positions: BufferData::from(&positions),
            colors: None,
            normals: None,
            texcoords: Vec::new(),
            indices: BufferData::from(&indices),
            usage: BufferUsage::StaticDraw,
        })
    }

    /// Equilateral triangle with base length `base`, centroid on `offset`
    ///
    /// The apex points up the y axis.
    pub fn equilateral_triangle(
        device: SharedDevice,
        name: impl Into<String>,
        base: f32,
        offset: Vec2,
    ) -> Result<Mesh> {
        let h1 = base * TRIANGLE_CENTROID_HEIGHT;
        let hb = base * 0.5;
        // The centroid splits the height 1:2
        let apex = 2.0 * h1;
        let positions = [
            offset + Vec2::new(0.0, apex),
            offset + Vec2::new(hb, -h1),
            offset + Vec2::new(-hb, -h1),
        ];
        let indices: [u8; 3] = [0, 1, 2];

        Mesh::from_desc(MeshDesc {
            device,
            name: name.into(),
            dimensions: 2,
            topology: PrimitiveTopology::Triangles,
            positions: BufferData::from(&positions),
            colors: None,
            normals: None,
            texcoords: Vec::new(),
            indices: BufferData::from(&indices),
            usage: BufferUsage::StaticDraw,
        })
    }
}

/// Create every attribute channel of `desc`, pushing each into `built` as soon
/// as it exists so the caller can release them on failure
fn build_channels(desc: &MeshDesc, built: &mut Vec<AttributeBuffer>) -> Result<()> {
    built.push(AttributeBuffer::new(
        desc.device.clone(),
        "pos",
        desc.dimensions,
        desc.positions,
        desc.usage,
    )?);

    if let Some(colors) = desc.colors {
        built.push(AttributeBuffer::new(
            desc.device.clone(),
            "color",
            COLOR_DIMENSIONS,
            colors,
            desc.usage,
        )?);
    }

    if let Some(normals) = desc.normals {
        built.push(AttributeBuffer::new(
            desc.device.clone(),
            "normal",
            NORMAL_DIMENSIONS,
            normals,
            desc.usage,
        )?);
    }

    for (index, texcoords) in desc.texcoords.iter().enumerate() {
        built.push(AttributeBuffer::new(
            desc.device.clone(),
            format!("texcoord{}", index),
            TEXCOORD_DIMENSIONS,
            *texcoords,
            desc.usage,
        )?);
    }

    Ok(())
}

fn release_all(buffers: Vec<AttributeBuffer>) {
    for mut buffer in buffers {
        buffer.destroy();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mesh_builder_tests.rs"]
mod tests;
