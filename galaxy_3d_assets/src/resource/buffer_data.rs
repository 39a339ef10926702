/// Typed source data for GPU buffers
///
/// `BufferData` is a closed set of element kinds. Vector kinds (`Vec2`, `Vec3`,
/// `DVec2`, `DVec3`) are expanded to their scalar components by [`BufferData::flatten`],
/// so a slice of 4 `Vec3` counts as 12 scalars.

use glam::{DVec2, DVec3, Vec2, Vec3};

use crate::graphics_device::ScalarType;

/// Borrowed, typed buffer content
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferData<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
    F32(&'a [f32]),
    F64(&'a [f64]),
    Vec2(&'a [Vec2]),
    Vec3(&'a [Vec3]),
    DVec2(&'a [DVec2]),
    DVec3(&'a [DVec3]),
}

impl<'a> BufferData<'a> {
    /// Scalar type after vector expansion
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            BufferData::U8(_) => ScalarType::U8,
            BufferData::U16(_) => ScalarType::U16,
            BufferData::U32(_) => ScalarType::U32,
            BufferData::F32(_) | BufferData::Vec2(_) | BufferData::Vec3(_) => ScalarType::F32,
            BufferData::F64(_) | BufferData::DVec2(_) | BufferData::DVec3(_) => ScalarType::F64,
        }
    }

    /// Name of the source element kind (`"Vec3"`, `"u16"`, ...)
    pub fn type_name(&self) -> &'static str {
        match self {
            BufferData::U8(_) => "u8",
            BufferData::U16(_) => "u16",
            BufferData::U32(_) => "u32",
            BufferData::F32(_) => "f32",
            BufferData::F64(_) => "f64",
            BufferData::Vec2(_) => "Vec2",
            BufferData::Vec3(_) => "Vec3",
            BufferData::DVec2(_) => "DVec2",
            BufferData::DVec3(_) => "DVec3",
        }
    }

    /// Scalar components per source element (1 for scalar kinds)
    pub fn components(&self) -> usize {
        match self {
            BufferData::Vec2(_) | BufferData::DVec2(_) => 2,
            BufferData::Vec3(_) | BufferData::DVec3(_) => 3,
            _ => 1,
        }
    }

    /// Number of source elements (vectors count once)
    pub fn element_count(&self) -> usize {
        match self {
            BufferData::U8(s) => s.len(),
            BufferData::U16(s) => s.len(),
            BufferData::U32(s) => s.len(),
            BufferData::F32(s) => s.len(),
            BufferData::F64(s) => s.len(),
            BufferData::Vec2(s) => s.len(),
            BufferData::Vec3(s) => s.len(),
            BufferData::DVec2(s) => s.len(),
            BufferData::DVec3(s) => s.len(),
        }
    }

    /// Number of scalars after vector expansion
    pub fn len(&self) -> usize {
        self.element_count() * self.components()
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Raw bytes of the data, tightly packed
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            BufferData::U8(s) => s,
            BufferData::U16(s) => bytemuck::cast_slice(s),
            BufferData::U32(s) => bytemuck::cast_slice(s),
            BufferData::F32(s) => bytemuck::cast_slice(s),
            BufferData::F64(s) => bytemuck::cast_slice(s),
            BufferData::Vec2(s) => bytemuck::cast_slice(s),
            BufferData::Vec3(s) => bytemuck::cast_slice(s),
            BufferData::DVec2(s) => bytemuck::cast_slice(s),
            BufferData::DVec3(s) => bytemuck::cast_slice(s),
        }
    }

    /// Expand to flat scalar form: (scalar type, scalar count, bytes)
    pub fn flatten(&self) -> (ScalarType, usize, &'a [u8]) {
        (self.scalar_type(), self.len(), self.as_bytes())
    }
}

macro_rules! impl_buffer_data_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a [$ty]> for BufferData<'a> {
                fn from(data: &'a [$ty]) -> Self {
                    BufferData::$variant(data)
                }
            }

            impl<'a, const N: usize> From<&'a [$ty; N]> for BufferData<'a> {
                fn from(data: &'a [$ty; N]) -> Self {
                    BufferData::$variant(data)
                }
            }

            impl<'a> From<&'a Vec<$ty>> for BufferData<'a> {
                fn from(data: &'a Vec<$ty>) -> Self {
                    BufferData::$variant(data.as_slice())
                }
            }
        )*
    };
}

impl_buffer_data_from!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    f32 => F32,
    f64 => F64,
    Vec2 => Vec2,
    Vec3 => Vec3,
    DVec2 => DVec2,
    DVec3 => DVec3,
);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "buffer_data_tests.rs"]
mod tests;
