/// Buffer targets, usage hints and element types

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute storage
    Vertex,
    /// Element index storage
    Index,
    /// CPU-writable staging storage for texture transfers
    PixelUnpack,
}

/// Expected update frequency of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    #[default]
    StaticDraw,
    /// Updated repeatedly, drawn many times
    DynamicDraw,
    /// Updated once per use
    StreamDraw,
}

/// Scalar element type of buffer data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    U8,
    U16,
    U32,
    F32,
    F64,
}

impl ScalarType {
    /// Size in bytes of one scalar
    pub fn size_bytes(&self) -> usize {
        match self {
            ScalarType::U8 => 1,
            ScalarType::U16 => 2,
            ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Short type name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }
}

/// Index element type for indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    /// Index type matching an unsigned scalar type
    pub fn from_scalar(scalar: ScalarType) -> Option<Self> {
        match scalar {
            ScalarType::U8 => Some(IndexType::U8),
            ScalarType::U16 => Some(IndexType::U16),
            ScalarType::U32 => Some(IndexType::U32),
            ScalarType::F32 | ScalarType::F64 => None,
        }
    }

    /// Size in bytes of one index
    pub fn size_bytes(&self) -> usize {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}
