/// Texture sampling parameters and staging copies

/// Texel filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Coordinate wrapping outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Sampling state set when a texture is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub wrap_r: TextureWrap,
}

impl Default for SamplerDesc {
    /// Linear filtering, clamped to edge on all three axes
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            wrap_r: TextureWrap::ClampToEdge,
        }
    }
}

/// Region copy from a staging buffer into a texture level
///
/// The buffer is read as RGBA8 rows of `buffer_row_pixels` pixels; the region's
/// first texel is at `buffer_offset` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCopy {
    /// Destination x in texels
    pub x: u32,
    /// Destination y in texels
    pub y: u32,
    /// Region width in texels
    pub width: u32,
    /// Region height in texels
    pub height: u32,
    /// Byte offset of the region's first texel in the buffer
    pub buffer_offset: usize,
    /// Row length of the buffer, in pixels
    pub buffer_row_pixels: u32,
}
