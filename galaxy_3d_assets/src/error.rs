//! Error types for the Galaxy3D asset layer
//!
//! Every recoverable failure of the asset layer is a variant of [`Error`].
//! Each variant carries the name of the resource involved and the constraint
//! that was violated, so the `Display` output is enough to diagnose the problem.
//!
//! Conditions that can only arise from a caller bug (updating a destroyed
//! buffer, drawing a mesh that was never finalized) are not represented here:
//! they panic, and are documented under `# Panics` on the offending method.

use std::fmt;

/// Result type for Galaxy3D asset operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D asset errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error reported by the graphics device
    BackendError(String),

    /// Buffer created from a zero-length data source
    EmptyData {
        resource: String,
    },

    /// Scalar length is not a multiple of the declared component count
    InvalidDimensions {
        resource: String,
        length: usize,
        dimensions: usize,
    },

    /// Element type is outside the set accepted by the buffer kind
    UnsupportedType {
        resource: String,
        type_name: &'static str,
    },

    /// Update payload element type differs from the creation type
    TypeMismatch {
        resource: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Update payload longer than the allocated capacity
    CapacityExceeded {
        resource: String,
        length: usize,
        capacity: usize,
    },

    /// Mesh channels disagree on their vertex count
    InconsistentVertexCount {
        mesh: String,
        channel: String,
        expected: usize,
        found: usize,
    },

    /// Mesh finalized without an index buffer
    MissingIndexBuffer {
        mesh: String,
    },

    /// Full texture upload with dimensions not matching the mip level
    SizeMismatch {
        texture: String,
        expected: (u32, u32),
        found: (u32, u32),
        mip_level: u32,
    },

    /// Region upload extending past the texture bounds
    OutOfBounds {
        texture: String,
        offset: (u32, u32),
        size: (u32, u32),
        bounds: (u32, u32),
    },

    /// Duplicate registration in a resource manager
    AlreadyExists {
        kind: &'static str,
        name: String,
    },

    /// Lookup miss where the named resource is required, such as a mesh channel update
    NotFound {
        kind: &'static str,
        name: String,
    },

    /// Uniform resolution requested before a program was attached
    NoProgram {
        material: String,
    },

    /// Uniform name unknown to the material's program
    UnknownUniform {
        material: String,
        uniform: String,
    },

    /// Attribute location beyond the device's attribute slots
    LocationOutOfRange {
        material: String,
        attribute: String,
        location: u32,
    },

    /// Attribute name using a reserved prefix
    ReservedName {
        material: String,
        attribute: String,
    },

    /// Shader stage compilation produced a compiler log
    CompileFailed {
        shader: String,
        log: String,
    },

    /// Program linking produced a linker log
    LinkFailed {
        program: String,
        log: String,
    },

    /// Asset file could not be read
    Io {
        path: String,
        message: String,
    },

    /// Asset file could not be decoded as an image
    ImageDecode {
        name: String,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::EmptyData { resource } => {
                write!(f, "'{}': data length is zero", resource)
            }
            Error::InvalidDimensions { resource, length, dimensions } => write!(
                f,
                "'{}': length {} is not a multiple of {} dimensions",
                resource, length, dimensions
            ),
            Error::UnsupportedType { resource, type_name } => {
                write!(f, "'{}': unsupported element type {}", resource, type_name)
            }
            Error::TypeMismatch { resource, expected, found } => write!(
                f,
                "'{}': element type {} does not match buffer type {}",
                resource, found, expected
            ),
            Error::CapacityExceeded { resource, length, capacity } => write!(
                f,
                "'{}': data length {} exceeds buffer capacity {}",
                resource, length, capacity
            ),
            Error::InconsistentVertexCount { mesh, channel, expected, found } => write!(
                f,
                "Mesh '{}': channel '{}' has {} vertices, expected {}",
                mesh, channel, found, expected
            ),
            Error::MissingIndexBuffer { mesh } => {
                write!(f, "Mesh '{}': no index buffer", mesh)
            }
            Error::SizeMismatch { texture, expected, found, mip_level } => write!(
                f,
                "Texture '{}': image size {}x{} does not match {}x{} at mip level {}",
                texture, found.0, found.1, expected.0, expected.1, mip_level
            ),
            Error::OutOfBounds { texture, offset, size, bounds } => write!(
                f,
                "Texture '{}': region {}x{} at ({}, {}) exceeds {}x{}",
                texture, size.0, size.1, offset.0, offset.1, bounds.0, bounds.1
            ),
            Error::AlreadyExists { kind, name } => {
                write!(f, "{} '{}' already exists", kind, name)
            }
            Error::NotFound { kind, name } => write!(f, "{} '{}' not found", kind, name),
            Error::NoProgram { material } => write!(
                f,
                "Material '{}' has no shader program from which to get uniform locations",
                material
            ),
            Error::UnknownUniform { material, uniform } => {
                write!(f, "Material '{}' has no uniform '{}'", material, uniform)
            }
            Error::LocationOutOfRange { material, attribute, location } => write!(
                f,
                "Material '{}': attribute '{}' location {} is out of range",
                material, attribute, location
            ),
            Error::ReservedName { material, attribute } => write!(
                f,
                "Material '{}': attribute '{}' begins with a reserved prefix",
                material, attribute
            ),
            Error::CompileFailed { shader, log } => {
                write!(f, "Shader '{}' failed to compile: {}", shader, log)
            }
            Error::LinkFailed { program, log } => {
                write!(f, "Program {} failed to link: {}", program, log)
            }
            Error::Io { path, message } => write!(f, "Cannot read '{}': {}", path, message),
            Error::ImageDecode { name, message } => {
                write!(f, "Cannot decode image '{}': {}", name, message)
            }
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
