/*!
# Galaxy 3D Assets

Asset management on top of a retained-mode graphics device.

Higher-level rendering code describes geometry, materials and textures by name;
this crate owns the GPU handles behind them, shares compiled shader programs and
checks the consistency rules that keep those handles valid.

## Architecture

- **GraphicsDevice**: The GPU interface consumed by every resource
- **HeadlessDevice**: In-process device for tests and offline tools
- **AttributeBuffer / IndexBuffer**: Capacity-bounded vertex and index storage
- **Mesh**: Named channels + indices + vertex-array binding
- **Texture**: Fixed-size RGBA8 image with staged region uploads
- **Material**: Textures, samplers and a program with resolved locations
- **ResourceManager**: Named registry with parent scopes and program dedup
*/

// Internal modules
mod error;
pub mod log;
pub mod graphics_device;
pub mod resource;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only; the engine_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, NullLogger};
    }

    // Graphics device sub-module
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}

// Re-export math library at crate root
pub use glam;

// Re-export image library (texture sources)
pub use image;
