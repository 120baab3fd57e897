/*!
# GPU Mirror

CPU-resident mirrors of per-instance rendering data, synchronized to GPU
storage for high-volume instanced drawing.

The core type is [`DynamicBuffer`](resource::DynamicBuffer): a growable,
typed, dirty-tracked array that is backed on the GPU either by a vertex
buffer bound once per drawn instance, or by a 1D lookup texture sampled by
index in the shader.

## Architecture

- **GraphicsDevice**: Driver trait for allocating, uploading and binding GPU resources
- **HeadlessDevice**: CPU-side device implementation (no GPU required)
- **DynamicBuffer**: Growable mirror + matching GPU resource
- **InstanceSet**: Several dynamic buffers describing the same instances
- **Engine**: Owner of the single process-wide graphics device and logger
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod resource;
pub mod utils;

// Main namespace module
pub mod mirror {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // GPU resource driver
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Dynamic buffers and instance sets
    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod utils {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
