/// Graphics device module - the GPU resource driver interface

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod program;
pub mod headless;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use texture::*;
pub use program::*;
pub use headless::{HeadlessDevice, HeadlessProbe, DeviceCommand, UploadTarget};
