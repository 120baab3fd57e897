/// GraphicsDevice trait - GPU resource allocation, upload and binding

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    Buffer, Texture, Program,
    BufferDesc, Texture1DDesc, ProgramDesc, ElementType,
};

// ============================================================================
// Common types
// ============================================================================

/// Graphics device configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Largest single buffer or texture allocation, in bytes (None = unlimited)
    pub max_buffer_bytes: Option<u64>,
    /// Command log length kept by recording devices (0 disables recording)
    pub max_recorded_commands: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "gpu_mirror".to_string(),
            max_buffer_bytes: None,
            max_recorded_commands: 4096,
        }
    }
}

/// Graphics device statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Buffers allocated since creation
    pub buffers_allocated: u32,
    /// Textures allocated since creation
    pub textures_allocated: u32,
    /// Buffers currently alive
    pub live_buffers: u32,
    /// Textures currently alive
    pub live_textures: u32,
    /// Whole-buffer uploads
    pub buffer_uploads: u32,
    /// Whole-texture uploads
    pub texture_uploads: u32,
    /// Total bytes transmitted by uploads
    pub bytes_uploaded: u64,
    /// Per-instance attribute bindings
    pub attribute_binds: u32,
    /// Instanced draw calls
    pub draw_calls: u32,
}

impl DeviceStats {
    /// Buffer and texture uploads combined
    pub fn uploads(&self) -> u32 {
        self.buffer_uploads + self.texture_uploads
    }
}

/// Value assigned to a program uniform
///
/// Resolved by the caller rather than by inspecting the value at runtime.
#[derive(Clone)]
pub enum UniformValue {
    /// Single float
    Scalar(f32),
    /// Texture bound to a sampler slot
    Texture(Arc<dyn Texture>, u32),
}

impl fmt::Debug for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformValue::Scalar(value) => f.debug_tuple("Scalar").field(value).finish(),
            UniformValue::Texture(texture, slot) => f
                .debug_struct("Texture")
                .field("width", &texture.width())
                .field("slot", slot)
                .finish(),
        }
    }
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// GPU resource driver
///
/// Every call is synchronous: it returns once the backend has queued the
/// operation. Uploads that a draw depends on must be issued before that draw.
pub trait GraphicsDevice: Send + Sync {
    /// Allocate a buffer of `desc.size` bytes
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Allocate a 1D texture of `desc.width` texels
    fn create_texture_1d(&mut self, desc: Texture1DDesc) -> Result<Arc<dyn Texture>>;

    /// Create a program
    ///
    /// Build failures are logged and the program is returned unlinked.
    fn create_program(&mut self, desc: ProgramDesc) -> Result<Arc<dyn Program>>;

    /// Bind `buffer` to the named vertex attribute, advancing once per instance
    ///
    /// # Arguments
    ///
    /// * `program` - Program owning the attribute
    /// * `attribute_name` - Attribute name in the shader
    /// * `buffer` - Source buffer, tightly packed
    /// * `arity` - Components per entry (1..=4)
    /// * `element_type` - Component type
    fn bind_instance_attribute(
        &mut self,
        program: &dyn Program,
        attribute_name: &str,
        buffer: &dyn Buffer,
        arity: u32,
        element_type: ElementType,
    ) -> Result<()>;

    /// Assign a uniform value by name
    fn set_uniform(&mut self, program: &dyn Program, name: &str, value: UniformValue) -> Result<()>;

    /// Draw `instance_count` instances of `vertex_count` vertices
    fn draw_instanced(&mut self, program: &dyn Program, vertex_count: u32, instance_count: u32) -> Result<()>;

    /// Get statistics about the device
    fn stats(&self) -> DeviceStats;
}
