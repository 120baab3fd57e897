/// Buffer trait, buffer descriptor and scalar element types

use crate::error::Result;

/// Numeric kind of one scalar component stored in a GPU resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit IEEE float
    Float32,
    /// Unsigned 8-bit integer
    Byte,
}

impl ElementType {
    /// Returns size in bytes of one component
    pub fn size_bytes(&self) -> u32 {
        match self {
            ElementType::Float32 => 4,
            ElementType::Byte => 1,
        }
    }
}

/// Buffer usage
///
/// Dynamic buffers only ever allocate per-instance attribute storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Per-instance vertex attribute data (divisor 1)
    InstanceAttribute,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types. The GPU resource is
/// released when the last handle is dropped.
pub trait Buffer: Send + Sync {
    /// Size in bytes, fixed at allocation
    fn size(&self) -> u64;

    /// Replace the whole buffer contents
    ///
    /// `data.len()` must equal `size()`; there is no offset or partial path.
    fn write(&self, data: &[u8]) -> Result<()>;
}
