/// Scalar component types storable in a dynamic buffer mirror

use std::fmt::Debug;
use crate::graphics_device::ElementType;

/// A scalar component of a mirror entry
///
/// Implemented for `f32` (Float32) and `u8` (Byte). The mirror is a plain
/// `Vec<T>` and is uploaded as its raw bytes.
pub trait Element: bytemuck::Pod + Default + PartialEq + Debug + Send + Sync + 'static {
    /// GPU component type matching `Self`
    const ELEMENT_TYPE: ElementType;
}

impl Element for f32 {
    const ELEMENT_TYPE: ElementType = ElementType::Float32;
}

impl Element for u8 {
    const ELEMENT_TYPE: ElementType = ElementType::Byte;
}
