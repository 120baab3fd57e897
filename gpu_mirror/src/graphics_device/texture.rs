/// 1D lookup texture trait and descriptor

use crate::error::Result;

/// Texel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    /// Single 8-bit unsigned normalized channel
    R8_UNORM,
}

impl TextureFormat {
    /// Bytes per texel
    pub fn size_bytes(&self) -> u32 {
        match self {
            TextureFormat::R8_UNORM => 1,
        }
    }
}

/// Descriptor for creating a 1D texture
#[derive(Debug, Clone)]
pub struct Texture1DDesc {
    /// Width in texels (one texel per entry)
    pub width: u32,
    /// Texel format
    pub format: TextureFormat,
}

/// Texture resource trait
///
/// A 1xN texture sampled by index from shaders. Released on drop.
pub trait Texture: Send + Sync {
    /// Width in texels
    fn width(&self) -> u32;

    /// Texel format
    fn format(&self) -> TextureFormat;

    /// Size in bytes (`width * format.size_bytes()`)
    fn size(&self) -> u64 {
        self.width() as u64 * self.format().size_bytes() as u64
    }

    /// Upload `width` texels, replacing the whole texture
    fn write_1d(&self, width: u32, data: &[u8]) -> Result<()>;
}
