/// Growable, dirty-tracked CPU mirror of per-instance GPU data.
///
/// A DynamicBuffer owns a typed mirror array of
/// `elements_per_entry * capacity` components and a GPU resource of the
/// same byte size. Callers write entries into the mirror, then upload
/// before the draw that reads them.
///
/// Backing modes:
/// - InstanceAttributeBuffer: vertex buffer bound with divisor 1
/// - LookupTexture: 1xN R8 texture sampled by index (u8, arity 1 only)
///
/// Dirty tracking: Clean → (mirror write) → Dirty → (upload_dirty_data) → Clean.
/// Every mutable access to the mirror counts as a write.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::error::{Error, Result};
use crate::{engine_bail, engine_err, engine_error, engine_info, engine_trace};
use crate::graphics_device::{
    Buffer, Texture, Program, GraphicsDevice,
    BufferDesc, BufferUsage, Texture1DDesc, TextureFormat, ElementType,
};
use super::element::Element;

// ===== BACKING MODE =====

/// GPU representation of a dynamic buffer, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingMode {
    /// Vertex buffer read once per drawn instance
    InstanceAttributeBuffer,
    /// 1D texture fetched by index in the shader
    LookupTexture,
}

// ===== GPU RESOURCE =====

/// GPU resource owned by a dynamic buffer
#[derive(Clone)]
pub enum GpuResource {
    Buffer(Arc<dyn Buffer>),
    Texture(Arc<dyn Texture>),
}

impl GpuResource {
    /// Size in bytes
    pub fn size(&self) -> u64 {
        match self {
            GpuResource::Buffer(buffer) => buffer.size(),
            GpuResource::Texture(texture) => texture.size(),
        }
    }
}

// ===== DESC =====

/// Descriptor for creating a DynamicBuffer
#[derive(Debug, Clone)]
pub struct DynamicBufferDesc {
    /// Components per entry (3 for a vec3)
    pub elements_per_entry: u32,
    /// Entries allocated at construction
    pub initial_capacity: u32,
    /// GPU representation
    pub backing: BackingMode,
    /// Name used in logs
    pub label: String,
    /// Mark the buffer dirty when it grows
    ///
    /// A grown GPU resource does not hold the mirror contents until the next
    /// upload. With this set, `upload_dirty_data` performs that upload; when
    /// cleared, the caller must call `upload_data` before the next draw that
    /// depends on the grown region.
    pub mark_dirty_on_grow: bool,
}

impl DynamicBufferDesc {
    /// Descriptor with default label and grow policy
    pub fn new(elements_per_entry: u32, initial_capacity: u32, backing: BackingMode) -> Self {
        Self {
            elements_per_entry,
            initial_capacity,
            backing,
            label: "dynamic_buffer".to_string(),
            mark_dirty_on_grow: true,
        }
    }

    /// Set the log label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the grow policy
    pub fn with_mark_dirty_on_grow(mut self, mark_dirty_on_grow: bool) -> Self {
        self.mark_dirty_on_grow = mark_dirty_on_grow;
        self
    }
}

// ===== GROWTH LAW =====

/// Capacity reached by doubling `current` until it holds `target` entries
///
/// Returns `current` unchanged when `target <= current`, `None` on overflow
/// or when a zero capacity would have to grow (doubling zero never ends).
/// The result is `current * 2^k`; it is a power of two only if `current` is.
pub fn grown_capacity(current: u32, target: u32) -> Option<u32> {
    if target <= current {
        return Some(current);
    }
    if current == 0 {
        return None;
    }
    let mut capacity = current;
    while capacity < target {
        capacity = capacity.checked_mul(2)?;
    }
    Some(capacity)
}

// ===== DYNAMIC BUFFER =====

/// Growable CPU mirror + matching GPU resource
pub struct DynamicBuffer<T: Element> {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    label: String,
    elements_per_entry: u32,
    capacity: u32,
    backing: BackingMode,
    mirror: Vec<T>,
    gpu: GpuResource,
    dirty: bool,
    mark_dirty_on_grow: bool,
}

impl<T: Element> DynamicBuffer<T> {
    /// Create a buffer with default label and grow policy
    ///
    /// See [`from_desc`](Self::from_desc).
    pub fn new(
        device: Arc<Mutex<dyn GraphicsDevice>>,
        elements_per_entry: u32,
        initial_capacity: u32,
        backing: BackingMode,
    ) -> Result<Self> {
        Self::from_desc(device, DynamicBufferDesc::new(elements_per_entry, initial_capacity, backing))
    }

    /// Create a buffer from a descriptor
    ///
    /// The mirror starts zero-filled and is uploaded once, so the buffer is
    /// clean and the GPU resource matches the mirror.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` for zero arity or capacity, or a LookupTexture
    ///   backing with anything other than `u8` components and arity 1
    /// - Device errors from allocation or the initial upload
    pub fn from_desc(device: Arc<Mutex<dyn GraphicsDevice>>, desc: DynamicBufferDesc) -> Result<Self> {
        // ========== VALIDATION ==========
        if desc.elements_per_entry == 0 {
            engine_bail!("gpu_mirror::DynamicBuffer", ConfigurationError;
                "'{}': elements per entry must be positive", desc.label);
        }
        if desc.initial_capacity == 0 {
            engine_bail!("gpu_mirror::DynamicBuffer", ConfigurationError;
                "'{}': initial capacity must be positive", desc.label);
        }
        Self::check_backing(&desc.label, desc.backing, desc.elements_per_entry)?;

        let len = Self::mirror_len(desc.elements_per_entry, desc.initial_capacity)?;

        // ========== ALLOCATE ==========
        let gpu = Self::allocate_gpu(&device, desc.backing, desc.elements_per_entry, desc.initial_capacity)?;

        let buffer = Self {
            device,
            label: desc.label,
            elements_per_entry: desc.elements_per_entry,
            capacity: desc.initial_capacity,
            backing: desc.backing,
            mirror: vec![T::default(); len],
            gpu,
            dirty: false,
            mark_dirty_on_grow: desc.mark_dirty_on_grow,
        };

        buffer.upload_data()?;

        engine_info!("gpu_mirror::DynamicBuffer",
            "Created '{}' ({} entries x {} {:?}, {} bytes, {:?})",
            buffer.label, buffer.capacity, buffer.elements_per_entry,
            T::ELEMENT_TYPE, buffer.byte_size(), buffer.backing);

        Ok(buffer)
    }

    fn check_backing(label: &str, backing: BackingMode, elements_per_entry: u32) -> Result<()> {
        if backing == BackingMode::LookupTexture
            && (T::ELEMENT_TYPE != ElementType::Byte || elements_per_entry != 1)
        {
            engine_bail!("gpu_mirror::DynamicBuffer", ConfigurationError;
                "'{}': LookupTexture backing requires Byte x 1 entries, got {:?} x {}",
                label, T::ELEMENT_TYPE, elements_per_entry);
        }
        Ok(())
    }

    /// Mirror length in components, checked so its byte size fits in memory
    fn mirror_len(elements_per_entry: u32, capacity: u32) -> Result<usize> {
        let len = (elements_per_entry as usize).checked_mul(capacity as usize);
        match len.filter(|len| len.checked_mul(T::ELEMENT_TYPE.size_bytes() as usize).is_some()) {
            Some(len) => Ok(len),
            None => {
                engine_error!("gpu_mirror::DynamicBuffer",
                    "Mirror of {} entries x {} {:?} exceeds addressable memory",
                    capacity, elements_per_entry, T::ELEMENT_TYPE);
                Err(Error::OutOfMemory)
            }
        }
    }

    fn allocate_gpu(
        device: &Arc<Mutex<dyn GraphicsDevice>>,
        backing: BackingMode,
        elements_per_entry: u32,
        capacity: u32,
    ) -> Result<GpuResource> {
        let mut device = device.lock()
            .map_err(|_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))?;

        match backing {
            BackingMode::InstanceAttributeBuffer => {
                let size = capacity as u64
                    * elements_per_entry as u64
                    * T::ELEMENT_TYPE.size_bytes() as u64;
                let buffer = device.create_buffer(BufferDesc {
                    size,
                    usage: BufferUsage::InstanceAttribute,
                })?;
                Ok(GpuResource::Buffer(buffer))
            }
            BackingMode::LookupTexture => {
                let texture = device.create_texture_1d(Texture1DDesc {
                    width: capacity,
                    format: TextureFormat::R8_UNORM,
                })?;
                Ok(GpuResource::Texture(texture))
            }
        }
    }

    fn device(&self) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
        self.device.lock()
            .map_err(|_| engine_err!("gpu_mirror::DynamicBuffer", BackendError;
                "GraphicsDevice lock poisoned"))
    }

    // ===== ACCESSORS =====

    /// Name used in logs
    pub fn label(&self) -> &str { &self.label }

    /// Component type
    pub fn element_type(&self) -> ElementType { T::ELEMENT_TYPE }

    /// Components per entry
    pub fn elements_per_entry(&self) -> u32 { self.elements_per_entry }

    /// Entries currently allocated (never decreases)
    pub fn capacity(&self) -> u32 { self.capacity }

    /// GPU representation
    pub fn backing(&self) -> BackingMode { self.backing }

    /// Whether the mirror was written since the last `upload_dirty_data`
    pub fn is_dirty(&self) -> bool { self.dirty }

    /// Whether growth marks the buffer dirty
    pub fn marks_dirty_on_grow(&self) -> bool { self.mark_dirty_on_grow }

    /// Mirror length in components (`elements_per_entry * capacity`)
    pub fn len(&self) -> usize { self.mirror.len() }

    /// Always false: capacity is at least one entry
    pub fn is_empty(&self) -> bool { self.mirror.is_empty() }

    /// Bytes per entry
    pub fn stride(&self) -> u64 {
        self.elements_per_entry as u64 * T::ELEMENT_TYPE.size_bytes() as u64
    }

    /// Mirror size in bytes, equal to the GPU resource size
    pub fn byte_size(&self) -> u64 {
        self.mirror.len() as u64 * T::ELEMENT_TYPE.size_bytes() as u64
    }

    /// Current GPU resource
    pub fn gpu_resource(&self) -> &GpuResource { &self.gpu }

    /// GPU buffer (InstanceAttributeBuffer backing only)
    pub fn gpu_buffer(&self) -> Result<&Arc<dyn Buffer>> {
        match &self.gpu {
            GpuResource::Buffer(buffer) => Ok(buffer),
            GpuResource::Texture(_) => Err(engine_err!("gpu_mirror::DynamicBuffer", ModeError;
                "'{}' is texture-backed and has no GPU buffer", self.label)),
        }
    }

    /// GPU lookup texture (LookupTexture backing only)
    pub fn gpu_texture(&self) -> Result<&Arc<dyn Texture>> {
        match &self.gpu {
            GpuResource::Texture(texture) => Ok(texture),
            GpuResource::Buffer(_) => Err(engine_err!("gpu_mirror::DynamicBuffer", ModeError;
                "'{}' is buffer-backed and has no lookup texture", self.label)),
        }
    }

    // ===== MIRROR ACCESS =====

    /// Read-only view of the mirror
    pub fn mirror(&self) -> &[T] { &self.mirror }

    /// Mutable view of the mirror; marks the buffer dirty
    pub fn mirror_mut(&mut self) -> &mut [T] {
        self.dirty = true;
        &mut self.mirror
    }

    /// Mark the buffer dirty without writing
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Component at a flat mirror index
    pub fn get(&self, index: usize) -> Option<T> {
        self.mirror.get(index).copied()
    }

    /// Write one component at a flat mirror index
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.mirror.len();
        let slot = self.mirror.get_mut(index)
            .ok_or_else(|| engine_err!("gpu_mirror::DynamicBuffer",
                "'{}': index {} out of bounds (len: {})", self.label, index, len))?;
        *slot = value;
        self.dirty = true;
        Ok(())
    }

    /// Components of one entry
    pub fn entry(&self, entry: u32) -> Option<&[T]> {
        let arity = self.elements_per_entry as usize;
        let start = entry as usize * arity;
        self.mirror.get(start..start + arity)
    }

    /// Overwrite one entry
    pub fn set_entry(&mut self, entry: u32, values: &[T]) -> Result<()> {
        if values.len() != self.elements_per_entry as usize {
            engine_bail!("gpu_mirror::DynamicBuffer",
                "'{}': entry has {} components, got {}",
                self.label, self.elements_per_entry, values.len());
        }
        self.write_entries(entry, values)
    }

    /// Overwrite consecutive entries starting at `first_entry`
    ///
    /// `values.len()` must be a multiple of the arity.
    pub fn write_entries(&mut self, first_entry: u32, values: &[T]) -> Result<()> {
        let arity = self.elements_per_entry as usize;
        if values.len() % arity != 0 {
            engine_bail!("gpu_mirror::DynamicBuffer",
                "'{}': {} components is not a whole number of {}-component entries",
                self.label, values.len(), arity);
        }
        let start = first_entry as usize * arity;
        let end = start + values.len();
        if end > self.mirror.len() {
            engine_bail!("gpu_mirror::DynamicBuffer",
                "'{}': write of {} entries at entry {} exceeds capacity {}",
                self.label, values.len() / arity, first_entry, self.capacity);
        }
        self.mirror[start..end].copy_from_slice(values);
        self.dirty = true;
        Ok(())
    }

    // ===== GROWTH =====

    /// Grow by doubling until at least `target_entries` fit
    ///
    /// No-op when `target_entries <= capacity`. Otherwise the new capacity is
    /// `capacity * 2^k` for the smallest such `k`.
    pub fn resize_to_fit_next_pow2(&mut self, target_entries: u32) -> Result<()> {
        if target_entries <= self.capacity {
            return Ok(());
        }
        let new_capacity = grown_capacity(self.capacity, target_entries)
            .ok_or_else(|| engine_err!("gpu_mirror::DynamicBuffer",
                "'{}': capacity overflow growing {} to fit {} entries",
                self.label, self.capacity, target_entries))?;
        self.resize(new_capacity)
    }

    /// Grow to exactly `new_capacity` entries
    ///
    /// The first `capacity * elements_per_entry` components are kept; the new
    /// tail is zero. A new GPU resource replaces the old one, which is
    /// released. The new resource is not uploaded here: it holds whatever
    /// allocation left in it until the next upload. When
    /// `mark_dirty_on_grow` is set (the default) the buffer becomes dirty so
    /// `upload_dirty_data` re-synchronizes it.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` when `new_capacity` is below the current
    /// capacity. On a device error the buffer is left unchanged.
    pub fn resize(&mut self, new_capacity: u32) -> Result<()> {
        if new_capacity < self.capacity {
            engine_bail!("gpu_mirror::DynamicBuffer", ConfigurationError;
                "'{}': cannot shrink from {} to {} entries", self.label, self.capacity, new_capacity);
        }
        if new_capacity == self.capacity {
            return Ok(());
        }

        let new_len = Self::mirror_len(self.elements_per_entry, new_capacity)?;
        let gpu = Self::allocate_gpu(&self.device, self.backing, self.elements_per_entry, new_capacity)?;

        let old_capacity = self.capacity;
        self.mirror.resize(new_len, T::default());
        self.gpu = gpu;
        self.capacity = new_capacity;
        if self.mark_dirty_on_grow {
            self.dirty = true;
        }

        debug_assert_eq!(self.byte_size(), self.gpu.size(), "mirror and GPU resource sizes diverged");

        engine_info!("gpu_mirror::DynamicBuffer",
            "Grew '{}' from {} to {} entries ({} bytes)",
            self.label, old_capacity, new_capacity, self.byte_size());
        Ok(())
    }

    // ===== UPLOAD =====

    /// Upload the whole mirror, whatever the dirty state
    ///
    /// Does not touch the dirty flag.
    pub fn upload_data(&self) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.mirror);
        match &self.gpu {
            GpuResource::Buffer(buffer) => buffer.write(bytes)?,
            GpuResource::Texture(texture) => texture.write_1d(self.capacity, bytes)?,
        }
        engine_trace!("gpu_mirror::DynamicBuffer", "Uploaded '{}' ({} bytes)", self.label, bytes.len());
        Ok(())
    }

    /// Upload the mirror if dirty, then mark it clean
    ///
    /// Returns whether an upload happened. Many writes within a frame
    /// collapse into at most one transfer.
    pub fn upload_dirty_data(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.upload_data()?;
        self.dirty = false;
        Ok(true)
    }

    // ===== BINDING =====

    /// Bind the GPU buffer to a vertex attribute advancing once per instance
    ///
    /// # Errors
    ///
    /// - `ModeError` for LookupTexture-backed buffers
    /// - `AttributeNotFound` when the program has no such attribute
    pub fn bind_as_instance_attribute(&self, program: &dyn Program, attribute_name: &str) -> Result<()> {
        let buffer = match &self.gpu {
            GpuResource::Buffer(buffer) => buffer,
            GpuResource::Texture(_) => engine_bail!("gpu_mirror::DynamicBuffer", ModeError;
                "'{}' is LookupTexture-backed and cannot be bound as attribute '{}'",
                self.label, attribute_name),
        };
        self.device()?.bind_instance_attribute(
            program,
            attribute_name,
            buffer.as_ref(),
            self.elements_per_entry,
            T::ELEMENT_TYPE,
        )
    }
}

// ===== VECTOR HELPERS =====

impl DynamicBuffer<f32> {
    fn check_arity(&self, arity: u32) -> Result<()> {
        if self.elements_per_entry != arity {
            engine_bail!("gpu_mirror::DynamicBuffer", ConfigurationError;
                "'{}': vec{} write into {}-component entries", self.label, arity, self.elements_per_entry);
        }
        Ok(())
    }

    /// Write a vec2 entry
    pub fn set_vec2(&mut self, entry: u32, value: glam::Vec2) -> Result<()> {
        self.check_arity(2)?;
        self.set_entry(entry, &value.to_array())
    }

    /// Write a vec3 entry
    pub fn set_vec3(&mut self, entry: u32, value: glam::Vec3) -> Result<()> {
        self.check_arity(3)?;
        self.set_entry(entry, &value.to_array())
    }

    /// Write a vec4 entry
    pub fn set_vec4(&mut self, entry: u32, value: glam::Vec4) -> Result<()> {
        self.check_arity(4)?;
        self.set_entry(entry, &value.to_array())
    }
}

impl<T: Element> fmt::Debug for DynamicBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicBuffer")
            .field("label", &self.label)
            .field("element_type", &T::ELEMENT_TYPE)
            .field("elements_per_entry", &self.elements_per_entry)
            .field("capacity", &self.capacity)
            .field("backing", &self.backing)
            .field("dirty", &self.dirty)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "dynamic_buffer_tests.rs"]
mod tests;
