/// Dynamic buffers describing the same instances.
///
/// Each registered buffer feeds one shader input (a per-instance attribute,
/// or a lookup texture sampled by instance index). Instance slots come from
/// an InstanceSlots allocator; every buffer is grown with the doubling law
/// so it always holds at least `high_water_mark` entries.
///
/// Per frame: write entries, then `draw()` uploads dirty buffers, binds the
/// attribute buffers and issues one instanced draw, in that order.

use std::any::Any;
use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::{engine_bail, engine_debug};
use crate::graphics_device::{GraphicsDevice, Program};
use crate::utils::InstanceSlots;
use super::dynamic_buffer::{DynamicBuffer, BackingMode};
use super::element::Element;

// ===== INSTANCE ATTRIBUTE =====

/// Object-safe view of a DynamicBuffer of any element type
pub trait InstanceAttribute: Send {
    /// Name used in logs
    fn label(&self) -> &str;

    /// GPU representation
    fn backing(&self) -> BackingMode;

    /// Entries currently allocated
    fn capacity(&self) -> u32;

    /// Whether an upload is pending
    fn is_dirty(&self) -> bool;

    /// Grow by doubling until `target_entries` fit
    fn resize_to_fit_next_pow2(&mut self, target_entries: u32) -> Result<()>;

    /// Upload if dirty; returns whether an upload happened
    fn upload_dirty_data(&mut self) -> Result<bool>;

    /// Bind as a per-instance vertex attribute
    fn bind_as_instance_attribute(&self, program: &dyn Program, attribute_name: &str) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Element> InstanceAttribute for DynamicBuffer<T> {
    fn label(&self) -> &str {
        DynamicBuffer::label(self)
    }

    fn backing(&self) -> BackingMode {
        DynamicBuffer::backing(self)
    }

    fn capacity(&self) -> u32 {
        DynamicBuffer::capacity(self)
    }

    fn is_dirty(&self) -> bool {
        DynamicBuffer::is_dirty(self)
    }

    fn resize_to_fit_next_pow2(&mut self, target_entries: u32) -> Result<()> {
        DynamicBuffer::resize_to_fit_next_pow2(self, target_entries)
    }

    fn upload_dirty_data(&mut self) -> Result<bool> {
        DynamicBuffer::upload_dirty_data(self)
    }

    fn bind_as_instance_attribute(&self, program: &dyn Program, attribute_name: &str) -> Result<()> {
        DynamicBuffer::bind_as_instance_attribute(self, program, attribute_name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===== INSTANCE SET =====

struct NamedAttribute {
    name: String,
    buffer: Box<dyn InstanceAttribute>,
}

/// Group of dynamic buffers sharing instance indices
pub struct InstanceSet {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    slots: InstanceSlots,
    attributes: Vec<NamedAttribute>,
    by_name: FxHashMap<String, usize>,
}

impl InstanceSet {
    /// Create an empty set drawing through `device`
    pub fn new(device: Arc<Mutex<dyn GraphicsDevice>>) -> Self {
        Self {
            device,
            slots: InstanceSlots::new(),
            attributes: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Register a buffer under a shader input name
    ///
    /// The buffer is grown to the current high-water mark.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the name is already registered, or growth errors.
    pub fn add_attribute<T: Element>(&mut self, name: impl Into<String>, mut buffer: DynamicBuffer<T>) -> Result<()> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            engine_bail!("gpu_mirror::InstanceSet", ConfigurationError;
                "Attribute '{}' is already registered", name);
        }
        buffer.resize_to_fit_next_pow2(self.slots.high_water_mark())?;

        engine_debug!("gpu_mirror::InstanceSet",
            "Registered attribute '{}' ({:?}, capacity {})", name, buffer.backing(), buffer.capacity());

        self.by_name.insert(name.clone(), self.attributes.len());
        self.attributes.push(NamedAttribute {
            name,
            buffer: Box::new(buffer),
        });
        Ok(())
    }

    /// Typed access to a registered buffer
    ///
    /// Returns None for unknown names or a different element type.
    pub fn attribute<T: Element>(&self, name: &str) -> Option<&DynamicBuffer<T>> {
        let index = *self.by_name.get(name)?;
        self.attributes[index].buffer.as_any().downcast_ref()
    }

    /// Typed mutable access to a registered buffer
    pub fn attribute_mut<T: Element>(&mut self, name: &str) -> Option<&mut DynamicBuffer<T>> {
        let index = *self.by_name.get(name)?;
        self.attributes[index].buffer.as_any_mut().downcast_mut()
    }

    /// Registered names, in registration order
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributes.iter().map(|attribute| attribute.name.as_str())
    }

    /// Number of registered buffers
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Number of live instances
    pub fn len(&self) -> u32 {
        self.slots.len()
    }

    /// Whether no instance is live
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entries drawn per frame (highest slot ever used + 1)
    pub fn high_water_mark(&self) -> u32 {
        self.slots.high_water_mark()
    }

    /// Whether `slot` is a live instance
    pub fn is_live(&self, slot: u32) -> bool {
        self.slots.is_live(slot)
    }

    /// Allocate an instance slot, growing every buffer to hold it
    ///
    /// Buffers grow before the slot is taken, so on a growth error no slot
    /// is allocated and the high-water mark is unchanged.
    pub fn spawn(&mut self) -> Result<u32> {
        let target = self.slots.next_high_water_mark();
        for attribute in &mut self.attributes {
            attribute.buffer.resize_to_fit_next_pow2(target)?;
        }
        Ok(self.slots.acquire())
    }

    /// Release an instance slot
    ///
    /// Released slots below the high-water mark are still drawn with
    /// whatever their entries hold until reused.
    pub fn despawn(&mut self, slot: u32) -> Result<()> {
        self.slots.release(slot)
    }

    /// Upload every dirty buffer; returns the number of uploads
    pub fn upload_dirty(&mut self) -> Result<u32> {
        let mut uploads = 0;
        for attribute in &mut self.attributes {
            if attribute.buffer.upload_dirty_data()? {
                uploads += 1;
            }
        }
        Ok(uploads)
    }

    /// Bind every buffer-backed attribute; lookup textures are skipped
    pub fn bind(&self, program: &dyn Program) -> Result<()> {
        self.attributes.iter()
            .filter(|attribute| attribute.buffer.backing() == BackingMode::InstanceAttributeBuffer)
            .try_for_each(|attribute| attribute.buffer.bind_as_instance_attribute(program, &attribute.name))
    }

    /// Upload, bind, then draw `high_water_mark` instances
    ///
    /// Nothing is drawn while no slot has been allocated.
    pub fn draw(&mut self, program: &dyn Program, vertex_count: u32) -> Result<()> {
        let instance_count = self.slots.high_water_mark();
        if instance_count == 0 {
            return Ok(());
        }

        self.upload_dirty()?;
        self.bind(program)?;

        self.device.lock()
            .map_err(|_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))?
            .draw_instanced(program, vertex_count, instance_count)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "instance_set_tests.rs"]
mod tests;
