/// Headless graphics device (no GPU required)
///
/// A CPU-side GraphicsDevice that keeps every allocated resource in a
/// SlotMap, stores the bytes last uploaded to each one, and records calls
/// in an ordered command log bounded by `Config::max_recorded_commands`.
/// Used by tests and by tools that drive the buffer layer without a
/// rendering surface.
///
/// The device is usually moved into the [`Engine`](crate::mirror::Engine);
/// take a [`HeadlessProbe`] first to inspect its state afterwards.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};

use crate::error::{Error, Result};
use crate::{engine_bail, engine_err, engine_error, engine_trace};
use crate::graphics_device::{
    GraphicsDevice, Buffer, Texture, Program,
    BufferDesc, Texture1DDesc, TextureFormat, ProgramDesc,
    ElementType, Config, DeviceStats, UniformValue,
};

new_key_type! {
    /// Key of a live buffer or texture inside a HeadlessDevice
    pub struct ResourceKey;
}

/// Kind of GPU resource targeted by an upload or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Buffer,
    Texture,
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateBuffer { size: u64 },
    CreateTexture1D { width: u32 },
    CreateProgram { name: String, linked: bool },
    Upload { target: UploadTarget, bytes: u64 },
    Release { target: UploadTarget, bytes: u64 },
    BindInstanceAttribute {
        program: String,
        attribute: String,
        location: u32,
        arity: u32,
        element_type: ElementType,
        divisor: u32,
    },
    SetUniform { program: String, name: String, location: u32 },
    DrawInstanced { program: String, vertex_count: u32, instance_count: u32 },
}

struct ResourceRecord {
    target: UploadTarget,
    contents: Vec<u8>,
}

struct HeadlessState {
    config: Config,
    resources: SlotMap<ResourceKey, ResourceRecord>,
    commands: VecDeque<DeviceCommand>,
    last_upload: Option<Vec<u8>>,
    stats: DeviceStats,
}

impl HeadlessState {
    /// Append to the command log, dropping the oldest entries past the limit
    fn record(&mut self, command: DeviceCommand) {
        let limit = self.config.max_recorded_commands;
        if limit == 0 {
            return;
        }
        while self.commands.len() >= limit {
            self.commands.pop_front();
        }
        self.commands.push_back(command);
    }
}

type SharedState = Arc<Mutex<HeadlessState>>;

fn lock(state: &SharedState) -> Result<MutexGuard<'_, HeadlessState>> {
    state.lock()
        .map_err(|_| Error::BackendError("Headless device state lock poisoned".to_string()))
}

// ============================================================================
// Headless Buffer
// ============================================================================

struct HeadlessBuffer {
    key: ResourceKey,
    size: u64,
    state: SharedState,
}

impl Buffer for HeadlessBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write(&self, data: &[u8]) -> Result<()> {
        if data.len() as u64 != self.size {
            engine_bail!("gpu_mirror::headless",
                "Buffer upload of {} bytes does not match buffer size {}", data.len(), self.size);
        }

        let mut state = lock(&self.state)?;
        let record = state.resources.get_mut(self.key)
            .ok_or_else(|| Error::InvalidResource("Buffer was released".to_string()))?;
        record.contents.clear();
        record.contents.extend_from_slice(data);

        state.stats.buffer_uploads += 1;
        state.stats.bytes_uploaded += self.size;
        state.last_upload = Some(data.to_vec());
        state.record(DeviceCommand::Upload { target: UploadTarget::Buffer, bytes: self.size });

        engine_trace!("gpu_mirror::headless", "Uploaded {} bytes to buffer", self.size);
        Ok(())
    }
}

impl Drop for HeadlessBuffer {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.resources.remove(self.key);
            state.stats.live_buffers -= 1;
            state.record(DeviceCommand::Release { target: UploadTarget::Buffer, bytes: self.size });
        }
    }
}

// ============================================================================
// Headless Texture
// ============================================================================

struct HeadlessTexture {
    key: ResourceKey,
    width: u32,
    format: TextureFormat,
    state: SharedState,
}

impl Texture for HeadlessTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn write_1d(&self, width: u32, data: &[u8]) -> Result<()> {
        if width != self.width {
            engine_bail!("gpu_mirror::headless",
                "Texture upload width {} does not match texture width {}", width, self.width);
        }
        if data.len() as u64 != self.size() {
            engine_bail!("gpu_mirror::headless",
                "Texture upload of {} bytes does not match texture size {}", data.len(), self.size());
        }

        let mut state = lock(&self.state)?;
        let record = state.resources.get_mut(self.key)
            .ok_or_else(|| Error::InvalidResource("Texture was released".to_string()))?;
        record.contents.clear();
        record.contents.extend_from_slice(data);

        state.stats.texture_uploads += 1;
        state.stats.bytes_uploaded += data.len() as u64;
        state.last_upload = Some(data.to_vec());
        state.record(DeviceCommand::Upload { target: UploadTarget::Texture, bytes: data.len() as u64 });

        engine_trace!("gpu_mirror::headless", "Uploaded {} texels to 1D texture", width);
        Ok(())
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            let bytes = self.width as u64 * self.format.size_bytes() as u64;
            state.resources.remove(self.key);
            state.stats.live_textures -= 1;
            state.record(DeviceCommand::Release { target: UploadTarget::Texture, bytes });
        }
    }
}

// ============================================================================
// Headless Program
// ============================================================================

struct HeadlessProgram {
    name: String,
    linked: bool,
    attributes: FxHashMap<String, u32>,
    uniforms: FxHashMap<String, u32>,
}

impl Program for HeadlessProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_linked(&self) -> bool {
        self.linked
    }

    fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    fn uniform_location(&self, name: &str) -> Option<u32> {
        self.uniforms.get(name).copied()
    }
}

/// Check an interface name list, returning the first problem found
fn validate_names(kind: &str, names: &[String]) -> Option<String> {
    let mut seen = FxHashSet::default();
    for name in names {
        if name.is_empty() {
            return Some(format!("empty {} name", kind));
        }
        if !seen.insert(name.as_str()) {
            return Some(format!("duplicate {} '{}'", kind, name));
        }
    }
    None
}

fn locations(names: &[String]) -> FxHashMap<String, u32> {
    names.iter()
        .enumerate()
        .map(|(index, name)| (name.clone(), index as u32))
        .collect()
}

// ============================================================================
// Headless Device
// ============================================================================

/// CPU-side GraphicsDevice
pub struct HeadlessDevice {
    state: SharedState,
}

impl HeadlessDevice {
    /// Create a new headless device
    pub fn new(config: Config) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState {
                config,
                resources: SlotMap::with_key(),
                commands: VecDeque::new(),
                last_upload: None,
                stats: DeviceStats::default(),
            })),
        }
    }

    /// Handle for inspecting this device after it has been moved
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe { state: self.state.clone() }
    }

    fn check_allocation(state: &HeadlessState, bytes: u64) -> Result<()> {
        if bytes == 0 {
            engine_bail!("gpu_mirror::headless", "Cannot allocate an empty resource");
        }
        if let Some(limit) = state.config.max_buffer_bytes {
            if bytes > limit {
                engine_error!("gpu_mirror::headless",
                    "Allocation of {} bytes exceeds the {} byte limit", bytes, limit);
                return Err(Error::OutOfMemory);
            }
        }
        Ok(())
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        let mut state = lock(&self.state)?;
        Self::check_allocation(&state, desc.size)?;

        let key = state.resources.insert(ResourceRecord {
            target: UploadTarget::Buffer,
            contents: vec![0u8; desc.size as usize],
        });
        state.stats.buffers_allocated += 1;
        state.stats.live_buffers += 1;
        state.record(DeviceCommand::CreateBuffer { size: desc.size });

        Ok(Arc::new(HeadlessBuffer {
            key,
            size: desc.size,
            state: self.state.clone(),
        }))
    }

    fn create_texture_1d(&mut self, desc: Texture1DDesc) -> Result<Arc<dyn Texture>> {
        let bytes = desc.width as u64 * desc.format.size_bytes() as u64;
        let mut state = lock(&self.state)?;
        Self::check_allocation(&state, bytes)?;

        let key = state.resources.insert(ResourceRecord {
            target: UploadTarget::Texture,
            contents: vec![0u8; bytes as usize],
        });
        state.stats.textures_allocated += 1;
        state.stats.live_textures += 1;
        state.record(DeviceCommand::CreateTexture1D { width: desc.width });

        Ok(Arc::new(HeadlessTexture {
            key,
            width: desc.width,
            format: desc.format,
            state: self.state.clone(),
        }))
    }

    fn create_program(&mut self, desc: ProgramDesc) -> Result<Arc<dyn Program>> {
        let problem = validate_names("attribute", &desc.attributes)
            .or_else(|| validate_names("uniform", &desc.uniforms));

        // Link failures are logged and the program is returned unlinked
        let linked = match problem {
            Some(problem) => {
                engine_error!("gpu_mirror::headless",
                    "Program '{}' failed to link: {}", desc.name, problem);
                false
            }
            None => true,
        };

        lock(&self.state)?.record(DeviceCommand::CreateProgram {
            name: desc.name.clone(),
            linked,
        });

        Ok(Arc::new(HeadlessProgram {
            attributes: if linked { locations(&desc.attributes) } else { FxHashMap::default() },
            uniforms: if linked { locations(&desc.uniforms) } else { FxHashMap::default() },
            name: desc.name,
            linked,
        }))
    }

    fn bind_instance_attribute(
        &mut self,
        program: &dyn Program,
        attribute_name: &str,
        buffer: &dyn Buffer,
        arity: u32,
        element_type: ElementType,
    ) -> Result<()> {
        if !program.is_linked() {
            engine_bail!("gpu_mirror::headless",
                "Cannot bind attribute '{}': program '{}' is not linked", attribute_name, program.name());
        }
        if !(1..=4).contains(&arity) {
            engine_bail!("gpu_mirror::headless",
                "Attribute '{}' arity {} outside 1..=4", attribute_name, arity);
        }
        let location = program.attribute_location(attribute_name)
            .ok_or_else(|| engine_err!("gpu_mirror::headless", AttributeNotFound;
                "{}", attribute_name))?;

        let mut state = lock(&self.state)?;
        state.stats.attribute_binds += 1;
        state.record(DeviceCommand::BindInstanceAttribute {
            program: program.name().to_string(),
            attribute: attribute_name.to_string(),
            location,
            arity,
            element_type,
            divisor: 1,
        });

        engine_trace!("gpu_mirror::headless",
            "Bound {} byte buffer to '{}' (location {}, {}x{:?}, divisor 1)",
            buffer.size(), attribute_name, location, arity, element_type);
        Ok(())
    }

    fn set_uniform(&mut self, program: &dyn Program, name: &str, value: UniformValue) -> Result<()> {
        let location = program.uniform_location(name)
            .ok_or_else(|| engine_err!("gpu_mirror::headless",
                "Uniform '{}' not found in program '{}'", name, program.name()))?;

        engine_trace!("gpu_mirror::headless", "Uniform '{}' = {:?}", name, value);

        lock(&self.state)?.record(DeviceCommand::SetUniform {
            program: program.name().to_string(),
            name: name.to_string(),
            location,
        });
        Ok(())
    }

    fn draw_instanced(&mut self, program: &dyn Program, vertex_count: u32, instance_count: u32) -> Result<()> {
        let mut state = lock(&self.state)?;
        state.stats.draw_calls += 1;
        state.record(DeviceCommand::DrawInstanced {
            program: program.name().to_string(),
            vertex_count,
            instance_count,
        });
        Ok(())
    }

    fn stats(&self) -> DeviceStats {
        self.state.lock()
            .map(|state| state.stats)
            .unwrap_or_default()
    }
}

// ============================================================================
// Headless Probe
// ============================================================================

/// Read access to a HeadlessDevice's state
#[derive(Clone)]
pub struct HeadlessProbe {
    state: SharedState,
}

impl HeadlessProbe {
    /// Current statistics
    pub fn stats(&self) -> DeviceStats {
        self.state.lock()
            .map(|state| state.stats)
            .unwrap_or_default()
    }

    /// Recorded calls, oldest first
    ///
    /// Holds at most `Config::max_recorded_commands` entries; older ones are
    /// discarded first.
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.state.lock()
            .map(|state| state.commands.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forget recorded calls (statistics are kept)
    pub fn clear_commands(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.commands.clear();
        }
    }

    /// Bytes sent by the most recent buffer or texture upload
    pub fn last_upload(&self) -> Option<Vec<u8>> {
        self.state.lock()
            .ok()
            .and_then(|state| state.last_upload.clone())
    }

    /// Current contents of every live resource of the given kind
    pub fn live_contents(&self, target: UploadTarget) -> Vec<Vec<u8>> {
        self.state.lock()
            .map(|state| state.resources.values()
                .filter(|record| record.target == target)
                .map(|record| record.contents.clone())
                .collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
