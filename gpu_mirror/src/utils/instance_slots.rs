use crate::error::Result;
use crate::engine_bail;

/// Allocates and recycles instance indices.
///
/// Instance indices address entries in every dynamic buffer of an
/// [`InstanceSet`](crate::mirror::resource::InstanceSet). Released indices
/// are handed out again before fresh ones, so the high-water mark (the entry
/// count the buffers must hold) only grows when no slot is free.
///
/// # Example
///
/// ```ignore
/// let mut slots = InstanceSlots::new();
/// let a = slots.acquire();      // 0
/// let b = slots.acquire();      // 1
/// slots.release(a)?;            // 0 is free again
/// let c = slots.acquire();      // 0 (recycled)
/// assert_eq!(slots.high_water_mark(), 2);
/// ```
pub struct InstanceSlots {
    free_list: Vec<u32>,
    live: Vec<bool>,
    len: u32,
}

impl InstanceSlots {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            live: Vec::new(),
            len: 0,
        }
    }

    /// Take a free index, recycling the most recently released one first
    pub fn acquire(&mut self) -> u32 {
        let slot = match self.free_list.pop() {
            Some(slot) => slot,
            None => {
                self.live.push(false);
                self.live.len() as u32 - 1
            }
        };
        self.live[slot as usize] = true;
        self.len += 1;
        slot
    }

    /// Return an index to the pool
    ///
    /// Fails for indices never handed out or already released.
    pub fn release(&mut self, slot: u32) -> Result<()> {
        match self.live.get_mut(slot as usize) {
            Some(live) if *live => *live = false,
            Some(_) => engine_bail!("gpu_mirror::InstanceSlots", "Slot {} released twice", slot),
            None => engine_bail!("gpu_mirror::InstanceSlots",
                "Slot {} was never acquired (high-water mark: {})", slot, self.live.len()),
        }
        self.len -= 1;
        self.free_list.push(slot);
        Ok(())
    }

    /// Whether `slot` is currently acquired
    pub fn is_live(&self, slot: u32) -> bool {
        self.live.get(slot as usize).copied().unwrap_or(false)
    }

    /// Highest index ever acquired + 1
    pub fn high_water_mark(&self) -> u32 {
        self.live.len() as u32
    }

    /// High-water mark after the next `acquire`
    pub fn next_high_water_mark(&self) -> u32 {
        if self.free_list.is_empty() {
            self.high_water_mark() + 1
        } else {
            self.high_water_mark()
        }
    }

    /// Number of acquired slots
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no slot is acquired
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for InstanceSlots {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "instance_slots_tests.rs"]
mod tests;
