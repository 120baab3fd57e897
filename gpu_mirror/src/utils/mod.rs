//! Utility types

mod instance_slots;

pub use instance_slots::InstanceSlots;
