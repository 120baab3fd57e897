//! Resource module
//!
//! Dynamic buffers (CPU mirror + GPU resource) and the instance sets that
//! group them.

pub mod element;
pub mod dynamic_buffer;
pub mod instance_set;

pub use element::Element;
pub use dynamic_buffer::{
    DynamicBuffer, DynamicBufferDesc, BackingMode, GpuResource,
    grown_capacity,
};
pub use instance_set::{InstanceSet, InstanceAttribute};
