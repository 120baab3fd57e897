//! Integration tests for Engine lifecycle and graphics device ownership
//!
//! No GPU required: every test runs against the HeadlessDevice.
//!
//! Run with: cargo test --test engine_integration_tests

use gpu_mirror::mirror::Engine;
use gpu_mirror::mirror::Error;
use gpu_mirror::mirror::device::{Config, HeadlessDevice};
use gpu_mirror::mirror::resource::{BackingMode, DynamicBuffer};
use std::sync::Arc;
use serial_test::serial;

fn setup() {
    Engine::initialize().unwrap();
    Engine::destroy_graphics_device().unwrap();
}

// ============================================================================
// ENGINE LIFECYCLE TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_engine_full_lifecycle() {
    // Step 1: Initialize engine
    Engine::initialize().unwrap();
    Engine::destroy_graphics_device().unwrap();

    // Step 2: Register the device
    let device = HeadlessDevice::new(Config {
        app_name: "lifecycle".to_string(),
        ..Config::default()
    });
    let probe = device.probe();
    Engine::create_graphics_device(device).unwrap();

    // Step 3: Components receive the device explicitly
    let device = Engine::graphics_device().unwrap();
    let buffer = DynamicBuffer::<f32>::new(device.clone(), 2, 8, BackingMode::InstanceAttributeBuffer).unwrap();
    assert_eq!(probe.stats().live_buffers, 1);

    // Step 4: Shutdown drops the engine's handle only
    Engine::shutdown();
    assert!(Engine::graphics_device().is_err());
    assert_eq!(probe.stats().live_buffers, 1);

    // Step 5: Dropping the last user releases the GPU resource
    drop(buffer);
    drop(device);
    assert_eq!(probe.stats().live_buffers, 0);
}

#[test]
#[serial]
fn test_integration_unique_device_registration() {
    setup();
    Engine::create_graphics_device(HeadlessDevice::new(Config::default())).unwrap();
    let first = Engine::graphics_device().unwrap();

    let result = Engine::create_graphics_device(HeadlessDevice::new(Config::default()));
    assert!(matches!(result, Err(Error::InitializationFailed(_))));

    // The first device is still the registered one
    assert!(Arc::ptr_eq(&first, &Engine::graphics_device().unwrap()));
}

#[test]
#[serial]
fn test_integration_device_replacement() {
    setup();
    let first = HeadlessDevice::new(Config::default());
    let first_probe = first.probe();
    Engine::create_graphics_device(first).unwrap();

    Engine::destroy_graphics_device().unwrap();

    let second = HeadlessDevice::new(Config::default());
    let second_probe = second.probe();
    Engine::create_graphics_device(second).unwrap();

    let device = Engine::graphics_device().unwrap();
    let _buffer = DynamicBuffer::<u8>::new(device, 1, 4, BackingMode::LookupTexture).unwrap();

    assert_eq!(first_probe.stats().textures_allocated, 0);
    assert_eq!(second_probe.stats().textures_allocated, 1);
}
