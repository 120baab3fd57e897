/// Engine - owner of the process-wide graphics device and logger
///
/// There is exactly one rendering surface per process. The engine keeps the
/// single graphics device in thread-safe static storage; registration is
/// unique (a second device is rejected) and every other component receives
/// the device explicitly as an `Arc`.

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use crate::graphics_device::GraphicsDevice;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding the engine singletons
struct EngineState {
    /// Graphics device singleton (wrapped in Mutex for mutable access)
    graphics_device: RwLock<Option<Arc<Mutex<dyn GraphicsDevice>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            graphics_device: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use gpu_mirror::mirror::Engine;
/// use gpu_mirror::mirror::device::{Config, HeadlessDevice};
///
/// Engine::initialize()?;
/// Engine::create_graphics_device(HeadlessDevice::new(Config::default()))?;
///
/// let device = Engine::graphics_device()?;
/// // Hand `device` to DynamicBuffer::new, InstanceSet::new, ...
///
/// Engine::shutdown();
/// # Ok::<(), gpu_mirror::mirror::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Log an engine error before returning it
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("gpu_mirror::Engine", "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!("gpu_mirror::Engine", "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!("gpu_mirror::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get().ok_or_else(|| Self::log_and_return_error(
            Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
        ))
    }

    /// Initialize the engine
    ///
    /// Idempotent: calling it again leaves existing singletons untouched.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Drop the graphics device singleton
    ///
    /// Resources created from the device keep it alive through their own
    /// `Arc` until they are dropped.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut device) = state.graphics_device.write() {
                *device = None;
            }
        }
    }

    /// Create and register the graphics device singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A graphics device already exists
    /// - The device lock is poisoned
    pub fn create_graphics_device<D: GraphicsDevice + 'static>(device: D) -> Result<()> {
        let arc_device: Arc<Mutex<dyn GraphicsDevice>> = Arc::new(Mutex::new(device));

        Self::register_graphics_device(arc_device)?;

        crate::engine_info!("gpu_mirror::Engine", "GraphicsDevice singleton created successfully");

        Ok(())
    }

    pub(crate) fn register_graphics_device(device: Arc<Mutex<dyn GraphicsDevice>>) -> Result<()> {
        let state = Self::state()?;

        let mut lock = state.graphics_device.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("GraphicsDevice lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("GraphicsDevice already exists. Call Engine::destroy_graphics_device() first.".to_string())
            ));
        }

        *lock = Some(device);
        Ok(())
    }

    /// Get the graphics device singleton
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or no device has
    /// been created.
    pub fn graphics_device() -> Result<Arc<Mutex<dyn GraphicsDevice>>> {
        let state = Self::state()?;

        let lock = state.graphics_device.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("GraphicsDevice lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("GraphicsDevice not created. Call Engine::create_graphics_device() first.".to_string())
            ))
    }

    /// Destroy the graphics device singleton, allowing a new one to be created
    pub fn destroy_graphics_device() -> Result<()> {
        let state = Self::state()?;

        let mut lock = state.graphics_device.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("GraphicsDevice lock poisoned".to_string())
            ))?;

        *lock = None;

        crate::engine_info!("gpu_mirror::Engine", "GraphicsDevice singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut device) = state.graphics_device.write() {
                *device = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Replace the default logger with a custom implementation
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to DefaultLogger
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Whether the current logger wants entries of `severity`
    ///
    /// Used by the logging macros to skip formatting filtered messages.
    pub fn log_enabled(severity: LogSeverity) -> bool {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        logger_lock.read()
            .map(|lock| lock.enabled(severity))
            .unwrap_or(false)
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Internal logging method with file:line information
    ///
    /// Used by the engine_error! macro.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())));
        if let Ok(lock) = logger_lock.read() {
            if lock.enabled(entry.severity) {
                lock.log(&entry);
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
