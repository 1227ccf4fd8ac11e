//! Camera Capability Layer
//!
//! The scanner never talks to a camera API directly. Device acquisition,
//! permission prompting, torch control and haptics are injected as trait
//! objects so the core can run headless and under test.

pub mod frame;

use thiserror::Error;
use tracing::{debug, info};

/// Camera authorization as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPermission {
    /// The user has granted access
    Granted,
    /// The user has refused access; only the system settings can change this
    Denied,
    /// The user has not been asked yet
    NotDetermined,
}

/// Failures reported by a camera device
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no camera device available")]
    NoDevice,
    #[error("cannot attach camera input: {0}")]
    Input(String),
    #[error("cannot attach frame output: {0}")]
    Output(String),
    #[error("torch is not available on this device")]
    NoTorch,
}

/// Camera device capability injected into a scanner
pub trait CameraDevice: Send {
    /// Current authorization state
    fn permission(&self) -> CameraPermission;

    /// Prompt the user for access; returns the resulting state
    fn request_permission(&mut self) -> CameraPermission;

    /// Acquire the device and begin delivering frames
    fn open(&mut self) -> Result<(), DeviceError>;

    /// Stop delivering frames and release the device
    fn close(&mut self);

    /// Whether the device has a controllable torch
    fn has_torch(&self) -> bool {
        false
    }

    /// Switch the torch on or off
    fn set_torch(&mut self, _on: bool) -> Result<(), DeviceError> {
        Err(DeviceError::NoTorch)
    }

    /// Redirect the user to the system settings page for camera access
    fn open_settings(&self) {}
}

/// Haptic feedback capability
pub trait Haptics: Send + Sync {
    /// Signal a successful scan
    fn success(&self);
}

/// Haptics implementation that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHaptics;

impl Haptics for NullHaptics {
    fn success(&self) {}
}

/// Behaviour of a [`VirtualCamera`]
#[derive(Debug, Clone)]
pub struct VirtualCameraConfig {
    /// Authorization state the virtual camera reports
    pub permission: CameraPermission,
    /// State reached after a permission prompt
    pub prompt_result: CameraPermission,
    /// Whether `open` succeeds
    pub available: bool,
    /// Whether the device has a torch
    pub torch: bool,
}

impl Default for VirtualCameraConfig {
    fn default() -> Self {
        Self {
            permission: CameraPermission::Granted,
            prompt_result: CameraPermission::Granted,
            available: true,
            torch: false,
        }
    }
}

/// Camera device with no hardware behind it.
///
/// Used when frames come from somewhere other than a live camera, such as a
/// recorded OCR transcript.
#[derive(Debug, Default)]
pub struct VirtualCamera {
    config: VirtualCameraConfig,
    open: bool,
    torch_on: bool,
}

impl VirtualCamera {
    /// Create a virtual camera that is authorized and available
    pub fn new() -> Self {
        Self::with_config(VirtualCameraConfig::default())
    }

    /// Create a virtual camera with custom behaviour
    pub fn with_config(config: VirtualCameraConfig) -> Self {
        Self {
            config,
            open: false,
            torch_on: false,
        }
    }

    /// Whether the device is currently open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the torch is lit
    pub fn torch_on(&self) -> bool {
        self.torch_on
    }
}

impl CameraDevice for VirtualCamera {
    fn permission(&self) -> CameraPermission {
        self.config.permission
    }

    fn request_permission(&mut self) -> CameraPermission {
        self.config.permission = self.config.prompt_result;
        self.config.permission
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if !self.config.available {
            return Err(DeviceError::NoDevice);
        }
        self.open = true;
        info!("Virtual camera opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            debug!("Virtual camera closed");
        }
        self.open = false;
        self.torch_on = false;
    }

    fn has_torch(&self) -> bool {
        self.config.torch
    }

    fn set_torch(&mut self, on: bool) -> Result<(), DeviceError> {
        if !self.config.torch {
            return Err(DeviceError::NoTorch);
        }
        self.torch_on = on;
        Ok(())
    }
}
