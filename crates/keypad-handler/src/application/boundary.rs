//! Traits for the collaborators the handler talks to.
//!
//! Infrastructure implementations live in [`crate::infrastructure`]; test
//! implementations that record every call live in
//! [`crate::infrastructure::mock`].
//!
//! All traits are `Send + Sync` so the handler can be moved onto the
//! dispatch task.  Every method is synchronous: implementations that need a
//! remote call must hand the work off (see
//! [`crate::infrastructure::remote`]) rather than block the caller.

use std::time::Duration;

use keypad_core::{CaptureRegion, DeviceId, VirtualKeyEvent};
use thiserror::Error;

/// Failure reported by a boundary call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoundaryError {
    /// The remote service rejected or failed the request.
    #[error("remote call failed: {0}")]
    Remote(String),
    /// The remote service did not answer in time.
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
    /// The async runtime that executes remote calls is gone.
    #[error("runtime unavailable")]
    RuntimeUnavailable,
}

/// Looks up the human-readable name of an input device.
pub trait DeviceDirectory: Send + Sync {
    /// Returns the device name, or `None` if the device is unknown.
    fn device_name(&self, device_id: DeviceId) -> Option<String>;
}

/// Injects synthesized key events into the platform input pipeline.
///
/// Fire-and-forget: no acknowledgement is awaited.
pub trait KeyInjector: Send + Sync {
    fn inject(&self, event: VirtualKeyEvent);
}

/// Triggers a screenshot capture.
pub trait ScreenshotService: Send + Sync {
    /// Requests a capture of `region`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the request could not be submitted.
    fn capture(&self, region: CaptureRegion) -> Result<(), BoundaryError>;
}

/// Drives the vibration motor.
///
/// Only constructed when the device actually has a vibrator; the handler
/// holds an `Option` and skips haptics entirely when it is absent.
pub trait Vibrator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the request could not be submitted.
    fn vibrate(&self, duration: Duration) -> Result<(), BoundaryError>;
}

/// Reads the user's haptic-feedback preference.
pub trait HapticSettings: Send + Sync {
    /// Returns the stored preference, or `None` when it was never set.
    fn haptic_feedback_enabled(&self) -> Option<bool>;
}

/// Reports whether the device is awake and interactive.
pub trait PowerState: Send + Sync {
    fn is_interactive(&self) -> bool;
}
