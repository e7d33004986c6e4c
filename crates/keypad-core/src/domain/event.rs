//! Raw and synthesized key event types.
//!
//! # Two kinds of event (for beginners)
//!
//! - A [`RawKeyEvent`] is what the hardware produced: which device it came
//!   from, the hardware scan code, the key code the kernel keymap assigned,
//!   whether the key went down or up, and when.
//! - A [`VirtualKeyEvent`] is what the handler *synthesizes* and hands to the
//!   platform injector.  It carries no device or timestamp; the injector
//!   stamps those when it submits the event to the input pipeline.

use serde::{Deserialize, Serialize};

/// Identifier the platform assigns to a physical input device.
pub type DeviceId = u32;

/// Raw hardware scan code.
pub type ScanCode = u32;

/// Platform key code (the value carried by both raw and synthesized events).
pub type KeyCode = u32;

/// Platform key code for HOME.
pub const KEYCODE_HOME: KeyCode = 3;

/// Platform key code for POWER.
pub const KEYCODE_POWER: KeyCode = 26;

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    Down,
    Up,
}

/// A key event exactly as produced by a physical input device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeyEvent {
    /// Device that produced the event.
    pub device_id: DeviceId,
    /// Hardware scan code.
    pub scan_code: ScanCode,
    /// Key code assigned by the kernel keymap.
    pub key_code: KeyCode,
    /// Press or release.
    pub action: KeyAction,
    /// Milliseconds since boot, as reported by the input subsystem.
    pub time_ms: u64,
}

impl RawKeyEvent {
    /// Convenience constructor for a key-down event.
    pub fn down(device_id: DeviceId, scan_code: ScanCode, key_code: KeyCode, time_ms: u64) -> Self {
        Self {
            device_id,
            scan_code,
            key_code,
            action: KeyAction::Down,
            time_ms,
        }
    }

    /// Convenience constructor for a key-up event.
    pub fn up(device_id: DeviceId, scan_code: ScanCode, key_code: KeyCode, time_ms: u64) -> Self {
        Self {
            device_id,
            scan_code,
            key_code,
            action: KeyAction::Up,
            time_ms,
        }
    }
}

/// Flags attached to a synthesized key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyFlags(pub u32);

impl KeyFlags {
    /// No flags.
    pub const NONE: KeyFlags = KeyFlags(0);
    /// The gesture was aborted: downstream must not treat the matching
    /// press as a completed key stroke.
    pub const CANCELED: KeyFlags = KeyFlags(0x20);

    /// Returns `true` if the [`KeyFlags::CANCELED`] bit is set.
    pub fn is_canceled(&self) -> bool {
        self.0 & Self::CANCELED.0 != 0
    }
}

/// A key event synthesized by the handler for injection into the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualKeyEvent {
    pub code: KeyCode,
    pub action: KeyAction,
    pub flags: KeyFlags,
}

impl VirtualKeyEvent {
    pub fn down(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Down,
            flags: KeyFlags::NONE,
        }
    }

    pub fn up(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Up,
            flags: KeyFlags::NONE,
        }
    }

    /// A release carrying [`KeyFlags::CANCELED`].
    pub fn canceled_up(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Up,
            flags: KeyFlags::CANCELED,
        }
    }
}

/// Which part of the screen a screenshot request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureRegion {
    /// The whole display.
    Full,
    /// A user-selected region.
    Partial,
}
