//! In-process power-state and settings adapters.
//!
//! The embedding process owns the real sources (display power events, the
//! settings provider) and pushes changes into these atomics; the handler
//! reads them on the dispatch task without locking.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::application::boundary::{HapticSettings, PowerState};

/// Interactive flag updated by the embedding process.
#[derive(Debug)]
pub struct SharedPowerState {
    interactive: AtomicBool,
}

impl SharedPowerState {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive: AtomicBool::new(interactive),
        }
    }

    pub fn set_interactive(&self, interactive: bool) {
        self.interactive.store(interactive, Ordering::Relaxed);
    }
}

impl PowerState for SharedPowerState {
    fn is_interactive(&self) -> bool {
        self.interactive.load(Ordering::Relaxed)
    }
}

const SETTING_UNSET: u8 = 0;
const SETTING_OFF: u8 = 1;
const SETTING_ON: u8 = 2;

/// Haptic-feedback preference that distinguishes "never set" from on/off.
#[derive(Debug)]
pub struct SharedHapticSettings {
    state: AtomicU8,
}

impl SharedHapticSettings {
    /// A preference that has never been written.
    pub fn unset() -> Self {
        Self {
            state: AtomicU8::new(SETTING_UNSET),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        let value = if enabled { SETTING_ON } else { SETTING_OFF };
        self.state.store(value, Ordering::Relaxed);
    }

    /// Forgets the stored preference.
    pub fn clear(&self) {
        self.state.store(SETTING_UNSET, Ordering::Relaxed);
    }
}

impl HapticSettings for SharedHapticSettings {
    fn haptic_feedback_enabled(&self) -> Option<bool> {
        match self.state.load(Ordering::Relaxed) {
            SETTING_ON => Some(true),
            SETTING_OFF => Some(false),
            _ => None,
        }
    }
}
