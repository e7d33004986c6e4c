//! Device name lookup adapters.
//!
//! - [`SysfsDeviceDirectory`] reads names the way Linux exposes them:
//!   `<root>/event<id>/device/name`, where `root` is normally
//!   `/sys/class/input`.
//! - [`StaticDeviceDirectory`] is a fixed id → name map for embedding
//!   processes that already know their devices, and for tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use keypad_core::DeviceId;
use tracing::trace;

use crate::application::boundary::DeviceDirectory;

/// Default sysfs root for input class devices.
pub const SYSFS_INPUT_ROOT: &str = "/sys/class/input";

/// Reads device names from sysfs.
#[derive(Debug, Clone)]
pub struct SysfsDeviceDirectory {
    root: PathBuf,
}

impl SysfsDeviceDirectory {
    /// Uses `root` instead of [`SYSFS_INPUT_ROOT`].
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn name_path(&self, device_id: DeviceId) -> PathBuf {
        self.root
            .join(format!("event{device_id}"))
            .join("device")
            .join("name")
    }
}

impl Default for SysfsDeviceDirectory {
    fn default() -> Self {
        Self::with_root(SYSFS_INPUT_ROOT)
    }
}

impl DeviceDirectory for SysfsDeviceDirectory {
    fn device_name(&self, device_id: DeviceId) -> Option<String> {
        let path = self.name_path(device_id);
        match std::fs::read_to_string(&path) {
            Ok(name) => Some(name.trim_end().to_string()),
            Err(e) => {
                trace!("no device name at {}: {e}", path.display());
                None
            }
        }
    }
}

/// Fixed id → name map.
#[derive(Debug, Default)]
pub struct StaticDeviceDirectory {
    names: RwLock<HashMap<DeviceId, String>>,
}

impl StaticDeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or renames) a device.
    pub fn insert(&self, device_id: DeviceId, name: impl Into<String>) {
        if let Ok(mut names) = self.names.write() {
            names.insert(device_id, name.into());
        }
    }
}

impl DeviceDirectory for StaticDeviceDirectory {
    fn device_name(&self, device_id: DeviceId) -> Option<String> {
        self.names
            .read()
            .ok()
            .and_then(|names| names.get(&device_id).cloned())
    }
}
