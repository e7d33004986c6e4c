//! Scan-code sources.
//!
//! Board files typically expose the scan code of each configurable key as a
//! small text file holding one integer.  It is read exactly once, when the
//! binding table is built.  Any failure, whether the file is missing,
//! unreadable or not a number, degrades that slot to
//! [`ScanCodeSetting::Disabled`] instead of failing startup.

use std::path::Path;

use keypad_core::ScanCodeSetting;
use tracing::warn;

/// Reads the configured scan code for one slot.
pub trait ScanCodeSource {
    fn read_scan_code(&self, path: &Path) -> ScanCodeSetting;
}

/// Reads scan codes from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileScanCodeSource;

impl ScanCodeSource for FileScanCodeSource {
    fn read_scan_code(&self, path: &Path) -> ScanCodeSetting {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("cannot read scan code from {}: {e}; key disabled", path.display());
                return ScanCodeSetting::Disabled;
            }
        };
        let setting = ScanCodeSetting::parse(&text);
        if !setting.is_enabled() {
            warn!(
                "invalid scan code {:?} in {}; key disabled",
                text.trim(),
                path.display()
            );
        }
        setting
    }
}
