//! TOML-based configuration for the keypad handler.
//!
//! The configuration names every logical key (which device it expects, what
//! role it plays, where its scan code comes from) and the gesture thresholds.
//!
//! ```toml
//! log_level = "info"
//!
//! [timing]
//! long_press_timeout_ms = 500
//! long_hold_ms = 2000
//! tap_window_ms = 150
//! key_repeat_timeout_ms = 500
//! key_repeat_interval_ms = 50
//!
//! [haptic]
//! duration_ms = 50
//!
//! [[keys]]
//! name = "home"
//! device = "qpnp_pon"
//! role = "home-power"
//! scan_code = 172
//!
//! [[keys]]
//! name = "left-up"
//! device = "touch_keys"
//! role = "left"
//! scan_code_path = "/sys/devices/soc/touch_keys/left_up_code"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent.  A missing file, or a file that
//! only overrides a few thresholds, yields the single home/power key layout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keypad_core::{BindingError, KeyBindingTable, ScanCodeSetting, Side, SlotRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::application::gesture::GestureTiming;
use crate::infrastructure::scan_code::ScanCodeSource;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A key sets both `scan_code` and `scan_code_path`.
    #[error("key {0:?} sets both scan_code and scan_code_path")]
    AmbiguousScanCode(String),

    /// A key sets neither `scan_code` nor `scan_code_path`.
    #[error("key {0:?} has no scan_code or scan_code_path")]
    MissingScanCode(String),

    /// A timing value is zero or the thresholds are out of order.
    #[error("invalid timing: {0}")]
    InvalidTiming(String),

    /// The key list cannot form a binding table.
    #[error(transparent)]
    Binding(#[from] BindingError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level handler configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandlerConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub haptic: HapticConfig,
    /// Logical keys, in matching order.
    #[serde(default = "default_keys")]
    pub keys: Vec<KeyEntry>,
}

/// Gesture thresholds in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    #[serde(default = "default_long_press_timeout_ms")]
    pub long_press_timeout_ms: u64,
    #[serde(default = "default_long_hold_ms")]
    pub long_hold_ms: u64,
    #[serde(default = "default_tap_window_ms")]
    pub tap_window_ms: u64,
    #[serde(default = "default_key_repeat_timeout_ms")]
    pub key_repeat_timeout_ms: u64,
    #[serde(default = "default_key_repeat_interval_ms")]
    pub key_repeat_interval_ms: u64,
}

/// Haptic pulse settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HapticConfig {
    #[serde(default = "default_haptic_duration_ms")]
    pub duration_ms: u64,
}

/// Role of a configured key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum KeyRole {
    HomePower,
    Left,
    Right,
}

impl From<KeyRole> for SlotRole {
    fn from(role: KeyRole) -> Self {
        match role {
            KeyRole::HomePower => SlotRole::HomePower,
            KeyRole::Left => SlotRole::Cluster(Side::Left),
            KeyRole::Right => SlotRole::Cluster(Side::Right),
        }
    }
}

/// One logical key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyEntry {
    /// Name used in logs.
    pub name: String,
    /// Expected input device name.
    pub device: String,
    pub role: KeyRole,
    /// Literal scan code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_code: Option<u32>,
    /// File holding the scan code, read once at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_code_path: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_long_press_timeout_ms() -> u64 {
    500
}
fn default_long_hold_ms() -> u64 {
    2000
}
fn default_tap_window_ms() -> u64 {
    150
}
fn default_key_repeat_timeout_ms() -> u64 {
    500
}
fn default_key_repeat_interval_ms() -> u64 {
    50
}
fn default_haptic_duration_ms() -> u64 {
    50
}
fn default_keys() -> Vec<KeyEntry> {
    vec![KeyEntry {
        name: "home".to_string(),
        device: "qpnp_pon".to_string(),
        role: KeyRole::HomePower,
        scan_code: Some(172),
        scan_code_path: None,
    }]
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            timing: TimingConfig::default(),
            haptic: HapticConfig::default(),
            keys: default_keys(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            long_press_timeout_ms: default_long_press_timeout_ms(),
            long_hold_ms: default_long_hold_ms(),
            tap_window_ms: default_tap_window_ms(),
            key_repeat_timeout_ms: default_key_repeat_timeout_ms(),
            key_repeat_interval_ms: default_key_repeat_interval_ms(),
        }
    }
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_haptic_duration_ms(),
        }
    }
}

// ── Conversion and validation ─────────────────────────────────────────────────

impl HandlerConfig {
    /// Checks thresholds and key entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTiming`] for zero durations or
    /// out-of-order thresholds, [`ConfigError::AmbiguousScanCode`] /
    /// [`ConfigError::MissingScanCode`] for malformed keys, and
    /// [`ConfigError::Binding`] for more than one home/power key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        let durations = [
            ("long_press_timeout_ms", t.long_press_timeout_ms),
            ("long_hold_ms", t.long_hold_ms),
            ("tap_window_ms", t.tap_window_ms),
            ("key_repeat_timeout_ms", t.key_repeat_timeout_ms),
            ("key_repeat_interval_ms", t.key_repeat_interval_ms),
            ("haptic.duration_ms", self.haptic.duration_ms),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidTiming(format!("{name} must be non-zero")));
        }
        if t.tap_window_ms >= t.key_repeat_timeout_ms {
            return Err(ConfigError::InvalidTiming(
                "tap_window_ms must be shorter than key_repeat_timeout_ms".to_string(),
            ));
        }
        if t.long_press_timeout_ms >= t.long_hold_ms {
            return Err(ConfigError::InvalidTiming(
                "long_press_timeout_ms must be shorter than long_hold_ms".to_string(),
            ));
        }

        let mut home_keys = 0;
        for key in &self.keys {
            match (&key.scan_code, &key.scan_code_path) {
                (Some(_), Some(_)) => return Err(ConfigError::AmbiguousScanCode(key.name.clone())),
                (None, None) => return Err(ConfigError::MissingScanCode(key.name.clone())),
                _ => {}
            }
            if key.role == KeyRole::HomePower {
                home_keys += 1;
                if home_keys > 1 {
                    return Err(ConfigError::Binding(BindingError::DuplicateHomeKey {
                        existing: self
                            .keys
                            .iter()
                            .position(|k| k.role == KeyRole::HomePower)
                            .unwrap_or_default(),
                    }));
                }
            }
        }
        Ok(())
    }

    /// Gesture thresholds as durations.
    pub fn gesture_timing(&self) -> GestureTiming {
        let t = &self.timing;
        GestureTiming {
            long_press_timeout: Duration::from_millis(t.long_press_timeout_ms),
            long_hold: Duration::from_millis(t.long_hold_ms),
            tap_window: Duration::from_millis(t.tap_window_ms),
            key_repeat_timeout: Duration::from_millis(t.key_repeat_timeout_ms),
            key_repeat_interval: Duration::from_millis(t.key_repeat_interval_ms),
            haptic_duration: Duration::from_millis(self.haptic.duration_ms),
        }
    }

    /// Builds the binding table, reading file-backed scan codes once.
    ///
    /// Unreadable scan-code files disable their key rather than failing.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`HandlerConfig::validate`].
    pub fn build_binding_table(
        &self,
        source: &dyn ScanCodeSource,
    ) -> Result<KeyBindingTable, ConfigError> {
        self.validate()?;
        let mut table = KeyBindingTable::new();
        for key in &self.keys {
            let scan_code = match (&key.scan_code, &key.scan_code_path) {
                (Some(code), _) => ScanCodeSetting::Enabled(*code),
                (None, Some(path)) => source.read_scan_code(path),
                (None, None) => return Err(ConfigError::MissingScanCode(key.name.clone())),
            };
            table.push(key.name.clone(), key.device.clone(), key.role.into(), scan_code)?;
        }
        Ok(table)
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Parses and validates configuration text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and any validation error.
pub fn parse_config(content: &str) -> Result<HandlerConfig, ConfigError> {
    let cfg: HandlerConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads configuration from `path`, returning `HandlerConfig::default()` if
/// the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and any validation error.
pub fn load_config_from(path: &Path) -> Result<HandlerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg = parse_config(&content)?;
            info!("loaded keypad config from {} ({} keys)", path.display(), cfg.keys.len());
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("no keypad config at {}, using defaults", path.display());
            Ok(HandlerConfig::default())
        }
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use keypad_core::{SlotId, SlotRole};
    use std::collections::HashMap;
    use uuid::Uuid;

    struct FakeSource(HashMap<PathBuf, ScanCodeSetting>);

    impl ScanCodeSource for FakeSource {
        fn read_scan_code(&self, path: &Path) -> ScanCodeSetting {
            self.0.get(path).copied().unwrap_or(ScanCodeSetting::Disabled)
        }
    }

    const FIVE_KEY: &str = r#"
        [[keys]]
        name = "home"
        device = "qpnp_pon"
        role = "home-power"
        scan_code = 172

        [[keys]]
        name = "left-up"
        device = "touch_keys"
        role = "left"
        scan_code_path = "/board/left_up"

        [[keys]]
        name = "left-down"
        device = "touch_keys"
        role = "left"
        scan_code_path = "/board/left_down"

        [[keys]]
        name = "right-up"
        device = "touch_keys"
        role = "right"
        scan_code = 217

        [[keys]]
        name = "right-down"
        device = "touch_keys"
        role = "right"
        scan_code = 218
    "#;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_config_is_single_home_key() {
        // Arrange / Act
        let cfg = HandlerConfig::default();

        // Assert
        assert_eq!(cfg.keys.len(), 1);
        assert_eq!(cfg.keys[0].device, "qpnp_pon");
        assert_eq!(cfg.keys[0].role, KeyRole::HomePower);
        assert_eq!(cfg.keys[0].scan_code, Some(172));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_default_timing_converts_to_gesture_timing() {
        let cfg = HandlerConfig::default();
        assert_eq!(cfg.gesture_timing(), GestureTiming::default());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg = parse_config("").expect("empty config is valid");
        assert_eq!(cfg, HandlerConfig::default());
    }

    #[test]
    fn test_partial_timing_override_keeps_other_defaults() {
        let cfg = parse_config("[timing]\nlong_hold_ms = 3000\n").expect("parse");

        assert_eq!(cfg.timing.long_hold_ms, 3000);
        assert_eq!(cfg.timing.tap_window_ms, 150);
        assert_eq!(cfg.keys, default_keys());
    }

    // ── Binding table ─────────────────────────────────────────────────────────

    #[test]
    fn test_five_key_layout_builds_table_with_file_backed_codes() {
        // Arrange
        let cfg = parse_config(FIVE_KEY).expect("parse");
        let source = FakeSource(HashMap::from([(
            PathBuf::from("/board/left_up"),
            ScanCodeSetting::Enabled(158),
        )]));

        // Act
        let table = cfg.build_binding_table(&source).expect("table");

        // Assert
        assert_eq!(table.len(), 5);
        assert_eq!(table.home_slot(), Some(SlotId(0)));
        let left_up = table.get(SlotId(1)).unwrap();
        assert_eq!(left_up.scan_code(), ScanCodeSetting::Enabled(158));
        assert_eq!(left_up.role(), SlotRole::Cluster(Side::Left));
        // Unreadable source disables the slot instead of failing.
        assert_eq!(table.get(SlotId(2)).unwrap().scan_code(), ScanCodeSetting::Disabled);
        assert_eq!(table.cluster_slots(Side::Right).count(), 2);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_key_with_both_scan_sources_is_rejected() {
        let toml = r#"
            [[keys]]
            name = "home"
            device = "qpnp_pon"
            role = "home-power"
            scan_code = 172
            scan_code_path = "/board/home"
        "#;

        assert!(matches!(parse_config(toml), Err(ConfigError::AmbiguousScanCode(name)) if name == "home"));
    }

    #[test]
    fn test_key_without_scan_source_is_rejected() {
        let toml = r#"
            [[keys]]
            name = "left"
            device = "touch_keys"
            role = "left"
        "#;

        assert!(matches!(parse_config(toml), Err(ConfigError::MissingScanCode(_))));
    }

    #[test]
    fn test_two_home_keys_are_rejected() {
        let mut cfg = HandlerConfig::default();
        cfg.keys.push(cfg.keys[0].clone());

        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Binding(BindingError::DuplicateHomeKey { existing: 0 }))
        ));
    }

    #[test]
    fn test_tap_window_must_be_shorter_than_repeat_timeout() {
        let result = parse_config("[timing]\ntap_window_ms = 600\n");
        assert!(matches!(result, Err(ConfigError::InvalidTiming(_))));
    }

    #[test]
    fn test_long_press_must_be_shorter_than_long_hold() {
        let result = parse_config("[timing]\nlong_press_timeout_ms = 2500\n");
        assert!(matches!(result, Err(ConfigError::InvalidTiming(_))));
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let result = parse_config("[haptic]\nduration_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidTiming(msg)) if msg.contains("haptic")));
    }

    #[test]
    fn test_unknown_role_fails_to_parse() {
        let toml = r#"
            [[keys]]
            name = "x"
            device = "d"
            role = "middle"
            scan_code = 1
        "#;

        assert!(matches!(parse_config(toml), Err(ConfigError::Parse(_))));
    }

    // ── File loading ──────────────────────────────────────────────────────────

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("keypad-config-{}.toml", Uuid::new_v4()));

        let cfg = load_config_from(&path).expect("defaults");

        assert_eq!(cfg, HandlerConfig::default());
    }

    #[test]
    fn test_config_file_round_trips_through_toml() {
        // Arrange
        let mut cfg = parse_config(FIVE_KEY).expect("parse");
        cfg.log_level = "debug".to_string();
        let path = std::env::temp_dir().join(format!("keypad-config-{}.toml", Uuid::new_v4()));
        std::fs::write(&path, toml::to_string_pretty(&cfg).expect("serialize")).unwrap();

        // Act
        let restored = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(restored, cfg);
        std::fs::remove_file(&path).unwrap();
    }
}
