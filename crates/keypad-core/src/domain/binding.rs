//! The logical key binding table.
//!
//! Each [`LogicalKeyDescriptor`] describes one logical key slot: which device
//! name it expects, which scan code it answers to, and what role it plays in
//! the gesture engine.  The table is built once at startup from configuration
//! and only changes afterwards in two set-once ways: a slot's device id is
//! bound on its first matching event, and its virtual key code is taken from
//! that same event.
//!
//! # Why an explicit `Disabled` scan code?
//!
//! A slot whose scan code could not be read must never match.  Using a magic
//! value such as `0` for that would collide with hardware where `0` is a real
//! scan code, so [`ScanCodeSetting::Disabled`] spells it out instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::{DeviceId, KeyCode, ScanCode};
use super::identity::DeviceIdentity;

/// Errors raised while building a [`KeyBindingTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// Only one home/power key is supported per table.
    #[error("home/power key already bound to slot {existing}")]
    DuplicateHomeKey { existing: usize },
}

/// Configured scan code for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCodeSetting {
    /// The slot answers to this scan code.
    Enabled(ScanCode),
    /// The slot is unavailable on this hardware and never matches.
    Disabled,
}

impl ScanCodeSetting {
    /// Parses the textual form read from a scan-code source.
    ///
    /// Surrounding whitespace is ignored.  Anything that is not a plain
    /// unsigned integer yields [`ScanCodeSetting::Disabled`].
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<ScanCode>() {
            Ok(code) => ScanCodeSetting::Enabled(code),
            Err(_) => ScanCodeSetting::Disabled,
        }
    }

    /// Returns `true` if `scan_code` is the configured code.
    pub fn matches(&self, scan_code: ScanCode) -> bool {
        match self {
            ScanCodeSetting::Enabled(code) => *code == scan_code,
            ScanCodeSetting::Disabled => false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ScanCodeSetting::Enabled(_))
    }
}

/// One of the two key clusters used for combo detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The opposite cluster.
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// The part a slot plays in the gesture engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRole {
    /// The single tiered home/power key.
    HomePower,
    /// A member of the left or right cluster.
    Cluster(Side),
}

/// Position of a descriptor in its [`KeyBindingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// A configured logical key slot.
#[derive(Debug, Clone)]
pub struct LogicalKeyDescriptor {
    slot: SlotId,
    name: String,
    device_name: String,
    scan_code: ScanCodeSetting,
    role: SlotRole,
    identity: DeviceIdentity,
    key_code: Option<KeyCode>,
}

impl LogicalKeyDescriptor {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Human-readable slot name from configuration (used in logs).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the physical device this slot expects events from.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn scan_code(&self) -> ScanCodeSetting {
        self.scan_code
    }

    pub fn role(&self) -> SlotRole {
        self.role
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    /// Virtual key code learnt from the first matching event.
    pub fn key_code(&self) -> Option<KeyCode> {
        self.key_code
    }

    /// Runs device identity resolution for an event from `device_id`.
    ///
    /// See [`DeviceIdentity::resolve`].
    pub fn resolve_device<F>(&mut self, device_id: DeviceId, device_name: F) -> bool
    where
        F: FnOnce(DeviceId) -> Option<String>,
    {
        self.identity.resolve(&self.device_name, device_id, device_name)
    }

    /// Records the virtual key code on first use and returns the one in effect.
    pub fn learn_key_code(&mut self, reported: KeyCode) -> KeyCode {
        *self.key_code.get_or_insert(reported)
    }
}

/// Ordered list of logical key descriptors.
#[derive(Debug, Clone, Default)]
pub struct KeyBindingTable {
    descriptors: Vec<LogicalKeyDescriptor>,
}

impl KeyBindingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::DuplicateHomeKey`] when a second
    /// [`SlotRole::HomePower`] slot is added.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        device_name: impl Into<String>,
        role: SlotRole,
        scan_code: ScanCodeSetting,
    ) -> Result<SlotId, BindingError> {
        if role == SlotRole::HomePower {
            if let Some(existing) = self.home_slot() {
                return Err(BindingError::DuplicateHomeKey {
                    existing: existing.0,
                });
            }
        }
        let slot = SlotId(self.descriptors.len());
        self.descriptors.push(LogicalKeyDescriptor {
            slot,
            name: name.into(),
            device_name: device_name.into(),
            scan_code,
            role,
            identity: DeviceIdentity::Unbound,
            key_code: None,
        });
        Ok(slot)
    }

    pub fn get(&self, slot: SlotId) -> Option<&LogicalKeyDescriptor> {
        self.descriptors.get(slot.0)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogicalKeyDescriptor> {
        self.descriptors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LogicalKeyDescriptor> {
        self.descriptors.iter_mut()
    }

    /// The slot playing [`SlotRole::HomePower`], if configured.
    pub fn home_slot(&self) -> Option<SlotId> {
        self.descriptors
            .iter()
            .find(|d| d.role == SlotRole::HomePower)
            .map(|d| d.slot)
    }

    /// Slots belonging to `side`, in table order.
    pub fn cluster_slots(&self, side: Side) -> impl Iterator<Item = SlotId> + '_ {
        self.descriptors
            .iter()
            .filter(move |d| d.role == SlotRole::Cluster(side))
            .map(|d| d.slot)
    }
}
