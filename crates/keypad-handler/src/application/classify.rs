//! EventClassifier: matches raw events to logical key slots.
//!
//! For every configured slot, in table order, the classifier first runs
//! device identity resolution and then compares scan codes.  Resolution runs
//! for *every* candidate slot on every event until that slot is bound, since
//! the first event from the expected device may carry any scan code.
//!
//! The only side effects are the set-once bindings on each descriptor: its
//! device id and its virtual key code.

use std::sync::Arc;

use keypad_core::{KeyBindingTable, KeyCode, RawKeyEvent, SlotId, SlotRole};
use tracing::debug;

use super::boundary::DeviceDirectory;

/// A raw event resolved to a logical key slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedKey {
    pub slot: SlotId,
    pub role: SlotRole,
    /// Virtual key code of the slot (learnt from its first matching event).
    pub key_code: KeyCode,
}

/// Matches raw events against the binding table.
pub struct EventClassifier {
    table: KeyBindingTable,
    devices: Arc<dyn DeviceDirectory>,
}

impl EventClassifier {
    pub fn new(table: KeyBindingTable, devices: Arc<dyn DeviceDirectory>) -> Self {
        Self { table, devices }
    }

    pub fn table(&self) -> &KeyBindingTable {
        &self.table
    }

    /// Returns the first slot matching `event`, or `None` for pass-through.
    pub fn classify(&mut self, event: &RawKeyEvent) -> Option<ClassifiedKey> {
        // The device name is looked up at most once per event, and only if
        // some slot is still unbound.
        let mut cached_name: Option<Option<String>> = None;
        let devices = &self.devices;

        for descriptor in self.table.iter_mut() {
            let device_matches = descriptor.resolve_device(event.device_id, |id| {
                cached_name
                    .get_or_insert_with(|| devices.device_name(id))
                    .clone()
            });
            if !device_matches || !descriptor.scan_code().matches(event.scan_code) {
                continue;
            }

            let key_code = descriptor.learn_key_code(event.key_code);
            debug!(
                slot = descriptor.slot().0,
                name = descriptor.name(),
                scan_code = event.scan_code,
                "classified key event"
            );
            return Some(ClassifiedKey {
                slot: descriptor.slot(),
                role: descriptor.role(),
                key_code,
            });
        }
        None
    }
}
