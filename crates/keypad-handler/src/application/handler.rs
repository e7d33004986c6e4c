//! KeyHandler: the single entry point for raw key events.
//!
//! Combines the [`EventClassifier`] and the [`GestureEngine`]:
//!
//! ```text
//! RawKeyEvent ──► fire due timers ──► classify ──┬─► GestureEngine ──► None (consumed)
//!                                                └─► Some(event)      (pass-through)
//! ```
//!
//! Timers that fell due before the event arrived are fired first, so the
//! engine always observes timer expiries and key events in time order.

use std::sync::Arc;
use std::time::Instant;

use keypad_core::{KeyBindingTable, RawKeyEvent};
use tracing::info;

use super::boundary::DeviceDirectory;
use super::classify::EventClassifier;
use super::gesture::{Boundaries, GestureEngine, GestureTiming};

/// Filters raw key events through the gesture engine.
pub struct KeyHandler {
    classifier: EventClassifier,
    engine: GestureEngine,
}

impl KeyHandler {
    pub fn new(
        table: KeyBindingTable,
        devices: Arc<dyn DeviceDirectory>,
        timing: GestureTiming,
        boundaries: Boundaries,
    ) -> Self {
        info!(
            slots = table.len(),
            home = table.home_slot().is_some(),
            vibrator = boundaries.vibrator.is_some(),
            "keypad handler ready"
        );
        Self {
            classifier: EventClassifier::new(table, devices),
            engine: GestureEngine::new(timing, boundaries),
        }
    }

    /// Handles one raw event observed at `now`.
    ///
    /// Returns `None` when the event was consumed by a logical key, or the
    /// unchanged event for normal dispatch.
    pub fn handle(&mut self, now: Instant, event: RawKeyEvent) -> Option<RawKeyEvent> {
        self.engine.fire_due_timers(now);
        match self.classifier.classify(&event) {
            Some(key) => {
                self.engine.on_key(now, key, event.action);
                None
            }
            None => Some(event),
        }
    }

    /// Executes every timer due at or before `now`.
    pub fn fire_due_timers(&mut self, now: Instant) {
        self.engine.fire_due_timers(now);
    }

    /// The earliest pending timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.engine.next_deadline()
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn table(&self) -> &KeyBindingTable {
        self.classifier.table()
    }
}
