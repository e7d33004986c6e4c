//! # keypad-core
//!
//! Shared foundation for the keypad gesture handler: raw and synthesized event
//! types, the logical key binding table, lazy device identity binding, and a
//! tag-addressable timer service.
//!
//! This crate has zero dependencies on OS APIs, async runtimes, or I/O.
//! Everything here is driven by values the caller passes in, including time,
//! which makes the gesture engine built on top of it fully deterministic under
//! test.
//!
//! # Architecture overview (for beginners)
//!
//! A handheld device may wire several *physical* input devices (a power-on
//! controller, a touch-key controller, ...) to one logical keypad.  The
//! handler that sits on top of this crate watches the raw events coming out
//! of those devices and turns short taps, long holds and two-key combos into a
//! small set of synthesized keys (home, power) and screenshot requests.
//!
//! This crate defines:
//!
//! - **`domain`** – What an event looks like, which logical keys exist, and
//!   how a logical key learns which physical device it belongs to.
//!
//! - **`timer`** – A single-threaded delayed-action queue.  Actions are
//!   grouped under tags so that a whole family of pending actions can be
//!   cancelled in one call (for example "everything belonging to the left
//!   key").

pub mod domain;
pub mod timer;

// Re-export the most-used types at the crate root so callers can write
// `keypad_core::RawKeyEvent` instead of `keypad_core::domain::event::RawKeyEvent`.
pub use domain::binding::{
    BindingError, KeyBindingTable, LogicalKeyDescriptor, ScanCodeSetting, Side, SlotId, SlotRole,
};
pub use domain::event::{
    CaptureRegion, DeviceId, KeyAction, KeyCode, KeyFlags, RawKeyEvent, ScanCode,
    VirtualKeyEvent, KEYCODE_HOME, KEYCODE_POWER,
};
pub use domain::identity::DeviceIdentity;
pub use timer::{TimerEntry, TimerService};
