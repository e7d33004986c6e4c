//! Domain layer: pure types describing keypad input.
//!
//! Nothing in this module touches the operating system.  The handler crate
//! adapts OS events into [`event::RawKeyEvent`] values and feeds them in.
//!
//! # Sub-modules
//!
//! - **`event`**    – Raw hardware events, synthesized virtual key events,
//!   and the platform key codes the handler emits.
//! - **`binding`**  – The ordered table of logical keys, each bound to an
//!   expected device name and a configured scan code.
//! - **`identity`** – The set-once cell recording which physical device a
//!   logical key belongs to.

pub mod binding;
pub mod event;
pub mod identity;
