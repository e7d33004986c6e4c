//! Application layer for the keypad handler.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the domain (`keypad_core`: pure types
//! and the timer queue) and the infrastructure (OS devices, settings,
//! screenshot and vibration services, the async runtime).
//!
//! Code in this layer:
//!
//! - **Orchestrates** domain objects to turn raw key events into synthesized
//!   ones.
//! - **Depends on abstractions** (the traits in [`boundary`]) rather than
//!   concrete implementations, so the infrastructure can be swapped without
//!   changing this code.
//! - **Contains no OS calls and no async code**.  Time is passed in as an
//!   explicit [`std::time::Instant`], which keeps every gesture test
//!   deterministic.
//!
//! # Sub-modules
//!
//! - **`boundary`** – Traits for every external collaborator.
//! - **`classify`** – Matches a raw event to a logical key slot, binding
//!   device identities on the way.
//! - **`gesture`**  – The gesture state machine: taps, holds, auto-repeat
//!   and two-sided combos.  This runs on every keystroke.
//! - **`handler`**  – The `handle(event)` facade combining the two.

pub mod boundary;
pub mod classify;
pub mod gesture;
pub mod handler;
