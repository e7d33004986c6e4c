//! keypad-handler library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and embedding processes share the same module tree.

pub mod application;
pub mod infrastructure;
