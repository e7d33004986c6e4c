//! Infrastructure layer for the keypad handler.
//!
//! Contains OS-facing adapters: device name lookup, scan-code files,
//! configuration storage, detached remote calls, logging setup, and the tokio
//! task that serializes events and timers.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keypad_core`, but MUST NOT be imported by the `application` or domain
//! layers (tests excepted).

pub mod devices;
pub mod dispatch;
pub mod logging;
pub mod mock;
pub mod remote;
pub mod scan_code;
pub mod storage;
pub mod system;
