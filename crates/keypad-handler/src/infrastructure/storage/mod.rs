//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the path the embedding process
//!   chooses.
//! - Providing sensible defaults when the file does not exist (the single
//!   home/power key layout).
//! - Turning the key list into a `KeyBindingTable`, reading file-backed scan
//!   codes exactly once.

pub mod config;
