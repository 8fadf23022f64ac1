//! Parsing and validation of `schemapack.toml` layout configuration files.
//!
//! This crate reads the layout configuration and produces a strongly-typed
//! [`LayoutConfig`] holding the solver budgets, pin-range thresholds, packing
//! strategies, network-filter mode and optional spacing overrides.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
