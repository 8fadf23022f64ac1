//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::LayoutConfig;
use std::path::Path;

/// File name looked up inside a project directory.
pub const CONFIG_FILE_NAME: &str = "schemapack.toml";

/// Loads and validates `schemapack.toml` from a project directory.
///
/// A directory without the file yields the default configuration.
pub fn load_config(project_dir: &Path) -> Result<LayoutConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(LayoutConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<LayoutConfig, ConfigError> {
    let config: LayoutConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that every value is within its allowed range.
fn validate_config(config: &LayoutConfig) -> Result<(), ConfigError> {
    if config.solver.max_iterations == Some(0) {
        return Err(ConfigError::invalid(
            "solver.max_iterations",
            "must be greater than zero",
        ));
    }
    if config.solver.phase_max_iterations == 0 {
        return Err(ConfigError::invalid(
            "solver.phase_max_iterations",
            "must be greater than zero",
        ));
    }
    if config.pin_ranges.max_pins == 0 {
        return Err(ConfigError::invalid(
            "pin_ranges.max_pins",
            "a range holds at least one pin",
        ));
    }
    check_distance("pin_ranges.max_gap", Some(config.pin_ranges.max_gap))?;
    check_distance("spacing.chip_gap", config.spacing.chip_gap)?;
    check_distance("spacing.partition_gap", config.spacing.partition_gap)?;
    Ok(())
}

fn check_distance(field: &str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ConfigError::invalid(
            field,
            format!("expected a finite non-negative distance, got {v}"),
        )),
        _ => Ok(()),
    }
}
