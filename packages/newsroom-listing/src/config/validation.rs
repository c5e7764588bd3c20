//! Configuration validation

use super::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration objects
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;
}

/// Check `value` lies in `min..=max`
pub fn check_range(
    field: &str,
    value: usize,
    min: usize,
    max: usize,
    hint: &str,
) -> ConfigResult<()> {
    if value < min || value > max {
        return Err(ConfigError::range_with_hint(field, value, min, max, hint));
    }
    Ok(())
}

/// Check a string setting is not blank
pub fn check_non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Custom(format!("'{}' must not be empty", field)));
    }
    Ok(())
}
