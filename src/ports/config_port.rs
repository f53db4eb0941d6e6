//! Configuration access port.

use crate::domain::error::TraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Like `get_double`, but a present value that does not parse is an error
    /// instead of silently falling back.
    fn require_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TraderError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| TraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected a number, got {raw:?}"),
            }),
        }
    }

    fn require_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TraderError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| TraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected an integer, got {raw:?}"),
            }),
        }
    }

    fn require_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TraderError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(TraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected a boolean, got {raw:?}"),
            }),
        }
    }
}
