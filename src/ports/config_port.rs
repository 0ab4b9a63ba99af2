//! Configuration access port trait.

use crate::domain::error::GemtraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent or blank; a value that is not an
    /// integer is a `ConfigInvalid` error.
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, GemtraderError>;

    /// `Ok(None)` when the key is absent or blank; a value that is not a
    /// recognised boolean is a `ConfigInvalid` error.
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, GemtraderError>;

    /// Like `get_string`, but a missing or blank value is a `ConfigMissing` error.
    fn require_string(&self, section: &str, key: &str) -> Result<String, GemtraderError> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GemtraderError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}
