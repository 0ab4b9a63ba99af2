//! INI file configuration adapter.
//!
//! Typed getters are strict: an absent or blank key is `None`, anything
//! present must parse or the lookup fails with `ConfigInvalid`.

use crate::domain::error::GemtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn present(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn bool_value(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn invalid_value(section: &str, key: &str, reason: String) -> GemtraderError {
    GemtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, GemtraderError> {
        match self.present(section, key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid_value(section, key, format!("'{raw}' is not an integer"))),
        }
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, GemtraderError> {
        match self.present(section, key) {
            None => Ok(None),
            Some(raw) => bool_value(&raw).map(Some).ok_or_else(|| {
                invalid_value(
                    section,
                    key,
                    format!("'{raw}' is not a boolean (expected true/false, yes/no, on/off, 1/0)"),
                )
            }),
        }
    }
}
