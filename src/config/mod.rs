//! Configuration module for AppSearch-RS
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::path::Path;

/// Global settings instance
static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Initialize global settings from a file, applying environment overrides
pub fn init_from_file<P: AsRef<Path>>(path: P) -> Result<&'static Settings> {
    let mut settings = Settings::from_file(path)?;
    settings.merge_env();
    init(settings)
}

/// Initialize global settings with an already built value
pub fn init(settings: Settings) -> Result<&'static Settings> {
    SETTINGS
        .set(settings)
        .map_err(|_| Error::Config("settings already initialized".to_string()))?;
    SETTINGS
        .get()
        .ok_or_else(|| Error::Config("settings not initialized".to_string()))
}

/// Get a reference to the global settings
pub fn get() -> Option<&'static Settings> {
    SETTINGS.get()
}

/// Check if settings have been initialized
pub fn is_initialized() -> bool {
    SETTINGS.get().is_some()
}
