//! Settings loading: defaults, then the TOML file, then flags/environment.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use vidqa_core::{Settings, validate_settings};

use crate::error::CliError;

/// Resolve effective settings. Later sources win field by field.
pub fn load_settings(path: Option<&Path>, overrides: &Settings) -> Result<Settings> {
    let mut settings = Settings::with_defaults();

    if let Some(path) = path {
        let text = fs::read_to_string(path)
            .map_err(CliError::from)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let file: Settings = toml::from_str(&text)
            .map_err(|e| CliError::Config(e.to_string()))
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded settings file");
        settings.merge(&file);
    }

    settings.merge(overrides);
    validate_settings(&settings).map_err(CliError::from)?;
    Ok(settings)
}
