// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{BundlewatchError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `[bundles].cwd` is non-empty
/// - `[bundles].output` is non-empty
///
/// It does **not** check that the directories exist yet; the descriptor
/// directory may legitimately be created after startup in watch mode.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.bundles.cwd.trim().is_empty() {
        return Err(BundlewatchError::ConfigError(
            "[bundles].cwd must not be empty".to_string(),
        ));
    }
    if cfg.bundles.output.trim().is_empty() {
        return Err(BundlewatchError::ConfigError(
            "[bundles].output must not be empty".to_string(),
        ));
    }
    Ok(())
}
