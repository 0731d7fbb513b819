// src/config.rs

//! Configuration loading utilities.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load configuration from a TOML file, apply `CLASSROOM_*` environment
/// overrides and validate the result.
///
/// A missing or unreadable file falls back to defaults; invalid values do not.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load_or_default(path)
    } else {
        log::debug!("No config at {path:?}, using defaults");
        Config::default()
    }
    .with_env_overrides();

    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.quiz.default_passing_score, 75);
    }

    #[test]
    fn reads_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[quiz]\ndefault_passing_score = 60\n\n[storage]\nroot_dir = \"state\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.quiz.default_passing_score, 60);
        assert_eq!(config.storage.root_dir, "state");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[quiz]\ndefault_passing_score = 120").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
