/// Configuration module for the Proton Mail tray application.
///
/// The configuration is a small JSON object persisted to `config.json` in the
/// platform-specific config directory (~/.config/proton-mail-tray/ on Linux).
/// The only key the application itself cares about is `proton_mail_path`;
/// unknown keys found in the file are carried through a read-modify-write
/// untouched.
///
/// A missing or corrupt file is never an error: it reads as an empty
/// configuration, and a failed save is logged and otherwise ignored by
/// callers.
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persisted tray configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TrayConfig {
    /// Location of the Proton Mail Beta executable, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proton_mail_path: Option<PathBuf>,
    /// Keys we don't know about survive a rewrite of the file.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Get the application's config directory, creating it if needed.
/// Returns ~/.config/proton-mail-tray/ on Linux.
pub fn config_directory() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "proton-mail-tray")
        .ok_or_else(|| anyhow!("Failed to determine user config directory"))?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create config directory {}", config_dir.display()))?;

    Ok(config_dir.to_path_buf())
}

/// Default location of `config.json`.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_directory()?.join("config.json"))
}

/// Load the configuration from `path`.
/// Returns an empty configuration if the file doesn't exist or can't be parsed.
pub fn load_config(path: &Path) -> TrayConfig {
    if !path.exists() {
        return TrayConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unable to read config file");
            return TrayConfig::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config file is not valid JSON, ignoring it");
            TrayConfig::default()
        }
    }
}

/// Save the configuration to `path` as pretty-printed JSON.
pub fn save_config(path: &Path, config: &TrayConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, json)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}
