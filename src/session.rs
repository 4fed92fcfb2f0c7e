//! Session state persisted between launcher runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::STATE_FILE;

/// State remembered across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Archive name of the card selected when the launcher last exited
    #[serde(rename = "lastSelected", default, skip_serializing_if = "Option::is_none")]
    pub last_selected: Option<String>,
}

impl SessionState {
    /// State file location for a given config file: next to it.
    pub fn path_for_config(config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(dir) => dir.join(STATE_FILE),
            None => PathBuf::from(STATE_FILE),
        }
    }

    /// Read the state file.
    ///
    /// A missing or unreadable file yields the default state.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No session state at {:?}", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(state) => {
                    log::debug!("Loaded session state from {:?}", path);
                    state
                }
                Err(e) => {
                    log::warn!("Failed to parse session state {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read session state {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Write the state file, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Saved session state to {:?}", path);
        Ok(())
    }
}

/// Errors that can occur when saving session state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to serialize session state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write session state: {0}")]
    IoError(#[from] std::io::Error),
}
