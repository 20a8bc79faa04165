//! Which surface the app shell shows, persisted across runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    #[serde(rename = "whatsapp")]
    WhatsApp,
    #[serde(rename = "chatgpt")]
    ChatGpt,
}

impl ViewMode {
    pub fn flipped(self) -> Self {
        match self {
            Self::WhatsApp => Self::ChatGpt,
            Self::ChatGpt => Self::WhatsApp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhatsApp => "whatsapp",
            Self::ChatGpt => "chatgpt",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Self::WhatsApp),
            "chatgpt" => Ok(Self::ChatGpt),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    view_mode: ViewMode,
}

/// View mode backed by a JSON file.
#[derive(Debug)]
pub struct ViewModeStore {
    path: PathBuf,
    mode: ViewMode,
}

impl ViewModeStore {
    /// Load from `path`; a missing file yields the default mode.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ViewError> {
        let path = path.into();
        let mode = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str::<PersistedState>(&content)?.view_mode
        } else {
            debug!("No view state at {}, using default", path.display());
            ViewMode::default()
        };
        Ok(Self { path, mode })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set(&mut self, mode: ViewMode) -> Result<(), ViewError> {
        self.mode = mode;
        self.save()
    }

    pub fn flip(&mut self) -> Result<ViewMode, ViewError> {
        self.set(self.mode.flipped())?;
        Ok(self.mode)
    }

    pub fn save(&self) -> Result<(), ViewError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let state = PersistedState {
            view_mode: self.mode,
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }
}
