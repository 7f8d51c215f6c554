//! Persisted user preferences.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Preferences kept between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    /// Width in pixels of the image previews shown by the editor.
    pub thumbnail_width: u32,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            thumbnail_width: 500,
        }
    }
}

impl Prefs {
    /// Load preferences, falling back to the defaults when the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(data) => serde_json::from_slice(&data).unwrap_or_else(|e| {
                log::warn!("ignoring malformed preferences {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("cannot read preferences {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
