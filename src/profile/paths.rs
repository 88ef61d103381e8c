use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::ProfileId;

/// Directory name under the platform data dir.
const APP_DIR_NAME: &str = "PaletteProfiles";

/// Resolved locations of the on-disk profile store.
#[derive(Debug, Clone)]
pub struct ProfilePaths {
    /// Application data root (e.g., ~/.local/share/PaletteProfiles/)
    pub data_root: PathBuf,
    /// One `<id>.json` document per printer profile
    pub profiles_dir: PathBuf,
}

impl ProfilePaths {
    /// Detect the platform data directory.
    ///
    /// Tries `dirs::data_dir()` first, then a dot-directory in the home dir.
    pub fn detect() -> Result<Self> {
        if let Some(data_dir) = dirs::data_dir() {
            let root = data_dir.join(APP_DIR_NAME);
            debug!("Using profile data root {:?} (via dirs::data_dir)", root);
            return Ok(Self::with_root(root));
        }

        if let Some(home) = dirs::home_dir() {
            let root = home.join(".palette-profiles");
            debug!("Using profile data root {:?} (via home_dir fallback)", root);
            return Ok(Self::with_root(root));
        }

        bail!("No data directory available for printer profiles")
    }

    /// Paths rooted at an explicit directory.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let data_root = root.as_ref().to_path_buf();
        let profiles_dir = data_root.join("printers");
        Self {
            data_root,
            profiles_dir,
        }
    }

    pub fn profile_path(&self, id: &ProfileId) -> PathBuf {
        self.profiles_dir.join(format!("{}.json", id))
    }
}
