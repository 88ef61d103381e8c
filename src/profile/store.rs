use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::paths::ProfilePaths;
use super::reader::read_profile;
use super::types::{ProfileId, PrinterProfile};
use super::writer::write_profile_atomic;

/// Durable storage for printer profiles.
///
/// All calls are synchronous. Callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait ProfileStore {
    fn save(&self, profile: &PrinterProfile) -> Result<()>;
    fn delete(&self, id: &ProfileId) -> Result<()>;
    fn list(&self) -> Result<Vec<PrinterProfile>>;
}

/// One JSON document per profile, named by profile id.
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    paths: ProfilePaths,
}

impl JsonProfileStore {
    pub fn new(paths: ProfilePaths) -> Self {
        Self { paths }
    }

    /// Store rooted in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(ProfilePaths::detect()?))
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.paths.profiles_dir
    }

    pub fn profile_path(&self, id: &ProfileId) -> PathBuf {
        self.paths.profile_path(id)
    }
}

impl ProfileStore for JsonProfileStore {
    fn save(&self, profile: &PrinterProfile) -> Result<()> {
        write_profile_atomic(profile, &self.profile_path(&profile.id))
    }

    fn delete(&self, id: &ProfileId) -> Result<()> {
        let path = self.profile_path(id);
        if !path.exists() {
            debug!("Profile {} has no stored document, nothing to delete", id);
            return Ok(());
        }
        std::fs::remove_file(&path)?;
        info!("Deleted profile document {:?}", path);
        Ok(())
    }

    /// Scan the profile directory. Unreadable documents are skipped with a
    /// warning so one bad file cannot hide every other profile.
    fn list(&self) -> Result<Vec<PrinterProfile>> {
        let dir = self.profiles_dir();
        if !dir.exists() {
            info!("Profile directory {:?} does not exist yet, no profiles", dir);
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        entries.sort();

        let mut profiles = Vec::new();
        for path in entries {
            match read_profile(&path) {
                Ok(profile) => profiles.push(profile),
                Err(e) => warn!("Skipping unreadable profile {:?}: {}", path, e),
            }
        }
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(ProfilePaths::with_root(tmp.path().join("absent")));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(ProfilePaths::with_root(tmp.path()));
        store.delete(&ProfileId::from("Pnothing")).unwrap();
    }
}
