use anyhow::Result;
use tracing::{debug, info, warn};

use super::store::ProfileStore;
use super::types::{ProfileId, PrinterProfile};
use crate::error::RegistryError;

/// What happened to the active-profile pointer after a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSelection {
    /// The removed profile was not active; nothing changed.
    Unchanged,
    /// The active profile moved to this one.
    Reselected(ProfileId),
    /// No profiles remain. First-run setup has to create one.
    NeedsSetup,
}

/// Ordered list of known printer profiles plus the active-profile pointer.
///
/// Names are unique case-insensitively. List order is insertion order and
/// drives re-selection after a removal.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<PrinterProfile>,
    active: Option<ProfileId>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a registry from the persistence collaborator.
    ///
    /// Profiles are registered in name order (ties broken by id), so when
    /// two stored names collide the same one is kept on every load. The
    /// other is skipped with a warning. The first profile becomes active.
    pub fn load(store: &impl ProfileStore) -> Result<Self> {
        let mut stored = store.list()?;
        stored.sort_by(|a, b| {
            a.profile_name
                .cmp(&b.profile_name)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });

        let mut registry = Self::new();
        for profile in stored {
            let kept = registry
                .find_by_name(&profile.profile_name)
                .map(|p| format!("{:?} ({})", p.profile_name, p.id));
            let skipped = format!("{:?} ({})", profile.profile_name, profile.id);
            if let Err(e) = registry.add(profile) {
                match kept {
                    Some(kept) => warn!("Skipping stored profile {}: name collides with {}", skipped, kept),
                    None => warn!("Skipping stored profile {}: {}", skipped, e),
                }
            }
        }
        info!("Loaded {} printer profiles", registry.len());
        Ok(registry)
    }

    /// Case-insensitive name check, ignoring the profile `excluding` (if any).
    pub fn is_name_available(&self, name: &str, excluding: Option<&ProfileId>) -> bool {
        !self
            .profiles
            .iter()
            .filter(|p| Some(&p.id) != excluding)
            .any(|p| same_name(&p.profile_name, name))
    }

    fn check_name(&self, name: &str, excluding: Option<&ProfileId>) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if !self.is_name_available(name, excluding) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Insert a new profile. The first profile added becomes active.
    pub fn add(&mut self, profile: PrinterProfile) -> Result<(), RegistryError> {
        self.check_name(&profile.profile_name, None)?;
        debug!("Registering profile {:?} ({})", profile.profile_name, profile.id);
        if self.active.is_none() {
            self.active = Some(profile.id.clone());
        }
        self.profiles.push(profile);
        Ok(())
    }

    /// Insert or replace by id, with the uniqueness check in the same step.
    ///
    /// A replaced profile keeps its list position.
    pub fn upsert(&mut self, profile: PrinterProfile) -> Result<(), RegistryError> {
        self.check_name(&profile.profile_name, Some(&profile.id))?;
        match self.position(&profile.id) {
            Some(index) => {
                debug!("Replacing profile {:?} ({})", profile.profile_name, profile.id);
                self.profiles[index] = profile;
                Ok(())
            }
            None => self.add(profile),
        }
    }

    /// Remove a profile, re-selecting the active one if needed.
    pub fn remove(&mut self, id: &ProfileId) -> Result<(PrinterProfile, ActiveSelection), RegistryError> {
        let index = self
            .position(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let removed = self.profiles.remove(index);

        let selection = if self.active.as_ref() != Some(id) {
            ActiveSelection::Unchanged
        } else if self.profiles.is_empty() {
            self.active = None;
            ActiveSelection::NeedsSetup
        } else {
            // The next profile slid into `index`; fall back to the new last one.
            let next = self.profiles[index.min(self.profiles.len() - 1)].id.clone();
            self.active = Some(next.clone());
            ActiveSelection::Reselected(next)
        };

        info!("Removed profile {:?} ({})", removed.profile_name, removed.id);
        Ok((removed, selection))
    }

    pub fn rename(&mut self, id: &ProfileId, new_name: &str) -> Result<(), RegistryError> {
        self.check_name(new_name, Some(id))?;
        let index = self
            .position(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let profile = &mut self.profiles[index];
        debug!("Renaming profile {:?} to {:?}", profile.profile_name, new_name);
        profile.profile_name = new_name.to_string();
        Ok(())
    }

    /// First free name of the form `base`, `base (2)`, `base (3)`, ...
    pub fn unique_name(&self, base: &str) -> String {
        let base = base.trim();
        if self.is_name_available(base, None) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{} ({})", base, n))
            .find(|candidate| self.is_name_available(candidate, None))
            .unwrap_or_else(|| base.to_string())
    }

    /// Copy a profile under a fresh id and a unique derived name.
    pub fn duplicate(&mut self, id: &ProfileId) -> Result<ProfileId, RegistryError> {
        let source = self.get(id).ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let mut copy = source.clone();
        copy.id = ProfileId::generate();
        copy.profile_name = self.unique_name(&source.profile_name);
        let new_id = copy.id.clone();
        self.add(copy)?;
        Ok(new_id)
    }

    pub fn get(&self, id: &ProfileId) -> Option<&PrinterProfile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PrinterProfile> {
        self.profiles.iter().find(|p| same_name(&p.profile_name, name))
    }

    pub fn list(&self) -> &[PrinterProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn active(&self) -> Option<&PrinterProfile> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    pub fn set_active(&mut self, id: &ProfileId) -> Result<(), RegistryError> {
        if self.position(id).is_none() {
            return Err(RegistryError::NotFound(id.clone()));
        }
        self.active = Some(id.clone());
        Ok(())
    }

    fn position(&self, id: &ProfileId) -> Option<usize> {
        self.profiles.iter().position(|p| &p.id == id)
    }
}
