use anyhow::Result;
use std::path::Path;
use tracing::debug;

use super::document::ProfileDocument;
use super::types::PrinterProfile;

/// Read a printer profile document from disk.
///
/// Structural problems (two bed shapes, inconsistent derived values) are
/// reported as errors; field-level invariants are not checked here.
pub fn read_profile(path: &Path) -> Result<PrinterProfile> {
    let content = std::fs::read_to_string(path)?;
    let document = ProfileDocument::from_json(&content)?;
    let profile = document.into_profile()?;

    debug!(
        "Read profile {:?} ({}) from {:?}",
        profile.profile_name, profile.id, path
    );

    Ok(profile)
}
