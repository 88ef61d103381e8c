use anyhow::Result;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::profile::types::PrinterProfile;

/// Result of measuring a sliced calibration model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilamentMeasurement {
    /// Total filament consumed by the model (mm)
    pub total_extrusion_length: f64,
    /// Input path without its extension, used to name derived outputs
    pub base_path: PathBuf,
    pub extension: String,
}

/// Measures filament consumption of a sliced file.
///
/// Parsing a print file can be slow, so the call is asynchronous. Failures
/// are returned to the caller untouched; no profile state depends on them.
pub trait FilamentMeasurer {
    fn measure(
        &self,
        path: &Path,
        profile: &PrinterProfile,
    ) -> impl Future<Output = Result<FilamentMeasurement>> + Send;
}
