//! Splice planning for the synthetic three-material calibration print.
//!
//! The plan is deterministic: the calibration model is split into two
//! equal halves (never shorter than the accessory's minimum splice), printed
//! after a priming piece long enough to reach the nozzle.

use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

use super::measure::FilamentMeasurement;
use crate::profile::limits::ProfileLimits;
use crate::profile::types::{PaletteType, PrinterProfile};

/// Number of materials the calibration print cycles through.
pub const CALIBRATION_MATERIALS: u8 = 3;

/// End of a filament segment: material `material_index` runs up to
/// `cumulative_length` mm from the start of the print.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplicePoint {
    pub material_index: u8,
    pub cumulative_length: f64,
}

/// Plan the calibration splice schedule.
///
/// Returns `[(0, first), (1, first + half), (2, first + 2 * half)]` where
/// `half = max(total_extrusion / 2, splice_min_length)`.
///
/// # Panics
/// Panics if `total_extrusion` is not a positive, finite length. Planning
/// without a real measurement is a caller bug.
pub fn plan_calibration_splices(
    total_extrusion: f64,
    min_first_piece_length: f64,
    splice_min_length: f64,
) -> Vec<SplicePoint> {
    assert!(
        total_extrusion.is_finite() && total_extrusion > 0.0,
        "splice planning requires a measured extrusion length, got {}",
        total_extrusion
    );

    let half = (total_extrusion / 2.0).max(splice_min_length);

    (0..CALIBRATION_MATERIALS)
        .map(|material_index| SplicePoint {
            material_index,
            cumulative_length: min_first_piece_length + material_index as f64 * half,
        })
        .collect()
}

/// Length of each segment in a plan, starting from zero.
pub fn segment_lengths(splices: &[SplicePoint]) -> Vec<f64> {
    let mut previous = 0.0;
    splices
        .iter()
        .map(|s| {
            let len = s.cumulative_length - previous;
            previous = s.cumulative_length;
            len
        })
        .collect()
}

/// Priming length before the first splice: the generation's base length
/// plus whatever sits in the bowden tube.
pub fn min_first_piece_length(profile: &PrinterProfile, limits: &ProfileLimits) -> f64 {
    limits
        .splice_constants(profile.palette_type)
        .first_piece_base_length
        + profile.bowden_tube.length()
}

/// One material slot in the calibration print.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpliceMaterial {
    pub material_index: u8,
    /// Accessory input drive, 1-based
    pub drive: u8,
    pub label: String,
}

/// Everything the external encoder needs to write the splice document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpliceDocument {
    pub profile_name: String,
    pub palette_type: PaletteType,
    pub splices: Vec<SplicePoint>,
    pub materials: Vec<SpliceMaterial>,
    pub total_length: f64,
    pub base_path: PathBuf,
    pub extension: String,
}

impl SpliceDocument {
    /// Plan the calibration print for `profile` from a completed measurement.
    ///
    /// # Panics
    /// Panics if the measurement reports no extrusion (see
    /// [`plan_calibration_splices`]).
    pub fn for_calibration(
        profile: &PrinterProfile,
        measurement: &FilamentMeasurement,
        limits: &ProfileLimits,
    ) -> Self {
        let constants = limits.splice_constants(profile.palette_type);
        let splices = plan_calibration_splices(
            measurement.total_extrusion_length,
            min_first_piece_length(profile, limits),
            constants.splice_min_length,
        );
        let total_length = splices.last().map(|s| s.cumulative_length).unwrap_or(0.0);
        let materials = (0..CALIBRATION_MATERIALS)
            .map(|i| SpliceMaterial {
                material_index: i,
                drive: i + 1,
                label: format!("Calibration {}", i + 1),
            })
            .collect();

        Self {
            profile_name: profile.profile_name.clone(),
            palette_type: profile.palette_type,
            splices,
            materials,
            total_length,
            base_path: measurement.base_path.clone(),
            extension: measurement.extension.clone(),
        }
    }

    /// Path the encoded document is written to: `<base_path>.<extension>`.
    pub fn output_path(&self) -> PathBuf {
        let mut path = OsString::from(self.base_path.as_os_str());
        path.push(".");
        path.push(&self.extension);
        PathBuf::from(path)
    }
}

/// Produces the on-disk splice document. The byte format belongs to the
/// implementor.
pub trait SpliceDocumentEncoder {
    fn encode(&self, document: &SpliceDocument) -> anyhow::Result<Vec<u8>>;
}
