//! TOML-backed sanity bounds for profile fields and calibration.
//!
//! Provides two loading methods:
//! - `default_limits()` - Loads the limits compiled into the binary
//! - `load_limits(path)` - Loads custom limits from a file path

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use super::types::PaletteType;

/// Hard ceiling on extruders per printer. Limits files may lower it, never raise it.
pub const MAX_EXTRUDER_COUNT: u8 = 5;

/// Default limits embedded in the binary at compile time.
/// These are loaded from `config/profile_limits.toml`.
const DEFAULT_LIMITS: &str = include_str!("../../config/profile_limits.toml");

/// Root configuration loaded from profile_limits.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileLimits {
    /// Upper bound for `extruder_count` (lower bound is always 1)
    pub max_extruder_count: u8,
    /// How long a filament measurement may run before it is abandoned
    pub measurement_timeout_secs: u64,
    pub calibration: CalibrationLimits,
    pub transitions: TransitionLimits,
    pub generations: GenerationLimits,
}

/// Bounds applied by the calibration computer.
#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationLimits {
    pub loading_offset_min: u32,
    pub loading_offset_max: u32,
    pub print_value_min_ratio: f64,
    pub print_value_max_ratio: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionLimits {
    pub target_position_min: f64,
    pub target_position_max: f64,
}

/// Planner constants per accessory generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationLimits {
    pub gen1: SpliceConstants,
    pub gen2: SpliceConstants,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SpliceConstants {
    /// Shortest segment the accessory can splice (mm)
    pub splice_min_length: f64,
    /// Priming length before the first splice, excluding any bowden tube (mm)
    pub first_piece_base_length: f64,
}

impl ProfileLimits {
    /// Planner constants for the generation of `palette_type`.
    pub fn splice_constants(&self, palette_type: PaletteType) -> SpliceConstants {
        if palette_type.generation() >= 2 {
            self.generations.gen2
        } else {
            self.generations.gen1
        }
    }

    pub fn measurement_timeout(&self) -> Duration {
        Duration::from_secs(self.measurement_timeout_secs)
    }
}

impl Default for ProfileLimits {
    fn default() -> Self {
        default_limits()
    }
}

/// Load limits from a TOML file at the given path.
///
/// # Returns
/// * `Ok(ProfileLimits)` - Parsed limits
/// * `Err` - If the file cannot be read or the TOML is invalid
pub fn load_limits(path: &Path) -> Result<ProfileLimits> {
    let content = std::fs::read_to_string(path)?;
    let mut limits: ProfileLimits = toml::from_str(&content)?;

    let capped = limits.max_extruder_count.clamp(1, MAX_EXTRUDER_COUNT);
    if capped != limits.max_extruder_count {
        warn!(
            "max_extruder_count {} in {:?} is outside 1-{}, using {}",
            limits.max_extruder_count, path, MAX_EXTRUDER_COUNT, capped
        );
        limits.max_extruder_count = capped;
    }
    Ok(limits)
}

/// Get the default limits embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_limits() -> ProfileLimits {
    toml::from_str(DEFAULT_LIMITS).expect("embedded profile_limits.toml must be valid TOML")
}
