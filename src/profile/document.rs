//! Flat, serializable form of a printer profile.
//!
//! This is the field set exchanged with the import/export and persistence
//! collaborators. Unlike [`PrinterProfile`] it can express inconsistent
//! states (two bed shapes at once, a stored pulses-per-mm that disagrees with
//! its inputs), so every conversion into the typed model is validated.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use super::limits::ProfileLimits;
use super::registry::ProfileRegistry;
use super::types::*;
use super::validation::validate_profile;
use crate::error::{FieldGroup, FieldViolation, ValidationError};

pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Relative tolerance when comparing a stored pulses-per-mm to its inputs.
const PULSES_PER_MM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedShapeKind {
    Rectangular,
    Circular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    BottomLeft,
    Middle,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProfileId>,
    pub profile_name: String,
    pub palette_type: PaletteType,
    pub connection_mode: ConnectionMode,
    pub bed_shape: BedShapeKind,
    #[serde(default)]
    pub bed_x: f64,
    #[serde(default)]
    pub bed_y: f64,
    #[serde(default)]
    pub bed_diameter: f64,
    pub origin: OriginKind,
    /// Required for a custom origin; informational otherwise
    #[serde(default)]
    pub origin_offset_x: Option<f64>,
    #[serde(default)]
    pub origin_offset_y: Option<f64>,
    pub nozzle_diameter: f64,
    pub extruder_count: u8,
    /// `None` means ask on every print
    pub print_extruder: Option<u8>,
    pub engine: SlicerEngine,
    pub postprocessing: Postprocessing,
    pub volumetric: bool,
    pub independent_extruder_axes: bool,
    pub input_parsers: Vec<InputFormat>,
    /// `None` means the printer has no bowden tube
    pub bowden_tube_length: Option<f64>,
    pub firmware_purge: f64,
    pub transitions: TransitionDocument,
    #[serde(default)]
    pub calibration: Option<CalibrationDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDocument {
    pub transition_type: TransitionType,
    pub length_mode: TransitionLengthMode,
    pub purge_length: f64,
    pub min_purge_length: f64,
    pub initial_purge_length: f64,
    pub target_position: f64,
    pub use_infill_for_transition: bool,
    pub use_support_for_transition: bool,
    pub towers: TowerSettings,
    pub side_transitions: SideTransitionSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationDocument {
    pub loading_offset: u32,
    pub print_value: u32,
    pub calibration_gcode_length: f64,
    /// Informational copy for consumers; recomputed on import
    #[serde(default)]
    pub pulses_per_mm: Option<f64>,
}

impl ProfileDocument {
    /// Flatten a profile. Inactive bed fields are written as zero and
    /// derived origin offsets are written out for reference.
    pub fn from_profile(profile: &PrinterProfile) -> Self {
        let (bed_shape, bed_x, bed_y, bed_diameter) = match profile.print_bed.shape {
            BedShape::Rectangular { x, y } => (BedShapeKind::Rectangular, x, y, 0.0),
            BedShape::Circular { diameter } => (BedShapeKind::Circular, 0.0, 0.0, diameter),
        };
        let origin = match profile.print_bed.origin {
            BedOrigin::BottomLeft => OriginKind::BottomLeft,
            BedOrigin::Middle => OriginKind::Middle,
            BedOrigin::Custom { .. } => OriginKind::Custom,
        };
        let (origin_offset_x, origin_offset_y) = profile.print_bed.origin_offsets();
        let t = &profile.transition_settings;

        Self {
            format_version: DOCUMENT_FORMAT_VERSION,
            exported_at: None,
            id: Some(profile.id.clone()),
            profile_name: profile.profile_name.clone(),
            palette_type: profile.palette_type,
            connection_mode: profile.connection_mode,
            bed_shape,
            bed_x,
            bed_y,
            bed_diameter,
            origin,
            origin_offset_x: Some(origin_offset_x),
            origin_offset_y: Some(origin_offset_y),
            nozzle_diameter: profile.nozzle_diameter,
            extruder_count: profile.extruder_count,
            print_extruder: match profile.print_extruder {
                PrintExtruder::AlwaysAsk => None,
                PrintExtruder::Index(i) => Some(i),
            },
            engine: profile.engine,
            postprocessing: profile.postprocessing,
            volumetric: profile.volumetric,
            independent_extruder_axes: profile.independent_extruder_axes,
            input_parsers: profile.input_parsers.iter().copied().collect(),
            bowden_tube_length: match profile.bowden_tube {
                BowdenTube::None => None,
                BowdenTube::Length(mm) => Some(mm),
            },
            firmware_purge: profile.firmware_purge,
            transitions: TransitionDocument {
                transition_type: t.transition_type,
                length_mode: t.length_mode,
                purge_length: t.purge_length,
                min_purge_length: t.min_purge_length,
                initial_purge_length: t.initial_purge_length,
                target_position: t.target_position,
                use_infill_for_transition: t.use_infill_for_transition,
                use_support_for_transition: t.use_support_for_transition,
                towers: t.towers,
                side_transitions: t.side_transitions,
            },
            calibration: profile.calibration.map(|c| CalibrationDocument {
                loading_offset: c.loading_offset,
                print_value: c.print_value,
                calibration_gcode_length: c.calibration_gcode_length,
                pulses_per_mm: Some(c.pulses_per_mm()),
            }),
        }
    }

    /// Rebuild the typed profile, rejecting states the typed model cannot
    /// represent. Field-level invariants are left to [`validate_profile`].
    pub fn into_profile(self) -> Result<PrinterProfile, ValidationError> {
        let mut violations = Vec::new();

        let shape = match self.bed_shape {
            BedShapeKind::Rectangular => {
                if self.bed_diameter != 0.0 {
                    violations.push(FieldViolation::new(
                        FieldGroup::PrintBed,
                        "bed_diameter",
                        "A rectangular bed must not also define a diameter",
                    ));
                }
                BedShape::Rectangular { x: self.bed_x, y: self.bed_y }
            }
            BedShapeKind::Circular => {
                if self.bed_x != 0.0 || self.bed_y != 0.0 {
                    violations.push(FieldViolation::new(
                        FieldGroup::PrintBed,
                        "bed_x",
                        "A circular bed must not also define x/y dimensions",
                    ));
                }
                BedShape::Circular { diameter: self.bed_diameter }
            }
        };

        let origin = match (self.origin, self.origin_offset_x, self.origin_offset_y) {
            (OriginKind::BottomLeft, ..) => BedOrigin::BottomLeft,
            (OriginKind::Middle, ..) => BedOrigin::Middle,
            (OriginKind::Custom, Some(offset_x), Some(offset_y)) => {
                BedOrigin::Custom { offset_x, offset_y }
            }
            (OriginKind::Custom, ..) => {
                violations.push(FieldViolation::new(
                    FieldGroup::PrintBed,
                    "origin_offset",
                    "A custom origin must define both offsets",
                ));
                BedOrigin::Custom { offset_x: 0.0, offset_y: 0.0 }
            }
        };
        let print_bed = PrintBed { shape, origin };

        // Derived offsets may be omitted; when present they must agree.
        let (derived_x, derived_y) = print_bed.origin_offsets();
        let mismatch = |stored: Option<f64>, derived: f64| stored.is_some_and(|v| v != derived);
        if self.origin != OriginKind::Custom
            && (mismatch(self.origin_offset_x, derived_x) || mismatch(self.origin_offset_y, derived_y))
        {
            violations.push(FieldViolation::new(
                FieldGroup::PrintBed,
                "origin_offset",
                format!(
                    "Offsets ({:?}, {:?}) do not match the {:?} origin",
                    self.origin_offset_x, self.origin_offset_y, self.origin
                ),
            ));
        }

        let calibration = match self.calibration {
            Some(doc) => {
                let calibration = Calibration {
                    loading_offset: doc.loading_offset,
                    print_value: doc.print_value,
                    calibration_gcode_length: doc.calibration_gcode_length,
                };
                if let Some(stored) = doc.pulses_per_mm {
                    let derived = calibration.pulses_per_mm();
                    let tolerance = PULSES_PER_MM_TOLERANCE * derived.abs().max(1.0);
                    if !((stored - derived).abs() <= tolerance) {
                        violations.push(FieldViolation::new(
                            FieldGroup::Calibration,
                            "pulses_per_mm",
                            format!(
                                "Stored pulses/mm {} does not match print value / length ({})",
                                stored, derived
                            ),
                        ));
                    }
                }
                Some(calibration)
            }
            None => None,
        };

        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        let t = self.transitions;
        Ok(PrinterProfile {
            id: self.id.unwrap_or_else(ProfileId::generate),
            profile_name: self.profile_name,
            palette_type: self.palette_type,
            connection_mode: self.connection_mode,
            print_bed,
            nozzle_diameter: self.nozzle_diameter,
            extruder_count: self.extruder_count,
            print_extruder: self
                .print_extruder
                .map_or(PrintExtruder::AlwaysAsk, PrintExtruder::Index),
            engine: self.engine,
            postprocessing: self.postprocessing,
            volumetric: self.volumetric,
            independent_extruder_axes: self.independent_extruder_axes,
            input_parsers: self.input_parsers.into_iter().collect(),
            bowden_tube: self
                .bowden_tube_length
                .map_or(BowdenTube::None, BowdenTube::Length),
            firmware_purge: self.firmware_purge,
            transition_settings: TransitionSettings {
                transition_type: t.transition_type,
                length_mode: t.length_mode,
                purge_length: t.purge_length,
                min_purge_length: t.min_purge_length,
                initial_purge_length: t.initial_purge_length,
                target_position: t.target_position,
                use_infill_for_transition: t.use_infill_for_transition,
                use_support_for_transition: t.use_support_for_transition,
                towers: t.towers,
                side_transitions: t.side_transitions,
            },
            calibration,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize with 4-space indentation and a trailing newline.
    pub fn to_json_4space(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        let mut s = String::from_utf8(buf)?;
        if !s.ends_with('\n') {
            s.push('\n');
        }
        Ok(s)
    }
}

/// Produce an export document stamped with the current time.
pub fn export_document(profile: &PrinterProfile) -> ProfileDocument {
    ProfileDocument {
        exported_at: Some(Utc::now()),
        ..ProfileDocument::from_profile(profile)
    }
}

/// Accept an imported document as a new profile.
///
/// The document must satisfy every invariant, including a name that is
/// free in `registry`. The profile gets a fresh id so re-importing an
/// exported profile never aliases the original.
pub fn import_document(
    document: ProfileDocument,
    registry: &ProfileRegistry,
    limits: &ProfileLimits,
) -> Result<PrinterProfile, ValidationError> {
    let mut profile = document.into_profile()?;
    profile.id = ProfileId::generate();

    let mut violations = validate_profile(&profile, limits);
    if !profile.profile_name.trim().is_empty()
        && !registry.is_name_available(&profile.profile_name, None)
    {
        violations.push(FieldViolation::new(
            FieldGroup::Identity,
            "profile_name",
            format!("A profile named '{}' already exists", profile.profile_name),
        ));
    }

    if !violations.is_empty() {
        debug!(
            "Rejected imported profile {:?}: {} violation(s)",
            profile.profile_name,
            violations.len()
        );
        return Err(ValidationError { violations });
    }

    debug!("Accepted imported profile {:?}", profile.profile_name);
    Ok(profile)
}
