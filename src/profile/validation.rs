use crate::calibration::compute::check_bounds;
use crate::error::{CalibrationError, FieldGroup, FieldViolation};

use super::limits::ProfileLimits;
use super::types::{BedOrigin, BedShape, BowdenTube, PrintExtruder, PrinterProfile, TransitionLengthMode};

/// Check a profile against every field-level invariant.
///
/// Name uniqueness needs the registry and is checked there; everything else
/// is covered here. Returns an empty list for a consistent profile.
pub fn validate_profile(profile: &PrinterProfile, limits: &ProfileLimits) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if profile.profile_name.trim().is_empty() {
        violations.push(FieldViolation::new(
            FieldGroup::Identity,
            "profile_name",
            "Profile name must not be empty",
        ));
    }

    validate_hardware(profile, limits, &mut violations);
    validate_print_bed(profile, &mut violations);
    validate_firmware(profile, &mut violations);
    validate_transitions(profile, limits, &mut violations);
    validate_calibration(profile, limits, &mut violations);

    violations
}

fn validate_hardware(profile: &PrinterProfile, limits: &ProfileLimits, out: &mut Vec<FieldViolation>) {
    if !profile.connection_mode.supported_by(profile.palette_type) {
        out.push(FieldViolation::new(
            FieldGroup::Hardware,
            "connection_mode",
            format!(
                "{:?} connection requires a generation 2 accessory",
                profile.connection_mode
            ),
        ));
    }

    if !(profile.nozzle_diameter.is_finite() && profile.nozzle_diameter > 0.0) {
        out.push(FieldViolation::new(
            FieldGroup::Hardware,
            "nozzle_diameter",
            format!("Nozzle diameter {}mm must be positive", profile.nozzle_diameter),
        ));
    }

    if profile.extruder_count < 1 || profile.extruder_count > limits.max_extruder_count {
        out.push(FieldViolation::new(
            FieldGroup::Hardware,
            "extruder_count",
            format!(
                "Extruder count {} out of range (1-{})",
                profile.extruder_count, limits.max_extruder_count
            ),
        ));
    }

    if let PrintExtruder::Index(index) = profile.print_extruder {
        if index >= profile.extruder_count {
            out.push(FieldViolation::new(
                FieldGroup::Hardware,
                "print_extruder",
                format!(
                    "Print extruder {} does not exist on a {}-extruder printer",
                    index, profile.extruder_count
                ),
            ));
        }
    }

    if profile.independent_extruder_axes && profile.extruder_count < 2 {
        out.push(FieldViolation::new(
            FieldGroup::Hardware,
            "independent_extruder_axes",
            "Independent extruder axes require at least two extruders",
        ));
    }
}

fn validate_print_bed(profile: &PrinterProfile, out: &mut Vec<FieldViolation>) {
    let positive = |v: f64| v.is_finite() && v > 0.0;

    match profile.print_bed.shape {
        BedShape::Rectangular { x, y } => {
            if !positive(x) {
                out.push(FieldViolation::new(
                    FieldGroup::PrintBed,
                    "bed_x",
                    format!("Bed width {}mm must be positive", x),
                ));
            }
            if !positive(y) {
                out.push(FieldViolation::new(
                    FieldGroup::PrintBed,
                    "bed_y",
                    format!("Bed depth {}mm must be positive", y),
                ));
            }
        }
        BedShape::Circular { diameter } => {
            if !positive(diameter) {
                out.push(FieldViolation::new(
                    FieldGroup::PrintBed,
                    "bed_diameter",
                    format!("Bed diameter {}mm must be positive", diameter),
                ));
            }
        }
    }

    if let BedOrigin::Custom { offset_x, offset_y } = profile.print_bed.origin {
        if !offset_x.is_finite() || !offset_y.is_finite() {
            out.push(FieldViolation::new(
                FieldGroup::PrintBed,
                "origin_offset",
                "Custom origin offsets must be finite numbers",
            ));
        }
    }
}

fn validate_firmware(profile: &PrinterProfile, out: &mut Vec<FieldViolation>) {
    if profile.input_parsers.is_empty() {
        out.push(FieldViolation::new(
            FieldGroup::Firmware,
            "input_parsers",
            "At least one input format must be accepted",
        ));
    }

    if let BowdenTube::Length(mm) = profile.bowden_tube {
        if !(mm.is_finite() && mm > 0.0) {
            out.push(FieldViolation::new(
                FieldGroup::Firmware,
                "bowden_tube",
                format!("Bowden tube length {}mm must be positive", mm),
            ));
        }
    }

    if !(profile.firmware_purge.is_finite() && profile.firmware_purge >= 0.0) {
        out.push(FieldViolation::new(
            FieldGroup::Firmware,
            "firmware_purge",
            format!("Firmware purge {}mm must not be negative", profile.firmware_purge),
        ));
    }
}

fn validate_transitions(profile: &PrinterProfile, limits: &ProfileLimits, out: &mut Vec<FieldViolation>) {
    let t = &profile.transition_settings;

    if !(t.min_purge_length <= t.purge_length && t.purge_length <= t.initial_purge_length) {
        out.push(FieldViolation::new(
            FieldGroup::Transitions,
            "purge_length",
            format!(
                "Purge lengths must satisfy min ({}) <= normal ({}) <= initial ({})",
                t.min_purge_length, t.purge_length, t.initial_purge_length
            ),
        ));
    } else if t.length_mode == TransitionLengthMode::Simple
        && !(t.min_purge_length == t.purge_length && t.purge_length == t.initial_purge_length)
    {
        out.push(FieldViolation::new(
            FieldGroup::Transitions,
            "purge_length",
            "Simple transition mode requires identical purge lengths",
        ));
    }

    if t.min_purge_length < 0.0 {
        out.push(FieldViolation::new(
            FieldGroup::Transitions,
            "min_purge_length",
            format!("Minimum purge length {}mm must not be negative", t.min_purge_length),
        ));
    }

    let (lo, hi) = (
        limits.transitions.target_position_min,
        limits.transitions.target_position_max,
    );
    if !(t.target_position >= lo && t.target_position <= hi) {
        out.push(FieldViolation::new(
            FieldGroup::Transitions,
            "target_position",
            format!("Target position {} out of range ({}-{})", t.target_position, lo, hi),
        ));
    }

    let towers = &t.towers;
    if !(towers.min_density <= towers.min_first_layer_density
        && towers.min_first_layer_density <= towers.max_density)
    {
        out.push(FieldViolation::new(
            FieldGroup::Towers,
            "min_first_layer_density",
            format!(
                "Tower densities must satisfy min ({}) <= first layer ({}) <= max ({})",
                towers.min_density, towers.min_first_layer_density, towers.max_density
            ),
        ));
    }
    if towers.min_density < 0.0 || towers.max_density > 100.0 {
        out.push(FieldViolation::new(
            FieldGroup::Towers,
            "max_density",
            "Tower densities must lie within 0-100%",
        ));
    }
    if !(towers.max_speed.is_finite() && towers.max_speed > 0.0) {
        out.push(FieldViolation::new(
            FieldGroup::Towers,
            "max_speed",
            format!("Tower speed {}mm/s must be positive", towers.max_speed),
        ));
    }

    let side = &t.side_transitions;
    if !(side.purge_speed.is_finite() && side.purge_speed > 0.0) {
        out.push(FieldViolation::new(
            FieldGroup::SideTransitions,
            "purge_speed",
            format!("Side purge speed {}mm/min must be positive", side.purge_speed),
        ));
    }
}

fn validate_calibration(profile: &PrinterProfile, limits: &ProfileLimits, out: &mut Vec<FieldViolation>) {
    let Some(cal) = profile.calibration else {
        return;
    };

    if !(cal.calibration_gcode_length.is_finite() && cal.calibration_gcode_length > 0.0) {
        out.push(FieldViolation::new(
            FieldGroup::Calibration,
            "calibration_gcode_length",
            "Calibration model length has not been measured",
        ));
        return;
    }

    if let Err(e) = check_bounds(
        cal.loading_offset,
        cal.print_value,
        cal.calibration_gcode_length,
        &limits.calibration,
    ) {
        let CalibrationError::OutOfRange { field, .. } = e;
        out.push(FieldViolation::new(FieldGroup::Calibration, field, e.to_string()));
    }
}
