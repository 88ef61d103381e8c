//! Conversion of raw calibration-print measurements into coefficients.

use tracing::{debug, warn};

use crate::error::CalibrationError;
use crate::profile::limits::CalibrationLimits;
use crate::profile::types::Calibration;

/// Raw values collected during a calibration print.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationMeasurement {
    pub loading_offset: u32,
    pub print_value: u32,
    /// Filament length of the calibration model (mm), from the measurer
    pub calibration_gcode_length: f64,
}

/// Accepted `print_value` range for a given model length.
///
/// Outside this window the implied transport ratio is mechanically
/// implausible, so the measurement has to be repeated.
pub fn print_value_range(calibration_gcode_length: f64, limits: &CalibrationLimits) -> (f64, f64) {
    (
        limits.print_value_min_ratio * calibration_gcode_length,
        limits.print_value_max_ratio * calibration_gcode_length,
    )
}

/// Check raw calibration values against the sanity bounds.
///
/// Assumes `calibration_gcode_length > 0`.
pub fn check_bounds(
    loading_offset: u32,
    print_value: u32,
    calibration_gcode_length: f64,
    limits: &CalibrationLimits,
) -> Result<(), CalibrationError> {
    if loading_offset < limits.loading_offset_min || loading_offset > limits.loading_offset_max {
        return Err(CalibrationError::OutOfRange {
            field: "loading_offset",
            value: loading_offset as f64,
            min: limits.loading_offset_min as f64,
            max: limits.loading_offset_max as f64,
        });
    }

    let (min, max) = print_value_range(calibration_gcode_length, limits);
    let value = print_value as f64;
    if value < min || value > max {
        return Err(CalibrationError::OutOfRange {
            field: "print_value",
            value,
            min,
            max,
        });
    }

    Ok(())
}

/// Validate a measurement and derive its calibration.
///
/// # Panics
/// Panics if `calibration_gcode_length` is not positive. A zero length means
/// the model was never measured; callers must gate on a measurement first.
pub fn compute_calibration(
    measurement: &CalibrationMeasurement,
    limits: &CalibrationLimits,
) -> Result<Calibration, CalibrationError> {
    assert!(
        measurement.calibration_gcode_length > 0.0,
        "calibration requires a measured model length, got {}",
        measurement.calibration_gcode_length
    );

    if let Err(e) = check_bounds(
        measurement.loading_offset,
        measurement.print_value,
        measurement.calibration_gcode_length,
        limits,
    ) {
        warn!("Rejected calibration measurement: {}", e);
        return Err(e);
    }

    let calibration = Calibration {
        loading_offset: measurement.loading_offset,
        print_value: measurement.print_value,
        calibration_gcode_length: measurement.calibration_gcode_length,
    };
    debug!(
        "Computed calibration: {} pulses over {}mm = {:.3} pulses/mm",
        calibration.print_value,
        calibration.calibration_gcode_length,
        calibration.pulses_per_mm()
    );
    Ok(calibration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::limits::default_limits;

    fn measurement(print_value: u32) -> CalibrationMeasurement {
        CalibrationMeasurement {
            loading_offset: 15000,
            print_value,
            calibration_gcode_length: 100.0,
        }
    }

    #[test]
    fn test_pulses_per_mm_arithmetic() {
        let limits = default_limits().calibration;
        let cal = compute_calibration(&measurement(3000), &limits).unwrap();
        assert_eq!(cal.pulses_per_mm(), 30.0);
    }

    #[test]
    fn test_print_value_lower_bound() {
        let limits = default_limits().calibration;
        let err = compute_calibration(&measurement(1999), &limits).unwrap_err();
        assert!(matches!(err, CalibrationError::OutOfRange { field: "print_value", .. }));

        let cal = compute_calibration(&measurement(2000), &limits).unwrap();
        assert_eq!(cal.pulses_per_mm(), 20.0);
    }

    #[test]
    fn test_print_value_upper_bound() {
        let limits = default_limits().calibration;
        let err = compute_calibration(&measurement(4001), &limits).unwrap_err();
        assert!(matches!(err, CalibrationError::OutOfRange { field: "print_value", .. }));

        let cal = compute_calibration(&measurement(4000), &limits).unwrap();
        assert_eq!(cal.pulses_per_mm(), 40.0);
    }

    #[test]
    fn test_loading_offset_bounds() {
        let limits = default_limits().calibration;
        for (offset, ok) in [(1999, false), (2000, true), (90000, true), (90001, false)] {
            let m = CalibrationMeasurement {
                loading_offset: offset,
                ..measurement(3000)
            };
            assert_eq!(compute_calibration(&m, &limits).is_ok(), ok, "offset {}", offset);
        }
    }

    #[test]
    fn test_out_of_range_reports_bounds() {
        let limits = default_limits().calibration;
        match compute_calibration(&measurement(5000), &limits) {
            Err(CalibrationError::OutOfRange { value, min, max, .. }) => {
                assert_eq!(value, 5000.0);
                assert_eq!(min, 2000.0);
                assert_eq!(max, 4000.0);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    #[should_panic(expected = "measured model length")]
    fn test_unmeasured_length_is_a_precondition_violation() {
        let limits = default_limits().calibration;
        let m = CalibrationMeasurement {
            calibration_gcode_length: 0.0,
            ..measurement(3000)
        };
        let _ = compute_calibration(&m, &limits);
    }
}
