use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::profile::types::ProfileId;

/// Logical group of profile fields a violation belongs to.
///
/// Callers use it to route the user to the right part of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Identity,
    Hardware,
    PrintBed,
    Firmware,
    Transitions,
    Towers,
    SideTransitions,
    Calibration,
}

/// A single invariant violation on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub group: FieldGroup,
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(group: FieldGroup, field: &str, message: impl Into<String>) -> Self {
        Self {
            group,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Field-scoped, non-fatal: the profile stays editable.
#[derive(Debug, Clone, Error)]
#[error("profile failed validation with {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// First field group needing attention.
    pub fn first_group(&self) -> Option<FieldGroup> {
        self.violations.first().map(|v| v.group)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("A profile named '{0}' already exists")]
    DuplicateName(String),

    #[error("Profile name must not be empty")]
    EmptyName,

    #[error("Profile not found: {0}")]
    NotFound(ProfileId),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("{field} value {value} is outside the plausible range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A calibration measurement is already in progress")]
    MeasurementInProgress,

    #[error("Measurement ticket does not match the pending measurement")]
    StaleTicket,

    #[error("No filament measurement is available for calibration")]
    NotMeasured,

    #[error("Session has already been committed")]
    Closed,

    #[error("Measurement failed: {0}")]
    Measurement(#[source] anyhow::Error),

    #[error("Persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("Profile registry lock was poisoned")]
    RegistryPoisoned,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
