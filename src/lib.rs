//! Printer profile parameter model for a filament-splicing accessory.
//!
//! - [`profile`]: the typed profile, its registry, validation and storage
//! - [`constraints`]: propagation rules that keep coupled fields consistent
//! - [`calibration`]: coefficient computation and calibration splice planning
//! - [`session`]: edit transactions with commit/discard semantics

pub mod calibration;
pub mod constraints;
pub mod error;
pub mod profile;
pub mod session;

pub use error::{
    CalibrationError, FieldGroup, FieldViolation, RegistryError, SessionError, ValidationError,
};
pub use profile::{PrinterProfile, ProfileId, ProfileRegistry};
pub use session::{FieldEdit, ProfileEditSession};

/// Install the default `tracing` subscriber.
///
/// Honors `RUST_LOG`, falling back to `info`. Safe to call more than once;
/// later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
