//! Accessory calibration: coefficient computation and the calibration-print
//! splice plan.

pub mod compute;
pub mod measure;
pub mod splice;

pub use compute::{compute_calibration, CalibrationMeasurement};
pub use measure::{FilamentMeasurement, FilamentMeasurer};
pub use splice::{plan_calibration_splices, SpliceDocument, SpliceDocumentEncoder, SplicePoint};
