pub mod document;
pub mod limits;
pub mod paths;
pub mod reader;
pub mod registry;
pub mod store;
pub mod types;
pub mod validation;
pub mod writer;

pub use document::{export_document, import_document, ProfileDocument};
pub use limits::{default_limits, load_limits, ProfileLimits, MAX_EXTRUDER_COUNT};
pub use paths::ProfilePaths;
pub use registry::{ActiveSelection, ProfileRegistry};
pub use store::{JsonProfileStore, ProfileStore};
pub use types::{PrinterProfile, ProfileId};
pub use validation::validate_profile;
