use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable storage key for a printer profile.
///
/// Independent of the display name, so renames never move files around.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Generate a random id in the format "P" + 7 hex chars.
    pub fn generate() -> Self {
        let bytes: [u8; 4] = rand::random();
        Self(format!("P{:07x}", u32::from_be_bytes(bytes) & 0x0FFF_FFFF))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splicing accessory model the profile is set up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteType {
    Palette,
    PalettePlus,
    Palette2,
    Palette2Pro,
}

impl PaletteType {
    /// Hardware generation (1 or 2).
    pub fn generation(self) -> u8 {
        match self {
            PaletteType::Palette | PaletteType::PalettePlus => 1,
            PaletteType::Palette2 | PaletteType::Palette2Pro => 2,
        }
    }
}

/// How the accessory talks to the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Standalone; the user starts the print by hand
    Accessory,
    /// Controlled through an external print server
    Connected,
    /// Firmware-level integration (generation 2 and later only)
    Integrated,
}

impl ConnectionMode {
    pub fn supported_by(self, palette_type: PaletteType) -> bool {
        match self {
            ConnectionMode::Integrated => palette_type.generation() >= 2,
            _ => true,
        }
    }
}

/// Physical shape of the print bed. Only one variant's dimensions exist at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BedShape {
    Rectangular { x: f64, y: f64 },
    Circular { diameter: f64 },
}

impl BedShape {
    /// Extent of the bed along each axis (mm).
    pub fn extents(&self) -> (f64, f64) {
        match *self {
            BedShape::Rectangular { x, y } => (x, y),
            BedShape::Circular { diameter } => (diameter, diameter),
        }
    }
}

/// Where the printer's coordinate origin sits on the bed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BedOrigin {
    BottomLeft,
    Middle,
    Custom { offset_x: f64, offset_y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintBed {
    pub shape: BedShape,
    pub origin: BedOrigin,
}

impl PrintBed {
    /// Origin offsets (x, y) in mm. Derived for every origin except `Custom`.
    pub fn origin_offsets(&self) -> (f64, f64) {
        match self.origin {
            BedOrigin::BottomLeft => (0.0, 0.0),
            BedOrigin::Middle => {
                let (x, y) = self.shape.extents();
                (x / 2.0, y / 2.0)
            }
            BedOrigin::Custom { offset_x, offset_y } => (offset_x, offset_y),
        }
    }
}

/// Extruder used for printing, or ask the user every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintExtruder {
    AlwaysAsk,
    Index(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlicerEngine {
    Simplify3d,
    Cura,
    Slic3r,
    PrusaSlicer,
    KisSlicer,
    IdeaMaker,
}

/// Machine-specific output conversion applied after splicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Postprocessing {
    None,
    X3g,
    Makerbot,
    G3drem,
}

/// Print file format the profile accepts as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Gcode,
    X3g,
    Makerbot,
    G3drem,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BowdenTube {
    None,
    /// Tube length in mm
    Length(f64),
}

impl BowdenTube {
    pub fn length(&self) -> f64 {
        match *self {
            BowdenTube::None => 0.0,
            BowdenTube::Length(mm) => mm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    Tower,
    Side,
    None,
}

/// Simple mode keeps min/normal/initial purge lengths identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionLengthMode {
    Simple,
    Advanced,
}

/// Bed edge used for side transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideEdge {
    North,
    South,
    East,
    West,
}

/// Transition tower tuning. Densities are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerSettings {
    pub min_density: f64,
    pub min_first_layer_density: f64,
    pub max_density: f64,
    /// mm/s
    pub max_speed: f64,
    pub min_brims: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideTransitionSettings {
    pub purge_in_place: bool,
    pub coordinates: PurgeCoordinates,
    pub edge: SideEdge,
    /// mm/min
    pub purge_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurgeCoordinates {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSettings {
    pub transition_type: TransitionType,
    pub length_mode: TransitionLengthMode,
    pub purge_length: f64,
    pub min_purge_length: f64,
    pub initial_purge_length: f64,
    /// Fraction of the purge placed before the nominal transition point
    pub target_position: f64,
    pub use_infill_for_transition: bool,
    pub use_support_for_transition: bool,
    pub towers: TowerSettings,
    pub side_transitions: SideTransitionSettings,
}

/// Measured calibration for the splicing accessory.
///
/// `pulses_per_mm` is derived on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Pulses needed to bring filament from staging to ready
    pub loading_offset: u32,
    /// Pulses counted over the whole calibration print
    pub print_value: u32,
    /// Filament length of the calibration model (mm)
    pub calibration_gcode_length: f64,
}

impl Calibration {
    pub fn pulses_per_mm(&self) -> f64 {
        self.print_value as f64 / self.calibration_gcode_length
    }
}

/// A printer profile: machine geometry, firmware characteristics,
/// transition strategy and accessory calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterProfile {
    pub id: ProfileId,
    pub profile_name: String,
    pub palette_type: PaletteType,
    pub connection_mode: ConnectionMode,
    pub print_bed: PrintBed,
    pub nozzle_diameter: f64,
    pub extruder_count: u8,
    pub print_extruder: PrintExtruder,
    pub engine: SlicerEngine,
    pub postprocessing: Postprocessing,
    pub volumetric: bool,
    pub independent_extruder_axes: bool,
    pub input_parsers: BTreeSet<InputFormat>,
    pub bowden_tube: BowdenTube,
    /// mm purged by the printer's own start script
    pub firmware_purge: f64,
    pub transition_settings: TransitionSettings,
    pub calibration: Option<Calibration>,
}

impl PrinterProfile {
    /// A fresh profile with factory defaults and a newly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::generate(),
            profile_name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self {
            id: ProfileId::generate(),
            profile_name: "New Printer".to_string(),
            palette_type: PaletteType::Palette2,
            connection_mode: ConnectionMode::Accessory,
            print_bed: PrintBed {
                shape: BedShape::Rectangular { x: 200.0, y: 200.0 },
                origin: BedOrigin::BottomLeft,
            },
            nozzle_diameter: 0.4,
            extruder_count: 1,
            print_extruder: PrintExtruder::Index(0),
            engine: SlicerEngine::Simplify3d,
            postprocessing: Postprocessing::None,
            volumetric: false,
            independent_extruder_axes: false,
            input_parsers: BTreeSet::from([InputFormat::Gcode]),
            bowden_tube: BowdenTube::None,
            firmware_purge: 0.0,
            transition_settings: TransitionSettings::default(),
            calibration: None,
        }
    }
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            transition_type: TransitionType::Tower,
            length_mode: TransitionLengthMode::Advanced,
            purge_length: 130.0,
            min_purge_length: 80.0,
            initial_purge_length: 150.0,
            target_position: 0.4,
            use_infill_for_transition: true,
            use_support_for_transition: false,
            towers: TowerSettings {
                min_density: 5.0,
                min_first_layer_density: 50.0,
                max_density: 100.0,
                max_speed: 40.0,
                min_brims: 3,
            },
            side_transitions: SideTransitionSettings {
                purge_in_place: false,
                coordinates: PurgeCoordinates { x: 0.0, y: 0.0 },
                edge: SideEdge::North,
                purge_speed: 2400.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_id_format() {
        let id = ProfileId::generate();
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().starts_with('P'));
        assert!(id.as_str()[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_middle_origin_offsets() {
        let bed = PrintBed {
            shape: BedShape::Rectangular { x: 250.0, y: 210.0 },
            origin: BedOrigin::Middle,
        };
        assert_eq!(bed.origin_offsets(), (125.0, 105.0));

        let round = PrintBed {
            shape: BedShape::Circular { diameter: 180.0 },
            origin: BedOrigin::Middle,
        };
        assert_eq!(round.origin_offsets(), (90.0, 90.0));
    }

    #[test]
    fn test_bottom_left_and_custom_offsets() {
        let mut bed = PrintBed {
            shape: BedShape::Rectangular { x: 250.0, y: 210.0 },
            origin: BedOrigin::BottomLeft,
        };
        assert_eq!(bed.origin_offsets(), (0.0, 0.0));

        bed.origin = BedOrigin::Custom { offset_x: -12.5, offset_y: 3.0 };
        assert_eq!(bed.origin_offsets(), (-12.5, 3.0));
    }

    #[test]
    fn test_integrated_requires_gen2() {
        assert!(!ConnectionMode::Integrated.supported_by(PaletteType::PalettePlus));
        assert!(ConnectionMode::Integrated.supported_by(PaletteType::Palette2));
        assert!(ConnectionMode::Connected.supported_by(PaletteType::Palette));
    }

    #[test]
    fn test_pulses_per_mm_is_derived() {
        let cal = Calibration {
            loading_offset: 15000,
            print_value: 3000,
            calibration_gcode_length: 100.0,
        };
        assert_eq!(cal.pulses_per_mm(), 30.0);
    }

    #[test]
    fn test_default_profile_is_consistent() {
        let profile = PrinterProfile::default();
        let t = &profile.transition_settings;
        assert!(t.min_purge_length <= t.purge_length && t.purge_length <= t.initial_purge_length);
        assert!(t.towers.min_density <= t.towers.min_first_layer_density);
        assert!(t.towers.min_first_layer_density <= t.towers.max_density);
        assert!(!profile.is_calibrated());
    }
}
