//! Single-field edits and how they propagate through a profile.

use std::collections::BTreeSet;

use crate::constraints::{
    adjust_ordered_triple, cascade_extruder_count, cascade_independent_axes, cascade_palette_type,
    collapse_triple, OrderedTriple, TripleField,
};
use crate::profile::types::*;

/// One user edit to a working profile.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    ProfileName(String),
    PaletteType(PaletteType),
    ConnectionMode(ConnectionMode),
    BedShape(BedShape),
    BedOrigin(BedOrigin),
    NozzleDiameter(f64),
    ExtruderCount(u8),
    PrintExtruder(PrintExtruder),
    Engine(SlicerEngine),
    Postprocessing(Postprocessing),
    Volumetric(bool),
    IndependentExtruderAxes(bool),
    InputParsers(BTreeSet<InputFormat>),
    BowdenTube(BowdenTube),
    FirmwarePurge(f64),
    TransitionType(TransitionType),
    TransitionLengthMode(TransitionLengthMode),
    MinPurgeLength(f64),
    PurgeLength(f64),
    InitialPurgeLength(f64),
    TargetPosition(f64),
    UseInfillForTransition(bool),
    UseSupportForTransition(bool),
    TowerMinDensity(f64),
    TowerMinFirstLayerDensity(f64),
    TowerMaxDensity(f64),
    TowerMaxSpeed(f64),
    TowerMinBrims(u32),
    SidePurgeInPlace(bool),
    SideCoordinates(PurgeCoordinates),
    SideEdge(SideEdge),
    SidePurgeSpeed(f64),
}

fn purge_triple(t: &TransitionSettings) -> OrderedTriple {
    OrderedTriple::new(t.min_purge_length, t.purge_length, t.initial_purge_length)
}

fn set_purge_triple(t: &mut TransitionSettings, triple: OrderedTriple) {
    t.min_purge_length = triple.min;
    t.purge_length = triple.mid;
    t.initial_purge_length = triple.max;
}

fn density_triple(towers: &TowerSettings) -> OrderedTriple {
    OrderedTriple::new(
        towers.min_density,
        towers.min_first_layer_density,
        towers.max_density,
    )
}

fn set_density_triple(towers: &mut TowerSettings, triple: OrderedTriple) {
    towers.min_density = triple.min;
    towers.min_first_layer_density = triple.mid;
    towers.max_density = triple.max;
}

fn edit_purge_length(t: &mut TransitionSettings, field: TripleField, value: f64) {
    let triple = match t.length_mode {
        TransitionLengthMode::Simple => collapse_triple(value),
        TransitionLengthMode::Advanced => adjust_ordered_triple(purge_triple(t), field, value),
    };
    set_purge_triple(t, triple);
}

fn edit_density(towers: &mut TowerSettings, field: TripleField, value: f64) {
    let triple = adjust_ordered_triple(density_triple(towers), field, value);
    set_density_triple(towers, triple);
}

/// Apply `edit` to `profile` and re-normalize every dependent field.
pub fn apply_edit(profile: &mut PrinterProfile, edit: FieldEdit) {
    let t = &mut profile.transition_settings;

    match edit {
        FieldEdit::ProfileName(name) => profile.profile_name = name,
        FieldEdit::PaletteType(palette_type) => {
            profile.palette_type = palette_type;
            profile.connection_mode = cascade_palette_type(profile.connection_mode, palette_type);
        }
        FieldEdit::ConnectionMode(mode) => profile.connection_mode = mode,
        FieldEdit::BedShape(shape) => profile.print_bed.shape = shape,
        FieldEdit::BedOrigin(origin) => profile.print_bed.origin = origin,
        FieldEdit::NozzleDiameter(mm) => profile.nozzle_diameter = mm,
        FieldEdit::ExtruderCount(count) => {
            profile.extruder_count = count;
            profile.print_extruder = cascade_extruder_count(profile.print_extruder, count);
            profile.independent_extruder_axes =
                cascade_independent_axes(profile.independent_extruder_axes, count);
        }
        FieldEdit::PrintExtruder(extruder) => {
            profile.print_extruder = cascade_extruder_count(extruder, profile.extruder_count)
        }
        FieldEdit::Engine(engine) => profile.engine = engine,
        FieldEdit::Postprocessing(post) => profile.postprocessing = post,
        FieldEdit::Volumetric(on) => profile.volumetric = on,
        FieldEdit::IndependentExtruderAxes(on) => profile.independent_extruder_axes = on,
        FieldEdit::InputParsers(parsers) => profile.input_parsers = parsers,
        FieldEdit::BowdenTube(tube) => profile.bowden_tube = tube,
        FieldEdit::FirmwarePurge(mm) => profile.firmware_purge = mm,
        FieldEdit::TransitionType(kind) => t.transition_type = kind,
        FieldEdit::TransitionLengthMode(mode) => {
            t.length_mode = mode;
            if mode == TransitionLengthMode::Simple {
                let value = t.purge_length;
                set_purge_triple(t, collapse_triple(value));
            }
        }
        FieldEdit::MinPurgeLength(mm) => edit_purge_length(t, TripleField::Min, mm),
        FieldEdit::PurgeLength(mm) => edit_purge_length(t, TripleField::Mid, mm),
        FieldEdit::InitialPurgeLength(mm) => edit_purge_length(t, TripleField::Max, mm),
        FieldEdit::TargetPosition(position) => t.target_position = position,
        FieldEdit::UseInfillForTransition(on) => t.use_infill_for_transition = on,
        FieldEdit::UseSupportForTransition(on) => t.use_support_for_transition = on,
        FieldEdit::TowerMinDensity(pct) => edit_density(&mut t.towers, TripleField::Min, pct),
        FieldEdit::TowerMinFirstLayerDensity(pct) => {
            edit_density(&mut t.towers, TripleField::Mid, pct)
        }
        FieldEdit::TowerMaxDensity(pct) => edit_density(&mut t.towers, TripleField::Max, pct),
        FieldEdit::TowerMaxSpeed(speed) => t.towers.max_speed = speed,
        FieldEdit::TowerMinBrims(brims) => t.towers.min_brims = brims,
        FieldEdit::SidePurgeInPlace(on) => t.side_transitions.purge_in_place = on,
        FieldEdit::SideCoordinates(coords) => t.side_transitions.coordinates = coords,
        FieldEdit::SideEdge(edge) => t.side_transitions.edge = edge,
        FieldEdit::SidePurgeSpeed(speed) => t.side_transitions.purge_speed = speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_length_cascade() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::MinPurgeLength(140.0));
        let t = &profile.transition_settings;
        assert_eq!((t.min_purge_length, t.purge_length, t.initial_purge_length), (140.0, 140.0, 150.0));

        apply_edit(&mut profile, FieldEdit::InitialPurgeLength(100.0));
        let t = &profile.transition_settings;
        assert_eq!((t.min_purge_length, t.purge_length, t.initial_purge_length), (100.0, 100.0, 100.0));
    }

    #[test]
    fn test_simple_mode_collapses_purge_lengths() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::TransitionLengthMode(TransitionLengthMode::Simple));
        let t = &profile.transition_settings;
        assert_eq!((t.min_purge_length, t.purge_length, t.initial_purge_length), (130.0, 130.0, 130.0));

        apply_edit(&mut profile, FieldEdit::PurgeLength(80.0));
        let t = &profile.transition_settings;
        assert_eq!(t.min_purge_length, 80.0);
        assert_eq!(t.initial_purge_length, 80.0);

        apply_edit(&mut profile, FieldEdit::InitialPurgeLength(95.0));
        let t = &profile.transition_settings;
        assert_eq!((t.min_purge_length, t.purge_length, t.initial_purge_length), (95.0, 95.0, 95.0));
    }

    #[test]
    fn test_density_cascade() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::TowerMaxDensity(30.0));
        let towers = &profile.transition_settings.towers;
        assert_eq!(
            (towers.min_density, towers.min_first_layer_density, towers.max_density),
            (5.0, 30.0, 30.0)
        );

        apply_edit(&mut profile, FieldEdit::TowerMinDensity(40.0));
        let towers = &profile.transition_settings.towers;
        assert_eq!(
            (towers.min_density, towers.min_first_layer_density, towers.max_density),
            (40.0, 40.0, 40.0)
        );
    }

    #[test]
    fn test_density_ignores_simple_mode() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::TransitionLengthMode(TransitionLengthMode::Simple));
        apply_edit(&mut profile, FieldEdit::TowerMinFirstLayerDensity(20.0));
        let towers = &profile.transition_settings.towers;
        assert_eq!(
            (towers.min_density, towers.min_first_layer_density, towers.max_density),
            (5.0, 20.0, 100.0)
        );
    }

    #[test]
    fn test_extruder_count_shrink() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::ExtruderCount(4));
        apply_edit(&mut profile, FieldEdit::PrintExtruder(PrintExtruder::Index(3)));
        apply_edit(&mut profile, FieldEdit::IndependentExtruderAxes(true));

        apply_edit(&mut profile, FieldEdit::ExtruderCount(2));
        assert_eq!(profile.print_extruder, PrintExtruder::AlwaysAsk);
        assert!(profile.independent_extruder_axes);

        apply_edit(&mut profile, FieldEdit::ExtruderCount(1));
        assert!(!profile.independent_extruder_axes);
    }

    #[test]
    fn test_out_of_range_print_extruder_falls_back_to_ask() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::ExtruderCount(2));
        apply_edit(&mut profile, FieldEdit::PrintExtruder(PrintExtruder::Index(1)));
        assert_eq!(profile.print_extruder, PrintExtruder::Index(1));

        apply_edit(&mut profile, FieldEdit::PrintExtruder(PrintExtruder::Index(2)));
        assert_eq!(profile.print_extruder, PrintExtruder::AlwaysAsk);
    }

    #[test]
    fn test_palette_downgrade_resets_integrated() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::ConnectionMode(ConnectionMode::Integrated));
        apply_edit(&mut profile, FieldEdit::PaletteType(PaletteType::PalettePlus));
        assert_eq!(profile.connection_mode, ConnectionMode::Accessory);
    }

    #[test]
    fn test_bed_shape_switch_replaces_dimensions() {
        let mut profile = PrinterProfile::default();
        apply_edit(&mut profile, FieldEdit::BedShape(BedShape::Circular { diameter: 170.0 }));
        apply_edit(&mut profile, FieldEdit::BedOrigin(BedOrigin::Middle));
        assert_eq!(profile.print_bed.origin_offsets(), (85.0, 85.0));
    }
}
