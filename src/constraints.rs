//! Constraint propagation for coupled profile fields.
//!
//! Every rule here is a pure function: it takes the current values plus the
//! edit and returns the re-normalized values. Out-of-order input is never
//! rejected; instead the neighbours of the edited field are pushed along
//! ("nearest-neighbour cascade") so the edited value always sticks.

use crate::profile::types::{ConnectionMode, PaletteType, PrintExtruder};

/// Three values that must satisfy `min <= mid <= max`.
///
/// Backs both the transition-length triple (min / normal / initial purge)
/// and the tower density triple (min / first layer / max).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedTriple {
    pub min: f64,
    pub mid: f64,
    pub max: f64,
}

impl OrderedTriple {
    pub fn new(min: f64, mid: f64, max: f64) -> Self {
        Self { min, mid, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.mid && self.mid <= self.max
    }

    pub fn is_collapsed(&self) -> bool {
        self.min == self.mid && self.mid == self.max
    }
}

/// Which member of an [`OrderedTriple`] an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleField {
    Min,
    Mid,
    Max,
}

/// Apply a single-field edit and cascade it outward.
///
/// The edited field keeps `new_value`. Raising a lower member drags the
/// members above it up to meet it; lowering an upper member drags the
/// members below it down. Given an ordered input, the output is ordered.
pub fn adjust_ordered_triple(
    current: OrderedTriple,
    edited: TripleField,
    new_value: f64,
) -> OrderedTriple {
    let OrderedTriple { mut min, mut mid, mut max } = current;

    match edited {
        TripleField::Min => {
            min = new_value;
            if min > mid {
                mid = min;
                if mid > max {
                    max = mid;
                }
            }
        }
        TripleField::Mid => {
            mid = new_value;
            if min > mid {
                min = mid;
            }
            if max < mid {
                max = mid;
            }
        }
        TripleField::Max => {
            max = new_value;
            if max < mid {
                mid = max;
                if mid < min {
                    min = mid;
                }
            }
        }
    }

    OrderedTriple { min, mid, max }
}

/// Collapse a triple to a single point (simple editing mode).
pub fn collapse_triple(value: f64) -> OrderedTriple {
    OrderedTriple::new(value, value, value)
}

/// Keep the print extruder valid when the extruder count changes.
///
/// An index that no longer exists falls back to asking on every print.
pub fn cascade_extruder_count(current: PrintExtruder, new_count: u8) -> PrintExtruder {
    match current {
        PrintExtruder::Index(index) if index >= new_count => PrintExtruder::AlwaysAsk,
        other => other,
    }
}

/// Independent axes only make sense with more than one extruder.
pub fn cascade_independent_axes(current: bool, new_count: u8) -> bool {
    current && new_count > 1
}

/// Drop to the standalone connection when the new accessory cannot integrate.
pub fn cascade_palette_type(current: ConnectionMode, new_type: PaletteType) -> ConnectionMode {
    if current.supported_by(new_type) {
        current
    } else {
        ConnectionMode::Accessory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: [TripleField; 3] = [TripleField::Min, TripleField::Mid, TripleField::Max];

    fn sample_triples() -> Vec<OrderedTriple> {
        vec![
            OrderedTriple::new(80.0, 130.0, 150.0),
            OrderedTriple::new(5.0, 50.0, 100.0),
            OrderedTriple::new(10.0, 10.0, 10.0),
            OrderedTriple::new(0.0, 0.0, 250.0),
        ]
    }

    fn sample_values() -> Vec<f64> {
        vec![-10.0, 0.0, 5.0, 79.0, 80.0, 100.0, 130.0, 149.0, 150.0, 151.0, 1000.0]
    }

    #[test]
    fn test_cascade_keeps_ordering_for_every_edit() {
        for triple in sample_triples() {
            for field in FIELDS {
                for value in sample_values() {
                    let out = adjust_ordered_triple(triple, field, value);
                    assert!(
                        out.is_ordered(),
                        "{:?} edited {:?} -> {} produced {:?}",
                        triple,
                        field,
                        value,
                        out
                    );
                }
            }
        }
    }

    #[test]
    fn test_edited_field_is_never_clamped() {
        for triple in sample_triples() {
            for value in sample_values() {
                assert_eq!(adjust_ordered_triple(triple, TripleField::Min, value).min, value);
                assert_eq!(adjust_ordered_triple(triple, TripleField::Mid, value).mid, value);
                assert_eq!(adjust_ordered_triple(triple, TripleField::Max, value).max, value);
            }
        }
    }

    #[test]
    fn test_cascade_is_idempotent() {
        for triple in sample_triples() {
            for field in FIELDS {
                for value in sample_values() {
                    let once = adjust_ordered_triple(triple, field, value);
                    let twice = adjust_ordered_triple(once, field, value);
                    assert_eq!(once, twice);
                }
            }
        }
    }

    #[test]
    fn test_raising_min_pushes_mid_and_max() {
        let out = adjust_ordered_triple(OrderedTriple::new(80.0, 130.0, 150.0), TripleField::Min, 200.0);
        assert_eq!(out, OrderedTriple::new(200.0, 200.0, 200.0));

        let out = adjust_ordered_triple(OrderedTriple::new(80.0, 130.0, 150.0), TripleField::Min, 140.0);
        assert_eq!(out, OrderedTriple::new(140.0, 140.0, 150.0));
    }

    #[test]
    fn test_lowering_max_pulls_mid_and_min() {
        let out = adjust_ordered_triple(OrderedTriple::new(80.0, 130.0, 150.0), TripleField::Max, 100.0);
        assert_eq!(out, OrderedTriple::new(80.0, 100.0, 100.0));

        let out = adjust_ordered_triple(OrderedTriple::new(80.0, 130.0, 150.0), TripleField::Max, 50.0);
        assert_eq!(out, OrderedTriple::new(50.0, 50.0, 50.0));
    }

    #[test]
    fn test_mid_edit_pushes_both_neighbours() {
        let triple = OrderedTriple::new(5.0, 50.0, 100.0);
        assert_eq!(
            adjust_ordered_triple(triple, TripleField::Mid, 120.0),
            OrderedTriple::new(5.0, 120.0, 120.0)
        );
        assert_eq!(
            adjust_ordered_triple(triple, TripleField::Mid, 2.0),
            OrderedTriple::new(2.0, 2.0, 100.0)
        );
    }

    #[test]
    fn test_in_range_edit_touches_nothing_else() {
        let triple = OrderedTriple::new(80.0, 130.0, 150.0);
        assert_eq!(
            adjust_ordered_triple(triple, TripleField::Mid, 100.0),
            OrderedTriple::new(80.0, 100.0, 150.0)
        );
    }

    #[test]
    fn test_collapse_triple() {
        let t = collapse_triple(80.0);
        assert!(t.is_collapsed());
        assert_eq!(t.mid, 80.0);
    }

    #[test]
    fn test_extruder_count_shrink_resets_index() {
        assert_eq!(
            cascade_extruder_count(PrintExtruder::Index(3), 3),
            PrintExtruder::AlwaysAsk
        );
        assert_eq!(
            cascade_extruder_count(PrintExtruder::Index(1), 3),
            PrintExtruder::Index(1)
        );
        assert_eq!(
            cascade_extruder_count(PrintExtruder::AlwaysAsk, 1),
            PrintExtruder::AlwaysAsk
        );
    }

    #[test]
    fn test_independent_axes_need_two_extruders() {
        assert!(!cascade_independent_axes(true, 1));
        assert!(cascade_independent_axes(true, 2));
        assert!(!cascade_independent_axes(false, 4));
    }

    #[test]
    fn test_palette_downgrade_drops_integrated_mode() {
        assert_eq!(
            cascade_palette_type(ConnectionMode::Integrated, PaletteType::Palette),
            ConnectionMode::Accessory
        );
        assert_eq!(
            cascade_palette_type(ConnectionMode::Integrated, PaletteType::Palette2Pro),
            ConnectionMode::Integrated
        );
        assert_eq!(
            cascade_palette_type(ConnectionMode::Connected, PaletteType::PalettePlus),
            ConnectionMode::Connected
        );
    }
}
