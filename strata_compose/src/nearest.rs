// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nearest data key under a pointer position.
//!
//! Interaction layers (tooltips, crosshairs) need the dimension key closest to a position. Only
//! charts with a categorical or temporal dimension on one side and a measure on the other have
//! such a key.

extern crate alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::Point;

use crate::axis::{AxisFields, AxisSet, Side};
use crate::data::DataModel;
use crate::field::{FieldSubtype, Value};

/// Field names paired with the keys found for them.
#[derive(Clone, Debug, PartialEq)]
pub struct DimensionalValue {
    /// Dimension fields.
    pub fields: Vec<String>,
    /// One key per field.
    pub keys: Vec<Value>,
}

fn coordinate(side: Side, position: Point) -> f64 {
    match side {
        Side::X => position.x,
        Side::Y => position.y,
    }
}

/// Finds the dimension key nearest to `position`.
///
/// The first field of the first group of each side decides the sides' types. The dimension side
/// is the first (`x` before `y`) whose field is categorical or temporal; at least one side must
/// be a measure. The position is inverted through the dimension side's first axis; temporal keys
/// snap to the closest timestamp present in the data.
///
/// Returns `None` when either side has no field groups, when no side qualifies, or when no key
/// resolves.
pub fn nearest_dimensional_value(
    fields: &AxisFields,
    model: &dyn DataModel,
    axes: &AxisSet,
    position: Point,
) -> Option<DimensionalValue> {
    let first_field = |side: Side| {
        fields
            .side(side)
            .first()
            .and_then(|group| group.members().first())
            .map(String::as_str)
    };
    let x_field = first_field(Side::X)?;
    let y_field = first_field(Side::Y)?;

    let config = model.fields_config();
    let x_def = config.get(x_field);
    let y_def = config.get(y_field);
    if !x_def.is_some_and(|d| d.is_measure()) && !y_def.is_some_and(|d| d.is_measure()) {
        return None;
    }

    let (side, field, def, subtype) = [(Side::X, x_field, x_def), (Side::Y, y_field, y_def)]
        .into_iter()
        .find_map(|(side, field, def)| {
            let def = def?;
            Some((side, field, def, def.discrete_dimension()?))
        })?;

    let axis = axes.side(side).first()?;
    let mut key = axis.invert(coordinate(side, position))?;
    if subtype == FieldSubtype::Temporal {
        let target = key.as_number()?;
        let observed = distinct_numbers(&model.column(def.index));
        key = Value::Number(observed[closest_index_of(&observed, target)?]);
    }

    Some(DimensionalValue {
        fields: vec![String::from(field)],
        keys: vec![key],
    })
}

/// Numeric values in ascending order, without repeats.
fn distinct_numbers(values: &[Value]) -> Vec<f64> {
    let mut numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
    numbers.sort_by(f64::total_cmp);
    numbers.dedup_by(|a, b| a.total_cmp(b).is_eq());
    numbers
}

/// Index of the value closest to `target` in ascending `values`.
///
/// Ties go to the later value. Returns `None` for an empty slice.
pub fn closest_index_of(values: &[f64], target: f64) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    let mut low = 0;
    let mut high = values.len() - 1;
    while low < high {
        let mid = (low + high) / 2;
        let here = (values[mid] - target).abs();
        let next = (values[mid + 1] - target).abs();
        if next <= here {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    Some(high)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::sync::Arc;

    use super::*;
    use crate::axis::{Axis, AxisHandle, FieldGroup};
    use crate::data::ColumnTable;
    use crate::field::{FieldDef, FieldsConfig};

    const JAN: f64 = 0.0;
    const FEB: f64 = 31.0;
    const MAR: f64 = 59.0;
    const JUN: f64 = 151.0;

    /// Linear axis mapping pixels one-to-one onto numbers.
    struct Identity;

    impl Axis for Identity {
        fn invert(&self, position: f64) -> Option<Value> {
            Some(Value::Number(position))
        }
    }

    /// Band axis over fixed categories, 10 pixels per band.
    struct Bands(Vec<&'static str>);

    impl Axis for Bands {
        fn invert(&self, position: f64) -> Option<Value> {
            if position < 0.0 {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, reason = "non-negative band index")]
            let band = (position / 10.0) as usize;
            self.0.get(band).map(|s| Value::from(*s))
        }
    }

    fn handle(axis: impl Axis + 'static) -> AxisHandle {
        Arc::new(axis)
    }

    fn fields(x: &str, y: &str) -> AxisFields {
        AxisFields {
            x: vec![FieldGroup::single(x)],
            y: vec![FieldGroup::single(y)],
        }
    }

    fn timeline() -> ColumnTable {
        let config = FieldsConfig::new()
            .with_field("Month", FieldDef::dimension(0).with_subtype(FieldSubtype::Temporal))
            .with_field("Sales", FieldDef::measure(1));
        ColumnTable::new(
            config,
            vec![
                vec![JAN.into(), MAR.into(), MAR.into(), JUN.into()],
                vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()],
            ],
        )
    }

    #[test]
    fn temporal_key_snaps_to_closest_observed_value() {
        let axes = AxisSet {
            x: vec![handle(Identity)],
            y: vec![handle(Identity)],
        };
        let position = Point::new(FEB, 0.0);
        let found =
            nearest_dimensional_value(&fields("Month", "Sales"), &timeline(), &axes, position);
        assert_eq!(
            found,
            Some(DimensionalValue {
                fields: vec!["Month".into()],
                keys: vec![Value::Number(MAR)],
            })
        );
    }

    #[test]
    fn temporal_key_snaps_on_unsorted_rows() {
        const DEC: f64 = 334.0;
        let config = FieldsConfig::new()
            .with_field("Month", FieldDef::dimension(0).with_subtype(FieldSubtype::Temporal))
            .with_field("Sales", FieldDef::measure(1));
        let model = ColumnTable::new(
            config,
            vec![
                vec![JAN.into(), JUN.into(), MAR.into(), DEC.into()],
                vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()],
            ],
        );
        let axes = AxisSet {
            x: vec![handle(Identity)],
            y: vec![handle(Identity)],
        };
        let month = |x: f64| {
            nearest_dimensional_value(&fields("Month", "Sales"), &model, &axes, Point::new(x, 0.0))
                .map(|v| v.keys)
        };
        assert_eq!(month(JAN), Some(vec![Value::Number(JAN)]));
        assert_eq!(month(300.0), Some(vec![Value::Number(DEC)]));
        assert_eq!(month(100.0), Some(vec![Value::Number(MAR)]));
    }

    #[test]
    fn categorical_key_on_y_side() {
        let config = FieldsConfig::new()
            .with_field("Sales", FieldDef::measure(0))
            .with_field("Region", FieldDef::dimension(1).with_subtype(FieldSubtype::Categorical));
        let model = ColumnTable::new(config, vec![vec![], vec![]]);
        let axes = AxisSet {
            x: vec![handle(Identity)],
            y: vec![handle(Bands(vec!["east", "west"]))],
        };
        let position = Point::new(3.0, 15.0);
        let found = nearest_dimensional_value(&fields("Sales", "Region"), &model, &axes, position);
        assert_eq!(found.map(|v| v.keys), Some(vec![Value::from("west")]));
    }

    #[test]
    fn no_measure_means_no_key() {
        let config = FieldsConfig::new()
            .with_field("A", FieldDef::dimension(0).with_subtype(FieldSubtype::Categorical))
            .with_field("B", FieldDef::dimension(1).with_subtype(FieldSubtype::Categorical));
        let model = ColumnTable::new(config, vec![vec![], vec![]]);
        let axes = AxisSet {
            x: vec![handle(Bands(vec!["a"]))],
            y: vec![handle(Bands(vec!["b"]))],
        };
        assert!(nearest_dimensional_value(&fields("A", "B"), &model, &axes, Point::ZERO).is_none());
    }

    #[test]
    fn missing_side_fields_means_no_key() {
        let only_x = AxisFields {
            x: vec![FieldGroup::single("Month")],
            y: vec![],
        };
        let axes = AxisSet::default();
        assert!(nearest_dimensional_value(&only_x, &timeline(), &axes, Point::ZERO).is_none());
    }

    #[test]
    fn closest_index_prefers_later_on_ties() {
        assert_eq!(closest_index_of(&[JAN, MAR, JUN], FEB), Some(1));
        assert_eq!(closest_index_of(&[0.0, 2.0], 1.0), Some(1));
        assert_eq!(closest_index_of(&[0.0, 2.0, 4.0], -5.0), Some(0));
        assert_eq!(closest_index_of(&[0.0, 2.0, 4.0], 50.0), Some(2));
        assert_eq!(closest_index_of(&[], 1.0), None);
    }
}
