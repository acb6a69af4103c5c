// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data models and their attachment to layers.
//!
//! Storage is not owned here: layers receive shared [`ModelHandle`]s. A unit may publish named
//! transformed models (for example a pre-aggregated table) that layers select through
//! [`DataSource::Named`].

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::config::DataSource;
use crate::field::{FieldsConfig, Value};
use crate::layer::Layer;
use crate::registry::{LayerKey, LayerRegistry};
use crate::OrderedMap;

/// Row access to a tabular data model.
pub trait DataModel {
    /// Field typing of the model's columns.
    fn fields_config(&self) -> &FieldsConfig;

    /// Number of rows.
    fn row_count(&self) -> usize;

    /// The cell at `row` in column `column`, if present.
    fn value(&self, row: usize, column: usize) -> Option<Value>;

    /// All cells of `column`, in row order. Missing cells are skipped.
    fn column(&self, column: usize) -> Vec<Value> {
        (0..self.row_count())
            .filter_map(|row| self.value(row, column))
            .collect()
    }
}

/// Shared handle to a data model.
pub type ModelHandle = Arc<dyn DataModel>;

/// Derives a model from a parent model.
pub type ModelTransform = Arc<dyn Fn(&ModelHandle) -> ModelHandle>;

/// A column-major in-memory table.
#[derive(Clone, Debug, Default)]
pub struct ColumnTable {
    fields: FieldsConfig,
    columns: Vec<Vec<Value>>,
}

impl ColumnTable {
    /// Creates a table from its field typing and its columns.
    ///
    /// Each field's `index` addresses a column. The row count is the length of the shortest
    /// column.
    pub fn new(fields: FieldsConfig, columns: Vec<Vec<Value>>) -> Self {
        Self { fields, columns }
    }

    /// Keeps the rows for which `keep` returns `true`.
    pub fn filter_rows(&self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let rows: Vec<usize> = (0..self.row_count()).filter(|&r| keep(r)).collect();
        let columns = self
            .columns
            .iter()
            .map(|col| rows.iter().map(|&r| col[r].clone()).collect())
            .collect();
        Self {
            fields: self.fields.clone(),
            columns,
        }
    }

    /// Wraps the table in a [`ModelHandle`].
    pub fn into_handle(self) -> ModelHandle {
        Arc::new(self)
    }
}

impl DataModel for ColumnTable {
    fn fields_config(&self) -> &FieldsConfig {
        &self.fields
    }

    fn row_count(&self) -> usize {
        self.columns.iter().map(Vec::len).min().unwrap_or(0)
    }

    fn value(&self, row: usize, column: usize) -> Option<Value> {
        if row >= self.row_count() {
            return None;
        }
        self.columns.get(column)?.get(row).cloned()
    }
}

/// Applies each named transform to `model`, producing the named transformed models.
///
/// The output keeps the transforms' order.
pub fn transform_data_models<'a>(
    transforms: impl IntoIterator<Item = (&'a str, &'a ModelTransform)>,
    model: &ModelHandle,
) -> OrderedMap<String, ModelHandle> {
    let mut out = OrderedMap::default();
    for (name, transform) in transforms {
        out.insert(String::from(name), transform(model));
    }
    out
}

/// Hands every layer the model its config's source selects.
///
/// [`DataSource::Named`] entries missing from `transformed` fall back to the parent model.
pub fn attach_data_to_layers<L: Layer>(
    registry: &mut LayerRegistry<L>,
    layers: &[LayerKey],
    model: &ModelHandle,
    transformed: &OrderedMap<String, ModelHandle>,
) {
    for &key in layers {
        let Some(layer) = registry.get_mut(key) else {
            continue;
        };
        let data = match &layer.config().source {
            DataSource::Parent => model.clone(),
            DataSource::Named(name) => transformed.get(name).unwrap_or(model).clone(),
            DataSource::Derive(derive) => derive(model),
        };
        layer.set_data(data);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;
    use crate::field::FieldDef;

    fn sales() -> ColumnTable {
        let fields = FieldsConfig::new()
            .with_field("Region", FieldDef::dimension(0))
            .with_field("Sales", FieldDef::measure(1));
        ColumnTable::new(
            fields,
            vec![
                vec!["west".into(), "east".into(), "west".into()],
                vec![Value::from(3.0), Value::from(5.0), Value::from(7.0)],
            ],
        )
    }

    #[test]
    fn table_reads_cells_by_column() {
        let table = sales();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.value(1, 0), Some(Value::from("east")));
        assert_eq!(table.value(3, 0), None);
        assert_eq!(table.value(0, 9), None);
        assert_eq!(table.column(1).len(), 3);
    }

    #[test]
    fn named_transforms_apply_in_order() {
        let parent = sales().into_handle();
        let west: ModelTransform = Arc::new(|m: &ModelHandle| {
            let rows: Vec<usize> = (0..m.row_count())
                .filter(|&r| m.value(r, 0) == Some(Value::from("west")))
                .collect();
            let cols = (0..2)
                .map(|c| rows.iter().filter_map(|&r| m.value(r, c)).collect())
                .collect();
            ColumnTable::new(m.fields_config().clone(), cols).into_handle()
        });
        let same: ModelTransform = Arc::new(|m: &ModelHandle| m.clone());
        let out = transform_data_models([("west", &west), ("same", &same)], &parent);
        assert_eq!(out.keys().map(String::as_str).collect::<Vec<_>>(), ["west", "same"]);
        assert_eq!(out["west"].row_count(), 2);
        assert!(Arc::ptr_eq(&out["same"], &parent));
    }

    #[test]
    fn filter_rows_keeps_field_typing() {
        let table = sales().filter_rows(|r| r != 1);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(1, 1), Some(Value::from(7.0)));
        assert!(table.fields_config().get("Sales").is_some());
    }
}
