// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field typing and cell values.
//!
//! The data model that owns these descriptions lives outside this crate. Composition only reads
//! them: to decide which encodings are dimensions or measures, which union operator a domain
//! uses, and which column backs a field for raw row access.

extern crate alloc;

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;

use crate::OrderedMap;

/// A single cell value.
///
/// Temporal values are carried as numeric timestamps.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A numeric (or timestamp) value.
    Number(f64),
    /// A text value.
    Text(String),
}

impl Value {
    /// Returns the numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }

    /// A total order over values: numbers (by `f64::total_cmp`) sort before text.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Base type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A dimension (categorical, temporal or binned values).
    Dimension,
    /// A measure (continuous numeric values).
    Measure,
}

/// Refinement of a [`FieldType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldSubtype {
    /// Discrete, unordered categories.
    Categorical,
    /// Timestamps.
    Temporal,
    /// Numeric bins of a dimension.
    Binned,
    /// Continuous numeric measure.
    Continuous,
}

/// How two domains of the same field are merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnionKind {
    /// Interval union: `[min(a0, b0), max(a1, b1)]`.
    Continuous,
    /// Set union over discrete values.
    Discrete,
}

/// Type information for one field of the data model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldDef {
    /// Base type.
    pub field_type: FieldType,
    /// Optional subtype; takes precedence over the base type where both apply.
    pub subtype: Option<FieldSubtype>,
    /// Column index of this field in the data model's rows.
    pub index: usize,
}

impl FieldDef {
    /// A dimension field without a subtype stored at `index`.
    pub fn dimension(index: usize) -> Self {
        Self {
            field_type: FieldType::Dimension,
            subtype: None,
            index,
        }
    }

    /// A measure field without a subtype stored at `index`.
    pub fn measure(index: usize) -> Self {
        Self {
            field_type: FieldType::Measure,
            subtype: None,
            index,
        }
    }

    /// Sets the subtype.
    pub fn with_subtype(mut self, subtype: FieldSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Whether the base type is [`FieldType::Measure`].
    pub fn is_measure(&self) -> bool {
        self.field_type == FieldType::Measure
    }

    /// Whether the base type is [`FieldType::Dimension`].
    pub fn is_dimension(&self) -> bool {
        self.field_type == FieldType::Dimension
    }

    /// Returns the subtype when it is categorical or temporal.
    pub fn discrete_dimension(&self) -> Option<FieldSubtype> {
        match self.subtype {
            Some(s @ (FieldSubtype::Categorical | FieldSubtype::Temporal)) => Some(s),
            _ => None,
        }
    }

    /// Selects the union operator: by subtype if present, else by base type.
    pub fn union_kind(&self) -> UnionKind {
        match (self.subtype, self.field_type) {
            (Some(FieldSubtype::Categorical | FieldSubtype::Temporal), _) => UnionKind::Discrete,
            (Some(FieldSubtype::Binned | FieldSubtype::Continuous), _) => UnionKind::Continuous,
            (None, FieldType::Measure) => UnionKind::Continuous,
            (None, FieldType::Dimension) => UnionKind::Discrete,
        }
    }
}

/// Read-only mapping from field name to [`FieldDef`].
#[derive(Clone, Debug, Default)]
pub struct FieldsConfig {
    fields: OrderedMap<String, FieldDef>,
}

impl FieldsConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field definition.
    pub fn insert(&mut self, name: impl Into<String>, def: FieldDef) {
        self.fields.insert(name.into(), def);
    }

    /// Builder form of [`FieldsConfig::insert`].
    pub fn with_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.insert(name, def);
        self
    }

    /// Looks up a field. Unknown fields are not an error; callers skip them.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are configured.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
