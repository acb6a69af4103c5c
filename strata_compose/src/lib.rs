// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer composition for multi-layer chart units.
//!
//! A chart unit draws several layers (bars, lines, points, ...) over shared axes. This crate is
//! the engine between the unit's declarative layer list and the layer objects:
//! - **Registry**: creates layer instances, reuses them across passes by a stable identity, and
//!   releases the ones that disappear.
//! - **Dependencies**: orders layer initialization so layers whose encoding transforms read
//!   other layers come after them.
//! - **Domains**: merges every layer's data domain into one domain per shared axis field.
//! - **Axes**: binds each layer to the right axis when a side carries several.
//!
//! Drawing, scale construction and data storage stay outside; they are reached through the
//! [`Layer`], [`LayerFactory`], [`DataModel`], [`Axis`] and [`LayerContainer`] traits.
//!
//! ```text
//! [LayerDefinition] -> create_layers -> keys in init order
//!                                        |
//!        attach_data_to_layers <---------+
//!        layer_axis_index  -> union_domain_from_layers -> (caller builds axes)
//!        attach_axes_to_layers -> render_layers
//! ```
//!
//! ## Crate features
//!
//! - `std` (disabled by default): use `std` for `kurbo`.
//! - `libm` (enabled by default): `no_std` float math for `kurbo`.
//! - `trace` (disabled by default): dispatch [`TraceSink`] events. Without it, [`Tracer`]
//!   methods compile to nothing.

#![no_std]

extern crate alloc;

mod axis;
mod config;
mod data;
mod dependency;
mod domain;
mod error;
mod field;
mod layer;
mod nearest;
mod registry;
mod render;
mod retinal;
mod trace;


/// Insertion-ordered map used for every output whose order is observable.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V, hashbrown::DefaultHashBuilder>;

pub use axis::{
    Axis, AxisFields, AxisHandle, AxisIndex, AxisIndexMap, AxisSet, AxisSlot, FieldGroup,
    LayerAxes, Side, attach_axes_to_layers, layer_axis_index,
};
pub use config::{
    AxisOverride, DataSource, Encoding, EncodingTransform, LayerConfig, LayerDefinition,
    ResolveContext, Resolved, TransformFn,
};
pub use data::{
    ColumnTable, DataModel, ModelHandle, ModelTransform, attach_data_to_layers,
    transform_data_models,
};
pub use dependency::{DependencyError, DependencyGraph};
pub use domain::{
    AdjustedDomain, Domain, DomainAccumulator, LayerDomain, adjusted_domain,
    union_domain_from_layers,
};
pub use error::ComposeError;
pub use field::{FieldDef, FieldSubtype, FieldType, FieldsConfig, UnionKind, Value};
pub use layer::{Layer, LayerConstructor, LayerFactory, LayerIdentity, MarkTable, UnknownMark};
pub use nearest::{DimensionalValue, closest_index_of, nearest_dimensional_value};
pub use registry::{LayerCriterion, LayerKey, LayerRegistry};
pub use render::{
    DataProps, GroupId, LayerContainer, LifecycleAction, LifecycleEvent, LifecycleNotifier,
    NoopNotifier, RenderUnit, render_layers, side_effect_group,
};
pub use retinal::dimension_measure_map;
pub use trace::{LayerEvent, NoopSink, SkipReason, SkippedContribution, TraceSink, Tracer};
