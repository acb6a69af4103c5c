// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis selection and binding.
//!
//! A chart unit may carry several axes per side (for example two `y` axes for a dual-axis
//! chart). Each axis is driven by a group of fields. Layers pick their axis per side by the field
//! they encode on that side: [`layer_axis_index`] records the chosen position per layer, and
//! [`attach_axes_to_layers`] hands each layer the matching axis objects.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::field::Value;
use crate::layer::Layer;
use crate::registry::{LayerKey, LayerRegistry};

/// A positional side of the plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl Side {
    /// Both sides, `x` first.
    pub const BOTH: [Self; 2] = [Self::X, Self::Y];

    /// The other side.
    pub fn orthogonal(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// An axis object built outside this crate (scale construction is not our concern).
pub trait Axis {
    /// Maps a position along the axis back to a data key.
    fn invert(&self, position: f64) -> Option<Value>;
}

/// Shared handle to an axis object; several layers may bind the same axis.
pub type AxisHandle = Arc<dyn Axis>;

/// The fields driving one axis.
///
/// Its display form (members joined with `,`) is the key under which shared domains are
/// accumulated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldGroup {
    members: SmallVec<[String; 1]>,
}

impl FieldGroup {
    /// A group with a single field.
    pub fn single(field: impl Into<String>) -> Self {
        Self::new([field])
    }

    /// A group over several fields.
    pub fn new<S: Into<String>>(members: impl IntoIterator<Item = S>) -> Self {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Field names in this group.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Whether `field` is one of the members.
    pub fn contains(&self, field: &str) -> bool {
        self.members.iter().any(|m| m == field)
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(m)?;
        }
        Ok(())
    }
}

/// Field groups per side, one group per axis, in axis order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisFields {
    /// Groups driving the `x` axes.
    pub x: Vec<FieldGroup>,
    /// Groups driving the `y` axes.
    pub y: Vec<FieldGroup>,
}

impl AxisFields {
    /// Returns the groups of a side.
    pub fn side(&self, side: Side) -> &[FieldGroup] {
        match side {
            Side::X => &self.x,
            Side::Y => &self.y,
        }
    }
}

/// Axis objects per side, in the same order as [`AxisFields`].
#[derive(Clone, Default)]
pub struct AxisSet {
    /// `x` axes.
    pub x: Vec<AxisHandle>,
    /// `y` axes.
    pub y: Vec<AxisHandle>,
}

impl AxisSet {
    /// Returns the axes of a side.
    pub fn side(&self, side: Side) -> &[AxisHandle] {
        match side {
            Side::X => &self.x,
            Side::Y => &self.y,
        }
    }
}

impl fmt::Debug for AxisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxisSet")
            .field("x", &self.x.len())
            .field("y", &self.y.len())
            .finish()
    }
}

/// Which axis of a side a layer binds to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AxisSlot {
    /// No explicit choice; binds the first axis.
    #[default]
    Unspecified,
    /// Binds the axis at this position.
    Index(usize),
    /// The layer's field drives none of the side's axes; left unbound.
    Unmatched,
}

impl AxisSlot {
    /// The axis position this slot selects, if any.
    pub fn resolve(self) -> Option<usize> {
        match self {
            Self::Unspecified => Some(0),
            Self::Index(i) => Some(i),
            Self::Unmatched => None,
        }
    }
}

/// Per-side axis slots of one layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AxisIndex {
    /// Slot on the `x` side.
    pub x: AxisSlot,
    /// Slot on the `y` side.
    pub y: AxisSlot,
}

impl AxisIndex {
    /// Returns the slot of a side.
    pub fn get(&self, side: Side) -> AxisSlot {
        match side {
            Side::X => self.x,
            Side::Y => self.y,
        }
    }

    fn set(&mut self, side: Side, slot: AxisSlot) {
        match side {
            Side::X => self.x = slot,
            Side::Y => self.y = slot,
        }
    }
}

/// Axis slots keyed by layer.
pub type AxisIndexMap = HashMap<LayerKey, AxisIndex>;

/// The axes bound to one layer.
#[derive(Clone, Default)]
pub struct LayerAxes {
    /// Bound `x` axis.
    pub x: Option<AxisHandle>,
    /// Bound `y` axis.
    pub y: Option<AxisHandle>,
}

impl LayerAxes {
    /// Whether neither side is bound.
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

impl fmt::Debug for LayerAxes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerAxes")
            .field("x", &self.x.is_some())
            .field("y", &self.y.is_some())
            .finish()
    }
}

/// Records, per layer and side, which axis the layer's field selects.
///
/// The lookup field is the config's axis override for the side, else the encoded field. With no
/// field groups declared for a side the slot is `Index(0)`; otherwise it is the position of the
/// first group containing the field, or `Unmatched`.
pub fn layer_axis_index<L: Layer>(
    registry: &LayerRegistry<L>,
    layers: &[LayerKey],
    fields: &AxisFields,
) -> AxisIndexMap {
    let mut out = AxisIndexMap::new();
    for &key in layers {
        let Some(layer) = registry.get(key) else {
            continue;
        };
        let config = layer.config();
        let mut index = AxisIndex::default();
        for side in Side::BOTH {
            let groups = fields.side(side);
            let slot = if groups.is_empty() {
                AxisSlot::Index(0)
            } else {
                config
                    .axis_field(side)
                    .and_then(|field| groups.iter().position(|g| g.contains(field)))
                    .map_or(AxisSlot::Unmatched, AxisSlot::Index)
            };
            index.set(side, slot);
        }
        out.insert(key, index);
    }
    out
}

/// Attaches to each layer the axes its recorded slots select.
///
/// Layers missing from `index` bind the first axis of each side. A side whose slot is unmatched,
/// or whose selected position has no axis, stays unbound; layers with nothing bound are not
/// touched.
pub fn attach_axes_to_layers<L: Layer>(
    registry: &mut LayerRegistry<L>,
    layers: &[LayerKey],
    axes: &AxisSet,
    index: &AxisIndexMap,
) {
    for &key in layers {
        let slots = index.get(&key).copied().unwrap_or_default();
        let pick = |side: Side| {
            slots
                .get(side)
                .resolve()
                .and_then(|i| axes.side(side).get(i).cloned())
        };
        let bound = LayerAxes {
            x: pick(Side::X),
            y: pick(Side::Y),
        };
        if bound.is_empty() {
            continue;
        }
        if let Some(layer) = registry.get_mut(key) {
            layer.set_axes(bound);
        }
    }
}
