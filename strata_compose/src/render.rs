// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mounting layers into a container tree.
//!
//! The container (an SVG tree, a retained scene, ...) is external. Composition asks it for group
//! nodes and tells each layer which group to draw into, in draw order.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;

use crate::layer::Layer;
use crate::registry::{LayerKey, LayerRegistry};
use crate::OrderedMap;

/// A group node in the container tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

/// Creates group nodes.
pub trait LayerContainer {
    /// Creates a group under `parent`, optionally tagged with a class name.
    fn create_group(&mut self, parent: GroupId, class: Option<&str>) -> GroupId;
}

/// Phase of a lifecycle notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    /// Layers are about to draw.
    BeforeDraw,
}

/// A lifecycle notification.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleEvent<'a> {
    /// The layers concerned.
    pub client: &'a [LayerKey],
    /// What is happening.
    pub action: LifecycleAction,
    /// Kind of client; always `"layer"` for layer notifications.
    pub formal_name: &'static str,
}

/// Receives lifecycle notifications.
pub trait LifecycleNotifier {
    /// Called with each notification.
    fn notify(&mut self, event: &LifecycleEvent<'_>);
}

/// A [`LifecycleNotifier`] that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl LifecycleNotifier for NoopNotifier {
    fn notify(&mut self, event: &LifecycleEvent<'_>) {
        _ = event;
    }
}

/// Unit-level data properties passed to every layer before drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataProps {
    /// Smallest difference between consecutive timestamps, per temporal field.
    pub time_diffs: OrderedMap<String, f64>,
}

impl DataProps {
    /// Sets the minimum time difference of a field.
    pub fn with_time_diff(mut self, field: impl Into<String>, diff: f64) -> Self {
        self.time_diffs.insert(field.into(), diff);
        self
    }
}

/// The chart unit's side of a render pass.
pub struct RenderUnit<'a> {
    /// Prefix for group class names.
    pub class_prefix: &'a str,
    /// Properties handed to every layer.
    pub data_props: &'a DataProps,
    /// Notified before layers draw.
    pub notifier: &'a mut dyn LifecycleNotifier,
}

impl core::fmt::Debug for RenderUnit<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderUnit")
            .field("class_prefix", &self.class_prefix)
            .field("data_props", &self.data_props)
            .finish_non_exhaustive()
    }
}

/// Mounts `layers` under `root`.
///
/// Notifies [`LifecycleAction::BeforeDraw`], creates the `{prefix}-layer-group` group, then
/// one group per layer in ascending config order (stable). Every layer receives `measurement`
/// and the unit's data props; layers whose config disables `render` are not mounted.
///
/// Returns the layer group.
pub fn render_layers<L: Layer, C: LayerContainer + ?Sized>(
    unit: &mut RenderUnit<'_>,
    container: &mut C,
    root: GroupId,
    registry: &mut LayerRegistry<L>,
    layers: &[LayerKey],
    measurement: Size,
) -> GroupId {
    unit.notifier.notify(&LifecycleEvent {
        client: layers,
        action: LifecycleAction::BeforeDraw,
        formal_name: "layer",
    });

    let mut ordered: Vec<(i32, LayerKey)> = layers
        .iter()
        .filter_map(|&key| registry.get(key).map(|l| (l.config().order, key)))
        .collect();
    ordered.sort_by_key(|(order, _)| *order);

    let class = format!("{}-layer-group", unit.class_prefix);
    let layer_group = container.create_group(root, Some(&class));
    for (_, key) in ordered {
        let group = container.create_group(layer_group, None);
        let Some(layer) = registry.get_mut(key) else {
            continue;
        };
        layer.set_measurement(measurement);
        layer.set_data_props(unit.data_props);
        if layer.config().render {
            layer.mount(group);
        }
    }
    layer_group
}

/// Creates a group for side effects (annotations, highlights) under `parent`.
pub fn side_effect_group<C: LayerContainer + ?Sized>(
    container: &mut C,
    parent: GroupId,
    class: &str,
) -> GroupId {
    container.create_group(parent, Some(class))
}
