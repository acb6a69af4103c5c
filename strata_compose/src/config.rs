// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative layer configuration.
//!
//! A [`LayerDefinition`] names a mark and carries one or more [`LayerConfig`]s. Each config
//! becomes one layer instance. Configs are plain values with `with_*` builders; composition
//! fills in `order` and, if absent, the alias.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;

use crate::axis::Side;
use crate::data::ModelTransform;

/// Field references per encoding channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoding {
    /// Field on the `x` position channel.
    pub x: Option<String>,
    /// Field on the `y` position channel.
    pub y: Option<String>,
    /// Field on the color channel.
    pub color: Option<String>,
    /// Field on the size channel.
    pub size: Option<String>,
    /// Field on the shape channel.
    pub shape: Option<String>,
}

impl Encoding {
    /// Positional field of a side.
    pub fn field(&self, side: Side) -> Option<&str> {
        match side {
            Side::X => self.x.as_deref(),
            Side::Y => self.y.as_deref(),
        }
    }

    /// Fields on the retinal channels (color, size, shape), in that order.
    pub fn retinal(&self) -> impl Iterator<Item = &str> {
        [&self.color, &self.size, &self.shape]
            .into_iter()
            .filter_map(|f| f.as_deref())
    }

    /// Sets the `x` field.
    pub fn with_x(mut self, field: impl Into<String>) -> Self {
        self.x = Some(field.into());
        self
    }

    /// Sets the `y` field.
    pub fn with_y(mut self, field: impl Into<String>) -> Self {
        self.y = Some(field.into());
        self
    }

    /// Sets the color field.
    pub fn with_color(mut self, field: impl Into<String>) -> Self {
        self.color = Some(field.into());
        self
    }

    /// Sets the size field.
    pub fn with_size(mut self, field: impl Into<String>) -> Self {
        self.size = Some(field.into());
        self
    }

    /// Sets the shape field.
    pub fn with_shape(mut self, field: impl Into<String>) -> Self {
        self.shape = Some(field.into());
        self
    }
}

/// Per-side field used for axis lookup instead of the encoded field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisOverride {
    /// Override on `x`.
    pub x: Option<String>,
    /// Override on `y`.
    pub y: Option<String>,
}

/// Where a layer takes its data from.
#[derive(Clone, Default)]
pub enum DataSource {
    /// The unit's own data model.
    #[default]
    Parent,
    /// A transformed model produced by
    /// [`transform_data_models`](crate::transform_data_models) under this name.
    Named(String),
    /// A model derived from the parent for this layer only.
    Derive(ModelTransform),
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => f.write_str("Parent"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// Rewrites encoded points in place.
pub type TransformFn = Arc<dyn Fn(&mut [Point])>;

/// Output of a resolvable encoding transform.
#[derive(Clone)]
pub struct Resolved {
    /// Aliases whose layers must be initialized first.
    pub dependencies: SmallVec<[String; 2]>,
    /// The concrete transform.
    pub transform: TransformFn,
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// The layers live in a composition pass, as seen by resolvable transforms.
#[derive(Clone, Copy, Debug)]
pub struct ResolveContext<'a> {
    entries: &'a [(&'a str, &'a str)],
}

impl<'a> ResolveContext<'a> {
    /// Wraps `(alias, mark)` pairs in initialization-candidate order.
    pub fn new(entries: &'a [(&'a str, &'a str)]) -> Self {
        Self { entries }
    }

    /// Aliases of every live layer.
    pub fn aliases(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(|(alias, _)| *alias)
    }

    /// Whether a layer with this alias is live.
    pub fn contains(&self, alias: &str) -> bool {
        self.entries.iter().any(|(a, _)| *a == alias)
    }

    /// Aliases of the live layers of a mark.
    pub fn aliases_of_mark<'m>(&self, mark: &'m str) -> impl Iterator<Item = &'a str> + 'm
    where
        'a: 'm,
    {
        self.entries
            .iter()
            .filter(move |(_, m)| *m == mark)
            .map(|(alias, _)| *alias)
    }
}

/// A layer's encoding transform declaration.
#[derive(Clone)]
pub enum EncodingTransform {
    /// A transform with no dependencies.
    Plain(TransformFn),
    /// A transform computed from the composition context, with the aliases it reads from.
    Resolvable(Arc<dyn Fn(&ResolveContext<'_>) -> Resolved>),
}

impl EncodingTransform {
    /// Resolves the declaration against `cx`.
    pub fn resolve(&self, cx: &ResolveContext<'_>) -> Resolved {
        match self {
            Self::Plain(transform) => Resolved {
                dependencies: SmallVec::new(),
                transform: transform.clone(),
            },
            Self::Resolvable(resolve) => resolve(cx),
        }
    }
}

impl fmt::Debug for EncodingTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Plain(..)"),
            Self::Resolvable(_) => f.write_str("Resolvable(..)"),
        }
    }
}

/// Configuration of one layer instance.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    /// Explicit alias; defaults to the layer identity when absent.
    pub name: Option<String>,
    /// Draw order. Assigned during composition from the definition's order.
    pub order: i32,
    /// Field references per channel.
    pub encoding: Encoding,
    /// Fields used for axis lookup in place of the encoded ones.
    pub axis: AxisOverride,
    /// Data source.
    pub source: DataSource,
    /// Whether the layer's domain takes part in the shared axis domain.
    pub calculate_domain: bool,
    /// Whether the layer is mounted when rendering.
    pub render: bool,
    /// Optional encoding transform.
    pub encoding_transform: Option<EncodingTransform>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            name: None,
            order: 0,
            encoding: Encoding::default(),
            axis: AxisOverride::default(),
            source: DataSource::Parent,
            calculate_domain: true,
            render: true,
            encoding_transform: None,
        }
    }
}

impl LayerConfig {
    /// A config with the given encoding.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }

    /// Field used for axis lookup on a side: the override, else the encoded field.
    pub fn axis_field(&self, side: Side) -> Option<&str> {
        let over = match side {
            Side::X => self.axis.x.as_deref(),
            Side::Y => self.axis.y.as_deref(),
        };
        over.or_else(|| self.encoding.field(side))
    }

    /// Sets the alias.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the axis lookup field of a side.
    pub fn with_axis_field(mut self, side: Side, field: impl Into<String>) -> Self {
        let field = Some(field.into());
        match side {
            Side::X => self.axis.x = field,
            Side::Y => self.axis.y = field,
        }
        self
    }

    /// Sets the data source.
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    /// Sets whether the layer contributes to shared domains.
    pub fn with_calculate_domain(mut self, calculate: bool) -> Self {
        self.calculate_domain = calculate;
        self
    }

    /// Sets whether the layer is mounted.
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Sets the encoding transform.
    pub fn with_encoding_transform(mut self, transform: EncodingTransform) -> Self {
        self.encoding_transform = Some(transform);
        self
    }
}

/// A mark with one or more layer configs, ordered among its siblings by `order`.
#[derive(Clone, Debug)]
pub struct LayerDefinition {
    /// Mark type resolved by the layer factory.
    pub mark: String,
    /// One config per instance.
    pub configs: SmallVec<[LayerConfig; 1]>,
    /// Declared draw order.
    pub order: i32,
}

impl LayerDefinition {
    /// A single-instance definition.
    pub fn new(mark: impl Into<String>, config: LayerConfig) -> Self {
        Self::multi(mark, [config])
    }

    /// A definition expanding to one instance per config.
    pub fn multi(mark: impl Into<String>, configs: impl IntoIterator<Item = LayerConfig>) -> Self {
        Self {
            mark: mark.into(),
            configs: configs.into_iter().collect(),
            order: 0,
        }
    }

    /// Sets the declared order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn axis_override_takes_precedence() {
        let config = LayerConfig::new(Encoding::default().with_x("Year").with_y("Sales"))
            .with_axis_field(Side::Y, "Profit");
        assert_eq!(config.axis_field(Side::X), Some("Year"));
        assert_eq!(config.axis_field(Side::Y), Some("Profit"));
    }

    #[test]
    fn retinal_channels_in_order() {
        let enc = Encoding::default().with_shape("Kind").with_color("Region");
        assert_eq!(enc.retinal().collect::<Vec<_>>(), ["Region", "Kind"]);
    }

    #[test]
    fn defaults_render_and_contribute() {
        let config = LayerConfig::default();
        assert!(config.calculate_domain);
        assert!(config.render);
        assert!(config.encoding_transform.is_none());
    }

    #[test]
    fn plain_transform_resolves_without_dependencies() {
        let t = EncodingTransform::Plain(Arc::new(|points: &mut [Point]| {
            for p in points {
                p.y += 1.0;
            }
        }));
        let resolved = t.resolve(&ResolveContext::new(&[]));
        assert!(resolved.dependencies.is_empty());
        let mut pts = [Point::new(0.0, 0.0)];
        (resolved.transform)(&mut pts);
        assert_eq!(pts[0], Point::new(0.0, 1.0));
    }

    #[test]
    fn context_filters_by_mark() {
        let entries = [("bar-0", "bar"), ("line-1", "line"), ("totals", "bar")];
        let cx = ResolveContext::new(&entries);
        assert_eq!(cx.aliases_of_mark("bar").collect::<Vec<_>>(), ["bar-0", "totals"]);
        assert!(cx.contains("line-1"));
        assert!(!cx.contains("area-2"));
    }
}
