// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer capability set and layer factories.
//!
//! Concrete layers (bars, lines, points, ...) are implemented outside this crate. Composition
//! drives them only through [`Layer`], and creates them only through a [`LayerFactory`].

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Size;

use crate::axis::LayerAxes;
use crate::config::{LayerConfig, TransformFn};
use crate::data::ModelHandle;
use crate::domain::LayerDomain;
use crate::render::{DataProps, GroupId};
use crate::OrderedMap;

/// A stateful layer instance.
pub trait Layer {
    /// Context shared with every layer of a unit (for example a text measurer).
    type Deps: ?Sized;

    /// The layer type's name, used by [`LayerCriterion::ByType`](crate::LayerCriterion).
    fn formal_name(&self) -> &'static str;

    /// The current configuration.
    fn config(&self) -> &LayerConfig;

    /// Replaces the configuration.
    fn set_config(&mut self, config: LayerConfig);

    /// Injects the unit's shared context.
    fn set_dependencies(&mut self, deps: &Self::Deps);

    /// The layer's alias, unique within its unit.
    fn alias(&self) -> &str;

    /// Sets the alias.
    fn set_alias(&mut self, alias: String);

    /// Sets the resolved encoding transform, or clears it.
    fn set_encoding_transform(&mut self, transform: Option<TransformFn>);

    /// Attaches the layer's data.
    fn set_data(&mut self, data: ModelHandle);

    /// Attaches the layer's axes.
    fn set_axes(&mut self, axes: LayerAxes);

    /// The domain of the layer's positional data, once data is attached.
    fn data_domain(&self) -> Option<LayerDomain>;

    /// Sets the drawing area.
    fn set_measurement(&mut self, measurement: Size) {
        _ = measurement;
    }

    /// Passes unit-level data properties.
    fn set_data_props(&mut self, props: &DataProps) {
        _ = props;
    }

    /// Draws the layer into `group`.
    fn mount(&mut self, group: GroupId);

    /// Releases the layer's resources. Called once, when the instance leaves its registry.
    fn remove(&mut self);
}

impl<L: Layer + ?Sized> Layer for Box<L> {
    type Deps = L::Deps;

    fn formal_name(&self) -> &'static str {
        (**self).formal_name()
    }

    fn config(&self) -> &LayerConfig {
        (**self).config()
    }

    fn set_config(&mut self, config: LayerConfig) {
        (**self).set_config(config);
    }

    fn set_dependencies(&mut self, deps: &Self::Deps) {
        (**self).set_dependencies(deps);
    }

    fn alias(&self) -> &str {
        (**self).alias()
    }

    fn set_alias(&mut self, alias: String) {
        (**self).set_alias(alias);
    }

    fn set_encoding_transform(&mut self, transform: Option<TransformFn>) {
        (**self).set_encoding_transform(transform);
    }

    fn set_data(&mut self, data: ModelHandle) {
        (**self).set_data(data);
    }

    fn set_axes(&mut self, axes: LayerAxes) {
        (**self).set_axes(axes);
    }

    fn data_domain(&self) -> Option<LayerDomain> {
        (**self).data_domain()
    }

    fn set_measurement(&mut self, measurement: Size) {
        (**self).set_measurement(measurement);
    }

    fn set_data_props(&mut self, props: &DataProps) {
        (**self).set_data_props(props);
    }

    fn mount(&mut self, group: GroupId) {
        (**self).mount(group);
    }

    fn remove(&mut self) {
        (**self).remove();
    }
}

/// No layer type is registered for a mark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMark {
    /// The unresolved mark.
    pub mark: String,
}

impl fmt::Display for UnknownMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no layer type registered for mark `{}`", self.mark)
    }
}

impl core::error::Error for UnknownMark {}

/// Creates layer instances for a mark.
pub trait LayerFactory<L> {
    /// Creates one instance per config.
    ///
    /// The instances are configured by the caller afterwards; `configs` is only a hint (for
    /// example to pick a variant of the mark).
    fn instantiate(&mut self, mark: &str, configs: &[LayerConfig]) -> Result<Vec<L>, UnknownMark>;
}

/// Builds one layer from its config.
pub type LayerConstructor<L> = Box<dyn Fn(&LayerConfig) -> L>;

/// A [`LayerFactory`] backed by a mark-to-constructor table.
pub struct MarkTable<L> {
    constructors: OrderedMap<String, LayerConstructor<L>>,
}

impl<L> Default for MarkTable<L> {
    fn default() -> Self {
        Self {
            constructors: OrderedMap::default(),
        }
    }
}

impl<L> fmt::Debug for MarkTable<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkTable")
            .field("marks", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<L> MarkTable<L> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the constructor for `mark`.
    pub fn register(
        &mut self,
        mark: impl Into<String>,
        constructor: impl Fn(&LayerConfig) -> L + 'static,
    ) {
        self.constructors.insert(mark.into(), Box::new(constructor));
    }

    /// Builder form of [`MarkTable::register`].
    pub fn with_mark(
        mut self,
        mark: impl Into<String>,
        constructor: impl Fn(&LayerConfig) -> L + 'static,
    ) -> Self {
        self.register(mark, constructor);
        self
    }

    /// Whether `mark` is registered.
    pub fn contains(&self, mark: &str) -> bool {
        self.constructors.contains_key(mark)
    }
}

impl<L> LayerFactory<L> for MarkTable<L> {
    fn instantiate(&mut self, mark: &str, configs: &[LayerConfig]) -> Result<Vec<L>, UnknownMark> {
        let constructor = self.constructors.get(mark).ok_or_else(|| UnknownMark {
            mark: mark.into(),
        })?;
        Ok(configs.iter().map(|c| constructor(c)).collect())
    }
}

/// The stable identity of a definition: its mark and its position after sorting by order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerIdentity {
    /// Mark of the definition.
    pub mark: String,
    /// Position among the sorted definitions.
    pub position: usize,
}

impl LayerIdentity {
    /// Creates an identity.
    pub fn new(mark: impl Into<String>, position: usize) -> Self {
        Self {
            mark: mark.into(),
            position,
        }
    }
}

impl fmt::Display for LayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mark, self.position)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;

    use super::*;

    #[test]
    fn identity_display() {
        assert_eq!(LayerIdentity::new("bar", 2).to_string(), "bar-2");
    }

    #[test]
    fn mark_table_constructs_per_config() {
        let mut table = MarkTable::new().with_mark("bar", |c: &LayerConfig| c.render);
        let configs = [LayerConfig::default(), LayerConfig::default().with_render(false)];
        assert_eq!(table.instantiate("bar", &configs), Ok(alloc::vec![true, false]));
        assert_eq!(
            table.instantiate("area", &configs),
            Err(UnknownMark { mark: "area".into() })
        );
        assert!(table.contains("bar"));
    }
}
