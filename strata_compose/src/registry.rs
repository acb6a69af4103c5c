// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer instances across composition passes.
//!
//! ## Identity and reuse
//!
//! Each definition gets a [`LayerIdentity`] from its mark and its position after the definitions
//! are sorted by order. A pass reuses the instances stored under an identity (reconfiguring them
//! in place) and creates instances only for identities it has not seen, so stateful layers
//! survive recomposition. Identities absent from a pass are released once the new set is known.
//!
//! ## Keys
//!
//! Instances live in a generational slot store. A [`LayerKey`] stays valid while its instance is
//! live; once the instance is released its slot may be reused, and stale keys stop resolving.
//!
//! ## Atomic passes
//!
//! [`LayerRegistry::create_layers`] validates a whole pass before touching the registry: aliases,
//! dependencies and factory output are checked first. A failing pass leaves the previous layer
//! set exactly as it was.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::config::{LayerConfig, LayerDefinition, ResolveContext, TransformFn};
use crate::dependency::{DependencyError, DependencyGraph};
use crate::error::ComposeError;
use crate::layer::{Layer, LayerFactory, LayerIdentity};
use crate::trace::{LayerEvent, Tracer};

/// Handle to a live layer instance in a [`LayerRegistry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerKey {
    idx: u32,
    generation: u32,
}

impl LayerKey {
    pub(crate) fn new(idx: u32, generation: u32) -> Self {
        Self { idx, generation }
    }
}

impl fmt::Debug for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerKey({}@gen{})", self.idx, self.generation)
    }
}

/// Selects layers by type or by alias.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerCriterion<'a> {
    /// Layers whose [`Layer::formal_name`] equals this.
    ByType(&'a str),
    /// The layer with this alias.
    ByAlias(&'a str),
}

impl LayerCriterion<'_> {
    /// Whether `layer` is selected.
    pub fn matches<L: Layer>(&self, layer: &L) -> bool {
        match self {
            Self::ByType(name) => layer.formal_name() == *name,
            Self::ByAlias(alias) => layer.alias() == *alias,
        }
    }
}

#[derive(Debug)]
struct Entry<L> {
    layer: L,
    identity: LayerIdentity,
}

#[derive(Debug)]
struct Slot<L> {
    generation: u32,
    entry: Option<Entry<L>>,
}

/// Owns the layer instances of one chart unit.
#[derive(Debug)]
pub struct LayerRegistry<L> {
    slots: Vec<Slot<L>>,
    free: Vec<u32>,
    identities: HashMap<LayerIdentity, SmallVec<[LayerKey; 1]>>,
    active: Vec<LayerKey>,
}

impl<L> Default for LayerRegistry<L> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            identities: HashMap::new(),
            active: Vec::new(),
        }
    }
}

struct PlannedInstance<'d> {
    mark: &'d str,
    config: &'d LayerConfig,
    alias: String,
    order: i32,
}

struct PlannedDefinition<'d> {
    identity: LayerIdentity,
    def: &'d LayerDefinition,
    instances: Range<usize>,
}

/// A pass's definitions after sorting, with identities, aliases and orders assigned.
struct Plan<'d> {
    definitions: Vec<PlannedDefinition<'d>>,
    instances: Vec<PlannedInstance<'d>>,
}

struct Resolution {
    /// Planned-instance indices in initialization order.
    order: Vec<usize>,
    transforms: Vec<Option<TransformFn>>,
}

impl<'d> Plan<'d> {
    fn new(definitions: &'d [LayerDefinition]) -> Self {
        let mut sorted: Vec<&LayerDefinition> = definitions.iter().collect();
        sorted.sort_by_key(|d| d.order);

        let mut planned = Vec::with_capacity(sorted.len());
        let mut instances = Vec::new();
        for (position, def) in sorted.into_iter().enumerate() {
            let identity = LayerIdentity::new(def.mark.as_str(), position);
            let start = instances.len();
            let multi = def.configs.len() > 1;
            for (k, config) in def.configs.iter().enumerate() {
                let alias = match &config.name {
                    Some(name) => name.clone(),
                    None if multi => format!("{identity}-{k}"),
                    None => identity.to_string(),
                };
                let offset = i32::try_from(k).unwrap_or(i32::MAX);
                instances.push(PlannedInstance {
                    mark: &def.mark,
                    config,
                    alias,
                    order: def.order.saturating_add(offset),
                });
            }
            planned.push(PlannedDefinition {
                identity,
                def,
                instances: start..instances.len(),
            });
        }
        Self {
            definitions: planned,
            instances,
        }
    }

    /// Resolves every encoding transform and orders the instances by their dependencies.
    fn resolve(&self) -> Result<Resolution, DependencyError> {
        let entries: Vec<(&str, &str)> = self
            .instances
            .iter()
            .map(|p| (p.alias.as_str(), p.mark))
            .collect();
        let cx = ResolveContext::new(&entries);

        let mut graph = DependencyGraph::new();
        let mut transforms = Vec::with_capacity(self.instances.len());
        for (rank, p) in self.instances.iter().enumerate() {
            let (dependencies, transform) = match &p.config.encoding_transform {
                Some(declared) => {
                    let resolved = declared.resolve(&cx);
                    (resolved.dependencies, Some(resolved.transform))
                }
                None => (SmallVec::new(), None),
            };
            graph.insert(p.alias.as_str(), rank, dependencies)?;
            transforms.push(transform);
        }

        let by_alias: HashMap<&str, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, (alias, _))| (*alias, i))
            .collect();
        let order = graph
            .resolve()?
            .into_iter()
            .filter_map(|alias| by_alias.get(alias).copied())
            .collect();
        Ok(Resolution { order, transforms })
    }
}

enum Staged<L> {
    Reuse,
    Fresh(Vec<L>),
}

impl<L: Layer> LayerRegistry<L> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a composition pass over `definitions`.
    ///
    /// Definitions are sorted by `order` (stable). A definition with `n` configs yields `n`
    /// instances with orders `order, order + 1, ...`. Instances are reused per identity when the
    /// stored instance count matches, and created through `factory` otherwise. Every instance is
    /// reconfigured, receives `deps`, its alias and its resolved encoding transform. Identities
    /// not present in this pass are released.
    ///
    /// Returns the live keys in initialization order.
    pub fn create_layers<F: LayerFactory<L> + ?Sized>(
        &mut self,
        factory: &mut F,
        deps: &L::Deps,
        definitions: &[LayerDefinition],
        tracer: &mut Tracer<'_>,
    ) -> Result<Vec<LayerKey>, ComposeError> {
        let plan = Plan::new(definitions);
        let resolution = plan.resolve()?;
        let staged = self.stage(factory, &plan)?;

        let aliases: Vec<&str> = resolution
            .order
            .iter()
            .map(|&i| plan.instances[i].alias.as_str())
            .collect();
        tracer.init_order(&aliases);

        let keys = self.materialize(&plan, staged, &resolution.transforms, deps, tracer);
        let live: HashSet<&LayerIdentity> = plan.definitions.iter().map(|d| &d.identity).collect();
        self.prune(&live, tracer);

        self.active = resolution.order.iter().map(|&i| keys[i]).collect();
        Ok(self.active.clone())
    }

    /// Decides reuse per definition and builds the missing instances.
    fn stage<F: LayerFactory<L> + ?Sized>(
        &self,
        factory: &mut F,
        plan: &Plan<'_>,
    ) -> Result<Vec<Staged<L>>, ComposeError> {
        plan.definitions
            .iter()
            .map(|pd| -> Result<Staged<L>, ComposeError> {
                let wanted = pd.def.configs.len();
                if self
                    .identities
                    .get(&pd.identity)
                    .is_some_and(|keys| keys.len() == wanted)
                {
                    return Ok(Staged::Reuse);
                }
                let fresh = factory.instantiate(&pd.def.mark, &pd.def.configs)?;
                if fresh.len() != wanted {
                    return Err(ComposeError::InstanceCountMismatch {
                        identity: pd.identity.to_string(),
                        expected: wanted,
                        actual: fresh.len(),
                    });
                }
                Ok(Staged::Fresh(fresh))
            })
            .collect()
    }

    /// Commits staged instances and configures every planned instance.
    ///
    /// Returns one key per planned instance, in plan order.
    fn materialize(
        &mut self,
        plan: &Plan<'_>,
        staged: Vec<Staged<L>>,
        transforms: &[Option<TransformFn>],
        deps: &L::Deps,
        tracer: &mut Tracer<'_>,
    ) -> Vec<LayerKey> {
        let mut keys = Vec::with_capacity(plan.instances.len());
        for (pd, staged) in plan.definitions.iter().zip(staged) {
            let (def_keys, reused) = match staged {
                Staged::Reuse => (
                    self.identities
                        .get(&pd.identity)
                        .cloned()
                        .unwrap_or_default(),
                    true,
                ),
                Staged::Fresh(layers) => {
                    if let Some(old) = self.identities.remove(&pd.identity) {
                        for key in old {
                            self.release(key, tracer);
                        }
                    }
                    let fresh: SmallVec<[LayerKey; 1]> = layers
                        .into_iter()
                        .map(|layer| self.insert(layer, pd.identity.clone()))
                        .collect();
                    self.identities.insert(pd.identity.clone(), fresh.clone());
                    (fresh, false)
                }
            };

            for (&key, i) in def_keys.iter().zip(pd.instances.clone()) {
                let planned = &plan.instances[i];
                if let Some(layer) = self.get_mut(key) {
                    let mut config = planned.config.clone();
                    config.order = planned.order;
                    layer.set_config(config);
                    layer.set_dependencies(deps);
                    layer.set_alias(planned.alias.clone());
                    layer.set_encoding_transform(transforms[i].clone());
                    let event = LayerEvent {
                        key,
                        alias: &planned.alias,
                        identity: &pd.identity,
                    };
                    if reused {
                        tracer.layer_reused(&event);
                    } else {
                        tracer.layer_created(&event);
                    }
                }
                keys.push(key);
            }
        }
        keys
    }

    /// Releases every identity not in `live`, lowest position first.
    fn prune(&mut self, live: &HashSet<&LayerIdentity>, tracer: &mut Tracer<'_>) {
        let mut stale: Vec<LayerIdentity> = self
            .identities
            .keys()
            .filter(|identity| !live.contains(identity))
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.mark.cmp(&b.mark)));
        for identity in stale {
            if let Some(keys) = self.identities.remove(&identity) {
                for key in keys {
                    self.release(key, tracer);
                }
            }
        }
    }

    fn insert(&mut self, layer: L, identity: LayerIdentity) -> LayerKey {
        let entry = Some(Entry { layer, identity });
        if let Some(idx) = self.free.pop()
            && let Some(slot) = self.slots.get_mut(idx as usize)
        {
            slot.entry = entry;
            return LayerKey::new(idx, slot.generation);
        }
        let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            entry,
        });
        LayerKey::new(idx, 0)
    }

    /// Tears down one instance and frees its slot.
    fn release(&mut self, key: LayerKey, tracer: &mut Tracer<'_>) {
        let Some(slot) = self.slots.get_mut(key.idx as usize) else {
            return;
        };
        if slot.generation != key.generation {
            return;
        }
        let Some(mut entry) = slot.entry.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.idx);
        tracer.layer_released(&LayerEvent {
            key,
            alias: entry.layer.alias(),
            identity: &entry.identity,
        });
        entry.layer.remove();
    }

    fn entry(&self, key: LayerKey) -> Option<&Entry<L>> {
        let slot = self.slots.get(key.idx as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    /// The instance behind `key`, if it is live.
    pub fn get(&self, key: LayerKey) -> Option<&L> {
        self.entry(key).map(|e| &e.layer)
    }

    /// Mutable access to the instance behind `key`, if it is live.
    pub fn get_mut(&mut self, key: LayerKey) -> Option<&mut L> {
        let slot = self.slots.get_mut(key.idx as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.entry.as_mut().map(|e| &mut e.layer)
    }

    /// The identity `key` was created under.
    pub fn identity_of(&self, key: LayerKey) -> Option<&LayerIdentity> {
        self.entry(key).map(|e| &e.identity)
    }

    /// Keys stored under an identity, in config order.
    pub fn identity_keys(&self, identity: &LayerIdentity) -> Option<&[LayerKey]> {
        self.identities.get(identity).map(|keys| keys.as_slice())
    }

    /// Live keys in initialization order.
    pub fn layers(&self) -> &[LayerKey] {
        &self.active
    }

    /// Live layers in initialization order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerKey, &L)> {
        self.active
            .iter()
            .filter_map(|&key| self.get(key).map(|layer| (key, layer)))
    }

    /// Configs of the live layers in initialization order.
    pub fn configs(&self) -> impl Iterator<Item = &LayerConfig> {
        self.iter().map(|(_, layer)| layer.config())
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no instance is live.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Keys of the live layers `criterion` selects, in initialization order.
    pub fn layers_by(&self, criterion: LayerCriterion<'_>) -> Vec<LayerKey> {
        self.iter()
            .filter(|(_, layer)| criterion.matches(*layer))
            .map(|(key, _)| key)
            .collect()
    }

    /// Releases the live layers `criterion` selects and returns how many were released.
    ///
    /// An identity that loses some of its instances is recreated in full by the next pass.
    pub fn remove_layers_by(
        &mut self,
        criterion: LayerCriterion<'_>,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        let doomed = self.layers_by(criterion);
        if doomed.is_empty() {
            return 0;
        }
        self.active.retain(|key| !doomed.contains(key));
        self.identities.retain(|_, keys| {
            keys.retain(|key| !doomed.contains(key));
            !keys.is_empty()
        });
        for &key in &doomed {
            self.release(key, tracer);
        }
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;
    use crate::axis::LayerAxes;
    use crate::config::Encoding;
    use crate::data::ModelHandle;
    use crate::domain::LayerDomain;
    use crate::layer::MarkTable;
    use crate::render::GroupId;

    #[derive(Debug, Default)]
    struct Stub {
        config: LayerConfig,
        alias: String,
        removed: bool,
    }

    impl Layer for Stub {
        type Deps = ();

        fn formal_name(&self) -> &'static str {
            "stub"
        }
        fn config(&self) -> &LayerConfig {
            &self.config
        }
        fn set_config(&mut self, config: LayerConfig) {
            self.config = config;
        }
        fn set_dependencies(&mut self, _: &()) {}
        fn alias(&self) -> &str {
            &self.alias
        }
        fn set_alias(&mut self, alias: String) {
            self.alias = alias;
        }
        fn set_encoding_transform(&mut self, _: Option<TransformFn>) {}
        fn set_data(&mut self, _: ModelHandle) {}
        fn set_axes(&mut self, _: LayerAxes) {}
        fn data_domain(&self) -> Option<LayerDomain> {
            None
        }
        fn mount(&mut self, _: GroupId) {}
        fn remove(&mut self) {
            self.removed = true;
        }
    }

    fn table() -> MarkTable<Stub> {
        MarkTable::new().with_mark("bar", |_: &LayerConfig| Stub::default())
    }

    fn bar(order: i32) -> LayerDefinition {
        let config = LayerConfig::new(Encoding::default().with_x("x"));
        LayerDefinition::new("bar", config).with_order(order)
    }

    #[test]
    fn stale_keys_stop_resolving_after_slot_reuse() {
        let mut reg = LayerRegistry::new();
        let mut factory = table();
        let first = reg
            .create_layers(&mut factory, &(), &[bar(0)], &mut Tracer::none())
            .unwrap();
        let removed = reg.remove_layers_by(LayerCriterion::ByAlias("bar-0"), &mut Tracer::none());
        assert_eq!(removed, 1);
        assert!(reg.get(first[0]).is_none());

        let second = reg
            .create_layers(&mut factory, &(), &[bar(0)], &mut Tracer::none())
            .unwrap();
        assert_ne!(first[0], second[0]);
        assert!(reg.get(first[0]).is_none());
        assert_eq!(reg.get(second[0]).map(Stub::alias), Some("bar-0"));
    }

    #[test]
    fn key_debug_shows_generation() {
        assert_eq!(format!("{:?}", LayerKey::new(3, 1)), "LayerKey(3@gen1)");
    }

    #[test]
    fn multi_config_aliases_are_suffixed() {
        let mut reg = LayerRegistry::new();
        let def = LayerDefinition::multi("bar", vec![LayerConfig::default(); 2]);
        let keys = reg
            .create_layers(&mut table(), &(), &[def], &mut Tracer::none())
            .unwrap();
        let aliases: Vec<_> = keys.iter().filter_map(|&k| reg.get(k)).map(Stub::alias).collect();
        assert_eq!(aliases, ["bar-0-0", "bar-0-1"]);
    }

    #[test]
    fn explicit_names_collide() {
        let mut reg = LayerRegistry::new();
        let a = LayerDefinition::new("bar", LayerConfig::default().with_name("same"));
        let b = LayerDefinition::new("bar", LayerConfig::default().with_name("same")).with_order(1);
        let err = reg
            .create_layers(&mut table(), &(), &[a, b], &mut Tracer::none())
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::Dependency(DependencyError::DuplicateAlias("same".into()))
        );
        assert!(reg.is_empty());
    }
}
