// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared axis domains.
//!
//! Every layer reports the domain of the data it encodes on `x` and `y`. Layers that share an
//! axis must agree on one domain for it, so contributions are folded into a single running
//! domain per axis field. The fold uses a type-aware union: numeric fields merge as intervals,
//! categorical and temporal fields merge as sets. Both are commutative and associative, so the
//! result is independent of layer order.
//!
//! [`adjusted_domain`] aligns the zero baselines of two paired numeric domains (for example a
//! dual-axis chart) so the axes read consistently.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::axis::{AxisFields, AxisIndexMap, Side};
use crate::field::{FieldDef, FieldsConfig, UnionKind, Value};
use crate::layer::Layer;
use crate::registry::{LayerKey, LayerRegistry};
use crate::trace::{SkipReason, SkippedContribution, Tracer};
use crate::OrderedMap;

/// A value domain: a numeric interval or a set of discrete values.
#[derive(Clone, Debug, PartialEq)]
pub enum Domain {
    /// Closed numeric interval `(min, max)`.
    Continuous(f64, f64),
    /// Discrete values. Values produced by [`Domain::union`] are sorted and deduplicated.
    Discrete(Vec<Value>),
}

impl Domain {
    /// The empty domain.
    pub fn empty() -> Self {
        Self::Discrete(Vec::new())
    }

    /// Builds a discrete domain from values (not normalized).
    pub fn discrete<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::Discrete(values.into_iter().map(Into::into).collect())
    }

    /// Whether the domain holds no values.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Continuous(..) => false,
            Self::Discrete(values) => values.is_empty(),
        }
    }

    /// Returns the interval bounds for a continuous domain.
    pub fn as_interval(&self) -> Option<(f64, f64)> {
        match self {
            Self::Continuous(min, max) => Some((*min, *max)),
            Self::Discrete(_) => None,
        }
    }

    /// Returns the values of a discrete domain.
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Self::Continuous(..) => None,
            Self::Discrete(values) => Some(values),
        }
    }

    /// Merges two domains with the given operator.
    ///
    /// [`UnionKind::Continuous`] takes the numeric extent of both sides; interval endpoints and
    /// numeric discrete values count, text and non-finite numbers are ignored. If nothing numeric
    /// remains the result is empty.
    ///
    /// [`UnionKind::Discrete`] collects the values of both sides (interval endpoints count as
    /// values) into a sorted, deduplicated set.
    pub fn union(&self, other: &Self, kind: UnionKind) -> Self {
        match kind {
            UnionKind::Continuous => {
                let mut extent = Extent::default();
                extent.include(self);
                extent.include(other);
                extent.into_domain()
            }
            UnionKind::Discrete => {
                let mut values = Vec::new();
                self.push_values(&mut values);
                other.push_values(&mut values);
                values.sort_by(Value::total_cmp);
                values.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
                Self::Discrete(values)
            }
        }
    }

    /// Normalizes a single domain under `kind` (its union with the empty domain).
    pub fn normalized(&self, kind: UnionKind) -> Self {
        self.union(&Self::empty(), kind)
    }

    fn push_values(&self, out: &mut Vec<Value>) {
        match self {
            Self::Continuous(min, max) => {
                out.push(Value::Number(*min));
                out.push(Value::Number(*max));
            }
            Self::Discrete(values) => out.extend(values.iter().cloned()),
        }
    }
}

#[derive(Default)]
struct Extent {
    bounds: Option<(f64, f64)>,
}

impl Extent {
    fn include_value(&mut self, v: f64) {
        if !v.is_finite() {
            return;
        }
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(v), max.max(v)),
            None => (v, v),
        });
    }

    fn include(&mut self, domain: &Domain) {
        match domain {
            Domain::Continuous(a, b) => {
                self.include_value(*a);
                self.include_value(*b);
            }
            Domain::Discrete(values) => {
                for v in values.iter().filter_map(Value::as_number) {
                    self.include_value(v);
                }
            }
        }
    }

    fn into_domain(self) -> Domain {
        match self.bounds {
            Some((min, max)) => Domain::Continuous(min, max),
            None => Domain::empty(),
        }
    }
}

/// Running per-key domains, rebuilt from scratch for every computation.
#[derive(Clone, Debug, Default)]
pub struct DomainAccumulator {
    domains: OrderedMap<String, Domain>,
}

impl DomainAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `domain` into the running domain for `key`.
    pub fn fold(&mut self, key: &str, domain: &Domain, kind: UnionKind) {
        match self.domains.get_mut(key) {
            Some(running) => *running = running.union(domain, kind),
            None => {
                self.domains
                    .insert(key.to_string(), domain.normalized(kind));
            }
        }
    }

    /// Returns the running domain for `key`.
    pub fn get(&self, key: &str) -> Option<&Domain> {
        self.domains.get(key)
    }

    /// Consumes the accumulator, returning the merged domains.
    pub fn into_domains(self) -> OrderedMap<String, Domain> {
        self.domains
    }
}

/// Per-side domains reported by a layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerDomain {
    /// Domain of the `x` encoding.
    pub x: Option<Domain>,
    /// Domain of the `y` encoding.
    pub y: Option<Domain>,
}

impl LayerDomain {
    /// Returns the domain for a side.
    pub fn get(&self, side: Side) -> Option<&Domain> {
        match side {
            Side::X => self.x.as_ref(),
            Side::Y => self.y.as_ref(),
        }
    }
}

/// Computes the shared domain of every axis field across `layers`.
///
/// A layer contributes when it reports a data domain and its config does not disable
/// `calculate_domain`. Each side's domain is folded under the key of the axis field group the
/// layer is bound to on that side.
///
/// Every key is folded with one union operator: that of the first group member known to
/// `fields_config`. When no member is known, the contributing encoding fields decide, and a
/// discrete field among them makes the whole key discrete.
///
/// Contributions whose encoding field is absent, unknown to `fields_config`, or whose axis
/// index does not resolve to a field group are skipped and reported through `tracer`.
pub fn union_domain_from_layers<L: Layer>(
    registry: &LayerRegistry<L>,
    layers: &[LayerKey],
    axis_fields: &AxisFields,
    axis_index: &AxisIndexMap,
    fields_config: &FieldsConfig,
    tracer: &mut Tracer<'_>,
) -> OrderedMap<String, Domain> {
    let mut pending: OrderedMap<String, Pending> = OrderedMap::default();
    for &key in layers {
        let Some(layer) = registry.get(key) else {
            continue;
        };
        let config = layer.config();
        if !config.calculate_domain {
            continue;
        }
        let Some(layer_domain) = layer.data_domain() else {
            continue;
        };
        let slots = axis_index.get(&key).copied().unwrap_or_default();
        for side in Side::BOTH {
            let Some(domain) = layer_domain.get(side) else {
                continue;
            };
            let field = config.encoding.field(side);
            let skip = |reason| SkippedContribution {
                key,
                side,
                field,
                reason,
            };
            let Some(field) = field else {
                tracer.contribution_skipped(&skip(SkipReason::MissingEncoding));
                continue;
            };
            let Some(def) = fields_config.get(field) else {
                tracer.contribution_skipped(&skip(SkipReason::UnknownField));
                continue;
            };
            let Some(group) = slots
                .get(side)
                .resolve()
                .and_then(|i| axis_fields.side(side).get(i))
            else {
                tracer.contribution_skipped(&skip(SkipReason::UnmatchedAxis));
                continue;
            };
            let entry = pending.entry(group.to_string()).or_insert_with(|| Pending {
                group_kind: group
                    .members()
                    .iter()
                    .find_map(|m| fields_config.get(m))
                    .map(FieldDef::union_kind),
                field_kind: UnionKind::Continuous,
                domains: Vec::new(),
            });
            if def.union_kind() == UnionKind::Discrete {
                entry.field_kind = UnionKind::Discrete;
            }
            entry.domains.push(domain.clone());
        }
    }

    let mut acc = DomainAccumulator::new();
    for (key, p) in &pending {
        let kind = p.group_kind.unwrap_or(p.field_kind);
        for domain in &p.domains {
            acc.fold(key, domain, kind);
        }
    }
    acc.into_domains()
}

/// Contributions to one key, held until the key's operator is known.
struct Pending {
    group_kind: Option<UnionKind>,
    field_kind: UnionKind,
    domains: Vec<Domain>,
}

/// A pair of aligned domains returned by [`adjusted_domain`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdjustedDomain {
    /// Upper bounds of the two domains.
    pub max: [f64; 2],
    /// Lower bounds of the two domains.
    pub min: [f64; 2],
}

/// Aligns the zero baselines of two paired numeric domains.
///
/// `max[i]` and `min[i]` are the bounds of domain `i`.
///
/// - All four bounds strictly positive: both minimums floor to `0`.
/// - All four strictly negative: both maximums ceil to `0`.
/// - Otherwise, when the zero-crossing ratios `max[i] / (max[i] - min[i])` differ, the domain
///   with the smaller ratio supplies `min / max`, and the other domain's minimum is rescaled by
///   it so both zero lines sit at the same relative height. Equal ratios are left alone, as are
///   pairs where the ratio or rescale is undefined (zero-width domains, zero maximum).
pub fn adjusted_domain(mut max: [f64; 2], mut min: [f64; 2]) -> AdjustedDomain {
    if min.iter().chain(max.iter()).all(|&v| v > 0.0) {
        min = [0.0, 0.0];
        return AdjustedDomain { max, min };
    }
    if min.iter().chain(max.iter()).all(|&v| v < 0.0) {
        max = [0.0, 0.0];
        return AdjustedDomain { max, min };
    }

    let r0 = max[0] / (max[0] - min[0]);
    let r1 = max[1] / (max[1] - min[1]);
    if !r0.is_finite() || !r1.is_finite() || r0 == r1 {
        return AdjustedDomain { max, min };
    }

    let (src, dst) = if r0 < r1 { (0, 1) } else { (1, 0) };
    let rescaled = min[src] / max[src] * max[dst];
    if rescaled.is_finite() {
        min[dst] = rescaled;
    }
    AdjustedDomain { max, min }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn zero_ratio(max: f64, min: f64) -> f64 {
        max / (max - min)
    }

    #[test]
    fn interval_union_takes_outer_bounds() {
        let a = Domain::Continuous(0.0, 10.0);
        let b = Domain::Continuous(5.0, 20.0);
        assert_eq!(
            a.union(&b, UnionKind::Continuous),
            Domain::Continuous(0.0, 20.0)
        );
    }

    #[test]
    fn discrete_union_dedupes_values() {
        let a = Domain::discrete(["a", "b"]);
        let b = Domain::discrete(["b", "c"]);
        assert_eq!(
            a.union(&b, UnionKind::Discrete),
            Domain::discrete(["a", "b", "c"])
        );
    }

    #[test]
    fn continuous_union_of_text_only_is_empty() {
        let a = Domain::discrete(["x"]);
        assert!(a.union(&Domain::empty(), UnionKind::Continuous).is_empty());
    }

    #[test]
    fn accumulator_folds_by_key() {
        let mut acc = DomainAccumulator::new();
        acc.fold("Sales", &Domain::Continuous(3.0, 4.0), UnionKind::Continuous);
        acc.fold("Sales", &Domain::Continuous(-1.0, 2.0), UnionKind::Continuous);
        acc.fold("Region", &Domain::discrete(["west"]), UnionKind::Discrete);
        assert_eq!(acc.get("Sales"), Some(&Domain::Continuous(-1.0, 4.0)));
        assert_eq!(acc.get("Region"), Some(&Domain::discrete(["west"])));
        assert_eq!(acc.into_domains().len(), 2);
    }

    #[test]
    fn all_positive_floors_minimums() {
        let out = adjusted_domain([10.0, 8.0], [2.0, 3.0]);
        assert_eq!(out.min, [0.0, 0.0]);
        assert_eq!(out.max, [10.0, 8.0]);
    }

    #[test]
    fn all_negative_ceils_maximums() {
        let out = adjusted_domain([-1.0, -2.0], [-10.0, -8.0]);
        assert_eq!(out.max, [0.0, 0.0]);
        assert_eq!(out.min, [-10.0, -8.0]);
    }

    #[test]
    fn mixed_sign_aligns_zero_lines_by_moving_one_minimum() {
        let max = [10.0, 10.0];
        let min = [-10.0, -5.0];
        let out = adjusted_domain(max, min);
        assert_eq!(out.max, max);
        assert_eq!(out.min[0], -10.0);
        assert_eq!(out.min[1], -10.0);
        let r0 = zero_ratio(out.max[0], out.min[0]);
        let r1 = zero_ratio(out.max[1], out.min[1]);
        assert!((r0 - r1).abs() < 1e-12, "ratios {r0} and {r1} differ");
    }

    #[test]
    fn mixed_sign_with_larger_first_ratio_moves_first_minimum() {
        let out = adjusted_domain([20.0, 10.0], [-5.0, -10.0]);
        assert_eq!(out.min[1], -10.0);
        assert_eq!(out.min[0], -20.0);
    }

    #[test]
    fn equal_ratios_are_left_alone() {
        let out = adjusted_domain([10.0, 20.0], [-10.0, -20.0]);
        assert_eq!(out.min, [-10.0, -20.0]);
        assert_eq!(out.max, [10.0, 20.0]);
    }

    #[test]
    fn zero_maximum_does_not_produce_infinities() {
        let out = adjusted_domain([0.0, 10.0], [-5.0, -5.0]);
        assert!(out.min.iter().all(|v| v.is_finite()), "{out:?}");
    }

    #[test]
    fn discrete_union_sorts_numbers_before_text() {
        let a = Domain::Discrete(vec![Value::from("b"), Value::from(2.0)]);
        let b = Domain::Discrete(vec![Value::from(1.0)]);
        assert_eq!(
            a.union(&b, UnionKind::Discrete),
            Domain::Discrete(vec![Value::from(1.0), Value::from(2.0), Value::from("b")])
        );
    }
}
