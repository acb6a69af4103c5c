// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Order-independence properties of domain accumulation.

use proptest::prelude::*;
use strata_compose::{Domain, DomainAccumulator, UnionKind, Value};

fn domain_strategy() -> impl Strategy<Value = Domain> {
    prop_oneof![
        (-1e6_f64..1e6, -1e6_f64..1e6).prop_map(|(a, b)| Domain::Continuous(a.min(b), a.max(b))),
        proptest::collection::vec(0_u8..8, 0..6).prop_map(|v| {
            Domain::Discrete(v.into_iter().map(|i| Value::Text(format!("c{i}"))).collect())
        }),
        proptest::collection::vec(-50_i32..50, 0..6).prop_map(|v| {
            Domain::Discrete(v.into_iter().map(|i| Value::Number(f64::from(i))).collect())
        }),
    ]
}

fn kind_strategy() -> impl Strategy<Value = UnionKind> {
    prop_oneof![Just(UnionKind::Continuous), Just(UnionKind::Discrete)]
}

proptest! {
    #[test]
    fn union_is_commutative(a in domain_strategy(), b in domain_strategy(), kind in kind_strategy()) {
        prop_assert_eq!(a.union(&b, kind), b.union(&a, kind));
    }

    #[test]
    fn union_is_associative(
        a in domain_strategy(),
        b in domain_strategy(),
        c in domain_strategy(),
        kind in kind_strategy(),
    ) {
        let left = a.union(&b, kind).union(&c, kind);
        let right = a.union(&b.union(&c, kind), kind);
        prop_assert_eq!(left, right);
    }

    #[test]
    fn accumulation_ignores_fold_order(
        domains in proptest::collection::vec(domain_strategy(), 1..6),
        kind in kind_strategy(),
    ) {
        let mut forward = DomainAccumulator::new();
        let mut backward = DomainAccumulator::new();
        for d in &domains {
            forward.fold("k", d, kind);
        }
        for d in domains.iter().rev() {
            backward.fold("k", d, kind);
        }
        prop_assert_eq!(forward.get("k"), backward.get("k"));
    }
}
