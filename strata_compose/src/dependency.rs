// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Initialization order of layers with encoding-transform dependencies.
//!
//! A layer whose encoding transform reads another layer's output must be initialized after it.
//! [`DependencyGraph::resolve`] produces an order where every alias follows all of its
//! dependencies. Among aliases that are ready at the same time, the lower rank (the layer's
//! position in the pass) comes first, so the order is deterministic.

extern crate alloc;

use alloc::collections::BinaryHeap;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Reverse;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

/// A fatal problem with a pass's dependency declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DependencyError {
    /// Two layers claim the same alias.
    DuplicateAlias(String),
    /// A layer depends on an alias that is not live in the pass.
    UnknownDependency {
        /// The depending layer.
        alias: String,
        /// The missing alias.
        dependency: String,
    },
    /// The dependencies form a cycle through these aliases.
    Cycle {
        /// Aliases on the cycle, each depending on the next; the last depends on the first.
        aliases: Vec<String>,
    },
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAlias(alias) => write!(f, "layer alias `{alias}` is used twice"),
            Self::UnknownDependency { alias, dependency } => {
                write!(f, "layer `{alias}` depends on unknown layer `{dependency}`")
            }
            Self::Cycle { aliases } => {
                f.write_str("layer dependency cycle: ")?;
                for alias in aliases {
                    write!(f, "{alias} -> ")?;
                }
                match aliases.first() {
                    Some(first) => f.write_str(first),
                    None => Ok(()),
                }
            }
        }
    }
}

impl core::error::Error for DependencyError {}

#[derive(Clone, Debug)]
struct Node {
    alias: String,
    rank: usize,
    deps: SmallVec<[String; 2]>,
}

/// Alias to dependency-list graph for one pass.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    by_alias: HashMap<String, usize>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// `rank` breaks ties between nodes that are ready at the same time.
    pub fn insert(
        &mut self,
        alias: impl Into<String>,
        rank: usize,
        deps: impl IntoIterator<Item = String>,
    ) -> Result<(), DependencyError> {
        let alias = alias.into();
        if self.by_alias.contains_key(&alias) {
            return Err(DependencyError::DuplicateAlias(alias));
        }
        self.by_alias.insert(alias.clone(), self.nodes.len());
        self.nodes.push(Node {
            alias,
            rank,
            deps: deps.into_iter().collect(),
        });
        Ok(())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Computes the initialization order.
    pub fn resolve(&self) -> Result<Vec<&str>, DependencyError> {
        let n = self.nodes.len();
        let mut pending = alloc::vec![0_usize; n];
        let mut dependents: Vec<SmallVec<[usize; 2]>> = alloc::vec![SmallVec::new(); n];
        for (i, node) in self.nodes.iter().enumerate() {
            for dep in &node.deps {
                let Some(&d) = self.by_alias.get(dep) else {
                    return Err(DependencyError::UnknownDependency {
                        alias: node.alias.clone(),
                        dependency: dep.clone(),
                    });
                };
                pending[i] += 1;
                dependents[d].push(i);
            }
        }

        let mut ready: BinaryHeap<Reverse<(usize, &str, usize)>> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| pending[*i] == 0)
            .map(|(i, node)| Reverse((node.rank, node.alias.as_str(), i)))
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse((_, alias, i))) = ready.pop() {
            order.push(alias);
            for &j in &dependents[i] {
                pending[j] -= 1;
                if pending[j] == 0 {
                    let node = &self.nodes[j];
                    ready.push(Reverse((node.rank, node.alias.as_str(), j)));
                }
            }
        }

        if order.len() < n {
            return Err(DependencyError::Cycle {
                aliases: self.find_cycle(&pending),
            });
        }
        Ok(order)
    }

    /// Walks unresolved nodes until one repeats.
    ///
    /// Every node left with pending dependencies has at least one unresolved dependency, so the
    /// walk always closes a cycle.
    fn find_cycle(&self, pending: &[usize]) -> Vec<String> {
        let Some(start) = (0..self.nodes.len()).find(|&i| pending[i] > 0) else {
            return Vec::new();
        };
        let mut seen_at: HashMap<usize, usize> = HashMap::new();
        let mut path: Vec<usize> = Vec::new();
        let mut current = start;
        loop {
            if let Some(&at) = seen_at.get(&current) {
                return path[at..].iter().map(|&i| self.nodes[i].alias.clone()).collect();
            }
            seen_at.insert(current, path.len());
            path.push(current);
            let next = self.nodes[current]
                .deps
                .iter()
                .filter_map(|dep| self.by_alias.get(dep).copied())
                .find(|&d| pending[d] > 0);
            match next {
                Some(d) => current = d,
                None => return Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    fn deps(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chain_resolves_dependencies_first() {
        let inputs = [
            [("C", &["B"][..]), ("B", &["A"][..]), ("A", &[][..])],
            [("A", &[][..]), ("C", &["B"][..]), ("B", &["A"][..])],
            [("B", &["A"][..]), ("A", &[][..]), ("C", &["B"][..])],
        ];
        for input in inputs {
            let mut graph = DependencyGraph::new();
            for (rank, (alias, d)) in input.iter().enumerate() {
                graph.insert(*alias, rank, deps(d)).unwrap();
            }
            assert_eq!(graph.resolve().unwrap(), ["A", "B", "C"]);
        }
    }

    #[test]
    fn independent_nodes_keep_rank_order() {
        let mut graph = DependencyGraph::new();
        graph.insert("z", 0, deps(&[])).unwrap();
        graph.insert("a", 1, deps(&[])).unwrap();
        graph.insert("m", 2, deps(&["z"])).unwrap();
        assert_eq!(graph.resolve().unwrap(), ["z", "a", "m"]);
    }

    #[test]
    fn two_cycle_names_both_aliases() {
        let mut graph = DependencyGraph::new();
        graph.insert("A", 0, deps(&["B"])).unwrap();
        graph.insert("B", 1, deps(&["A"])).unwrap();
        let Err(DependencyError::Cycle { mut aliases }) = graph.resolve() else {
            panic!("expected a cycle");
        };
        aliases.sort();
        assert_eq!(aliases, ["A", "B"]);
    }

    #[test]
    fn cycle_excludes_nodes_only_downstream_of_it() {
        let mut graph = DependencyGraph::new();
        graph.insert("tail", 0, deps(&["A"])).unwrap();
        graph.insert("A", 1, deps(&["B"])).unwrap();
        graph.insert("B", 2, deps(&["A"])).unwrap();
        let Err(DependencyError::Cycle { aliases }) = graph.resolve() else {
            panic!("expected a cycle");
        };
        assert_eq!(aliases.len(), 2);
        assert!(!aliases.contains(&"tail".to_string()));
    }

    #[test]
    fn unknown_dependency_is_reported() {
        let mut graph = DependencyGraph::new();
        graph.insert("A", 0, deps(&["ghost"])).unwrap();
        assert_eq!(
            graph.resolve(),
            Err(DependencyError::UnknownDependency {
                alias: "A".into(),
                dependency: "ghost".into(),
            })
        );
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let mut graph = DependencyGraph::new();
        graph.insert("A", 0, vec![]).unwrap();
        assert_eq!(
            graph.insert("A", 1, vec![]),
            Err(DependencyError::DuplicateAlias("A".into()))
        );
    }

    #[test]
    fn cycle_display_closes_the_loop() {
        let err = DependencyError::Cycle {
            aliases: vec!["A".into(), "B".into()],
        };
        assert_eq!(err.to_string(), "layer dependency cycle: A -> B -> A");
    }
}
