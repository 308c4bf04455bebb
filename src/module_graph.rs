//! Module Dependency Graph
//!
//! This module provides the graph of bundled modules and the reference edges
//! between them, and the search that reconstructs how the entry point reaches
//! a given module:
//! - Reference chains from the entry point to a target ("hops")
//! - Cycle guarding per chain, with diamond dependencies explored independently
//! - Dangling edge detection (specifiers pointing at ids missing from the bundle)
//!
//! The graph only holds ids and specifier tables, never code, so it can be
//! consulted while module code trees are being rewritten.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::module::{Lookup, Module, ModuleId};

/// One step of a reconstructed reference chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hop {
    /// Module reached by this step
    pub id: ModuleId,
    /// Specifier used to reach it: `./dir/file`, a bare package name, or
    /// empty for the root
    pub path: String,
}

impl Hop {
    pub fn new(id: impl Into<ModuleId>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Ordered hops, nearest the entry point first, target last.
pub type Chain = Vec<Hop>;

/// Result of [`ModuleGraph::find_paths_to_module`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSearch {
    /// Chains ending at the target, in traversal order
    pub complete: Vec<Chain>,
    /// Chains that stopped early: dead end, missing module, or cycle
    pub incomplete: Vec<Chain>,
}

/// Information about a module in the graph
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: ModuleId,
    /// Specifier table, if the bundler embedded one
    pub lookup: Option<Lookup>,
}

/// Module reference graph, in module list order.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    nodes: IndexMap<ModuleId, GraphNode>,
    /// Reverse edges: module id -> modules whose lookup names it
    dependents: FxHashMap<ModuleId, Vec<ModuleId>>,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from the normalized module list.
    ///
    /// When an id appears twice the first record wins, matching how the
    /// loader call resolution finds modules.
    pub fn from_modules(modules: &[Module]) -> Self {
        let mut graph = Self::new();
        for module in modules {
            graph.add_module(module.id.clone(), module.lookup.clone());
        }
        graph
    }

    /// Add a module; ignored if the id is already present.
    pub fn add_module(&mut self, id: ModuleId, lookup: Option<Lookup>) {
        if self.nodes.contains_key(&id) {
            return;
        }
        if let Some(lookup) = &lookup {
            for to in lookup.values() {
                let importers = self.dependents.entry(to.clone()).or_default();
                if importers.last() != Some(&id) {
                    importers.push(id.clone());
                }
            }
        }
        self.nodes.insert(id.clone(), GraphNode { id, lookup });
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &ModuleId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn lookup(&self, id: &ModuleId) -> Option<&Lookup> {
        self.nodes.get(id).and_then(|node| node.lookup.as_ref())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Modules whose lookup table names `id`, in module list order.
    pub fn dependents(&self, id: &ModuleId) -> &[ModuleId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Enumerate every reference chain from `entry` to `target`.
    ///
    /// Depth-first over lookup tables in insertion order. A module never
    /// appears twice in the same chain; when it would, the branch is
    /// abandoned and reported as incomplete. The same module can still show
    /// up in several independent chains.
    pub fn find_paths_to_module(&self, entry: &ModuleId, target: &ModuleId) -> PathSearch {
        let mut search = PathSearch::default();
        let mut chain = Vec::new();
        let mut on_chain = FxHashSet::default();
        on_chain.insert(entry.clone());
        self.walk_chains(entry, target, &mut chain, &mut on_chain, &mut search);
        search
    }

    fn walk_chains(
        &self,
        current: &ModuleId,
        target: &ModuleId,
        chain: &mut Chain,
        on_chain: &mut FxHashSet<ModuleId>,
        search: &mut PathSearch,
    ) {
        let Some(lookup) = self.lookup(current).filter(|l| !l.is_empty()) else {
            if !chain.is_empty() {
                search.incomplete.push(chain.clone());
            }
            return;
        };

        for (specifier, next) in lookup {
            chain.push(Hop::new(next.clone(), specifier.clone()));

            if next == target {
                search.complete.push(chain.clone());
            } else if !self.contains(next) || on_chain.contains(next) {
                search.incomplete.push(chain.clone());
            } else {
                on_chain.insert(next.clone());
                self.walk_chains(next, target, chain, on_chain, search);
                on_chain.remove(next);
            }

            chain.pop();
        }
    }

    /// First complete chain from `entry` to `target`.
    ///
    /// Same traversal order as [`find_paths_to_module`](Self::find_paths_to_module),
    /// so the result is always its `complete[0]`, but branches that can no
    /// longer reach the target are pruned and the walk stops at the first hit.
    pub fn first_complete_chain(&self, entry: &ModuleId, target: &ModuleId) -> Option<Chain> {
        let reaching = self.modules_reaching(target);
        if !reaching.contains(entry) {
            return None;
        }

        let mut chain = Vec::new();
        let mut on_chain = FxHashSet::default();
        on_chain.insert(entry.clone());
        if self.walk_first(entry, target, &reaching, &mut chain, &mut on_chain) {
            Some(chain)
        } else {
            None
        }
    }

    fn walk_first(
        &self,
        current: &ModuleId,
        target: &ModuleId,
        reaching: &FxHashSet<ModuleId>,
        chain: &mut Chain,
        on_chain: &mut FxHashSet<ModuleId>,
    ) -> bool {
        let Some(lookup) = self.lookup(current) else {
            return false;
        };

        for (specifier, next) in lookup {
            if next != target && (!reaching.contains(next) || on_chain.contains(next)) {
                continue;
            }

            chain.push(Hop::new(next.clone(), specifier.clone()));
            if next == target {
                return true;
            }

            on_chain.insert(next.clone());
            if self.walk_first(next, target, reaching, chain, on_chain) {
                return true;
            }
            on_chain.remove(next);
            chain.pop();
        }

        false
    }

    /// Every module with a lookup path to `target` (ignoring per-chain cycle
    /// rules), found by a reverse breadth-first walk.
    fn modules_reaching(&self, target: &ModuleId) -> FxHashSet<ModuleId> {
        let mut result = FxHashSet::default();
        let mut queue = VecDeque::new();
        queue.push_back(target.clone());

        while let Some(current) = queue.pop_front() {
            for importer in self.dependents(&current) {
                if result.insert(importer.clone()) {
                    queue.push_back(importer.clone());
                }
            }
        }

        result
    }

    /// Specifier edges whose target id is not in the module set.
    pub fn dangling_edges(&self) -> Vec<(ModuleId, String, ModuleId)> {
        let mut dangling = Vec::new();
        for node in self.nodes.values() {
            let Some(lookup) = &node.lookup else {
                continue;
            };
            for (specifier, to) in lookup {
                if !self.contains(to) {
                    dangling.push((node.id.clone(), specifier.clone(), to.clone()));
                }
            }
        }
        dangling
    }

    /// Get statistics about the module graph
    pub fn stats(&self) -> ModuleGraphStats {
        let mut stats = ModuleGraphStats {
            total_modules: self.nodes.len(),
            ..ModuleGraphStats::default()
        };

        for node in self.nodes.values() {
            match &node.lookup {
                Some(lookup) => stats.total_edges += lookup.len(),
                None => stats.modules_without_lookup += 1,
            }
        }
        stats.dangling_edges = self.dangling_edges().len();

        stats
    }
}

/// Statistics about the module graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleGraphStats {
    pub total_modules: usize,
    pub total_edges: usize,
    pub modules_without_lookup: usize,
    pub dangling_edges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn module(id: u64, lookup: &[(&str, u64)]) -> Module {
        Module::new(id, Node::EmptyStatement).with_lookup(lookup.iter().map(|&(s, i)| (s, i)))
    }

    fn sample_graph() -> ModuleGraph {
        ModuleGraph::from_modules(&[
            module(1, &[("./foo", 2), ("uuid", 3)]),
            module(2, &[("./bar/baz", 4)]),
            module(3, &[("./v1", 6), ("./v4", 7)]),
            module(4, &[("uuid", 3), ("../hello", 5)]),
            module(5, &[]),
            module(6, &[("./lib/rnd", 8)]),
            module(7, &[("./lib/rnd", 8)]),
            module(8, &[]),
        ])
    }

    fn mid(n: u64) -> ModuleId {
        ModuleId::Num(n)
    }

    fn paths(chain: &Chain) -> Vec<&str> {
        chain.iter().map(|hop| hop.path.as_str()).collect()
    }

    #[test]
    fn test_single_edge_chain() {
        let graph = ModuleGraph::from_modules(&[module(1, &[("./b", 2)]), module(2, &[])]);
        let search = graph.find_paths_to_module(&mid(1), &mid(2));
        assert_eq!(search.complete, vec![vec![Hop::new(2u64, "./b")]]);
    }

    #[test]
    fn test_diamond_collects_all_chains_in_order() {
        let graph = sample_graph();
        let search = graph.find_paths_to_module(&mid(1), &mid(8));

        let complete: Vec<Vec<&str>> = search.complete.iter().map(paths).collect();
        assert_eq!(
            complete,
            vec![
                vec!["./foo", "./bar/baz", "uuid", "./v1", "./lib/rnd"],
                vec!["./foo", "./bar/baz", "uuid", "./v4", "./lib/rnd"],
                vec!["uuid", "./v1", "./lib/rnd"],
                vec!["uuid", "./v4", "./lib/rnd"],
            ]
        );
    }

    #[test]
    fn test_first_complete_chain_matches_full_search() {
        let graph = sample_graph();
        for target in 2..=8u64 {
            let full = graph.find_paths_to_module(&mid(1), &mid(target));
            let first = graph.first_complete_chain(&mid(1), &mid(target));
            assert_eq!(first.as_ref(), full.complete.first(), "target {target}");
        }
    }

    #[test]
    fn test_cycle_terminates_and_reports_incomplete() {
        // 1 -> 2 -> 3 -> 2 (cycle), target 4 unreachable
        let graph = ModuleGraph::from_modules(&[
            module(1, &[("./two", 2)]),
            module(2, &[("./three", 3)]),
            module(3, &[("./two", 2)]),
            module(4, &[]),
        ]);
        let search = graph.find_paths_to_module(&mid(1), &mid(4));
        assert!(search.complete.is_empty());
        assert_eq!(
            search.incomplete.iter().map(paths).collect::<Vec<_>>(),
            vec![vec!["./two", "./three", "./two"]]
        );
        assert_eq!(graph.first_complete_chain(&mid(1), &mid(4)), None);
    }

    #[test]
    fn test_cycle_back_to_entry_is_guarded() {
        let graph = ModuleGraph::from_modules(&[
            module(1, &[("./a", 2)]),
            module(2, &[("./index", 1), ("./c", 3)]),
            module(3, &[]),
        ]);
        let search = graph.find_paths_to_module(&mid(1), &mid(3));
        assert_eq!(search.complete.iter().map(paths).collect::<Vec<_>>(), vec![vec!["./a", "./c"]]);
        assert!(search
            .incomplete
            .iter()
            .any(|chain| paths(chain) == vec!["./a", "./index"]));
    }

    #[test]
    fn test_missing_module_is_incomplete() {
        let graph = ModuleGraph::from_modules(&[module(1, &[("./gone", 9), ("./b", 2)]), module(2, &[])]);
        let search = graph.find_paths_to_module(&mid(1), &mid(2));
        assert_eq!(search.complete.len(), 1);
        assert_eq!(search.incomplete, vec![vec![Hop::new(9u64, "./gone")]]);
        assert_eq!(graph.dangling_edges(), vec![(mid(1), "./gone".to_string(), mid(9))]);
    }

    #[test]
    fn test_modules_without_lookup_stop_traversal() {
        let graph = ModuleGraph::from_modules(&[
            module(1, &[("./a", 2)]),
            Module::new(2u64, Node::EmptyStatement),
            module(3, &[]),
        ]);
        let search = graph.find_paths_to_module(&mid(1), &mid(3));
        assert!(search.complete.is_empty());
        assert_eq!(search.incomplete, vec![vec![Hop::new(2u64, "./a")]]);
    }

    #[test]
    fn test_duplicate_ids_keep_first_record() {
        let graph = ModuleGraph::from_modules(&[module(1, &[("./a", 2)]), module(1, &[])]);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.lookup(&mid(1)).map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_dependents_index() {
        let graph = sample_graph();
        assert_eq!(graph.dependents(&mid(3)), &[mid(1), mid(4)]);
        assert_eq!(graph.dependents(&mid(8)), &[mid(6), mid(7)]);
        assert!(graph.dependents(&mid(1)).is_empty());

        // a repeated target inside one lookup is indexed once
        let graph = ModuleGraph::from_modules(&[module(1, &[("./a", 2), ("./a.js", 2)]), module(2, &[])]);
        assert_eq!(graph.dependents(&mid(2)), &[mid(1)]);
    }

    #[test]
    fn test_first_complete_chain_on_wide_layered_graph() {
        // every module imports the next eight
        let n = 400u64;
        let modules: Vec<Module> = (0..n)
            .map(|i| {
                let edges: Vec<(String, u64)> =
                    (i + 1..(i + 9).min(n)).map(|j| (format!("./m{j}"), j)).collect();
                Module::new(i, Node::EmptyStatement).with_lookup(edges)
            })
            .collect();
        let graph = ModuleGraph::from_modules(&modules);

        for target in 1..n {
            let chain = graph
                .first_complete_chain(&mid(0), &mid(target))
                .expect("every module is reachable");
            assert_eq!(chain.len() as u64, target);
            assert_eq!(chain.last().map(|hop| hop.id.clone()), Some(mid(target)));
        }
        assert_eq!(graph.dependents(&mid(20)).len(), 8);
    }

    #[test]
    fn test_module_graph_stats() {
        let graph = ModuleGraph::from_modules(&[
            module(1, &[("./a", 2), ("./missing", 7)]),
            Module::new(2u64, Node::EmptyStatement),
        ]);
        let stats = graph.stats();
        assert_eq!(stats.total_modules, 2);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(stats.modules_without_lookup, 1);
        assert_eq!(stats.dangling_edges, 1);
    }
}
