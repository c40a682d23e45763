//! Component-level connectivity view built on petgraph.
//!
//! Components are nodes, each net is an edge between the two components it
//! joins. The view is a read-only snapshot; rebuild it after edits.

use petgraph::algo::{astar, kosaraju_scc};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use std::collections::HashMap;

use crate::schematic::Schematic;

pub struct Connectivity {
    graph: UnGraph<String, String>,
    component_indices: HashMap<String, NodeIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityStats {
    pub component_count: usize,
    pub connection_count: usize,
    /// Connected groups, counting isolated components
    pub group_count: usize,
    pub isolated_count: usize,
}

impl Connectivity {
    /// Build the view from a schematic
    pub fn from_schematic(schematic: &Schematic) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut component_indices = HashMap::new();

        for component in schematic.components() {
            let idx = graph.add_node(component.id.clone());
            component_indices.insert(component.id.clone(), idx);
        }

        for net in schematic.nets() {
            if let [a, b] = net.connections.as_slice() {
                if let (Some(&ia), Some(&ib)) = (
                    component_indices.get(&a.component_id),
                    component_indices.get(&b.component_id),
                ) {
                    graph.add_edge(ia, ib, net.id.clone());
                }
            }
        }

        Self {
            graph,
            component_indices,
        }
    }

    /// Shortest chain of component ids linking two components
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let from_idx = *self.component_indices.get(from)?;
        let to_idx = *self.component_indices.get(to)?;

        let (_, path) = astar(&self.graph, from_idx, |n| n == to_idx, |_| 1, |_| 0)?;
        Some(
            path.into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).cloned())
                .collect(),
        )
    }

    /// Get the components directly wired to a component
    pub fn neighbors(&self, component_id: &str) -> Vec<String> {
        let Some(&idx) = self.component_indices.get(component_id) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .graph
            .neighbors(idx)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Groups of mutually reachable components, each sorted, largest first.
    pub fn connected_groups(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .map(|scc| {
                let mut ids: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        groups
    }

    pub fn stats(&self) -> ConnectivityStats {
        let groups = self.connected_groups();
        ConnectivityStats {
            component_count: self.graph.node_count(),
            connection_count: self.graph.edge_count(),
            group_count: groups.len(),
            isolated_count: groups.iter().filter(|g| g.len() == 1).count(),
        }
    }
}
