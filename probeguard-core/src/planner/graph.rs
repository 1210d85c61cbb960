//! Dependency graph and topological ordering
//!
//! Nodes are small dense integers (manipulator slots for direct plans, leg
//! numbers for segmented plans), so adjacency and in-degree live in fixed
//! arrays. An edge `node -> prerequisite` means the prerequisite must be
//! executed first.

use heapless::Vec;

use crate::motion::MAX_MANIPULATORS;

/// Maximum nodes (two legs per manipulator)
pub const MAX_NODES: usize = 2 * MAX_MANIPULATORS;

/// Node sequence produced by a topological sort
pub type NodeOrder = Vec<usize, MAX_NODES>;

/// Sort failure: the listed nodes could not be placed
///
/// Every node on a dependency cycle is listed, along with nodes that
/// depend on the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cycle {
    pub unresolved: NodeOrder,
}

/// "Must execute after" relation over dense node ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    present: [bool; MAX_NODES],
    /// `edges[node][prerequisite]`
    edges: [[bool; MAX_NODES]; MAX_NODES],
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with no dependencies
    ///
    /// Returns `false` if the id is out of range.
    pub fn add_node(&mut self, node: usize) -> bool {
        match self.present.get_mut(node) {
            Some(present) => {
                *present = true;
                true
            }
            None => false,
        }
    }

    /// Check if a node is in the graph
    pub fn contains(&self, node: usize) -> bool {
        self.present.get(node).copied().unwrap_or(false)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }

    /// Require `prerequisite` to execute before `node`
    ///
    /// Both nodes are added if missing. Returns `true` if the edge is new.
    pub fn add_dependency(&mut self, node: usize, prerequisite: usize) -> bool {
        if node >= MAX_NODES || prerequisite >= MAX_NODES {
            return false;
        }
        self.present[node] = true;
        self.present[prerequisite] = true;
        let edge = &mut self.edges[node][prerequisite];
        let added = !*edge;
        *edge = true;
        added
    }

    /// Check if `node` waits for `prerequisite`
    pub fn depends_on(&self, node: usize, prerequisite: usize) -> bool {
        node < MAX_NODES && prerequisite < MAX_NODES && self.edges[node][prerequisite]
    }

    /// Nodes that must execute before `node`
    pub fn prerequisites(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_NODES).filter(move |&p| self.depends_on(node, p))
    }

    /// Nodes waiting for `node`
    pub fn dependents(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_NODES).filter(move |&d| self.depends_on(d, node))
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().filter(|&&e| e).count()
    }

    /// Number of unmet prerequisites of a node
    pub fn in_degree(&self, node: usize) -> usize {
        self.prerequisites(node).count()
    }

    /// Kahn's algorithm
    ///
    /// Among ready nodes the lowest id is placed first, so a graph without
    /// edges sorts into ascending id order.
    pub fn topological_order(&self) -> Result<NodeOrder, Cycle> {
        let mut in_degree = [0usize; MAX_NODES];
        for (node, degree) in in_degree.iter_mut().enumerate() {
            if self.present[node] {
                *degree = self.in_degree(node);
            }
        }

        let mut placed = [false; MAX_NODES];
        let mut order = NodeOrder::new();

        loop {
            let ready =
                (0..MAX_NODES).find(|&n| self.present[n] && !placed[n] && in_degree[n] == 0);
            let Some(ready) = ready else {
                break;
            };
            placed[ready] = true;
            let _ = order.push(ready);
            for dependent in self.dependents(ready) {
                in_degree[dependent] = in_degree[dependent].saturating_sub(1);
            }
        }

        if order.len() == self.node_count() {
            Ok(order)
        } else {
            let unresolved = (0..MAX_NODES)
                .filter(|&n| self.present[n] && !placed[n])
                .collect();
            trace!(
                "dependency cycle, {} nodes unresolved",
                self.node_count() - order.len()
            );
            Err(Cycle { unresolved })
        }
    }
}
