//! core::lineage
//!
//! The lineage graph: directed, typed relationships between products.
//!
//! # Architecture
//!
//! The graph is a directed multigraph keyed by product name. Nodes are
//! names by value, not references into the catalog, so an edge may name
//! a product that was never registered or has since been deleted.
//! Edges live in an append-only ordered sequence; two auxiliary index
//! maps (name to outgoing edge positions, name to incoming edge
//! positions) are maintained on every insert for O(1) average lookup.
//!
//! # Invariants
//!
//! - Edge confidence lies in [0.0, 1.0] (enforced by [`Confidence`])
//! - The edge sequence never exceeds its configured capacity
//! - Traversals terminate on cyclic graphs and report each node at
//!   most once, at its shortest hop distance
//!
//! Self-loops and exact duplicate edges are accepted as distinct
//! entries; the graph performs no structural validation beyond
//! confidence and capacity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

use super::types::{Confidence, LineageType, Page, ProductName, UtcTimestamp};

/// Errors from graph operations.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// The edge sequence is at its configured maximum size.
    #[error("maximum number of lineage entries ({limit}) reached")]
    CapacityExceeded {
        /// The configured maximum.
        limit: usize,
    },
}

/// A registered lineage edge (`source -> target`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEdge {
    /// Upstream product name.
    pub source: ProductName,

    /// Downstream product name.
    pub target: ProductName,

    /// Description of the transformation that produced the target.
    pub transformation: String,

    /// Kind of relationship.
    pub lineage_type: LineageType,

    /// Confidence in the recorded relationship.
    pub confidence: Confidence,

    /// Opaque metadata payload, stored verbatim.
    pub metadata: Map<String, Value>,

    /// Set when the edge is registered.
    pub timestamp: UtcTimestamp,
}

/// Input for registering a new lineage edge.
///
/// The graph stamps `timestamp` at registration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDraft {
    pub source: ProductName,
    pub target: ProductName,
    pub transformation: String,
    #[serde(default)]
    pub lineage_type: LineageType,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl EdgeDraft {
    /// Create a draft with default type, full confidence, and no metadata.
    pub fn new(
        source: ProductName,
        target: ProductName,
        transformation: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            transformation: transformation.into(),
            lineage_type: LineageType::default(),
            confidence: Confidence::default(),
            metadata: Map::new(),
        }
    }

    /// Set the relationship kind.
    pub fn with_type(mut self, lineage_type: LineageType) -> Self {
        self.lineage_type = lineage_type;
        self
    }

    /// Set the confidence score.
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Attach a metadata payload.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    fn into_edge(self, now: UtcTimestamp) -> LineageEdge {
        LineageEdge {
            source: self.source,
            target: self.target,
            transformation: self.transformation,
            lineage_type: self.lineage_type,
            confidence: self.confidence,
            metadata: self.metadata,
            timestamp: now,
        }
    }
}

/// Equality filter for edge queries.
///
/// `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageFilter {
    /// Match edges with this source.
    pub source: Option<ProductName>,
    /// Match edges with this target.
    pub target: Option<ProductName>,
    /// Match edges of this kind.
    pub lineage_type: Option<LineageType>,
}

impl LineageFilter {
    fn matches(&self, edge: &LineageEdge) -> bool {
        if let Some(source) = &self.source {
            if &edge.source != source {
                return false;
            }
        }
        if let Some(target) = &self.target {
            if &edge.target != target {
                return false;
            }
        }
        if let Some(lineage_type) = self.lineage_type {
            if edge.lineage_type != lineage_type {
                return false;
            }
        }
        true
    }
}

/// Direction of a transitive traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow edges backward (target to source): what feeds into a product.
    Upstream,
    /// Follow edges forward (source to target): what a product feeds.
    Downstream,
}

/// A node discovered by a traversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraversalNode {
    /// The discovered product name.
    pub name: ProductName,

    /// Shortest hop distance from the traversal root.
    pub depth: usize,

    /// The edge through which the node was first discovered, i.e. the
    /// last hop of one shortest path from the root.
    pub via: LineageEdge,
}

/// The lineage graph.
#[derive(Debug, Default)]
pub struct LineageGraph {
    /// Edges in registration order (append-only).
    edges: Vec<LineageEdge>,
    /// Source name to positions of outgoing edges.
    outgoing: HashMap<ProductName, Vec<usize>>,
    /// Target name to positions of incoming edges.
    incoming: HashMap<ProductName, Vec<usize>>,
    /// Maximum number of edges, if bounded.
    capacity: Option<usize>,
}

impl LineageGraph {
    /// Create an empty, unbounded graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph holding at most `capacity` edges.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Number of registered edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if no edges are registered.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Register a new edge from a draft.
    ///
    /// Appends the edge, updates both index maps, and stamps
    /// `timestamp = now`. Neither endpoint has to exist in the catalog;
    /// lineage may be declared ahead of formal registration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CapacityExceeded`] if the graph is full.
    pub fn add_edge(&mut self, draft: EdgeDraft) -> Result<&LineageEdge, GraphError> {
        if let Some(limit) = self.capacity {
            if self.edges.len() >= limit {
                return Err(GraphError::CapacityExceeded { limit });
            }
        }

        let edge = draft.into_edge(UtcTimestamp::now());
        let pos = self.edges.len();
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(pos);
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(pos);
        self.edges.push(edge);
        Ok(self.edges.last().expect("just pushed"))
    }

    /// Query edges matching `filter`, in registration order, windowed by `page`.
    ///
    /// The page limit must already be clamped by the caller.
    pub fn query(&self, filter: &LineageFilter, page: Page) -> Vec<&LineageEdge> {
        page.apply(self.edges.iter().filter(|e| filter.matches(e)))
    }

    /// All products that transitively feed into `name`.
    ///
    /// Breadth-first closure over the incoming-edge index, so each
    /// reported depth is the shortest hop count. An unknown name yields
    /// an empty result; a product with no lineage is not a fault.
    pub fn upstream(&self, name: &ProductName, max_depth: Option<usize>) -> Vec<TraversalNode> {
        self.traverse(name, Direction::Upstream, max_depth)
    }

    /// All products transitively derived from `name`.
    ///
    /// Symmetric to [`upstream`](Self::upstream), following outgoing edges.
    pub fn downstream(&self, name: &ProductName, max_depth: Option<usize>) -> Vec<TraversalNode> {
        self.traverse(name, Direction::Downstream, max_depth)
    }

    /// Breadth-first closure from `root` in the given direction.
    ///
    /// A visited set keyed by name guarantees termination on cycles and
    /// at-most-once reporting. `max_depth` bounds frontier expansion;
    /// nodes beyond the bound are excluded entirely.
    fn traverse(
        &self,
        root: &ProductName,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Vec<TraversalNode> {
        let mut result = Vec::new();
        let mut visited: HashSet<ProductName> = HashSet::new();
        let mut frontier: VecDeque<(ProductName, usize)> = VecDeque::new();

        visited.insert(root.clone());
        frontier.push_back((root.clone(), 0));

        while let Some((current, depth)) = frontier.pop_front() {
            if let Some(bound) = max_depth {
                if depth >= bound {
                    continue;
                }
            }

            let index = match direction {
                Direction::Upstream => &self.incoming,
                Direction::Downstream => &self.outgoing,
            };
            let Some(positions) = index.get(&current) else {
                continue;
            };

            for &pos in positions {
                let edge = &self.edges[pos];
                let neighbor = match direction {
                    Direction::Upstream => &edge.source,
                    Direction::Downstream => &edge.target,
                };
                if visited.insert(neighbor.clone()) {
                    result.push(TraversalNode {
                        name: neighbor.clone(),
                        depth: depth + 1,
                        via: edge.clone(),
                    });
                    frontier.push_back((neighbor.clone(), depth + 1));
                }
            }
        }

        result
    }

    /// Iterate all edges in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LineageEdge> {
        self.edges.iter()
    }

    /// Replace the graph contents from a restored snapshot.
    ///
    /// Rebuilds both index maps. As with the catalog, the capacity
    /// limit only gates new registrations.
    pub(crate) fn restore(&mut self, edges: Vec<LineageEdge>) {
        self.outgoing.clear();
        self.incoming.clear();
        for (pos, edge) in edges.iter().enumerate() {
            self.outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(pos);
            self.incoming
                .entry(edge.target.clone())
                .or_default()
                .push(pos);
        }
        self.edges = edges;
    }

    /// Clone the full edge sequence in registration order, for snapshotting.
    pub(crate) fn to_vec(&self) -> Vec<LineageEdge> {
        self.edges.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ProductName {
        ProductName::new(s).unwrap()
    }

    fn edge(source: &str, target: &str) -> EdgeDraft {
        EdgeDraft::new(name(source), name(target), "transform")
    }

    /// Build the chain a -> b -> c -> d.
    fn chain() -> LineageGraph {
        let mut graph = LineageGraph::new();
        graph.add_edge(edge("a", "b")).unwrap();
        graph.add_edge(edge("b", "c")).unwrap();
        graph.add_edge(edge("c", "d")).unwrap();
        graph
    }

    #[test]
    fn add_edge_stamps_timestamp() {
        let mut graph = LineageGraph::new();
        let before = UtcTimestamp::now();
        let added = graph.add_edge(edge("a", "b")).unwrap();
        assert!(added.timestamp >= before);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn capacity_enforced() {
        let mut graph = LineageGraph::with_capacity_limit(1);
        graph.add_edge(edge("a", "b")).unwrap();

        let err = graph.add_edge(edge("b", "c")).unwrap_err();
        assert_eq!(err, GraphError::CapacityExceeded { limit: 1 });
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn dangling_endpoints_are_allowed() {
        // No catalog in sight: names are just values.
        let mut graph = LineageGraph::new();
        assert!(graph.add_edge(edge("never-registered", "also-not")).is_ok());
    }

    #[test]
    fn self_loops_and_duplicates_are_distinct_entries() {
        let mut graph = LineageGraph::new();
        graph.add_edge(edge("a", "a")).unwrap();
        graph.add_edge(edge("a", "b")).unwrap();
        graph.add_edge(edge("a", "b")).unwrap();
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn query_filters_by_source_target_and_type() {
        let mut graph = LineageGraph::new();
        graph.add_edge(edge("a", "b")).unwrap();
        graph
            .add_edge(edge("a", "c").with_type(LineageType::Aggregated))
            .unwrap();
        graph.add_edge(edge("b", "c")).unwrap();

        let filter = LineageFilter {
            source: Some(name("a")),
            ..LineageFilter::default()
        };
        assert_eq!(graph.query(&filter, Page::default()).len(), 2);

        let filter = LineageFilter {
            target: Some(name("c")),
            lineage_type: Some(LineageType::Aggregated),
            ..LineageFilter::default()
        };
        let matched = graph.query(&filter, Page::default());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].source, name("a"));
    }

    #[test]
    fn query_is_registration_ordered_and_paginated() {
        let mut graph = LineageGraph::new();
        for i in 0..5 {
            graph.add_edge(edge(&format!("s{i}"), "t")).unwrap();
        }

        let matched = graph.query(&LineageFilter::default(), Page::new(1, 2));
        let sources: Vec<&str> = matched.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["s1", "s2"]);
    }

    #[test]
    fn upstream_walks_chain_with_depths() {
        let graph = chain();
        let nodes = graph.upstream(&name("d"), None);

        let found: Vec<(&str, usize)> = nodes.iter().map(|n| (n.name.as_str(), n.depth)).collect();
        assert_eq!(found, vec![("c", 1), ("b", 2), ("a", 3)]);
        // The discovery edge of "b" is the b -> c hop.
        assert_eq!(nodes[1].via.source, name("b"));
        assert_eq!(nodes[1].via.target, name("c"));
    }

    #[test]
    fn downstream_walks_chain_with_depths() {
        let graph = chain();
        let nodes = graph.downstream(&name("a"), None);

        let found: Vec<(&str, usize)> = nodes.iter().map(|n| (n.name.as_str(), n.depth)).collect();
        assert_eq!(found, vec![("b", 1), ("c", 2), ("d", 3)]);
    }

    #[test]
    fn traversal_terminates_on_cycles() {
        let mut graph = chain();
        // Close the loop: d feeds back into a.
        graph.add_edge(edge("d", "a")).unwrap();

        let nodes = graph.upstream(&name("d"), None);
        let mut names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b", "c"]);

        // Each node reported exactly once.
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), nodes.len());
    }

    #[test]
    fn self_loop_does_not_revisit_root() {
        let mut graph = LineageGraph::new();
        graph.add_edge(edge("a", "a")).unwrap();

        assert!(graph.upstream(&name("a"), None).is_empty());
        assert!(graph.downstream(&name("a"), None).is_empty());
    }

    #[test]
    fn shortest_path_depth_wins_over_longer_route() {
        let mut graph = LineageGraph::new();
        // Two routes from a to c: a -> b -> c and a -> c directly.
        graph.add_edge(edge("a", "b")).unwrap();
        graph.add_edge(edge("b", "c")).unwrap();
        graph.add_edge(edge("a", "c")).unwrap();

        let nodes = graph.downstream(&name("a"), None);
        let c = nodes.iter().find(|n| n.name == name("c")).unwrap();
        assert_eq!(c.depth, 1);
    }

    #[test]
    fn max_depth_bounds_expansion() {
        let graph = chain();

        let nodes = graph.downstream(&name("a"), Some(2));
        let found: Vec<(&str, usize)> = nodes.iter().map(|n| (n.name.as_str(), n.depth)).collect();
        assert_eq!(found, vec![("b", 1), ("c", 2)]);

        assert!(graph.downstream(&name("a"), Some(0)).is_empty());
    }

    #[test]
    fn unknown_name_yields_empty_result() {
        let graph = chain();
        assert!(graph.upstream(&name("ghost"), None).is_empty());
        assert!(graph.downstream(&name("ghost"), None).is_empty());
    }

    #[test]
    fn restore_rebuilds_indices() {
        let graph = chain();
        let saved = graph.to_vec();

        let mut restored = LineageGraph::with_capacity_limit(100);
        restored.restore(saved);

        assert_eq!(restored.len(), 3);
        let nodes = restored.upstream(&name("d"), None);
        assert_eq!(nodes.len(), 3);
    }
}
