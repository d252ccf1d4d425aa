//! Types for the belt routing pipeline

use crate::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A bounded-flow routing problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeltsProblem {
    /// All nodes of the network
    pub nodes: Vec<Node>,
    /// Directed edges with flow bounds
    pub edges: Vec<Edge>,
    /// Supply-carrying sources
    pub sources: Vec<Source>,
    /// The single sink node
    pub sink: String,
}

/// A network node, optionally capped on throughput
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier
    pub id: String,
    /// Throughput cap; absent or null means uncapped
    #[serde(default)]
    pub cap: Option<f64>,
}

/// A directed edge with lower and upper flow bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Tail node
    pub from: String,
    /// Head node
    pub to: String,
    /// Lower flow bound
    #[serde(default)]
    pub lower: f64,
    /// Upper flow bound; absent or null means unbounded
    #[serde(default)]
    pub upper: Option<f64>,
}

/// A source node with its supply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Node identifier
    pub id: String,
    /// Supply to route to the sink, in units/min
    pub supply: f64,
}

impl BeltsProblem {
    /// Validate identifiers, references, bounds, and network structure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] or [`Error::UnknownReference`] on the
    /// first violated rule.
    pub fn validate(&self) -> Result<()> {
        let mut node_ids = BTreeSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if let Some(cap) = node.cap {
                if !cap.is_finite() || cap < 0.0 {
                    return Err(Error::invalid_input(format!(
                        "node '{}' has invalid cap {cap}",
                        node.id
                    )));
                }
            }
        }

        if !node_ids.contains(self.sink.as_str()) {
            return Err(Error::unknown("node", self.sink.clone()));
        }

        let mut source_ids = BTreeSet::new();
        for source in &self.sources {
            if !node_ids.contains(source.id.as_str()) {
                return Err(Error::unknown("node", source.id.clone()));
            }
            if !source_ids.insert(source.id.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate source '{}'",
                    source.id
                )));
            }
            if source.id == self.sink {
                return Err(Error::invalid_input(format!(
                    "node '{}' cannot be both source and sink",
                    source.id
                )));
            }
            if !source.supply.is_finite() || source.supply < 0.0 {
                return Err(Error::invalid_input(format!(
                    "source '{}' has invalid supply {}",
                    source.id, source.supply
                )));
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(Error::unknown("node", endpoint.clone()));
                }
            }
            if edge.from == edge.to {
                return Err(Error::invalid_input(format!(
                    "self-loop edge on '{}'",
                    edge.from
                )));
            }
            if !edge.lower.is_finite() || edge.lower < 0.0 {
                return Err(Error::invalid_input(format!(
                    "edge {} -> {} has invalid lower bound {}",
                    edge.from, edge.to, edge.lower
                )));
            }
            if let Some(upper) = edge.upper {
                if !upper.is_finite() || upper < edge.lower {
                    return Err(Error::invalid_input(format!(
                        "edge {} -> {} has upper bound {upper} below lower {}",
                        edge.from, edge.to, edge.lower
                    )));
                }
            }
        }

        self.validate_topology()
    }

    /// Structure checks on the original graph: the sink absorbs (no
    /// outgoing edges) and every source can emit (at least one outgoing
    /// edge).
    fn validate_topology(&self) -> Result<()> {
        let mut graph = DiGraph::<(), ()>::new();
        let indices: BTreeMap<&str, NodeIndex> = self
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), graph.add_node(())))
            .collect();
        for edge in &self.edges {
            graph.add_edge(indices[edge.from.as_str()], indices[edge.to.as_str()], ());
        }

        if graph
            .edges_directed(indices[self.sink.as_str()], Direction::Outgoing)
            .next()
            .is_some()
        {
            return Err(Error::invalid_input(format!(
                "sink '{}' has outgoing edges",
                self.sink
            )));
        }
        for source in &self.sources {
            if graph
                .edges_directed(indices[source.id.as_str()], Direction::Outgoing)
                .next()
                .is_none()
            {
                return Err(Error::invalid_input(format!(
                    "source '{}' has no outgoing edge",
                    source.id
                )));
            }
        }
        Ok(())
    }

    /// Supplies keyed by source id
    #[must_use]
    pub fn source_map(&self) -> BTreeMap<&str, f64> {
        self.sources
            .iter()
            .map(|s| (s.id.as_str(), s.supply))
            .collect()
    }
}

/// Realized flow on one original edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeFlow {
    /// Tail node
    pub from: String,
    /// Head node
    pub to: String,
    /// Realized flow
    pub flow: f64,
}

/// Reference to one original edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Tail node
    pub from: String,
    /// Head node
    pub to: String,
}

/// Result of a belts solve, in output-schema shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BeltsReport {
    /// All supplies and lower bounds can be routed
    Feasible {
        /// Always `true`
        feasible: bool,
        /// Per-edge flows, in input edge order
        flows: Vec<EdgeFlow>,
    },
    /// No feasible flow exists; this is the min-cut certificate
    Infeasible {
        /// Always `false`
        feasible: bool,
        /// Missing flow: `expected - max_flow`
        deficit: f64,
        /// Original nodes on the source side of the min cut, sorted
        cut_reachable: Vec<String>,
        /// Capped nodes whose throughput cap is binding, sorted
        tight_nodes: Vec<String>,
        /// Edges whose upper bound is binding, sorted by `(from, to)`
        tight_edges: Vec<EdgeRef>,
    },
    /// The invocation failed before any solve completed
    Error {
        /// Always `false`
        feasible: bool,
        /// Diagnostic message
        error: String,
    },
}

impl BeltsReport {
    /// Build the feasible variant
    #[must_use]
    pub fn feasible(flows: Vec<EdgeFlow>) -> Self {
        Self::Feasible {
            feasible: true,
            flows,
        }
    }

    /// Build the certificate variant
    #[must_use]
    pub fn infeasible(
        deficit: f64,
        cut_reachable: Vec<String>,
        tight_nodes: Vec<String>,
        tight_edges: Vec<EdgeRef>,
    ) -> Self {
        Self::Infeasible {
            feasible: false,
            deficit,
            cut_reachable,
            tight_nodes,
            tight_edges,
        }
    }

    /// Build the error variant
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            feasible: false,
            error: message.into(),
        }
    }
}
