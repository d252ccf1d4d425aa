//! Bounded-flow reduction
//!
//! Rewrites a network with edge lower bounds and node throughput caps into a
//! plain max-flow instance:
//!
//! - every capped interior node `v` becomes `v_in -> v_out` with the cap as
//!   edge capacity (sources and the sink are never split);
//! - every edge `[lo, hi]` becomes a `hi - lo` residual edge between the
//!   endpoint halves, with `lo` re-routed through the super-nodes: `S*`
//!   injects each node's summed incoming lower bounds at `v_in`, `T*` drains
//!   its summed outgoing lower bounds from `v_out`. The two sides are kept
//!   separate rather than netted per node, so chained lower bounds still
//!   traverse the cap edge and the `S*` out-capacity stays exactly
//!   `total_supply + total_lb`;
//! - each source gets an `S* -> s` arc carrying its supply, and the sink an
//!   arc to `T*` carrying exactly `total_supply`. That capacity makes the
//!   `T*` side as tight as the `S*` side, so a saturating flow is forced to
//!   fill every lower-bound drain arc; anything looser lets the sink arc
//!   absorb flow a source never legally produced.
//!
//! A feasible original flow then corresponds to an `S* -> T*` flow of value
//! exactly `expected = total_supply + total_lb`, and the per-edge mapping
//! retained here lets the solver reconstruct original flows or map the min
//! cut back onto original nodes and edges.

use super::types::BeltsProblem;
use crate::graph::flow::FlowNetwork;
use crate::{EPS, UNBOUNDED};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::debug;

/// The transformed-graph vertices of one original node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeVerts {
    /// Vertex receiving the node's incoming edges
    pub v_in: usize,
    /// Vertex emitting the node's outgoing edges
    pub v_out: usize,
}

impl NodeVerts {
    /// Whether the node was split by a throughput cap
    #[must_use]
    pub fn is_split(self) -> bool {
        self.v_in != self.v_out
    }
}

/// A reduced problem plus the mappings back to the original
#[derive(Debug)]
pub struct Reduction {
    /// The max-flow instance
    pub net: FlowNetwork,
    /// `S*`
    pub super_source: usize,
    /// `T*`
    pub super_sink: usize,
    /// Saturation target: `total_supply + total_lb`
    pub expected: f64,
    /// Forward-edge id of each original edge, in input order
    pub edge_ids: Vec<usize>,
    /// Original node id to its transformed vertices, in input order
    pub vertices: IndexMap<String, NodeVerts>,
}

/// Build the reduction for a validated problem
#[must_use]
pub fn reduce(problem: &BeltsProblem) -> Reduction {
    let source_ids: BTreeSet<&str> = problem.sources.iter().map(|s| s.id.as_str()).collect();

    // Vertex table; capped interior nodes take two slots
    let mut vertices = IndexMap::with_capacity(problem.nodes.len());
    let mut next = 0usize;
    for node in &problem.nodes {
        let interior = !source_ids.contains(node.id.as_str()) && node.id != problem.sink;
        let verts = if node.cap.is_some() && interior {
            let v = NodeVerts {
                v_in: next,
                v_out: next + 1,
            };
            next += 2;
            v
        } else {
            let v = NodeVerts {
                v_in: next,
                v_out: next,
            };
            next += 1;
            v
        };
        vertices.insert(node.id.clone(), verts);
    }
    let super_source = next;
    let super_sink = next + 1;
    let mut net = FlowNetwork::new(next + 2);

    // Cap edges of the split nodes
    for node in &problem.nodes {
        let verts = vertices[node.id.as_str()];
        if verts.is_split() {
            net.add_edge(verts.v_in, verts.v_out, node.cap.unwrap_or(UNBOUNDED));
        }
    }

    // Original edges as residual capacity; lower bounds accumulate per
    // endpoint, incoming and outgoing kept apart
    let mut lower_in = vec![0.0f64; problem.nodes.len()];
    let mut lower_out = vec![0.0f64; problem.nodes.len()];
    let mut total_lb = 0.0;
    let mut edge_ids = Vec::with_capacity(problem.edges.len());
    for edge in &problem.edges {
        let u = vertices[edge.from.as_str()];
        let v = vertices[edge.to.as_str()];
        let capacity = edge.upper.map_or(UNBOUNDED, |hi| hi - edge.lower);
        edge_ids.push(net.add_edge(u.v_out, v.v_in, capacity));
        if edge.lower > 0.0 {
            total_lb += edge.lower;
            let to_idx = vertices.get_index_of(edge.to.as_str()).expect("validated");
            let from_idx = vertices.get_index_of(edge.from.as_str()).expect("validated");
            lower_in[to_idx] += edge.lower;
            lower_out[from_idx] += edge.lower;
        }
    }

    // Super-node wiring: supplies, lower-bound injections and drains
    let mut total_supply = 0.0;
    for source in &problem.sources {
        total_supply += source.supply;
        net.add_edge(super_source, vertices[source.id.as_str()].v_in, source.supply);
    }
    for (idx, node) in problem.nodes.iter().enumerate() {
        let verts = vertices[node.id.as_str()];
        if lower_in[idx] > EPS {
            net.add_edge(super_source, verts.v_in, lower_in[idx]);
        }
        if lower_out[idx] > EPS {
            net.add_edge(verts.v_out, super_sink, lower_out[idx]);
        }
    }

    // Sink arc: exactly the total supply, so real sink inflow can never
    // exceed what the sources produce
    net.add_edge(
        vertices[problem.sink.as_str()].v_in,
        super_sink,
        total_supply,
    );

    let expected = total_supply + total_lb;
    debug!(
        vertices = net.num_nodes(),
        edges = net.num_edges(),
        expected,
        "reduction built"
    );

    Reduction {
        net,
        super_source,
        super_sink,
        expected,
        edge_ids,
        vertices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belts::types::{Edge, Node, Source};

    fn problem(nodes: Vec<Node>, edges: Vec<Edge>, sources: Vec<Source>, sink: &str) -> BeltsProblem {
        BeltsProblem {
            nodes,
            edges,
            sources,
            sink: sink.to_string(),
        }
    }

    fn node(id: &str, cap: Option<f64>) -> Node {
        Node {
            id: id.to_string(),
            cap,
        }
    }

    fn edge(from: &str, to: &str, lower: f64, upper: Option<f64>) -> Edge {
        Edge {
            from: from.to_string(),
            to: to.to_string(),
            lower,
            upper,
        }
    }

    fn source(id: &str, supply: f64) -> Source {
        Source {
            id: id.to_string(),
            supply,
        }
    }

    #[test]
    fn test_capped_interior_node_is_split() {
        let p = problem(
            vec![node("a", None), node("b", Some(3.0)), node("c", None)],
            vec![edge("a", "b", 0.0, Some(10.0)), edge("b", "c", 0.0, Some(10.0))],
            vec![source("a", 7.0)],
            "c",
        );
        let reduction = reduce(&p);
        assert!(reduction.vertices["b"].is_split());
        assert!(!reduction.vertices["a"].is_split());
        // a, b_in, b_out, c, S*, T*
        assert_eq!(reduction.net.num_nodes(), 6);
    }

    #[test]
    fn test_capped_source_and_sink_stay_whole() {
        let p = problem(
            vec![node("a", Some(5.0)), node("b", Some(5.0))],
            vec![edge("a", "b", 0.0, Some(10.0))],
            vec![source("a", 2.0)],
            "b",
        );
        let reduction = reduce(&p);
        assert!(!reduction.vertices["a"].is_split());
        assert!(!reduction.vertices["b"].is_split());
    }

    #[test]
    fn test_expected_counts_supply_and_lower_bounds() {
        let p = problem(
            vec![node("a", None), node("b", None), node("c", None)],
            vec![edge("a", "b", 5.0, Some(10.0)), edge("b", "c", 0.0, Some(10.0))],
            vec![source("a", 8.0)],
            "c",
        );
        let reduction = reduce(&p);
        assert!((reduction.expected - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_chained_lower_bounds_not_netted() {
        // b has 5 in and 5 out; both sides must reach the super-nodes
        let p = problem(
            vec![node("a", None), node("b", None), node("c", None)],
            vec![edge("a", "b", 5.0, Some(10.0)), edge("b", "c", 5.0, Some(10.0))],
            vec![source("a", 8.0)],
            "c",
        );
        let reduction = reduce(&p);
        assert!((reduction.expected - 18.0).abs() < 1e-12);
        // 2 original edges + S*->a + S*->b + S*->c + a->T* + b->T* + sink arc
        assert_eq!(reduction.net.num_edges(), 8);
    }

    #[test]
    fn test_edge_ids_follow_input_order() {
        let p = problem(
            vec![node("a", None), node("b", None), node("c", None)],
            vec![edge("a", "b", 0.0, Some(4.0)), edge("a", "c", 0.0, Some(4.0))],
            vec![source("a", 1.0)],
            "c",
        );
        let reduction = reduce(&p);
        assert_eq!(reduction.edge_ids.len(), 2);
        assert_ne!(reduction.edge_ids[0], reduction.edge_ids[1]);
    }
}
