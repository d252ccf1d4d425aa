//! Max flow over real-valued capacities
//!
//! The network is an adjacency list of paired forward/reverse edges; each
//! forward edge at an even index is immediately followed by its reverse.
//! Flow is pushed along level-graph augmenting paths (Dinic): breadth-first
//! levels bound the search, a depth-first blocking-flow pass saturates them,
//! and the loop repeats until the sink is unreachable in the residual graph.
//!
//! The final residual graph doubles as the min-cut witness: vertices still
//! reachable from the source form the source side of a minimum cut, which
//! the belts certificate extractor maps back onto original nodes and edges.

use crate::{Error, Result, EPS};
use std::collections::VecDeque;
use tracing::debug;

/// A flow network over `f64` capacities
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    /// Number of vertices
    num_nodes: usize,
    /// Adjacency list: `adj[u]` holds indices into `edges`
    adj: Vec<Vec<usize>>,
    /// All edges, forward and reverse interleaved
    edges: Vec<FlowEdge>,
}

/// An edge in the flow network
#[derive(Debug, Clone, Copy)]
struct FlowEdge {
    /// Target vertex
    to: usize,
    /// Capacity
    capacity: f64,
    /// Current flow
    flow: f64,
    /// Index of the paired reverse edge
    rev: usize,
}

impl FlowNetwork {
    /// Create a new flow network with `num_nodes` vertices
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            adj: vec![Vec::new(); num_nodes],
            edges: Vec::new(),
        }
    }

    /// Number of vertices
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of forward edges added so far
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len() / 2
    }

    /// Add an edge from `from` to `to` with the given capacity.
    ///
    /// Returns the forward-edge id, which indexes
    /// [`MaxFlowResult::edge_flows`].
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: f64) -> usize {
        let forward_idx = self.edges.len();
        let reverse_idx = forward_idx + 1;

        self.edges.push(FlowEdge {
            to,
            capacity,
            flow: 0.0,
            rev: reverse_idx,
        });
        self.adj[from].push(forward_idx);

        // Reverse edge with zero capacity carries the residual
        self.edges.push(FlowEdge {
            to: from,
            capacity: 0.0,
            flow: 0.0,
            rev: forward_idx,
        });
        self.adj[to].push(reverse_idx);

        forward_idx / 2
    }

    fn residual(&self, edge_idx: usize) -> f64 {
        self.edges[edge_idx].capacity - self.edges[edge_idx].flow
    }

    fn push_flow(&mut self, edge_idx: usize, amount: f64) {
        self.edges[edge_idx].flow += amount;
        let rev = self.edges[edge_idx].rev;
        self.edges[rev].flow -= amount;
    }

    /// Breadth-first levels over residual edges; `None` for unreachable
    fn levels(&self, source: usize) -> Vec<Option<usize>> {
        let mut level = vec![None; self.num_nodes];
        level[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            for &edge_idx in &self.adj[u] {
                let edge = &self.edges[edge_idx];
                if self.residual(edge_idx) > EPS && level[edge.to].is_none() {
                    level[edge.to] = Some(level[u].expect("visited") + 1);
                    queue.push_back(edge.to);
                }
            }
        }
        level
    }

    /// Depth-first augmentation within the level graph
    fn augment(
        &mut self,
        level: &[Option<usize>],
        iter: &mut [usize],
        u: usize,
        sink: usize,
        limit: f64,
    ) -> f64 {
        if u == sink {
            return limit;
        }
        while iter[u] < self.adj[u].len() {
            let edge_idx = self.adj[u][iter[u]];
            let v = self.edges[edge_idx].to;
            let residual = self.residual(edge_idx);
            if residual > EPS && level[v] == level[u].map(|l| l + 1) {
                let pushed = self.augment(level, iter, v, sink, limit.min(residual));
                if pushed > EPS {
                    self.push_flow(edge_idx, pushed);
                    return pushed;
                }
            }
            iter[u] += 1;
        }
        0.0
    }

    /// Vertices reachable from `source` over residual edges
    fn residual_reachable(&self, source: usize) -> Vec<bool> {
        let mut seen = vec![false; self.num_nodes];
        seen[source] = true;
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            for &edge_idx in &self.adj[u] {
                let to = self.edges[edge_idx].to;
                if self.residual(edge_idx) > EPS && !seen[to] {
                    seen[to] = true;
                    queue.push_back(to);
                }
            }
        }
        seen
    }
}

/// Result of a max flow computation
#[derive(Debug, Clone)]
pub struct MaxFlowResult {
    /// Maximum flow value
    pub value: f64,
    /// Flow on each forward edge, indexed by the id `add_edge` returned
    pub edge_flows: Vec<f64>,
    /// Min-cut partition: `source_side[v]` iff `v` is reachable from the
    /// source in the final residual graph
    pub source_side: Vec<bool>,
}

/// Compute the maximum flow from `source` to `sink`.
///
/// Deterministic: augmenting paths are explored in edge-insertion order, so
/// identical networks produce identical per-edge flows and cut partitions.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `source` or `sink` is out of range or
/// they coincide.
pub fn max_flow(network: &FlowNetwork, source: usize, sink: usize) -> Result<MaxFlowResult> {
    if source >= network.num_nodes || sink >= network.num_nodes {
        return Err(Error::invalid_input("source or sink out of range"));
    }
    if source == sink {
        return Err(Error::invalid_input("source and sink must be different"));
    }

    let mut net = network.clone();
    let mut value = 0.0;
    let mut phases = 0usize;

    loop {
        let level = net.levels(source);
        if level[sink].is_none() {
            break;
        }
        phases += 1;
        let mut iter = vec![0usize; net.num_nodes];
        loop {
            let pushed = net.augment(&level, &mut iter, source, sink, f64::INFINITY);
            if pushed <= EPS {
                break;
            }
            value += pushed;
        }
    }

    let edge_flows: Vec<f64> = (0..net.edges.len())
        .step_by(2)
        .map(|i| net.edges[i].flow)
        .collect();
    let source_side = net.residual_reachable(source);

    debug!(value, phases, edges = net.num_edges(), "max flow done");

    Ok(MaxFlowResult {
        value,
        edge_flows,
        source_side,
    })
}
