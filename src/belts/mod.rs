//! Belt flow routing
//!
//! Routes multiple capped supplies through a directed network with per-edge
//! lower/upper bounds and per-node throughput caps into a single sink, or
//! explains why that cannot be done with a min-cut certificate.
//!
//! ## Pipeline
//!
//! 1. Transform the network: split capped interior nodes, rewrite bounded
//!    edges as residual capacities with lower bounds re-routed through
//!    super-nodes
//! 2. Wire `S*`/`T*`: supplies, lower-bound injections and drains, and the
//!    sink arc
//! 3. Run max flow and test saturation against
//!    `expected = total_supply + total_lb`
//! 4. Either reconstruct per-edge flows or extract the min-cut certificate
//!
//! ## Example
//!
//! ```rust
//! use flowforge::belts::{self, BeltsReport};
//!
//! let json = r#"{
//!     "nodes": [{ "id": "A", "cap": null }, { "id": "B", "cap": null }],
//!     "edges": [{ "from": "A", "to": "B", "lower": 0.0, "upper": 10.0 }],
//!     "sources": [{ "id": "A", "supply": 7.0 }],
//!     "sink": "B"
//! }"#;
//!
//! let problem: belts::BeltsProblem = serde_json::from_str(json).unwrap();
//! assert!(matches!(
//!     belts::solve(&problem).unwrap(),
//!     BeltsReport::Feasible { .. }
//! ));
//! ```

mod invariants;
mod solver;
mod transform;
mod types;

pub use invariants::check_report;
pub use solver::solve;
pub use transform::{reduce, NodeVerts, Reduction};
pub use types::{BeltsProblem, BeltsReport, Edge, EdgeFlow, EdgeRef, Node, Source};

/// Run the whole pipeline on a raw JSON document.
///
/// Every handled failure (malformed JSON, validation, solver anomalies) is
/// folded into the error report, so the caller always gets a rendered
/// document.
#[must_use]
pub fn run(input: &str) -> String {
    let report = match serde_json::from_str::<BeltsProblem>(input) {
        Ok(problem) => {
            solver::solve(&problem).unwrap_or_else(|e| BeltsReport::error(e.to_string()))
        }
        Err(e) => BeltsReport::error(format!("malformed input: {e}")),
    };
    render(&report)
}

/// Render a report as the two-space-indented output document
#[must_use]
pub fn render(report: &BeltsReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| {
        format!("{{\n  \"feasible\": false,\n  \"error\": \"render failure: {e}\"\n}}")
    })
}
