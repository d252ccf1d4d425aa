//! Max-flow driver and certificate extraction
//!
//! Runs the reduced instance, tests the saturation condition, and maps the
//! result back through the reduction: realized edge flows (`lower` plus
//! residual flow) when feasible, otherwise the min-cut certificate naming
//! the deficit, the cut-reachable original nodes, and the binding node caps
//! and edge upper bounds.

use super::transform::{reduce, Reduction};
use super::types::{BeltsProblem, BeltsReport, EdgeFlow, EdgeRef};
use crate::graph::flow::{max_flow, MaxFlowResult};
use crate::{snap_zero, Result, EPS};
use tracing::debug;

/// Solve a belts problem.
///
/// Infeasibility is a first-class result ([`BeltsReport::Infeasible`]), not
/// an error.
///
/// # Errors
///
/// Returns validation errors for malformed problems and internal errors if
/// the reduced instance is rejected by the flow solver.
pub fn solve(problem: &BeltsProblem) -> Result<BeltsReport> {
    problem.validate()?;
    let reduction = reduce(problem);
    let result = max_flow(&reduction.net, reduction.super_source, reduction.super_sink)?;
    debug!(
        value = result.value,
        expected = reduction.expected,
        "reduction solved"
    );

    if result.value >= reduction.expected - EPS {
        Ok(BeltsReport::feasible(reconstruct(problem, &reduction, &result)))
    } else {
        Ok(certificate(problem, &reduction, &result))
    }
}

/// Realized flow per original edge: lower bound plus residual flow
fn reconstruct(
    problem: &BeltsProblem,
    reduction: &Reduction,
    result: &MaxFlowResult,
) -> Vec<EdgeFlow> {
    problem
        .edges
        .iter()
        .zip(&reduction.edge_ids)
        .map(|(edge, &id)| EdgeFlow {
            from: edge.from.clone(),
            to: edge.to.clone(),
            flow: snap_zero(edge.lower + result.edge_flows[id]),
        })
        .collect()
}

/// Min-cut certificate mapped back onto the original network
fn certificate(
    problem: &BeltsProblem,
    reduction: &Reduction,
    result: &MaxFlowResult,
) -> BeltsReport {
    let reachable = &result.source_side;

    let mut cut_reachable: Vec<String> = reduction
        .vertices
        .iter()
        .filter(|(_, verts)| reachable[verts.v_in])
        .map(|(id, _)| id.clone())
        .collect();
    cut_reachable.sort_unstable();

    let mut tight_nodes: Vec<String> = reduction
        .vertices
        .iter()
        .filter(|(_, verts)| verts.is_split() && reachable[verts.v_in] && !reachable[verts.v_out])
        .map(|(id, _)| id.clone())
        .collect();
    tight_nodes.sort_unstable();

    let mut tight_edges: Vec<EdgeRef> = problem
        .edges
        .iter()
        .filter(|edge| {
            let u = reduction.vertices[edge.from.as_str()];
            let v = reduction.vertices[edge.to.as_str()];
            reachable[u.v_out] && !reachable[v.v_in]
        })
        .map(|edge| EdgeRef {
            from: edge.from.clone(),
            to: edge.to.clone(),
        })
        .collect();
    tight_edges.sort_by(|a, b| {
        (a.from.as_str(), a.to.as_str()).cmp(&(b.from.as_str(), b.to.as_str()))
    });

    let deficit = reduction.expected - result.value;
    debug!(deficit, "flow infeasible, extracting min cut");
    BeltsReport::infeasible(deficit, cut_reachable, tight_nodes, tight_edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belts::types::{Edge, Node, Source};
    use approx::assert_abs_diff_eq;

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
    fn test_single_edge() {
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", None)],
            edges: vec![edge("A", "B", 0.0, Some(10.0))],
            sources: vec![source("A", 7.0)],
            sink: "B".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Feasible { flows, .. } => {
                assert_eq!(flows.len(), 1);
                assert_abs_diff_eq!(flows[0].flow, 7.0, epsilon = 1e-9);
            }
            other => panic!("expected feasible, got {other:?}"),
        }
    }

    #[test]
    fn test_lower_bound_met_by_supply() {
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", None), node("C", None)],
            edges: vec![edge("A", "B", 5.0, Some(10.0)), edge("B", "C", 0.0, Some(10.0))],
            sources: vec![source("A", 8.0)],
            sink: "C".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Feasible { flows, .. } => {
                assert_abs_diff_eq!(flows[0].flow, 8.0, epsilon = 1e-9);
                assert_abs_diff_eq!(flows[1].flow, 8.0, epsilon = 1e-9);
            }
            other => panic!("expected feasible, got {other:?}"),
        }
    }

    #[test]
    fn test_node_cap_infeasible() {
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", Some(3.0)), node("C", None)],
            edges: vec![edge("A", "B", 0.0, Some(10.0)), edge("B", "C", 0.0, Some(10.0))],
            sources: vec![source("A", 7.0)],
            sink: "C".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Infeasible {
                deficit,
                cut_reachable,
                tight_nodes,
                tight_edges,
                ..
            } => {
                assert_abs_diff_eq!(deficit, 4.0, epsilon = 1e-9);
                assert_eq!(cut_reachable, vec!["A".to_string(), "B".to_string()]);
                assert_eq!(tight_nodes, vec!["B".to_string()]);
                assert!(tight_edges.is_empty());
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_edge_bound_infeasible() {
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", None)],
            edges: vec![edge("A", "B", 0.0, Some(4.0))],
            sources: vec![source("A", 7.0)],
            sink: "B".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Infeasible {
                deficit,
                tight_edges,
                tight_nodes,
                ..
            } => {
                assert_abs_diff_eq!(deficit, 3.0, epsilon = 1e-9);
                assert!(tight_nodes.is_empty());
                assert_eq!(
                    tight_edges,
                    vec![EdgeRef {
                        from: "A".to_string(),
                        to: "B".to_string()
                    }]
                );
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_chained_lower_bounds_route() {
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", None), node("C", None)],
            edges: vec![edge("A", "B", 5.0, Some(10.0)), edge("B", "C", 5.0, Some(10.0))],
            sources: vec![source("A", 8.0)],
            sink: "C".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Feasible { flows, .. } => {
                assert_abs_diff_eq!(flows[0].flow, 8.0, epsilon = 1e-9);
                assert_abs_diff_eq!(flows[1].flow, 8.0, epsilon = 1e-9);
            }
            other => panic!("expected feasible, got {other:?}"),
        }
    }

    #[test]
    fn test_pure_lower_bound_circulation() {
        // A cycle off the main path forces flow with zero supply
        let problem = BeltsProblem {
            nodes: vec![
                node("A", None),
                node("B", None),
                node("C", None),
                node("D", None),
            ],
            edges: vec![
                edge("A", "D", 0.0, Some(10.0)),
                edge("B", "C", 2.0, Some(5.0)),
                edge("C", "B", 2.0, Some(5.0)),
            ],
            sources: vec![source("A", 0.0)],
            sink: "D".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Feasible { flows, .. } => {
                assert_abs_diff_eq!(flows[0].flow, 0.0, epsilon = 1e-9);
                assert_abs_diff_eq!(flows[1].flow, 2.0, epsilon = 1e-9);
                assert_abs_diff_eq!(flows[2].flow, 2.0, epsilon = 1e-9);
            }
            other => panic!("expected feasible, got {other:?}"),
        }
    }

    #[test]
    fn test_sink_lower_bound_without_supply() {
        // The sink arc carries the total supply, 0 here, so the lower bound
        // into the sink has no legal producer
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", None)],
            edges: vec![edge("A", "B", 2.0, Some(5.0))],
            sources: vec![source("A", 0.0)],
            sink: "B".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Infeasible {
                deficit,
                cut_reachable,
                tight_nodes,
                tight_edges,
                ..
            } => {
                assert_abs_diff_eq!(deficit, 2.0, epsilon = 1e-9);
                assert_eq!(cut_reachable, vec!["B".to_string()]);
                assert!(tight_nodes.is_empty());
                assert!(tight_edges.is_empty());
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_supply_shortfall_against_lower_bound() {
        // The lower bound needs 5 but only 3 can arrive
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", None), node("C", None)],
            edges: vec![edge("A", "B", 0.0, Some(3.0)), edge("B", "C", 5.0, Some(10.0))],
            sources: vec![source("A", 7.0)],
            sink: "C".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Infeasible { deficit, .. } => {
                assert!(deficit > EPS);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_unbounded_upper_edge() {
        let problem = BeltsProblem {
            nodes: vec![node("A", None), node("B", None)],
            edges: vec![edge("A", "B", 0.0, None)],
            sources: vec![source("A", 1000.0)],
            sink: "B".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Feasible { flows, .. } => {
                assert_abs_diff_eq!(flows[0].flow, 1000.0, epsilon = 1e-6);
            }
            other => panic!("expected feasible, got {other:?}"),
        }
    }

    #[test]
    fn test_two_sources_share_interior() {
        let problem = BeltsProblem {
            nodes: vec![
                node("A", None),
                node("B", None),
                node("M", Some(10.0)),
                node("Z", None),
            ],
            edges: vec![
                edge("A", "M", 0.0, Some(8.0)),
                edge("B", "M", 0.0, Some(8.0)),
                edge("M", "Z", 0.0, Some(20.0)),
            ],
            sources: vec![source("A", 4.0), source("B", 6.0)],
            sink: "Z".to_string(),
        };
        match solve(&problem).unwrap() {
            BeltsReport::Feasible { flows, .. } => {
                assert_abs_diff_eq!(flows[0].flow + flows[1].flow, 10.0, epsilon = 1e-9);
                assert_abs_diff_eq!(flows[2].flow, 10.0, epsilon = 1e-9);
            }
            other => panic!("expected feasible, got {other:?}"),
        }
    }
}
