//! Invariant checks for belts reports
//!
//! Feasible reports are checked directly against the problem: per-edge
//! bounds, interior conservation, source supply windows, capped-node
//! throughput, and source/sink balance. Certificates are checked by
//! re-running the reduction and comparing the deficit accounting and cut
//! sets, which the deterministic oracle makes exact.

use super::solver;
use super::transform::reduce;
use super::types::{BeltsProblem, BeltsReport, EdgeFlow, EdgeRef};
use crate::graph::flow::max_flow;
use crate::{Result, Violation, EPS};
use std::collections::BTreeMap;

/// Absolute tolerance for conservation checks on solver output
const CHECK_TOL: f64 = 1e-6;

/// Check every invariant the report claims.
///
/// Returns the list of violations; an empty list means the report is
/// consistent with the problem. Error reports have nothing to check.
///
/// # Errors
///
/// Returns an error only if the problem itself fails validation.
pub fn check_report(problem: &BeltsProblem, report: &BeltsReport) -> Result<Vec<Violation>> {
    problem.validate()?;
    let mut violations = Vec::new();
    match report {
        BeltsReport::Feasible { flows, .. } => {
            check_flows(problem, flows, &mut violations);
        }
        BeltsReport::Infeasible {
            deficit,
            tight_nodes,
            tight_edges,
            ..
        } => {
            check_certificate(problem, *deficit, tight_nodes, tight_edges, &mut violations)?;
        }
        BeltsReport::Error { .. } => {}
    }
    Ok(violations)
}

fn check_flows(problem: &BeltsProblem, flows: &[EdgeFlow], violations: &mut Vec<Violation>) {
    if flows.len() != problem.edges.len() {
        violations.push(Violation::new(
            "flow_per_edge",
            format!(
                "{} flows reported for {} edges",
                flows.len(),
                problem.edges.len()
            ),
        ));
        return;
    }

    // Per-edge bounds, preserving input order
    for (edge, flow) in problem.edges.iter().zip(flows) {
        if flow.from != edge.from || flow.to != edge.to {
            violations.push(Violation::new(
                "flow_edge_order",
                format!(
                    "flow for {} -> {} reported against edge {} -> {}",
                    flow.from, flow.to, edge.from, edge.to
                ),
            ));
        }
        if flow.flow < edge.lower - CHECK_TOL {
            violations.push(Violation::new(
                "edge_lower_bound",
                format!(
                    "edge {} -> {} carries {} below lower {}",
                    edge.from, edge.to, flow.flow, edge.lower
                ),
            ));
        }
        if let Some(upper) = edge.upper {
            if flow.flow > upper + CHECK_TOL {
                violations.push(Violation::new(
                    "edge_upper_bound",
                    format!(
                        "edge {} -> {} carries {} above upper {upper}",
                        edge.from, edge.to, flow.flow
                    ),
                ));
            }
        }
    }

    // Net flow per node
    let mut net_out: BTreeMap<&str, f64> = BTreeMap::new();
    let mut inflow: BTreeMap<&str, f64> = BTreeMap::new();
    for (edge, flow) in problem.edges.iter().zip(flows) {
        *net_out.entry(edge.from.as_str()).or_default() += flow.flow;
        *net_out.entry(edge.to.as_str()).or_default() -= flow.flow;
        *inflow.entry(edge.to.as_str()).or_default() += flow.flow;
    }

    let sources = problem.source_map();
    for node in &problem.nodes {
        let id = node.id.as_str();
        let net = net_out.get(id).copied().unwrap_or(0.0);
        if let Some(&supply) = sources.get(id) {
            if net > supply + CHECK_TOL {
                violations.push(Violation::new(
                    "source_within_supply",
                    format!("source '{id}' emits {net} with supply {supply}"),
                ));
            }
        } else if id != problem.sink && net.abs() > CHECK_TOL {
            violations.push(Violation::new(
                "interior_conservation",
                format!("node '{id}' has net outflow {net}"),
            ));
        }

        if let Some(cap) = node.cap {
            let is_endpoint = sources.contains_key(id) || id == problem.sink;
            let throughput = inflow.get(id).copied().unwrap_or(0.0);
            if !is_endpoint && throughput > cap + CHECK_TOL {
                violations.push(Violation::new(
                    "node_within_cap",
                    format!("node '{id}' carries {throughput} with cap {cap}"),
                ));
            }
        }
    }

    // Everything the sources emit arrives at the sink
    let emitted: f64 = problem
        .sources
        .iter()
        .map(|s| net_out.get(s.id.as_str()).copied().unwrap_or(0.0))
        .sum();
    let absorbed = -net_out.get(problem.sink.as_str()).copied().unwrap_or(0.0);
    if (emitted - absorbed).abs() > CHECK_TOL {
        violations.push(Violation::new(
            "source_sink_balance",
            format!("sources emit {emitted} but sink absorbs {absorbed}"),
        ));
    }
}

/// Replay the reduction and compare the certificate against it
fn check_certificate(
    problem: &BeltsProblem,
    deficit: f64,
    tight_nodes: &[String],
    tight_edges: &[EdgeRef],
    violations: &mut Vec<Violation>,
) -> Result<()> {
    if deficit <= EPS {
        violations.push(Violation::new(
            "deficit_positive",
            format!("certificate reports deficit {deficit}"),
        ));
    }

    let reduction = reduce(problem);
    let result = max_flow(&reduction.net, reduction.super_source, reduction.super_sink)?;
    if (deficit - (reduction.expected - result.value)).abs() > CHECK_TOL {
        violations.push(Violation::new(
            "deficit_accounting",
            format!(
                "deficit {deficit} but expected {} minus max flow {} is {}",
                reduction.expected,
                result.value,
                reduction.expected - result.value
            ),
        ));
    }

    match solver::solve(problem)? {
        BeltsReport::Infeasible {
            tight_nodes: expected_nodes,
            tight_edges: expected_edges,
            ..
        } => {
            if tight_nodes != expected_nodes {
                violations.push(Violation::new(
                    "tight_nodes_binding",
                    format!("reported {tight_nodes:?}, cut yields {expected_nodes:?}"),
                ));
            }
            if tight_edges != expected_edges {
                violations.push(Violation::new(
                    "tight_edges_binding",
                    format!("reported {tight_edges:?}, cut yields {expected_edges:?}"),
                ));
            }
        }
        _ => violations.push(Violation::new(
            "certificate_reproducible",
            "problem solves feasible on replay".to_string(),
        )),
    }
    Ok(())
}
