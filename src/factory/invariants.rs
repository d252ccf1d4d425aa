//! Invariant checks for factory reports
//!
//! Every property a valid report must satisfy, phrased as checks over the
//! problem/report pair: item balance, raw consumption windows, machine
//! capacity, non-negative crafts, machine-total consistency, and binding
//! bottlenecks. The integration tests run these against every scenario.

use super::normalize::{normalize, EffectiveRecipe};
use super::types::{FactoryProblem, FactoryReport};
use crate::{is_binding, Result, Violation, EPS};
use std::collections::BTreeMap;

/// Relative tolerance for balance checks on solver output
const CHECK_TOL: f64 = 1e-6;

fn tol_for(scale: f64) -> f64 {
    CHECK_TOL * scale.abs().max(1.0)
}

/// Check every invariant the report claims.
///
/// Returns the list of violations; an empty list means the report is
/// consistent with the problem. Error reports have nothing to check.
///
/// # Errors
///
/// Returns an error only if the problem itself fails validation.
pub fn check_report(problem: &FactoryProblem, report: &FactoryReport) -> Result<Vec<Violation>> {
    problem.validate()?;
    let recipes = normalize(problem)?;

    let mut violations = Vec::new();
    match report {
        FactoryReport::Feasible {
            crafts_per_min,
            total_machines,
            target_per_min,
            ..
        } => {
            check_plan(problem, &recipes, crafts_per_min, *target_per_min, &mut violations);
            check_machine_total(&recipes, crafts_per_min, *total_machines, &mut violations);
        }
        FactoryReport::Limited {
            max_feasible_target_per_min,
            crafts_per_min,
            bottlenecks,
            ..
        } => {
            if *max_feasible_target_per_min > problem.target.rate_per_min + EPS {
                violations.push(Violation::new(
                    "max_rate_within_request",
                    format!(
                        "achievable rate {max_feasible_target_per_min} exceeds requested {}",
                        problem.target.rate_per_min
                    ),
                ));
            }
            check_plan(
                problem,
                &recipes,
                crafts_per_min,
                *max_feasible_target_per_min,
                &mut violations,
            );
            check_bottlenecks_binding(
                problem,
                &recipes,
                crafts_per_min,
                &bottlenecks.machines,
                &bottlenecks.raws,
                &mut violations,
            );
        }
        FactoryReport::Error { .. } => {}
    }
    Ok(violations)
}

/// Balance, raw window, machine cap, and non-negativity checks at `rate`
fn check_plan(
    problem: &FactoryProblem,
    recipes: &[EffectiveRecipe],
    plan: &BTreeMap<String, f64>,
    rate: f64,
    violations: &mut Vec<Violation>,
) {
    let x = |recipe: &EffectiveRecipe| plan.get(&recipe.id).copied().unwrap_or(0.0);

    for recipe in recipes {
        if x(recipe) < -EPS {
            violations.push(Violation::new(
                "crafts_non_negative",
                format!("recipe '{}' runs at {}", recipe.id, x(recipe)),
            ));
        }
    }

    let mut items: Vec<&str> = recipes
        .iter()
        .flat_map(|r| r.inputs.keys().chain(r.outputs.keys()))
        .map(String::as_str)
        .collect();
    items.push(&problem.target.item);
    items.sort_unstable();
    items.dedup();

    for item in items {
        let net: f64 = recipes.iter().map(|r| r.net(item) * x(r)).sum();
        if problem.is_raw(item) {
            let consumed = -net;
            let cap = problem.raw_caps[item];
            if consumed < -tol_for(1.0) {
                violations.push(Violation::new(
                    "raw_not_created",
                    format!("raw '{item}' has net production {net}"),
                ));
            }
            if consumed > cap + tol_for(cap) {
                violations.push(Violation::new(
                    "raw_within_cap",
                    format!("raw '{item}' consumed at {consumed} over cap {cap}"),
                ));
            }
        } else {
            let rhs = if item == problem.target.item { rate } else { 0.0 };
            if (net - rhs).abs() > tol_for(rhs) {
                violations.push(Violation::new(
                    "item_balance",
                    format!("item '{item}' nets {net}, expected {rhs}"),
                ));
            }
        }
    }

    for machine in &problem.machines {
        let used: f64 = recipes
            .iter()
            .filter(|r| r.machine == machine.id)
            .map(|r| r.machine_cost * x(r))
            .sum();
        if used > machine.max_count + tol_for(machine.max_count) {
            violations.push(Violation::new(
                "machine_within_cap",
                format!(
                    "machine '{}' uses {used} of {} allowed",
                    machine.id, machine.max_count
                ),
            ));
        }
    }
}

/// `total_machines` must equal the summed machine usage of the plan
fn check_machine_total(
    recipes: &[EffectiveRecipe],
    plan: &BTreeMap<String, f64>,
    total_machines: f64,
    violations: &mut Vec<Violation>,
) {
    let summed: f64 = recipes
        .iter()
        .map(|r| r.machine_cost * plan.get(&r.id).copied().unwrap_or(0.0))
        .sum();
    if (summed - total_machines).abs() > tol_for(total_machines) {
        violations.push(Violation::new(
            "machine_total_consistent",
            format!("plan sums to {summed} machines, report says {total_machines}"),
        ));
    }
}

/// Every reported bottleneck must actually have zero slack
fn check_bottlenecks_binding(
    problem: &FactoryProblem,
    recipes: &[EffectiveRecipe],
    plan: &BTreeMap<String, f64>,
    machines: &[String],
    raws: &[String],
    violations: &mut Vec<Violation>,
) {
    let x = |recipe: &EffectiveRecipe| plan.get(&recipe.id).copied().unwrap_or(0.0);

    let caps: BTreeMap<&str, f64> = problem
        .machines
        .iter()
        .map(|m| (m.id.as_str(), m.max_count))
        .collect();
    for machine in machines {
        let used: f64 = recipes
            .iter()
            .filter(|r| &r.machine == machine)
            .map(|r| r.machine_cost * x(r))
            .sum();
        match caps.get(machine.as_str()) {
            Some(cap) if is_binding(*cap, used) => {}
            Some(cap) => violations.push(Violation::new(
                "bottleneck_binding",
                format!("machine '{machine}' reported binding with {used} of {cap}"),
            )),
            None => violations.push(Violation::new(
                "bottleneck_binding",
                format!("unknown machine '{machine}' reported as bottleneck"),
            )),
        }
    }

    for item in raws {
        match problem.raw_caps.get(item) {
            Some(cap) => {
                let consumed: f64 = recipes.iter().map(|r| -r.net(item) * x(r)).sum();
                if !is_binding(*cap, consumed) {
                    violations.push(Violation::new(
                        "bottleneck_binding",
                        format!("raw '{item}' reported binding with {consumed} of {cap}"),
                    ));
                }
            }
            None => violations.push(Violation::new(
                "bottleneck_binding",
                format!("unknown raw '{item}' reported as bottleneck"),
            )),
        }
    }
}
