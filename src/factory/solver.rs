//! Two-phase LP driver for factory planning
//!
//! Phase 1 asks for the requested target rate outright, minimizing total
//! machines. If that LP is infeasible, Phase 2 swaps the target equality for
//! `net_flow(target) - y = 0` with a fresh rate variable `y >= 0` and
//! maximizes `y` under the same raw and machine caps; the optimum is the
//! best achievable rate, and the caps left with zero slack name the
//! bottleneck.
//!
//! Rows and columns are assembled in lexicographic identifier order so the
//! LP oracle sees an identical model on every run.

use super::normalize::{normalize, EffectiveRecipe};
use super::types::{Bottlenecks, FactoryProblem, FactoryReport};
use crate::lp::{LpOutcome, LpProblem};
use crate::{is_binding, snap_zero, Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Solve a factory problem.
///
/// Infeasibility of the requested rate is a first-class result
/// ([`FactoryReport::Limited`]), not an error.
///
/// # Errors
///
/// Returns validation errors for malformed problems. [`Error::Unbounded`]
/// is a defensive surface for oracle anomalies only: every recipe sits in
/// its machine's cap row with a positive coefficient and a finite RHS, so
/// no validated input has an unbounded optimum in either phase.
pub fn solve(problem: &FactoryProblem) -> Result<FactoryReport> {
    problem.validate()?;
    let recipes = normalize(problem)?;

    let lp = build_lp(problem, &recipes, None);
    match lp.solve()? {
        LpOutcome::Optimal { x, objective } => {
            debug!(total_machines = objective, "phase 1 optimal");
            Ok(FactoryReport::feasible(
                plan_map(&recipes, &x),
                snap_zero(objective),
                snap_zero(problem.target.rate_per_min),
            ))
        }
        LpOutcome::Infeasible => {
            debug!("phase 1 infeasible, maximizing achievable target rate");
            maximize_rate(problem, &recipes)
        }
        // Minimizing a non-negative objective; reachable only on oracle
        // malfunction
        LpOutcome::Unbounded => Err(Error::unbounded(
            "machine minimization reported unbounded",
        )),
    }
}

/// Phase 2: maximize the achievable target rate under the same caps
fn maximize_rate(problem: &FactoryProblem, recipes: &[EffectiveRecipe]) -> Result<FactoryReport> {
    let rate_var = recipes.len();
    let lp = build_lp(problem, recipes, Some(rate_var));
    match lp.solve()? {
        LpOutcome::Optimal { x, .. } => {
            let achieved = snap_zero(x[rate_var]);
            debug!(achieved, "phase 2 optimal");
            Ok(FactoryReport::limited(
                achieved,
                plan_map(recipes, &x),
                find_bottlenecks(problem, recipes, &x),
            ))
        }
        LpOutcome::Infeasible => {
            // No production path at all; the zero plan is the maximum
            debug!("phase 2 infeasible, reporting zero achievable rate");
            let zeros = recipes.iter().map(|r| (r.id.clone(), 0.0)).collect();
            Ok(FactoryReport::limited(0.0, zeros, Bottlenecks::default()))
        }
        // Machine caps bound every x_r, and y through the target row;
        // reachable only on oracle malfunction
        LpOutcome::Unbounded => Err(Error::unbounded(
            "achievable-rate maximization reported unbounded for a capped model",
        )),
    }
}

/// Assemble the LP. With `rate_var` set this is the Phase-2 model: the
/// target row gains a `-y` term and the objective becomes `maximize y`;
/// otherwise the target row is pinned to the requested rate and the
/// objective minimizes total machines.
fn build_lp(
    problem: &FactoryProblem,
    recipes: &[EffectiveRecipe],
    rate_var: Option<usize>,
) -> LpProblem {
    let mut lp = match rate_var {
        None => LpProblem::minimize(recipes.len()),
        Some(_) => LpProblem::maximize(recipes.len() + 1),
    };
    match rate_var {
        None => {
            for (i, recipe) in recipes.iter().enumerate() {
                lp.set_objective(i, recipe.machine_cost);
            }
        }
        Some(y) => lp.set_objective(y, 1.0),
    }

    // One balance row per referenced item, plus the target even when nothing
    // references it (its constant row then decides feasibility)
    let mut items: BTreeSet<&str> = recipes
        .iter()
        .flat_map(|r| r.inputs.keys().chain(r.outputs.keys()))
        .map(String::as_str)
        .collect();
    items.insert(&problem.target.item);

    for item in items {
        let terms: Vec<(usize, f64)> = recipes
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let net = r.net(item);
                (net != 0.0).then_some((i, net))
            })
            .collect();

        if problem.is_raw(item) {
            // Raws are only ever consumed, and consumption is capped
            let negated: Vec<(usize, f64)> = terms.iter().map(|&(i, c)| (i, -c)).collect();
            lp.add_le(terms, 0.0);
            lp.add_le(negated, problem.raw_caps[item]);
        } else if item == problem.target.item {
            let mut terms = terms;
            let rhs = match rate_var {
                None => problem.target.rate_per_min,
                Some(y) => {
                    terms.push((y, -1.0));
                    0.0
                }
            };
            lp.add_eq(terms, rhs);
        } else {
            lp.add_eq(terms, 0.0);
        }
    }

    // Machine count caps over the recipes each machine runs
    let mut by_machine: BTreeMap<&str, Vec<(usize, f64)>> = BTreeMap::new();
    for (i, recipe) in recipes.iter().enumerate() {
        by_machine
            .entry(recipe.machine.as_str())
            .or_default()
            .push((i, recipe.machine_cost));
    }
    let caps: BTreeMap<&str, f64> = problem
        .machines
        .iter()
        .map(|m| (m.id.as_str(), m.max_count))
        .collect();
    for (machine, terms) in by_machine {
        lp.add_le(terms, caps[machine]);
    }

    lp
}

/// Caps with zero slack at the Phase-2 optimum, sorted by identifier
fn find_bottlenecks(
    problem: &FactoryProblem,
    recipes: &[EffectiveRecipe],
    x: &[f64],
) -> Bottlenecks {
    let mut machine_use: BTreeMap<&str, f64> = BTreeMap::new();
    for (recipe, &xi) in recipes.iter().zip(x) {
        *machine_use.entry(recipe.machine.as_str()).or_default() += recipe.machine_cost * xi;
    }
    let caps: BTreeMap<&str, f64> = problem
        .machines
        .iter()
        .map(|m| (m.id.as_str(), m.max_count))
        .collect();
    let mut machines = Vec::new();
    for (id, used) in &machine_use {
        if is_binding(caps[id], *used) {
            machines.push((*id).to_string());
        }
    }

    let mut raws = Vec::new();
    for (item, cap) in &problem.raw_caps {
        let referenced = recipes.iter().any(|r| r.net(item) != 0.0);
        let consumed: f64 = recipes
            .iter()
            .zip(x)
            .map(|(r, &xi)| -r.net(item) * xi)
            .sum();
        if referenced && is_binding(*cap, consumed) {
            raws.push(item.clone());
        }
    }

    Bottlenecks { machines, raws }
}

/// Recipe id to snapped crafts/min, sorted by id
fn plan_map(recipes: &[EffectiveRecipe], x: &[f64]) -> BTreeMap<String, f64> {
    recipes
        .iter()
        .zip(x)
        .map(|(r, &xi)| (r.id.clone(), snap_zero(xi)))
        .collect()
}
