//! Module-effect resolution
//!
//! Folds machine base speed and installed modules into per-recipe effective
//! rates before anything touches the LP: speed scales the crafting rate,
//! productivity scales outputs only. Inputs are never scaled.

use super::types::FactoryProblem;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// A recipe with machine and module effects applied
#[derive(Debug, Clone)]
pub struct EffectiveRecipe {
    /// Recipe identifier
    pub id: String,
    /// Machine type the recipe runs on
    pub machine: String,
    /// Crafts/min a single machine sustains
    pub crafts_per_min: f64,
    /// Machines required per craft/min
    pub machine_cost: f64,
    /// Consumed items, units per craft (unscaled)
    pub inputs: BTreeMap<String, f64>,
    /// Produced items, units per craft, scaled by productivity
    pub outputs: BTreeMap<String, f64>,
}

impl EffectiveRecipe {
    /// Net production of `item` per craft: effective output minus input
    #[must_use]
    pub fn net(&self, item: &str) -> f64 {
        self.outputs.get(item).copied().unwrap_or(0.0)
            - self.inputs.get(item).copied().unwrap_or(0.0)
    }
}

/// Resolve module effects for every recipe, in lexicographic id order.
///
/// # Errors
///
/// Returns [`Error::UnknownReference`] if a recipe names a machine type the
/// problem does not declare.
pub fn normalize(problem: &FactoryProblem) -> Result<Vec<EffectiveRecipe>> {
    let machines: BTreeMap<&str, _> = problem
        .machines
        .iter()
        .map(|m| (m.id.as_str(), m))
        .collect();

    let mut recipes = Vec::with_capacity(problem.recipes.len());
    for recipe in &problem.recipes {
        let machine = machines
            .get(recipe.machine.as_str())
            .ok_or_else(|| Error::unknown("machine", recipe.machine.clone()))?;

        let crafts_per_min =
            machine.base_speed * (1.0 + machine.speed_mod()) * 60.0 / recipe.time_s;
        let prod_scale = 1.0 + machine.prod_mod();

        recipes.push(EffectiveRecipe {
            id: recipe.id.clone(),
            machine: recipe.machine.clone(),
            crafts_per_min,
            machine_cost: 1.0 / crafts_per_min,
            inputs: recipe.inputs.clone(),
            outputs: recipe
                .outputs
                .iter()
                .map(|(item, qty)| (item.clone(), qty * prod_scale))
                .collect(),
        });
    }

    recipes.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(recipes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::types::{MachineType, Module, Recipe, Target};
    use approx::assert_abs_diff_eq;

    fn problem_with_modules(modules: Vec<Module>) -> FactoryProblem {
        FactoryProblem {
            recipes: vec![Recipe {
                id: "press".to_string(),
                inputs: BTreeMap::from([("ore".to_string(), 2.0)]),
                outputs: BTreeMap::from([("plate".to_string(), 1.0)]),
                time_s: 2.0,
                machine: "press".to_string(),
            }],
            machines: vec![MachineType {
                id: "press".to_string(),
                max_count: 5.0,
                base_speed: 2.0,
                modules,
            }],
            raw_caps: BTreeMap::from([("ore".to_string(), 100.0)]),
            target: Target {
                item: "plate".to_string(),
                rate_per_min: 10.0,
            },
        }
    }

    #[test]
    fn test_base_rate() {
        // base_speed 2, no modules, 2s craft: 60 crafts/min per machine
        let recipes = normalize(&problem_with_modules(vec![])).unwrap();
        assert_abs_diff_eq!(recipes[0].crafts_per_min, 60.0, epsilon = 1e-12);
        assert_abs_diff_eq!(recipes[0].machine_cost, 1.0 / 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_speed_scales_rate_not_outputs() {
        let recipes = normalize(&problem_with_modules(vec![Module {
            speed: 0.5,
            prod: 0.0,
        }]))
        .unwrap();
        assert_abs_diff_eq!(recipes[0].crafts_per_min, 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(recipes[0].outputs["plate"], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_productivity_scales_outputs_not_inputs() {
        let recipes = normalize(&problem_with_modules(vec![Module {
            speed: 0.0,
            prod: 0.5,
        }]))
        .unwrap();
        assert_abs_diff_eq!(recipes[0].crafts_per_min, 60.0, epsilon = 1e-12);
        assert_abs_diff_eq!(recipes[0].outputs["plate"], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(recipes[0].inputs["ore"], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_net_production() {
        let mut problem = problem_with_modules(vec![]);
        problem.recipes[0]
            .inputs
            .insert("plate".to_string(), 0.25);
        let recipes = normalize(&problem).unwrap();
        assert_abs_diff_eq!(recipes[0].net("plate"), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(recipes[0].net("ore"), -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(recipes[0].net("unused"), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sorted_by_id() {
        let mut problem = problem_with_modules(vec![]);
        problem.recipes.push(Recipe {
            id: "anneal".to_string(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::from([("plate".to_string(), 1.0)]),
            time_s: 1.0,
            machine: "press".to_string(),
        });
        let recipes = normalize(&problem).unwrap();
        assert_eq!(recipes[0].id, "anneal");
        assert_eq!(recipes[1].id, "press");
    }
}
