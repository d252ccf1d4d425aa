//! Types for the factory planning pipeline

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A production planning problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryProblem {
    /// Recipe catalogue
    pub recipes: Vec<Recipe>,
    /// Machine types referenced by the recipes
    pub machines: Vec<MachineType>,
    /// Supply cap per raw item, in units/min
    pub raw_caps: BTreeMap<String, f64>,
    /// The item and rate to produce
    pub target: Target,
}

/// A recipe executed on one machine type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe identifier
    pub id: String,
    /// Consumed items, units per craft
    #[serde(default)]
    pub inputs: BTreeMap<String, f64>,
    /// Produced items, units per craft
    #[serde(default)]
    pub outputs: BTreeMap<String, f64>,
    /// Base craft time in seconds
    pub time_s: f64,
    /// Machine type the recipe runs on
    pub machine: String,
}

/// A machine type with a count cap and installed modules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineType {
    /// Machine type identifier
    pub id: String,
    /// Maximum number of machines of this type
    pub max_count: f64,
    /// Base craft speed multiplier
    pub base_speed: f64,
    /// Installed modules
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// A machine module
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Module {
    /// Speed modifier, additive to 1.0
    #[serde(default)]
    pub speed: f64,
    /// Productivity modifier, additive to 1.0
    #[serde(default)]
    pub prod: f64,
}

/// The production target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Target item identifier
    pub item: String,
    /// Requested production rate in units/min
    pub rate_per_min: f64,
}

impl FactoryProblem {
    /// Validate identifiers, references, and numeric domains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] or [`Error::UnknownReference`] on the
    /// first violated rule.
    pub fn validate(&self) -> Result<()> {
        let mut machine_ids = BTreeSet::new();
        for machine in &self.machines {
            if !machine_ids.insert(machine.id.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate machine id '{}'",
                    machine.id
                )));
            }
            if !machine.max_count.is_finite() || machine.max_count < 0.0 {
                return Err(Error::invalid_input(format!(
                    "machine '{}' has invalid max_count {}",
                    machine.id, machine.max_count
                )));
            }
            if !machine.base_speed.is_finite() || machine.base_speed <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "machine '{}' has non-positive base_speed {}",
                    machine.id, machine.base_speed
                )));
            }
            for module in &machine.modules {
                if !module.speed.is_finite() || !module.prod.is_finite() {
                    return Err(Error::invalid_input(format!(
                        "machine '{}' has a module with non-finite modifiers",
                        machine.id
                    )));
                }
            }
            if 1.0 + machine.speed_mod() <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "machine '{}' has non-positive aggregate speed multiplier",
                    machine.id
                )));
            }
        }

        let mut recipe_ids = BTreeSet::new();
        for recipe in &self.recipes {
            if !recipe_ids.insert(recipe.id.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate recipe id '{}'",
                    recipe.id
                )));
            }
            if !machine_ids.contains(recipe.machine.as_str()) {
                return Err(Error::unknown("machine", recipe.machine.clone()));
            }
            if !recipe.time_s.is_finite() || recipe.time_s <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "recipe '{}' has non-positive time_s {}",
                    recipe.id, recipe.time_s
                )));
            }
            for (item, qty) in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                if !qty.is_finite() || *qty < 0.0 {
                    return Err(Error::invalid_input(format!(
                        "recipe '{}' has invalid quantity {qty} for item '{item}'",
                        recipe.id
                    )));
                }
            }
        }

        for (item, cap) in &self.raw_caps {
            if !cap.is_finite() || *cap < 0.0 {
                return Err(Error::invalid_input(format!(
                    "raw cap for '{item}' must be non-negative, got {cap}"
                )));
            }
        }

        if !self.target.rate_per_min.is_finite() || self.target.rate_per_min < 0.0 {
            return Err(Error::invalid_input(format!(
                "target rate must be non-negative, got {}",
                self.target.rate_per_min
            )));
        }
        if self.raw_caps.contains_key(&self.target.item) {
            return Err(Error::invalid_input(format!(
                "target item '{}' is listed as a raw material",
                self.target.item
            )));
        }

        Ok(())
    }

    /// Whether an item is raw, i.e. listed in `raw_caps`
    #[must_use]
    pub fn is_raw(&self, item: &str) -> bool {
        self.raw_caps.contains_key(item)
    }
}

impl MachineType {
    /// Aggregate speed modifier of the installed modules
    #[must_use]
    pub fn speed_mod(&self) -> f64 {
        self.modules.iter().map(|m| m.speed).sum()
    }

    /// Aggregate productivity modifier of the installed modules
    #[must_use]
    pub fn prod_mod(&self) -> f64 {
        self.modules.iter().map(|m| m.prod).sum()
    }
}

/// Bottleneck hints for a capped-out plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bottlenecks {
    /// Machine types whose count cap is binding, sorted
    pub machines: Vec<String>,
    /// Raw items whose supply cap is binding, sorted
    pub raws: Vec<String>,
}

/// Result of a factory solve, in output-schema shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactoryReport {
    /// The requested target rate is achievable
    Feasible {
        /// Always `true`
        feasible: bool,
        /// Crafts/min per recipe
        crafts_per_min: BTreeMap<String, f64>,
        /// Total machines used by the plan
        total_machines: f64,
        /// The achieved target rate (equals the request)
        target_per_min: f64,
    },
    /// The requested rate is out of reach; this is the maximization result
    Limited {
        /// Always `false`
        feasible: bool,
        /// Best achievable target rate
        max_feasible_target_per_min: f64,
        /// Crafts/min per recipe at the maximum
        crafts_per_min: BTreeMap<String, f64>,
        /// Binding caps at the maximum
        bottlenecks: Bottlenecks,
    },
    /// The invocation failed before any solve completed
    Error {
        /// Always `false`
        feasible: bool,
        /// Diagnostic message
        error: String,
    },
}

impl FactoryReport {
    /// Build the feasible variant
    #[must_use]
    pub fn feasible(
        crafts_per_min: BTreeMap<String, f64>,
        total_machines: f64,
        target_per_min: f64,
    ) -> Self {
        Self::Feasible {
            feasible: true,
            crafts_per_min,
            total_machines,
            target_per_min,
        }
    }

    /// Build the maximization-result variant
    #[must_use]
    pub fn limited(
        max_feasible_target_per_min: f64,
        crafts_per_min: BTreeMap<String, f64>,
        bottlenecks: Bottlenecks,
    ) -> Self {
        Self::Limited {
            feasible: false,
            max_feasible_target_per_min,
            crafts_per_min,
            bottlenecks,
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
