//! Factory production planning
//!
//! Computes a steady-state production plan (crafts per minute per recipe)
//! that hits a target item rate while minimizing total machines. When the
//! target is out of reach it computes the maximum achievable rate instead,
//! with the caps that bind it.
//!
//! ## Pipeline
//!
//! 1. Normalize module effects into effective crafts/min, machine cost, and
//!    productivity-scaled outputs per recipe
//! 2. Build the LP: one balance equality per non-raw item, consumption
//!    windows per raw item, count caps per machine type
//! 3. Phase 1 solves for the requested rate; Phase 2 (on infeasibility)
//!    maximizes the achievable rate
//! 4. Binding caps at the Phase-2 optimum become bottleneck hints
//!
//! ## Example
//!
//! ```rust
//! use flowforge::factory::{self, FactoryReport};
//!
//! let json = r#"{
//!     "recipes": [{ "id": "plates", "inputs": {"ore": 1.0},
//!                   "outputs": {"plate": 1.0}, "time_s": 1.0,
//!                   "machine": "furnace" }],
//!     "machines": [{ "id": "furnace", "max_count": 4.0,
//!                    "base_speed": 1.0, "modules": [] }],
//!     "raw_caps": { "ore": 120.0 },
//!     "target": { "item": "plate", "rate_per_min": 60.0 }
//! }"#;
//!
//! let problem: factory::FactoryProblem = serde_json::from_str(json).unwrap();
//! assert!(matches!(
//!     factory::solve(&problem).unwrap(),
//!     FactoryReport::Feasible { .. }
//! ));
//! ```

mod invariants;
mod normalize;
mod solver;
mod types;

pub use invariants::check_report;
pub use normalize::{normalize, EffectiveRecipe};
pub use solver::solve;
pub use types::{Bottlenecks, FactoryProblem, FactoryReport, MachineType, Module, Recipe, Target};

/// Run the whole pipeline on a raw JSON document.
///
/// Every handled failure (malformed JSON, validation, solver anomalies) is
/// folded into the error report, so the caller always gets a rendered
/// document.
#[must_use]
pub fn run(input: &str) -> String {
    let report = match serde_json::from_str::<FactoryProblem>(input) {
        Ok(problem) => {
            solver::solve(&problem).unwrap_or_else(|e| FactoryReport::error(e.to_string()))
        }
        Err(e) => FactoryReport::error(format!("malformed input: {e}")),
    };
    render(&report)
}

/// Render a report as the two-space-indented output document
#[must_use]
pub fn render(report: &FactoryReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| {
        format!("{{\n  \"feasible\": false,\n  \"error\": \"render failure: {e}\"\n}}")
    })
}
