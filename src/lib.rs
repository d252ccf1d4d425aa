//! # flowforge
//!
//! Steady-state optimization tools for production and material-routing
//! systems, built around two independent pipelines:
//!
//! - [`factory`] - Recipe/machine production planning via linear programming
//! - [`belts`] - Bounded-flow routing via max-flow with min-cut certificates
//!
//! Both pipelines share the same shape: parse a JSON problem, validate it,
//! reduce it to a solver input, run a deterministic oracle ([`lp`] or
//! [`graph::flow`]), and map the outcome back to a typed report.
//!
//! ## Quick Start
//!
//! ```rust
//! use flowforge::factory;
//!
//! let input = r#"{
//!     "recipes": [{ "id": "smelt", "inputs": {}, "outputs": {"iron": 1.0},
//!                   "time_s": 1.0, "machine": "furnace" }],
//!     "machines": [{ "id": "furnace", "max_count": 10.0,
//!                    "base_speed": 1.0, "modules": [] }],
//!     "raw_caps": {},
//!     "target": { "item": "iron", "rate_per_min": 30.0 }
//! }"#;
//!
//! let problem: factory::FactoryProblem = serde_json::from_str(input).unwrap();
//! let report = factory::solve(&problem).unwrap();
//! assert!(matches!(report, factory::FactoryReport::Feasible { .. }));
//! ```
//!
//! ## Determinism
//!
//! The same input document always produces a byte-identical output document:
//! collections are traversed in lexicographic identifier order, both oracles
//! are deterministic, and near-zero values are snapped before formatting.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod belts;
pub mod factory;
pub mod graph;
pub mod lp;

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;
