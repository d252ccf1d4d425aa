//! Graph algorithms
//!
//! - [`flow`] - Max flow over real-valued capacities, with min-cut extraction
//!
//! ## Graph Representation
//!
//! The flow solver uses its own adjacency-list residual network rather than
//! a general-purpose graph type: paired forward/reverse edges indexed
//! together keep augmentation and cut extraction allocation-free. The
//! original problem topology (before reduction) is validated with
//! [`petgraph`] in the belts pipeline.
//!
//! ## Example: Max Flow
//!
//! ```rust
//! use flowforge::graph::flow::{FlowNetwork, max_flow};
//!
//! let mut net = FlowNetwork::new(4);
//! net.add_edge(0, 1, 10.0);
//! net.add_edge(0, 2, 10.0);
//! net.add_edge(1, 3, 10.0);
//! net.add_edge(2, 3, 10.0);
//!
//! let result = max_flow(&net, 0, 3).unwrap();
//! assert!((result.value - 20.0).abs() < 1e-9);
//! ```

pub mod flow;

pub use flow::{max_flow, FlowNetwork, MaxFlowResult};
