//! Property tests for the belts pipeline
//!
//! Every generated network must either produce a flow that passes all
//! invariant checks or a certificate with a positive deficit that replays
//! exactly. The checkers themselves re-run the reduction, so a passing sweep
//! pins down both the solver and the certificate extraction.

use flowforge::belts::{self, BeltsProblem, BeltsReport, Edge, Node, Source};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

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

fn assert_well_formed(problem: &BeltsProblem) -> Result<(), TestCaseError> {
    let report = belts::solve(problem).expect("validated problem solves");
    let violations = belts::check_report(problem, &report).expect("checkable");
    prop_assert!(violations.is_empty(), "{violations:?}");
    if let BeltsReport::Infeasible { deficit, .. } = report {
        prop_assert!(deficit > 0.0);
    }
    Ok(())
}

proptest! {
    #[test]
    fn chain_networks_solve_or_certify(
        supply in 0.0f64..20.0,
        cap_b in prop::option::of(0.0f64..15.0),
        lower in 0.0f64..5.0,
        headroom in 0.0f64..10.0,
        upper2 in 0.0f64..15.0,
    ) {
        let problem = BeltsProblem {
            nodes: vec![node("a", None), node("b", cap_b), node("c", None)],
            edges: vec![
                edge("a", "b", lower, Some(lower + headroom)),
                edge("b", "c", 0.0, Some(upper2)),
            ],
            sources: vec![source("a", supply)],
            sink: "c".to_string(),
        };
        assert_well_formed(&problem)?;
    }

    #[test]
    fn diamond_networks_solve_or_certify(
        supply in 0.0f64..30.0,
        cap_left in 0.0f64..12.0,
        cap_right in 0.0f64..12.0,
        mid_cap in prop::option::of(0.0f64..10.0),
    ) {
        let problem = BeltsProblem {
            nodes: vec![
                node("src", None),
                node("left", mid_cap),
                node("right", None),
                node("dst", None),
            ],
            edges: vec![
                edge("src", "left", 0.0, Some(cap_left)),
                edge("src", "right", 0.0, Some(cap_right)),
                edge("left", "dst", 0.0, None),
                edge("right", "dst", 0.0, None),
            ],
            sources: vec![source("src", supply)],
            sink: "dst".to_string(),
        };
        assert_well_formed(&problem)?;
    }

    #[test]
    fn two_source_networks_solve_or_certify(
        supply_a in 0.0f64..10.0,
        supply_b in 0.0f64..10.0,
        shared_cap in 0.0f64..15.0,
        lower_out in 0.0f64..4.0,
    ) {
        let problem = BeltsProblem {
            nodes: vec![
                node("a", None),
                node("b", None),
                node("mid", Some(shared_cap)),
                node("z", None),
            ],
            edges: vec![
                edge("a", "mid", 0.0, Some(10.0)),
                edge("b", "mid", 0.0, Some(10.0)),
                edge("mid", "z", lower_out, Some(lower_out + 20.0)),
            ],
            sources: vec![source("a", supply_a), source("b", supply_b)],
            sink: "z".to_string(),
        };
        assert_well_formed(&problem)?;
    }
}
