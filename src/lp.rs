//! Linear-programming oracle seam
//!
//! The factory pipeline describes its problem as a sparse list of rows over
//! non-negative variables; this module is the single place that knows how to
//! hand that description to an actual LP solver. The backend is
//! [`good_lp`] with the pure-Rust `microlp` solver, which is deterministic:
//! identical row/column order yields identical solutions.
//!
//! Variables are implicitly bounded below by zero, matching the crafts/min
//! and rate variables of the caller. Rows are either equalities or
//! less-than-or-equal inequalities.

use crate::{Error, Result, EPS};
use good_lp::{constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable};
use tracing::debug;

/// Row relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Left-hand side must equal the right-hand side
    Eq,
    /// Left-hand side must not exceed the right-hand side
    Le,
}

/// One sparse constraint row: `sum(coeff * x[var]) <relation> rhs`
#[derive(Debug, Clone)]
pub struct LpRow {
    /// `(variable index, coefficient)` pairs; callers keep these in
    /// deterministic order
    pub terms: Vec<(usize, f64)>,
    /// Row relation
    pub relation: Relation,
    /// Right-hand side
    pub rhs: f64,
}

/// A linear program over non-negative variables
#[derive(Debug, Clone)]
pub struct LpProblem {
    num_vars: usize,
    maximize: bool,
    objective: Vec<f64>,
    rows: Vec<LpRow>,
}

/// Outcome of an LP solve
#[derive(Debug, Clone)]
pub enum LpOutcome {
    /// An optimal solution was found
    Optimal {
        /// Variable values, indexed as the caller declared them
        x: Vec<f64>,
        /// Objective value at `x`
        objective: f64,
    },
    /// No assignment satisfies every row
    Infeasible,
    /// The objective can be improved without limit
    Unbounded,
}

impl LpProblem {
    /// Create a minimization problem with `num_vars` variables, all `>= 0`
    #[must_use]
    pub fn minimize(num_vars: usize) -> Self {
        Self {
            num_vars,
            maximize: false,
            objective: vec![0.0; num_vars],
            rows: Vec::new(),
        }
    }

    /// Create a maximization problem with `num_vars` variables, all `>= 0`
    #[must_use]
    pub fn maximize(num_vars: usize) -> Self {
        Self {
            num_vars,
            maximize: true,
            objective: vec![0.0; num_vars],
            rows: Vec::new(),
        }
    }

    /// Number of variables
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Set the objective coefficient of one variable
    pub fn set_objective(&mut self, var: usize, coeff: f64) {
        self.objective[var] = coeff;
    }

    /// Add an equality row.
    ///
    /// A row with no terms is a constant row: it never reaches the backend,
    /// but `solve` still judges it (`0 = rhs`), so a target item no recipe
    /// produces correctly renders the problem infeasible.
    pub fn add_eq(&mut self, terms: Vec<(usize, f64)>, rhs: f64) {
        self.rows.push(LpRow {
            terms,
            relation: Relation::Eq,
            rhs,
        });
    }

    /// Add a `<=` row. Constant rows are judged as in [`Self::add_eq`].
    pub fn add_le(&mut self, terms: Vec<(usize, f64)>, rhs: f64) {
        self.rows.push(LpRow {
            terms,
            relation: Relation::Le,
            rhs,
        });
    }

    /// Constraint rows added so far
    #[must_use]
    pub fn rows(&self) -> &[LpRow] {
        &self.rows
    }

    /// Hand the problem to the backend solver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the backend rejects the model for a
    /// reason other than infeasibility or unboundedness.
    pub fn solve(&self) -> Result<LpOutcome> {
        // Constant rows decide feasibility on their own
        for row in &self.rows {
            if row.terms.is_empty() {
                let holds = match row.relation {
                    Relation::Eq => row.rhs.abs() <= EPS,
                    Relation::Le => row.rhs >= -EPS,
                };
                if !holds {
                    debug!(rhs = row.rhs, "constant row violated");
                    return Ok(LpOutcome::Infeasible);
                }
            }
        }

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = (0..self.num_vars)
            .map(|_| vars.add(variable().min(0.0)))
            .collect();

        let mut objective = Expression::from(0.0);
        for (i, &c) in self.objective.iter().enumerate() {
            if c != 0.0 {
                objective += handles[i] * c;
            }
        }

        let unsolved = if self.maximize {
            vars.maximise(objective)
        } else {
            vars.minimise(objective)
        };
        let mut model = unsolved.using(default_solver);

        for row in &self.rows {
            if row.terms.is_empty() {
                continue;
            }
            let mut lhs = Expression::from(0.0);
            for &(var, coeff) in &row.terms {
                lhs += handles[var] * coeff;
            }
            let c = match row.relation {
                Relation::Eq => constraint::eq(lhs, row.rhs),
                Relation::Le => constraint::leq(lhs, row.rhs),
            };
            model = model.with(c);
        }

        debug!(
            vars = self.num_vars,
            rows = self.rows.len(),
            maximize = self.maximize,
            "solving lp"
        );

        match model.solve() {
            Ok(solution) => {
                let x: Vec<f64> = handles.iter().map(|&v| solution.value(v)).collect();
                let objective = self
                    .objective
                    .iter()
                    .zip(&x)
                    .map(|(c, v)| c * v)
                    .sum::<f64>();
                debug!(objective, "lp optimal");
                Ok(LpOutcome::Optimal { x, objective })
            }
            Err(ResolutionError::Infeasible) => {
                debug!("lp infeasible");
                Ok(LpOutcome::Infeasible)
            }
            Err(ResolutionError::Unbounded) => {
                debug!("lp unbounded");
                Ok(LpOutcome::Unbounded)
            }
            Err(other) => Err(Error::internal(format!("lp solver failure: {other}"))),
        }
    }
}
