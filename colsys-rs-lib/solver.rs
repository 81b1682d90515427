//! MaxSAT solving by iterated SAT calls.
//!
//! The hard clauses are solved first; any model gives an upper bound on the
//! number of true penalty literals. A sequential-counter cardinality bound
//! then tightens that count one step at a time until the formula becomes
//! unsatisfiable, at which point the incumbent model is optimal. With a
//! uniform objective this linear descent reaches the optimum in at most
//! `cost` solver calls.

use std::time::{Duration, Instant};

use bitvec::bitvec;
use bitvec::vec::BitVec;
use splr::Certificate;

use crate::formula::{card, Clause, Wcnf};
use crate::literal::VarId;
use crate::{Error, Result};

/// A total assignment over the formula's variables, indexed by [`VarId`].
#[derive(Debug, Clone)]
pub struct Assignment {
    truth: BitVec,
    cost: usize,
}

impl Assignment {
    fn from_model(model: &[i32], var_count: usize, penalties: &[i32]) -> Self {
        let mut truth = bitvec![0; var_count + 1];
        for &lit in model {
            if lit > 0 && (lit as usize) <= var_count {
                truth.set(lit as usize, true);
            }
        }
        let cost = penalties
            .iter()
            .filter(|&&lit| lit > 0 && truth[lit as usize])
            .count();
        Assignment { truth, cost }
    }

    #[must_use]
    pub fn is_true(&self, id: VarId) -> bool {
        self.truth
            .get(id.0 as usize)
            .map(|b| *b)
            .unwrap_or(false)
    }

    /// Number of penalty literals satisfied by this model.
    #[must_use]
    pub fn cost(&self) -> usize {
        self.cost
    }
}

/// Minimize the number of true penalty literals subject to the hard clauses.
///
/// Returns [`Error::NoSolution`] when the hard clauses alone are
/// unsatisfiable. On deadline expiry the best model found so far is
/// returned; [`Error::SolverTimeout`] is raised only when the deadline
/// passes before any model exists. A backend failure is propagated as
/// [`Error::Solver`] before the first model and absorbed afterwards.
#[tracing::instrument(skip_all, fields(vars = var_count, hard = wcnf.hard().len(), soft = wcnf.soft().len()))]
pub fn solve_maxsat(wcnf: &Wcnf, var_count: usize, timeout: Option<Duration>) -> Result<Assignment> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let penalties = wcnf.penalty_lits();

    if expired(deadline) {
        return Err(Error::SolverTimeout);
    }

    let Some(model) = run_sat(wcnf.hard().to_vec())? else {
        return Err(Error::NoSolution);
    };
    let mut incumbent = Assignment::from_model(&model, var_count, &penalties);
    tracing::debug!(cost = incumbent.cost, "initial model");

    while incumbent.cost > 0 {
        if expired(deadline) {
            tracing::warn!(cost = incumbent.cost, "deadline reached, keeping incumbent");
            break;
        }
        let mut clauses = wcnf.hard().to_vec();
        let mut next_var = var_count as i32;
        let mut fresh = || {
            next_var += 1;
            next_var
        };
        clauses.extend(card::at_most_k(&penalties, incumbent.cost - 1, &mut fresh));
        match run_sat(clauses) {
            Ok(Some(model)) => {
                let better = Assignment::from_model(&model, var_count, &penalties);
                tracing::debug!(cost = better.cost, "improved model");
                incumbent = better;
            }
            Ok(None) => break,
            // Once an incumbent exists it is kept over a failing descent step.
            Err(err) => {
                tracing::warn!(error = %err, "solver failure, keeping incumbent");
                break;
            }
        }
    }
    Ok(incumbent)
}

/// One-shot SAT call. Internal backend failures are distinct from UNSAT;
/// the caller decides whether an incumbent can absorb them.
fn run_sat(clauses: Vec<Clause>) -> Result<Option<Vec<i32>>> {
    match Certificate::try_from(clauses) {
        Ok(Certificate::SAT(model)) => Ok(Some(model)),
        Ok(Certificate::UNSAT) => Ok(None),
        Err(err) => Err(Error::Solver(err.to_string())),
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::solve_maxsat;
    use crate::formula::Wcnf;
    use crate::literal::VarId;
    use crate::Error;

    #[test]
    fn minimizes_true_penalties() {
        // x1 v x2, x2 v x3; penalize all three. Optimum sets only x2.
        let mut wcnf = Wcnf::new();
        wcnf.add_hard(vec![1, 2]);
        wcnf.add_hard(vec![2, 3]);
        for v in 1..=3 {
            wcnf.add_soft(v, 1);
        }
        let model = solve_maxsat(&wcnf, 3, None).unwrap();
        assert_eq!(model.cost(), 1);
        assert!(model.is_true(VarId(2)));
    }

    #[test]
    fn unsatisfiable_hard_clauses_reject() {
        let mut wcnf = Wcnf::new();
        wcnf.add_hard(vec![1]);
        wcnf.add_hard(vec![-1]);
        assert!(matches!(solve_maxsat(&wcnf, 1, None), Err(Error::NoSolution)));
    }

    #[test]
    fn zero_budget_times_out() {
        let mut wcnf = Wcnf::new();
        wcnf.add_hard(vec![1]);
        let out = solve_maxsat(&wcnf, 1, Some(Duration::ZERO));
        assert!(matches!(out, Err(Error::SolverTimeout)));
    }
}
