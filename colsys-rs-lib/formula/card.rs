//! Cardinality constraints over sets of literals.
//!
//! Two encodings cover everything the builder and the MaxSAT loop need:
//! pairwise for at-most-one, and the Sinz sequential counter for a general
//! at-most-k bound over the soft literals.

use super::cnf::Clause;

/// Pairwise at-most-one: one binary clause per pair. Quadratic, but the
/// literal sets here (reference choices per phrase) are small.
#[must_use]
pub fn at_most_one(lits: &[i32]) -> Vec<Clause> {
    let mut clauses = Vec::new();
    for (i, &a) in lits.iter().enumerate() {
        for &b in &lits[i + 1..] {
            clauses.push(vec![-a, -b]);
        }
    }
    clauses
}

/// Sequential-counter at-most-k (Sinz 2005). Register variables are taken
/// from `fresh`, which must return a previously unused positive DIMACS
/// variable on each call.
pub fn at_most_k(lits: &[i32], k: usize, fresh: &mut dyn FnMut() -> i32) -> Vec<Clause> {
    let n = lits.len();
    if k >= n {
        return Vec::new();
    }
    if k == 0 {
        return lits.iter().map(|&l| vec![-l]).collect();
    }

    // regs[i][j]: among lits[0..=i], at least j+1 are true. The last input
    // needs no register row, only the overflow clause.
    let regs: Vec<Vec<i32>> = (0..n - 1)
        .map(|_| (0..k).map(|_| fresh()).collect())
        .collect();

    let mut clauses = Vec::new();
    for i in 0..n - 1 {
        clauses.push(vec![-lits[i], regs[i][0]]);
        if i > 0 {
            clauses.push(vec![-regs[i - 1][0], regs[i][0]]);
        }
        for j in 1..k {
            if i > 0 {
                clauses.push(vec![-lits[i], -regs[i - 1][j - 1], regs[i][j]]);
                clauses.push(vec![-regs[i - 1][j], regs[i][j]]);
            } else {
                clauses.push(vec![-regs[0][j]]);
            }
        }
        // Overflow: lits[i+1] true while the prefix already reached k.
        clauses.push(vec![-lits[i + 1], -regs[i][k - 1]]);
    }
    clauses
}

#[cfg(test)]
mod test {
    use super::{at_most_k, at_most_one};

    /// Evaluate a CNF under an assignment given as the set of true variables.
    fn satisfied(clauses: &[Vec<i32>], true_vars: &[i32]) -> bool {
        clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                let is_true = true_vars.contains(&lit.abs());
                (lit > 0) == is_true
            })
        })
    }

    /// Brute-force check: an assignment extends to the registers iff the
    /// number of true inputs respects the bound.
    fn bound_holds(lits: &[i32], k: usize, true_inputs: &[i32]) -> bool {
        let mut next = 100;
        let clauses = at_most_k(lits, k, &mut || {
            next += 1;
            next
        });
        let reg_vars: Vec<i32> = (101..=next).collect();
        // Enumerate register assignments.
        (0..1u32 << reg_vars.len()).any(|mask| {
            let mut assignment = true_inputs.to_vec();
            for (bit, &v) in reg_vars.iter().enumerate() {
                if mask >> bit & 1 == 1 {
                    assignment.push(v);
                }
            }
            satisfied(&clauses, &assignment)
        })
    }

    #[test]
    fn pairwise_forbids_pairs() {
        let clauses = at_most_one(&[1, 2, 3]);
        assert_eq!(clauses.len(), 3);
        assert!(satisfied(&clauses, &[2]));
        assert!(satisfied(&clauses, &[]));
        assert!(!satisfied(&clauses, &[1, 3]));
    }

    #[test]
    fn sequential_counter_enforces_exact_bound() {
        let lits = [1, 2, 3, 4];
        for k in 1..=3 {
            assert!(bound_holds(&lits, k, &[1]));
            assert!(bound_holds(&lits, k, &lits[..k].to_vec()));
            assert!(!bound_holds(&lits, k, &lits[..k + 1].to_vec()));
        }
        // k >= n and k == 0 degenerate forms.
        assert!(at_most_k(&lits, 4, &mut || unreachable!()).is_empty());
        let zero = at_most_k(&lits, 0, &mut || unreachable!());
        assert_eq!(zero, vec![vec![-1], vec![-2], vec![-3], vec![-4]]);
    }
}
