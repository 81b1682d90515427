use std::collections::BTreeMap;

use crate::literal::LiteralManager;

/// A disjunction of DIMACS-style literals.
pub type Clause = Vec<i32>;

/// Weighted partial CNF: hard clauses plus unit soft clauses.
///
/// A soft clause is stored as its *penalty literal*: the literal whose truth
/// violates the clause. Minimizing the weighted count of true penalty
/// literals is the MaxSAT objective.
#[derive(Debug, Default)]
pub struct Wcnf {
    hard: Vec<Clause>,
    soft: Vec<(i32, u64)>,
}

impl Wcnf {
    #[must_use]
    pub fn new() -> Self {
        Wcnf::default()
    }

    pub fn add_hard(&mut self, clause: Clause) {
        debug_assert!(!clause.is_empty(), "empty clause makes the formula trivially unsat");
        self.hard.push(clause);
    }

    pub fn add_hard_unit(&mut self, lit: i32) {
        self.hard.push(vec![lit]);
    }

    pub fn extend_hard<I: IntoIterator<Item = Clause>>(&mut self, clauses: I) {
        for clause in clauses {
            self.add_hard(clause);
        }
    }

    /// Add a soft clause `[-penalty_lit]` with the given weight.
    pub fn add_soft(&mut self, penalty_lit: i32, weight: u64) {
        self.soft.push((penalty_lit, weight));
    }

    #[must_use]
    pub fn hard(&self) -> &[Clause] {
        &self.hard
    }

    #[must_use]
    pub fn soft(&self) -> &[(i32, u64)] {
        &self.soft
    }

    /// The literals whose truth incurs cost, in insertion order.
    #[must_use]
    pub fn penalty_lits(&self) -> Vec<i32> {
        self.soft.iter().map(|&(lit, _)| lit).collect()
    }

    #[must_use]
    pub fn stats(&self, var_count: usize) -> FormulaStats {
        let mut histogram = BTreeMap::new();
        for clause in &self.hard {
            *histogram.entry(clause.len()).or_insert(0) += 1;
        }
        FormulaStats {
            variables: var_count,
            hard_clauses: self.hard.len(),
            soft_clauses: self.soft.len(),
            clause_lengths: histogram,
        }
    }
}

/// Shape of a built formula, reported alongside the solve result.
#[derive(Clone, Debug, Default)]
pub struct FormulaStats {
    pub variables: usize,
    pub hard_clauses: usize,
    pub soft_clauses: usize,
    /// Hard clause length -> number of clauses of that length.
    pub clause_lengths: BTreeMap<usize, usize>,
}

/// `[-a, b]`: `a` implies `b`.
#[must_use]
pub fn implies(a: i32, b: i32) -> Clause {
    vec![-a, b]
}

/// Two clauses making `a` and `b` equivalent.
#[must_use]
pub fn iff(a: i32, b: i32) -> [Clause; 2] {
    [vec![-a, b], vec![a, -b]]
}

/// Tseitin definition `aux <-> AND(lits)`. An empty conjunction defines true.
pub fn and_defined(lits: &[i32], manager: &mut LiteralManager) -> (i32, Vec<Clause>) {
    let aux = manager.fresh_aux().lit();
    let mut clauses = Vec::with_capacity(lits.len() + 1);
    // aux <- AND(lits)
    let mut back: Clause = Vec::with_capacity(lits.len() + 1);
    back.push(aux);
    back.extend(lits.iter().map(|&l| -l));
    clauses.push(back);
    // aux -> each lit
    for &lit in lits {
        clauses.push(vec![-aux, lit]);
    }
    (aux, clauses)
}

/// Tseitin definition `aux <-> OR(lits)`. An empty disjunction defines false.
pub fn or_defined(lits: &[i32], manager: &mut LiteralManager) -> (i32, Vec<Clause>) {
    let aux = manager.fresh_aux().lit();
    let mut clauses = Vec::with_capacity(lits.len() + 1);
    // aux -> OR(lits)
    let mut fwd: Clause = Vec::with_capacity(lits.len() + 1);
    fwd.push(-aux);
    fwd.extend_from_slice(lits);
    clauses.push(fwd);
    // each lit -> aux
    for &lit in lits {
        clauses.push(vec![-lit, aux]);
    }
    (aux, clauses)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{and_defined, iff, or_defined, Wcnf};
    use crate::literal::LiteralManager;

    #[test]
    fn stats_histogram_counts_lengths() {
        let mut wcnf = Wcnf::new();
        wcnf.add_hard_unit(1);
        wcnf.add_hard(vec![1, -2]);
        wcnf.add_hard(vec![2, 3]);
        wcnf.add_soft(2, 1);

        let stats = wcnf.stats(3);
        assert_eq!(stats.hard_clauses, 3);
        assert_eq!(stats.soft_clauses, 1);
        assert_eq!(stats.clause_lengths.get(&1), Some(&1));
        assert_eq!(stats.clause_lengths.get(&2), Some(&2));
        assert_eq!(wcnf.penalty_lits(), vec![2]);
    }

    #[test]
    fn tseitin_definitions_have_expected_shape() {
        let mut lm = LiteralManager::new(0);
        let (a, and_clauses) = and_defined(&[1, -2], &mut lm);
        assert_eq!(and_clauses, vec![vec![a, -1, 2], vec![-a, 1], vec![-a, -2]]);

        let (o, or_clauses) = or_defined(&[1, -2], &mut lm);
        assert_eq!(or_clauses, vec![vec![-o, 1, -2], vec![-1, o], vec![2, o]]);

        // Degenerate cases: empty AND is true, empty OR is false.
        let (t, tc) = and_defined(&[], &mut lm);
        assert_eq!(tc, vec![vec![t]]);
        let (f, fc) = or_defined(&[], &mut lm);
        assert_eq!(fc, vec![vec![-f]]);

        assert_eq!(iff(1, 2), [vec![-1, 2], vec![1, -2]]);
    }
}
