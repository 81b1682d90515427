//! The top-level solve pipeline: scan, encode, solve, rebuild, verify.

pub mod options;
pub mod report;

use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::formula::{self, BuiltFormula};
use crate::grammar::{recover, Children, DecodedRefs, Grammar, Node, Tag};
use crate::literal::LitKey;
use crate::solver::{self, Assignment};
use crate::{Error, Result};
use options::CompressorOptions;
use report::SolveReport;

/// The outcome of a solve call: the minimum grammar and its measurements.
#[derive(Debug)]
pub struct Solved {
    pub grammar: Grammar,
    pub report: SolveReport,
}

/// Exact grammar compressor for one fixed option set.
#[derive(Debug, Default)]
pub struct Compressor {
    options: CompressorOptions,
}

impl Compressor {
    #[must_use]
    pub fn new(options: CompressorOptions) -> Self {
        Compressor { options }
    }

    #[must_use]
    pub fn options(&self) -> &CompressorOptions {
        &self.options
    }

    /// Compute a minimum grammar for `text` and verify it derives `text`
    /// back exactly.
    #[tracing::instrument(skip_all, fields(n = text.len(), mode = %self.options.mode))]
    pub fn solve(&self, text: &[u8]) -> Result<Solved> {
        let started = Instant::now();
        let n = text.len();

        if n <= 1 {
            return Ok(self.trivial(text, started));
        }

        let built = formula::build(text, &self.options)?;
        let time_encode = started.elapsed();
        let stats = built.wcnf.stats(built.literals.len());
        tracing::debug!(
            variables = stats.variables,
            hard = stats.hard_clauses,
            soft = stats.soft_clauses,
            "formula built"
        );

        let model = solver::solve_maxsat(&built.wcnf, built.literals.len(), self.options.timeout)?;
        let refs = decode(&built, &model);
        let grammar = recover(text, &refs)?;

        let expanded = grammar.expand()?;
        if expanded != text {
            return Err(Error::ReconstructionIntegrity(
                "expanded grammar does not derive the input text".to_owned(),
            ));
        }

        let report = SolveReport {
            mode: self.options.mode,
            text_len: n,
            phrase_count: refs.pstarts.len().saturating_sub(1),
            distinct_symbols: distinct_symbols(text),
            truncation_count: refs.cuts.len(),
            variables: stats.variables,
            hard_clauses: stats.hard_clauses,
            soft_clauses: stats.soft_clauses,
            clause_lengths: stats.clause_lengths,
            time_encode,
            time_total: started.elapsed(),
        };
        tracing::info!(
            rules = report.rule_count(),
            cuts = report.truncation_count,
            "solved"
        );
        Ok(Solved { grammar, report })
    }

    /// Texts of length zero or one need no formula.
    fn trivial(&self, text: &[u8], started: Instant) -> Solved {
        let grammar = match text.first() {
            Some(&sym) => {
                let root = Node::new(0, 1, Tag::Leaf(sym));
                let mut rules = FxHashMap::default();
                rules.insert(root, Children::None);
                Grammar::new(Some(root), rules)
            }
            None => Grammar::default(),
        };
        let report = SolveReport {
            mode: self.options.mode,
            text_len: text.len(),
            phrase_count: text.len(),
            distinct_symbols: distinct_symbols(text),
            truncation_count: 0,
            variables: 0,
            hard_clauses: 0,
            soft_clauses: 0,
            clause_lengths: Default::default(),
            time_encode: Default::default(),
            time_total: started.elapsed(),
        };
        Solved { grammar, report }
    }
}

/// Read the chosen boundaries and references back out of the model.
fn decode(built: &BuiltFormula, model: &Assignment) -> DecodedRefs {
    let lits = &built.literals;
    let cand = &built.candidates;
    let truthy = |key: LitKey| lits.lookup(&key).is_some_and(|id| model.is_true(id));

    let mut refs = DecodedRefs::default();
    for i in 0..=cand.n {
        if truthy(LitKey::PhraseStart { i }) {
            refs.pstarts.push(i);
        }
    }
    for (&(dst, len), srcs) in &cand.concat_by_dst {
        for &src in srcs {
            if truthy(LitKey::ConcatRef { src, dst, len }) {
                refs.concat.insert((dst, len), src);
            }
        }
    }
    for (&(dst, len), srcs) in &cand.rl_by_dst {
        for &src in srcs {
            if truthy(LitKey::RunLenRef { src, dst, len }) {
                refs.runs.insert((dst, len), src);
            }
        }
    }
    for (&(dst, dst_len), sources) in &cand.trunc_by_dst {
        for s in sources {
            let key = LitKey::TruncRef {
                src: s.src,
                src_len: s.src_len,
                dst,
                dst_len,
            };
            if truthy(key) {
                refs.cuts.insert((dst, dst_len), *s);
            }
        }
    }
    refs
}

fn distinct_symbols(text: &[u8]) -> usize {
    text.iter().collect::<FxHashSet<_>>().len()
}
