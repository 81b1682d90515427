use std::fmt::Display;

use derive_more::{Add, AddAssign, From};

/// Dense, 1-based solver variable identifier.
///
/// Identifiers are handed out in creation order with no gaps so the formula
/// can be shipped to the solver in DIMACS-style clauses directly.
#[derive(Add, AddAssign, From, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VarId(pub u32);

impl VarId {
    /// The positive DIMACS literal for this variable.
    #[must_use]
    pub fn lit(self) -> i32 {
        self.0 as i32
    }

    /// The negative DIMACS literal for this variable.
    #[must_use]
    pub fn nlit(self) -> i32 {
        -(self.0 as i32)
    }
}

/// Catalog of Boolean propositions used in the encoding. Every variable is
/// identified by its kind together with a structured index tuple; the
/// [`crate::literal::LiteralManager`] validates the tuple on creation.
///
/// Interval indices are text positions with half-open `[i, i+l)` semantics.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LitKey {
    /// `[i, i+l)` is a maximal factor (phrase) of the chosen parse.
    Phrase { i: usize, l: usize },
    /// Position `i` begins a phrase. `PhraseStart(0)` and `PhraseStart(n)`
    /// are forced true.
    PhraseStart { i: usize },
    /// Phrase `[dst, dst+len)` copies the earlier occurrence `[src, src+len)`.
    ConcatRef { src: usize, dst: usize, len: usize },
    /// Phrase `[dst, dst+len)` extends the overlapping run whose unit is
    /// `[src, dst)`; the whole rule spans `[src, dst+len)`.
    RunLenRef { src: usize, dst: usize, len: usize },
    /// Phrase `[dst, dst+dst_len)` is a slice of the longer, disjoint
    /// interval `[src, src+src_len)` (the cut rule).
    TruncRef {
        src: usize,
        src_len: usize,
        dst: usize,
        dst_len: usize,
    },
    /// `[i, i+l)` is referenced by some rule, in any of the four ways an
    /// interval can be used (concat target, truncation source, run-length
    /// whole, run-length unit). Drives the non-crossing constraint.
    Referenced { i: usize, l: usize },
    /// The derivation depth of `[i, i+l)` is at least `d`. Only created for
    /// truncation sources/referrers and the symbol positions they cover.
    Depth { i: usize, l: usize, d: usize },
    /// Tseitin definition variable.
    Aux { id: usize },
}

impl Display for LitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LitKey::Phrase { i, l } => write!(f, "phrase({i},{l})"),
            LitKey::PhraseStart { i } => write!(f, "pstart({i})"),
            LitKey::ConcatRef { src, dst, len } => write!(f, "ref({src}<-{dst},{len})"),
            LitKey::RunLenRef { src, dst, len } => write!(f, "rlref({src}<-{dst},{len})"),
            LitKey::TruncRef {
                src,
                src_len,
                dst,
                dst_len,
            } => write!(f, "csref({src},{src_len}<-{dst},{dst_len})"),
            LitKey::Referenced { i, l } => write!(f, "referenced({i},{l})"),
            LitKey::Depth { i, l, d } => write!(f, "depth({i},{l},{d})"),
            LitKey::Aux { id } => write!(f, "aux({id})"),
        }
    }
}
