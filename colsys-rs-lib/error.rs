use crate::literal::LitKey;

/// Failures surfaced by the compression pipeline. None of these are
/// recovered internally: a wrong grammar downstream is worse than an abort.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A literal was requested with indices violating its kind's invariant.
    /// Always a builder bug, never a property of the input text.
    #[error("invalid literal {key:?}: {reason}")]
    InvalidLiteral { key: LitKey, reason: String },

    /// The solver reported UNSAT for a formula that is satisfiable by
    /// construction (the trivial letter-grammar always exists).
    #[error("solver found no assignment for a satisfiable formula")]
    NoSolution,

    /// The solver budget expired before any model was found.
    #[error("solver exceeded its time budget")]
    SolverTimeout,

    /// The SAT backend failed internally before any model was found.
    #[error("solver failure: {0}")]
    Solver(String),

    /// The decoded grammar failed the expand-equals-text self check, or the
    /// derivation tree has a child/tag combination that cannot occur in a
    /// well-formed solution.
    #[error("reconstructed grammar is inconsistent: {0}")]
    ReconstructionIntegrity(String),

    /// Input rejected before formula construction.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A serialized grammar could not be parsed.
    #[error("could not parse grammar: {0}")]
    Serialization(String),
}
