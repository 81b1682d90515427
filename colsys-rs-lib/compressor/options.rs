use std::time::Duration;

use bon::Builder;
use clap::ValueEnum;

/// Which rule kinds the grammar may use. Each mode strictly extends the
/// previous one, so minimum sizes are monotone: Collage <= Rlslp <= Slp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Concatenation rules only (straight-line program).
    Slp,
    /// Concatenation and run-length rules.
    Rlslp,
    /// Concatenation, run-length and truncation rules (full collage system).
    Collage,
}

impl Mode {
    #[must_use]
    pub fn runs_enabled(self) -> bool {
        !matches!(self, Mode::Slp)
    }

    #[must_use]
    pub fn cuts_enabled(self) -> bool {
        matches!(self, Mode::Collage)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Slp => write!(f, "slp"),
            Mode::Rlslp => write!(f, "rlslp"),
            Mode::Collage => write!(f, "collage"),
        }
    }
}

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Builder)]
pub struct CompressorOptions {
    #[builder(default = Mode::Collage)]
    pub mode: Mode,

    /// Wall-clock budget for the solving stage. Checked between solver
    /// invocations; `None` means unbounded.
    pub timeout: Option<Duration>,

    /// Weight of each soft clause. The objective is uniform, so anything
    /// positive yields the same optimum; exposed for experiment parity.
    #[builder(default = 1)]
    pub soft_weight: u64,
}

impl Default for CompressorOptions {
    fn default() -> Self {
        CompressorOptions::builder().build()
    }
}
