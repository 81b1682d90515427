//! # Exact grammar compression with collage systems.
//!
//! Compute a minimum-size grammar deriving a given text, in one of three
//! formalisms of increasing expressive power:
//!
//! * **SLP**: straight-line programs (concatenation rules only),
//! * **RLSLP**: SLPs extended with run-length (repetition) rules,
//! * **Collage system**: RLSLPs extended with truncation ("cut") rules that
//!   slice an already-derived string at an offset.
//!
//! The text is turned into a weighted CNF formula whose optimal assignment
//! corresponds to a smallest valid grammar; the assignment is decoded back
//! into a binary derivation tree and re-expanded to verify it reproduces the
//! input exactly.
//!
//! ```rust
//! use colsys::compressor::{Compressor, options::{CompressorOptions, Mode}};
//!
//! let options = CompressorOptions::builder().mode(Mode::Collage).build();
//! let solved = Compressor::new(options).solve(b"abab").unwrap();
//!
//! println!("{} rules", solved.report.rule_count());
//! assert_eq!(solved.grammar.expand().unwrap(), b"abab");
//! ```
//!
//! Main entry points:
//!
//! * [`crate::compressor::Compressor::solve`] -- run the full pipeline
//! * [`crate::grammar::Grammar::expand`] -- recover the text from a grammar
//! * [`crate::grammar::text_format`] -- serialize and parse grammars
//! * [`crate::dot_writer::DotWriter`] -- render a derivation tree to DOT

pub mod candidates;
pub mod compressor;
pub mod dot_writer;
mod error;
pub mod formula;
pub mod grammar;
pub mod literal;
pub mod solver;


pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
