//! Weighted CNF construction for the grammar encoding.

pub mod builder;
pub mod card;
pub mod cnf;

pub use builder::{build, BuiltFormula};
pub use cnf::{Clause, FormulaStats, Wcnf};
