//! Boolean variables of the grammar encoding and their registry.

pub mod literal;
pub mod manager;

pub use literal::{LitKey, VarId};
pub use manager::LiteralManager;
