//! Semantic checks over the AST.
//!
//! The type checker walks a script without changing it and classifies each
//! construct into a small lattice of value classes (see [`Class`]). Variables have
//! no static type, so they only cause an error through the values they are
//! combined with, never on their own.

mod type_check;
mod types;


pub use type_check::{type_check, type_of_expression, type_of_statement};
pub use types::Class;
