//! Passes that simplify an AST without changing what it does: constant folding
//! and dead code elimination.
//!
//! Both passes are total over any AST the builder produces, and return a new tree
//! rather than editing their input.

mod fold;
mod prune;

#[cfg(test)]
mod tests;

pub use fold::{fold, fold_expression, fold_statement};
pub use prune::{prune, undefined_nodes};
