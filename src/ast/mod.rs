//! Defines the AST, and lowers parse trees into it.

mod ast_types;
mod build_ast;
mod build_block_ast;
mod build_expr_ast;
mod build_statement_ast;


pub use ast_types::*;
pub use build_ast::build_ast;
