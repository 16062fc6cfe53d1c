//! Handles lexing, converting a script into a stream of tokens.

mod lexer;
mod token_types;


pub use lexer::lex;
pub use token_types::*;
