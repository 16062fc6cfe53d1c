//! Front end of the compiler for Colloquy, a language for writing branching dialogue.
//!
//! A script is a set of named nodes. Each node holds paragraphs of text, links and
//! option lists that lead to other nodes, and fenced blocks of code. Compiling
//! runs these stages in order, each of which is also usable on its own:
//!
//! 1. [`token::lex`] turns source text into tokens.
//! 2. [`parse::parse`] runs the grammar over the tokens, producing a parse tree.
//! 3. [`ast::build_ast`] reduces the parse tree to an AST.
//! 4. [`optimize::fold`] evaluates constants and simplifies expressions.
//! 5. [`optimize::prune`] drops unreachable code and nodes.
//! 6. [`analysis::type_check`] classifies the result, failing on ill typed code.
//!
//! [`compile`] sequences them, controlled by [`CompileOptions`].

// I use `cargo clippy -- -D clippy::pedantic`
#![allow(
    clippy::missing_errors_doc,  // Docs? Lol.
    clippy::missing_panics_doc,  // Docs? Lmao.
    clippy::must_use_candidate,  // What?
    clippy::module_name_repetitions,  // Maybe a little weird but I'm bad at naming things.
    clippy::if_not_else,  // Actually I like this, its the gaurd pattern
    clippy::match_wildcard_for_single_variants,  // I do this on purpose
)]

pub mod analysis;
pub mod ast;
pub mod error;
pub mod optimize;
pub mod parse;
pub mod token;

use serde::Deserialize;

pub use analysis::Class;
pub use error::{ASTError, AnalysisError, CompileError, LexError, ParseError};

/// Which passes [`compile`] runs after building the AST.
///
/// Can be read from TOML, where missing keys take their default:
///
/// ```toml
/// fold = true
/// prune = true
/// type_check = true
/// deny_undefined_nodes = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Run constant folding.
    pub fold: bool,
    /// Run dead code elimination.
    pub prune: bool,
    /// Run the type checker, failing if the script is ill typed.
    pub type_check: bool,
    /// Fail if a link or goto leads to a node that does not exist. Otherwise such
    /// references are left for the runtime to deal with.
    pub deny_undefined_nodes: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { fold: true, prune: true, type_check: true, deny_undefined_nodes: false }
    }
}

impl CompileOptions {
    pub fn from_toml(input: &str) -> Result<CompileOptions, CompileError> {
        toml::from_str(input).map_err(|err| CompileError::Options(err.message().to_string()))
    }
}

/// Compiles a script's source text down to a checked AST.
///
/// Every stage stops at its first error, so at most one error is reported.
pub fn compile(source: &str, options: &CompileOptions) -> Result<ast::Script, CompileError> {
    let tokens = token::lex(source);
    tracing::debug!(tokens = tokens.len(), "lexed source");

    // The lexer reports a failure as a final error token.
    if let Some(err) = tokens
        .last()
        .filter(|token| token.kind == token::TokenKind::Error)
        .and_then(|token| LexError::from_message(&token.text))
    {
        return Err(err.into());
    }

    let tree = parse::parse(&tokens, &parse::GRAMMAR)?;
    tracing::debug!(nodes = tree.nodes.len(), "parsed script");

    let mut script = ast::build_ast(&tree)?;
    tracing::debug!(functions = script.functions.len(), "built AST");

    if options.fold {
        script = optimize::fold(&script);
        tracing::debug!("folded constants");
    }

    if options.prune {
        let before = script.nodes.len();
        script = optimize::prune(&script);
        tracing::debug!(removed = before - script.nodes.len(), "pruned unreachable nodes");
    }

    let undefined = optimize::undefined_nodes(&script);
    if !undefined.is_empty() {
        tracing::debug!(?undefined, "script references undefined nodes");

        if options.deny_undefined_nodes {
            return Err(AnalysisError::UndefinedNode(undefined[0].clone()).into());
        }
    }

    if options.type_check {
        let class = analysis::type_check(&script, &script.functions);
        tracing::debug!(%class, "type checked script");

        if class == Class::Error {
            return Err(AnalysisError::IllTyped.into());
        }
    }

    Ok(script)
}
