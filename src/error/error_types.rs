//! Defines the types of errors that may occur at any stage during compilation.
//! Also defines simple conversions between strings and errors, and the module errors and the overall [`CompileError`]

use crate::token::Token;

use thiserror::Error;

/* Module Level Errors */

// We do approximately one error type per module. None of them carry source
// positions yet; messages are the only diagnostic we give.

/// A problem found by the lexer. The message of each variant is also the text
/// of the `Error` token that ends a failed token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("bad header: expected '#', a name, and a line break")]
    BadHeader,
    #[error("bad link: expected [name](text) on a single line")]
    BadLink,
    #[error("bad code: unexpected character or unterminated code")]
    BadCode,
    #[error("bad number literal")]
    BadNumber,
    #[error("bad operator: '&' and '|' must be doubled")]
    BadOperator,
    #[error("bad string literal")]
    BadString,
    #[error("bad escape sequence in string literal")]
    BadEscape,
    #[error("bad front matter: only extern declarations and comments are allowed")]
    BadFrontmatter,
    #[error("bad front matter end: a code fence must be followed by a line break")]
    BadFrontMatterEnd,
}

impl LexError {
    const ALL: [LexError; 9] = [
        LexError::BadHeader,
        LexError::BadLink,
        LexError::BadCode,
        LexError::BadNumber,
        LexError::BadOperator,
        LexError::BadString,
        LexError::BadEscape,
        LexError::BadFrontmatter,
        LexError::BadFrontMatterEnd,
    ];

    /// Recovers the error from the text of an `Error` token.
    pub fn from_message(message: &str) -> Option<LexError> {
        LexError::ALL.into_iter().find(|err| err.to_string() == message)
    }
}

/// A problem found while running the grammar over a token stream.
///
/// `BadRuleName`, `LeftRecursion` and `Internal` mean the grammar itself is
/// broken, the rest mean the input does not match it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {}, found {found}", .expected.pretty_string())]
    TokenMismatch { expected: crate::token::TokenKind, found: Token },
    #[error("ran out of input, expected more")]
    UnexpectedEof,
    #[error("no alternative matched {0}")]
    NoMatches(Token),
    #[error("grammar has no rule named \"{0}\"")]
    BadRuleName(String),
    #[error("rule \"{0}\" is left recursive")]
    LeftRecursion(String),
    #[error("internal parser error: {0}")]
    Internal(&'static str),
}

impl ParseError {
    /// True if the error comes from a misconfigured grammar rather than the input.
    pub fn is_grammar_error(&self) -> bool {
        matches!(self, ParseError::BadRuleName(_) | ParseError::LeftRecursion(_) | ParseError::Internal(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ASTError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The type checker classified the script as `Error`.
    #[error("script is not well typed")]
    IllTyped,
    /// A link or goto names a node the script never defines.
    #[error("node \"{0}\" is referenced but never defined")]
    UndefinedNode(String),
}

/* String Conversions. */

impl From<String> for ASTError {
    fn from(value: String) -> Self {
        ASTError(value)
    }
}

impl From<&str> for ASTError {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

/* Project Level Error */

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Error occurred during tokenization: {0}")]
    LexError(#[from] LexError),
    #[error("Error occurred during parsing: {0}")]
    ParseError(#[from] ParseError),
    #[error("Error occurred during ast construction: {0}")]
    ASTError(#[from] ASTError),
    #[error("Error occurred during analysis: {0}")]
    AnalysisError(#[from] AnalysisError),
    /// The options handed to the compiler could not be read.
    #[error("Invalid compile options: {0}")]
    Options(String),
}
