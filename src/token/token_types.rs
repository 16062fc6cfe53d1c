//! Defines data structures related to [`Tokens`](Token)

use std::fmt::Display;

/// Represents a single token of a script.
///
/// The text is exactly the slice of the input the token was lexed from, except
/// for `Error` tokens, which carry a diagnostic message instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The category of the token.
    pub kind: TokenKind,
    /// The source text of the token.
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Token {
        Token { kind, text: text.into() }
    }

    /// Whitespace and comments are kept by the lexer but ignored by the grammar.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// The category of a [`Token`].
///
/// Markup kinds come from the narrative part of a script, the rest mostly from
/// code (inline spans, fenced blocks, and the front matter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    /* Markup */
    LineBreak,
    Hash,
    Dash,
    Backtick,
    CodeFence,
    LeftBracket,
    RightBracket,
    TextLiteral,
    LinkText,

    /* Trivia */
    Whitespace,
    Comment,

    /* Literals and names */
    Symbol,
    Number,
    String,
    Boolean,
    Null,
    /// A parameter type in an extern declaration: bool, number, string or null.
    Type,

    /* Keywords */
    If,
    Else,
    While,
    Goto,
    Extern,

    /* Punctuation */
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,

    /* Operators */
    Increment,
    Decrement,
    And,
    Or,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Greater,
    Less,
    Assign,
    Dot,
    Not,

    /* Terminators */
    Eof,
    Error,
}

impl TokenKind {
    /// Displays the kind in a user friendly way. If it represents a single token, then provides that token in single
    /// quotes e.g. "'=='". If it represents a category, then an unquoted description, e.g. "a symbol".
    pub fn pretty_string(self) -> &'static str {
        #[allow(clippy::enum_glob_use)]
        use TokenKind::*;

        match self {
            LineBreak => "a line break",
            Hash => "'#'",
            Dash => "'-'",
            Backtick => "'`'",
            CodeFence => "'```'",
            LeftBracket => "'['",
            RightBracket => "']'",
            TextLiteral => "text",
            LinkText => "link text",
            Whitespace => "whitespace",
            Comment => "a comment",
            Symbol => "a symbol",
            Number => "a number",
            String => "a string",
            Boolean => "a boolean",
            Null => "'null'",
            Type => "a type",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            Goto => "'goto'",
            Extern => "'extern'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Comma => "','",
            Semicolon => "';'",
            Increment => "'++'",
            Decrement => "'--'",
            And => "'&&'",
            Or => "'||'",
            GreaterEqual => "'>='",
            LessEqual => "'<='",
            Equal => "'=='",
            NotEqual => "'!='",
            Plus => "'+'",
            Minus => "'-'",
            Times => "'*'",
            Divide => "'/'",
            Modulo => "'%'",
            Greater => "'>'",
            Less => "'<'",
            Assign => "'='",
            Dot => "'.'",
            Not => "'!'",
            Eof => "the end of input",
            Error => "an error",
        }
    }

    /// Classifies a word found in code.
    pub fn for_code_word(word: &str) -> TokenKind {
        match word {
            "true" | "false" => TokenKind::Boolean,
            "null" => TokenKind::Null,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "goto" => TokenKind::Goto,
            _ => TokenKind::Symbol,
        }
    }

    /// Classifies a word found in the front matter.
    pub fn for_front_matter_word(word: &str) -> TokenKind {
        match word {
            "bool" | "number" | "string" | "null" => TokenKind::Type,
            "extern" => TokenKind::Extern,
            _ => TokenKind::Symbol,
        }
    }

    /// Operators that are two characters long. These are tried before the single
    /// character ones, so `>=` is never split into `>` and `=`.
    pub(super) const DOUBLE_OPERATORS: [(&'static str, TokenKind); 8] = [
        ("++", TokenKind::Increment),
        ("--", TokenKind::Decrement),
        ("&&", TokenKind::And),
        ("||", TokenKind::Or),
        (">=", TokenKind::GreaterEqual),
        ("<=", TokenKind::LessEqual),
        ("==", TokenKind::Equal),
        ("!=", TokenKind::NotEqual),
    ];

    /// Single character operators and punctuation.
    pub(super) fn single_operator(ch: char) -> Option<TokenKind> {
        Some(match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Times,
            '/' => TokenKind::Divide,
            '%' => TokenKind::Modulo,
            '>' => TokenKind::Greater,
            '<' => TokenKind::Less,
            '=' => TokenKind::Assign,
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '!' => TokenKind::Not,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            _ => return None,
        })
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pretty_string())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("the end of input"),
            TokenKind::LineBreak => f.write_str("a line break"),
            TokenKind::Error => write!(f, "error token ({})", self.text),
            _ => write!(f, "{:?} token \"{}\"", self.kind, self.text),
        }
    }
}
