//! Provides the lexing algorithm.
//!
//! The lexer is a state machine. Each [`State`] looks at the remaining input,
//! emits zero or more tokens, and names the state to run next. Lexing stops when
//! a state returns `None`, which happens right after an `Eof` or `Error` token is
//! emitted.

use super::token_types::{Token, TokenKind};

use crate::error::LexError;

/* The Algorithm. */

/// Lexes input, converting a string to a list of tokens.
///
/// Never fails outright: the last token is always either `Eof`, or an `Error`
/// token whose text is the message of a [`LexError`]. Whitespace and comments are
/// kept as tokens, so for a successful lex the token texts concatenate back into
/// the input.
pub fn lex(input: &str) -> Vec<Token> {
    let mut lexer = Lexer { input, start: 0, pos: 0, tokens: vec![] };

    let mut state = Some(State::Start);
    while let Some(current) = state {
        state = current.run(&mut lexer);
    }

    lexer.tokens
}

/// The two flavors of code. Inline code lives between single backticks inside a
/// line of text, fenced code between lines of three backticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Code {
    Inline,
    Fenced,
}

/// The states of the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Beginning of input, decides if there is front matter.
    Start,
    FrontMatter,
    /// Just after the closing fence of the front matter.
    FrontMatterEnd,
    /// Beginning of a line in the body.
    Line,
    Text,
    Header,
    ListItem,
    Link,
    /// Trailing whitespace before a line break. The error is reported if
    /// anything else shows up.
    LineEnd(LexError),
    OpenInlineCode,
    CloseInlineCode,
    OpenCodeFence,
    CloseCodeFence,
    CodeBody(Code),
    Symbol(Code),
    Number(Code),
    Operator(Code),
    Comment(Code),
    String(Code),
}

impl State {
    /// Runs one step of the machine.
    fn run(self, lexer: &mut Lexer<'_>) -> Option<State> {
        match self {
            State::Start => lex_start(lexer),
            State::FrontMatter => lex_front_matter(lexer),
            State::FrontMatterEnd => lex_front_matter_end(lexer),
            State::Line => lex_line(lexer),
            State::Text => lex_text(lexer),
            State::Header => lex_header(lexer),
            State::ListItem => lex_list_item(lexer),
            State::Link => lex_link(lexer),
            State::LineEnd(err) => lex_line_end(lexer, err),
            State::OpenInlineCode => {
                lexer.accept("`");
                lexer.emit(TokenKind::Backtick);
                Some(State::CodeBody(Code::Inline))
            }
            State::CloseInlineCode => {
                lexer.accept("`");
                lexer.emit(TokenKind::Backtick);
                Some(State::Text)
            }
            State::OpenCodeFence => {
                lexer.accept("```");
                lexer.emit(TokenKind::CodeFence);
                Some(State::CodeBody(Code::Fenced))
            }
            State::CloseCodeFence => {
                lexer.accept("```");
                lexer.emit(TokenKind::CodeFence);
                Some(State::LineEnd(LexError::BadCode))
            }
            State::CodeBody(code) => lex_code_body(lexer, code),
            State::Symbol(code) => lex_symbol(lexer, code),
            State::Number(code) => lex_number(lexer, code),
            State::Operator(code) => lex_operator(lexer, code),
            State::Comment(code) => lex_comment(lexer, code),
            State::String(code) => lex_string(lexer, code),
        }
    }
}

/// The state shared by all states of the machine.
///
/// `start..pos` is the text of the token being built. Emitting a token moves
/// `start` up to `pos`.
struct Lexer<'a> {
    input: &'a str,
    start: usize,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consumes `prefix` if the remaining input starts with it.
    fn accept(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consumes characters for as long as they satisfy the predicate. Returns true
    /// if anything was consumed.
    fn accept_while(&mut self, predicate: impl Fn(char) -> bool) -> bool {
        let before = self.pos;
        while matches!(self.peek(), Some(ch) if predicate(ch)) {
            self.next();
        }
        self.pos > before
    }

    fn emit(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, &self.input[self.start..self.pos]));
        self.start = self.pos;
    }

    /// Emits any pending spaces or tabs as a single whitespace token.
    fn skip_spaces(&mut self) {
        if self.accept_while(is_space) {
            self.emit(TokenKind::Whitespace);
        }
    }

    fn eof(&mut self) -> Option<State> {
        self.emit(TokenKind::Eof);
        None
    }

    fn error(&mut self, err: LexError) -> Option<State> {
        tracing::trace!(%err, offset = self.pos, "lexing stopped");
        self.tokens.push(Token::new(TokenKind::Error, err.to_string()));
        None
    }
}

/* Markup States */

fn lex_start(lexer: &mut Lexer<'_>) -> Option<State> {
    if !lexer.accept("```") {
        return Some(State::Line);
    }

    lexer.emit(TokenKind::CodeFence);

    if lexer.accept("\n") {
        lexer.emit(TokenKind::LineBreak);
        Some(State::FrontMatter)
    } else {
        lexer.error(LexError::BadFrontMatterEnd)
    }
}

fn lex_front_matter(lexer: &mut Lexer<'_>) -> Option<State> {
    let Some(ch) = lexer.peek() else {
        return lexer.error(LexError::BadFrontmatter);
    };

    if is_space(ch) {
        lexer.skip_spaces();
    } else if lexer.accept("\n") {
        lexer.emit(TokenKind::LineBreak);
    } else if lexer.accept("```") {
        lexer.emit(TokenKind::CodeFence);
        return Some(State::FrontMatterEnd);
    } else if lexer.rest().starts_with("//") {
        lexer.accept_while(|ch| ch != '\n');
        if lexer.peek().is_none() {
            return lexer.error(LexError::BadFrontmatter);
        }
        lexer.emit(TokenKind::Comment);
    } else if let Some(kind) = front_matter_punctuation(ch) {
        lexer.next();
        lexer.emit(kind);
    } else if is_symbol_start(ch) {
        lexer.accept_while(is_symbol_char);
        let kind = TokenKind::for_front_matter_word(&lexer.input[lexer.start..lexer.pos]);
        lexer.emit(kind);
    } else {
        return lexer.error(LexError::BadFrontmatter);
    }

    Some(State::FrontMatter)
}

fn lex_front_matter_end(lexer: &mut Lexer<'_>) -> Option<State> {
    if lexer.accept("\n") {
        lexer.emit(TokenKind::LineBreak);
        Some(State::Line)
    } else {
        lexer.error(LexError::BadFrontMatterEnd)
    }
}

/// Decides what kind of line comes next by looking at its first characters.
fn lex_line(lexer: &mut Lexer<'_>) -> Option<State> {
    match lexer.peek() {
        None => lexer.eof(),
        Some('\n') => {
            lexer.next();
            lexer.emit(TokenKind::LineBreak);
            Some(State::Line)
        }
        Some('#') => Some(State::Header),
        Some('`') if lexer.rest().starts_with("```") => Some(State::OpenCodeFence),
        Some('-') => Some(State::ListItem),
        Some('[') => Some(State::Link),
        Some(_) => Some(State::Text),
    }
}

fn lex_text(lexer: &mut Lexer<'_>) -> Option<State> {
    if lexer.accept_while(|ch| ch != '`' && ch != '\n') {
        lexer.emit(TokenKind::TextLiteral);
    }

    match lexer.peek() {
        None => lexer.eof(),
        Some('`') => Some(State::OpenInlineCode),
        Some(_) => {
            lexer.accept("\n");
            lexer.emit(TokenKind::LineBreak);
            Some(State::Line)
        }
    }
}

fn lex_header(lexer: &mut Lexer<'_>) -> Option<State> {
    lexer.accept("#");
    lexer.emit(TokenKind::Hash);
    lexer.skip_spaces();

    if !matches!(lexer.peek(), Some(ch) if is_symbol_start(ch)) {
        return lexer.error(LexError::BadHeader);
    }
    lexer.accept_while(is_symbol_char);
    lexer.emit(TokenKind::Symbol);
    lexer.skip_spaces();

    if lexer.accept("\n") {
        lexer.emit(TokenKind::LineBreak);
        Some(State::Line)
    } else {
        lexer.error(LexError::BadHeader)
    }
}

fn lex_list_item(lexer: &mut Lexer<'_>) -> Option<State> {
    lexer.accept("-");
    lexer.emit(TokenKind::Dash);
    lexer.skip_spaces();

    if lexer.peek() == Some('[') {
        Some(State::Link)
    } else {
        lexer.error(LexError::BadLink)
    }
}

fn lex_link(lexer: &mut Lexer<'_>) -> Option<State> {
    if !lexer.accept("[") {
        return lexer.error(LexError::BadLink);
    }
    lexer.emit(TokenKind::LeftBracket);

    if !matches!(lexer.peek(), Some(ch) if is_symbol_start(ch)) {
        return lexer.error(LexError::BadLink);
    }
    lexer.accept_while(is_symbol_char);
    lexer.emit(TokenKind::Symbol);

    if !lexer.accept("]") {
        return lexer.error(LexError::BadLink);
    }
    lexer.emit(TokenKind::RightBracket);

    if !lexer.accept("(") {
        return lexer.error(LexError::BadLink);
    }
    lexer.emit(TokenKind::LeftParen);

    // Raw text up to the first unescaped ')'.
    loop {
        match lexer.peek() {
            None | Some('\n') => return lexer.error(LexError::BadLink),
            Some(')') => break,
            Some('\\') => {
                lexer.next();
                if matches!(lexer.next(), None | Some('\n')) {
                    return lexer.error(LexError::BadLink);
                }
            }
            Some(_) => {
                lexer.next();
            }
        }
    }
    if lexer.pos > lexer.start {
        lexer.emit(TokenKind::LinkText);
    }

    lexer.accept(")");
    lexer.emit(TokenKind::RightParen);

    Some(State::LineEnd(LexError::BadLink))
}

fn lex_line_end(lexer: &mut Lexer<'_>, err: LexError) -> Option<State> {
    lexer.skip_spaces();

    match lexer.peek() {
        None => lexer.eof(),
        Some('\n') => {
            lexer.next();
            lexer.emit(TokenKind::LineBreak);
            Some(State::Line)
        }
        Some(_) => lexer.error(err),
    }
}

/* Code States */

/// Dispatches on the first character of the next code token.
fn lex_code_body(lexer: &mut Lexer<'_>, code: Code) -> Option<State> {
    let Some(ch) = lexer.peek() else {
        return lexer.error(LexError::BadCode);
    };

    match ch {
        '\n' if code == Code::Inline => lexer.error(LexError::BadCode),
        '\n' => {
            lexer.accept_while(|ch| is_space(ch) || ch == '\n');
            lexer.emit(TokenKind::Whitespace);
            Some(State::CodeBody(code))
        }
        ch if is_space(ch) => {
            lexer.skip_spaces();
            Some(State::CodeBody(code))
        }
        '`' => match code {
            Code::Inline => Some(State::CloseInlineCode),
            Code::Fenced if lexer.rest().starts_with("```") => Some(State::CloseCodeFence),
            Code::Fenced => lexer.error(LexError::BadCode),
        },
        '/' if lexer.peek_second() == Some('/') => Some(State::Comment(code)),
        '"' => Some(State::String(code)),
        ch if ch.is_ascii_digit() => Some(State::Number(code)),
        ch if is_symbol_start(ch) => Some(State::Symbol(code)),
        _ => Some(State::Operator(code)),
    }
}

fn lex_symbol(lexer: &mut Lexer<'_>, code: Code) -> Option<State> {
    lexer.accept_while(is_symbol_char);
    let kind = TokenKind::for_code_word(&lexer.input[lexer.start..lexer.pos]);
    lexer.emit(kind);

    Some(State::CodeBody(code))
}

/// Numbers look like `(0|[1-9][0-9]*)(e[+-]?[0-9]+)?`. A leading `-` is always
/// lexed as an operator.
fn lex_number(lexer: &mut Lexer<'_>, code: Code) -> Option<State> {
    if lexer.accept("0") {
        if matches!(lexer.peek(), Some(ch) if ch.is_ascii_digit() || ch == 'e') {
            return lexer.error(LexError::BadNumber);
        }
    } else if !lexer.accept_while(|ch| ch.is_ascii_digit()) {
        return lexer.error(LexError::BadNumber);
    }

    if lexer.accept("e") {
        if !lexer.accept("+") {
            lexer.accept("-");
        }
        if !lexer.accept_while(|ch| ch.is_ascii_digit()) {
            return lexer.error(LexError::BadNumber);
        }
    }

    if matches!(lexer.peek(), Some(ch) if is_symbol_char(ch)) {
        return lexer.error(LexError::BadNumber);
    }

    lexer.emit(TokenKind::Number);
    Some(State::CodeBody(code))
}

fn lex_operator(lexer: &mut Lexer<'_>, code: Code) -> Option<State> {
    for (text, kind) in TokenKind::DOUBLE_OPERATORS {
        if lexer.accept(text) {
            lexer.emit(kind);
            return Some(State::CodeBody(code));
        }
    }

    match lexer.next() {
        Some('&' | '|') => lexer.error(LexError::BadOperator),
        Some(ch) => match TokenKind::single_operator(ch) {
            Some(kind) => {
                lexer.emit(kind);
                Some(State::CodeBody(code))
            }
            None => lexer.error(LexError::BadCode),
        },
        None => lexer.error(LexError::BadCode),
    }
}

/// Line comments. The line break is not part of the comment.
fn lex_comment(lexer: &mut Lexer<'_>, code: Code) -> Option<State> {
    lexer.accept_while(|ch| ch != '\n');

    if lexer.peek().is_none() {
        return lexer.error(LexError::BadCode);
    }

    lexer.emit(TokenKind::Comment);
    Some(State::CodeBody(code))
}

/// Double quoted strings with JSON escapes. The token keeps the quotes and the
/// escapes; they are decoded when the AST is built.
fn lex_string(lexer: &mut Lexer<'_>, code: Code) -> Option<State> {
    lexer.accept("\"");

    loop {
        match lexer.next() {
            None => return lexer.error(LexError::BadString),
            Some('"') => break,
            Some('\\') => match lexer.next() {
                None => return lexer.error(LexError::BadString),
                Some('\\' | '"' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {}
                Some('u') => {
                    for _ in 0..4 {
                        if !matches!(lexer.next(), Some(ch) if ch.is_ascii_hexdigit()) {
                            return lexer.error(LexError::BadEscape);
                        }
                    }
                }
                Some(_) => return lexer.error(LexError::BadEscape),
            },
            // Raw control characters must be escaped. DEL and above are fine.
            Some(ch) if ch < '\u{20}' => return lexer.error(LexError::BadString),
            Some(_) => {}
        }
    }

    lexer.emit(TokenKind::String);
    Some(State::CodeBody(code))
}

/* Helpers that classify certain kinds of characters. */

fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r')
}

/// The only punctuation an extern declaration uses.
fn front_matter_punctuation(ch: char) -> Option<TokenKind> {
    match ch {
        '(' => Some(TokenKind::LeftParen),
        ')' => Some(TokenKind::RightParen),
        ',' => Some(TokenKind::Comma),
        ';' => Some(TokenKind::Semicolon),
        _ => None,
    }
}

fn is_symbol_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// Note: While digits are permitted in symbols, they cannot begin them, because
/// this triggers number lexing instead.
fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
