//! A small packrat parsing engine, and the grammar of the language built on it.
//!
//! A grammar is a table of named [`Parselet`]s. Parselets are built out of the
//! combinators in this module ([`term`], [`seq`], [`or`], [`zero_or_more`],
//! [`one_or_more`], [`empty`], and [`nonterm`]). Every rule invocation goes
//! through [`nonterm`], which memoizes results by `(rule name, position)`. That
//! keeps ordered choice from blowing up, and lets us detect left recursion instead
//! of overflowing the stack.
//!
//! Left recursion is only detected, never supported. A rule that reaches itself
//! without consuming input fails with [`ParseError::LeftRecursion`].

mod grammar;
pub mod syntax_tree;

#[cfg(test)]
mod tests;

pub use grammar::{Grammar, GRAMMAR};
pub use syntax_tree::Value;

use crate::error::ParseError;
use crate::token::{Token, TokenKind};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/* Engine Types */

/// The successful outcome of a parselet: how many tokens it ate, and what it
/// built out of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub consumed: usize,
    pub value: Value,
}

pub type ParseResult = Result<Parsed, ParseError>;

/// A composable parsing function.
pub type Parselet = Box<dyn Fn(&Context<'_>) -> ParseResult + Send + Sync>;

/// Turns the values of sub parselets into one value. Returning `None` means the
/// values did not have the expected shape, which is a bug in the grammar.
pub type Action = fn(Vec<Value>) -> Option<Value>;

/// Memo and visited tables for a single parse.
///
/// Both are keyed by rule name *and* position. Never reuse one across different
/// token streams: entries from the old stream would be returned as if they
/// described the new one.
///
/// Tree values share their subtrees, so storing or returning an entry copies
/// only the node on top.
#[derive(Debug, Default)]
pub struct Memo {
    results: HashMap<(&'static str, usize), ParseResult>,
    /// Rules currently being evaluated, used to break cycles.
    visited: HashSet<(&'static str, usize)>,
}

impl Memo {
    pub fn new() -> Memo {
        Memo::default()
    }
}

/// A view of the token stream at some position.
///
/// Moving creates a new view; all views of one parse share the same memo.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    tokens: &'a [Token],
    pos: usize,
    grammar: &'a Grammar,
    memo: &'a RefCell<Memo>,
}

impl<'a> Context<'a> {
    pub fn new(tokens: &'a [Token], grammar: &'a Grammar, memo: &'a RefCell<Memo>) -> Context<'a> {
        Context { tokens, pos: 0, grammar, memo }
    }

    /// Returns a view `n` tokens further along.
    pub fn advance(&self, n: usize) -> Context<'a> {
        Context { pos: self.pos + n, ..*self }
    }

    pub fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn at_end(&self) -> bool {
        self.current().map_or(true, |token| token.kind == TokenKind::Eof)
    }

    /// Evaluates a rule of the grammar at this position, consulting the memo first.
    fn rule(&self, name: &'static str) -> ParseResult {
        let key = (name, self.pos);

        if let Some(result) = self.memo.borrow().results.get(&key) {
            return result.clone();
        }

        if !self.memo.borrow_mut().visited.insert(key) {
            tracing::trace!(rule = name, pos = self.pos, "left recursion detected");
            return Err(ParseError::LeftRecursion(name.to_string()));
        }

        let result = match self.grammar.get(name) {
            // Deeply nested input recurses deeply, so grow the stack as needed.
            Some(rule) => stacker::maybe_grow(32 * 1024, 1024 * 1024, || rule(self)),
            None => Err(ParseError::BadRuleName(name.to_string())),
        };

        let mut memo = self.memo.borrow_mut();
        memo.visited.remove(&key);
        memo.results.insert(key, result.clone());

        result
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("pos", &self.pos).field("current", &self.current()).finish_non_exhaustive()
    }
}

/* Entry Points */

/// Parses a token stream (as produced by [`crate::token::lex`]) into a
/// [`syntax_tree::Script`].
///
/// Whitespace and comment tokens are dropped first. Each call uses a fresh memo.
pub fn parse(tokens: &[Token], grammar: &Grammar) -> Result<syntax_tree::Script, ParseError> {
    let value = parse_rule(tokens, grammar, "script")?;

    syntax_tree::Script::try_from(value).map_err(|_| ParseError::Internal("script rule built something else"))
}

/// Parses a token stream with an arbitrary rule of the grammar, returning the raw
/// value the rule builds.
pub fn parse_rule(tokens: &[Token], grammar: &Grammar, rule: &'static str) -> Result<Value, ParseError> {
    let memo = RefCell::new(Memo::new());

    parse_with_memo(tokens, grammar, rule, &memo)
}

/// Like [`parse_rule`], but with a caller supplied memo.
pub(crate) fn parse_with_memo(
    tokens: &[Token],
    grammar: &Grammar,
    rule: &'static str,
    memo: &RefCell<Memo>,
) -> Result<Value, ParseError> {
    let tokens: Vec<Token> = tokens.iter().filter(|token| !token.is_trivia()).cloned().collect();

    let context = Context::new(&tokens, grammar, memo);
    let parsed = context.rule(rule)?;

    tracing::trace!(rule, consumed = parsed.consumed, memoized = memo.borrow().results.len(), "parse finished");

    Ok(parsed.value)
}

/* Combinators */

/// Matches a single token of the given kind.
pub fn term(kind: TokenKind) -> Parselet {
    Box::new(move |ctx: &Context<'_>| match ctx.current() {
        Some(token) if token.kind == kind => Ok(Parsed { consumed: 1, value: Value::Token(token.clone()) }),
        Some(token) if token.kind != TokenKind::Eof => {
            Err(ParseError::TokenMismatch { expected: kind, found: token.clone() })
        }
        _ => Err(ParseError::UnexpectedEof),
    })
}

/// Runs each parselet in turn, failing as soon as one fails. The values are
/// combined by `action`.
pub fn seq(parts: Vec<Parselet>, action: Action) -> Parselet {
    Box::new(move |ctx: &Context<'_>| {
        let mut ctx = *ctx;
        let mut consumed = 0;
        let mut values = Vec::with_capacity(parts.len());

        for part in &parts {
            let parsed = part(&ctx)?;
            ctx = ctx.advance(parsed.consumed);
            consumed += parsed.consumed;
            values.push(parsed.value);
        }

        let value = action(values).ok_or(ParseError::Internal("sequence action rejected its values"))?;

        Ok(Parsed { consumed, value })
    })
}

/// Ordered choice. The first alternative to succeed wins.
///
/// Errors from a broken grammar are passed up right away instead of trying the
/// next alternative.
pub fn or(choices: Vec<Parselet>) -> Parselet {
    Box::new(move |ctx: &Context<'_>| {
        for choice in &choices {
            match choice(ctx) {
                Ok(parsed) => return Ok(parsed),
                Err(err) if err.is_grammar_error() => return Err(err),
                Err(_) => (),
            }
        }

        match ctx.current() {
            Some(token) if !ctx.at_end() => Err(ParseError::NoMatches(token.clone())),
            _ => Err(ParseError::UnexpectedEof),
        }
    })
}

/// Greedily matches the parselet as many times as possible (possibly zero).
pub fn zero_or_more(parselet: Parselet, action: Action) -> Parselet {
    Box::new(move |ctx: &Context<'_>| repeat(ctx, &parselet, false, action))
}

/// Greedily matches the parselet as many times as possible, at least once.
pub fn one_or_more(parselet: Parselet, action: Action) -> Parselet {
    Box::new(move |ctx: &Context<'_>| repeat(ctx, &parselet, true, action))
}

/// Matches nothing, and always succeeds.
pub fn empty(action: Action) -> Parselet {
    Box::new(move |_: &Context<'_>| {
        let value = action(vec![]).ok_or(ParseError::Internal("empty action rejected its values"))?;

        Ok(Parsed { consumed: 0, value })
    })
}

/// Refers to another rule of the grammar by name. All memoization happens here.
pub fn nonterm(name: &'static str) -> Parselet {
    Box::new(move |ctx: &Context<'_>| ctx.rule(name))
}

fn repeat(ctx: &Context<'_>, parselet: &Parselet, at_least_one: bool, action: Action) -> ParseResult {
    let mut ctx = *ctx;
    let mut consumed = 0;
    let mut values = vec![];

    loop {
        match parselet(&ctx) {
            Ok(parsed) => {
                ctx = ctx.advance(parsed.consumed);
                consumed += parsed.consumed;
                values.push(parsed.value);

                // Repeating something that eats nothing would never stop.
                if parsed.consumed == 0 {
                    break;
                }
            }
            Err(err) if err.is_grammar_error() => return Err(err),
            Err(err) if at_least_one && values.is_empty() => return Err(err),
            Err(_) => break,
        }
    }

    let value = action(values).ok_or(ParseError::Internal("repetition action rejected its values"))?;

    Ok(Parsed { consumed, value })
}
