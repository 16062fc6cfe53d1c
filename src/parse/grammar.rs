//! The grammar of the language, as a table of parselets.
//!
//! Rules are named in camelCase. Each binary precedence level has the form
//! `level = lower op level | lower`, so chains of operators at one level nest to
//! the right: `a - b - c` parses as `a - (b - c)`.

use super::syntax_tree::{
    Block, Expression, FrontMatter, FrontMatterItem, FuncDecl, Header, Inline, Line, Link, ListItem, Node, Script,
    Statement, Value,
};
use super::{empty, nonterm, one_or_more, or, seq, term, zero_or_more, Parselet};

use crate::token::{Token, TokenKind as TK};

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

/// The grammar of the language, built on first use.
pub static GRAMMAR: LazyLock<Grammar> = LazyLock::new(Grammar::new);

/// A mapping from rule names to parselets. Immutable once built.
pub struct Grammar {
    rules: HashMap<&'static str, Parselet>,
}

impl Grammar {
    /// Builds the grammar of the language. Parsing starts at `script`.
    pub fn new() -> Grammar {
        let rules: Vec<(&'static str, Parselet)> = vec![
            /* Document Structure */
            ("script", seq(vec![nonterm("frontMatter"), nonterm("nodes"), term(TK::Eof)], script)),
            (
                "frontMatter",
                or(vec![
                    seq(
                        vec![
                            term(TK::CodeFence),
                            term(TK::LineBreak),
                            zero_or_more(nonterm("frontMatterItem"), list),
                            term(TK::CodeFence),
                            term(TK::LineBreak),
                        ],
                        front_matter,
                    ),
                    empty(nothing),
                ]),
            ),
            (
                "frontMatterItem",
                or(vec![seq(vec![nonterm("funcDecl")], func_decl_item), seq(vec![term(TK::LineBreak)], blank_line)]),
            ),
            (
                "funcDecl",
                seq(
                    vec![
                        term(TK::Extern),
                        term(TK::Symbol),
                        term(TK::LeftParen),
                        nonterm("params"),
                        term(TK::RightParen),
                        term(TK::Semicolon),
                        term(TK::LineBreak),
                    ],
                    func_decl,
                ),
            ),
            ("params", separated_by(term(TK::Type), || term(TK::Type))),
            ("nodes", one_or_more(nonterm("node"), list)),
            (
                "node",
                seq(vec![nonterm("header"), one_or_more(term(TK::LineBreak), list), nonterm("blocks")], node),
            ),
            ("header", seq(vec![term(TK::Hash), term(TK::Symbol)], header)),
            (
                "blocks",
                one_or_more(seq(vec![nonterm("block"), zero_or_more(term(TK::LineBreak), list)], list), list),
            ),
            /* Blocks */
            (
                "block",
                or(vec![nonterm("paragraph"), nonterm("codeBlock"), nonterm("linkBlock"), nonterm("list")]),
            ),
            ("paragraph", one_or_more(nonterm("line"), paragraph)),
            ("line", seq(vec![one_or_more(nonterm("inline"), list), nonterm("lineEnd")], line)),
            ("lineEnd", or(vec![term(TK::LineBreak), empty(nothing)])),
            ("inline", or(vec![seq(vec![term(TK::TextLiteral)], text), nonterm("inlineCode")])),
            (
                "inlineCode",
                seq(vec![term(TK::Backtick), nonterm("expression"), term(TK::Backtick)], inline_code),
            ),
            ("linkBlock", seq(vec![nonterm("link"), nonterm("lineEnd")], link_block)),
            (
                "link",
                seq(
                    vec![
                        term(TK::LeftBracket),
                        term(TK::Symbol),
                        term(TK::RightBracket),
                        term(TK::LeftParen),
                        or(vec![term(TK::LinkText), empty(nothing)]),
                        term(TK::RightParen),
                    ],
                    link,
                ),
            ),
            ("list", one_or_more(nonterm("listItem"), list_block)),
            ("listItem", seq(vec![term(TK::Dash), nonterm("link"), nonterm("lineEnd")], list_item)),
            (
                "codeBlock",
                seq(
                    vec![term(TK::CodeFence), zero_or_more(nonterm("statement"), list), term(TK::CodeFence)],
                    code_block,
                ),
            ),
            /* Statements */
            (
                "statement",
                or(vec![
                    nonterm("statementBlock"),
                    nonterm("functionCall"),
                    nonterm("goto"),
                    nonterm("conditionalWithElse"),
                    nonterm("conditional"),
                    nonterm("assignment"),
                    nonterm("loop"),
                ]),
            ),
            (
                "statementBlock",
                seq(
                    vec![term(TK::LeftBrace), zero_or_more(nonterm("statement"), list), term(TK::RightBrace)],
                    statement_block,
                ),
            ),
            (
                "functionCall",
                seq(
                    vec![
                        term(TK::Symbol),
                        term(TK::LeftParen),
                        nonterm("arguments"),
                        term(TK::RightParen),
                        term(TK::Semicolon),
                    ],
                    function_call,
                ),
            ),
            ("arguments", separated_by(nonterm("expression"), || nonterm("expression"))),
            ("goto", seq(vec![term(TK::Goto), term(TK::Symbol), term(TK::Semicolon)], goto)),
            (
                "conditionalWithElse",
                seq(
                    vec![
                        term(TK::If),
                        term(TK::LeftParen),
                        nonterm("expression"),
                        term(TK::RightParen),
                        nonterm("statement"),
                        term(TK::Else),
                        nonterm("statement"),
                    ],
                    conditional_with_else,
                ),
            ),
            (
                "conditional",
                seq(
                    vec![
                        term(TK::If),
                        term(TK::LeftParen),
                        nonterm("expression"),
                        term(TK::RightParen),
                        nonterm("statement"),
                    ],
                    conditional,
                ),
            ),
            (
                "assignment",
                seq(vec![term(TK::Symbol), term(TK::Assign), nonterm("expression"), term(TK::Semicolon)], assignment),
            ),
            (
                "loop",
                seq(
                    vec![
                        term(TK::While),
                        term(TK::LeftParen),
                        nonterm("expression"),
                        term(TK::RightParen),
                        nonterm("statement"),
                    ],
                    while_loop,
                ),
            ),
            /* Expressions, weakest binding first */
            ("expression", binary_level("andComparator", &[TK::Or], "expression")),
            ("andComparator", binary_level("eqComparator", &[TK::And], "andComparator")),
            ("eqComparator", binary_level("ineqComparator", &[TK::Equal, TK::NotEqual], "eqComparator")),
            (
                "ineqComparator",
                binary_level(
                    "term",
                    &[TK::Greater, TK::GreaterEqual, TK::Less, TK::LessEqual],
                    "ineqComparator",
                ),
            ),
            ("term", binary_level("factor", &[TK::Plus, TK::Minus, TK::Dot], "term")),
            ("factor", binary_level("unary", &[TK::Times, TK::Divide, TK::Modulo], "factor")),
            (
                "unary",
                or(vec![
                    seq(
                        vec![
                            or(vec![term(TK::Increment), term(TK::Decrement), term(TK::Not), term(TK::Minus)]),
                            nonterm("unary"),
                        ],
                        unary,
                    ),
                    nonterm("value"),
                ]),
            ),
            (
                "value",
                or(vec![
                    seq(vec![term(TK::LeftParen), nonterm("expression"), term(TK::RightParen)], nested),
                    nonterm("literal"),
                ]),
            ),
            (
                "literal",
                seq(
                    vec![or(vec![
                        term(TK::Number),
                        term(TK::String),
                        term(TK::Boolean),
                        term(TK::Null),
                        term(TK::Symbol),
                    ])],
                    literal,
                ),
            ),
        ];

        Grammar { rules: rules.into_iter().collect() }
    }

    /// A grammar with no rules, to be filled with [`Grammar::with_rule`].
    pub fn empty() -> Grammar {
        Grammar { rules: HashMap::new() }
    }

    /// Adds (or replaces) a rule.
    #[must_use]
    pub fn with_rule(mut self, name: &'static str, parselet: Parselet) -> Grammar {
        self.rules.insert(name, parselet);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Parselet> {
        self.rules.get(name)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Grammar::new()
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.rules.keys().collect();
        names.sort();

        f.debug_struct("Grammar").field("rules", &names).finish()
    }
}

/* Grammar Building Helpers */

/// `lower op same | lower`, for any of the given operators.
fn binary_level(lower: &'static str, operators: &[TK], same: &'static str) -> Parselet {
    let operator = or(operators.iter().map(|kind| term(*kind)).collect());

    or(vec![seq(vec![nonterm(lower), operator, nonterm(same)], binary), nonterm(lower)])
}

/// `item (',' item)* | empty`, producing a flat list of items and commas.
fn separated_by(first: Parselet, item: impl Fn() -> Parselet) -> Parselet {
    or(vec![
        seq(vec![first, zero_or_more(seq(vec![term(TK::Comma), item()], list), list)], flatten_separated),
        empty(list),
    ])
}

/* Actions */

// Actions destructure the values of their parts. Each returns `None` when the
// values do not have the shape the rule produces.

fn take<const N: usize>(values: Vec<Value>) -> Option<[Value; N]> {
    values.try_into().ok()
}

fn list(values: Vec<Value>) -> Option<Value> {
    Some(Value::List(values))
}

fn nothing(_: Vec<Value>) -> Option<Value> {
    Some(Value::Empty)
}

fn flatten_separated(values: Vec<Value>) -> Option<Value> {
    let [first, rest] = take(values)?;

    let mut flat = vec![first];
    for pair in rest.list_of::<Value>()? {
        let Value::List(pair) = pair else {
            return None;
        };
        flat.extend(pair);
    }

    Some(Value::List(flat))
}

fn script(values: Vec<Value>) -> Option<Value> {
    let [front_matter, nodes, eof] = take(values)?;

    Some(Script { front_matter: front_matter.optional()?, nodes: nodes.list_of()?, eof: eof.get()? }.into())
}

fn front_matter(values: Vec<Value>) -> Option<Value> {
    let [open_fence, open_break, items, close_fence, close_break] = take(values)?;

    Some(
        FrontMatter {
            open_fence: open_fence.get()?,
            open_break: open_break.get()?,
            items: items.list_of()?,
            close_fence: close_fence.get()?,
            close_break: close_break.get()?,
        }
        .into(),
    )
}

fn func_decl_item(values: Vec<Value>) -> Option<Value> {
    let [decl] = take(values)?;

    Some(FrontMatterItem::FuncDecl(decl.get()?).into())
}

fn blank_line(values: Vec<Value>) -> Option<Value> {
    let [line_break] = take(values)?;

    Some(FrontMatterItem::BlankLine(line_break.get()?).into())
}

fn func_decl(values: Vec<Value>) -> Option<Value> {
    let [extern_keyword, name, open_paren, params, close_paren, semicolon, line_break] = take(values)?;
    let (params, commas) = params.separated()?;

    Some(
        FuncDecl {
            extern_keyword: extern_keyword.get()?,
            name: name.get()?,
            open_paren: open_paren.get()?,
            params,
            commas,
            close_paren: close_paren.get()?,
            semicolon: semicolon.get()?,
            line_break: line_break.get()?,
        }
        .into(),
    )
}

fn node(values: Vec<Value>) -> Option<Value> {
    let [header, line_breaks, blocks] = take(values)?;

    let blocks = blocks
        .list_of::<Value>()?
        .into_iter()
        .map(|pair| {
            let Value::List(pair) = pair else {
                return None;
            };
            let [block, blank_lines] = take(pair)?;
            Some((block.get::<Block>()?, blank_lines.list_of::<Token>()?))
        })
        .collect::<Option<Vec<_>>>()?;

    Some(Node { header: header.get()?, line_breaks: line_breaks.list_of()?, blocks }.into())
}

fn header(values: Vec<Value>) -> Option<Value> {
    let [hash, name] = take(values)?;

    Some(Header { hash: hash.get()?, name: name.get()? }.into())
}

fn paragraph(values: Vec<Value>) -> Option<Value> {
    let lines = values.into_iter().map(Value::get).collect::<Option<Vec<Line>>>()?;

    Some(Block::Paragraph { lines }.into())
}

fn line(values: Vec<Value>) -> Option<Value> {
    let [inlines, line_break] = take(values)?;

    Some(Line { inlines: inlines.list_of()?, line_break: line_break.optional()? }.into())
}

fn text(values: Vec<Value>) -> Option<Value> {
    let [token] = take(values)?;

    Some(Inline::Text(token.get()?).into())
}

fn inline_code(values: Vec<Value>) -> Option<Value> {
    let [open, expression, close] = take(values)?;

    Some(Inline::InlineCode { open: open.get()?, expression: expression.get()?, close: close.get()? }.into())
}

fn link_block(values: Vec<Value>) -> Option<Value> {
    let [link, line_end] = take(values)?;

    Some(Block::LinkBlock { link: link.get()?, line_end: line_end.optional()? }.into())
}

fn link(values: Vec<Value>) -> Option<Value> {
    let [open_bracket, dest, close_bracket, open_paren, text, close_paren] = take(values)?;

    Some(
        Link {
            open_bracket: open_bracket.get()?,
            dest: dest.get()?,
            close_bracket: close_bracket.get()?,
            open_paren: open_paren.get()?,
            text: text.optional()?,
            close_paren: close_paren.get()?,
        }
        .into(),
    )
}

fn list_block(values: Vec<Value>) -> Option<Value> {
    let items = values.into_iter().map(Value::get).collect::<Option<Vec<ListItem>>>()?;

    Some(Block::List { items }.into())
}

fn list_item(values: Vec<Value>) -> Option<Value> {
    let [dash, link, line_end] = take(values)?;

    Some(ListItem { dash: dash.get()?, link: link.get()?, line_end: line_end.optional()? }.into())
}

fn code_block(values: Vec<Value>) -> Option<Value> {
    let [open_fence, statements, close_fence] = take(values)?;

    Some(
        Block::CodeBlock {
            open_fence: open_fence.get()?,
            statements: statements.list_of()?,
            close_fence: close_fence.get()?,
        }
        .into(),
    )
}

fn statement_block(values: Vec<Value>) -> Option<Value> {
    let [open_brace, statements, close_brace] = take(values)?;

    Some(
        Statement::StatementBlock {
            open_brace: open_brace.get()?,
            statements: statements.list_of()?,
            close_brace: close_brace.get()?,
        }
        .into(),
    )
}

fn function_call(values: Vec<Value>) -> Option<Value> {
    let [name, open_paren, arguments, close_paren, semicolon] = take(values)?;
    let (arguments, commas) = arguments.separated()?;

    Some(
        Statement::FunctionCall {
            name: name.get()?,
            open_paren: open_paren.get()?,
            arguments,
            commas,
            close_paren: close_paren.get()?,
            semicolon: semicolon.get()?,
        }
        .into(),
    )
}

fn goto(values: Vec<Value>) -> Option<Value> {
    let [goto_keyword, dest, semicolon] = take(values)?;

    Some(Statement::Goto { goto_keyword: goto_keyword.get()?, dest: dest.get()?, semicolon: semicolon.get()? }.into())
}

fn conditional(values: Vec<Value>) -> Option<Value> {
    let [if_keyword, open_paren, condition, close_paren, consequent] = take(values)?;

    Some(
        Statement::Conditional {
            if_keyword: if_keyword.get()?,
            open_paren: open_paren.get()?,
            condition: condition.get()?,
            close_paren: close_paren.get()?,
            consequent: Rc::new(consequent.get()?),
        }
        .into(),
    )
}

fn conditional_with_else(values: Vec<Value>) -> Option<Value> {
    let [if_keyword, open_paren, condition, close_paren, consequent, else_keyword, alternate] = take(values)?;

    Some(
        Statement::ConditionalWithElse {
            if_keyword: if_keyword.get()?,
            open_paren: open_paren.get()?,
            condition: condition.get()?,
            close_paren: close_paren.get()?,
            consequent: Rc::new(consequent.get()?),
            else_keyword: else_keyword.get()?,
            alternate: Rc::new(alternate.get()?),
        }
        .into(),
    )
}

fn assignment(values: Vec<Value>) -> Option<Value> {
    let [name, assign, value, semicolon] = take(values)?;

    Some(
        Statement::Assignment {
            name: name.get()?,
            assign: assign.get()?,
            value: value.get()?,
            semicolon: semicolon.get()?,
        }
        .into(),
    )
}

fn while_loop(values: Vec<Value>) -> Option<Value> {
    let [while_keyword, open_paren, condition, close_paren, body] = take(values)?;

    Some(
        Statement::Loop {
            while_keyword: while_keyword.get()?,
            open_paren: open_paren.get()?,
            condition: condition.get()?,
            close_paren: close_paren.get()?,
            body: Rc::new(body.get()?),
        }
        .into(),
    )
}

fn binary(values: Vec<Value>) -> Option<Value> {
    let [left, operator, right] = take(values)?;

    Some(
        Expression::BinaryExpression {
            left: Rc::new(left.get()?),
            operator: operator.get()?,
            right: Rc::new(right.get()?),
        }
        .into(),
    )
}

fn unary(values: Vec<Value>) -> Option<Value> {
    let [operator, operand] = take(values)?;

    Some(Expression::UnaryExpression { operator: operator.get()?, operand: Rc::new(operand.get()?) }.into())
}

fn nested(values: Vec<Value>) -> Option<Value> {
    let [open_paren, expression, close_paren] = take(values)?;

    Some(
        Expression::NestedExpression {
            open_paren: open_paren.get()?,
            expression: Rc::new(expression.get()?),
            close_paren: close_paren.get()?,
        }
        .into(),
    )
}

fn literal(values: Vec<Value>) -> Option<Value> {
    let [token] = take(values)?;

    Some(Expression::Literal(token.get()?).into())
}
