//! The parse tree: one type per grammar rule, keeping every token the rule
//! matched (whitespace and comments aside).
//!
//! Also defines [`Value`], the dynamically shaped result the parsing engine passes
//! between parselets. Grammar actions assemble the typed tree out of values.
//!
//! Subtrees are reference counted. The engine memoizes every rule result, so a
//! clone has to stay shallow no matter how deep the tree below it is.

use crate::token::{Token, TokenKind};

use std::rc::Rc;

/* Parse Tree */

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub front_matter: Option<FrontMatter>,
    pub nodes: Vec<Node>,
    pub eof: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub open_fence: Token,
    pub open_break: Token,
    pub items: Vec<FrontMatterItem>,
    pub close_fence: Token,
    pub close_break: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrontMatterItem {
    FuncDecl(FuncDecl),
    /// A line with nothing (or only a comment) on it.
    BlankLine(Token),
}

/// `extern name(type, ...);`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub extern_keyword: Token,
    pub name: Token,
    pub open_paren: Token,
    pub params: Vec<Token>,
    pub commas: Vec<Token>,
    pub close_paren: Token,
    pub semicolon: Token,
    pub line_break: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub header: Header,
    /// The line break ending the header, followed by any blank lines.
    pub line_breaks: Vec<Token>,
    /// Each block, with the blank lines after it.
    pub blocks: Vec<(Block, Vec<Token>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub hash: Token,
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph { lines: Vec<Line> },
    CodeBlock { open_fence: Token, statements: Vec<Statement>, close_fence: Token },
    LinkBlock { link: Link, line_end: Option<Token> },
    List { items: Vec<ListItem> },
}

/// A line of a paragraph. The last line of a script may not end in a line break.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub inlines: Vec<Inline>,
    pub line_break: Option<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(Token),
    InlineCode { open: Token, expression: Expression, close: Token },
}

/// `[dest](text)`
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub open_bracket: Token,
    pub dest: Token,
    pub close_bracket: Token,
    pub open_paren: Token,
    pub text: Option<Token>,
    pub close_paren: Token,
}

/// `- [dest](text)`
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub dash: Token,
    pub link: Link,
    pub line_end: Option<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    StatementBlock {
        open_brace: Token,
        statements: Vec<Statement>,
        close_brace: Token,
    },
    FunctionCall {
        name: Token,
        open_paren: Token,
        arguments: Vec<Expression>,
        commas: Vec<Token>,
        close_paren: Token,
        semicolon: Token,
    },
    Goto {
        goto_keyword: Token,
        dest: Token,
        semicolon: Token,
    },
    Conditional {
        if_keyword: Token,
        open_paren: Token,
        condition: Expression,
        close_paren: Token,
        consequent: Rc<Statement>,
    },
    ConditionalWithElse {
        if_keyword: Token,
        open_paren: Token,
        condition: Expression,
        close_paren: Token,
        consequent: Rc<Statement>,
        else_keyword: Token,
        alternate: Rc<Statement>,
    },
    Assignment {
        name: Token,
        assign: Token,
        value: Expression,
        semicolon: Token,
    },
    Loop {
        while_keyword: Token,
        open_paren: Token,
        condition: Expression,
        close_paren: Token,
        body: Rc<Statement>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    BinaryExpression { left: Rc<Expression>, operator: Token, right: Rc<Expression> },
    UnaryExpression { operator: Token, operand: Rc<Expression> },
    Literal(Token),
    NestedExpression { open_paren: Token, expression: Rc<Expression>, close_paren: Token },
}

/// Long operator chains nest as deep as they are long, so the subexpressions are
/// taken apart with an explicit stack rather than by recursive drop glue.
impl Drop for Expression {
    fn drop(&mut self) {
        let mut orphans = vec![];
        self.detach_children(&mut orphans);

        while let Some(mut orphan) = orphans.pop() {
            orphan.detach_children(&mut orphans);
        }
    }
}

impl Expression {
    /// Moves every subexpression no one else holds into `orphans`, leaving an
    /// empty literal in its place. Shared subexpressions are left alone.
    fn detach_children(&mut self, orphans: &mut Vec<Expression>) {
        let children = match self {
            Expression::BinaryExpression { left, right, .. } => [Some(left), Some(right)],
            Expression::UnaryExpression { operand: child, .. }
            | Expression::NestedExpression { expression: child, .. } => [Some(child), None],
            Expression::Literal(_) => [None, None],
        };

        for child in children.into_iter().flatten() {
            if let Some(inner) = Rc::get_mut(child) {
                orphans.push(std::mem::replace(inner, Expression::Literal(Token::new(TokenKind::Eof, ""))));
            }
        }
    }
}

/* Token Retention */

impl Script {
    /// Every token kept in the tree, in source order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = vec![];

        if let Some(front_matter) = &self.front_matter {
            out.extend([&front_matter.open_fence, &front_matter.open_break]);
            for item in &front_matter.items {
                match item {
                    FrontMatterItem::FuncDecl(decl) => decl.collect_tokens(&mut out),
                    FrontMatterItem::BlankLine(token) => out.push(token),
                }
            }
            out.extend([&front_matter.close_fence, &front_matter.close_break]);
        }

        for node in &self.nodes {
            out.extend([&node.header.hash, &node.header.name]);
            out.extend(&node.line_breaks);
            for (block, blank_lines) in &node.blocks {
                block.collect_tokens(&mut out);
                out.extend(blank_lines);
            }
        }

        out.push(&self.eof);
        out
    }
}

impl FuncDecl {
    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        out.extend([&self.extern_keyword, &self.name, &self.open_paren]);
        interleave(&self.params, &self.commas, out);
        out.extend([&self.close_paren, &self.semicolon, &self.line_break]);
    }
}

impl Block {
    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        match self {
            Block::Paragraph { lines } => {
                for line in lines {
                    for inline in &line.inlines {
                        match inline {
                            Inline::Text(token) => out.push(token),
                            Inline::InlineCode { open, expression, close } => {
                                out.push(open);
                                expression.collect_tokens(out);
                                out.push(close);
                            }
                        }
                    }
                    out.extend(&line.line_break);
                }
            }
            Block::CodeBlock { open_fence, statements, close_fence } => {
                out.push(open_fence);
                for statement in statements {
                    statement.collect_tokens(out);
                }
                out.push(close_fence);
            }
            Block::LinkBlock { link, line_end } => {
                link.collect_tokens(out);
                out.extend(line_end);
            }
            Block::List { items } => {
                for item in items {
                    out.push(&item.dash);
                    item.link.collect_tokens(out);
                    out.extend(&item.line_end);
                }
            }
        }
    }
}

impl Link {
    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        out.extend([&self.open_bracket, &self.dest, &self.close_bracket, &self.open_paren]);
        out.extend(&self.text);
        out.push(&self.close_paren);
    }
}

impl Statement {
    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        use Statement as S;

        match self {
            S::StatementBlock { open_brace, statements, close_brace } => {
                out.push(open_brace);
                for statement in statements {
                    statement.collect_tokens(out);
                }
                out.push(close_brace);
            }
            S::FunctionCall { name, open_paren, arguments, commas, close_paren, semicolon } => {
                out.extend([name, open_paren]);
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        out.extend(commas.get(i - 1));
                    }
                    argument.collect_tokens(out);
                }
                out.extend([close_paren, semicolon]);
            }
            S::Goto { goto_keyword, dest, semicolon } => out.extend([goto_keyword, dest, semicolon]),
            S::Conditional { if_keyword, open_paren, condition, close_paren, consequent } => {
                out.extend([if_keyword, open_paren]);
                condition.collect_tokens(out);
                out.push(close_paren);
                consequent.collect_tokens(out);
            }
            S::ConditionalWithElse {
                if_keyword,
                open_paren,
                condition,
                close_paren,
                consequent,
                else_keyword,
                alternate,
            } => {
                out.extend([if_keyword, open_paren]);
                condition.collect_tokens(out);
                out.push(close_paren);
                consequent.collect_tokens(out);
                out.push(else_keyword);
                alternate.collect_tokens(out);
            }
            S::Assignment { name, assign, value, semicolon } => {
                out.extend([name, assign]);
                value.collect_tokens(out);
                out.push(semicolon);
            }
            S::Loop { while_keyword, open_paren, condition, close_paren, body } => {
                out.extend([while_keyword, open_paren]);
                condition.collect_tokens(out);
                out.push(close_paren);
                body.collect_tokens(out);
            }
        }
    }
}

impl Expression {
    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        stacker::maybe_grow(32 * 1024, 1024 * 1024, || match self {
            Expression::BinaryExpression { left, operator, right } => {
                left.collect_tokens(out);
                out.push(operator);
                right.collect_tokens(out);
            }
            Expression::UnaryExpression { operator, operand } => {
                out.push(operator);
                operand.collect_tokens(out);
            }
            Expression::Literal(token) => out.push(token),
            Expression::NestedExpression { open_paren, expression, close_paren } => {
                out.push(open_paren);
                expression.collect_tokens(out);
                out.push(close_paren);
            }
        });
    }
}

fn interleave<'a>(items: &'a [Token], separators: &'a [Token], out: &mut Vec<&'a Token>) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.extend(separators.get(i - 1));
        }
        out.push(item);
    }
}

/* Values */

/// What a parselet produces. Terminals produce tokens, repetitions produce lists,
/// and rule actions produce pieces of the parse tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Token(Token),
    List(Vec<Value>),
    Script(Script),
    FrontMatter(FrontMatter),
    FrontMatterItem(FrontMatterItem),
    FuncDecl(FuncDecl),
    Node(Node),
    Header(Header),
    Block(Block),
    Line(Line),
    Inline(Inline),
    Link(Link),
    ListItem(ListItem),
    Statement(Statement),
    Expression(Expression),
}

/// Conversions between a tree type and its `Value` variant. Failed conversions
/// hand back the value.
macro_rules! value_conversions {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Value {
                fn from(inner: $variant) -> Value {
                    Value::$variant(inner)
                }
            }

            impl TryFrom<Value> for $variant {
                type Error = Value;

                fn try_from(value: Value) -> Result<$variant, Value> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

value_conversions!(
    Token,
    Script,
    FrontMatter,
    FrontMatterItem,
    FuncDecl,
    Node,
    Header,
    Block,
    Line,
    Inline,
    Link,
    ListItem,
    Statement,
    Expression,
);

impl Value {
    /// Converts to a tree type, or `None` if the value holds something else.
    pub fn get<T: TryFrom<Value>>(self) -> Option<T> {
        T::try_from(self).ok()
    }

    /// Converts a list value into a list of tree types.
    pub fn list_of<T: TryFrom<Value>>(self) -> Option<Vec<T>> {
        match self {
            Value::List(values) => values.into_iter().map(Value::get).collect(),
            _ => None,
        }
    }

    /// Converts the value of an optional part: `Empty` is `Some(None)`.
    pub fn optional<T: TryFrom<Value>>(self) -> Option<Option<T>> {
        match self {
            Value::Empty => Some(None),
            other => other.get().map(Some),
        }
    }

    /// Splits a flat list of the form `item (separator item)*` into its items and
    /// separators.
    pub fn separated<T: TryFrom<Value>>(self) -> Option<(Vec<T>, Vec<Token>)> {
        let Value::List(values) = self else {
            return None;
        };

        let mut items = vec![];
        let mut separators = vec![];
        for (i, value) in values.into_iter().enumerate() {
            if i % 2 == 0 {
                items.push(value.get()?);
            } else {
                separators.push(value.get()?);
            }
        }

        Some((items, separators))
    }
}
