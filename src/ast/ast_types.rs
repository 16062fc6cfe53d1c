//! This module defines the AST types and simple methods on those types.
//!
//! Unlike the parse tree, the AST keeps no syntax-only tokens. Literal values are
//! decoded, and each literal's kind is carried by its variant.

use std::collections::HashMap;

/* AST Definitions */

/// Represents a whole script.
///
/// Nodes are kept in source order; the first one is where a script starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    pub nodes: Vec<Node>,
    /// Signatures of external functions, from the front matter.
    pub functions: HashMap<String, Vec<Type>>,
}

/// A named unit of narrative, reachable through links and gotos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub body: Vec<BlockElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockElement {
    Paragraph(Vec<Inline>),
    /// A lone link. Following it ends the node.
    Link(Link),
    /// A list of links for the player to choose between.
    Option(Vec<Link>),
    CodeBlock(Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Name of the node the link leads to.
    pub dest: String,
    /// Display text, with escapes removed.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    InlineCode(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    StatementBlock(Vec<Statement>),
    Assignment { name: String, value: Expression },
    FunctionCall { name: String, args: Vec<Expression> },
    GotoNode(String),
    Conditional { cond: Expression, consequent: Box<Statement>, alternate: Option<Box<Statement>> },
    Loop { cond: Expression, consequent: Box<Statement> },
    /// A loop whose guard is literally `true`. Only produced by dead code elimination.
    InfiniteLoop { consequent: Box<Statement> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    BinaryOp { op: BinaryOperator, left: Box<Expression>, right: Box<Expression> },
    UnaryOp { op: UnaryOperator, arg: Box<Expression> },
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(String),
    Bool(bool),
    Number(i64),
    /// A reference to a variable, by name.
    Symbol(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    NotEqual,
    And,
    Or,
    /// `.`, which joins the text of both sides.
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Increment,
    Decrement,
    Not,
    Negate,
}

/// Parameter types of external functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Number,
    String,
    Null,
}

/* Constructors and Helpers */

impl Expression {
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::BinaryOp { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn unary(op: UnaryOperator, arg: Expression) -> Expression {
        Expression::UnaryOp { op, arg: Box::new(arg) }
    }

    pub fn number(value: i64) -> Expression {
        Expression::Literal(Literal::Number(value))
    }

    pub fn boolean(value: bool) -> Expression {
        Expression::Literal(Literal::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Expression {
        Expression::Literal(Literal::String(value.into()))
    }

    pub fn symbol(name: impl Into<String>) -> Expression {
        Expression::Literal(Literal::Symbol(name.into()))
    }

    pub fn null() -> Expression {
        Expression::Literal(Literal::Null)
    }

    /// Returns the literal, if this expression is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expression::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

impl Literal {
    /// Symbols are the only literals whose value is unknown before running.
    pub fn is_constant(&self) -> bool {
        !matches!(self, Literal::Symbol(_))
    }
}

impl std::fmt::Display for Literal {
    /// Formats a constant the way concatenation and text interpolation show it.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(string) => f.write_str(string),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Number(value) => write!(f, "{value}"),
            Literal::Symbol(name) => f.write_str(name),
            Literal::Null => f.write_str("null"),
        }
    }
}

impl BinaryOperator {
    /// True for the six comparison operators.
    pub fn is_comparison(self) -> bool {
        use BinaryOperator as B;

        matches!(self, B::Greater | B::GreaterEqual | B::Less | B::LessEqual | B::Equal | B::NotEqual)
    }

    /// The comparison that holds exactly when this one does not.
    pub fn negated_comparison(self) -> Option<BinaryOperator> {
        use BinaryOperator as B;

        Some(match self {
            B::Equal => B::NotEqual,
            B::NotEqual => B::Equal,
            B::Greater => B::LessEqual,
            B::LessEqual => B::Greater,
            B::Less => B::GreaterEqual,
            B::GreaterEqual => B::Less,
            _ => return None,
        })
    }
}
