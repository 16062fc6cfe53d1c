//! Constant folding and algebraic simplification.
//!
//! Expressions are folded bottom up. Each step reports whether the result is a
//! compile time constant (any literal except a symbol). Folding never fails: an
//! operation that cannot be evaluated (overflow, division by zero, mismatched
//! operand kinds) is left in place for the type checker and the runtime.

use crate::ast::{BinaryOperator, BlockElement, Expression, Inline, Literal, Node, Script, Statement, UnaryOperator};

/* Public Entry Points */

/// Folds a whole script, returning a new one.
pub fn fold(script: &Script) -> Script {
    Script { nodes: script.nodes.iter().map(fold_node).collect(), functions: script.functions.clone() }
}

pub fn fold_expression(expr: &Expression) -> Expression {
    fold_expr(expr).0
}

pub fn fold_statement(statement: &Statement) -> Statement {
    use Statement as S;

    match statement {
        S::StatementBlock(statements) => S::StatementBlock(statements.iter().map(fold_statement).collect()),
        S::Assignment { name, value } => S::Assignment { name: name.clone(), value: fold_expression(value) },
        S::FunctionCall { name, args } => {
            S::FunctionCall { name: name.clone(), args: args.iter().map(fold_expression).collect() }
        }
        S::GotoNode(dest) => S::GotoNode(dest.clone()),
        S::Conditional { cond, consequent, alternate } => {
            let (cond, _) = fold_expr(cond);
            let consequent = fold_statement(consequent);
            let alternate = alternate.as_deref().map(fold_statement).filter(|alternate| !is_empty(alternate));

            if !is_empty(&consequent) {
                return S::Conditional { cond, consequent: Box::new(consequent), alternate: alternate.map(Box::new) };
            }

            // Nothing happens when the condition holds, so branch on its negation.
            match alternate {
                Some(alternate) => S::Conditional {
                    cond: fold_unary(UnaryOperator::Not, cond).0,
                    consequent: Box::new(alternate),
                    alternate: None,
                },
                None => S::StatementBlock(vec![]),
            }
        }
        S::Loop { cond, consequent } => {
            S::Loop { cond: fold_expression(cond), consequent: Box::new(fold_statement(consequent)) }
        }
        S::InfiniteLoop { consequent } => S::InfiniteLoop { consequent: Box::new(fold_statement(consequent)) },
    }
}

/* Blocks */

fn fold_node(node: &Node) -> Node {
    let body = node
        .body
        .iter()
        .map(|block| match block {
            BlockElement::Paragraph(inlines) => BlockElement::Paragraph(fold_paragraph(inlines)),
            BlockElement::CodeBlock(statements) => {
                BlockElement::CodeBlock(statements.iter().map(fold_statement).collect())
            }
            other => other.clone(),
        })
        .collect();

    Node { name: node.name.clone(), body }
}

/// Merges neighbouring constant text, collapses whitespace runs to one space, and
/// trims trailing spaces from the end of the paragraph.
fn fold_paragraph(inlines: &[Inline]) -> Vec<Inline> {
    let mut folded = vec![];
    let mut pending = String::new();

    for inline in inlines {
        match inline {
            Inline::Text(text) => pending.push_str(text),
            Inline::InlineCode(expr) => match fold_expr(expr) {
                (Expression::Literal(literal), true) => pending.push_str(&literal.to_string()),
                (expr, _) => {
                    flush_text(&mut pending, &mut folded);
                    folded.push(Inline::InlineCode(expr));
                }
            },
        }
    }
    flush_text(&mut pending, &mut folded);

    if let Some(Inline::Text(last)) = folded.last_mut() {
        last.truncate(last.trim_end_matches(' ').len());
        if last.is_empty() {
            folded.pop();
        }
    }

    folded
}

fn flush_text(pending: &mut String, folded: &mut Vec<Inline>) {
    if pending.is_empty() {
        return;
    }

    let mut collapsed = String::with_capacity(pending.len());
    let mut in_whitespace = false;
    for ch in pending.chars() {
        if matches!(ch, ' ' | '\t' | '\n') {
            if !in_whitespace {
                collapsed.push(' ');
            }
            in_whitespace = true;
        } else {
            collapsed.push(ch);
            in_whitespace = false;
        }
    }

    folded.push(Inline::Text(collapsed));
    pending.clear();
}

/* Expressions */

fn fold_expr(expr: &Expression) -> (Expression, bool) {
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || match expr {
        Expression::Literal(literal) => (expr.clone(), literal.is_constant()),
        Expression::UnaryOp { op, arg } => {
            let (arg, _) = fold_expr(arg);
            fold_unary(*op, arg)
        }
        Expression::BinaryOp { op, left, right } => {
            let (left, _) = fold_expr(left);
            let (right, _) = fold_expr(right);
            fold_binary(*op, left, right)
        }
    })
}

/// Folds a unary operation whose operand is already folded.
fn fold_unary(op: UnaryOperator, arg: Expression) -> (Expression, bool) {
    use UnaryOperator as U;

    if let Some(literal) = arg.as_literal().and_then(|literal| eval_unary(op, literal)) {
        return (Expression::Literal(literal), true);
    }

    match (op, arg) {
        (U::Not, Expression::BinaryOp { op: comparison, left, right }) if comparison.is_comparison() => {
            let negated = comparison.negated_comparison().unwrap_or(comparison);
            (Expression::BinaryOp { op: negated, left, right }, false)
        }
        (U::Not, Expression::UnaryOp { op: U::Not, arg }) | (U::Negate, Expression::UnaryOp { op: U::Negate, arg }) => {
            let constant = is_constant(&arg);
            (*arg, constant)
        }
        (op, arg) => (Expression::unary(op, arg), false),
    }
}

/// Folds a binary operation whose operands are already folded.
fn fold_binary(op: BinaryOperator, left: Expression, right: Expression) -> (Expression, bool) {
    use BinaryOperator as B;

    if let (Some(l), Some(r)) = (left.as_literal(), right.as_literal()) {
        if l.is_constant() && r.is_constant() {
            if let Some(literal) = eval_binary(op, l, r) {
                return (Expression::Literal(literal), true);
            }
        }

        if let (Literal::Symbol(l), Literal::Symbol(r)) = (l, r) {
            if l == r {
                let same = match op {
                    B::Equal | B::GreaterEqual | B::LessEqual => Some(true),
                    B::NotEqual | B::Greater | B::Less => Some(false),
                    _ => None,
                };
                if let Some(value) = same {
                    return (Expression::boolean(value), true);
                }
            }
        }
    }

    simplify(op, left, right)
}

/// Algebraic identities that hold whatever the unknown side turns out to be.
fn simplify(op: BinaryOperator, left: Expression, right: Expression) -> (Expression, bool) {
    use BinaryOperator as B;

    let number = |expr: &Expression| match expr.as_literal() {
        Some(Literal::Number(value)) => Some(*value),
        _ => None,
    };
    let boolean = |expr: &Expression| match expr.as_literal() {
        Some(Literal::Bool(value)) => Some(*value),
        _ => None,
    };

    let keep = |expr: Expression| {
        let constant = is_constant(&expr);
        (expr, constant)
    };

    match (op, number(&left), number(&right), boolean(&left), boolean(&right)) {
        (B::Add, Some(0), ..) => keep(right),
        (B::Add, _, Some(0), ..) => keep(left),
        (B::Add, Some(1), ..) => fold_unary(UnaryOperator::Increment, right),
        (B::Add, _, Some(1), ..) => fold_unary(UnaryOperator::Increment, left),

        (B::Subtract, Some(0), ..) => fold_unary(UnaryOperator::Negate, right),
        (B::Subtract, _, Some(0), ..) => keep(left),
        (B::Subtract, _, Some(1), ..) => fold_unary(UnaryOperator::Decrement, left),

        (B::Multiply, Some(0), ..) | (B::Multiply, _, Some(0), ..) | (B::Divide, Some(0), ..) => {
            (Expression::number(0), true)
        }
        (B::Multiply, Some(1), ..) => keep(right),
        (B::Multiply, _, Some(1), ..) | (B::Divide, _, Some(1), ..) => keep(left),

        (B::And, _, _, Some(true), _) => keep(right),
        (B::And, _, _, _, Some(true)) => keep(left),
        (B::And, _, _, Some(false), _) | (B::And, _, _, _, Some(false)) => (Expression::boolean(false), true),

        (B::Or, _, _, Some(true), _) | (B::Or, _, _, _, Some(true)) => (Expression::boolean(true), true),
        (B::Or, _, _, Some(false), _) => keep(right),
        (B::Or, _, _, _, Some(false)) => keep(left),

        _ => (Expression::binary(op, left, right), false),
    }
}

/* Evaluation of Constants */

fn eval_unary(op: UnaryOperator, literal: &Literal) -> Option<Literal> {
    use UnaryOperator as U;

    match (op, literal) {
        (U::Increment, Literal::Number(value)) => value.checked_add(1).map(Literal::Number),
        (U::Decrement, Literal::Number(value)) => value.checked_sub(1).map(Literal::Number),
        (U::Negate, Literal::Number(value)) => value.checked_neg().map(Literal::Number),
        (U::Not, Literal::Bool(value)) => Some(Literal::Bool(!value)),
        _ => None,
    }
}

fn eval_binary(op: BinaryOperator, left: &Literal, right: &Literal) -> Option<Literal> {
    use BinaryOperator as B;
    use Literal as L;

    match (op, left, right) {
        (B::Add, L::Number(l), L::Number(r)) => l.checked_add(*r).map(L::Number),
        (B::Subtract, L::Number(l), L::Number(r)) => l.checked_sub(*r).map(L::Number),
        (B::Multiply, L::Number(l), L::Number(r)) => l.checked_mul(*r).map(L::Number),
        (B::Divide, L::Number(l), L::Number(r)) => l.checked_div(*r).map(L::Number),
        (B::Modulo, L::Number(l), L::Number(r)) => l.checked_rem(*r).map(L::Number),

        (B::Greater, L::Number(l), L::Number(r)) => Some(L::Bool(l > r)),
        (B::GreaterEqual, L::Number(l), L::Number(r)) => Some(L::Bool(l >= r)),
        (B::Less, L::Number(l), L::Number(r)) => Some(L::Bool(l < r)),
        (B::LessEqual, L::Number(l), L::Number(r)) => Some(L::Bool(l <= r)),

        (B::Equal, l, r) => Some(L::Bool(l == r)),
        (B::NotEqual, l, r) => Some(L::Bool(l != r)),

        (B::And, L::Bool(l), L::Bool(r)) => Some(L::Bool(*l && *r)),
        (B::Or, L::Bool(l), L::Bool(r)) => Some(L::Bool(*l || *r)),

        (B::Concat, l, r) => Some(L::String(format!("{l}{r}"))),

        _ => None,
    }
}

/* Helpers */

fn is_constant(expr: &Expression) -> bool {
    expr.as_literal().is_some_and(Literal::is_constant)
}

/// A statement that does nothing: an empty block, or blocks of empty blocks.
fn is_empty(statement: &Statement) -> bool {
    matches!(statement, Statement::StatementBlock(statements) if statements.iter().all(is_empty))
}
