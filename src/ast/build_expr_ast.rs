//! This module handles building [`Expressions`](Expression) from parse trees,
//! including decoding literal values.

use super::{BinaryOperator, Expression, Literal, UnaryOperator};

use crate::error::ASTError;
use crate::parse::syntax_tree as st;
use crate::token::{Token, TokenKind as TK};

/* Public (to ast) Function that Constructs Expressions */

pub(super) fn build_expr_ast(expr: &st::Expression) -> Result<Expression, ASTError> {
    // Prevent stack overflow by allocating additional stack as required.
    stacker::maybe_grow(32 * 1024, 1024 * 1024, || match expr {
        st::Expression::BinaryExpression { left, operator, right } => {
            Ok(Expression::binary(binary_operator(operator)?, build_expr_ast(left)?, build_expr_ast(right)?))
        }
        st::Expression::UnaryExpression { operator, operand } => {
            Ok(Expression::unary(unary_operator(operator)?, build_expr_ast(operand)?))
        }
        st::Expression::Literal(token) => Ok(Expression::Literal(build_literal(token)?)),
        st::Expression::NestedExpression { expression, .. } => build_expr_ast(expression),
    })
}

/* Operators */

fn binary_operator(token: &Token) -> Result<BinaryOperator, ASTError> {
    use BinaryOperator as B;

    Ok(match token.kind {
        TK::Plus => B::Add,
        TK::Minus => B::Subtract,
        TK::Times => B::Multiply,
        TK::Divide => B::Divide,
        TK::Modulo => B::Modulo,
        TK::Greater => B::Greater,
        TK::GreaterEqual => B::GreaterEqual,
        TK::Less => B::Less,
        TK::LessEqual => B::LessEqual,
        TK::Equal => B::Equal,
        TK::NotEqual => B::NotEqual,
        TK::And => B::And,
        TK::Or => B::Or,
        TK::Dot => B::Concat,
        _ => return Err(format!("Expected binary operator, found {token}").into()),
    })
}

fn unary_operator(token: &Token) -> Result<UnaryOperator, ASTError> {
    use UnaryOperator as U;

    Ok(match token.kind {
        TK::Increment => U::Increment,
        TK::Decrement => U::Decrement,
        TK::Not => U::Not,
        TK::Minus => U::Negate,
        _ => return Err(format!("Expected unary operator, found {token}").into()),
    })
}

/* Literals */

fn build_literal(token: &Token) -> Result<Literal, ASTError> {
    match token.kind {
        TK::Number => Ok(Literal::Number(decode_number(&token.text)?)),
        TK::String => serde_json::from_str(&token.text)
            .map(Literal::String)
            .map_err(|err| format!("Bad string literal {}: {err}", token.text).into()),
        TK::Boolean if token.text == "true" => Ok(Literal::Bool(true)),
        TK::Boolean if token.text == "false" => Ok(Literal::Bool(false)),
        TK::Null => Ok(Literal::Null),
        TK::Symbol => Ok(Literal::Symbol(token.text.clone())),
        _ => Err(format!("Expected literal, found {token}").into()),
    }
}

/// Numbers are integers, even with an exponent. A negative exponent divides,
/// truncating toward zero.
fn decode_number(text: &str) -> Result<i64, ASTError> {
    let too_big = || ASTError(format!("Number literal {text} does not fit in 64 bits"));

    let (mantissa, exponent) = match text.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (text, None),
    };

    let mantissa: i64 = mantissa.parse().map_err(|_| too_big())?;

    let Some(exponent) = exponent else {
        return Ok(mantissa);
    };

    let exponent: i64 = exponent.parse().map_err(|_| too_big())?;
    let scale = u32::try_from(exponent.unsigned_abs()).ok().and_then(|power| 10_i64.checked_pow(power));

    if mantissa == 0 {
        Ok(0)
    } else if exponent >= 0 {
        scale.and_then(|scale| mantissa.checked_mul(scale)).ok_or_else(too_big)
    } else {
        // Dividing by more than i64 can hold always leaves zero.
        Ok(scale.map_or(0, |scale| mantissa / scale))
    }
}
