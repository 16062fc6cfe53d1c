//! This module handles building [`Statements`](Statement) from parse trees.

use super::build_expr_ast::build_expr_ast;
use super::Statement;

use crate::error::ASTError;
use crate::parse::syntax_tree as st;

/* Public (to ast) Function to Construct Statements */

pub(super) fn build_statement_ast(statement: &st::Statement) -> Result<Statement, ASTError> {
    use crate::parse::syntax_tree::Statement as S;

    Ok(match statement {
        S::StatementBlock { statements, .. } => {
            Statement::StatementBlock(statements.iter().map(build_statement_ast).collect::<Result<_, _>>()?)
        }
        S::FunctionCall { name, arguments, .. } => Statement::FunctionCall {
            name: name.text.clone(),
            args: arguments.iter().map(build_expr_ast).collect::<Result<_, _>>()?,
        },
        S::Goto { dest, .. } => Statement::GotoNode(dest.text.clone()),
        S::Conditional { condition, consequent, .. } => Statement::Conditional {
            cond: build_expr_ast(condition)?,
            consequent: Box::new(build_statement_ast(consequent)?),
            alternate: None,
        },
        S::ConditionalWithElse { condition, consequent, alternate, .. } => Statement::Conditional {
            cond: build_expr_ast(condition)?,
            consequent: Box::new(build_statement_ast(consequent)?),
            alternate: Some(Box::new(build_statement_ast(alternate)?)),
        },
        S::Assignment { name, value, .. } => {
            Statement::Assignment { name: name.text.clone(), value: build_expr_ast(value)? }
        }
        S::Loop { condition, body, .. } => {
            Statement::Loop { cond: build_expr_ast(condition)?, consequent: Box::new(build_statement_ast(body)?) }
        }
    })
}
