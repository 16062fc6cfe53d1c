use std::collections::HashMap;

use crate::ast::{BinaryOperator, BlockElement, Expression, Inline, Script, Statement, Type, UnaryOperator};

use super::types::Class;

/// Describes the first ill typed construct found. Only used for logging.
type Mismatch = String;

/// Classifies a whole script. A well typed script, including one with no nodes,
/// is `Void`. Otherwise the result is `Error`, decided by the first ill typed
/// construct in document order.
pub fn type_check(script: &Script, functions: &HashMap<String, Vec<Type>>) -> Class {
    let checker = Checker { functions };

    let result = script.nodes.iter().try_for_each(|node| {
        node.body
            .iter()
            .try_for_each(|block| checker.block(block))
            .map_err(|reason| format!("in node {}: {reason}", node.name))
    });

    match result {
        Ok(()) => Class::Void,
        Err(reason) => {
            tracing::debug!(%reason, "script is not well typed");
            Class::Error
        }
    }
}

/// Classifies one expression. Variables are `Variant`, since nothing is known
/// about them before running.
pub fn type_of_expression(expr: &Expression) -> Class {
    match Checker::expression(expr) {
        Ok(class) => class,
        Err(reason) => {
            tracing::debug!(%reason, "expression is not well typed");
            Class::Error
        }
    }
}

/// Classifies one statement against a table of external function signatures.
pub fn type_of_statement(statement: &Statement, functions: &HashMap<String, Vec<Type>>) -> Class {
    match (Checker { functions }).statement(statement) {
        Ok(()) => Class::Void,
        Err(reason) => {
            tracing::debug!(%reason, "statement is not well typed");
            Class::Error
        }
    }
}

struct Checker<'a> {
    functions: &'a HashMap<String, Vec<Type>>,
}

impl Checker<'_> {
    fn block(&self, block: &BlockElement) -> Result<(), Mismatch> {
        match block {
            BlockElement::Paragraph(inlines) => {
                for inline in inlines {
                    if let Inline::InlineCode(expr) = inline {
                        Checker::expression(expr)?;
                    }
                }
                Ok(())
            }
            BlockElement::Link(_) | BlockElement::Option(_) => Ok(()),
            BlockElement::CodeBlock(statements) => statements.iter().try_for_each(|statement| self.statement(statement)),
        }
    }

    fn statement(&self, statement: &Statement) -> Result<(), Mismatch> {
        use Statement as S;

        stacker::maybe_grow(32 * 1024, 1024 * 1024, || match statement {
            S::StatementBlock(statements) => statements.iter().try_for_each(|statement| self.statement(statement)),
            S::Assignment { value, .. } => Checker::expression(value).map(|_| ()),
            S::FunctionCall { name, args } => self.call(name, args),
            S::GotoNode(_) => Ok(()),
            S::Conditional { cond, consequent, alternate } => {
                Checker::guard(cond)?;
                self.statement(consequent)?;
                match alternate {
                    Some(alternate) => self.statement(alternate),
                    None => Ok(()),
                }
            }
            S::Loop { cond, consequent } => {
                Checker::guard(cond)?;
                self.statement(consequent)
            }
            S::InfiniteLoop { consequent } => self.statement(consequent),
        })
    }

    fn call(&self, name: &str, args: &[Expression]) -> Result<(), Mismatch> {
        let Some(params) = self.functions.get(name) else {
            return Err(format!("call to undeclared function {name}"));
        };

        if params.len() != args.len() {
            return Err(format!("{name} takes {} arguments but was given {}", params.len(), args.len()));
        }

        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
            let class = Checker::expression(arg)?;
            let expected = Class::from(*param);

            if !class.fits(expected) {
                return Err(format!("argument {} of {name} should be {expected}, found {class}", index + 1));
            }
        }

        Ok(())
    }

    fn guard(cond: &Expression) -> Result<(), Mismatch> {
        match Checker::expression(cond)? {
            Class::Boolean | Class::Variant => Ok(()),
            other => Err(format!("condition should be bool, found {other}")),
        }
    }

    fn expression(expr: &Expression) -> Result<Class, Mismatch> {
        stacker::maybe_grow(32 * 1024, 1024 * 1024, || match expr {
            Expression::Literal(literal) => Ok(Class::of_literal(literal)),
            Expression::UnaryOp { op, arg } => {
                let arg = Checker::expression(arg)?;
                Checker::unary(*op, arg)
            }
            Expression::BinaryOp { op, left, right } => {
                let left = Checker::expression(left)?;
                let right = Checker::expression(right)?;
                Checker::binary(*op, left, right)
            }
        })
    }

    fn unary(op: UnaryOperator, arg: Class) -> Result<Class, Mismatch> {
        use UnaryOperator as U;

        let (operand, result) = match op {
            U::Increment | U::Decrement | U::Negate => (Class::Number, Class::Number),
            U::Not => (Class::Boolean, Class::Boolean),
        };

        if arg.fits(operand) {
            Ok(result)
        } else {
            Err(format!("{op:?} expects {operand}, found {arg}"))
        }
    }

    fn binary(op: BinaryOperator, left: Class, right: Class) -> Result<Class, Mismatch> {
        use BinaryOperator as B;

        let (operand, result) = match op {
            B::Add | B::Subtract | B::Multiply | B::Divide | B::Modulo => (Class::Number, Class::Number),
            B::Greater | B::GreaterEqual | B::Less | B::LessEqual => (Class::Number, Class::Boolean),
            B::And | B::Or => (Class::Boolean, Class::Boolean),
            B::Equal | B::NotEqual => return Ok(Class::Boolean),
            B::Concat => return Ok(Class::String),
        };

        if left.fits(operand) && right.fits(operand) {
            Ok(result)
        } else {
            Err(format!("{op:?} expects {operand} operands, found {left} and {right}"))
        }
    }
}
