use crate::ast::{Literal, Type};

/// The result of classifying a piece of the AST.
///
/// The classes form a flat lattice. `Variant` is the class of a variable, whose
/// value is unknown until the script runs, so it is accepted wherever a concrete
/// class is expected. `Void` is the class of a well typed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Error,
    Void,
    Variant,
    Number,
    Boolean,
    String,
    Null,
}

impl Class {
    pub fn of_literal(literal: &Literal) -> Class {
        match literal {
            Literal::String(_) => Class::String,
            Literal::Bool(_) => Class::Boolean,
            Literal::Number(_) => Class::Number,
            Literal::Symbol(_) => Class::Variant,
            Literal::Null => Class::Null,
        }
    }

    /// True if a value of this class may be used where `expected` is required.
    pub fn fits(self, expected: Class) -> bool {
        self == Class::Variant || self == expected
    }
}

impl From<Type> for Class {
    fn from(value: Type) -> Self {
        match value {
            Type::Bool => Class::Boolean,
            Type::Number => Class::Number,
            Type::String => Class::String,
            Type::Null => Class::Null,
        }
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Class::Error => "error",
            Class::Void => "void",
            Class::Variant => "variant",
            Class::Number => "number",
            Class::Boolean => "bool",
            Class::String => "string",
            Class::Null => "null",
        };

        f.write_str(name)
    }
}
