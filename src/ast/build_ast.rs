//! This module handles construction of an AST from a parse tree.

use super::build_block_ast::build_block_ast;
use super::{Node, Script, Type};

use crate::error::ASTError;
use crate::parse::syntax_tree as st;

use std::collections::HashMap;

/* Functions that build AST Nodes */

/// Lowers a parse tree into an AST.
///
/// Fails if a literal cannot be decoded, or if an external function is declared
/// twice.
pub fn build_ast(tree: &st::Script) -> Result<Script, ASTError> {
    let functions = match &tree.front_matter {
        Some(front_matter) => build_functions(front_matter)?,
        None => HashMap::new(),
    };

    let nodes = tree.nodes.iter().map(build_node).collect::<Result<Vec<_>, _>>()?;

    Ok(Script { nodes, functions })
}

fn build_functions(front_matter: &st::FrontMatter) -> Result<HashMap<String, Vec<Type>>, ASTError> {
    let mut functions = HashMap::new();

    for item in &front_matter.items {
        let st::FrontMatterItem::FuncDecl(decl) = item else {
            continue;
        };

        let params = decl.params.iter().map(|param| build_type(&param.text)).collect::<Result<Vec<_>, _>>()?;

        if functions.insert(decl.name.text.clone(), params).is_some() {
            return Err(format!("Function {} is declared more than once", decl.name.text).into());
        }
    }

    Ok(functions)
}

fn build_type(name: &str) -> Result<Type, ASTError> {
    match name {
        "bool" => Ok(Type::Bool),
        "number" => Ok(Type::Number),
        "string" => Ok(Type::String),
        "null" => Ok(Type::Null),
        _ => Err(format!("Unknown parameter type {name}").into()),
    }
}

fn build_node(node: &st::Node) -> Result<Node, ASTError> {
    let body = node.blocks.iter().map(|(block, _)| build_block_ast(block)).collect::<Result<Vec<_>, _>>()?;

    Ok(Node { name: node.header.name.text.clone(), body })
}
