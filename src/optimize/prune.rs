//! Dead code elimination.
//!
//! Works at two levels. Inside a node, anything after a control transfer that
//! always happens is dropped: a link, a list of options, or a goto. Across nodes,
//! only nodes reachable from the first one are kept.

use crate::ast::{BlockElement, Expression, Literal, Node, Script, Statement};

use std::collections::HashSet;

/* Public Entry Points */

/// Prunes unreachable code and unreachable nodes, returning a new script.
///
/// References to nodes that do not exist are ignored here. See
/// [`undefined_nodes`] for finding them.
pub fn prune(script: &Script) -> Script {
    let nodes: Vec<Node> = script.nodes.iter().map(prune_node).collect();

    let reachable: HashSet<String> = reachable_nodes(&nodes).into_iter().map(str::to_string).collect();
    tracing::trace!(total = nodes.len(), reachable = reachable.len(), "computed reachable nodes");

    let nodes = nodes.into_iter().filter(|node| reachable.contains(node.name.as_str())).collect();

    Script { nodes, functions: script.functions.clone() }
}

/// Names that some link, option, or goto leads to, but that no node defines.
/// Each name is reported once, in order of first reference.
pub fn undefined_nodes(script: &Script) -> Vec<String> {
    let defined: HashSet<&str> = script.nodes.iter().map(|node| node.name.as_str()).collect();
    let mut reported = HashSet::new();

    script
        .nodes
        .iter()
        .flat_map(references)
        .filter(|name| !defined.contains(name) && reported.insert(*name))
        .map(str::to_string)
        .collect()
}

/* Intra-node Pruning */

fn prune_node(node: &Node) -> Node {
    let mut body = vec![];

    for block in &node.body {
        match block {
            BlockElement::Paragraph(_) => body.push(block.clone()),
            BlockElement::Link(_) | BlockElement::Option(_) => {
                body.push(block.clone());
                break;
            }
            // A code block that always jumps ends the node, just like a link.
            BlockElement::CodeBlock(statements) => {
                let (statements, terminates) = prune_statements(statements);
                body.push(BlockElement::CodeBlock(statements));
                if terminates {
                    break;
                }
            }
        }
    }

    Node { name: node.name.clone(), body }
}

/// Prunes a list of statements, flattening nested blocks into it. Returns true if
/// the list always ends in a jump to another node.
fn prune_statements(statements: &[Statement]) -> (Vec<Statement>, bool) {
    let mut pruned = vec![];

    for statement in statements {
        let (statement, terminates) = prune_statement(statement);

        match statement {
            Statement::StatementBlock(inner) => pruned.extend(inner),
            other => pruned.push(other),
        }

        if terminates {
            return (pruned, true);
        }
    }

    (pruned, false)
}

fn prune_statement(statement: &Statement) -> (Statement, bool) {
    use Statement as S;

    match statement {
        S::GotoNode(_) => (statement.clone(), true),
        S::StatementBlock(statements) => {
            let (statements, terminates) = prune_statements(statements);
            (S::StatementBlock(statements), terminates)
        }
        S::Conditional { cond, consequent, alternate } => {
            let (consequent, consequent_terminates) = prune_statement(consequent);
            let (alternate, alternate_terminates) = match alternate {
                Some(alternate) => {
                    let (alternate, terminates) = prune_statement(alternate);
                    (Some(Box::new(alternate)), terminates)
                }
                None => (None, false),
            };

            (
                S::Conditional { cond: cond.clone(), consequent: Box::new(consequent), alternate },
                consequent_terminates && alternate_terminates,
            )
        }
        S::Loop { cond: Expression::Literal(Literal::Bool(true)), consequent } | S::InfiniteLoop { consequent } => {
            let (consequent, _) = prune_statement(consequent);
            (S::InfiniteLoop { consequent: Box::new(consequent) }, true)
        }
        S::Loop { cond: Expression::Literal(Literal::Bool(false)), .. } => (S::StatementBlock(vec![]), false),
        S::Loop { cond, consequent } => {
            let (consequent, _) = prune_statement(consequent);
            (S::Loop { cond: cond.clone(), consequent: Box::new(consequent) }, false)
        }
        S::Assignment { .. } | S::FunctionCall { .. } => (statement.clone(), false),
    }
}

/* Inter-node Reachability */

/// The least set of names containing the first node and closed under references.
fn reachable_nodes(nodes: &[Node]) -> HashSet<&str> {
    let Some(first) = nodes.first() else {
        return HashSet::new();
    };

    let mut reachable = HashSet::from([first.name.as_str()]);

    loop {
        let next: HashSet<&str> = nodes
            .iter()
            .filter(|node| reachable.contains(node.name.as_str()))
            .flat_map(references)
            .chain(reachable.iter().copied())
            .collect();

        if next.len() == reachable.len() {
            return reachable;
        }
        reachable = next;
    }
}

/// Every node name a node may transfer control to, in order.
fn references(node: &Node) -> Vec<&str> {
    let mut names = vec![];

    for block in &node.body {
        match block {
            BlockElement::Paragraph(_) => (),
            BlockElement::Link(link) => names.push(link.dest.as_str()),
            BlockElement::Option(links) => names.extend(links.iter().map(|link| link.dest.as_str())),
            BlockElement::CodeBlock(statements) => {
                for statement in statements {
                    statement_references(statement, &mut names);
                }
            }
        }
    }

    names
}

fn statement_references<'a>(statement: &'a Statement, names: &mut Vec<&'a str>) {
    use Statement as S;

    match statement {
        S::GotoNode(dest) => names.push(dest),
        S::StatementBlock(statements) => {
            for statement in statements {
                statement_references(statement, names);
            }
        }
        S::Conditional { consequent, alternate, .. } => {
            statement_references(consequent, names);
            if let Some(alternate) = alternate {
                statement_references(alternate, names);
            }
        }
        S::Loop { consequent, .. } | S::InfiniteLoop { consequent } => statement_references(consequent, names),
        S::Assignment { .. } | S::FunctionCall { .. } => (),
    }
}
