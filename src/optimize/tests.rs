//! Tests for constant folding and dead code elimination.

use super::*;

use crate::ast::{
    build_ast, BinaryOperator as B, BlockElement, Expression as E, Inline, Link, Node, Script, Statement,
    UnaryOperator as U,
};
use crate::parse::{parse, GRAMMAR};
use crate::token::lex;

use std::io::Read;

use test_generator::test_resources;

fn read_file(resource: &str) -> String {
    let mut file = std::fs::File::open(resource).expect("File opens");
    let mut input = String::new();
    file.read_to_string(&mut input).expect("Read successful");
    input
}

fn build(input: &str) -> Script {
    build_ast(&parse(&lex(input), &GRAMMAR).expect("Input parses")).expect("AST builds")
}

fn x() -> E {
    E::symbol("x")
}

fn node(name: &str, body: Vec<BlockElement>) -> Node {
    Node { name: name.to_string(), body }
}

fn link(dest: &str) -> BlockElement {
    BlockElement::Link(Link { dest: dest.to_string(), text: String::new() })
}

fn assign(name: &str, value: i64) -> Statement {
    Statement::Assignment { name: name.to_string(), value: E::number(value) }
}

fn goto(dest: &str) -> Statement {
    Statement::GotoNode(dest.to_string())
}

fn node_names(script: &Script) -> Vec<&str> {
    script.nodes.iter().map(|node| node.name.as_str()).collect()
}

/* Folding */

#[test_resources("samples/successful/**/*.cq")]
fn fold_is_idempotent_on_samples(resource: &str) {
    let script = build(&read_file(resource));
    let once = fold(&script);

    assert_eq!(fold(&once), once);
}

#[test]
fn fold_examples() {
    assert_eq!(fold_expression(&E::binary(B::Add, E::number(0), x())), x());
    assert_eq!(fold_expression(&E::binary(B::Multiply, E::number(5), E::number(3))), E::number(15));
    assert_eq!(fold_expression(&E::unary(U::Not, E::unary(U::Not, x()))), x());
}

#[test]
fn constant_arithmetic() {
    assert_eq!(fold_expression(&E::binary(B::Subtract, E::number(2), E::number(5))), E::number(-3));
    assert_eq!(fold_expression(&E::binary(B::Divide, E::number(7), E::number(2))), E::number(3));
    assert_eq!(fold_expression(&E::binary(B::Modulo, E::number(7), E::number(4))), E::number(3));
    assert_eq!(fold_expression(&E::unary(U::Increment, E::number(4))), E::number(5));
    assert_eq!(fold_expression(&E::unary(U::Negate, E::number(4))), E::number(-4));
    assert_eq!(fold_expression(&E::binary(B::GreaterEqual, E::number(3), E::number(3))), E::boolean(true));
    assert_eq!(fold_expression(&E::binary(B::Less, E::number(3), E::number(3))), E::boolean(false));
    assert_eq!(fold_expression(&E::binary(B::Or, E::boolean(false), E::boolean(false))), E::boolean(false));
}

#[test]
fn nested_constants() {
    let expr = E::binary(B::Multiply, E::binary(B::Add, E::number(2), E::number(3)), E::number(4));
    assert_eq!(fold_expression(&expr), E::number(20));

    let expr = E::binary(B::Greater, E::binary(B::Multiply, x(), E::number(1)), E::binary(B::Add, E::number(1), E::number(1)));
    assert_eq!(fold_expression(&expr), E::binary(B::Greater, x(), E::number(2)));
}

#[test]
fn unfoldable_constants_stay() {
    let by_zero = E::binary(B::Divide, E::number(7), E::number(0));
    assert_eq!(fold_expression(&by_zero), by_zero);

    let overflow = E::binary(B::Multiply, E::number(i64::MAX), E::number(2));
    assert_eq!(fold_expression(&overflow), overflow);

    let mismatched = E::binary(B::Subtract, E::string("a"), E::boolean(true));
    assert_eq!(fold_expression(&mismatched), mismatched);
}

#[test]
fn equality_and_concat() {
    assert_eq!(fold_expression(&E::binary(B::Equal, E::string("a"), E::string("a"))), E::boolean(true));
    assert_eq!(fold_expression(&E::binary(B::Equal, E::number(1), E::string("1"))), E::boolean(false));
    assert_eq!(fold_expression(&E::binary(B::NotEqual, E::null(), E::null())), E::boolean(false));

    assert_eq!(fold_expression(&E::binary(B::Concat, E::string("n="), E::number(3))), E::string("n=3"));
    assert_eq!(fold_expression(&E::binary(B::Concat, E::boolean(true), E::null())), E::string("truenull"));
}

#[test]
fn self_comparison() {
    let cases = [
        (B::Equal, true),
        (B::NotEqual, false),
        (B::Greater, false),
        (B::Less, false),
        (B::GreaterEqual, true),
        (B::LessEqual, true),
    ];

    for (op, expected) in cases {
        assert_eq!(fold_expression(&E::binary(op, x(), x())), E::boolean(expected), "{op:?}");
    }

    let different = E::binary(B::Equal, x(), E::symbol("y"));
    assert_eq!(fold_expression(&different), different);
}

#[test]
fn algebraic_identities() {
    let t = E::boolean(true);
    let f = E::boolean(false);

    let cases = [
        (E::binary(B::Add, E::number(0), x()), x()),
        (E::binary(B::Add, x(), E::number(0)), x()),
        (E::binary(B::Add, E::number(1), x()), E::unary(U::Increment, x())),
        (E::binary(B::Add, x(), E::number(1)), E::unary(U::Increment, x())),
        (E::binary(B::Subtract, E::number(0), x()), E::unary(U::Negate, x())),
        (E::binary(B::Subtract, x(), E::number(0)), x()),
        (E::binary(B::Subtract, x(), E::number(1)), E::unary(U::Decrement, x())),
        (E::binary(B::Multiply, E::number(0), x()), E::number(0)),
        (E::binary(B::Multiply, x(), E::number(0)), E::number(0)),
        (E::binary(B::Multiply, E::number(1), x()), x()),
        (E::binary(B::Multiply, x(), E::number(1)), x()),
        (E::binary(B::Divide, E::number(0), x()), E::number(0)),
        (E::binary(B::Divide, x(), E::number(1)), x()),
        (E::binary(B::And, t.clone(), x()), x()),
        (E::binary(B::And, x(), t.clone()), x()),
        (E::binary(B::And, f.clone(), x()), f.clone()),
        (E::binary(B::And, x(), f.clone()), f.clone()),
        (E::binary(B::Or, t.clone(), x()), t.clone()),
        (E::binary(B::Or, x(), t.clone()), t.clone()),
        (E::binary(B::Or, f.clone(), x()), x()),
        (E::binary(B::Or, x(), f.clone()), x()),
    ];

    for (expr, expected) in cases {
        assert_eq!(fold_expression(&expr), expected, "{expr:?}");
    }
}

#[test]
fn negation() {
    let pairs = [
        (B::Equal, B::NotEqual),
        (B::NotEqual, B::Equal),
        (B::Greater, B::LessEqual),
        (B::LessEqual, B::Greater),
        (B::Less, B::GreaterEqual),
        (B::GreaterEqual, B::Less),
    ];

    for (op, negated) in pairs {
        let expr = E::unary(U::Not, E::binary(op, x(), E::symbol("y")));
        assert_eq!(fold_expression(&expr), E::binary(negated, x(), E::symbol("y")));
    }

    assert_eq!(fold_expression(&E::unary(U::Negate, E::unary(U::Negate, x()))), x());
    assert_eq!(fold_expression(&E::binary(B::Subtract, E::number(0), E::unary(U::Negate, x()))), x());

    // Decrement is not negation.
    let decrements = E::unary(U::Decrement, E::unary(U::Decrement, x()));
    assert_eq!(fold_expression(&decrements), decrements);

    // Not over something that is not a comparison stays.
    let not_and = E::unary(U::Not, E::binary(B::And, x(), E::symbol("y")));
    assert_eq!(fold_expression(&not_and), not_and);
}

#[test]
fn empty_consequent_flips_condition() {
    let statement = Statement::Conditional {
        cond: E::binary(B::Greater, x(), E::number(3)),
        consequent: Box::new(Statement::StatementBlock(vec![Statement::StatementBlock(vec![])])),
        alternate: Some(Box::new(assign("y", 1))),
    };

    let expected = Statement::Conditional {
        cond: E::binary(B::LessEqual, x(), E::number(3)),
        consequent: Box::new(assign("y", 1)),
        alternate: None,
    };

    let folded = fold_statement(&statement);
    assert_eq!(folded, expected);
    assert_eq!(fold_statement(&folded), folded);

    let symbol_cond = Statement::Conditional {
        cond: x(),
        consequent: Box::new(Statement::StatementBlock(vec![])),
        alternate: Some(Box::new(assign("y", 1))),
    };
    assert_eq!(
        fold_statement(&symbol_cond),
        Statement::Conditional { cond: E::unary(U::Not, x()), consequent: Box::new(assign("y", 1)), alternate: None }
    );
}

#[test]
fn empty_branches() {
    let nothing = Statement::Conditional {
        cond: x(),
        consequent: Box::new(Statement::StatementBlock(vec![])),
        alternate: Some(Box::new(Statement::StatementBlock(vec![]))),
    };
    assert_eq!(fold_statement(&nothing), Statement::StatementBlock(vec![]));

    let empty_else = Statement::Conditional {
        cond: x(),
        consequent: Box::new(assign("y", 1)),
        alternate: Some(Box::new(Statement::StatementBlock(vec![]))),
    };
    assert_eq!(
        fold_statement(&empty_else),
        Statement::Conditional { cond: x(), consequent: Box::new(assign("y", 1)), alternate: None }
    );
}

#[test]
fn statements_fold_their_expressions() {
    let statement = Statement::Loop {
        cond: E::binary(B::Less, x(), E::binary(B::Add, E::number(2), E::number(2))),
        consequent: Box::new(Statement::Assignment { name: "x".to_string(), value: E::binary(B::Add, x(), E::number(1)) }),
    };

    assert_eq!(
        fold_statement(&statement),
        Statement::Loop {
            cond: E::binary(B::Less, x(), E::number(4)),
            consequent: Box::new(Statement::Assignment { name: "x".to_string(), value: E::unary(U::Increment, x()) }),
        }
    );
}

#[test]
fn paragraph_text() {
    let script = fold(&build("# a\nYou   have `1 + 2`\ncoins, `name`.  \nBye `\"now\"`  \n"));

    assert_eq!(
        script.nodes[0].body,
        vec![BlockElement::Paragraph(vec![
            Inline::Text("You have 3 coins, ".to_string()),
            Inline::InlineCode(E::symbol("name")),
            Inline::Text(". Bye now".to_string()),
        ])]
    );
}

#[test]
fn paragraph_ending_in_code() {
    let script = fold(&build("# a\nHi `name`\n"));

    // The line break after the code collapses to a space, which is then trimmed away.
    assert_eq!(
        script.nodes[0].body,
        vec![BlockElement::Paragraph(vec![Inline::Text("Hi ".to_string()), Inline::InlineCode(E::symbol("name"))])]
    );

    let script = fold(&build("# a\nhello\n"));
    assert_eq!(script.nodes[0].body, vec![BlockElement::Paragraph(vec![Inline::Text("hello".to_string())])]);
}

#[test]
fn fold_keeps_structure() {
    let script = build("```\nextern say(string);\n```\n# a\n```\nsay(\"x\" . 1);\n```\n[b](on)\n\n# b\nhi\n");
    let folded = fold(&script);

    assert_eq!(folded.functions, script.functions);
    assert_eq!(node_names(&folded), vec!["a", "b"]);
    assert_eq!(
        folded.nodes[0].body[0],
        BlockElement::CodeBlock(vec![Statement::FunctionCall { name: "say".to_string(), args: vec![E::string("x1")] }])
    );
}

/* Pruning */

#[test]
fn unreachable_nodes_are_dropped() {
    let script = Script {
        nodes: vec![node("abc", vec![link("def")]), node("def", vec![]), node("ghi", vec![])],
        ..Script::default()
    };

    assert_eq!(node_names(&prune(&script)), vec!["abc", "def"]);
}

#[test]
fn statements_after_goto_are_dropped() {
    let script = Script {
        nodes: vec![node("a", vec![BlockElement::CodeBlock(vec![assign("x", 1), goto("a"), assign("y", 2), assign("z", 3)])])],
        ..Script::default()
    };

    assert_eq!(prune(&script).nodes[0].body, vec![BlockElement::CodeBlock(vec![assign("x", 1), goto("a")])]);
}

#[test]
fn blocks_after_transfer_are_dropped() {
    let paragraph = BlockElement::Paragraph(vec![Inline::Text("hi".to_string())]);
    let options = BlockElement::Option(vec![Link { dest: "a".to_string(), text: "again".to_string() }]);

    let script = Script {
        nodes: vec![
            node("a", vec![paragraph.clone(), link("b"), paragraph.clone(), link("c")]),
            node("b", vec![options.clone(), link("c")]),
            node("c", vec![]),
        ],
        ..Script::default()
    };

    let pruned = prune(&script);
    assert_eq!(node_names(&pruned), vec!["a", "b"]);
    assert_eq!(pruned.nodes[0].body, vec![paragraph, link("b")]);
    assert_eq!(pruned.nodes[1].body, vec![options]);
}

#[test]
fn terminating_code_block_ends_node() {
    let script = Script {
        nodes: vec![node("a", vec![BlockElement::CodeBlock(vec![goto("a")]), link("b")]), node("b", vec![])],
        ..Script::default()
    };

    let pruned = prune(&script);
    assert_eq!(pruned.nodes[0].body, vec![BlockElement::CodeBlock(vec![goto("a")])]);
    assert_eq!(node_names(&pruned), vec!["a"]);

    // Links and option lists are not the only things that end a node. A code
    // block that always jumps ends it too, so the link after it is dead, and so
    // is `c`, which only that link reached.
    let script = Script {
        nodes: vec![
            node("a", vec![BlockElement::CodeBlock(vec![goto("b")]), link("c")]),
            node("b", vec![]),
            node("c", vec![]),
        ],
        ..Script::default()
    };

    let pruned = prune(&script);
    assert_eq!(pruned.nodes[0].body, vec![BlockElement::CodeBlock(vec![goto("b")])]);
    assert_eq!(node_names(&pruned), vec!["a", "b"]);
}

#[test]
fn conditionals_terminate_only_when_both_branches_do() {
    let both = Statement::Conditional {
        cond: x(),
        consequent: Box::new(goto("b")),
        alternate: Some(Box::new(Statement::StatementBlock(vec![assign("y", 1), goto("c"), assign("y", 2)]))),
    };
    let one = Statement::Conditional { cond: x(), consequent: Box::new(goto("b")), alternate: None };

    let script = Script {
        nodes: vec![
            node("a", vec![BlockElement::CodeBlock(vec![one.clone(), assign("z", 1), both, assign("z", 2)])]),
            node("b", vec![]),
            node("c", vec![]),
        ],
        ..Script::default()
    };

    let pruned_both = Statement::Conditional {
        cond: x(),
        consequent: Box::new(goto("b")),
        alternate: Some(Box::new(Statement::StatementBlock(vec![assign("y", 1), goto("c")]))),
    };

    let pruned = prune(&script);
    assert_eq!(pruned.nodes[0].body, vec![BlockElement::CodeBlock(vec![one, assign("z", 1), pruned_both])]);
    assert_eq!(node_names(&pruned), vec!["a", "b", "c"]);
}

#[test]
fn constant_loops() {
    let forever = Statement::Loop { cond: E::boolean(true), consequent: Box::new(assign("x", 1)) };
    let never = Statement::Loop { cond: E::boolean(false), consequent: Box::new(goto("b")) };
    let maybe = Statement::Loop { cond: x(), consequent: Box::new(goto("b")) };

    let script = Script {
        nodes: vec![
            node("a", vec![BlockElement::CodeBlock(vec![never, maybe.clone(), forever, assign("y", 2)])]),
            node("b", vec![]),
        ],
        ..Script::default()
    };

    let pruned = prune(&script);
    assert_eq!(
        pruned.nodes[0].body,
        vec![BlockElement::CodeBlock(vec![
            maybe,
            Statement::InfiniteLoop { consequent: Box::new(assign("x", 1)) },
        ])]
    );
    assert_eq!(node_names(&pruned), vec!["a", "b"]);
}

#[test]
fn nested_blocks_are_flattened() {
    let script = Script {
        nodes: vec![node(
            "a",
            vec![BlockElement::CodeBlock(vec![Statement::StatementBlock(vec![
                assign("x", 1),
                Statement::StatementBlock(vec![goto("a"), assign("y", 1)]),
            ]), assign("z", 1)])],
        )],
        ..Script::default()
    };

    assert_eq!(prune(&script).nodes[0].body, vec![BlockElement::CodeBlock(vec![assign("x", 1), goto("a")])]);
}

#[test]
fn reachability_is_transitive() {
    let script = build(concat!(
        "# start\nhi\n\n```\nif (seen == other) { goto middle; }\n```\n\n",
        "# other\nnobody links here\n\n",
        "# middle\n- [end](finish)\n- [start](again)\n\n",
        "# end\nbye\n",
    ));

    // `other` only shows up as a variable name, which does not count.
    assert_eq!(node_names(&prune(&script)), vec!["start", "middle", "end"]);
}

#[test]
fn dangling_references() {
    let script = build("```\nextern say(string);\n```\n# start\nhello\n[next](Go)\n");
    let pruned = prune(&script);

    assert_eq!(node_names(&pruned), vec!["start"]);
    assert_eq!(undefined_nodes(&pruned), vec!["next".to_string()]);

    let script = build("# a\n```\ngoto b; \n```\n\n# b\n- [c]()\n- [a]()\n- [c](twice)\n");
    assert_eq!(undefined_nodes(&script), vec!["c".to_string()]);
}

#[test]
fn empty_script() {
    assert_eq!(prune(&Script::default()), Script::default());
    assert!(undefined_nodes(&Script::default()).is_empty());
}
