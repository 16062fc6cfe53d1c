//! Tests for the parsing engine and the grammar.

use super::syntax_tree::{Block, Expression, Inline, Statement};
use super::*;

use crate::token::lex;

use std::io::Read;
use std::rc::Rc;

use test_generator::test_resources;

fn read_file(resource: &str) -> String {
    let mut file = std::fs::File::open(resource).expect("File opens");
    let mut input = String::new();
    file.read_to_string(&mut input).expect("Read successful");
    input
}

fn parse_str(input: &str) -> Result<syntax_tree::Script, ParseError> {
    parse(&lex(input), &GRAMMAR)
}

/// Parses a lone expression, written as it would be inside inline code.
fn parse_expr(input: &str) -> Expression {
    let tokens = lex(&format!("`{input}`"));

    // Skip the opening backtick; the expression stops at the closing one.
    parse_rule(&tokens[1..], &GRAMMAR, "expression").unwrap().get().unwrap()
}

/// Renders an expression fully parenthesized, to make shapes easy to compare.
fn shape(expr: &Expression) -> String {
    match expr {
        Expression::BinaryExpression { left, operator, right } => {
            format!("({} {} {})", shape(left), operator.text, shape(right))
        }
        Expression::UnaryExpression { operator, operand } => format!("{}{}", operator.text, shape(operand)),
        Expression::Literal(token) => token.text.clone(),
        Expression::NestedExpression { expression, .. } => shape(expression),
    }
}

#[test_resources("samples/successful/**/*.cq")]
fn samples_parse_and_keep_tokens(resource: &str) {
    let input = read_file(resource);
    let tokens = lex(&input);

    let script = parse(&tokens, &GRAMMAR).unwrap();

    let kept: Vec<&Token> = tokens.iter().filter(|token| !token.is_trivia()).collect();
    assert_eq!(script.tokens(), kept);
}

#[test]
fn end_to_end_shape() {
    let script = parse_str("```\nextern say(string);\n```\n# start\nhello\n[next](Go)\n").unwrap();

    let front_matter = script.front_matter.as_ref().expect("Has front matter");
    assert_eq!(front_matter.items.len(), 1);

    assert_eq!(script.nodes.len(), 1);
    let node = &script.nodes[0];
    assert_eq!(node.header.name.text, "start");
    assert_eq!(node.blocks.len(), 2);

    assert!(matches!(&node.blocks[0].0, Block::Paragraph { lines } if lines.len() == 1));
    assert!(matches!(&node.blocks[1].0, Block::LinkBlock { link, .. } if link.dest.text == "next"));
}

#[test]
fn blank_lines_between_blocks() {
    let script = parse_str("# a\n\nfirst\nstill first\n\n\n- [b](one)\n- [c]()\n\n```\ngoto b;\n```\n").unwrap();
    let blocks: Vec<_> = script.nodes[0].blocks.iter().map(|(block, _)| block).collect();

    assert_eq!(blocks.len(), 3);
    assert!(matches!(blocks[0], Block::Paragraph { lines } if lines.len() == 2));
    assert!(matches!(blocks[1], Block::List { items } if items.len() == 2 && items[1].link.text.is_none()));
    assert!(matches!(blocks[2], Block::CodeBlock { statements, .. } if statements.len() == 1));
}

#[test]
fn inline_code_in_paragraph() {
    let script = parse_str("# a\nYou have `gold` coins.\n").unwrap();

    let Block::Paragraph { lines } = &script.nodes[0].blocks[0].0 else { panic!("Expected paragraph") };
    let inlines = &lines[0].inlines;

    assert_eq!(inlines.len(), 3);
    assert!(matches!(&inlines[1], Inline::InlineCode { expression: Expression::Literal(token), .. } if token.text == "gold"));
}

#[test]
fn statements() {
    let script = parse_str(concat!(
        "# a\n```\n",
        "{ x = 1; }\n",
        "say(\"hi\", x + 1);\n",
        "goto b;\n",
        "if (x > 1) x = 2; else { x = 3; }\n",
        "if (x) goto b;\n",
        "while (x < 10) x = x + 1;\n",
        "done();\n",
        "```\n",
    ))
    .unwrap();

    let Block::CodeBlock { statements, .. } = &script.nodes[0].blocks[0].0 else { panic!("Expected code") };

    assert!(matches!(&statements[0], Statement::StatementBlock { statements, .. } if statements.len() == 1));
    assert!(matches!(&statements[1], Statement::FunctionCall { arguments, commas, .. }
        if arguments.len() == 2 && commas.len() == 1));
    assert!(matches!(&statements[2], Statement::Goto { dest, .. } if dest.text == "b"));
    assert!(matches!(&statements[3], Statement::ConditionalWithElse { .. }));
    assert!(matches!(&statements[4], Statement::Conditional { .. }));
    assert!(matches!(&statements[5], Statement::Loop { .. }));
    assert!(matches!(&statements[6], Statement::FunctionCall { arguments, .. } if arguments.is_empty()));
}

#[test]
fn precedence() {
    assert_eq!(shape(&parse_expr("1+2*3")), "(1 + (2 * 3))");
    assert_eq!(shape(&parse_expr("a&&!b||!c&&d")), "((a && !b) || (!c && d))");
    assert_eq!(shape(&parse_expr("a == b > c . d")), "(a == (b > (c . d)))");
    assert_eq!(shape(&parse_expr("-x % 2 != 0")), "((-x % 2) != 0)");
    assert_eq!(shape(&parse_expr("(1 + 2) * 3")), "((1 + 2) * 3)");
}

#[test]
fn right_associative() {
    assert_eq!(shape(&parse_expr("a - b - c")), "(a - (b - c))");
    assert_eq!(shape(&parse_expr("a / b * c")), "(a / (b * c))");
    assert_eq!(shape(&parse_expr("!!x")), "!!x");
}

#[test]
fn deterministic() {
    let tokens = lex("# a\nHi `name . \"!\"`\n```\nif (a && b) goto a; else x = -1;\n```\n");

    assert_eq!(parse(&tokens, &GRAMMAR), parse(&tokens, &GRAMMAR));
}

#[test]
fn long_operator_chain() {
    const OPERATORS: usize = 10_000;

    let input = format!("# a\n```\ny = x{};\n```\n", " + x".repeat(OPERATORS));
    let tokens = lex(&input);
    let script = parse(&tokens, &GRAMMAR).unwrap();

    let Block::CodeBlock { statements, .. } = &script.nodes[0].blocks[0].0 else {
        panic!("Expected a code block");
    };
    let Statement::Assignment { value, .. } = &statements[0] else {
        panic!("Expected an assignment");
    };

    let mut depth = 0;
    let mut expr = value;
    while let Expression::BinaryExpression { right, .. } = expr {
        depth += 1;
        expr = right.as_ref();
    }
    assert_eq!(depth, OPERATORS);
    assert!(matches!(expr, Expression::Literal(token) if token.text == "x"));

    assert_eq!(script.tokens().len(), tokens.iter().filter(|token| !token.is_trivia()).count());
}

#[test]
fn memo_shares_subtrees() {
    let tokens = lex("`a + b + c`");

    let memo = RefCell::new(Memo::new());
    let tree: Expression = parse_with_memo(&tokens[1..], &GRAMMAR, "expression", &memo).unwrap().get().unwrap();

    let Expression::BinaryExpression { right, .. } = &tree else {
        panic!("Expected a sum, got {tree:?}");
    };
    let Expression::BinaryExpression { left: b_in_tree, .. } = right.as_ref() else {
        panic!("Expected a nested sum, got {right:?}");
    };

    // `b + c` is the term starting at the third token.
    let memo = memo.borrow();
    let Some(Ok(Parsed { value: Value::Expression(Expression::BinaryExpression { left: b_in_memo, .. }), .. })) =
        memo.results.get(&("term", 2))
    else {
        panic!("Expected `b + c` to be memoized");
    };

    assert!(Rc::ptr_eq(b_in_tree, b_in_memo));
}

#[test]
fn shared_memo_gives_stale_results() {
    let first = lex("`1 + 2`");
    let second = lex("`3 * 4`");

    let memo = RefCell::new(Memo::new());
    let stale_first = parse_with_memo(&first[1..], &GRAMMAR, "expression", &memo).unwrap();
    let stale_second = parse_with_memo(&second[1..], &GRAMMAR, "expression", &memo).unwrap();

    let fresh_second = parse_rule(&second[1..], &GRAMMAR, "expression").unwrap();

    // Reusing the memo hands back the first tree for the second input.
    assert_eq!(stale_first, stale_second);
    assert_ne!(stale_second, fresh_second);
}

#[test]
fn left_recursion_is_detected() {
    let grammar = Grammar::empty().with_rule(
        "sum",
        or(vec![
            seq(vec![nonterm("sum"), term(TokenKind::Plus), term(TokenKind::Number)], |values| {
                Some(Value::List(values))
            }),
            term(TokenKind::Number),
        ]),
    );

    let tokens = lex("`1 + 2`");
    let result = parse_rule(&tokens[1..], &grammar, "sum");

    assert_eq!(result, Err(ParseError::LeftRecursion("sum".to_string())));
}

#[test]
fn missing_rule() {
    let grammar = Grammar::empty().with_rule("start", seq(vec![nonterm("missing")], |_| Some(Value::Empty)));

    assert_eq!(parse_rule(&lex(""), &grammar, "start"), Err(ParseError::BadRuleName("missing".to_string())));
    assert_eq!(parse_rule(&lex(""), &grammar, "nope"), Err(ParseError::BadRuleName("nope".to_string())));
}

#[test]
fn rejected_action() {
    let grammar = Grammar::empty().with_rule("start", seq(vec![term(TokenKind::Eof)], |_| None));

    assert!(matches!(parse_rule(&lex(""), &grammar, "start"), Err(ParseError::Internal(_))));
}

#[test]
fn repetition_of_empty_terminates() {
    let grammar = Grammar::empty().with_rule("start", zero_or_more(empty(|_| Some(Value::Empty)), |values| {
        Some(Value::List(values))
    }));

    assert_eq!(parse_rule(&lex(""), &grammar, "start"), Ok(Value::List(vec![Value::Empty])));
}

#[test]
fn ordered_choice() {
    let grammar = Grammar::empty()
        .with_rule("start", or(vec![term(TokenKind::Number), term(TokenKind::Symbol)]))
        .with_rule("strict", one_or_more(term(TokenKind::Number), |values| Some(Value::List(values))));

    let tokens = lex("`x`");
    assert_eq!(
        parse_rule(&tokens[1..], &grammar, "start"),
        Ok(Value::Token(Token::new(TokenKind::Symbol, "x")))
    );

    let tokens = lex("`+`");
    assert_eq!(
        parse_rule(&tokens[1..], &grammar, "start"),
        Err(ParseError::NoMatches(Token::new(TokenKind::Plus, "+")))
    );
    assert_eq!(parse_rule(&lex(""), &grammar, "start"), Err(ParseError::UnexpectedEof));

    assert_eq!(
        parse_rule(&tokens[1..], &grammar, "strict"),
        Err(ParseError::TokenMismatch { expected: TokenKind::Number, found: Token::new(TokenKind::Plus, "+") })
    );
}

#[test]
fn syntax_errors() {
    assert_eq!(parse_str("# a\n"), Err(ParseError::UnexpectedEof));
    assert!(matches!(parse_str("# a\n```\nx = ;\n```\n"), Err(ParseError::NoMatches(_))));
    assert!(parse_str("just text\n").is_err());
    assert!(parse_str("```\nextern f(number)\n```\n# a\nhi\n").is_err());
}
