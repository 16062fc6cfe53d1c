//! This module handles building [`BlockElements`](BlockElement) from parse trees.

use super::build_expr_ast::build_expr_ast;
use super::build_statement_ast::build_statement_ast;
use super::{BlockElement, Inline, Link};

use crate::error::ASTError;
use crate::parse::syntax_tree as st;

/* Public (to ast) Function that Constructs Blocks */

pub(super) fn build_block_ast(block: &st::Block) -> Result<BlockElement, ASTError> {
    match block {
        st::Block::Paragraph { lines } => build_paragraph(lines),
        st::Block::CodeBlock { statements, .. } => {
            Ok(BlockElement::CodeBlock(statements.iter().map(build_statement_ast).collect::<Result<_, _>>()?))
        }
        st::Block::LinkBlock { link, .. } => Ok(BlockElement::Link(build_link(link))),
        st::Block::List { items } => Ok(BlockElement::Option(items.iter().map(|item| build_link(&item.link)).collect())),
    }
}

/* Functions that Construct Specific Kinds of Blocks */

/// Every source line is followed by a `"\n"` text, so line breaks survive until
/// folding decides what to do with them.
fn build_paragraph(lines: &[st::Line]) -> Result<BlockElement, ASTError> {
    let mut inlines = vec![];

    for line in lines {
        for inline in &line.inlines {
            inlines.push(match inline {
                st::Inline::Text(token) => Inline::Text(token.text.clone()),
                st::Inline::InlineCode { expression, .. } => Inline::InlineCode(build_expr_ast(expression)?),
            });
        }

        inlines.push(Inline::Text("\n".to_string()));
    }

    Ok(BlockElement::Paragraph(inlines))
}

fn build_link(link: &st::Link) -> Link {
    let text = link.text.as_ref().map(|token| unescape_link_text(&token.text)).unwrap_or_default();

    Link { dest: link.dest.text.clone(), text }
}

/// Removes the backslash from `\)` and `\\`. Other backslashes are kept.
fn unescape_link_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());

    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('\\', Some(&next @ (')' | '\\'))) => {
                text.push(next);
                chars.next();
            }
            _ => text.push(ch),
        }
    }

    text
}
