// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document model -> markup
//!
//! The inverse of the builder. Marks are always written in canonical order
//! (bold, italic, underline, strike, code, link), outermost first, whatever
//! order a stored node lists them in.

use super::escape::escape;
use crate::ast::{Document, Mark, Node};
use crate::traits::RenderConfig;

/// Serialize a whole document
pub fn serialize(doc: &Document, config: &RenderConfig) -> String {
    let mut out = String::new();
    for node in &doc.content {
        write_node(&mut out, node, 0, config);
    }
    out
}

/// Serialize a single node and its subtree
pub fn serialize_node(node: &Node, config: &RenderConfig) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0, config);
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize, config: &RenderConfig) {
    match node {
        Node::Text { text, marks } => write_text(out, text, marks),
        Node::HardBreak => out.push_str("<br>"),
        Node::HorizontalRule => out.push_str("<hr>"),
        Node::CodeBlock { .. } => {
            out.push_str("<pre><code>");
            out.push_str(&escape(&node.plain_text()));
            out.push_str("</code></pre>");
        }
        container if depth >= config.max_depth => write_leaves(out, container),
        Node::Paragraph { content } => write_container(out, "p", content, depth, config),
        Node::Heading { level, content } => {
            let tag = format!("h{}", (*level).clamp(1, 6));
            write_container(out, &tag, content, depth, config);
        }
        Node::BulletList { content } => write_container(out, "ul", content, depth, config),
        Node::OrderedList { content } => write_container(out, "ol", content, depth, config),
        Node::ListItem { content } => write_list_item(out, content, depth, config),
        Node::Blockquote { content } => write_container(out, "blockquote", content, depth, config),
        Node::Table { content } => write_container(out, "table", content, depth, config),
        Node::TableRow { content } => write_container(out, "tr", content, depth, config),
        Node::TableCell { content } => write_container(out, "td", content, depth, config),
        Node::TableHeader { content } => write_container(out, "th", content, depth, config),
        // No tag of its own; the children stand in for it
        Node::Unknown { content, .. } => write_children(out, content, depth, config),
    }
}

/// Past the depth limit a container loses its tags but keeps its text
/// leaves, their marks and its hard breaks
fn write_leaves(out: &mut String, node: &Node) {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        match node {
            Node::Text { text, marks } => write_text(out, text, marks),
            Node::HardBreak => out.push_str("<br>"),
            other => stack.extend(other.children().iter().rev()),
        }
    }
}

fn write_container(out: &mut String, tag: &str, content: &[Node], depth: usize, config: &RenderConfig) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_children(out, content, depth, config);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_children(out: &mut String, content: &[Node], depth: usize, config: &RenderConfig) {
    for child in content {
        write_node(out, child, depth + 1, config);
    }
}

/// `<li>` without the wrapping `<p>` of its leading paragraph, when dropping
/// it cannot change what the builder reads back
fn write_list_item(out: &mut String, content: &[Node], depth: usize, config: &RenderConfig) {
    out.push_str("<li>");
    match content.split_first() {
        Some((Node::Paragraph { content: inline }, rest))
            if depth + 1 < config.max_depth && can_unwrap(inline, rest) =>
        {
            write_children(out, inline, depth + 1, config);
            write_children(out, rest, depth, config);
        }
        _ => write_children(out, content, depth, config),
    }
    out.push_str("</li>");
}

/// Bare inline content inside `<li>` is trimmed and gathered into a
/// paragraph together with any following `<br>`, so only unwrap a paragraph
/// whose content survives that untouched
fn can_unwrap(inline: &[Node], rest: &[Node]) -> bool {
    if matches!(rest.first(), Some(Node::HardBreak | Node::Text { .. })) {
        return false;
    }
    match (inline.first(), inline.last()) {
        (None, None) => rest.is_empty(),
        (Some(Node::Text { text: first, .. }), Some(Node::Text { text: last, .. })) => {
            !first.is_empty()
                && !last.is_empty()
                && !first.starts_with(char::is_whitespace)
                && !last.ends_with(char::is_whitespace)
        }
        _ => false,
    }
}

fn write_text(out: &mut String, text: &str, marks: &[Mark]) {
    let mut ordered: Vec<&Mark> = marks.iter().collect();
    ordered.sort_by(|a, b| a.cmp_rank(b));
    ordered.dedup_by(|a, b| a.rank() == b.rank());

    for mark in &ordered {
        open_mark(out, mark);
    }
    out.push_str(&escape(text));
    for mark in ordered.iter().rev() {
        close_mark(out, mark);
    }
}

fn mark_tag(mark: &Mark) -> &'static str {
    match mark {
        Mark::Bold => "strong",
        Mark::Italic => "em",
        Mark::Underline => "u",
        Mark::Strike => "s",
        Mark::Code => "code",
        Mark::Link { .. } => "a",
    }
}

fn open_mark(out: &mut String, mark: &Mark) {
    match mark {
        Mark::Link { href } => {
            out.push_str("<a href=\"");
            out.push_str(&escape(href));
            out.push_str("\">");
        }
        other => {
            out.push('<');
            out.push_str(mark_tag(other));
            out.push('>');
        }
    }
}

fn close_mark(out: &mut String, mark: &Mark) {
    out.push_str("</");
    out.push_str(mark_tag(mark));
    out.push('>');
}
