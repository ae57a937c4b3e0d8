// SPDX-License-Identifier: AGPL-3.0-or-later
//! Display projection: document -> flat native blocks
//!
//! Lossy by contract. Link targets are dropped, and a list item keeps only
//! the text of its first block child.

use crate::ast::{Document, NativeBlock, NativeKind, Node, TextSegment};

/// Project every top-level node into a display block
pub fn project_native(doc: &Document) -> Vec<NativeBlock> {
    doc.content.iter().map(project_block).collect()
}

fn project_block(node: &Node) -> NativeBlock {
    match node {
        Node::BulletList { content } => list(NativeKind::BulletList, content),
        Node::OrderedList { content } => list(NativeKind::OrderedList, content),
        Node::ListItem { .. } => list_item(node),
        Node::Heading { level, .. } => NativeBlock {
            level: Some(*level),
            ..flat(NativeKind::Heading, node)
        },
        Node::Paragraph { .. } | Node::Text { .. } | Node::Unknown { .. } => flat(NativeKind::Paragraph, node),
        Node::Blockquote { .. } => flat(NativeKind::Blockquote, node),
        Node::CodeBlock { .. } => flat(NativeKind::CodeBlock, node),
        Node::HardBreak => NativeBlock::new(NativeKind::HardBreak),
        Node::HorizontalRule => NativeBlock::new(NativeKind::HorizontalRule),
        Node::Table { .. } | Node::TableRow { .. } | Node::TableCell { .. } | Node::TableHeader { .. } => {
            flat(NativeKind::Table, node)
        }
    }
}

/// One level of list items as nested blocks
fn list(kind: NativeKind, items: &[Node]) -> NativeBlock {
    NativeBlock {
        children: items
            .iter()
            .filter(|item| matches!(item, Node::ListItem { .. }))
            .map(list_item)
            .collect(),
        ..NativeBlock::new(kind)
    }
}

fn list_item(item: &Node) -> NativeBlock {
    NativeBlock {
        segments: item.children().first().map(segments).unwrap_or_default(),
        ..NativeBlock::new(NativeKind::ListItem)
    }
}

fn flat(kind: NativeKind, node: &Node) -> NativeBlock {
    NativeBlock {
        segments: segments(node),
        ..NativeBlock::new(kind)
    }
}

/// Every descendant text leaf in document order, one segment each.
/// Hard breaks become a `\n` segment.
fn segments(node: &Node) -> Vec<TextSegment> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        match node {
            Node::Text { text, marks } => out.push(TextSegment::from_marks(text.as_str(), marks)),
            Node::HardBreak => out.push(TextSegment::plain("\n")),
            other => stack.extend(other.children().iter().rev()),
        }
    }
    out
}
