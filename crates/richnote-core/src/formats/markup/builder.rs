// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parse tree -> document model
//!
//! Tag names dispatch to node constructors. Children are built in one of
//! two contexts:
//!
//! - block context (document root, blockquote, list item): block tags make
//!   block nodes, and runs of inline content are gathered into paragraphs.
//!   Whitespace at the edges of a run is insignificant and trimmed.
//! - inline context (paragraph, heading, inline tags): text is kept
//!   verbatim, formatting tags add marks, and block tags are flattened to
//!   their inline content.
//!
//! Adjacent text leaves with equal marks are merged, and mark sets are kept
//! in canonical order, so building from serialized output reproduces the
//! same tree.
//!
//! The serializer writes a `<p>` for every paragraph, including ones the
//! builder gathered from bare inline content, and one tag per mark. Marks
//! that would put the serialized tags deeper than the element limit are
//! not applied, so what is built always reads back unchanged.

use super::tokenizer::ParsedElement;
use crate::ast::{insert_mark, Document, Mark, Node};
use crate::traits::DEFAULT_MAX_DEPTH;

/// Tag dispatch target
enum TagKind {
    Paragraph,
    Heading(u8),
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    HardBreak,
    HorizontalRule,
    Div,
    Mark(Mark),
    Link,
    Unknown,
}

impl TagKind {
    /// `tag` is already lowercased by the tokenizer
    fn of(tag: &str) -> Self {
        match tag {
            "p" => TagKind::Paragraph,
            "h1" => TagKind::Heading(1),
            "h2" => TagKind::Heading(2),
            "h3" => TagKind::Heading(3),
            "h4" => TagKind::Heading(4),
            "h5" => TagKind::Heading(5),
            "h6" => TagKind::Heading(6),
            "ul" => TagKind::BulletList,
            "ol" => TagKind::OrderedList,
            "li" => TagKind::ListItem,
            "blockquote" => TagKind::Blockquote,
            "pre" => TagKind::CodeBlock,
            "br" => TagKind::HardBreak,
            "hr" => TagKind::HorizontalRule,
            "div" => TagKind::Div,
            "strong" | "b" => TagKind::Mark(Mark::Bold),
            "em" | "i" => TagKind::Mark(Mark::Italic),
            "u" => TagKind::Mark(Mark::Underline),
            "s" | "strike" => TagKind::Mark(Mark::Strike),
            "code" => TagKind::Mark(Mark::Code),
            "a" => TagKind::Link,
            _ => TagKind::Unknown,
        }
    }
}

/// Build a document from a parse tree. The result always has content.
pub fn build(elements: &[ParsedElement]) -> Document {
    build_with(elements, DEFAULT_MAX_DEPTH)
}

/// Build for a tree parsed with element limit `max_depth`
pub fn build_with(elements: &[ParsedElement], max_depth: usize) -> Document {
    Document::new(build_blocks(elements, max_depth))
}

/// Build children in block context. `room` is how many more tags may nest
/// here once serialized.
fn build_blocks(elements: &[ParsedElement], room: usize) -> Vec<Node> {
    let inner = room.saturating_sub(1);
    let mut blocks = BlockCollector::default();

    for element in elements {
        let (tag, children) = match element {
            ParsedElement::Text(text) => {
                blocks.push_inline(vec![Node::text(text.as_str())]);
                continue;
            }
            ParsedElement::Element { tag, children, .. } => (tag, children),
        };

        match TagKind::of(tag) {
            TagKind::Paragraph => blocks.push_block(Node::Paragraph {
                content: build_inline_content(children, &[], inner),
            }),
            TagKind::Heading(level) => blocks.push_block(Node::Heading {
                level,
                content: build_inline_content(children, &[], inner),
            }),
            TagKind::BulletList => blocks.push_block(Node::BulletList {
                content: build_list_items(children, inner),
            }),
            TagKind::OrderedList => blocks.push_block(Node::OrderedList {
                content: build_list_items(children, inner),
            }),
            TagKind::ListItem => blocks.push_block(build_list_item(children, inner)),
            TagKind::Blockquote => blocks.push_block(Node::Blockquote {
                content: build_blocks(children, inner),
            }),
            TagKind::CodeBlock => blocks.push_block(build_code_block(children)),
            TagKind::HardBreak => blocks.push_break(),
            TagKind::HorizontalRule => blocks.push_block(Node::HorizontalRule),
            TagKind::Div => {
                let content = build_inline_content(children, &[], inner);
                if content.iter().any(has_text) {
                    blocks.push_block(Node::Paragraph { content });
                }
            }
            TagKind::Mark(_) | TagKind::Link | TagKind::Unknown => {
                // gathered into a paragraph, which takes one level
                blocks.push_inline(build_inline(element, &[], inner));
            }
        }
    }

    blocks.finish()
}

/// Gathers block nodes, turning runs of inline nodes into paragraphs
#[derive(Default)]
struct BlockCollector {
    blocks: Vec<Node>,
    run: Vec<Node>,
}

impl BlockCollector {
    fn push_block(&mut self, node: Node) {
        self.flush();
        self.blocks.push(node);
    }

    fn push_inline(&mut self, nodes: Vec<Node>) {
        for node in nodes {
            if self.run.is_empty() {
                // Leading whitespace of a run is layout, not content
                match node {
                    Node::Text { text, marks } => {
                        let trimmed = text.trim_start();
                        if !trimmed.is_empty() {
                            self.run.push(Node::Text {
                                text: trimmed.to_string(),
                                marks,
                            });
                        }
                    }
                    other => self.run.push(other),
                }
            } else {
                self.run.push(node);
            }
        }
    }

    /// A `br` joins an open inline run, otherwise it stands as a block
    fn push_break(&mut self) {
        if self.run.is_empty() {
            self.blocks.push(Node::HardBreak);
        } else {
            self.run.push(Node::HardBreak);
        }
    }

    fn flush(&mut self) {
        let mut run = std::mem::take(&mut self.run);

        // Trailing whitespace of a run is layout too
        while let Some(Node::Text { text, .. }) = run.last_mut() {
            let trimmed_len = text.trim_end().len();
            if trimmed_len > 0 {
                text.truncate(trimmed_len);
                break;
            }
            run.pop();
        }

        if !run.is_empty() {
            self.blocks.push(Node::Paragraph {
                content: merge_text(run),
            });
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush();
        self.blocks
    }
}

/// List children: only `li` elements survive
fn build_list_items(children: &[ParsedElement], room: usize) -> Vec<Node> {
    children
        .iter()
        .filter_map(|child| match child {
            ParsedElement::Element { tag, children, .. } if tag == "li" => {
                Some(build_list_item(children, room.saturating_sub(1)))
            }
            _ => None,
        })
        .collect()
}

/// A list item holds blocks; bare inline content is wrapped in a paragraph
fn build_list_item(children: &[ParsedElement], room: usize) -> Node {
    let mut content = build_blocks(children, room);
    if content.is_empty() {
        content.push(Node::Paragraph {
            content: Vec::new(),
        });
    }
    Node::ListItem { content }
}

/// `pre` content is flattened, never parsed, into one unmarked text node
fn build_code_block(children: &[ParsedElement]) -> Node {
    Node::CodeBlock {
        content: vec![Node::text(flatten_text(children, "\n"))],
    }
}

/// Build children in inline context with merged text runs. At most
/// `mark_room` distinct marks are applied to any leaf.
fn build_inline_content(children: &[ParsedElement], marks: &[Mark], mark_room: usize) -> Vec<Node> {
    let nodes = children
        .iter()
        .flat_map(|child| build_inline(child, marks, mark_room))
        .collect();
    merge_text(nodes)
}

/// Build one element in inline context, applying the enclosing marks
fn build_inline(element: &ParsedElement, marks: &[Mark], mark_room: usize) -> Vec<Node> {
    let (tag, children) = match element {
        ParsedElement::Text(text) => return vec![marked_text(text.clone(), marks)],
        ParsedElement::Element { tag, children, .. } => (tag, children),
    };

    let nested = |mark: Option<Mark>| {
        let mut marks = marks.to_vec();
        if let Some(mark) = mark {
            let replaces = marks.iter().any(|m| m.rank() == mark.rank());
            if replaces || marks.len() < mark_room {
                insert_mark(&mut marks, mark);
            }
        }
        children
            .iter()
            .flat_map(|child| build_inline(child, &marks, mark_room))
            .collect::<Vec<_>>()
    };

    match TagKind::of(tag) {
        TagKind::Mark(mark) => nested(Some(mark)),
        TagKind::Link => nested(element.attr("href").map(|href| Mark::Link {
            href: href.to_string(),
        })),
        TagKind::HardBreak => vec![Node::HardBreak],
        TagKind::HorizontalRule => Vec::new(),
        TagKind::Paragraph
        | TagKind::Heading(_)
        | TagKind::BulletList
        | TagKind::OrderedList
        | TagKind::ListItem
        | TagKind::Blockquote
        | TagKind::Div => nested(None),
        TagKind::CodeBlock => non_empty_text(flatten_text(children, "\n"), marks),
        TagKind::Unknown => non_empty_text(flatten_text(children, ""), marks),
    }
}

fn marked_text(text: String, marks: &[Mark]) -> Node {
    Node::Text {
        text,
        marks: marks.to_vec(),
    }
}

fn non_empty_text(text: String, marks: &[Mark]) -> Vec<Node> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![marked_text(text, marks)]
    }
}

/// All descendant text leaves, in document order, joined by `sep`
fn flatten_text(children: &[ParsedElement], sep: &str) -> String {
    let mut leaves = Vec::new();
    let mut stack: Vec<&ParsedElement> = children.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            ParsedElement::Text(text) => leaves.push(text.as_str()),
            ParsedElement::Element { children, .. } => stack.extend(children.iter().rev()),
        }
    }
    leaves.join(sep)
}

/// Merge adjacent text leaves with equal marks and drop empty ones
fn merge_text(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match (merged.last_mut(), node) {
            (_, Node::Text { text, .. }) if text.is_empty() => {}
            (
                Some(Node::Text {
                    text: prev,
                    marks: prev_marks,
                }),
                Node::Text { text, marks },
            ) if *prev_marks == marks => prev.push_str(&text),
            (_, node) => merged.push(node),
        }
    }
    merged
}

fn has_text(node: &Node) -> bool {
    !node.plain_text().trim().is_empty()
}
