// SPDX-License-Identifier: AGPL-3.0-or-later
//! Plain-text shorthand format handler
//!
//! One line per block: `# ` headings, `- ` or `• ` list items, anything
//! else non-blank is a paragraph and a blank line is an empty paragraph.
//! Consecutive list lines form one bullet list.
//!
//! The mapping is lossy in both directions: inline marks are neither read
//! nor written, and nested structure is flattened to lines.

use crate::ast::{Document, Node, SourceFormat};
use crate::traits::{FormatHandler, ParseConfig, Parser, RenderConfig, Renderer, DEFAULT_MAX_DEPTH};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("heading pattern is valid"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-•]\s+(.*)$").expect("list item pattern is valid"));

/// Plain-text shorthand format handler
pub struct PlainTextHandler;

impl PlainTextHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for PlainTextHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::PlainText
    }

    fn parse(&self, input: &str, _config: &ParseConfig) -> Document {
        decode_text(input)
    }
}

impl Renderer for PlainTextHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::PlainText
    }

    fn render(&self, doc: &Document, config: &RenderConfig) -> String {
        encode_text_with(doc, config.max_depth)
    }
}

impl FormatHandler for PlainTextHandler {
    fn supported_features(&self) -> &[&str] {
        &["paragraph", "heading", "bullet_list"]
    }
}

/// Classification of one input line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    Heading(u8, &'a str),
    ListItem(&'a str),
    Paragraph(&'a str),
    Empty,
}

impl<'a> Line<'a> {
    fn classify(line: &'a str) -> Self {
        if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].len() as u8;
            let text = caps.get(2).map_or("", |m| m.as_str());
            return Line::Heading(level, text);
        }
        if let Some(caps) = LIST_ITEM.captures(line) {
            return Line::ListItem(caps.get(1).map_or("", |m| m.as_str()));
        }
        if line.trim().is_empty() {
            Line::Empty
        } else {
            Line::Paragraph(line)
        }
    }
}

fn inline(text: &str) -> Vec<Node> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(text)]
    }
}

/// Decode plain-text shorthand into a document
pub fn decode_text(text: &str) -> Document {
    let mut content = Vec::new();
    let mut lines = text.lines().map(Line::classify).peekable();

    while let Some(line) = lines.next() {
        match line {
            Line::Heading(level, text) => content.push(Node::Heading {
                level,
                content: inline(text),
            }),
            Line::ListItem(first) => {
                let mut items = vec![first];
                while let Some(&Line::ListItem(next)) = lines.peek() {
                    items.push(next);
                    lines.next();
                }
                content.push(Node::BulletList {
                    content: items
                        .into_iter()
                        .map(|item| Node::ListItem {
                            content: vec![Node::paragraph(inline(item))],
                        })
                        .collect(),
                });
            }
            Line::Paragraph(text) => content.push(Node::paragraph(inline(text))),
            Line::Empty => content.push(Node::paragraph(Vec::new())),
        }
    }

    Document::new(content)
}

/// Encode a document as plain-text shorthand. Inline marks are dropped.
pub fn encode_text(doc: &Document) -> String {
    encode_text_with(doc, DEFAULT_MAX_DEPTH)
}

/// Blockquotes nested past `max_depth` are written as one unprefixed line
pub fn encode_text_with(doc: &Document, max_depth: usize) -> String {
    let mut lines = Vec::new();
    for node in &doc.content {
        encode_block(&mut lines, node, max_depth);
    }
    lines.join("\n")
}

fn encode_block(lines: &mut Vec<String>, node: &Node, depth_left: usize) {
    match node {
        Node::Heading { level, .. } => {
            lines.push(format!("{} {}", "#".repeat((*level).clamp(1, 6) as usize), line_text(node)));
        }
        Node::BulletList { content } => {
            for item in content {
                lines.push(format!("- {}", item_text(item)));
            }
        }
        Node::OrderedList { content } => {
            for (i, item) in content.iter().enumerate() {
                lines.push(format!("{}. {}", i + 1, item_text(item)));
            }
        }
        Node::ListItem { .. } => lines.push(format!("- {}", item_text(node))),
        Node::Blockquote { .. } if depth_left == 0 => lines.push(line_text(node)),
        Node::Blockquote { content } => {
            let mut inner = Vec::new();
            for block in content {
                encode_block(&mut inner, block, depth_left - 1);
            }
            lines.extend(inner.into_iter().map(|line| format!("> {line}")));
        }
        Node::CodeBlock { .. } => {
            lines.push("```".to_string());
            lines.push(node.plain_text());
            lines.push("```".to_string());
        }
        Node::HorizontalRule => lines.push("---".to_string()),
        Node::HardBreak => lines.push(String::new()),
        other => lines.push(line_text(other)),
    }
}

/// Text of a node written as a single line; hard breaks become spaces
fn line_text(node: &Node) -> String {
    node.plain_text().replace('\n', " ")
}

/// One line of text for a list item: its blocks' text joined by spaces
fn item_text(item: &Node) -> String {
    item.children()
        .iter()
        .map(line_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Mark;
    use pretty_assertions::assert_eq;

    fn item(text: &str) -> Node {
        Node::ListItem {
            content: vec![Node::paragraph(vec![Node::text(text)])],
        }
    }

    #[test]
    fn test_decode_heading_and_list() {
        let doc = decode_text("# Title\n- item1\n- item2");
        assert_eq!(
            doc.content,
            vec![
                Node::Heading {
                    level: 1,
                    content: vec![Node::text("Title")],
                },
                Node::BulletList {
                    content: vec![item("item1"), item("item2")],
                },
            ]
        );
    }

    #[test]
    fn test_roundtrip() {
        let handler = PlainTextHandler::new();
        let input = "# Title\n- item1\n- item2";
        let doc = handler.parse(input, &ParseConfig::default());
        let output = handler.render(&doc, &RenderConfig::default());

        assert_eq!(output, input);
    }

    #[test]
    fn test_decode_classification() {
        let doc = decode_text("###### six\n####### seven\n• dot\n-nospace\n\n   \nplain");
        assert_eq!(
            doc.content,
            vec![
                Node::Heading {
                    level: 6,
                    content: vec![Node::text("six")],
                },
                Node::paragraph(vec![Node::text("####### seven")]),
                Node::BulletList {
                    content: vec![item("dot")],
                },
                Node::paragraph(vec![Node::text("-nospace")]),
                Node::paragraph(vec![]),
                Node::paragraph(vec![]),
                Node::paragraph(vec![Node::text("plain")]),
            ]
        );
    }

    #[test]
    fn test_list_groups_split_by_other_lines() {
        let doc = decode_text("- a\ntext\n- b\r\n- c");
        assert_eq!(
            doc.content,
            vec![
                Node::BulletList {
                    content: vec![item("a")],
                },
                Node::paragraph(vec![Node::text("text")]),
                Node::BulletList {
                    content: vec![item("b"), item("c")],
                },
            ]
        );
    }

    #[test]
    fn test_decode_empty_is_empty_paragraph() {
        assert_eq!(decode_text(""), Document::empty());
    }

    #[test]
    fn test_encode_drops_marks() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("a "),
            Node::marked("bold", [Mark::Bold]),
        ])]);
        assert_eq!(encode_text(&doc), "a bold");
    }

    #[test]
    fn test_encode_block_kinds() {
        let doc = Document::new(vec![
            Node::Heading {
                level: 3,
                content: vec![Node::text("H")],
            },
            Node::OrderedList {
                content: vec![item("one"), item("two")],
            },
            Node::Blockquote {
                content: vec![
                    Node::paragraph(vec![Node::text("q1")]),
                    Node::paragraph(vec![Node::text("q2")]),
                ],
            },
            Node::CodeBlock {
                content: vec![Node::text("let x = 1;\nx")],
            },
            Node::HorizontalRule,
            Node::paragraph(vec![]),
            Node::paragraph(vec![Node::text("end")]),
        ]);
        assert_eq!(
            encode_text(&doc),
            "### H\n1. one\n2. two\n> q1\n> q2\n```\nlet x = 1;\nx\n```\n---\n\nend"
        );
    }

    #[test]
    fn test_encode_nested_list_item_flattens() {
        let doc = Document::new(vec![Node::BulletList {
            content: vec![Node::ListItem {
                content: vec![
                    Node::paragraph(vec![Node::text("outer")]),
                    Node::BulletList {
                        content: vec![item("inner")],
                    },
                ],
            }],
        }]);
        assert_eq!(encode_text(&doc), "- outer inner");
    }

    #[test]
    fn test_encode_hard_breaks_stay_on_one_line() {
        let broken = |a: &str, b: &str| vec![Node::text(a), Node::HardBreak, Node::text(b)];
        let doc = Document::new(vec![
            Node::Heading {
                level: 2,
                content: broken("a", "b"),
            },
            Node::paragraph(broken("c", "d")),
            Node::BulletList {
                content: vec![Node::ListItem {
                    content: vec![Node::paragraph(broken("e", "f"))],
                }],
            },
        ]);
        let text = encode_text(&doc);
        assert_eq!(text, "## a b\nc d\n- e f");

        let back = decode_text(&text);
        assert_eq!(back.content.len(), 3);
        assert_eq!(
            back.content[0],
            Node::Heading {
                level: 2,
                content: vec![Node::text("a b")],
            }
        );
    }

    #[test]
    fn test_encode_deep_blockquotes_are_bounded() {
        let quote = |inner: Node| Node::Blockquote {
            content: vec![inner],
        };
        let doc = Document::new(vec![quote(quote(quote(Node::paragraph(vec![Node::text("x")]))))]);
        assert_eq!(encode_text_with(&doc, 8), "> > > x");
        assert_eq!(encode_text_with(&doc, 2), "> > x");
    }
}
