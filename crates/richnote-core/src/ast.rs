// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rich-text document model for note bodies
//!
//! The [`Document`] tree is the durable, storage-level representation of a
//! note. It serializes to the JSON shape written by the editor:
//! `{"type":"doc","content":[...]}` with camelCase node kinds and marks
//! attached to text leaves.
//!
//! [`NativeBlock`] and [`TextSegment`] form the lossy display projection
//! produced by [`crate::projection`].

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use unicode_segmentation::UnicodeSegmentation;

/// Source format identifier for the two text shapes a document converts to/from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Tag-based rich markup (`<p>`, `<strong>`, ...)
    Markup,
    /// Line-oriented plain-text shorthand (`# `, `- `)
    PlainText,
}

impl SourceFormat {
    /// File extension for this format
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Markup => "html",
            Self::PlainText => "txt",
        }
    }

    /// Short display name
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Markup => "HTML",
            Self::PlainText => "TXT",
        }
    }

    pub const ALL: [Self; 2] = [Self::Markup, Self::PlainText];
}

/// The root document node.
///
/// A document handed out by this crate always has at least one top-level
/// node; see [`Document::ensure_non_empty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "doc")]
pub struct Document {
    #[serde(default)]
    pub content: Vec<Node>,
}

impl Document {
    /// Create a document from top-level nodes, padding an empty list with
    /// one empty paragraph
    pub fn new(content: Vec<Node>) -> Self {
        Self { content }.ensure_non_empty()
    }

    /// The canonical empty note body: one empty paragraph
    pub fn empty() -> Self {
        Self {
            content: vec![Node::Paragraph {
                content: Vec::new(),
            }],
        }
    }

    pub fn ensure_non_empty(mut self) -> Self {
        if self.content.is_empty() {
            self.content.push(Node::Paragraph {
                content: Vec::new(),
            });
        }
        self
    }

    /// All text of the document, blocks separated by newlines
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(Node::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Count words in the document
    pub fn word_count(&self) -> usize {
        self.content
            .iter()
            .map(|node| node.plain_text().unicode_words().count())
            .sum()
    }

    /// Count user-perceived characters (grapheme clusters) in the document
    pub fn char_count(&self) -> usize {
        self.content
            .iter()
            .map(|node| node.plain_text().graphemes(true).count())
            .sum()
    }

    /// Whether any text leaf carries at least one mark
    pub fn has_marks(&self) -> bool {
        let mut stack: Vec<&Node> = self.content.iter().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Text { marks, .. } if !marks.is_empty() => return true,
                other => stack.extend(other.children()),
            }
        }
        false
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

/// Block and inline nodes of the document tree
///
/// Stored JSON is read leniently through [`Node::from_json`]: kinds this
/// crate does not model become [`Node::Unknown`] and unknown marks are
/// dropped, so one unfamiliar node never costs the rest of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Paragraph {
        content: Vec<Node>,
    },

    /// Heading with level 1-6
    Heading {
        level: u8,
        content: Vec<Node>,
    },

    /// Holds only `listItem` nodes
    BulletList {
        content: Vec<Node>,
    },

    /// Holds only `listItem` nodes
    OrderedList {
        content: Vec<Node>,
    },

    /// Holds block nodes
    ListItem {
        content: Vec<Node>,
    },

    Blockquote {
        content: Vec<Node>,
    },

    /// Holds exactly one unmarked text node
    CodeBlock {
        content: Vec<Node>,
    },

    HardBreak,

    HorizontalRule,

    /// Text leaf with its inline marks
    Text {
        text: String,
        marks: Vec<Mark>,
    },

    // Table kinds are written by the table-capable editing surface only.
    // They are carried through storage and serialization but never built
    // from markup.
    Table {
        content: Vec<Node>,
    },

    TableRow {
        content: Vec<Node>,
    },

    TableCell {
        content: Vec<Node>,
    },

    TableHeader {
        content: Vec<Node>,
    },

    /// A stored node of a kind not modelled here (`image`, `mention`, ...).
    /// Written back under its own kind with only its children.
    Unknown {
        kind: String,
        content: Vec<Node>,
    },
}

impl Node {
    /// Unmarked text leaf
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            text: value.into(),
            marks: Vec::new(),
        }
    }

    /// Text leaf carrying the given marks, stored in canonical order
    pub fn marked(value: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        let mut set = Vec::new();
        for mark in marks {
            insert_mark(&mut set, mark);
        }
        Node::Text {
            text: value.into(),
            marks: set,
        }
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Node::Paragraph { content }
    }

    /// JSON kind name of this node
    pub fn kind_name(&self) -> &str {
        match self {
            Node::Paragraph { .. } => "paragraph",
            Node::Heading { .. } => "heading",
            Node::BulletList { .. } => "bulletList",
            Node::OrderedList { .. } => "orderedList",
            Node::ListItem { .. } => "listItem",
            Node::Blockquote { .. } => "blockquote",
            Node::CodeBlock { .. } => "codeBlock",
            Node::HardBreak => "hardBreak",
            Node::HorizontalRule => "horizontalRule",
            Node::Text { .. } => "text",
            Node::Table { .. } => "table",
            Node::TableRow { .. } => "tableRow",
            Node::TableCell { .. } => "tableCell",
            Node::TableHeader { .. } => "tableHeader",
            Node::Unknown { kind, .. } => kind.as_str(),
        }
    }

    /// Child nodes; empty for leaves and void nodes
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Paragraph { content }
            | Node::Heading { content, .. }
            | Node::BulletList { content }
            | Node::OrderedList { content }
            | Node::ListItem { content }
            | Node::Blockquote { content }
            | Node::CodeBlock { content }
            | Node::Table { content }
            | Node::TableRow { content }
            | Node::TableCell { content }
            | Node::TableHeader { content }
            | Node::Unknown { content, .. } => content,
            Node::HardBreak | Node::HorizontalRule | Node::Text { .. } => &[],
        }
    }

    pub fn is_table_kind(&self) -> bool {
        matches!(
            self,
            Node::Table { .. } | Node::TableRow { .. } | Node::TableCell { .. } | Node::TableHeader { .. }
        )
    }

    /// Concatenated text of all descendant leaves.
    ///
    /// Hard breaks become `\n`. Walks with an explicit stack, so arbitrarily
    /// deep stored trees cannot exhaust the call stack.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Text { text, .. } => out.push_str(text),
                Node::HardBreak => out.push('\n'),
                other => stack.extend(other.children().iter().rev()),
            }
        }
        out
    }

    /// Read a node from stored JSON. Never fails.
    ///
    /// Attributes are accepted on the node itself or under `attrs`. A node
    /// of an unknown kind keeps its `content`, or its `text` as a single
    /// text child.
    pub fn from_json(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let content = || -> Vec<Node> {
            value
                .get("content")
                .and_then(Value::as_array)
                .map(|nodes| nodes.iter().map(Node::from_json).collect())
                .unwrap_or_default()
        };

        match kind {
            "paragraph" => Node::Paragraph { content: content() },
            "heading" => Node::Heading {
                level: attr(value, "level")
                    .and_then(Value::as_u64)
                    .map_or(1, |level| level.clamp(1, 6) as u8),
                content: content(),
            },
            "bulletList" => Node::BulletList { content: content() },
            "orderedList" => Node::OrderedList { content: content() },
            "listItem" => Node::ListItem { content: content() },
            "blockquote" => Node::Blockquote { content: content() },
            "codeBlock" => Node::CodeBlock { content: content() },
            "hardBreak" => Node::HardBreak,
            "horizontalRule" => Node::HorizontalRule,
            "text" => Node::Text {
                text: text_field(value).unwrap_or_default(),
                marks: marks_from_json(value),
            },
            "table" => Node::Table { content: content() },
            "tableRow" => Node::TableRow { content: content() },
            "tableCell" => Node::TableCell { content: content() },
            "tableHeader" => Node::TableHeader { content: content() },
            other => {
                tracing::debug!(kind = other, "keeping children of unknown node kind");
                let mut children = content();
                if children.is_empty() {
                    if let Some(text) = text_field(value) {
                        children.push(Node::Text {
                            text,
                            marks: marks_from_json(value),
                        });
                    }
                }
                Node::Unknown {
                    kind: other.to_string(),
                    content: children,
                }
            }
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind_name())?;
        match self {
            Node::Heading { level, content } => {
                map.serialize_entry("level", level)?;
                map.serialize_entry("content", content)?;
            }
            Node::Text { text, marks } => {
                map.serialize_entry("text", text)?;
                if !marks.is_empty() {
                    map.serialize_entry("marks", marks)?;
                }
            }
            Node::HardBreak | Node::HorizontalRule => {}
            other => map.serialize_entry("content", other.children())?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Node::from_json(&value))
    }
}

/// `key` on the node, or under its `attrs` object
fn attr<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .get(key)
        .or_else(|| value.get("attrs").and_then(|attrs| attrs.get(key)))
}

fn text_field(value: &Value) -> Option<String> {
    value.get("text").and_then(Value::as_str).map(str::to_string)
}

/// Known marks of a stored text leaf, in canonical order
fn marks_from_json(value: &Value) -> Vec<Mark> {
    let mut marks = Vec::new();
    let stored = value.get("marks").and_then(Value::as_array);
    for mark in stored.into_iter().flatten().filter_map(Mark::from_json) {
        insert_mark(&mut marks, mark);
    }
    marks
}

/// Inline style attached to a text leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link { href: String },
}

impl Mark {
    /// Position in the canonical serialization order
    pub const fn rank(&self) -> u8 {
        match self {
            Mark::Bold => 0,
            Mark::Italic => 1,
            Mark::Underline => 2,
            Mark::Strike => 3,
            Mark::Code => 4,
            Mark::Link { .. } => 5,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strike => "strike",
            Mark::Code => "code",
            Mark::Link { .. } => "link",
        }
    }

    /// Read a stored mark; unknown kinds and links without a target are `None`
    pub fn from_json(value: &Value) -> Option<Self> {
        let mark = match value.get("type")?.as_str()? {
            "bold" => Mark::Bold,
            "italic" => Mark::Italic,
            "underline" => Mark::Underline,
            "strike" => Mark::Strike,
            "code" => Mark::Code,
            "link" => Mark::Link {
                href: attr(value, "href")?.as_str()?.to_string(),
            },
            other => {
                tracing::debug!(kind = other, "dropping unknown mark");
                return None;
            }
        };
        Some(mark)
    }

    /// Compare by canonical position only; two links are the same slot
    pub fn cmp_rank(&self, other: &Mark) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Insert `mark` into a canonically ordered mark set.
///
/// A mark of the same kind already present is replaced, so an inner link
/// overrides an outer one.
pub fn insert_mark(marks: &mut Vec<Mark>, mark: Mark) {
    match marks.binary_search_by(|m| m.cmp_rank(&mark)) {
        Ok(idx) => marks[idx] = mark,
        Err(idx) => marks.insert(idx, mark),
    }
}

/// Block kinds of the display projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NativeKind {
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    HardBreak,
    HorizontalRule,
    Table,
}

/// Flat display block, renderable without a markup-capable view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBlock {
    pub kind: NativeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default)]
    pub segments: Vec<TextSegment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NativeBlock>,
}

impl NativeBlock {
    pub fn new(kind: NativeKind) -> Self {
        Self {
            kind,
            level: None,
            segments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Concatenated segment text
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A run of text with its formatting flags. Link targets are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
}

impl TextSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Segment for a text leaf, setting one flag per mark
    pub fn from_marks(text: impl Into<String>, marks: &[Mark]) -> Self {
        let mut segment = Self::plain(text);
        for mark in marks {
            match mark {
                Mark::Bold => segment.bold = true,
                Mark::Italic => segment.italic = true,
                Mark::Underline => segment.underline = true,
                Mark::Strike => segment.strike = true,
                Mark::Code => segment.code = true,
                Mark::Link { .. } => {}
            }
        }
        segment
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn source_format_strategy() -> impl Strategy<Value = SourceFormat> {
        prop_oneof![Just(SourceFormat::Markup), Just(SourceFormat::PlainText)]
    }

    fn mark_strategy() -> impl Strategy<Value = Mark> {
        prop_oneof![
            Just(Mark::Bold),
            Just(Mark::Italic),
            Just(Mark::Underline),
            Just(Mark::Strike),
            Just(Mark::Code),
            "[a-z:/.]{1,20}".prop_map(|href| Mark::Link { href }),
        ]
    }

    fn inline_strategy() -> impl Strategy<Value = Node> {
        prop_oneof![
            ("\\PC{0,20}", prop::collection::vec(mark_strategy(), 0..4))
                .prop_map(|(text, marks)| Node::marked(text, marks)),
            Just(Node::HardBreak),
        ]
    }

    fn block_strategy() -> impl Strategy<Value = Node> {
        prop_oneof![
            prop::collection::vec(inline_strategy(), 0..5).prop_map(Node::paragraph),
            (1u8..=6, prop::collection::vec(inline_strategy(), 0..3))
                .prop_map(|(level, content)| Node::Heading { level, content }),
            Just(Node::HorizontalRule),
        ]
    }

    proptest! {
        #[test]
        fn prop_source_format_in_all(format in source_format_strategy()) {
            prop_assert!(SourceFormat::ALL.contains(&format));
            prop_assert!(!format.extension().is_empty());
        }

        #[test]
        fn prop_marked_is_canonical(marks in prop::collection::vec(mark_strategy(), 0..8)) {
            if let Node::Text { marks, .. } = Node::marked("x", marks) {
                prop_assert!(marks.windows(2).all(|w| w[0].rank() < w[1].rank()));
            }
        }

        #[test]
        fn prop_document_serde_roundtrip(content in prop::collection::vec(block_strategy(), 0..6)) {
            let doc = Document::new(content);
            let json = serde_json::to_string(&doc).expect("serialize");
            let back: Document = serde_json::from_str(&json).expect("deserialize");
            prop_assert_eq!(doc, back);
        }

        #[test]
        fn prop_new_document_never_empty(content in prop::collection::vec(block_strategy(), 0..3)) {
            prop_assert!(!Document::new(content).content.is_empty());
        }
    }
}
