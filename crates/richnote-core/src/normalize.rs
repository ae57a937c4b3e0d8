// SPDX-License-Identifier: AGPL-3.0-or-later
//! Note body normalization
//!
//! Stored note bodies come in several legacy shapes. [`Content`] is the
//! closed set of shapes this crate accepts; stored JSON is classified into
//! it once, at the boundary, and [`normalize`] turns any of them into the
//! canonical `{markup, document}` pair.

use crate::ast::{Document, Node};
use crate::formats::markup::{serializer, to_document_with};
use crate::traits::{ParseConfig, RenderConfig, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names under which legacy wrapper objects carry their markup
const WRAPPER_FIELDS: [&str; 2] = ["html", "markup"];

/// Every accepted shape of a stored note body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Canonical document tree
    Document(Document),
    /// `{"html": "..."}` or `{"markup": "..."}`
    Wrapper { markup: String },
    /// Bare markup string
    Markup(String),
    /// Bare array of top-level nodes
    Nodes(Vec<Node>),
    /// Null, missing or unrecognized
    Empty,
}

impl Content {
    /// Classify a stored JSON value. Never fails: anything unrecognized is
    /// [`Content::Empty`].
    ///
    /// Trees are read leniently (see [`Node::from_json`]), so a document
    /// holding node or mark kinds this crate does not model keeps the rest
    /// of its content.
    pub fn from_json_value(value: &Value) -> Self {
        let content = match value {
            Value::Null => Content::Empty,
            Value::String(markup) => Content::Markup(markup.clone()),
            Value::Array(items) if items.iter().all(is_node_object) => {
                Content::Nodes(items.iter().map(Node::from_json).collect())
            }
            Value::Array(_) => Content::Empty,
            Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("doc") => {
                match Document::deserialize(value) {
                    Ok(doc) => Content::Document(doc),
                    Err(err) => {
                        tracing::debug!(error = %err, "document did not decode");
                        Content::Empty
                    }
                }
            }
            Value::Object(map) => WRAPPER_FIELDS
                .iter()
                .find_map(|field| map.get(*field).and_then(Value::as_str))
                .map_or(Content::Empty, |markup| Content::Wrapper {
                    markup: markup.to_string(),
                }),
            Value::Bool(_) | Value::Number(_) => Content::Empty,
        };
        tracing::debug!(shape = content.shape(), "classified note body");
        content
    }

    /// Classify stored JSON text; fails only if the text is not JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_json_value(&value))
    }

    /// Name of the shape, for diagnostics
    pub const fn shape(&self) -> &'static str {
        match self {
            Content::Document(_) => "document",
            Content::Wrapper { .. } => "wrapper",
            Content::Markup(_) => "markup",
            Content::Nodes(_) => "nodes",
            Content::Empty => "empty",
        }
    }
}

/// An object with a string `type`, the minimum a stored node has
fn is_node_object(value: &Value) -> bool {
    value.get("type").is_some_and(Value::is_string)
}

impl From<Document> for Content {
    fn from(doc: Document) -> Self {
        Content::Document(doc)
    }
}

impl From<&str> for Content {
    fn from(markup: &str) -> Self {
        Content::Markup(markup.to_string())
    }
}

impl From<String> for Content {
    fn from(markup: String) -> Self {
        Content::Markup(markup)
    }
}

impl From<Vec<Node>> for Content {
    fn from(nodes: Vec<Node>) -> Self {
        Content::Nodes(nodes)
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(value: Option<T>) -> Self {
        value.map_or(Content::Empty, Into::into)
    }
}

/// Canonical note body: cached markup plus the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    pub markup: String,
    pub document: Document,
}

impl Normalized {
    pub fn empty() -> Self {
        Self {
            markup: String::new(),
            document: Document::empty(),
        }
    }
}

/// Normalize any accepted shape with default limits
pub fn normalize(content: impl Into<Content>) -> Normalized {
    normalize_with(content, &ParseConfig::default(), &RenderConfig::default())
}

pub fn normalize_with(
    content: impl Into<Content>,
    parse_config: &ParseConfig,
    render_config: &RenderConfig,
) -> Normalized {
    match content.into() {
        Content::Document(doc) => from_document(doc.ensure_non_empty(), render_config),
        Content::Nodes(nodes) => from_document(Document::new(nodes), render_config),
        Content::Wrapper { markup } | Content::Markup(markup) => {
            let document = to_document_with(&markup, parse_config);
            Normalized { markup, document }
        }
        Content::Empty => Normalized::empty(),
    }
}

fn from_document(document: Document, render_config: &RenderConfig) -> Normalized {
    Normalized {
        markup: serializer::serialize(&document, render_config),
        document,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Mark;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_null_and_empty_normalize_to_empty_paragraph() {
        let expected = Normalized {
            markup: String::new(),
            document: Document {
                content: vec![Node::paragraph(vec![])],
            },
        };
        assert_eq!(normalize(Content::Empty), expected);
        assert_eq!(normalize(None::<String>), expected);
        assert_eq!(normalize(""), expected);
        assert_eq!(normalize(Content::from_json_value(&Value::Null)), expected);
        assert_eq!(
            serde_json::to_value(&expected).unwrap(),
            json!({"markup": "", "document": {"type": "doc", "content": [{"type": "paragraph", "content": []}]}})
        );
    }

    #[test]
    fn test_markup_keeps_input_verbatim() {
        let markup = "<p>BP <b>120/80</b></p>\n";
        let normalized = normalize(markup);
        assert_eq!(normalized.markup, markup);
        assert_eq!(
            normalized.document.content,
            vec![Node::paragraph(vec![
                Node::text("BP "),
                Node::marked("120/80", [Mark::Bold]),
            ])]
        );
    }

    #[test]
    fn test_document_is_serialized() {
        let doc = Document::new(vec![Node::Heading {
            level: 2,
            content: vec![Node::text("Vitals")],
        }]);
        let normalized = normalize(doc.clone());
        assert_eq!(normalized.markup, "<h2>Vitals</h2>");
        assert_eq!(normalized.document, doc);
    }

    #[test]
    fn test_empty_document_is_padded() {
        let normalized = normalize(Document {
            content: Vec::new(),
        });
        assert_eq!(normalized.document, Document::empty());
        assert_eq!(normalized.markup, "<p></p>");
    }

    #[test]
    fn test_classify_json_shapes() {
        assert_eq!(
            Content::from_json_value(&json!({"type": "doc", "content": [{"type": "horizontalRule"}]})),
            Content::Document(Document::new(vec![Node::HorizontalRule]))
        );
        assert_eq!(
            Content::from_json_value(&json!({"html": "<p>x</p>", "updatedAt": 3})),
            Content::Wrapper {
                markup: "<p>x</p>".to_string()
            }
        );
        assert_eq!(
            Content::from_json_value(&json!({"markup": "<p>y</p>"})),
            Content::Wrapper {
                markup: "<p>y</p>".to_string()
            }
        );
        assert_eq!(
            Content::from_json_value(&json!("<p>z</p>")),
            Content::Markup("<p>z</p>".to_string())
        );
        assert_eq!(
            Content::from_json_value(&json!([{"type": "text", "text": "t"}])),
            Content::Nodes(vec![Node::text("t")])
        );
    }

    #[test]
    fn test_unrecognized_json_is_empty() {
        for value in [
            json!(42),
            json!(true),
            json!({"body": "<p>x</p>"}),
            json!({"html": 5}),
            json!({"type": "doc", "content": 5}),
            json!([1, 2, 3]),
            json!([{"type": "text", "text": "t"}, "loose"]),
        ] {
            assert_eq!(Content::from_json_value(&value), Content::Empty, "{value}");
        }
    }

    #[test]
    fn test_unmodelled_kinds_keep_the_note() {
        let stored = json!({"type": "doc", "content": [
            {"type": "paragraph", "content": [
                {"type": "text", "text": "BP ", "marks": [{"type": "highlight"}]},
                {"type": "text", "text": "120/80", "marks": [{"type": "bold"}, {"type": "textStyle", "attrs": {"color": "red"}}]}
            ]},
            {"type": "image", "attrs": {"src": "scan.png"}},
            {"type": "table", "content": [{"type": "tableRow", "content": [
                {"type": "tableCell", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "x"}]}]}
            ]}]}
        ]});
        let content = Content::from_json_value(&stored);
        assert_eq!(content.shape(), "document");

        let normalized = normalize(content);
        assert_eq!(normalized.document.content.len(), 3);
        assert_eq!(
            normalized.document.content[0],
            Node::paragraph(vec![
                Node::text("BP "),
                Node::marked("120/80", [Mark::Bold]),
            ])
        );
        assert_eq!(
            normalized.markup,
            "<p>BP <strong>120/80</strong></p><table><tr><td><p>x</p></td></tr></table>"
        );
    }

    #[test]
    fn test_from_json_str() {
        assert_eq!(
            Content::from_json_str(r#""<p>a</p>""#).unwrap(),
            Content::Markup("<p>a</p>".to_string())
        );
        assert!(Content::from_json_str("<p>a</p>").is_err());
    }

    #[test]
    fn test_bare_node_array_normalizes() {
        let normalized = normalize(Content::from_json_value(&json!([
            {"type": "paragraph", "content": [{"type": "text", "text": "a", "marks": [{"type": "italic"}]}]}
        ])));
        assert_eq!(normalized.markup, "<p><em>a</em></p>");
        assert_eq!(
            normalized.document.content,
            vec![Node::paragraph(vec![Node::marked("a", [Mark::Italic])])]
        );
    }

    #[test]
    fn test_wrapper_normalizes_like_markup() {
        let wrapper = normalize(Content::Wrapper {
            markup: "<ul><li>a</li></ul>".to_string(),
        });
        assert_eq!(wrapper, normalize("<ul><li>a</li></ul>"));
    }

    #[test]
    fn test_normalize_is_idempotent_on_documents() {
        let first = normalize("<h1>T</h1><p>x <em>y</em></p><ul><li>z</li></ul>");
        let second = normalize(first.document.clone());
        assert_eq!(second.document, first.document);
        assert_eq!(normalize(second.markup.as_str()).document, first.document);
    }
}
