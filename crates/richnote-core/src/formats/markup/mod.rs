// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markup format handler
//!
//! `markup -> tokenizer -> parse tree -> builder -> Document` and back
//! through the serializer.

pub mod builder;
pub mod escape;
pub mod serializer;
pub mod tokenizer;

pub use tokenizer::{Attribute, ParsedElement};

use crate::ast::{Document, SourceFormat};
use crate::traits::{FormatHandler, ParseConfig, Parser, RenderConfig, Renderer};

/// Markup format handler
pub struct MarkupHandler;

impl MarkupHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkupHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkupHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markup
    }

    fn parse(&self, input: &str, config: &ParseConfig) -> Document {
        to_document_with(input, config)
    }
}

impl Renderer for MarkupHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markup
    }

    fn render(&self, doc: &Document, config: &RenderConfig) -> String {
        serializer::serialize(doc, config)
    }
}

impl FormatHandler for MarkupHandler {
    fn supported_features(&self) -> &[&str] {
        &[
            "paragraph",
            "heading",
            "bullet_list",
            "ordered_list",
            "blockquote",
            "code_block",
            "hard_break",
            "horizontal_rule",
            "bold",
            "italic",
            "underline",
            "strike",
            "code",
            "link",
        ]
    }
}

/// Parse markup into a document with the default depth limit
pub fn to_document(markup: &str) -> Document {
    to_document_with(markup, &ParseConfig::default())
}

pub fn to_document_with(markup: &str, config: &ParseConfig) -> Document {
    builder::build_with(&tokenizer::parse(markup, config), config.max_depth)
}

/// Serialize a document to markup with the default depth limit
pub fn to_markup(doc: &Document) -> String {
    to_markup_with(doc, &RenderConfig::default())
}

pub fn to_markup_with(doc: &Document, config: &RenderConfig) -> String {
    serializer::serialize(doc, config)
}
