// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parser and Renderer traits for format handlers
//!
//! Parsing and rendering are total: every input yields a document or a
//! string. [`ConversionError`] covers only the edges that can genuinely
//! fail, such as reading input or looking up an unregistered format.

use crate::ast::{Document, SourceFormat};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Nesting limit applied to untrusted trees unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Error type for the fallible edges of conversion
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Nesting exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("No handler registered for format {0:?}")]
    UnsupportedFormat(SourceFormat),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Configuration for parsing
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Maximum number of simultaneously open elements; deeper tags are skipped
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration for rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Nodes nested deeper than this are rendered as their flattened text
    pub max_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parser trait: convert source text to a document
pub trait Parser: Send + Sync {
    /// The source format this parser handles
    fn format(&self) -> SourceFormat;

    /// Parse a string into a Document. Never fails.
    fn parse(&self, input: &str, config: &ParseConfig) -> Document;
}

/// Renderer trait: convert a document to target text
pub trait Renderer: Send + Sync {
    /// The target format this renderer produces
    fn format(&self) -> SourceFormat;

    /// Render a Document to a string. Never fails.
    fn render(&self, doc: &Document, config: &RenderConfig) -> String;
}

/// Extension trait for streaming operations (not dyn-compatible)
pub trait ParserExt: Parser {
    /// Parse from a reader
    fn parse_reader<R: Read>(&self, reader: R, config: &ParseConfig) -> Result<Document> {
        let mut input = String::new();
        let mut reader = reader;
        reader.read_to_string(&mut input)?;
        Ok(self.parse(&input, config))
    }
}

/// Extension trait for streaming operations (not dyn-compatible)
pub trait RendererExt: Renderer {
    /// Render to a writer
    fn render_writer<W: Write>(
        &self,
        doc: &Document,
        writer: &mut W,
        config: &RenderConfig,
    ) -> Result<()> {
        let output = self.render(doc, config);
        writer.write_all(output.as_bytes())?;
        Ok(())
    }
}

// Blanket implementations
impl<T: Parser> ParserExt for T {}
impl<T: Renderer> RendererExt for T {}

/// Combined parser + renderer for a format
pub trait FormatHandler: Parser + Renderer {
    /// Check if this format can represent a specific feature
    fn supports_feature(&self, feature: &str) -> bool {
        self.supported_features().contains(&feature)
    }

    /// Get list of supported features
    fn supported_features(&self) -> &[&str];
}

/// Registry of format handlers
pub struct FormatRegistry {
    handlers: HashMap<SourceFormat, Box<dyn FormatHandler>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry holding the markup and plain-text handlers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::formats::MarkupHandler::new()));
        registry.register(Box::new(crate::formats::PlainTextHandler::new()));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn FormatHandler>) {
        let format = Parser::format(handler.as_ref());
        self.handlers.insert(format, handler);
    }

    pub fn get(&self, format: SourceFormat) -> Option<&dyn FormatHandler> {
        self.handlers.get(&format).map(|h| h.as_ref())
    }

    /// Parse `input` in one format
    pub fn parse(&self, input: &str, from: SourceFormat, config: &ParseConfig) -> Result<Document> {
        let handler = self
            .get(from)
            .ok_or(ConversionError::UnsupportedFormat(from))?;
        Ok(handler.parse(input, config))
    }

    /// Convert between formats through the document model
    pub fn convert(
        &self,
        input: &str,
        from: SourceFormat,
        to: SourceFormat,
        parse_config: &ParseConfig,
        render_config: &RenderConfig,
    ) -> Result<String> {
        if from == to {
            return Ok(input.to_string());
        }

        let to_handler = self
            .get(to)
            .ok_or(ConversionError::UnsupportedFormat(to))?;

        let doc = self.parse(input, from, parse_config)?;
        Ok(to_handler.render(&doc, render_config))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
