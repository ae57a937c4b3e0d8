// SPDX-License-Identifier: AGPL-3.0-or-later
//! Richnote Core - rich-text note bodies between markup and a document tree
//!
//! This crate provides:
//! - A document tree that stored note bodies convert to/from
//! - A depth-bounded markup tokenizer, document builder and serializer
//! - Normalization of every legacy body shape into `{markup, document}`
//! - A flat projection for native display widgets
//! - Table detection over markup, trees and raw stored JSON
//! - A lossy plain-text shorthand codec
//! - C FFI exports behind the `ffi` feature

pub mod ast;
pub mod formats;
pub mod normalize;
pub mod projection;
pub mod table;
pub mod traits;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use ast::{Document, Mark, NativeBlock, NativeKind, Node, SourceFormat, TextSegment};
pub use formats::markup::{to_document, to_document_with, to_markup, to_markup_with};
pub use formats::plaintext::{decode_text, encode_text};
pub use normalize::{normalize, normalize_with, Content, Normalized};
pub use projection::project_native;
pub use table::{contains_table, contains_table_with, stored_contains_table, TablePolicy};
pub use traits::{
    ConversionError, FormatHandler, FormatRegistry, ParseConfig, Parser, RenderConfig, Renderer,
    Result, DEFAULT_MAX_DEPTH,
};
