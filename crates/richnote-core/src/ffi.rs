// SPDX-License-Identifier: AGPL-3.0-or-later
//! C FFI exports for native editor hosts
//!
//! Strings cross as NUL-terminated UTF-8 and trees cross as JSON text.
//! Every entry point is total: a null pointer, invalid UTF-8 or JSON that
//! does not parse is treated as empty content. Strings returned by this
//! module must be released with [`richnote_free_string`].

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde::Serialize;
use serde_json::Value;

use crate::ast::Document;
use crate::formats::markup::{to_document, to_markup};
use crate::formats::plaintext::{decode_text, encode_text};
use crate::normalize::{normalize, Content};
use crate::projection::project_native;
use crate::table::{stored_contains_table, TablePolicy};

/// Borrow a C string argument. Null is empty; invalid UTF-8 is logged and empty.
unsafe fn read_arg<'a>(ptr: *const c_char, entry: &'static str) -> &'a str {
    if ptr.is_null() {
        return "";
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(entry, error = %err, "argument is not valid UTF-8");
            ""
        }
    }
}

/// Parse a JSON argument; empty text or invalid JSON is `None`
unsafe fn read_json(ptr: *const c_char, entry: &'static str) -> Option<Value> {
    let json = read_arg(ptr, entry);
    if json.is_empty() {
        return None;
    }
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(entry, error = %err, "argument is not valid JSON");
            None
        }
    }
}

/// Classify a stored-body JSON argument
unsafe fn read_content(ptr: *const c_char, entry: &'static str) -> Content {
    read_json(ptr, entry).map_or(Content::Empty, |value| Content::from_json_value(&value))
}

/// Decode a document JSON argument; anything else is the empty document
unsafe fn read_document(ptr: *const c_char, entry: &'static str) -> Option<Document> {
    let json = read_arg(ptr, entry);
    if json.is_empty() {
        return None;
    }
    match serde_json::from_str(json) {
        Ok(doc) => Some(doc),
        Err(err) => {
            tracing::warn!(entry, error = %err, "argument is not a document");
            None
        }
    }
}

/// Hand a string to the caller. Interior NULs are dropped.
fn into_raw(s: String) -> *mut c_char {
    let bytes: Vec<u8> = s.into_bytes().into_iter().filter(|&b| b != 0).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

fn json_into_raw<T: Serialize>(value: &T, entry: &'static str) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => into_raw(json),
        Err(err) => {
            tracing::warn!(entry, error = %err, "result did not serialize");
            into_raw(String::new())
        }
    }
}

/// Normalize a stored body to `{"markup": ..., "document": ...}` JSON
///
/// # Safety
/// - `content_json` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn richnote_normalize(content_json: *const c_char) -> *mut c_char {
    let content = read_content(content_json, "richnote_normalize");
    json_into_raw(&normalize(content), "richnote_normalize")
}

/// Serialize document JSON to markup
///
/// # Safety
/// - `document_json` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn richnote_to_markup(document_json: *const c_char) -> *mut c_char {
    let markup = read_document(document_json, "richnote_to_markup")
        .map(|doc| to_markup(&doc))
        .unwrap_or_default();
    into_raw(markup)
}

/// Parse markup to document JSON
///
/// # Safety
/// - `markup` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn richnote_to_document(markup: *const c_char) -> *mut c_char {
    let doc = to_document(read_arg(markup, "richnote_to_document"));
    json_into_raw(&doc, "richnote_to_document")
}

/// Project a stored body to a JSON array of native blocks
///
/// # Safety
/// - `content_json` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn richnote_project_native(content_json: *const c_char) -> *mut c_char {
    let normalized = normalize(read_content(content_json, "richnote_project_native"));
    json_into_raw(
        &project_native(&normalized.document),
        "richnote_project_native",
    )
}

/// Whether a stored body holds table structure
///
/// # Safety
/// - `content_json` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn richnote_contains_table(content_json: *const c_char) -> bool {
    read_json(content_json, "richnote_contains_table")
        .is_some_and(|value| stored_contains_table(&value, TablePolicy::default()))
}

/// Decode plain-text shorthand to document JSON
///
/// # Safety
/// - `text` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn richnote_decode_text(text: *const c_char) -> *mut c_char {
    let doc = decode_text(read_arg(text, "richnote_decode_text"));
    json_into_raw(&doc, "richnote_decode_text")
}

/// Encode document JSON as plain-text shorthand
///
/// # Safety
/// - `document_json` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn richnote_encode_text(document_json: *const c_char) -> *mut c_char {
    let text = read_document(document_json, "richnote_encode_text")
        .map(|doc| encode_text(&doc))
        .unwrap_or_default();
    into_raw(text)
}

/// Free a string allocated by the library
///
/// # Safety
/// - `s` must be a valid string from this library or null
#[no_mangle]
pub unsafe extern "C" fn richnote_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get library version
///
/// Returns a static string, do not free
#[no_mangle]
pub extern "C" fn richnote_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
