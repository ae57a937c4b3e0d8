// SPDX-License-Identifier: AGPL-3.0-or-later
//! Format handlers for each supported text shape

pub mod markup;
pub mod plaintext;

pub use markup::MarkupHandler;
pub use plaintext::PlainTextHandler;
