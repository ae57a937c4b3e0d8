// SPDX-License-Identifier: AGPL-3.0-or-later
//! Table detection
//!
//! Answers one question: does a stored body contain table structure?
//! Markup is matched textually so malformed tables still count. Trees are
//! scanned without recursion, bounded by [`DEFAULT_MAX_DEPTH`].

use crate::ast::{Document, Node};
use crate::normalize::Content;
use crate::traits::{ConversionError, Result, DEFAULT_MAX_DEPTH};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static TABLE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(table|tr|td|th)\b").expect("table tag pattern is valid")
});

const TABLE_KINDS: [&str; 4] = ["table", "tableRow", "tableCell", "tableHeader"];

/// Answer when a tree is too deep to scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TablePolicy {
    /// Report no table
    #[default]
    FailOpen,
    /// Report a table, so callers guarding table-unsafe edits refuse them
    FailClosed,
}

impl TablePolicy {
    const fn on_depth_exceeded(self) -> bool {
        matches!(self, TablePolicy::FailClosed)
    }
}

pub fn contains_table(content: &Content) -> bool {
    contains_table_with(content, TablePolicy::default())
}

pub fn contains_table_with(content: &Content, policy: TablePolicy) -> bool {
    match content {
        Content::Markup(markup) | Content::Wrapper { markup } => markup_contains_table(markup),
        Content::Document(doc) => resolve(document_contains_table(doc), policy),
        Content::Nodes(nodes) => resolve(nodes_contain_table(nodes), policy),
        Content::Empty => false,
    }
}

/// Check a stored body from its JSON.
///
/// Trees are scanned raw, so a table survives even under node kinds the
/// document model does not know. Markup strings and wrappers are matched
/// textually; any other shape has no table.
pub fn stored_contains_table(value: &Value, policy: TablePolicy) -> bool {
    match Content::from_json_value(value) {
        Content::Document(_) | Content::Nodes(_) => contains_table_json(value, policy),
        other => contains_table_with(&other, policy),
    }
}

/// Case-insensitive textual match on a table-family open tag
pub fn markup_contains_table(markup: &str) -> bool {
    TABLE_TAG.is_match(markup)
}

pub fn document_contains_table(doc: &Document) -> Result<bool> {
    nodes_contain_table(&doc.content)
}

fn nodes_contain_table(nodes: &[Node]) -> Result<bool> {
    let mut stack: Vec<(&Node, usize)> = nodes.iter().rev().map(|node| (node, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        if node.is_table_kind() {
            return Ok(true);
        }
        let children = node.children();
        if children.is_empty() {
            continue;
        }
        if depth >= DEFAULT_MAX_DEPTH {
            return Err(ConversionError::DepthExceeded {
                limit: DEFAULT_MAX_DEPTH,
            });
        }
        stack.extend(children.iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(false)
}

/// Scan raw stored JSON for a table-kind `type` anywhere in the tree
pub fn contains_table_json(value: &Value, policy: TablePolicy) -> bool {
    resolve(json_contains_table(value), policy)
}

fn json_contains_table(value: &Value) -> Result<bool> {
    let mut stack = vec![(value, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        let children: Vec<&Value> = match value {
            Value::Object(map) if is_table_object(map) => return Ok(true),
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            _ => continue,
        };
        // every node level is an object plus its content array
        if depth >= DEFAULT_MAX_DEPTH * 2 {
            return Err(ConversionError::DepthExceeded {
                limit: DEFAULT_MAX_DEPTH,
            });
        }
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
    Ok(false)
}

fn is_table_object(map: &serde_json::Map<String, Value>) -> bool {
    map.get("type")
        .and_then(Value::as_str)
        .is_some_and(|kind| TABLE_KINDS.contains(&kind))
}

fn resolve(scan: Result<bool>, policy: TablePolicy) -> bool {
    scan.unwrap_or_else(|err| {
        let answer = policy.on_depth_exceeded();
        tracing::warn!(error = %err, ?policy, answer, "table scan gave up");
        answer
    })
}
