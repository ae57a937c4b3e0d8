// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end tests driving the `richnote` binary

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use richnote_core::{to_markup, Document};
use std::fs;
use tempfile::TempDir;

/// The binary run in `dir` with `stdin`, logging left at its defaults
fn richnote(dir: &TempDir, args: &[&str], stdin: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("richnote");
    cmd.args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .write_stdin(stdin);
    cmd
}

/// Stdout of a successful run, without the trailing newline
fn stdout(mut cmd: Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap().trim_end().to_string()
}

fn json(cmd: Command) -> serde_json::Value {
    serde_json::from_str(&stdout(cmd)).unwrap()
}

#[test]
fn normalize_markup_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("note.html");
    fs::write(&input, "<h2>Vitals</h2><p>BP <strong>120/80</strong></p>").unwrap();

    let value = json(richnote(&dir, &["normalize", input.to_str().unwrap()], ""));
    assert_eq!(value["markup"], "<h2>Vitals</h2><p>BP <strong>120/80</strong></p>");
    assert_eq!(value["document"]["content"][0]["type"], "heading");
    assert_eq!(value["document"]["content"][0]["level"], 2);
}

#[test]
fn normalize_legacy_wrapper_from_stdin() {
    let dir = TempDir::new().unwrap();
    let value = json(richnote(&dir, &["normalize", "-"], r#"{"html":"<ul><li>a</li></ul>"}"#));
    assert_eq!(value["markup"], "<ul><li>a</li></ul>");
    assert_eq!(value["document"]["content"][0]["type"], "bulletList");
}

#[test]
fn normalize_keeps_unmodelled_kinds() {
    let dir = TempDir::new().unwrap();
    let stored = r#"{"type":"doc","content":[
        {"type":"paragraph","content":[{"type":"text","text":"BP","marks":[{"type":"highlight"},{"type":"bold"}]}]},
        {"type":"image","attrs":{"src":"scan.png"}}
    ]}"#;
    let value = json(richnote(&dir, &["normalize"], stored));
    assert_eq!(value["markup"], "<p><strong>BP</strong></p>");
    assert_eq!(value["document"]["content"][1]["type"], "image");
}

#[test]
fn document_roundtrip_through_cli() {
    let dir = TempDir::new().unwrap();
    let markup = "<p>Hello <em>world</em></p><ol><li>one</li></ol>";
    let doc_json = stdout(richnote(&dir, &["to-document"], markup));
    richnote(&dir, &["to-markup"], &doc_json)
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{markup}\n")));
}

#[test]
fn has_table() {
    let dir = TempDir::new().unwrap();
    for (input, expected) in [
        ("<table><tr><td>x</td></tr></table>", "true\n"),
        (
            r#"{"type":"doc","content":[{"type":"tableRow","colspan":2,"content":[{"type":"mystery"}]}]}"#,
            "true\n",
        ),
        (
            r#"{"type":"doc","content":[{"type":"columns","content":[{"type":"table"}]}]}"#,
            "true\n",
        ),
        ("<p>x</p>", "false\n"),
    ] {
        richnote(&dir, &["has-table"], input)
            .assert()
            .success()
            .stdout(predicate::str::diff(expected));
    }
}

#[test]
fn plain_text_codec() {
    let dir = TempDir::new().unwrap();
    let doc_json = stdout(richnote(&dir, &["decode-text"], "# Title\n- item1\n- item2"));
    assert_eq!(
        stdout(richnote(&dir, &["encode-text"], &doc_json)),
        "# Title\n- item1\n- item2"
    );
    assert_eq!(
        stdout(richnote(
            &dir,
            &["convert", "--from", "markup", "--to", "text"],
            "<h1>T</h1><p><b>bold</b> text</p>"
        )),
        "# T\nbold text"
    );
}

#[test]
fn project_and_stats() {
    let dir = TempDir::new().unwrap();
    assert_eq!(
        json(richnote(&dir, &["project"], "<strong><em>x</em></strong>")),
        serde_json::json!([{
            "kind": "paragraph",
            "segments": [{"text": "x", "bold": true, "italic": true}]
        }])
    );

    let stats = json(richnote(&dir, &["stats"], "<p>two words</p><p>more</p>"));
    assert_eq!(stats["blocks"], 2);
    assert_eq!(stats["words"], 3);
}

#[test]
fn config_file_limits_depth() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("limits.toml");
    fs::write(&config, "max_depth = 2\ntable_policy = \"fail-closed\"\n").unwrap();

    let doc_json = stdout(richnote(
        &dir,
        &["--config", config.to_str().unwrap(), "to-document"],
        "<blockquote><blockquote><blockquote><p>x</p></blockquote></blockquote></blockquote>",
    ));
    let doc: Document = serde_json::from_str(&doc_json).unwrap();
    assert_eq!(
        to_markup(&doc),
        "<blockquote><blockquote><p>x</p></blockquote></blockquote>"
    );
}

#[test]
fn default_config_in_working_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("richnote.toml"), "max_depth = 1\n").unwrap();

    let doc_json = stdout(richnote(
        &dir,
        &["to-document"],
        "<blockquote><blockquote><p>x</p></blockquote></blockquote>",
    ));
    let doc: Document = serde_json::from_str(&doc_json).unwrap();
    assert_eq!(to_markup(&doc), "<blockquote><p>x</p></blockquote>");
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "table_policy = \"sometimes\"\n").unwrap();

    richnote(&dir, &["--config", config.to_str().unwrap(), "has-table"], "")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing config"));
}

#[test]
fn to_markup_rejects_non_document() {
    richnote(&TempDir::new().unwrap(), &["to-markup"], "<p>not json</p>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input is not document JSON"));
}
