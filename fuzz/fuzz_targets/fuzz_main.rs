// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use libfuzzer_sys::fuzz_target;
use richnote_core::{
    contains_table, decode_text, encode_text, normalize, project_native, to_document, to_markup,
    Content,
};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    // every stage is total over arbitrary input
    let doc = to_document(&input);
    let markup = to_markup(&doc);
    let _ = project_native(&doc);
    let _ = contains_table(&Content::Markup(input.to_string()));

    // one pass reaches the serializer's fixed point
    assert_eq!(to_markup(&to_document(&markup)), markup);

    let _ = normalize(Content::from_json_str(&input).unwrap_or(Content::Empty));
    let _ = encode_text(&decode_text(&input));
});
