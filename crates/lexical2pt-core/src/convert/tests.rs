use super::*;
use crate::keys::{SequentialKeys, reset_key_counter};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

fn doc(children: Value) -> Value {
    json!({ "root": { "type": "root", "children": children } })
}

fn text(s: &str) -> Value {
    json!({ "type": "text", "text": s, "format": 0 })
}

fn formatted(s: &str, format: u32) -> Value {
    json!({ "type": "text", "text": s, "format": format })
}

fn paragraph(children: Value) -> Value {
    json!({ "type": "paragraph", "children": children })
}

fn list(list_type: &str, items: Value) -> Value {
    json!({ "type": "list", "listType": list_type, "children": items })
}

fn item(children: Value) -> Value {
    json!({ "type": "listitem", "children": children })
}

fn convert_seq(document: &Value) -> Vec<Block> {
    convert_with_keys(document, &mut SequentialKeys::default())
}

fn marks_of(block: &Block) -> Vec<Vec<String>> {
    block.spans().map(|s| s.marks.clone()).collect()
}

/// Every `_key` in the blocks: block keys, child keys and mark definition keys
fn all_keys(blocks: &[Block]) -> Vec<String> {
    let mut keys = Vec::new();
    for block in blocks {
        keys.push(block.key.clone());
        keys.extend(block.mark_defs.iter().map(|d| d.key.clone()));
        for child in &block.children {
            match child {
                Child::Span(s) => keys.push(s.key.clone()),
                Child::Break(b) => keys.push(b.key.clone()),
                Child::Unknown(_) => {}
            }
        }
    }
    keys
}

#[test]
fn test_invalid_documents_convert_to_nothing() {
    for value in [
        json!(null),
        json!(42),
        json!("root"),
        json!([]),
        json!({}),
        json!({ "root": null }),
        json!({ "root": {} }),
        json!({ "root": { "children": {} } }),
        json!({ "root": { "children": "[]" } }),
    ] {
        assert!(convert_seq(&value).is_empty(), "Expected no blocks for {value}");
    }
}

#[test]
fn test_empty_root() {
    assert!(convert_seq(&doc(json!([]))).is_empty());
}

#[test]
fn test_simple_paragraph() {
    let blocks = convert_seq(&doc(json!([paragraph(json!([text("Hello")]))])));
    assert_eq!(
        blocks,
        vec![Block::new("k0", Style::Normal).with_children(vec![Child::span("k1", "Hello")])]
    );
}

#[test]
fn test_format_bits_to_marks() {
    let blocks = convert_seq(&doc(json!([paragraph(json!([formatted("x", 1 | 8)]))])));
    assert_eq!(marks_of(&blocks[0]), vec![vec!["strong", "underline"]]);

    let blocks = convert_seq(&doc(json!([paragraph(json!([formatted("x", 31)]))])));
    assert_eq!(
        marks_of(&blocks[0]),
        vec![vec!["strong", "em", "strike-through", "underline", "code"]]
    );

    let blocks = convert_seq(&doc(json!([paragraph(json!([formatted("x", 16 | 2)]))])));
    assert_eq!(marks_of(&blocks[0]), vec![vec!["em", "code"]]);
}

#[test]
fn test_unmodelled_format_bits_ignored() {
    // 32 = subscript, 128 = highlight
    let blocks = convert_seq(&doc(json!([paragraph(json!([formatted("x", 1 | 32 | 128)]))])));
    assert_eq!(marks_of(&blocks[0]), vec![vec!["strong"]]);
}

#[test]
fn test_link_wraps_children() {
    let link = json!({
        "type": "link",
        "fields": { "url": "/a", "newTab": true },
        "children": [formatted("one", 1), text(" two")]
    });
    let blocks = convert_seq(&doc(json!([paragraph(json!([link]))])));

    assert_eq!(
        blocks,
        vec![
            Block::new("k0", Style::Normal)
                .with_mark_defs(vec![MarkDef::link("k1", "/a", true)])
                .with_children(vec![
                    Child::Span(
                        Span::new("k2", "one").with_marks(vec!["k1".into(), "strong".into()])
                    ),
                    Child::Span(Span::new("k3", " two").with_marks(vec!["k1".into()])),
                ])
        ]
    );
}

#[test]
fn test_link_href_fallbacks() {
    let links = json!([
        { "type": "link", "url": "/plain", "children": [text("a")] },
        { "type": "autolink", "url": "https://auto.example", "children": [text("b")] },
        { "type": "link", "fields": { "linkType": "internal" }, "children": [text("c")] },
        { "type": "link", "fields": { "url": "/fields" }, "url": "/ignored", "children": [text("d")] }
    ]);
    let blocks = convert_seq(&doc(json!([paragraph(links)])));
    let hrefs: Vec<_> = blocks[0]
        .mark_defs
        .iter()
        .map(|d| d.href.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(hrefs, vec!["/plain", "https://auto.example", "#", "/fields"]);
    assert!(blocks[0].mark_defs.iter().all(|d| d.is_link() && !d.blank));
}

#[test]
fn test_link_inside_link_keeps_both_marks() {
    let inner = json!({ "type": "link", "url": "/inner", "children": [text("in")] });
    let outer = json!({ "type": "link", "url": "/outer", "children": [text("out"), inner] });
    let blocks = convert_seq(&doc(json!([paragraph(json!([outer]))])));

    let block = &blocks[0];
    assert_eq!(block.mark_defs.len(), 2);
    let outer_key = block.mark_defs[0].key.clone();
    let inner_key = block.mark_defs[1].key.clone();
    assert_eq!(
        marks_of(block),
        vec![vec![outer_key.clone()], vec![outer_key, inner_key]]
    );
}

#[test]
fn test_link_without_text_leaves_no_mark_def() {
    let link = json!({ "type": "link", "url": "/empty", "children": [] });
    let blocks = convert_seq(&doc(json!([paragraph(json!([link]))])));
    assert!(blocks[0].mark_defs.is_empty());
    assert_eq!(blocks[0].children.len(), 1);
    assert_eq!(blocks[0].plain_text(), "");
}

#[test]
fn test_nested_list_flattens_with_levels() {
    let nested = list("bullet", json!([item(json!([text("B")]))]));
    let document = doc(json!([list("bullet", json!([item(json!([text("A"), nested]))]))]));
    let blocks = convert_seq(&document);

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].list_item, Some(ListItem::Bullet));
    assert_eq!(blocks[0].level, Some(1));
    assert_eq!(blocks[0].plain_text(), "A");
    assert_eq!(blocks[1].list_item, Some(ListItem::Bullet));
    assert_eq!(blocks[1].level, Some(2));
    assert_eq!(blocks[1].plain_text(), "B");
}

#[test]
fn test_parent_item_precedes_nested_list() {
    // Nested list first in the item's children; the item's own text still
    // comes first in the output
    let nested = list("number", json!([item(json!([text("child")]))]));
    let document = doc(json!([list("bullet", json!([item(json!([nested, text("parent")]))]))]));
    let blocks = convert_seq(&document);

    let summary: Vec<_> = blocks
        .iter()
        .map(|b| (b.plain_text(), b.list_item.clone(), b.level))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("parent".to_string(), Some(ListItem::Bullet), Some(1)),
            ("child".to_string(), Some(ListItem::Number), Some(2)),
        ]
    );
}

#[test]
fn test_deeply_nested_lists() {
    let level3 = list("bullet", json!([item(json!([text("3")]))]));
    let level2 = list("bullet", json!([item(json!([text("2"), level3]))]));
    let document = doc(json!([list(
        "number",
        json!([item(json!([text("1"), level2])), item(json!([text("1b")]))])
    )]));
    let blocks = convert_seq(&document);

    let levels: Vec<_> = blocks.iter().map(|b| (b.plain_text(), b.level)).collect();
    assert_eq!(
        levels,
        vec![
            ("1".to_string(), Some(1)),
            ("2".to_string(), Some(2)),
            ("3".to_string(), Some(3)),
            ("1b".to_string(), Some(1)),
        ]
    );
    assert_eq!(blocks[0].list_item, Some(ListItem::Number));
    assert_eq!(blocks[3].list_item, Some(ListItem::Number));
}

#[test]
fn test_check_list_is_bullet() {
    let blocks = convert_seq(&doc(json!([list("check", json!([item(json!([text("todo")]))]))])));
    assert_eq!(blocks[0].list_item, Some(ListItem::Bullet));
}

#[test]
fn test_list_non_item_child_converts_at_same_level() {
    let blocks = convert_seq(&doc(json!([list(
        "bullet",
        json!([paragraph(json!([text("stray")])), item(json!([text("ok")]))])
    )])));
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].list_item, None);
    assert_eq!(blocks[0].level, None);
    assert_eq!(blocks[0].plain_text(), "stray");
    assert_eq!(blocks[1].level, Some(1));
}

#[test]
fn test_list_item_outside_list() {
    let blocks = convert_seq(&doc(json!([item(json!([text("orphan")]))])));
    assert_eq!(blocks[0].list_item, Some(ListItem::Bullet));
    assert_eq!(blocks[0].level, Some(1));
}

#[test]
fn test_empty_blocks_get_placeholder_span() {
    let blocks = convert_seq(&doc(json!([
        paragraph(json!([])),
        { "type": "heading", "tag": "h2" },
        item(json!([]))
    ])));
    assert_eq!(blocks.len(), 3);
    for block in &blocks {
        assert_eq!(block.children.len(), 1);
        assert!(matches!(&block.children[0], Child::Span(s) if s.text.is_empty() && s.marks.is_empty()));
    }
}

#[test]
fn test_heading_styles() {
    let blocks = convert_seq(&doc(json!([
        { "type": "heading", "tag": "h3", "children": [text("three")] },
        { "type": "heading", "tag": "h7", "children": [text("seven")] },
        { "type": "heading", "children": [text("none")] }
    ])));
    let styles: Vec<_> = blocks.iter().map(|b| b.style.clone()).collect();
    assert_eq!(styles, vec![Style::H3, Style::H2, Style::H2]);
}

#[test]
fn test_heading_with_odd_tag_falls_back_to_h2() {
    let document = doc(json!([
        { "type": "heading", "tag": null, "children": [text("null")] },
        { "type": "heading", "tag": 3, "children": [text("number")] }
    ]));
    let report = convert_report(&document, &mut SequentialKeys::default());
    assert!(report.skipped.is_empty());
    let styles: Vec<_> = report.blocks.iter().map(|b| b.style.clone()).collect();
    assert_eq!(styles, vec![Style::H2, Style::H2]);
}

#[test]
fn test_list_item_attributes_of_wrong_type_are_ignored() {
    let items = json!([
        { "type": "listitem", "value": "1", "checked": "no", "children": [text("kept")] }
    ]);
    let document = doc(json!([list("number", items)]));
    let report = convert_report(&document, &mut SequentialKeys::default());
    assert!(report.skipped.is_empty());
    assert_eq!(report.blocks.len(), 1);
    assert_eq!(report.blocks[0].plain_text(), "kept");
    assert_eq!(report.blocks[0].list_item, Some(ListItem::Number));
    assert_eq!(report.blocks[0].level, Some(1));
}

#[test]
fn test_link_attributes_of_wrong_type_are_ignored() {
    let links = json!([
        { "type": "link", "url": "/a", "target": 5, "rel": 0, "children": [text("a")] },
        { "type": "link", "url": 7, "fields": [], "children": [text("b")] }
    ]);
    let document = doc(json!([paragraph(links)]));
    let report = convert_report(&document, &mut SequentialKeys::default());
    assert!(report.skipped.is_empty());
    let hrefs: Vec<_> = report.blocks[0]
        .mark_defs
        .iter()
        .map(|d| d.href.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(hrefs, vec!["/a", "#"]);
    assert_eq!(report.blocks[0].plain_text(), "ab");
}

#[test]
fn test_quote() {
    let blocks = convert_seq(&doc(json!([{ "type": "quote", "children": [text("said")] }])));
    assert_eq!(blocks[0].style, Style::Blockquote);
    assert_eq!(blocks[0].plain_text(), "said");
}

#[test]
fn test_inline_nodes_at_block_level() {
    let blocks = convert_seq(&doc(json!([
        { "type": "link", "url": "/x", "children": [text("link")] },
        { "type": "linebreak" },
        formatted("bare", 2)
    ])));
    assert_eq!(blocks.len(), 3);

    assert_eq!(blocks[0].style, Style::Normal);
    assert_eq!(blocks[0].mark_defs.len(), 1);
    assert_eq!(blocks[0].plain_text(), "link");

    assert_eq!(blocks[1].children.len(), 1);
    assert!(matches!(blocks[1].children[0], Child::Break(_)));

    assert_eq!(marks_of(&blocks[2]), vec![vec!["em"]]);
}

#[test]
fn test_line_break_inside_paragraph() {
    let blocks = convert_seq(&doc(json!([paragraph(json!([
        text("a"),
        { "type": "linebreak" },
        text("b")
    ]))])));
    assert_eq!(
        blocks[0].children,
        vec![Child::span("k1", "a"), Child::line_break("k2"), Child::span("k3", "b")]
    );
}

#[test]
fn test_tab_is_text() {
    let blocks = convert_seq(&doc(json!([paragraph(json!([text("a"), { "type": "tab" }, text("b")]))])));
    assert_eq!(blocks[0].plain_text(), "a\tb");
}

#[test]
fn test_formatted_tab_carries_decorators() {
    let tab = json!({ "type": "tab", "text": "\t", "format": 1 });
    let blocks = convert_seq(&doc(json!([paragraph(json!([text("a"), tab]))])));
    assert_eq!(marks_of(&blocks[0]), vec![vec![], vec!["strong".to_string()]]);
}

#[test]
fn test_unknown_containers_pass_through() {
    let blocks = convert_seq(&doc(json!([
        { "type": "layout", "children": [paragraph(json!([text("inside")]))] },
        { "type": "root", "children": [paragraph(json!([text("nested root")]))] },
        { "type": "horizontalrule" },
        { "type": "upload", "value": { "id": 1 } }
    ])));
    let texts: Vec<_> = blocks.iter().map(Block::plain_text).collect();
    assert_eq!(texts, vec!["inside", "nested root"]);
}

#[test]
fn test_unknown_inline_wrapper_keeps_text() {
    let wrapper = json!({ "type": "mark", "children": [formatted("x", 1)] });
    let blocks = convert_seq(&doc(json!([paragraph(json!([text("a "), wrapper]))])));
    assert_eq!(blocks[0].plain_text(), "a x");
    assert_eq!(marks_of(&blocks[0]), vec![vec![], vec!["strong".to_string()]]);
}

#[test]
fn test_malformed_node_is_skipped() {
    let document = doc(json!([
        paragraph(json!([text("before")])),
        paragraph(json!([{ "type": "text", "format": 1 }])),
        { "type": "quote", "children": "not a list" },
        paragraph(json!([text("after")]))
    ]));

    let report = convert_report(&document, &mut SequentialKeys::default());
    let texts: Vec<_> = report.blocks.iter().map(Block::plain_text).collect();
    assert_eq!(texts, vec!["before", "after"]);

    assert_eq!(report.skipped.len(), 2);
    let ConvertError::InvalidNode { index, kind, .. } = &report.skipped[0];
    assert_eq!((*index, kind.as_str()), (1, "paragraph"));
    let ConvertError::InvalidNode { index, kind, .. } = &report.skipped[1];
    assert_eq!((*index, kind.as_str()), (2, "quote"));
    assert!(report.skipped[1].to_string().starts_with("Malformed quote node at root index 2"));
}

#[test]
fn test_every_block_has_children() {
    let document = doc(json!([
        paragraph(json!([])),
        list("bullet", json!([item(json!([list("bullet", json!([item(json!([]))]))]))])),
        { "type": "quote" },
        { "type": "link", "url": "/x", "children": [] }
    ]));
    let blocks = convert_seq(&document);
    assert_eq!(blocks.len(), 5);
    assert!(blocks.iter().all(|b| !b.children.is_empty()));
}

#[test]
fn test_mark_defs_are_block_scoped() {
    let link = |url: &str| json!({ "type": "link", "url": url, "children": [text("l")] });
    let blocks = convert_seq(&doc(json!([
        paragraph(json!([link("/one")])),
        paragraph(json!([text("no links")])),
        paragraph(json!([link("/two")]))
    ])));
    assert_eq!(blocks[0].mark_defs.len(), 1);
    assert!(blocks[1].mark_defs.is_empty());
    assert_eq!(blocks[2].mark_defs.len(), 1);
    assert_eq!(blocks[2].mark_defs[0].href.as_deref(), Some("/two"));

    for block in &blocks {
        for def in &block.mark_defs {
            assert!(block.spans().any(|s| s.marks.contains(&def.key)));
        }
    }
}

#[test]
fn test_keys_unique_within_document() {
    let document = doc(json!([
        paragraph(json!([text("a"), { "type": "link", "url": "/", "children": [text("b")] }])),
        list("number", json!([item(json!([text("c"), { "type": "linebreak" }, text("d")]))]))
    ]));
    let keys = all_keys(&convert(&document));
    let unique: HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
}

#[test]
fn test_keys_unique_across_calls() {
    reset_key_counter();
    let document = doc(json!([paragraph(json!([text("same")]))]));
    let first: HashSet<_> = all_keys(&convert(&document)).into_iter().collect();
    let second: HashSet<_> = all_keys(&convert(&document)).into_iter().collect();
    assert!(first.is_disjoint(&second));
}

#[test]
fn test_fresh_generators_are_isolated() {
    let document = doc(json!([paragraph(json!([text("same")]))]));
    let a = convert_with_keys(&document, &mut SequentialKeys::default());
    let b = convert_with_keys(&document, &mut SequentialKeys::default());
    assert_eq!(a, b);
}

#[test]
fn test_typed_document_matches_value() {
    let value = doc(json!([
        { "type": "heading", "tag": "h1", "children": [text("T")] },
        list("bullet", json!([item(json!([formatted("x", 3)]))]))
    ]));
    let typed = Document::from_value(&value).unwrap().unwrap();
    assert_eq!(
        convert_document(&typed, &mut SequentialKeys::default()),
        convert_seq(&value)
    );
}

#[test]
fn test_input_is_not_mutated() {
    let document = doc(json!([paragraph(json!([text("x")]))]));
    let before = document.clone();
    let _ = convert(&document);
    assert_eq!(document, before);
}
