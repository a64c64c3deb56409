//! Lexical to Portable Text conversion
//!
//! Walks a Lexical tree and emits a flat sequence of Portable Text blocks.
//! Nested lists become sibling blocks carrying a `level`; link nodes become
//! mark definitions referenced from the spans they wrap.

use crate::keys::{GlobalKeys, KeySource};
use lexical_ast::{self as ast, Document, ListType, Node, TextFormat, root_children};
use portable_text::{Block, Child, ListItem, MarkDef, Span, Style};
use serde_json::Value;
use thiserror::Error;

/// Conversion errors
///
/// These never abort a conversion: the offending top-level node is skipped
/// and the error is logged and reported in [`Conversion::skipped`].
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Malformed {kind} node at root index {index}: {source}")]
    InvalidNode {
        index: usize,
        kind: String,
        source: serde_json::Error,
    },
}

/// Result of converting a document, including the nodes that were skipped
#[derive(Debug, Default)]
pub struct Conversion {
    pub blocks: Vec<Block>,
    pub skipped: Vec<ConvertError>,
}

/// Convert a Lexical document to Portable Text blocks.
///
/// Anything without a `root.children` array converts to no blocks. Keys come
/// from the process-wide [`GlobalKeys`] counter.
pub fn convert(document: &Value) -> Vec<Block> {
    convert_with_keys(document, &mut GlobalKeys)
}

/// Convert a Lexical document using the given key source
pub fn convert_with_keys(document: &Value, keys: &mut dyn KeySource) -> Vec<Block> {
    convert_report(document, keys).blocks
}

/// Convert a Lexical document, also returning the top-level nodes that could
/// not be decoded
pub fn convert_report(document: &Value, keys: &mut dyn KeySource) -> Conversion {
    let mut conversion = Conversion::default();
    let Some(children) = root_children(document) else {
        return conversion;
    };

    let mut converter = Converter::new(keys);
    for (index, value) in children.iter().enumerate() {
        match Node::from_value(value) {
            Ok(node) => converter.convert_block(&node, 0, &mut conversion.blocks),
            Err(source) => {
                let kind = value
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("untyped")
                    .to_string();
                tracing::warn!(index, kind = %kind, error = %source, "Skipping malformed rich-text node");
                conversion
                    .skipped
                    .push(ConvertError::InvalidNode { index, kind, source });
            }
        }
    }
    conversion
}

/// Convert an already decoded document
pub fn convert_document(document: &Document, keys: &mut dyn KeySource) -> Vec<Block> {
    convert_nodes(&document.root.children, keys)
}

/// Convert a sequence of block-level nodes
pub fn convert_nodes(nodes: &[Node], keys: &mut dyn KeySource) -> Vec<Block> {
    let mut converter = Converter::new(keys);
    let mut blocks = Vec::new();
    for node in nodes {
        converter.convert_block(node, 0, &mut blocks);
    }
    blocks
}

/// Portable Text decorator for a Lexical text format bit
pub fn decorator(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::BOLD => Some("strong"),
        TextFormat::ITALIC => Some("em"),
        TextFormat::STRIKETHROUGH => Some("strike-through"),
        TextFormat::UNDERLINE => Some("underline"),
        TextFormat::CODE => Some("code"),
        _ => None,
    }
}

/// Inline content accumulated for one block
#[derive(Debug, Default)]
struct Inline {
    children: Vec<Child>,
    mark_defs: Vec<MarkDef>,
}

impl Inline {
    /// Drop mark definitions that no span references (links without text)
    fn prune_mark_defs(&mut self) {
        let children = &self.children;
        self.mark_defs.retain(|def| {
            children.iter().any(|c| match c {
                Child::Span(span) => span.marks.contains(&def.key),
                Child::Break(_) | Child::Unknown(_) => false,
            })
        });
    }
}

/// Converter state
struct Converter<'k> {
    keys: &'k mut dyn KeySource,
}

impl<'k> Converter<'k> {
    fn new(keys: &'k mut dyn KeySource) -> Self {
        Self { keys }
    }

    /// Convert a block-level node. `level` is the depth of the enclosing
    /// list (0 outside lists).
    fn convert_block(&mut self, node: &Node, level: u32, out: &mut Vec<Block>) {
        match node {
            Node::Paragraph(p) => out.push(self.text_block(Style::Normal, &p.children)),
            Node::Heading(h) => {
                let style = Style::heading(&h.tag).unwrap_or(Style::H2);
                out.push(self.text_block(style, &h.children));
            }
            Node::Quote(q) => out.push(self.text_block(Style::Blockquote, &q.children)),
            Node::List(list) => self.convert_list(list, level, out),
            // A list item outside a list reads as a bullet
            Node::ListItem(item) => self.convert_list_item(item, ListItem::Bullet, level + 1, out),
            // Inline nodes at block level get a block of their own
            Node::Link(_) | Node::AutoLink(_) | Node::LineBreak | Node::Text(_) | Node::Tab(_) => {
                out.push(self.text_block(Style::Normal, std::slice::from_ref(node)));
            }
            Node::Root(_) | Node::Unknown(_) => {
                for child in node.children() {
                    self.convert_block(child, level, out);
                }
            }
        }
    }

    fn convert_list(&mut self, list: &ast::List, level: u32, out: &mut Vec<Block>) {
        let kind = list_item_kind(list.kind());
        for child in &list.children {
            match child {
                Node::ListItem(item) => self.convert_list_item(item, kind.clone(), level + 1, out),
                other => self.convert_block(other, level, out),
            }
        }
    }

    /// Emit the item's own block, then the blocks of any lists nested in it.
    fn convert_list_item(
        &mut self,
        item: &ast::ListItem,
        kind: ListItem,
        level: u32,
        out: &mut Vec<Block>,
    ) {
        let (nested, inline): (Vec<&Node>, Vec<&Node>) = item
            .children
            .iter()
            .partition(|child| matches!(child, Node::List(_)));

        let block = self.text_block(Style::Normal, inline).with_list_item(kind, level);
        out.push(block);

        for node in nested {
            if let Node::List(list) = node {
                self.convert_list(list, level, out);
            }
        }
    }

    /// Build one block from inline nodes. Blocks always get at least one
    /// child: an empty span stands in for missing content.
    fn text_block<'n>(&mut self, style: Style, nodes: impl IntoIterator<Item = &'n Node>) -> Block {
        let key = self.keys.next_key();

        let mut inline = Inline::default();
        for node in nodes {
            self.convert_inline(node, &[], &mut inline);
        }
        inline.prune_mark_defs();

        if inline.children.is_empty() {
            inline
                .children
                .push(Child::Span(Span::new(self.keys.next_key(), "")));
        }

        Block::new(key, style)
            .with_mark_defs(inline.mark_defs)
            .with_children(inline.children)
    }

    /// Convert an inline node. `marks` are the link keys inherited from
    /// enclosing links.
    fn convert_inline(&mut self, node: &Node, marks: &[String], inline: &mut Inline) {
        match node {
            Node::Text(text) => {
                let span = Span::new(self.keys.next_key(), text.text.as_str())
                    .with_marks(span_marks(marks, text.format));
                inline.children.push(Child::Span(span));
            }
            Node::Tab(tab) => {
                let span = Span::new(self.keys.next_key(), tab.text.as_str())
                    .with_marks(span_marks(marks, tab.format));
                inline.children.push(Child::Span(span));
            }
            Node::LineBreak => {
                inline.children.push(Child::line_break(self.keys.next_key()));
            }
            Node::Link(link) | Node::AutoLink(link) => {
                let key = self.keys.next_key();
                inline.mark_defs.push(MarkDef::link(
                    key.as_str(),
                    link.href(),
                    link.opens_in_new_tab(),
                ));

                // Links inside links keep the outer mark as well
                let mut inherited = marks.to_vec();
                inherited.push(key);
                for child in &link.children {
                    self.convert_inline(child, &inherited, inline);
                }
            }
            // Any other wrapper (paragraphs, unknown nodes, nested lists) is
            // transparent
            other => {
                for child in other.children() {
                    self.convert_inline(child, marks, inline);
                }
            }
        }
    }
}

/// Inherited link keys followed by the decorators of `format`
fn span_marks(marks: &[String], format: TextFormat) -> Vec<String> {
    let mut span_marks = marks.to_vec();
    span_marks.extend(format.iter().filter_map(decorator).map(String::from));
    span_marks
}

fn list_item_kind(list_type: ListType) -> ListItem {
    match list_type {
        ListType::Number => ListItem::Number,
        ListType::Bullet | ListType::Check => ListItem::Bullet,
    }
}

#[cfg(test)]
mod tests;
