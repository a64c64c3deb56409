//! Portable Text to HTML writer
//!
//! Serializes a flat block sequence into an HTML fragment. Rendering is
//! table-driven: every block style, list kind and decorator maps to a [`Tag`],
//! and the table can be overridden entry by entry.

use crate::block::{Block, Child, ListItem, MarkDef, Span, Style};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which default rendering table to start from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Tags carry presentational classes
    #[default]
    Styled,
    /// Same tags, no classes
    Plain,
}

/// An HTML element with an optional class attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub class: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    fn without_class(mut self) -> Self {
        self.class = None;
        self
    }
}

/// Rendering table for Portable Text blocks
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    /// Block style name -> wrapper
    styles: Vec<(String, Tag)>,
    /// Decorator name -> wrapper, in nesting order (outermost first)
    decorators: Vec<(String, Tag)>,
    bullet_list: Tag,
    number_list: Tag,
    list_item: Tag,
    link: Tag,
    line_break: Tag,
    /// Used when a style is unknown and no `normal` entry exists
    fallback: Tag,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::styled()
    }
}

impl HtmlRenderer {
    /// Renderer for the given mode
    pub fn new(mode: RenderMode) -> Self {
        match mode {
            RenderMode::Styled => Self::styled(),
            RenderMode::Plain => Self::plain(),
        }
    }

    /// Default table with presentational classes
    pub fn styled() -> Self {
        let styles = [
            ("normal", "p", "mb-4 leading-relaxed"),
            ("h1", "h1", "text-4xl font-bold mb-6"),
            ("h2", "h2", "text-3xl font-bold mb-5"),
            ("h3", "h3", "text-2xl font-semibold mb-4"),
            ("h4", "h4", "text-xl font-semibold mb-3"),
            ("h5", "h5", "text-lg font-semibold mb-2"),
            ("h6", "h6", "text-base font-semibold mb-2"),
            ("blockquote", "blockquote", "border-l-4 pl-4 italic my-4"),
        ];
        let decorators = [
            ("strong", "strong", "font-bold"),
            ("em", "em", "italic"),
            ("underline", "u", "underline"),
            ("strike-through", "s", "line-through"),
            ("code", "code", "font-mono text-sm bg-gray-100 rounded px-1"),
        ];

        Self {
            styles: styles
                .into_iter()
                .map(|(style, tag, class)| (style.to_string(), Tag::new(tag).with_class(class)))
                .collect(),
            decorators: decorators
                .into_iter()
                .map(|(mark, tag, class)| (mark.to_string(), Tag::new(tag).with_class(class)))
                .collect(),
            bullet_list: Tag::new("ul").with_class("list-disc pl-6 mb-4"),
            number_list: Tag::new("ol").with_class("list-decimal pl-6 mb-4"),
            list_item: Tag::new("li").with_class("mb-1"),
            link: Tag::new("a").with_class("text-blue-600 underline hover:text-blue-800"),
            line_break: Tag::new("br"),
            fallback: Tag::new("p"),
        }
    }

    /// Default table without classes, for contexts where presentational
    /// markup is unwanted (email bodies, feeds)
    pub fn plain() -> Self {
        let styled = Self::styled();
        Self {
            styles: strip_classes(styled.styles),
            decorators: strip_classes(styled.decorators),
            bullet_list: styled.bullet_list.without_class(),
            number_list: styled.number_list.without_class(),
            list_item: styled.list_item.without_class(),
            link: styled.link.without_class(),
            line_break: styled.line_break.without_class(),
            fallback: styled.fallback,
        }
    }

    /// Set the wrapper for a block style (known or custom)
    pub fn with_style(mut self, style: impl Into<String>, tag: Tag) -> Self {
        upsert(&mut self.styles, style.into(), tag);
        self
    }

    /// Set the class of an existing block style; unknown styles are ignored
    pub fn with_style_class(mut self, style: &str, class: impl Into<String>) -> Self {
        if let Some((_, tag)) = self.styles.iter_mut().find(|(s, _)| s == style) {
            tag.class = Some(class.into());
        }
        self
    }

    /// Set the wrapper for a decorator. New decorators nest innermost.
    pub fn with_mark(mut self, mark: impl Into<String>, tag: Tag) -> Self {
        upsert(&mut self.decorators, mark.into(), tag);
        self
    }

    /// Set the class of an existing decorator; unknown decorators are ignored
    pub fn with_mark_class(mut self, mark: &str, class: impl Into<String>) -> Self {
        if let Some((_, tag)) = self.decorators.iter_mut().find(|(m, _)| m == mark) {
            tag.class = Some(class.into());
        }
        self
    }

    /// Set the wrapper for a list kind
    pub fn with_list(mut self, kind: &ListItem, tag: Tag) -> Self {
        match kind {
            ListItem::Number => self.number_list = tag,
            _ => self.bullet_list = tag,
        }
        self
    }

    /// Set the link anchor's class (the tag itself is always `a`)
    pub fn with_link_class(mut self, class: Option<String>) -> Self {
        self.link.class = class;
        self
    }

    /// Render blocks to an HTML fragment
    pub fn render(&self, blocks: &[Block]) -> String {
        let mut writer = Writer::new(self);
        for block in blocks {
            writer.write_block(block);
        }
        writer.finish()
    }

    /// Render an untyped block array.
    ///
    /// Anything that is not an array renders as `""`. Items that are not
    /// text blocks have their `children` rendered without a wrapper; items
    /// with no usable children are skipped.
    pub fn render_value(&self, value: &Value) -> String {
        let Some(items) = value.as_array() else {
            return String::new();
        };

        let mut writer = Writer::new(self);
        for (index, item) in items.iter().enumerate() {
            let is_block = item.get("_type").and_then(Value::as_str) == Some("block");
            if is_block {
                if let Ok(block) = Block::deserialize(item) {
                    writer.write_block(&block);
                    continue;
                }
            }
            match Loose::deserialize(item) {
                Ok(loose) if !loose.children.is_empty() => writer.write_loose(&loose),
                _ => {
                    let kind = item.get("_type").and_then(Value::as_str).unwrap_or_default();
                    tracing::debug!(index, kind, "Skipping item without renderable children");
                }
            }
        }
        writer.finish()
    }

    fn style_tag(&self, style: &Style) -> &Tag {
        let name = style.as_str();
        if let Some((_, tag)) = self.styles.iter().find(|(s, _)| s == name) {
            return tag;
        }
        tracing::debug!(style = name, "Unknown block style, rendering as normal");
        self.styles
            .iter()
            .find(|(s, _)| s == "normal")
            .map_or(&self.fallback, |(_, tag)| tag)
    }

    fn list_tag(&self, kind: &ListItem) -> &Tag {
        match kind {
            ListItem::Number => &self.number_list,
            // Unknown list kinds render as bullets
            _ => &self.bullet_list,
        }
    }
}

/// Render blocks with the given renderer
pub fn to_html(blocks: &[Block], renderer: &HtmlRenderer) -> String {
    renderer.render(blocks)
}

/// Render an untyped JSON block array with the given renderer
pub fn to_html_value(value: &Value, renderer: &HtmlRenderer) -> String {
    renderer.render_value(value)
}

/// Render optional blocks with a default table; `None` renders as `""`
pub fn render_to_html(blocks: Option<&[Block]>, mode: RenderMode) -> String {
    match blocks {
        Some(blocks) if !blocks.is_empty() => HtmlRenderer::new(mode).render(blocks),
        _ => String::new(),
    }
}

/// A non-block array item whose children can still be rendered
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Loose {
    #[serde(default)]
    mark_defs: Vec<MarkDef>,
    #[serde(default)]
    children: Vec<Child>,
}

/// A list that is open in the output, with an open `<li>`
#[derive(Debug)]
struct OpenList {
    kind: ListItem,
    level: u32,
}

/// HTML writer state
///
/// Block sequences are folded one block at a time; `open_lists` is the stack
/// of lists currently open in the output, innermost last.
struct Writer<'a> {
    renderer: &'a HtmlRenderer,
    output: String,
    open_lists: Vec<OpenList>,
}

impl<'a> Writer<'a> {
    fn new(renderer: &'a HtmlRenderer) -> Self {
        Self {
            renderer,
            output: String::new(),
            open_lists: Vec::new(),
        }
    }

    fn finish(mut self) -> String {
        self.close_lists_above(0);
        self.output
    }

    fn write_block(&mut self, block: &Block) {
        match &block.list_item {
            Some(kind) => self.write_list_item(block, kind, block.level.unwrap_or(1).max(1)),
            None => {
                self.close_lists_above(0);
                let renderer = self.renderer;
                let tag = renderer.style_tag(&block.style);
                self.open_tag(tag);
                self.write_children(&block.children, &block.mark_defs);
                self.close_tag(tag);
            }
        }
    }

    fn write_loose(&mut self, loose: &Loose) {
        self.close_lists_above(0);
        self.write_children(&loose.children, &loose.mark_defs);
    }

    fn write_list_item(&mut self, block: &Block, kind: &ListItem, level: u32) {
        self.close_lists_above(level);

        match self.open_lists.last() {
            Some(top) if top.level == level && top.kind == *kind => {
                // Sibling item in the same list
                self.output.push_str("</li>");
            }
            Some(top) if top.level == level => {
                // Same depth, different kind: end this list, start another
                self.close_list();
                self.open_list(kind, level);
            }
            // Empty stack or a deeper level: nest inside the open item
            _ => self.open_list(kind, level),
        }

        let renderer = self.renderer;
        self.open_tag(&renderer.list_item);
        self.write_children(&block.children, &block.mark_defs);
    }

    fn open_list(&mut self, kind: &ListItem, level: u32) {
        let renderer = self.renderer;
        self.open_tag(renderer.list_tag(kind));
        self.open_lists.push(OpenList {
            kind: kind.clone(),
            level,
        });
    }

    fn close_list(&mut self) {
        if let Some(list) = self.open_lists.pop() {
            let renderer = self.renderer;
            self.close_tag(&renderer.list_item);
            self.close_tag(renderer.list_tag(&list.kind));
        }
    }

    /// Close open lists deeper than `level`
    fn close_lists_above(&mut self, level: u32) {
        while self.open_lists.last().is_some_and(|top| top.level > level) {
            self.close_list();
        }
    }

    fn write_children(&mut self, children: &[Child], mark_defs: &[MarkDef]) {
        let renderer = self.renderer;
        for child in children {
            match child {
                Child::Span(span) => self.write_span(span, mark_defs),
                Child::Break(_) => {
                    let tag = &renderer.line_break;
                    self.output.push('<');
                    self.output.push_str(&tag.name);
                    self.push_class(tag);
                    self.output.push_str(" />");
                }
                Child::Unknown(object) => {
                    let kind = object.get("_type").and_then(Value::as_str).unwrap_or_default();
                    tracing::debug!(kind, "Unknown inline object, rendering nothing");
                }
            }
        }
    }

    /// Write a span inside its mark wrappers: link annotations outermost,
    /// then decorators in table order. Repeated marks apply once.
    fn write_span(&mut self, span: &Span, mark_defs: &[MarkDef]) {
        let renderer = self.renderer;
        let mut links: Vec<&MarkDef> = Vec::new();
        let mut decorators: Vec<&Tag> = Vec::new();

        for mark in &span.marks {
            if let Some(def) = mark_defs.iter().find(|d| d.key == *mark) {
                if !def.is_link() {
                    tracing::debug!(kind = %def.kind, "Unknown annotation type, rendering text only");
                } else if !links.iter().any(|l| l.key == def.key) {
                    links.push(def);
                }
            } else if !renderer.decorators.iter().any(|(m, _)| m == mark) {
                tracing::debug!(mark = %mark, "Unknown mark, rendering text only");
            }
        }
        for (name, tag) in &renderer.decorators {
            if span.marks.contains(name) && !mark_defs.iter().any(|d| d.key == *name) {
                decorators.push(tag);
            }
        }

        for def in &links {
            self.open_link(def);
        }
        for tag in &decorators {
            self.open_tag(tag);
        }

        self.output.push_str(&escape_text(&span.text));

        for tag in decorators.iter().rev() {
            self.close_tag(tag);
        }
        for _ in &links {
            self.close_tag(&renderer.link);
        }
    }

    fn open_link(&mut self, def: &MarkDef) {
        let renderer = self.renderer;
        let tag = &renderer.link;
        self.output.push('<');
        self.output.push_str(&tag.name);
        self.output.push_str(" href=\"");
        self.output
            .push_str(&escape_attr(def.href.as_deref().unwrap_or("#")));
        self.output.push('"');
        self.push_class(tag);
        if def.blank {
            self.output
                .push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
        }
        self.output.push('>');
    }

    // Helper methods

    fn open_tag(&mut self, tag: &Tag) {
        self.output.push('<');
        self.output.push_str(&tag.name);
        self.push_class(tag);
        self.output.push('>');
    }

    fn close_tag(&mut self, tag: &Tag) {
        self.output.push_str("</");
        self.output.push_str(&tag.name);
        self.output.push('>');
    }

    fn push_class(&mut self, tag: &Tag) {
        if let Some(class) = &tag.class {
            self.output.push_str(" class=\"");
            self.output.push_str(&escape_attr(class));
            self.output.push('"');
        }
    }
}

fn strip_classes(entries: Vec<(String, Tag)>) -> Vec<(String, Tag)> {
    entries
        .into_iter()
        .map(|(name, tag)| (name, tag.without_class()))
        .collect()
}

fn upsert(entries: &mut Vec<(String, Tag)>, name: String, tag: Tag) {
    match entries.iter_mut().find(|(n, _)| *n == name) {
        Some((_, existing)) => *existing = tag,
        None => entries.push((name, tag)),
    }
}

/// Escape text for HTML content (`&`, `<`, `>`).
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape text for quoted HTML attribute values (also `"` and `'`).
pub fn escape_attr(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}
