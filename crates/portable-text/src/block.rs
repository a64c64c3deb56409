//! Portable Text block types
//!
//! The subset of Portable Text that rich-text conversion produces: text
//! blocks holding spans and breaks, with link annotations.
//! Reference: https://github.com/portabletext/portabletext

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

/// A text block (`_type: "block"`)
///
/// List nesting is flat: list items are sibling blocks whose depth is carried
/// by `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "block", rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "_key", default)]
    pub key: String,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub mark_defs: Vec<MarkDef>,
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<ListItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// Block style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Style {
    #[default]
    Normal,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Blockquote,
    /// A style this crate does not know about, kept verbatim
    Other(String),
}

impl Style {
    pub fn as_str(&self) -> &str {
        match self {
            Style::Normal => "normal",
            Style::H1 => "h1",
            Style::H2 => "h2",
            Style::H3 => "h3",
            Style::H4 => "h4",
            Style::H5 => "h5",
            Style::H6 => "h6",
            Style::Blockquote => "blockquote",
            Style::Other(s) => s,
        }
    }

    /// Heading style for an HTML heading tag ("h1".."h6")
    pub fn heading(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(Style::H1),
            "h2" => Some(Style::H2),
            "h3" => Some(Style::H3),
            "h4" => Some(Style::H4),
            "h5" => Some(Style::H5),
            "h6" => Some(Style::H6),
            _ => None,
        }
    }
}

impl From<String> for Style {
    fn from(s: String) -> Self {
        let known = match s.as_str() {
            "normal" => Some(Style::Normal),
            "blockquote" => Some(Style::Blockquote),
            other => Style::heading(other),
        };
        known.unwrap_or(Style::Other(s))
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        match style {
            Style::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// List item kind of a block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListItem {
    Bullet,
    Number,
    /// A list kind this crate does not know about, kept verbatim
    Other(String),
}

impl ListItem {
    pub fn as_str(&self) -> &str {
        match self {
            ListItem::Bullet => "bullet",
            ListItem::Number => "number",
            ListItem::Other(s) => s,
        }
    }
}

impl From<String> for ListItem {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bullet" => ListItem::Bullet,
            "number" => ListItem::Number,
            _ => ListItem::Other(s),
        }
    }
}

impl From<ListItem> for String {
    fn from(item: ListItem) -> Self {
        match item {
            ListItem::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Inline content of a block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "_type", rename_all = "camelCase")]
pub enum Child {
    Span(Span),
    Break(Break),
    /// An inline object this crate does not model (icons, embeds, ...),
    /// kept verbatim. It carries no text.
    #[serde(untagged)]
    Unknown(Value),
}

impl<'de> Deserialize<'de> for Child {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let child = match value.get("_type").and_then(Value::as_str) {
            Some("span") => Child::Span(Span::deserialize(&value).map_err(de::Error::custom)?),
            Some("break") => Child::Break(Break::deserialize(&value).map_err(de::Error::custom)?),
            // An untyped object with text reads as a span
            None if value.get("text").is_some_and(Value::is_string) => {
                Child::Span(Span::deserialize(&value).map_err(de::Error::custom)?)
            }
            _ => Child::Unknown(value),
        };
        Ok(child)
    }
}

/// A run of text sharing one set of marks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_key", default)]
    pub key: String,
    #[serde(default)]
    pub text: String,
    /// Decorator names and mark definition keys, in application order
    #[serde(default)]
    pub marks: Vec<String>,
}

/// A hard line break
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Break {
    #[serde(rename = "_key", default)]
    pub key: String,
}

/// Out-of-line mark data, referenced from spans by key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    /// Annotation type; only "link" is produced by conversion
    #[serde(rename = "_type", default)]
    pub kind: String,
    #[serde(rename = "_key", default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub blank: bool,
}

impl MarkDef {
    pub const LINK: &'static str = "link";

    pub fn link(key: impl Into<String>, href: impl Into<String>, blank: bool) -> Self {
        Self {
            kind: Self::LINK.to_string(),
            key: key.into(),
            href: Some(href.into()),
            blank,
        }
    }

    pub fn is_link(&self) -> bool {
        self.kind == Self::LINK
    }
}

impl Block {
    pub fn new(key: impl Into<String>, style: Style) -> Self {
        Self {
            key: key.into(),
            style,
            mark_defs: Vec::new(),
            children: Vec::new(),
            list_item: None,
            level: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Child>) -> Self {
        self.children = children;
        self
    }

    pub fn with_mark_defs(mut self, mark_defs: Vec<MarkDef>) -> Self {
        self.mark_defs = mark_defs;
        self
    }

    pub fn with_list_item(mut self, kind: ListItem, level: u32) -> Self {
        self.list_item = Some(kind);
        self.level = Some(level);
        self
    }

    /// Concatenated text of the block's spans; breaks contribute nothing
    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Child::Span(s) => Some(s.text.as_str()),
                Child::Break(_) | Child::Unknown(_) => None,
            })
            .collect()
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.children.iter().filter_map(|c| match c {
            Child::Span(s) => Some(s),
            Child::Break(_) | Child::Unknown(_) => None,
        })
    }
}

// Convenience constructors
impl Child {
    pub fn span(key: impl Into<String>, text: impl Into<String>) -> Self {
        Child::Span(Span::new(key, text))
    }

    pub fn line_break(key: impl Into<String>) -> Self {
        Child::Break(Break { key: key.into() })
    }
}

impl Span {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn with_marks(mut self, marks: Vec<String>) -> Self {
        self.marks = marks;
        self
    }
}
