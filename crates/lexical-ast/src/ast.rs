//! Lexical AST types
//!
//! This module defines the subset of Lexical's serialized node set that
//! rich-text fields in the CMS produce.
//! Reference: https://lexical.dev/docs/concepts/serialization

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete Lexical document (`{ "root": { ... } }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: Root,
}

impl Document {
    /// Decode a document from an already parsed JSON value.
    ///
    /// Returns `None` when the value does not have the `root.children` shape.
    /// Nodes inside the root are decoded strictly, so a single malformed node
    /// makes the whole call fail; use [`root_children`] to decode node by node.
    pub fn from_value(value: &Value) -> Option<Result<Self, serde_json::Error>> {
        let children = root_children(value)?;
        Some(
            children
                .iter()
                .map(Node::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(|children| Document {
                    root: Root { children },
                }),
        )
    }
}

/// Return the top-level children of a Lexical document, if it has any.
///
/// This is the only shape check applied to incoming documents: the value must
/// be an object with a `root` object whose `children` is an array.
pub fn root_children(value: &Value) -> Option<&[Value]> {
    value
        .as_object()?
        .get("root")?
        .get("children")?
        .as_array()
        .map(Vec::as_slice)
}

/// A Lexical node
///
/// The `type` field of the serialized node is the discriminant. Unrecognised
/// types decode to [`Node::Unknown`] with their children kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    // Element nodes
    Root(Root),
    Paragraph(Paragraph),
    Heading(Heading),
    Quote(Quote),
    List(List),
    ListItem(ListItem),
    Link(Link),
    AutoLink(Link),

    // Leaf nodes
    Text(Text),
    Tab(Tab),
    LineBreak,

    // Anything else (custom nodes, blocks, uploads, ...)
    #[serde(untagged)]
    Unknown(Unknown),
}

/// Root node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Root {
    #[serde(default, deserialize_with = "deserialize_children")]
    pub children: Vec<Node>,
}

/// Paragraph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default, deserialize_with = "deserialize_children")]
    pub children: Vec<Node>,
}

/// Heading node (`tag` is "h1" through "h6")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    #[serde(default, deserialize_with = "deserialize_string_or_empty")]
    pub tag: String,
    #[serde(default, deserialize_with = "deserialize_children")]
    pub children: Vec<Node>,
}

/// Block quote node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, deserialize_with = "deserialize_children")]
    pub children: Vec<Node>,
}

/// List node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    #[serde(
        default,
        rename = "listType",
        skip_serializing_if = "Option::is_none"
    )]
    pub list_type: Option<ListType>,
    /// "ul" or "ol"; only consulted when `listType` is absent
    #[serde(
        default,
        deserialize_with = "deserialize_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "deserialize_children")]
    pub children: Vec<Node>,
}

impl List {
    /// The kind of list, falling back to the HTML tag and then to bullet
    pub fn kind(&self) -> ListType {
        match (&self.list_type, self.tag.as_deref()) {
            (Some(kind), _) => *kind,
            (None, Some("ol")) => ListType::Number,
            (None, _) => ListType::Bullet,
        }
    }
}

/// Lexical list types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Bullet,
    Number,
    Check,
}

impl<'de> Deserialize<'de> for ListType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("number") => Self::Number,
            Some("check") => Self::Check,
            // Unknown or non-string list types read as bullets
            _ => Self::Bullet,
        })
    }
}

/// List item node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(
        default,
        deserialize_with = "deserialize_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub checked: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_children")]
    pub children: Vec<Node>,
}

/// Link and autolink node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(
        default,
        deserialize_with = "deserialize_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    /// Link fields stored by the CMS link feature
    #[serde(
        default,
        deserialize_with = "deserialize_link_fields",
        skip_serializing_if = "Option::is_none"
    )]
    pub fields: Option<LinkFields>,
    #[serde(
        default,
        deserialize_with = "deserialize_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub target: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub rel: Option<String>,
    #[serde(default, rename = "newTab", skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_children")]
    pub children: Vec<Node>,
}

/// CMS link fields (`fields` on a link node)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkFields {
    #[serde(
        default,
        deserialize_with = "deserialize_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(default, rename = "newTab", skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<Value>,
}

impl Link {
    /// Link destination: `fields.url`, then `url`, then `"#"`
    pub fn href(&self) -> &str {
        self.fields
            .as_ref()
            .and_then(|f| f.url.as_deref())
            .or(self.url.as_deref())
            .unwrap_or("#")
    }

    /// Whether the link should open in a new tab
    pub fn opens_in_new_tab(&self) -> bool {
        let flag = self
            .fields
            .as_ref()
            .and_then(|f| f.new_tab.as_ref())
            .or(self.new_tab.as_ref());
        flag.is_some_and(is_truthy) || self.target.as_deref() == Some("_blank")
    }
}

/// Text node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_format")]
    pub format: TextFormat,
}

/// Tab node (a text run holding a single tab)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default = "tab_text")]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_format")]
    pub format: TextFormat,
}

fn tab_text() -> String {
    "\t".to_string()
}

/// A node whose type this crate does not model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unknown {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Inline format bitmask of a text node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFormat(pub u32);

impl TextFormat {
    pub const BOLD: Self = Self(1);
    pub const ITALIC: Self = Self(1 << 1);
    pub const STRIKETHROUGH: Self = Self(1 << 2);
    pub const UNDERLINE: Self = Self(1 << 3);
    pub const CODE: Self = Self(1 << 4);

    /// Formats in canonical order
    pub const ALL: [Self; 5] = [
        Self::BOLD,
        Self::ITALIC,
        Self::STRIKETHROUGH,
        Self::UNDERLINE,
        Self::CODE,
    ];

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Iterate over the set formats in canonical order.
    ///
    /// Bits outside [`TextFormat::ALL`] (subscript, superscript, highlight)
    /// are not yielded.
    pub fn iter(self) -> impl Iterator<Item = TextFormat> {
        Self::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl std::ops::BitOr for TextFormat {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Node {
    /// Decode a single node from JSON.
    ///
    /// Fails when a known node type carries fields of the wrong shape, e.g. a
    /// text node without a string `text`, or `children` that is not an array.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let node = match kind {
            "root" => Node::Root(Root::deserialize(value)?),
            "paragraph" => Node::Paragraph(Paragraph::deserialize(value)?),
            "heading" => Node::Heading(Heading::deserialize(value)?),
            "quote" => Node::Quote(Quote::deserialize(value)?),
            "list" => Node::List(List::deserialize(value)?),
            "listitem" => Node::ListItem(ListItem::deserialize(value)?),
            "link" => Node::Link(Link::deserialize(value)?),
            "autolink" => Node::AutoLink(Link::deserialize(value)?),
            "text" => Node::Text(Text::deserialize(value)?),
            "tab" => Node::Tab(Tab::deserialize(value)?),
            "linebreak" => Node::LineBreak,
            _ => Node::Unknown(Unknown {
                kind: kind.to_string(),
                // Unknown nodes are decoded leniently: odd `children` shapes
                // make them leaves instead of failing
                children: match value.get("children") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(Node::from_value)
                        .collect::<Result<_, _>>()?,
                    _ => Vec::new(),
                },
            }),
        };
        Ok(node)
    }

    /// The serialized `type` of this node
    pub fn kind(&self) -> &str {
        match self {
            Node::Root(_) => "root",
            Node::Paragraph(_) => "paragraph",
            Node::Heading(_) => "heading",
            Node::Quote(_) => "quote",
            Node::List(_) => "list",
            Node::ListItem(_) => "listitem",
            Node::Link(_) => "link",
            Node::AutoLink(_) => "autolink",
            Node::Text(_) => "text",
            Node::Tab(_) => "tab",
            Node::LineBreak => "linebreak",
            Node::Unknown(u) => &u.kind,
        }
    }

    /// Child nodes; empty for leaves
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root(Root { children })
            | Node::Paragraph(Paragraph { children })
            | Node::Heading(Heading { children, .. })
            | Node::Quote(Quote { children })
            | Node::List(List { children, .. })
            | Node::ListItem(ListItem { children, .. })
            | Node::Link(Link { children, .. })
            | Node::AutoLink(Link { children, .. })
            | Node::Unknown(Unknown { children, .. }) => children,
            Node::Text(_) | Node::Tab(_) | Node::LineBreak => &[],
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Node::from_value(&value).map_err(de::Error::custom)
    }
}

// Convenience constructors
impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::formatted_text(s, TextFormat::default())
    }

    pub fn formatted_text(s: impl Into<String>, format: TextFormat) -> Self {
        Node::Text(Text {
            text: s.into(),
            format,
        })
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph(Paragraph { children })
    }

    pub fn heading(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Heading(Heading {
            tag: tag.into(),
            children,
        })
    }

    pub fn quote(children: Vec<Node>) -> Self {
        Node::Quote(Quote { children })
    }

    pub fn list(list_type: ListType, children: Vec<Node>) -> Self {
        Node::List(List {
            list_type: Some(list_type),
            tag: None,
            children,
        })
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Node::ListItem(ListItem {
            value: None,
            checked: None,
            children,
        })
    }

    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Link(Link {
            url: Some(url.into()),
            fields: None,
            target: None,
            rel: None,
            new_tab: None,
            children,
        })
    }

    pub fn line_break() -> Self {
        Node::LineBreak
    }
}

impl Root {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

/// JavaScript truthiness of a JSON value
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `children`, when present, must be an array of nodes (`null` reads as empty)
fn deserialize_children<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Node>, D::Error> {
    Ok(Option::<Vec<Node>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Non-numeric or negative formats read as "no format"
fn deserialize_format<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TextFormat, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(TextFormat(
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or_default(),
    ))
}

// Attribute fields below are lenient: a value of the wrong JSON type reads as
// absent instead of failing the node.

fn deserialize_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

fn deserialize_string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(deserialize_string(deserializer)?.unwrap_or_default())
}

fn deserialize_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_i64())
}

fn deserialize_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_bool())
}

/// `fields` is only read when it is an object
fn deserialize_link_fields<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<LinkFields>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(LinkFields::deserialize(&value).ok())
}
