//! portable-text: Portable Text block types and HTML renderer
//!
//! This crate provides:
//! - Portable Text block, span and mark definition types (subset)
//! - Serialization to HTML, with styled and plain rendering tables
//!
//! ## Example
//!
//! ```rust
//! use portable_text::{Block, Child, HtmlRenderer, Style, to_html};
//!
//! let blocks = vec![
//!     Block::new("a", Style::H1).with_children(vec![Child::span("a0", "Hello")]),
//!     Block::new("b", Style::Normal).with_children(vec![Child::span("b0", "World")]),
//! ];
//!
//! let html = to_html(&blocks, &HtmlRenderer::plain());
//! assert_eq!(html, "<h1>Hello</h1><p>World</p>");
//! ```

pub mod block;
pub mod html;

pub use block::{Block, Break, Child, ListItem, MarkDef, Span, Style};
pub use html::{
    HtmlRenderer, RenderMode, Tag, escape_attr, escape_text, render_to_html, to_html,
    to_html_value,
};
