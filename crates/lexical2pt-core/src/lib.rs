//! lexical2pt-core: Lexical rich text to Portable Text conversion
//!
//! This crate provides:
//! - Conversion of Lexical JSON trees to flat Portable Text block sequences
//! - Block, span and mark key generation
//! - Re-exports of the Lexical model and the Portable Text HTML renderer
//!
//! ## Example
//!
//! ```rust
//! use lexical2pt_core::{HtmlRenderer, SequentialKeys, convert_with_keys, to_html};
//! use serde_json::json;
//!
//! let document = json!({
//!     "root": {
//!         "type": "root",
//!         "children": [
//!             { "type": "heading", "tag": "h1", "children": [{ "type": "text", "text": "Hi", "format": 0 }] },
//!             { "type": "paragraph", "children": [{ "type": "text", "text": "there", "format": 1 }] }
//!         ]
//!     }
//! });
//!
//! let blocks = convert_with_keys(&document, &mut SequentialKeys::default());
//! assert_eq!(blocks.len(), 2);
//!
//! let html = to_html(&blocks, &HtmlRenderer::plain());
//! assert_eq!(html, "<h1>Hi</h1><p><strong>there</strong></p>");
//! ```

pub mod convert;
pub mod keys;

pub use convert::{
    Conversion, ConvertError, convert, convert_document, convert_nodes, convert_report,
    convert_with_keys, decorator,
};
pub use keys::{GlobalKeys, KeyGenerator, KeySource, SequentialKeys, reset_key_counter};

// Re-export the document models
pub use lexical_ast::{self, Document, Node, ParseError, TextFormat};
pub use portable_text::{
    self, Block, Child, HtmlRenderer, ListItem, MarkDef, RenderMode, Span, Style, Tag,
    render_to_html, to_html, to_html_value,
};

use serde_json::Value;

/// Convert a Lexical document straight to HTML
pub fn lexical_to_html(document: &Value, renderer: &HtmlRenderer) -> String {
    renderer.render(&convert(document))
}
