//! lexical-ast: Typed model of Lexical rich-text documents
//!
//! This crate provides:
//! - Lexical node types (a tagged sum type over the serialized `type` field)
//! - Lenient per-node decoding from `serde_json::Value`
//! - JSON entry points for whole documents
//!
//! # Example
//!
//! ```
//! use lexical_ast::{parse, Node};
//!
//! let source = r#"{
//!   "root": {
//!     "type": "root",
//!     "children": [
//!       { "type": "paragraph", "children": [{ "type": "text", "text": "Hi", "format": 1 }] }
//!     ]
//!   }
//! }"#;
//!
//! let doc = parse(source).unwrap();
//! assert!(matches!(doc.root.children[0], Node::Paragraph(_)));
//! ```

pub mod ast;
pub mod parser;

// Re-export main types for convenient access
pub use ast::{
    Document, Heading, Link, LinkFields, List, ListItem, ListType, Node, Paragraph, Quote, Root,
    Tab, Text, TextFormat, Unknown, root_children,
};
pub use parser::{ParseError, ParseResult, parse, parse_value};
