//! JSON entry points
//!
//! Lexical documents reach us as JSON text (exports, API payloads) or as
//! values already decoded by the caller.

use crate::ast::Document;
use serde_json::Value;
use thiserror::Error;

/// Parser errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document has no root.children array")]
    MissingRoot,
}

/// Parse result type
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse JSON text into a raw value, without checking the document shape
pub fn parse_value(source: &str) -> ParseResult<Value> {
    Ok(serde_json::from_str(source)?)
}

/// Parse JSON text into a typed document.
///
/// Unlike the converter, this is all-or-nothing: a missing root or a single
/// malformed node is an error.
pub fn parse(source: &str) -> ParseResult<Document> {
    let value = parse_value(source)?;
    match Document::from_value(&value) {
        Some(doc) => Ok(doc?),
        None => Err(ParseError::MissingRoot),
    }
}
