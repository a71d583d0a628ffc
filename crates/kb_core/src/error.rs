use thiserror::Error;

/// The feed payload is not well-formed XML.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed feed at byte {position}: {message}")]
pub struct ParseError {
    pub position: u64,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(position: u64, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// The article table cannot be used as a whole.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error("unreadable table: {0}")]
    Unreadable(String),
}

/// Canonical input that breaks a record invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("product {title:?} has an empty product type")]
    EmptyGroupKey { title: String },
}
