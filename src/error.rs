//! Error types for document transformation
//!
//! Hard failures abort the current `transform` call. Duplicate rules and
//! unmatched nodes are diagnostics only and are reported through `tracing`.

use thiserror::Error;

use crate::container::Shape;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot use container as {requested}: already fixed as {current}")]
    TypeConflict { current: Shape, requested: Shape },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    UnknownSelectorSyntax { selector: String, reason: String },

    #[error("List index {index} is too far past the end (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Value under '{key}' is a scalar, not a nested container")]
    NotAContainer { key: String },

    #[error("No helper function named '{name}'")]
    UnknownHelper { name: String },

    #[error("Helper function '{name}' rejected its arguments: {reason}")]
    HelperArguments { name: String, reason: String },

    #[error("XML parsing failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] ::config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn type_conflict(current: Shape, requested: Shape) -> Self {
        Self::TypeConflict { current, requested }
    }

    pub fn unknown_selector_syntax(selector: &str, reason: impl ToString) -> Self {
        Self::UnknownSelectorSyntax {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub fn not_a_container(key: &str) -> Self {
        Self::NotAContainer {
            key: key.to_string(),
        }
    }

    pub fn helper_arguments(name: &str, reason: &str) -> Self {
        Self::HelperArguments {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether a caller may reasonably retry with different input.
    ///
    /// Selector and document errors depend only on the input text; the
    /// remaining variants stem from rule actions or the environment.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::UnknownSelectorSyntax { .. } => true,
            Self::Xml(_) | Self::EmptyDocument => true,
            Self::Config { .. } | Self::ConfigLoad(_) | Self::Io(_) => true,
            Self::TypeConflict { .. }
            | Self::IndexOutOfRange { .. }
            | Self::NotAContainer { .. }
            | Self::UnknownHelper { .. }
            | Self::HelperArguments { .. }
            | Self::Other(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
