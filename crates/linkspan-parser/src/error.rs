//! Parser error types for linkspan-parser.

use std::path::PathBuf;

/// Errors that can occur while loading translation units.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid compilation database {path}: {message}")]
    CompileDatabase { path: PathBuf, message: String },

    #[error("Malformed compiler arguments: {0}")]
    Arguments(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
