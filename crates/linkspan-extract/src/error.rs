//! Error types for linkspan-extract.

use linkspan_core::CoreError;
use linkspan_parser::ParserError;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to load translation unit: {0}")]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{file}: {count} syntax error(s)")]
    SyntaxErrors { file: String, count: usize },
}
