//! Cross-cutting error types for linkspan.
//!
//! Domain-specific errors (`ParserError`, `MangleError`, `ExtractError`) are
//! defined in their respective crates. The CLI converges them with `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any linkspan crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A declaration or context id does not belong to the unit it was used with.
    #[error("Dangling {entity} id {id} in translation unit {unit}")]
    DanglingId {
        entity: &'static str,
        id: usize,
        unit: String,
    },

    /// A record violated the `1 <= start <= end` invariant.
    #[error("Invalid line range {start}..{end} for {name:?}")]
    InvalidRange { name: String, start: u32, end: u32 },

    /// Serializing the aggregate failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
