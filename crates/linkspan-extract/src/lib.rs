//! # linkspan-extract
//!
//! The extraction engine. For each translation unit it
//! 1. walks the function-like definitions in visitation order ([`matcher`]),
//! 2. keeps those defined in a requested file ([`FileFilter`]),
//! 3. computes each link name through
//!    [`NameResolver`](linkspan_mangle::NameResolver) and each line range
//!    ([`range`]),
//! 4. appends a [`Record`](linkspan_core::Record) under the defining file.
//!
//! [`ExtractionPipeline`] runs this over many source files, optionally in
//! parallel, and merges the per-unit results deterministically.

pub mod error;
pub mod extractor;
pub mod filter;
pub mod matcher;
pub mod pipeline;
pub mod range;

pub use error::ExtractError;
pub use extractor::Extractor;
pub use filter::FileFilter;
pub use matcher::{MatchKind, classify, definitions};
pub use pipeline::{ExtractionPipeline, ExtractionReport, UnitInput, UnitOutcome};
