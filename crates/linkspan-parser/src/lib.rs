//! # linkspan-parser
//!
//! ast-grep-based C, C++ and Objective-C frontend for linkspan.
//!
//! A [`Frontend`] parses one source file (following its `#include`s through
//! the search paths of its [`CompileOptions`]) and lowers the tree into a
//! [`TranslationUnit`](linkspan_core::TranslationUnit): function-like
//! declarations with resolved semantic contexts, signatures, linkage and
//! source extents. Search paths and language overrides come from compiler
//! arguments or a [`CompilationDatabase`].

pub mod compile_db;
pub mod error;
pub mod frontend;
pub mod options;
pub mod parser;

mod lower;

pub use compile_db::{CompilationDatabase, CompileCommand};
pub use error::ParserError;
pub use frontend::Frontend;
pub use options::CompileOptions;
pub use parser::{Grammar, detect_language};
