//! Source file to [`TranslationUnit`].

use std::path::Path;

use linkspan_core::{SourceLanguage, TargetInfo, TranslationUnit};

use crate::error::ParserError;
use crate::lower::Lowerer;
use crate::options::CompileOptions;

/// Parses C-family sources and lowers them into translation units.
#[derive(Debug, Clone)]
pub struct Frontend {
    target: TargetInfo,
    follow_includes: bool,
}

impl Frontend {
    #[must_use]
    pub const fn new(target: TargetInfo) -> Self {
        Self {
            target,
            follow_includes: true,
        }
    }

    /// Whether `#include` directives are expanded (on by default).
    #[must_use]
    pub const fn with_follow_includes(mut self, follow: bool) -> Self {
        self.follow_includes = follow;
        self
    }

    #[must_use]
    pub const fn target(&self) -> &TargetInfo {
        &self.target
    }

    /// Read and lower `path`.
    ///
    /// The unit's main file is `path` exactly as given. Syntax errors do not
    /// fail here; they are counted on the returned unit.
    ///
    /// # Errors
    /// Returns `ParserError` when the language cannot be determined or the
    /// file cannot be read.
    pub fn parse_file(
        &self,
        path: &str,
        options: &CompileOptions,
    ) -> Result<TranslationUnit, ParserError> {
        let language = options.language_for(path)?;
        let source = std::fs::read_to_string(Path::new(path)).map_err(|source| {
            ParserError::Read {
                path: path.into(),
                source,
            }
        })?;
        Ok(self.parse_source(path, &source, language, options))
    }

    /// Lower in-memory source as if it were the file at `path`.
    #[must_use]
    pub fn parse_source(
        &self,
        path: &str,
        source: &str,
        language: SourceLanguage,
        options: &CompileOptions,
    ) -> TranslationUnit {
        let includes = self.follow_includes.then_some(options);
        let unit = Lowerer::new(path, language, &self.target, includes).lower_main(source);
        tracing::debug!(
            file = path,
            decls = unit.decl_count(),
            syntax_errors = unit.syntax_errors(),
            "lowered translation unit"
        );
        unit
    }
}
