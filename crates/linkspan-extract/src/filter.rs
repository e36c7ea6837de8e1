//! File Filter: keep declarations defined in one of the requested files.

use std::collections::HashSet;

use linkspan_core::{Declaration, TranslationUnit};

/// Exact-string set of file paths. Paths are not normalized.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    files: HashSet<String>,
}

impl FileFilter {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, file: &str) -> bool {
        self.files.contains(file)
    }

    /// The file `decl`'s name is spelled in, if it passes the filter.
    #[must_use]
    pub fn defining_file<'u>(&self, unit: &'u TranslationUnit, decl: &Declaration) -> Option<&'u str> {
        let file = unit.spelling_file(decl.location);
        if self.contains(file) {
            Some(file)
        } else {
            tracing::trace!(file, "definition outside requested files");
            None
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
