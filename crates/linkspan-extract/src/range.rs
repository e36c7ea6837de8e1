//! Range Extractor.

use linkspan_core::Declaration;

/// First and last line of a declaration's full extent, 1-based.
#[must_use]
pub const fn line_range(decl: &Declaration) -> (u32, u32) {
    (decl.extent.begin.line, decl.extent.end.line)
}
