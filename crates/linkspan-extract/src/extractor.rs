//! Per-unit extraction: matcher, filter, name resolver, range, aggregate.

use linkspan_core::{FileRecordSet, Record, TargetInfo, TranslationUnit};
use linkspan_mangle::NameResolver;

use crate::error::ExtractError;
use crate::filter::FileFilter;
use crate::matcher::definitions;
use crate::range::line_range;

/// Extracts records from one translation unit at a time.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    target: &'a TargetInfo,
    filter: &'a FileFilter,
}

impl<'a> Extractor<'a> {
    #[must_use]
    pub const fn new(target: &'a TargetInfo, filter: &'a FileFilter) -> Self {
        Self { target, filter }
    }

    /// Append a record for every matching definition of `unit` whose
    /// defining file passes the filter. Returns the number appended.
    ///
    /// Names that cannot be resolved are recorded as empty strings.
    ///
    /// # Errors
    /// Returns `ExtractError::Core` if a declaration has an invalid extent.
    pub fn extract(
        &self,
        unit: &TranslationUnit,
        records: &mut FileRecordSet,
    ) -> Result<usize, ExtractError> {
        let resolver = NameResolver::new(unit, self.target);
        let mut appended = 0;
        for (id, decl, kind) in definitions(unit) {
            let Some(file) = self.filter.defining_file(unit, decl) else {
                continue;
            };
            let (start, end) = line_range(decl);
            let record = Record::new(resolver.resolve_or_empty(id), start, end)?;
            tracing::trace!(?kind, file, name = %record.name, start, end, "extracted definition");
            records.push(file, record);
            appended += 1;
        }
        Ok(appended)
    }
}
