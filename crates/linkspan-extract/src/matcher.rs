//! Declaration Matcher: the definitions extraction cares about.

use linkspan_core::{DeclId, DeclKind, Declaration, TranslationUnit};

/// Which matcher path accepted a declaration. The paths are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A function definition outside any class.
    FreeFunction,
    /// A class member definition: method, static method, constructor,
    /// destructor or conversion function.
    Method,
    ObjCMethod,
}

/// Classify a declaration, or `None` when it is not extracted.
///
/// Only definitions with a body qualify; blocks never do.
#[must_use]
pub const fn classify(decl: &Declaration) -> Option<MatchKind> {
    if !decl.has_body {
        return None;
    }
    match decl.kind {
        DeclKind::Function => Some(MatchKind::FreeFunction),
        DeclKind::Method | DeclKind::Constructor | DeclKind::Destructor | DeclKind::Conversion => {
            Some(MatchKind::Method)
        }
        DeclKind::ObjCMethod => Some(MatchKind::ObjCMethod),
        DeclKind::Block => None,
    }
}

/// Matching definitions in visitation order.
pub fn definitions(
    unit: &TranslationUnit,
) -> impl Iterator<Item = (DeclId, &Declaration, MatchKind)> {
    unit.decls()
        .filter_map(|(id, decl)| classify(decl).map(|kind| (id, decl, kind)))
}
