//! The parsed program for one main source file.

use std::collections::HashMap;
use std::fmt;

use crate::decl::{ContextId, ContextKind, DeclContext, DeclId, Declaration, SourceLocation};

/// Index into a unit's file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Source language a unit was parsed as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    C,
    #[default]
    Cxx,
    ObjC,
    ObjCxx,
}

impl SourceLanguage {
    #[must_use]
    pub const fn is_cplusplus(self) -> bool {
        matches!(self, Self::Cxx | Self::ObjCxx)
    }

    #[must_use]
    pub const fn is_objc(self) -> bool {
        matches!(self, Self::ObjC | Self::ObjCxx)
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::C => "c",
            Self::Cxx => "c++",
            Self::ObjC => "objective-c",
            Self::ObjCxx => "objective-c++",
        })
    }
}

/// Declarations, contexts and files of one translation unit.
///
/// Declarations are stored in the order the frontend visited them, which is
/// top-down source order with included headers expanded at their include
/// point.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    main_file: String,
    language: SourceLanguage,
    files: Vec<String>,
    file_index: HashMap<String, FileId>,
    contexts: Vec<DeclContext>,
    /// `(parent, kind)` of every non-root context.
    context_index: HashMap<(ContextId, ContextKind), ContextId>,
    decls: Vec<Declaration>,
    syntax_errors: usize,
}

impl TranslationUnit {
    #[must_use]
    pub fn new(main_file: impl Into<String>, language: SourceLanguage) -> Self {
        let main_file = main_file.into();
        Self {
            files: vec![main_file.clone()],
            file_index: HashMap::from([(main_file.clone(), FileId(0))]),
            main_file,
            language,
            contexts: vec![DeclContext {
                parent: None,
                kind: ContextKind::TranslationUnit,
            }],
            context_index: HashMap::new(),
            decls: Vec::new(),
            syntax_errors: 0,
        }
    }

    #[must_use]
    pub fn main_file(&self) -> &str {
        &self.main_file
    }

    /// File id of the main source file.
    #[must_use]
    pub const fn main_file_id(&self) -> FileId {
        FileId(0)
    }

    #[must_use]
    pub const fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Register a file path, returning the existing id if already known.
    pub fn add_file(&mut self, path: impl Into<String>) -> FileId {
        let path = path.into();
        if let Some(id) = self.file_index.get(&path) {
            return *id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(path.clone());
        self.file_index.insert(path, id);
        id
    }

    #[must_use]
    pub fn file_path(&self, id: FileId) -> &str {
        self.files.get(id.0 as usize).map_or("", String::as_str)
    }

    /// Path of the file containing `location`.
    #[must_use]
    pub fn spelling_file(&self, location: SourceLocation) -> &str {
        self.file_path(location.file)
    }

    /// Return the context with this parent and kind, creating it if needed.
    pub fn context_for(&mut self, parent: ContextId, kind: ContextKind) -> ContextId {
        let key = (parent, kind);
        if let Some(id) = self.context_index.get(&key) {
            return *id;
        }
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(DeclContext {
            parent: Some(parent),
            kind: key.1.clone(),
        });
        self.context_index.insert(key, id);
        id
    }

    /// # Panics
    /// Panics if `id` was not allocated by this unit.
    #[must_use]
    pub fn context(&self, id: ContextId) -> &DeclContext {
        &self.contexts[id.index()]
    }

    #[must_use]
    pub fn get_context(&self, id: ContextId) -> Option<&DeclContext> {
        self.contexts.get(id.index())
    }

    /// Walk from `id` (inclusive) to the translation unit context.
    pub fn ancestors(&self, id: ContextId) -> impl Iterator<Item = (ContextId, &DeclContext)> {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let current = next?;
            let ctx = self.get_context(current)?;
            next = ctx.parent;
            Some((current, ctx))
        })
    }

    /// Innermost context that is not a linkage specification.
    #[must_use]
    pub fn naming_context(&self, id: ContextId) -> ContextId {
        self.ancestors(id)
            .find(|(_, ctx)| !matches!(ctx.kind, ContextKind::LinkageSpec(_)))
            .map_or(ContextId::ROOT, |(cid, _)| cid)
    }

    /// The function whose body (transitively) contains `id`, if any.
    #[must_use]
    pub fn enclosing_function(&self, id: ContextId) -> Option<DeclId> {
        self.ancestors(id).find_map(|(_, ctx)| match ctx.kind {
            ContextKind::Function(decl) => Some(decl),
            _ => None,
        })
    }

    /// Append a declaration in visitation order.
    pub fn add_decl(&mut self, decl: Declaration) -> DeclId {
        self.decls.push(decl);
        DeclId((self.decls.len() - 1) as u32)
    }

    /// # Panics
    /// Panics if `id` was not allocated by this unit.
    #[must_use]
    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    #[must_use]
    pub fn get_decl(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.index())
    }

    pub fn decl_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.index())
    }

    /// All declarations in visitation order.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(idx, decl)| (DeclId(idx as u32), decl))
    }

    #[must_use]
    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn record_syntax_error(&mut self) {
        self.syntax_errors += 1;
    }

    /// Number of `ERROR` regions the frontend met in the main file.
    /// Errors inside followed headers are not counted.
    #[must_use]
    pub const fn syntax_errors(&self) -> usize {
        self.syntax_errors
    }
}
