//! # linkspan-core
//!
//! Shared data model for linkspan.
//!
//! A [`TranslationUnit`] owns every declaration the frontend lowered from one
//! parsed source file (plus the headers it included), together with the
//! arena of semantic contexts those declarations live in. The extraction
//! engine only ever borrows a unit, so it can be exercised in isolation by
//! building units by hand.
//!
//! The output side is [`Record`] and [`FileRecordSet`]: one record per
//! extracted definition, grouped by defining file.

pub mod decl;
pub mod errors;
pub mod record;
pub mod target;
pub mod types;
pub mod unit;

pub use decl::{
    BlockInfo, ContextId, ContextKind, DeclAttributes, DeclContext, DeclId, DeclKind, DeclName,
    Declaration, FunctionTemplate, Linkage, ObjCMethod, RecordTag, RefQualifier, Selector,
    Signature, SourceLocation, SourceRange, StorageClass,
};
pub use errors::CoreError;
pub use record::{FileRecordSet, Record};
pub use target::{ObjcRuntime, Platform, TargetInfo};
pub use types::{
    BuiltinType, CvQualifiers, FunctionType, Ident, NameComponent, OverloadedOperator,
    QualifiedName, TemplateArg, TypeRef,
};
pub use unit::{FileId, SourceLanguage, TranslationUnit};
