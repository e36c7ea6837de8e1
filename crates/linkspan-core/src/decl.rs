//! Declarations and the semantic contexts that contain them.

use crate::types::{CvQualifiers, OverloadedOperator, TemplateArg, TypeRef};
use crate::unit::FileId;

/// Index of a declaration inside its [`TranslationUnit`](crate::TranslationUnit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Index of a context inside its [`TranslationUnit`](crate::TranslationUnit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

impl DeclId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl ContextId {
    /// The translation unit context is always the first one allocated.
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A position as spelled in a file. `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

/// First and last token of a declaration's full extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordTag {
    Class,
    Struct,
    Union,
}

/// Language linkage of a function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Linkage {
    C,
    #[default]
    Cxx,
}

/// What kind of scope a [`DeclContext`] is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextKind {
    TranslationUnit,
    /// `name` is `None` for an anonymous namespace.
    Namespace { name: Option<String>, inline: bool },
    Record {
        name: String,
        tag: RecordTag,
        /// Set for class templates (their own parameters) and specializations.
        template_args: Option<Vec<TemplateArg>>,
        /// Ordinal among same-named records in the same function scope.
        discriminator: u32,
    },
    /// `extern "C" { ... }`; transparent for naming.
    LinkageSpec(Linkage),
    /// The body scope of a function-like declaration.
    Function(DeclId),
    /// The body scope of a block literal.
    Block(DeclId),
    /// The closure class of a lambda expression; its only member is the
    /// call operator.
    Closure {
        params: Vec<TypeRef>,
        variadic: bool,
        number: u32,
    },
    ObjCContainer {
        class: String,
        category: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclContext {
    pub parent: Option<ContextId>,
    pub kind: ContextKind,
}

impl DeclContext {
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self.kind, ContextKind::Record { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Function,
    Method,
    Constructor,
    Destructor,
    Conversion,
    ObjCMethod,
    Block,
}

impl DeclKind {
    /// Kinds that are members of a class.
    #[must_use]
    pub const fn is_cxx_member(self) -> bool {
        matches!(
            self,
            Self::Method | Self::Constructor | Self::Destructor | Self::Conversion
        )
    }
}

/// The declared name of a function-like declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclName {
    Identifier(String),
    /// Constructor of the named class.
    Constructor(String),
    /// Destructor of the named class.
    Destructor(String),
    Operator(OverloadedOperator),
    Conversion(TypeRef),
    /// `operator""_suffix`
    LiteralOperator(String),
    /// Anything the frontend could not classify, kept as written.
    Unresolved(String),
}

impl DeclName {
    /// Unqualified source spelling of the name.
    #[must_use]
    pub fn spelling(&self) -> String {
        match self {
            Self::Identifier(name) | Self::Constructor(name) | Self::Unresolved(name) => {
                name.clone()
            }
            Self::Destructor(name) => format!("~{name}"),
            Self::Operator(op) => {
                let text = op.spelling();
                if text.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    format!("operator {text}")
                } else {
                    format!("operator{text}")
                }
            }
            Self::Conversion(_) => "operator <conversion>".to_string(),
            Self::LiteralOperator(suffix) => format!("operator\"\"{suffix}"),
        }
    }

    #[must_use]
    pub const fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageClass {
    #[default]
    None,
    Static,
    Extern,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RefQualifier {
    #[default]
    None,
    LValue,
    RValue,
}

/// Parameter and return types plus method qualifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TypeRef>,
    /// `None` for constructors, destructors and Objective-C methods.
    pub return_type: Option<TypeRef>,
    pub variadic: bool,
    pub method_quals: CvQualifiers,
    pub ref_qualifier: RefQualifier,
}

/// Template information for function templates and their specializations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionTemplate {
    pub args: Vec<TemplateArg>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DeclAttributes {
    /// `__attribute__((overloadable))`
    pub overloadable: bool,
    /// `asm("label")`
    pub asm_label: Option<String>,
}

/// An Objective-C selector: its keyword slots and argument count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub slots: Vec<String>,
    pub num_args: usize,
}

impl Selector {
    #[must_use]
    pub fn unary(name: impl Into<String>) -> Self {
        Self {
            slots: vec![name.into()],
            num_args: 0,
        }
    }

    #[must_use]
    pub fn keyword(slots: &[&str]) -> Self {
        Self {
            slots: slots.iter().map(|s| (*s).to_string()).collect(),
            num_args: slots.len(),
        }
    }

    /// The selector as written in `@selector(...)`.
    #[must_use]
    pub fn as_string(&self) -> String {
        if self.num_args == 0 {
            return self.slots.first().cloned().unwrap_or_default();
        }
        self.slots.iter().map(|slot| format!("{slot}:")).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjCMethod {
    pub instance: bool,
    pub selector: Selector,
    pub class: String,
    pub category: Option<String>,
}

/// Block literal bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockInfo {
    /// Zero-based ordinal among the blocks of the outermost non-block context.
    pub ordinal: u32,
}

/// A function-like declaration lowered from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclKind,
    pub name: DeclName,
    /// Semantic context: the class for out-of-line member definitions.
    pub context: ContextId,
    /// Location of the name token.
    pub location: SourceLocation,
    pub extent: SourceRange,
    pub has_body: bool,
    pub signature: Signature,
    pub template: Option<FunctionTemplate>,
    pub storage: StorageClass,
    pub linkage: Linkage,
    pub attributes: DeclAttributes,
    pub objc: Option<ObjCMethod>,
    pub block: Option<BlockInfo>,
}

impl Declaration {
    /// A body-carrying free function with C++ linkage and no parameters.
    #[must_use]
    pub fn function(name: impl Into<String>, context: ContextId, extent: SourceRange) -> Self {
        Self {
            kind: DeclKind::Function,
            name: DeclName::Identifier(name.into()),
            context,
            location: extent.begin,
            extent,
            has_body: true,
            signature: Signature::default(),
            template: None,
            storage: StorageClass::None,
            linkage: Linkage::Cxx,
            attributes: DeclAttributes::default(),
            objc: None,
            block: None,
        }
    }

    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self.storage, StorageClass::Static)
    }
}
