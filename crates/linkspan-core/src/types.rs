//! Type and name representation shared by the frontend and the mangler.
//!
//! Types are stored in canonical form: typedefs are already resolved by the
//! frontend, and named types carry their fully qualified path.

use std::fmt;

use crate::decl::DeclId;

/// Fundamental types with a fixed one- or two-letter encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    WChar,
    Char8,
    Char16,
    Char32,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int128,
    UnsignedInt128,
    Float,
    Double,
    LongDouble,
    Float128,
    NullPtr,
}

impl BuiltinType {
    /// Source spelling, used for plain names and diagnostics.
    #[must_use]
    pub const fn spelling(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::SignedChar => "signed char",
            Self::UnsignedChar => "unsigned char",
            Self::WChar => "wchar_t",
            Self::Char8 => "char8_t",
            Self::Char16 => "char16_t",
            Self::Char32 => "char32_t",
            Self::Short => "short",
            Self::UnsignedShort => "unsigned short",
            Self::Int => "int",
            Self::UnsignedInt => "unsigned int",
            Self::Long => "long",
            Self::UnsignedLong => "unsigned long",
            Self::LongLong => "long long",
            Self::UnsignedLongLong => "unsigned long long",
            Self::Int128 => "__int128",
            Self::UnsignedInt128 => "unsigned __int128",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
            Self::Float128 => "__float128",
            Self::NullPtr => "std::nullptr_t",
        }
    }

    #[must_use]
    pub const fn is_integral(self) -> bool {
        !matches!(
            self,
            Self::Void | Self::Float | Self::Double | Self::LongDouble | Self::Float128 | Self::NullPtr
        )
    }
}

/// `const`, `volatile` and `restrict` qualifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CvQualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
}

impl CvQualifiers {
    pub const CONST: Self = Self {
        is_const: true,
        is_volatile: false,
        is_restrict: false,
    };

    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.is_const && !self.is_volatile && !self.is_restrict
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            is_const: self.is_const || other.is_const,
            is_volatile: self.is_volatile || other.is_volatile,
            is_restrict: self.is_restrict || other.is_restrict,
        }
    }
}

/// One segment of a qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ident {
    Named(String),
    AnonymousNamespace,
    /// The unnamed class of a lambda expression. `number` counts earlier
    /// lambdas with the same parameter list in the same function scope.
    Closure {
        params: Vec<TypeRef>,
        variadic: bool,
        number: u32,
    },
}

impl Ident {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::AnonymousNamespace => "(anonymous namespace)",
            Self::Closure { .. } => "(lambda)",
        }
    }
}

/// A qualified-name segment, optionally specialized with template arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameComponent {
    pub ident: Ident,
    pub template_args: Option<Vec<TemplateArg>>,
}

impl NameComponent {
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            ident: Ident::named(name),
            template_args: None,
        }
    }

    #[must_use]
    pub fn specialized(name: impl Into<String>, args: Vec<TemplateArg>) -> Self {
        Self {
            ident: Ident::named(name),
            template_args: Some(args),
        }
    }
}

/// Fully qualified name of a class or enum type.
///
/// `local` is set for types declared inside a function body; the components
/// are then relative to that function's scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub local: Option<DeclId>,
    pub components: Vec<NameComponent>,
}

impl QualifiedName {
    #[must_use]
    pub const fn global(components: Vec<NameComponent>) -> Self {
        Self {
            local: None,
            components,
        }
    }

    /// Build an unspecialized global name from `::`-separated segments.
    #[must_use]
    pub fn from_path(path: &[&str]) -> Self {
        Self::global(path.iter().map(|s| NameComponent::plain(*s)).collect())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, component) in self.components.iter().enumerate() {
            if idx > 0 {
                f.write_str("::")?;
            }
            f.write_str(component.ident.as_str())?;
            if let Some(args) = &component.template_args {
                write!(f, "<{} args>", args.len())?;
            }
        }
        Ok(())
    }
}

/// A template argument as written at the use site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateArg {
    Type(TypeRef),
    Integral { ty: BuiltinType, value: i128 },
    /// An expression the frontend could not evaluate.
    Unevaluated(String),
}

/// The signature part of a function type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub return_type: TypeRef,
    pub params: Vec<TypeRef>,
    pub variadic: bool,
}

/// A canonical type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(BuiltinType),
    Named(QualifiedName),
    /// Reference to the n-th template parameter of the enclosing template.
    TemplateParam(u32),
    Pointer(Box<TypeRef>),
    LValueReference(Box<TypeRef>),
    RValueReference(Box<TypeRef>),
    Qualified(Box<TypeRef>, CvQualifiers),
    Array(Box<TypeRef>, Option<u64>),
    Function(Box<FunctionType>),
    /// A spelling the frontend could not lower (`auto`, `decltype(...)`, ...).
    Unresolved(String),
}

impl TypeRef {
    #[must_use]
    pub fn pointer_to(inner: Self) -> Self {
        Self::Pointer(Box::new(inner))
    }

    #[must_use]
    pub fn lvalue_ref_to(inner: Self) -> Self {
        Self::LValueReference(Box::new(inner))
    }

    #[must_use]
    pub fn rvalue_ref_to(inner: Self) -> Self {
        Self::RValueReference(Box::new(inner))
    }

    /// Add qualifiers, folding into an existing qualified node.
    #[must_use]
    pub fn qualified(self, cv: CvQualifiers) -> Self {
        if cv.is_empty() {
            return self;
        }
        match self {
            Self::Qualified(inner, existing) => Self::Qualified(inner, existing.union(cv)),
            other => Self::Qualified(Box::new(other), cv),
        }
    }

    #[must_use]
    pub fn named(path: &[&str]) -> Self {
        Self::Named(QualifiedName::from_path(path))
    }

    /// The type a parameter of this declared type actually has: top-level
    /// qualifiers are dropped, arrays and functions decay to pointers.
    #[must_use]
    pub fn adjusted_parameter(&self) -> Self {
        match self {
            Self::Qualified(inner, _) => inner.adjusted_parameter(),
            Self::Array(elem, _) => Self::Pointer(elem.clone()),
            Self::Function(_) => Self::Pointer(Box::new(self.clone())),
            other => other.clone(),
        }
    }

    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Builtin(BuiltinType::Void))
    }
}

/// Overloadable operators, as spelled after the `operator` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverloadedOperator {
    New,
    Delete,
    ArrayNew,
    ArrayDelete,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amp,
    Pipe,
    Tilde,
    Exclaim,
    Equal,
    Less,
    Greater,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    CaretEqual,
    AmpEqual,
    PipeEqual,
    LessLess,
    GreaterGreater,
    LessLessEqual,
    GreaterGreaterEqual,
    EqualEqual,
    ExclaimEqual,
    LessEqual,
    GreaterEqual,
    Spaceship,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    Comma,
    ArrowStar,
    Arrow,
    Call,
    Subscript,
    Coawait,
}

impl OverloadedOperator {
    const TABLE: &'static [(&'static str, Self)] = &[
        ("new", Self::New),
        ("delete", Self::Delete),
        ("new[]", Self::ArrayNew),
        ("delete[]", Self::ArrayDelete),
        ("+", Self::Plus),
        ("-", Self::Minus),
        ("*", Self::Star),
        ("/", Self::Slash),
        ("%", Self::Percent),
        ("^", Self::Caret),
        ("&", Self::Amp),
        ("|", Self::Pipe),
        ("~", Self::Tilde),
        ("!", Self::Exclaim),
        ("=", Self::Equal),
        ("<", Self::Less),
        (">", Self::Greater),
        ("+=", Self::PlusEqual),
        ("-=", Self::MinusEqual),
        ("*=", Self::StarEqual),
        ("/=", Self::SlashEqual),
        ("%=", Self::PercentEqual),
        ("^=", Self::CaretEqual),
        ("&=", Self::AmpEqual),
        ("|=", Self::PipeEqual),
        ("<<", Self::LessLess),
        (">>", Self::GreaterGreater),
        ("<<=", Self::LessLessEqual),
        (">>=", Self::GreaterGreaterEqual),
        ("==", Self::EqualEqual),
        ("!=", Self::ExclaimEqual),
        ("<=", Self::LessEqual),
        (">=", Self::GreaterEqual),
        ("<=>", Self::Spaceship),
        ("&&", Self::AmpAmp),
        ("||", Self::PipePipe),
        ("++", Self::PlusPlus),
        ("--", Self::MinusMinus),
        (",", Self::Comma),
        ("->*", Self::ArrowStar),
        ("->", Self::Arrow),
        ("()", Self::Call),
        ("[]", Self::Subscript),
        ("co_await", Self::Coawait),
    ];

    /// Parse the text following `operator`, ignoring interior whitespace.
    #[must_use]
    pub fn from_spelling(spelling: &str) -> Option<Self> {
        let compact: String = spelling.chars().filter(|c| !c.is_whitespace()).collect();
        Self::TABLE
            .iter()
            .find(|(text, _)| *text == compact)
            .map(|(_, op)| *op)
    }

    #[must_use]
    pub fn spelling(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, op)| *op == self)
            .map_or("", |(text, _)| text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_spelling_ignores_whitespace() {
        assert_eq!(
            OverloadedOperator::from_spelling("( )"),
            Some(OverloadedOperator::Call)
        );
        assert_eq!(
            OverloadedOperator::from_spelling("new []"),
            Some(OverloadedOperator::ArrayNew)
        );
        assert_eq!(OverloadedOperator::from_spelling("<=>"), Some(OverloadedOperator::Spaceship));
        assert_eq!(OverloadedOperator::from_spelling("bogus"), None);
    }

    #[test]
    fn parameter_adjustment_decays_and_drops_top_level_cv() {
        let array = TypeRef::Array(Box::new(TypeRef::Builtin(BuiltinType::Int)), Some(4));
        assert_eq!(
            array.adjusted_parameter(),
            TypeRef::pointer_to(TypeRef::Builtin(BuiltinType::Int))
        );

        let const_int = TypeRef::Builtin(BuiltinType::Int).qualified(CvQualifiers::CONST);
        assert_eq!(const_int.adjusted_parameter(), TypeRef::Builtin(BuiltinType::Int));

        let ptr_to_const = TypeRef::pointer_to(const_int.clone());
        assert_eq!(ptr_to_const.adjusted_parameter(), ptr_to_const);
    }

    #[test]
    fn qualified_folds_into_existing_qualifiers() {
        let volatile = CvQualifiers {
            is_volatile: true,
            ..CvQualifiers::default()
        };
        let ty = TypeRef::Builtin(BuiltinType::Char)
            .qualified(CvQualifiers::CONST)
            .qualified(volatile);
        let TypeRef::Qualified(_, cv) = ty else {
            panic!("expected a qualified type");
        };
        assert!(cv.is_const && cv.is_volatile);
    }
}
