//! Itanium C++ ABI name mangling.
//!
//! Covers the grammar subset a function definition can produce:
//!
//! ```text
//! <mangled-name>  ::= _Z <encoding>
//! <encoding>      ::= <name> <bare-function-type>
//! <name>          ::= <nested-name> | <unscoped-name> | <unscoped-template-name> <template-args>
//!                   | <local-name>
//! <local-name>    ::= Z <encoding> E <entity name> [<discriminator>]
//! <nested-name>   ::= N [<CV-qualifiers>] [<ref-qualifier>] <prefix> <unqualified-name> E
//! ```
//!
//! Constructors and destructors always use the complete-object variants
//! (`C1`, `D1`). One substitution table spans the whole mangling, including
//! the encodings of enclosing functions for local entities.

use linkspan_core::{
    BuiltinType, ContextId, ContextKind, CvQualifiers, DeclId, DeclKind, DeclName, Declaration,
    FunctionType, Ident, NameComponent, OverloadedOperator, QualifiedName, RefQualifier,
    TemplateArg, TranslationUnit, TypeRef,
};

use crate::error::MangleError;
use crate::substitution::{SubstKey, SubstitutionTable};

/// Mangle the function-like declaration `id` of `unit`.
///
/// # Errors
/// Returns `MangleError` when the name or a type in the signature cannot be
/// expressed (unresolved spellings, unevaluated template arguments).
pub fn mangle_declaration(unit: &TranslationUnit, id: DeclId) -> Result<String, MangleError> {
    let mut mangler = ItaniumMangler::new(unit);
    mangler.out.push_str("_Z");
    mangler.function_encoding(id)?;
    Ok(mangler.out)
}

/// Mangle a standalone type, as it would appear in a parameter list.
///
/// # Errors
/// Returns `MangleError` for unresolved types.
pub fn mangle_type(unit: &TranslationUnit, ty: &TypeRef) -> Result<String, MangleError> {
    let mut mangler = ItaniumMangler::new(unit);
    mangler.mangle_type(ty)?;
    Ok(mangler.out)
}

/// Enclosing scope of a declaration, split at the innermost function body.
struct ScopePath {
    /// Function whose body contains the scope, for local entities.
    local: Option<DeclId>,
    /// Components below `local` (or below the translation unit).
    components: Vec<NameComponent>,
    /// Discriminator of the outermost local record.
    local_discriminator: u32,
    in_anonymous_namespace: bool,
}

struct ItaniumMangler<'a> {
    unit: &'a TranslationUnit,
    out: String,
    subs: SubstitutionTable,
}

impl<'a> ItaniumMangler<'a> {
    fn new(unit: &'a TranslationUnit) -> Self {
        Self {
            unit,
            out: String::with_capacity(32),
            subs: SubstitutionTable::default(),
        }
    }

    fn decl(&self, id: DeclId) -> Result<&'a Declaration, MangleError> {
        self.unit
            .get_decl(id)
            .ok_or_else(|| MangleError::Unsupported(format!("dangling declaration id {}", id.0)))
    }

    fn scope_path(&self, ctx: ContextId) -> Result<ScopePath, MangleError> {
        let mut components = Vec::new();
        let mut local = None;
        let mut local_discriminator = 0;
        let mut in_anonymous_namespace = false;
        for (_, context) in self.unit.ancestors(ctx) {
            match &context.kind {
                ContextKind::TranslationUnit => break,
                ContextKind::Namespace { name: Some(name), .. } => {
                    components.push(NameComponent::plain(name.clone()));
                }
                ContextKind::Namespace { name: None, .. } => {
                    in_anonymous_namespace = true;
                    components.push(NameComponent {
                        ident: Ident::AnonymousNamespace,
                        template_args: None,
                    });
                }
                ContextKind::Record {
                    name,
                    template_args,
                    discriminator,
                    ..
                } => {
                    if name.is_empty() {
                        return Err(MangleError::Unsupported(
                            "member of an anonymous record".to_string(),
                        ));
                    }
                    local_discriminator = *discriminator;
                    components.push(NameComponent {
                        ident: Ident::named(name.clone()),
                        template_args: template_args.clone(),
                    });
                }
                ContextKind::LinkageSpec(_) | ContextKind::ObjCContainer { .. } => {}
                ContextKind::Function(decl) => {
                    local = Some(*decl);
                    break;
                }
                ContextKind::Block(_) => {
                    return Err(MangleError::Unsupported(
                        "entity declared inside a block".to_string(),
                    ));
                }
                ContextKind::Closure {
                    params,
                    variadic,
                    number,
                } => {
                    // Closures at namespace or class scope are numbered per
                    // initializer, which the frontend does not track.
                    let in_body = context.parent.is_some_and(|parent| {
                        matches!(self.unit.context(parent).kind, ContextKind::Function(_))
                    });
                    if !in_body {
                        return Err(MangleError::Unsupported(
                            "lambda outside a function body".to_string(),
                        ));
                    }
                    components.push(NameComponent {
                        ident: Ident::Closure {
                            params: params.clone(),
                            variadic: *variadic,
                            number: *number,
                        },
                        template_args: None,
                    });
                }
            }
        }
        components.reverse();
        if local.is_none() {
            local_discriminator = 0;
        }
        Ok(ScopePath {
            local,
            components,
            local_discriminator,
            in_anonymous_namespace,
        })
    }

    // ── Encodings and names ───────────────────────────────────────────

    fn function_encoding(&mut self, id: DeclId) -> Result<(), MangleError> {
        let decl = self.decl(id)?;
        self.function_name(decl)?;

        let has_return_type = decl.template.is_some()
            && !matches!(
                decl.kind,
                DeclKind::Constructor | DeclKind::Destructor | DeclKind::Conversion
            );
        if has_return_type {
            let ret = decl.signature.return_type.as_ref().ok_or_else(|| {
                MangleError::UnsupportedType("template function without a return type".into())
            })?;
            self.mangle_type(ret)?;
        }
        self.bare_function_params(&decl.signature.params, decl.signature.variadic)
    }

    fn function_name(&mut self, decl: &Declaration) -> Result<(), MangleError> {
        let scope = self.scope_path(decl.context)?;

        if let Some(root) = scope.local {
            self.out.push('Z');
            self.function_encoding(root)?;
            self.out.push('E');
            if scope.components.is_empty() {
                self.unqualified_decl_name(decl, false)?;
                self.function_template_args(decl, &scope)?;
            } else {
                self.nested_decl_name(decl, &scope)?;
            }
            self.discriminator(scope.local_discriminator);
            return Ok(());
        }

        let internal = decl.kind == DeclKind::Function
            && decl.is_static()
            && !scope.in_anonymous_namespace;

        let unscoped = scope.components.is_empty()
            || (scope.components.len() == 1 && is_std(&scope.components[0]));
        if unscoped {
            if !scope.components.is_empty() {
                self.out.push_str("St");
            }
            self.unqualified_decl_name(decl, internal)?;
            self.function_template_args(decl, &scope)
        } else {
            self.nested_decl_name_with_linkage(decl, &scope, internal)
        }
    }

    fn nested_decl_name(&mut self, decl: &Declaration, scope: &ScopePath) -> Result<(), MangleError> {
        self.nested_decl_name_with_linkage(decl, scope, false)
    }

    /// `N [quals] <prefix> <unqualified-name> E`; `internal` adds the `L`
    /// marker before the final name.
    fn nested_decl_name_with_linkage(
        &mut self,
        decl: &Declaration,
        scope: &ScopePath,
        internal: bool,
    ) -> Result<(), MangleError> {
        self.out.push('N');
        if decl.kind.is_cxx_member() && !decl.is_static() {
            self.cv_qualifiers(decl.signature.method_quals);
            match decl.signature.ref_qualifier {
                RefQualifier::None => {}
                RefQualifier::LValue => self.out.push('R'),
                RefQualifier::RValue => self.out.push('O'),
            }
        }
        self.prefix(scope.local, &scope.components)?;
        self.unqualified_decl_name(decl, internal)?;
        self.function_template_args(decl, scope)?;
        self.out.push('E');
        Ok(())
    }

    /// Template arguments of a function template specialization; the
    /// template name itself becomes a substitution candidate first.
    fn function_template_args(
        &mut self,
        decl: &Declaration,
        scope: &ScopePath,
    ) -> Result<(), MangleError> {
        let Some(template) = &decl.template else {
            return Ok(());
        };
        let mut path = scope.components.clone();
        path.push(NameComponent::plain(decl.name.spelling()));
        self.subs.add(SubstKey::Name {
            local: scope.local,
            path,
        });
        self.template_args(&template.args)
    }

    fn unqualified_decl_name(&mut self, decl: &Declaration, internal: bool) -> Result<(), MangleError> {
        match &decl.name {
            DeclName::Identifier(name) => {
                if internal {
                    self.out.push('L');
                }
                self.source_name(name);
            }
            DeclName::Constructor(_) => self.out.push_str("C1"),
            DeclName::Destructor(_) => self.out.push_str("D1"),
            DeclName::Operator(op) => {
                let implicit_object = decl.kind.is_cxx_member() && !decl.is_static();
                let arity = decl.signature.params.len() + usize::from(implicit_object);
                self.out.push_str(operator_code(*op, arity));
            }
            DeclName::Conversion(ty) => {
                self.out.push_str("cv");
                self.mangle_type(ty)?;
            }
            DeclName::LiteralOperator(suffix) => {
                self.out.push_str("li");
                self.source_name(suffix);
            }
            DeclName::Unresolved(text) => return Err(MangleError::UnresolvedName(text.clone())),
        }
        Ok(())
    }

    fn source_name(&mut self, name: &str) {
        self.out.push_str(&name.len().to_string());
        self.out.push_str(name);
    }

    fn source_component(&mut self, component: &NameComponent) -> Result<(), MangleError> {
        match &component.ident {
            Ident::Named(name) => self.source_name(name),
            Ident::AnonymousNamespace => self.out.push_str("12_GLOBAL__N_1"),
            Ident::Closure {
                params,
                variadic,
                number,
            } => {
                // Ul <lambda-sig> E [<number>] _
                self.out.push_str("Ul");
                self.bare_function_params(params, *variadic)?;
                self.out.push('E');
                if *number > 0 {
                    self.out.push_str(&(number - 1).to_string());
                }
                self.out.push('_');
            }
        }
        Ok(())
    }

    fn discriminator(&mut self, ordinal: u32) {
        if ordinal == 0 {
            return;
        }
        let disc = ordinal - 1;
        if disc < 10 {
            self.out.push('_');
            self.out.push_str(&disc.to_string());
        } else {
            self.out.push_str("__");
            self.out.push_str(&disc.to_string());
            self.out.push('_');
        }
    }

    // ── Prefixes and substitutions ────────────────────────────────────

    fn emit_substitution(&mut self, key: &SubstKey) -> bool {
        if let Some(encoded) = self.subs.lookup(key) {
            self.out.push_str(&encoded);
            return true;
        }
        false
    }

    /// Emit `path` as a prefix, recording every level as a candidate.
    fn prefix(&mut self, local: Option<DeclId>, path: &[NameComponent]) -> Result<(), MangleError> {
        let Some((last, parent)) = path.split_last() else {
            return Ok(());
        };
        if local.is_none() {
            if parent.is_empty() && is_std(last) {
                self.out.push_str("St");
                return Ok(());
            }
            check_std_specialization(path)?;
            if let Some(abbrev) = std_specialization_abbreviation(path) {
                self.out.push_str(abbrev);
                return Ok(());
            }
        }

        let key = SubstKey::Name {
            local,
            path: path.to_vec(),
        };
        if self.emit_substitution(&key) {
            return Ok(());
        }
        if let Some(args) = &last.template_args {
            self.template_prefix(local, path)?;
            self.template_args(args)?;
        } else {
            self.prefix(local, parent)?;
            self.source_component(last)?;
        }
        self.subs.add(key);
        Ok(())
    }

    /// Emit the template name of the specialization `path`.
    fn template_prefix(
        &mut self,
        local: Option<DeclId>,
        path: &[NameComponent],
    ) -> Result<(), MangleError> {
        let Some((last, parent)) = path.split_last() else {
            return Ok(());
        };
        let mut stripped = path.to_vec();
        if let Some(tail) = stripped.last_mut() {
            tail.template_args = None;
        }
        if local.is_none()
            && let Some(abbrev) = std_template_abbreviation(&stripped)
        {
            self.out.push_str(abbrev);
            return Ok(());
        }
        let key = SubstKey::Name {
            local,
            path: stripped,
        };
        if self.emit_substitution(&key) {
            return Ok(());
        }
        self.prefix(local, parent)?;
        self.source_component(last)?;
        self.subs.add(key);
        Ok(())
    }

    fn template_args(&mut self, args: &[TemplateArg]) -> Result<(), MangleError> {
        self.out.push('I');
        for arg in args {
            match arg {
                TemplateArg::Type(ty) => self.mangle_type(ty)?,
                TemplateArg::Integral {
                    ty: BuiltinType::Bool,
                    value,
                } => {
                    self.out.push_str(if *value == 0 { "Lb0E" } else { "Lb1E" });
                }
                TemplateArg::Integral { ty, value } => {
                    self.out.push('L');
                    self.out.push_str(builtin_code(*ty));
                    if *value < 0 {
                        self.out.push('n');
                    }
                    self.out.push_str(&value.unsigned_abs().to_string());
                    self.out.push('E');
                }
                TemplateArg::Unevaluated(text) => {
                    return Err(MangleError::UnsupportedTemplateArg(text.clone()));
                }
            }
        }
        self.out.push('E');
        Ok(())
    }

    // ── Types ─────────────────────────────────────────────────────────

    fn bare_function_params(&mut self, params: &[TypeRef], variadic: bool) -> Result<(), MangleError> {
        if params.is_empty() {
            self.out.push(if variadic { 'z' } else { 'v' });
            return Ok(());
        }
        for param in params {
            self.mangle_type(&param.adjusted_parameter())?;
        }
        if variadic {
            self.out.push('z');
        }
        Ok(())
    }

    fn cv_qualifiers(&mut self, cv: CvQualifiers) {
        if cv.is_restrict {
            self.out.push('r');
        }
        if cv.is_volatile {
            self.out.push('V');
        }
        if cv.is_const {
            self.out.push('K');
        }
    }

    fn mangle_type(&mut self, ty: &TypeRef) -> Result<(), MangleError> {
        match ty {
            TypeRef::Builtin(builtin) => {
                self.out.push_str(builtin_code(*builtin));
                return Ok(());
            }
            TypeRef::Unresolved(text) => return Err(MangleError::UnsupportedType(text.clone())),
            TypeRef::Named(name) => return self.named_type(name),
            _ => {}
        }

        let key = SubstKey::Type(ty.clone());
        if self.emit_substitution(&key) {
            return Ok(());
        }
        match ty {
            TypeRef::TemplateParam(0) => self.out.push_str("T_"),
            TypeRef::TemplateParam(index) => {
                self.out.push('T');
                self.out.push_str(&(index - 1).to_string());
                self.out.push('_');
            }
            TypeRef::Pointer(inner) => {
                self.out.push('P');
                self.mangle_type(inner)?;
            }
            TypeRef::LValueReference(inner) => {
                self.out.push('R');
                self.mangle_type(inner)?;
            }
            TypeRef::RValueReference(inner) => {
                self.out.push('O');
                self.mangle_type(inner)?;
            }
            TypeRef::Qualified(inner, cv) => {
                self.cv_qualifiers(*cv);
                self.mangle_type(inner)?;
            }
            TypeRef::Array(elem, size) => {
                self.out.push('A');
                if let Some(size) = size {
                    self.out.push_str(&size.to_string());
                }
                self.out.push('_');
                self.mangle_type(elem)?;
            }
            TypeRef::Function(function) => self.function_type(function)?,
            TypeRef::Builtin(_) | TypeRef::Named(_) | TypeRef::Unresolved(_) => {}
        }
        self.subs.add(key);
        Ok(())
    }

    fn function_type(&mut self, function: &FunctionType) -> Result<(), MangleError> {
        self.out.push('F');
        self.mangle_type(&function.return_type)?;
        self.bare_function_params(&function.params, function.variadic)?;
        self.out.push('E');
        Ok(())
    }

    fn named_type(&mut self, name: &QualifiedName) -> Result<(), MangleError> {
        let path = &name.components;
        if path.is_empty() {
            return Err(MangleError::UnsupportedType("empty type name".to_string()));
        }
        if name.local.is_none()
            && let Some(abbrev) = std_specialization_abbreviation(path)
        {
            self.out.push_str(abbrev);
            return Ok(());
        }
        let key = SubstKey::Name {
            local: name.local,
            path: path.clone(),
        };
        if self.emit_substitution(&key) {
            return Ok(());
        }

        if let Some(root) = name.local {
            self.out.push('Z');
            self.function_encoding(root)?;
            self.out.push('E');
            if path.len() == 1 {
                self.prefix(name.local, path)?;
            } else {
                self.out.push('N');
                self.prefix(name.local, path)?;
                self.out.push('E');
            }
            let discriminator = self.local_record_discriminator(root, &path[0]);
            self.discriminator(discriminator);
            self.subs.add(key);
            return Ok(());
        }

        let unscoped = path.len() == 1 || (path.len() == 2 && is_std(&path[0]));
        if unscoped {
            self.prefix(None, path)
        } else {
            self.out.push('N');
            self.prefix(None, path)?;
            self.out.push('E');
            Ok(())
        }
    }

    fn local_record_discriminator(&self, function: DeclId, component: &NameComponent) -> u32 {
        let Ident::Named(wanted) = &component.ident else {
            return 0;
        };
        let mut ordinal = 0;
        let mut idx = 0u32;
        while let Some(ctx) = self.unit.get_context(ContextId(idx)) {
            if let ContextKind::Record {
                name,
                discriminator,
                ..
            } = &ctx.kind
                && name == wanted
                && ctx.parent.is_some_and(|parent| {
                    matches!(self.unit.context(parent).kind, ContextKind::Function(f) if f == function)
                })
            {
                ordinal = *discriminator;
                break;
            }
            idx += 1;
        }
        ordinal
    }
}

fn is_std(component: &NameComponent) -> bool {
    component.template_args.is_none() && component.ident == Ident::named("std")
}

fn std_template_abbreviation(path: &[NameComponent]) -> Option<&'static str> {
    let [first, second] = path else {
        return None;
    };
    if !is_std(first) || second.template_args.is_some() {
        return None;
    }
    match second.ident.as_str() {
        "allocator" => Some("Sa"),
        _ => None,
    }
}

/// Standard class templates with trailing defaulted parameters, and their
/// full parameter count.
const STD_DEFAULTED_TEMPLATES: &[(&str, usize)] = &[
    ("vector", 2),
    ("deque", 2),
    ("list", 2),
    ("forward_list", 2),
    ("queue", 2),
    ("stack", 2),
    ("priority_queue", 3),
    ("set", 3),
    ("multiset", 3),
    ("map", 4),
    ("multimap", 4),
    ("unordered_set", 4),
    ("unordered_multiset", 4),
    ("unordered_map", 5),
    ("unordered_multimap", 5),
    ("unique_ptr", 2),
    ("basic_string_view", 2),
    ("basic_istream", 2),
    ("basic_ostream", 2),
    ("basic_iostream", 2),
];

/// Reject `std` specializations whose mangled name depends on information
/// the frontend does not see: omitted default arguments, and the
/// `__cxx11` inline namespace of the string classes.
fn check_std_specialization(path: &[NameComponent]) -> Result<(), MangleError> {
    let [first, second] = path else {
        return Ok(());
    };
    if !is_std(first) {
        return Ok(());
    }
    let Some(args) = &second.template_args else {
        return Ok(());
    };
    let name = second.ident.as_str();
    if matches!(
        name,
        "basic_string" | "basic_stringstream" | "basic_istringstream" | "basic_ostringstream"
    ) {
        return Err(MangleError::Unsupported(format!("std::{name} specialization")));
    }
    match STD_DEFAULTED_TEMPLATES.iter().find(|(template, _)| *template == name) {
        Some((_, full)) if args.len() < *full => Err(MangleError::Unsupported(format!(
            "std::{name} with defaulted template arguments"
        ))),
        _ => Ok(()),
    }
}

/// `Si`, `So`, `Sd` for the fully spelled `char` stream specializations.
fn std_specialization_abbreviation(path: &[NameComponent]) -> Option<&'static str> {
    let [first, second] = path else {
        return None;
    };
    if !is_std(first) {
        return None;
    }
    let args = second.template_args.as_ref()?;
    let char_arg = TemplateArg::Type(TypeRef::Builtin(BuiltinType::Char));
    let std_of_char = |name: &str| {
        TemplateArg::Type(TypeRef::Named(QualifiedName::global(vec![
            NameComponent::plain("std"),
            NameComponent::specialized(name, vec![char_arg.clone()]),
        ])))
    };
    let stream_args = [char_arg.clone(), std_of_char("char_traits")];
    let is_stream = args.as_slice() == stream_args.as_slice();
    match second.ident.as_str() {
        "basic_istream" if is_stream => Some("Si"),
        "basic_ostream" if is_stream => Some("So"),
        "basic_iostream" if is_stream => Some("Sd"),
        _ => None,
    }
}

/// Builtin type codes.
#[must_use]
pub const fn builtin_code(builtin: BuiltinType) -> &'static str {
    match builtin {
        BuiltinType::Void => "v",
        BuiltinType::Bool => "b",
        BuiltinType::Char => "c",
        BuiltinType::SignedChar => "a",
        BuiltinType::UnsignedChar => "h",
        BuiltinType::WChar => "w",
        BuiltinType::Char8 => "Du",
        BuiltinType::Char16 => "Ds",
        BuiltinType::Char32 => "Di",
        BuiltinType::Short => "s",
        BuiltinType::UnsignedShort => "t",
        BuiltinType::Int => "i",
        BuiltinType::UnsignedInt => "j",
        BuiltinType::Long => "l",
        BuiltinType::UnsignedLong => "m",
        BuiltinType::LongLong => "x",
        BuiltinType::UnsignedLongLong => "y",
        BuiltinType::Int128 => "n",
        BuiltinType::UnsignedInt128 => "o",
        BuiltinType::Float => "f",
        BuiltinType::Double => "d",
        BuiltinType::LongDouble => "e",
        BuiltinType::Float128 => "g",
        BuiltinType::NullPtr => "Dn",
    }
}

/// Operator codes; `arity` counts the implicit object parameter.
#[must_use]
pub const fn operator_code(op: OverloadedOperator, arity: usize) -> &'static str {
    use OverloadedOperator as Op;
    let unary = arity == 1;
    match op {
        Op::New => "nw",
        Op::Delete => "dl",
        Op::ArrayNew => "na",
        Op::ArrayDelete => "da",
        Op::Plus if unary => "ps",
        Op::Plus => "pl",
        Op::Minus if unary => "ng",
        Op::Minus => "mi",
        Op::Star if unary => "de",
        Op::Star => "ml",
        Op::Amp if unary => "ad",
        Op::Amp => "an",
        Op::Slash => "dv",
        Op::Percent => "rm",
        Op::Caret => "eo",
        Op::Pipe => "or",
        Op::Tilde => "co",
        Op::Exclaim => "nt",
        Op::Equal => "aS",
        Op::Less => "lt",
        Op::Greater => "gt",
        Op::PlusEqual => "pL",
        Op::MinusEqual => "mI",
        Op::StarEqual => "mL",
        Op::SlashEqual => "dV",
        Op::PercentEqual => "rM",
        Op::CaretEqual => "eO",
        Op::AmpEqual => "aN",
        Op::PipeEqual => "oR",
        Op::LessLess => "ls",
        Op::GreaterGreater => "rs",
        Op::LessLessEqual => "lS",
        Op::GreaterGreaterEqual => "rS",
        Op::EqualEqual => "eq",
        Op::ExclaimEqual => "ne",
        Op::LessEqual => "le",
        Op::GreaterEqual => "ge",
        Op::Spaceship => "ss",
        Op::AmpAmp => "aa",
        Op::PipePipe => "oo",
        Op::PlusPlus => "pp",
        Op::MinusMinus => "mm",
        Op::Comma => "cm",
        Op::ArrowStar => "pm",
        Op::Arrow => "pt",
        Op::Call => "cl",
        Op::Subscript => "ix",
        Op::Coawait => "aw",
    }
}
