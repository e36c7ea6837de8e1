//! Type specifiers, declarators and template arguments.

use ast_grep_core::{Doc, Node};
use linkspan_core::{
    BuiltinType, ContextId, ContextKind, CvQualifiers, FunctionType, Ident, NameComponent,
    QualifiedName, RecordTag, TemplateArg, TypeRef,
};

use super::{Lowerer, primitive_builtin};

/// One `::`-separated segment of a written name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Segment {
    pub name: String,
    pub args: Option<Vec<TemplateArg>>,
}

impl Segment {
    fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }
}

impl Lowerer<'_> {
    /// Lower a type specifier (the `type` field of a declaration).
    pub(super) fn lower_type_node<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId) -> TypeRef {
        let text = node.text().to_string();
        match node.kind().as_ref() {
            "primitive_type" => primitive_builtin(&text, self.target)
                .map_or_else(|| TypeRef::Unresolved(text), TypeRef::Builtin),
            "sized_type_specifier" => {
                sized_builtin(&text).map_or_else(|| TypeRef::Unresolved(text), TypeRef::Builtin)
            }
            "type_identifier" => self.lookup_named_type(ctx, false, &[Segment::plain(text)]),
            "qualified_identifier" | "template_type" => {
                let (global, segments) = self.name_segments(node, ctx);
                self.lookup_named_type(ctx, global, &segments)
            }
            "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier" => {
                match node.field("name") {
                    Some(name) => self.lower_type_node(&name, ctx),
                    None => TypeRef::Unresolved(text),
                }
            }
            "type_descriptor" => self.lower_type_descriptor(node, ctx),
            _ => TypeRef::Unresolved(text),
        }
    }

    pub(super) fn lower_type_descriptor<D: Doc>(
        &mut self,
        node: &Node<D>,
        ctx: ContextId,
    ) -> TypeRef {
        let Some(ty) = node.field("type") else {
            return TypeRef::Unresolved(node.text().to_string());
        };
        let base = self.lower_type_node(&ty, ctx).qualified(qualifiers_of(node));
        match node.field("declarator") {
            Some(declarator) => self.apply_declarator(base, &declarator, ctx),
            None => base,
        }
    }

    /// Wrap `base` in the pointer, reference, array and function layers of
    /// a (possibly abstract) declarator.
    pub(super) fn apply_declarator<D: Doc>(
        &mut self,
        base: TypeRef,
        node: &Node<D>,
        ctx: ContextId,
    ) -> TypeRef {
        match node.kind().as_ref() {
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let ty = TypeRef::pointer_to(base).qualified(qualifiers_of(node));
                match node.field("declarator") {
                    Some(inner) => self.apply_declarator(ty, &inner, ctx),
                    None => ty,
                }
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let rvalue = node.children().any(|c| c.text().as_ref() == "&&");
                let ty = if rvalue {
                    TypeRef::rvalue_ref_to(base)
                } else {
                    TypeRef::lvalue_ref_to(base)
                };
                let inner = node
                    .children()
                    .filter(|c| c.is_named() && c.kind().as_ref() != "type_qualifier")
                    .last();
                match inner {
                    Some(inner) => self.apply_declarator(ty, &inner, ctx),
                    None => ty,
                }
            }
            "array_declarator" | "abstract_array_declarator" => {
                let size = node
                    .field("size")
                    .and_then(|size| parse_integer(size.text().trim()))
                    .and_then(|(_, value)| u64::try_from(value).ok());
                let ty = TypeRef::Array(Box::new(base), size);
                match node.field("declarator") {
                    Some(inner) => self.apply_declarator(ty, &inner, ctx),
                    None => ty,
                }
            }
            "function_declarator" | "abstract_function_declarator" => {
                let (params, variadic) = node
                    .field("parameters")
                    .map(|list| self.lower_params(&list, ctx))
                    .unwrap_or_default();
                let ty = TypeRef::Function(Box::new(FunctionType {
                    return_type: base,
                    params,
                    variadic,
                }));
                match node.field("declarator") {
                    Some(inner) => self.apply_declarator(ty, &inner, ctx),
                    None => ty,
                }
            }
            "parenthesized_declarator"
            | "abstract_parenthesized_declarator"
            | "attributed_declarator" => {
                let inner = node.children().find(|c| {
                    c.is_named()
                        && !matches!(c.kind().as_ref(), "attribute_declaration" | "type_qualifier")
                });
                match inner {
                    Some(inner) => self.apply_declarator(base, &inner, ctx),
                    None => base,
                }
            }
            "init_declarator" => match node.field("declarator") {
                Some(inner) => self.apply_declarator(base, &inner, ctx),
                None => base,
            },
            _ => base,
        }
    }

    /// Declared parameter types of a `parameter_list`, and whether it ends
    /// in `...`. A lone `void` is the empty list.
    pub(super) fn lower_params<D: Doc>(
        &mut self,
        list: &Node<D>,
        ctx: ContextId,
    ) -> (Vec<TypeRef>, bool) {
        let mut params = Vec::new();
        let mut variadic = false;
        for param in list.children() {
            match param.kind().as_ref() {
                "parameter_declaration" | "optional_parameter_declaration" => {
                    let declared = self.lower_param(&param, ctx);
                    params.push(declared);
                }
                "variadic_parameter_declaration" => {
                    params.push(TypeRef::Unresolved(param.text().to_string()));
                }
                "variadic_parameter" | "..." => variadic = true,
                _ => {}
            }
        }
        if let [only] = params.as_slice()
            && only.is_void()
        {
            params.clear();
        }
        (params, variadic)
    }

    fn lower_param<D: Doc>(&mut self, param: &Node<D>, ctx: ContextId) -> TypeRef {
        let base = match param.field("type") {
            Some(ty) => self.lower_type_node(&ty, ctx),
            None => return TypeRef::Unresolved(param.text().to_string()),
        };
        let base = base.qualified(qualifiers_of(param));
        match param.field("declarator") {
            Some(declarator) => self.apply_declarator(base, &declarator, ctx),
            None => base,
        }
    }

    pub(super) fn lower_template_args<D: Doc>(
        &mut self,
        list: &Node<D>,
        ctx: ContextId,
    ) -> Vec<TemplateArg> {
        list.children()
            .filter(|arg| arg.is_named() && arg.kind().as_ref() != "comment")
            .map(|arg| self.lower_template_arg(&arg, ctx))
            .collect()
    }

    fn lower_template_arg<D: Doc>(&mut self, arg: &Node<D>, ctx: ContextId) -> TemplateArg {
        let text = arg.text().trim().to_string();
        match arg.kind().as_ref() {
            "type_descriptor" => TemplateArg::Type(self.lower_type_descriptor(arg, ctx)),
            "true" => TemplateArg::Integral {
                ty: BuiltinType::Bool,
                value: 1,
            },
            "false" => TemplateArg::Integral {
                ty: BuiltinType::Bool,
                value: 0,
            },
            "number_literal" => match parse_integer(&text) {
                Some((ty, value)) => TemplateArg::Integral { ty, value },
                None => TemplateArg::Unevaluated(text),
            },
            "unary_expression" => match text.strip_prefix('-').map(str::trim).and_then(parse_integer) {
                Some((ty, value)) => TemplateArg::Integral { ty, value: -value },
                None => TemplateArg::Unevaluated(text),
            },
            "char_literal" => {
                let inner = text.trim_matches('\'');
                let mut chars = inner.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => TemplateArg::Integral {
                        ty: BuiltinType::Char,
                        value: i128::from(u32::from(c)),
                    },
                    _ => TemplateArg::Unevaluated(text),
                }
            }
            "identifier" | "type_identifier" => {
                if let Some(idx) = self.template_param(&text) {
                    TemplateArg::Type(TypeRef::TemplateParam(idx))
                } else if self.lookup_typedef(ctx, &text).is_some()
                    || self.lookup_scope(ctx, &text).is_some()
                {
                    TemplateArg::Type(self.lookup_named_type(ctx, false, &[Segment::plain(text)]))
                } else {
                    TemplateArg::Unevaluated(text)
                }
            }
            "qualified_identifier" | "template_type" => {
                let (global, segments) = self.name_segments(arg, ctx);
                TemplateArg::Type(self.lookup_named_type(ctx, global, &segments))
            }
            _ => TemplateArg::Unevaluated(text),
        }
    }

    // ── Names ─────────────────────────────────────────────────────────

    /// Segments of a possibly qualified name, and whether it starts with `::`.
    pub(super) fn name_segments<D: Doc>(
        &mut self,
        node: &Node<D>,
        ctx: ContextId,
    ) -> (bool, Vec<Segment>) {
        let (global, scopes, leaf) = split_qualified(node);
        let mut segments: Vec<Segment> = scopes
            .iter()
            .map(|scope| self.segment_of(scope, ctx))
            .collect();
        segments.push(self.segment_of(&leaf, ctx));
        (global, segments)
    }

    pub(super) fn segment_of<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId) -> Segment {
        match node.kind().as_ref() {
            "template_type" | "template_function" | "template_method" => Segment {
                name: node
                    .field("name")
                    .map_or_else(String::new, |n| n.text().to_string()),
                args: node
                    .field("arguments")
                    .map(|args| self.lower_template_args(&args, ctx)),
            },
            _ => Segment::plain(node.text().trim()),
        }
    }

    /// The context a qualifier list names, creating record contexts for
    /// qualifiers the unit never declared.
    pub(super) fn resolve_scope(
        &mut self,
        ctx: ContextId,
        global: bool,
        segments: &[Segment],
    ) -> ContextId {
        let Some((first, rest)) = segments.split_first() else {
            return if global { ContextId::ROOT } else { ctx };
        };
        let mut current = if global {
            self.child_scope(ContextId::ROOT, first)
        } else {
            match self.lookup_scope(ctx, &first.name) {
                Some(found) => self.specialize(found, first),
                None => {
                    let start = self.unit.naming_context(ctx);
                    self.child_scope(start, first)
                }
            }
        };
        for segment in rest {
            current = self.child_scope(current, segment);
        }
        current
    }

    fn child_scope(&mut self, parent: ContextId, segment: &Segment) -> ContextId {
        if let Some(found) = self.scopes.get(&(parent, segment.name.clone())).copied() {
            return self.specialize(found, segment);
        }
        let kind = if segment.name == "std" && parent == ContextId::ROOT {
            ContextKind::Namespace {
                name: Some(segment.name.clone()),
                inline: false,
            }
        } else {
            ContextKind::Record {
                name: segment.name.clone(),
                tag: RecordTag::Class,
                template_args: segment.args.clone(),
                discriminator: 0,
            }
        };
        let created = self.unit.context_for(parent, kind);
        self.scopes.insert((parent, segment.name.clone()), created);
        created
    }

    /// `found` itself, or its sibling specialization for `segment`'s
    /// template arguments.
    fn specialize(&mut self, found: ContextId, segment: &Segment) -> ContextId {
        let Some(args) = &segment.args else {
            return found;
        };
        let context = self.unit.context(found).clone();
        match context.kind {
            ContextKind::Record {
                name,
                tag,
                template_args,
                ..
            } if template_args.as_ref() != Some(args) => self.unit.context_for(
                context.parent.unwrap_or(ContextId::ROOT),
                ContextKind::Record {
                    name,
                    tag,
                    template_args: Some(args.clone()),
                    discriminator: 0,
                },
            ),
            _ => found,
        }
    }

    /// The qualified name a class declared in `ctx` is mangled with.
    pub(super) fn qualified_name_of(&self, ctx: ContextId) -> QualifiedName {
        let mut components = Vec::new();
        let mut local = None;
        for (_, context) in self.unit.ancestors(ctx) {
            match &context.kind {
                ContextKind::Namespace { name: Some(name), .. } => {
                    components.push(NameComponent::plain(name.clone()));
                }
                ContextKind::Namespace { name: None, .. } => components.push(NameComponent {
                    ident: Ident::AnonymousNamespace,
                    template_args: None,
                }),
                ContextKind::Record {
                    name,
                    template_args,
                    ..
                } => components.push(NameComponent {
                    ident: Ident::named(name.clone()),
                    template_args: template_args.clone(),
                }),
                ContextKind::Function(decl) => {
                    local = Some(*decl);
                    break;
                }
                _ => {}
            }
        }
        components.reverse();
        QualifiedName { local, components }
    }

    /// Resolve a written type name: template parameters, typedefs, known
    /// classes, then the name as written.
    fn lookup_named_type(&self, ctx: ContextId, global: bool, segments: &[Segment]) -> TypeRef {
        if let [only] = segments
            && !global
            && only.args.is_none()
        {
            if let Some(idx) = self.template_param(&only.name) {
                return TypeRef::TemplateParam(idx);
            }
            if let Some(aliased) = self.lookup_typedef(ctx, &only.name) {
                return aliased.clone();
            }
            if self.lookup_scope(ctx, &only.name).is_none()
                && let Some(builtin) = self.target.builtin_typedef(&only.name)
            {
                return TypeRef::Builtin(builtin);
            }
        }
        if let [first, second] = segments
            && first.name == "std"
            && first.args.is_none()
            && second.args.is_none()
            && let Some(known) = self.std_alias(&second.name)
        {
            return known;
        }

        let mut current = global.then_some(ContextId::ROOT);
        let mut resolved = 0;
        for segment in segments {
            let found = match current {
                None => self.lookup_scope(ctx, &segment.name),
                Some(parent) => self.scopes.get(&(parent, segment.name.clone())).copied(),
            };
            match found {
                Some(found) => {
                    current = Some(found);
                    resolved += 1;
                }
                None => break,
            }
        }

        if let Some(scope) = current
            && let [member] = &segments[resolved..]
            && member.args.is_none()
            && let Some(aliased) = self.typedefs.get(&(scope, member.name.clone()))
        {
            return aliased.clone();
        }

        let mut name = match current {
            Some(scope) if resolved > 0 => self.qualified_name_of(scope),
            _ => QualifiedName::global(Vec::new()),
        };
        if resolved > 0
            && let Some(args) = &segments[resolved - 1].args
            && let Some(last) = name.components.last_mut()
        {
            last.template_args = Some(args.clone());
        }
        for segment in &segments[resolved..] {
            name.components.push(NameComponent {
                ident: Ident::named(segment.name.clone()),
                template_args: segment.args.clone(),
            });
        }
        TypeRef::Named(name)
    }

    /// Standard library typedefs that mangle through their target.
    fn std_alias(&self, name: &str) -> Option<TypeRef> {
        let char_arg = TemplateArg::Type(TypeRef::Builtin(BuiltinType::Char));
        let std_of_char = |template: &str| {
            TemplateArg::Type(TypeRef::Named(QualifiedName::global(vec![
                NameComponent::plain("std"),
                NameComponent::specialized(template, vec![char_arg.clone()]),
            ])))
        };
        let specialized = |template: &str, args: Vec<TemplateArg>| {
            TypeRef::Named(QualifiedName::global(vec![
                NameComponent::plain("std"),
                NameComponent::specialized(template, args),
            ]))
        };
        match name {
            "string" => Some(specialized(
                "basic_string",
                vec![
                    char_arg.clone(),
                    std_of_char("char_traits"),
                    std_of_char("allocator"),
                ],
            )),
            "istream" | "ostream" | "iostream" => Some(specialized(
                &format!("basic_{name}"),
                vec![char_arg.clone(), std_of_char("char_traits")],
            )),
            "nullptr_t" => Some(TypeRef::Builtin(BuiltinType::NullPtr)),
            other => self.target.builtin_typedef(other).map(TypeRef::Builtin),
        }
    }
}

/// Split `a::b::leaf` into its global flag, scope nodes and leaf node.
pub(super) fn split_qualified<'r, D: Doc>(node: &Node<'r, D>) -> (bool, Vec<Node<'r, D>>, Node<'r, D>) {
    let mut global = false;
    let mut scopes = Vec::new();
    let mut current = node.clone();
    while current.kind().as_ref() == "qualified_identifier" {
        match current.field("scope") {
            Some(scope) => scopes.push(scope),
            None if scopes.is_empty() => global = true,
            None => {}
        }
        match current.field("name") {
            Some(name) => current = name,
            None => break,
        }
    }
    (global, scopes, current)
}

/// The identifier a declarator declares.
pub(super) fn declarator_name<D: Doc>(node: &Node<D>) -> Option<String> {
    match node.kind().as_ref() {
        "identifier" | "type_identifier" | "field_identifier" => Some(node.text().to_string()),
        "function_declarator" | "array_declarator" | "init_declarator" | "pointer_declarator"
        | "attributed_declarator" => node
            .field("declarator")
            .and_then(|inner| declarator_name(&inner)),
        "reference_declarator" | "parenthesized_declarator" => {
            node.children().find_map(|child| declarator_name(&child))
        }
        _ => None,
    }
}

/// `const`/`volatile`/`restrict` children of a node.
pub(super) fn qualifiers_of<D: Doc>(node: &Node<D>) -> CvQualifiers {
    let mut cv = CvQualifiers::default();
    for child in node.children() {
        if child.kind().as_ref() != "type_qualifier" {
            continue;
        }
        match child.text().as_ref() {
            "const" => cv.is_const = true,
            "volatile" => cv.is_volatile = true,
            "restrict" | "__restrict" | "__restrict__" => cv.is_restrict = true,
            _ => {}
        }
    }
    cv
}

/// Builtin named by a multi-word specifier such as `unsigned long long`.
fn sized_builtin(text: &str) -> Option<BuiltinType> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let unsigned = words.contains(&"unsigned");
    let signed = words.contains(&"signed");
    let longs = words.iter().filter(|w| **w == "long").count();
    let short = words.contains(&"short");

    let builtin = if words.contains(&"double") {
        if longs > 0 {
            BuiltinType::LongDouble
        } else {
            BuiltinType::Double
        }
    } else if words.contains(&"char") {
        if unsigned {
            BuiltinType::UnsignedChar
        } else if signed {
            BuiltinType::SignedChar
        } else {
            BuiltinType::Char
        }
    } else if words.contains(&"__int128") {
        if unsigned {
            BuiltinType::UnsignedInt128
        } else {
            BuiltinType::Int128
        }
    } else if short {
        if unsigned {
            BuiltinType::UnsignedShort
        } else {
            BuiltinType::Short
        }
    } else {
        match (longs, unsigned) {
            (0, false) => BuiltinType::Int,
            (0, true) => BuiltinType::UnsignedInt,
            (1, false) => BuiltinType::Long,
            (1, true) => BuiltinType::UnsignedLong,
            (_, false) => BuiltinType::LongLong,
            (_, true) => BuiltinType::UnsignedLongLong,
        }
    };
    Some(builtin)
}

/// An integer literal and the type its suffix gives it.
pub(super) fn parse_integer(text: &str) -> Option<(BuiltinType, i128)> {
    let digits_end = text
        .trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L' | 'z' | 'Z'))
        .len();
    let (number, suffix) = text.split_at(digits_end);
    let number: String = number.chars().filter(|c| *c != '\'').collect();

    let value = if let Some(hex) = number.strip_prefix("0x").or_else(|| number.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = number.strip_prefix("0b").or_else(|| number.strip_prefix("0B")) {
        i128::from_str_radix(bin, 2).ok()?
    } else if number.len() > 1 && number.starts_with('0') {
        i128::from_str_radix(&number[1..], 8).ok()?
    } else {
        number.parse::<i128>().ok()?
    };

    let suffix = suffix.to_ascii_lowercase();
    let unsigned = suffix.contains('u');
    let longs = suffix.matches('l').count();
    let ty = match (longs, unsigned) {
        (0, false) => BuiltinType::Int,
        (0, true) => BuiltinType::UnsignedInt,
        (1, false) => BuiltinType::Long,
        (1, true) => BuiltinType::UnsignedLong,
        (_, false) => BuiltinType::LongLong,
        (_, true) => BuiltinType::UnsignedLongLong,
    };
    Some((ty, value))
}
