//! Function definitions, their names and signatures, and block literals.

use ast_grep_core::{Doc, Node};
use linkspan_core::{
    BlockInfo, ContextId, ContextKind, CvQualifiers, DeclAttributes, DeclId, DeclKind, DeclName,
    Declaration, FunctionTemplate, FunctionType, Linkage, OverloadedOperator, RefQualifier,
    Signature, StorageClass, TemplateArg, TypeRef,
};

use super::types::{qualifiers_of, split_qualified};
use super::{
    FileCx, FunctionState, Lowerer, PrimaryTemplate, TemplateHeader, asm_label, has_storage,
    header_text,
};

/// The pieces of a function declarator that name and type the function.
struct FunctionShape<'r, D: Doc> {
    /// `function_declarator`, or the abstract one under an `operator_cast`.
    func: Node<'r, D>,
    global: bool,
    scopes: Vec<Node<'r, D>>,
    leaf: Node<'r, D>,
}

fn function_shape<'r, D: Doc>(declarator: &Node<'r, D>) -> Option<FunctionShape<'r, D>> {
    let (global, scopes, leaf) = split_qualified(declarator);
    if leaf.kind().as_ref() == "operator_cast" {
        let func = find_function_declarator(&leaf.field("declarator")?)?;
        return Some(FunctionShape {
            func,
            global,
            scopes,
            leaf,
        });
    }
    let func = find_function_declarator(declarator)?;
    let (global, scopes, leaf) = split_qualified(&func.field("declarator")?);
    Some(FunctionShape {
        func,
        global,
        scopes,
        leaf,
    })
}

/// The innermost function declarator: the one applied to the declared name.
pub(super) fn find_function_declarator<'r, D: Doc>(node: &Node<'r, D>) -> Option<Node<'r, D>> {
    match node.kind().as_ref() {
        "function_declarator" | "abstract_function_declarator" => {
            let inner = node
                .field("declarator")
                .and_then(|inner| find_function_declarator(&inner));
            Some(inner.unwrap_or_else(|| node.clone()))
        }
        "pointer_declarator"
        | "reference_declarator"
        | "parenthesized_declarator"
        | "attributed_declarator"
        | "abstract_pointer_declarator"
        | "abstract_reference_declarator"
        | "abstract_parenthesized_declarator" => node
            .children()
            .filter(|child| child.is_named())
            .find_map(|child| find_function_declarator(&child)),
        _ => None,
    }
}

/// Name as written, before the semantic context is known.
enum NameDraft {
    Ident(String),
    Destructor(String),
    Operator(String),
    Conversion(TypeRef),
    Other(String),
}

impl Lowerer<'_> {
    pub(super) fn lower_function<D: Doc>(
        &mut self,
        node: &Node<D>,
        ctx: ContextId,
        file: &FileCx,
        template: Option<TemplateHeader>,
    ) -> Option<DeclId> {
        let declarator = node.field("declarator")?;
        let shape = function_shape(&declarator)?;
        let body = node.field("body");
        let defaulted = node.children().any(|child| {
            matches!(
                child.kind().as_ref(),
                "default_method_clause" | "delete_method_clause" | "pure_virtual_clause"
            )
        });

        let scope_segments: Vec<_> = shape
            .scopes
            .iter()
            .map(|scope| self.segment_of(scope, ctx))
            .collect();
        let scoped = shape.global || !scope_segments.is_empty();
        let context = if scoped {
            self.resolve_scope(ctx, shape.global, &scope_segments)
        } else {
            ctx
        };
        let (draft, explicit_args) = self.name_draft(&shape, ctx);

        let (mut params, mut variadic) = shape
            .func
            .field("parameters")
            .map(|list| self.lower_params(&list, context))
            .unwrap_or_default();
        let declared_params = params.clone();
        let trailing = shape
            .func
            .children()
            .find(|child| child.kind().as_ref() == "trailing_return_type")
            .and_then(|trailing| trailing.children().find(|c| c.kind().as_ref() == "type_descriptor"));
        let mut return_type = match (trailing, node.field("type")) {
            (Some(trailing), _) => Some(self.lower_type_descriptor(&trailing, context)),
            (None, Some(ty)) => {
                let base = self.lower_type_node(&ty, ctx).qualified(qualifiers_of(node));
                Some(self.apply_until(base, &declarator, &shape.func, ctx))
            }
            (None, None) => None,
        };

        let record_name = match &self.unit.context(context).kind {
            ContextKind::Record { name, .. } => Some(name.clone()),
            _ => None,
        };
        let (kind, name) = classify(draft, record_name.as_deref());
        if matches!(kind, DeclKind::Constructor | DeclKind::Destructor) {
            return_type = None;
        }

        let spelling = name.spelling();
        let naming = self.unit.naming_context(context);
        let key = (naming, spelling.clone());
        let header = header_text(node, body.as_ref());

        let storage = if has_storage(node, "static")
            || (kind.is_cxx_member() && self.static_members.contains(&(context, spelling.clone())))
        {
            StorageClass::Static
        } else if has_storage(node, "extern") {
            StorageClass::Extern
        } else {
            StorageClass::None
        };

        let linkage = if !self.unit.language().is_cplusplus() {
            Linkage::C
        } else if kind == DeclKind::Function
            && (self.lexical_linkage(ctx) == Some(Linkage::C)
                || (!scoped && self.c_linkage.contains(&key)))
        {
            Linkage::C
        } else {
            Linkage::Cxx
        };

        let attributes = DeclAttributes {
            overloadable: header.contains("overloadable") || self.overloadable.contains(&key),
            asm_label: asm_label(&header).or_else(|| self.asm_labels.get(&key).cloned()),
        };

        let scope_has_args = scope_segments.iter().any(|segment| segment.args.is_some());
        let template = match template {
            Some(header) if !scope_has_args && !header.is_specialization() => {
                self.primaries.insert(
                    key.clone(),
                    PrimaryTemplate {
                        param_count: header.params,
                        params: params.clone(),
                        return_type: return_type.clone(),
                        variadic,
                    },
                );
                Some(FunctionTemplate {
                    args: header.own_args(),
                })
            }
            Some(_) if !scope_has_args => {
                let primary = self.primaries.get(&key).cloned();
                let args = explicit_args
                    .or_else(|| primary.as_ref().and_then(|p| deduce(p, &declared_params)))
                    .unwrap_or_else(|| vec![TemplateArg::Unevaluated(spelling.clone())]);
                if let Some(primary) = primary {
                    params = primary.params;
                    return_type = primary.return_type;
                    variadic = primary.variadic;
                }
                Some(FunctionTemplate { args })
            }
            _ => explicit_args.map(|args| FunctionTemplate { args }),
        };

        let method_quals = qualifiers_of(&shape.func);
        let ref_qualifier = ref_qualifier_of(&shape.func);

        let decl = Declaration {
            kind,
            name,
            context,
            location: file.location(&shape.leaf),
            extent: file.extent(node),
            has_body: body.is_some() && !defaulted,
            signature: Signature {
                params,
                return_type,
                variadic,
                method_quals,
                ref_qualifier,
            },
            template,
            storage,
            linkage,
            attributes,
            objc: None,
            block: None,
        };
        let id = self.unit.add_decl(decl);
        if let Some(body) = body {
            self.lower_body(id, context, &body, file);
        }
        Some(id)
    }

    /// Lower the locals of a function-like body under its own scope.
    pub(super) fn lower_body<D: Doc>(
        &mut self,
        id: DeclId,
        parent: ContextId,
        body: &Node<D>,
        file: &FileCx,
    ) {
        let scope = self.unit.context_for(parent, ContextKind::Function(id));
        self.functions.push(FunctionState::default());
        self.lower_locals(body, scope, file);
        self.functions.pop();
    }

    pub(super) fn lower_block<D: Doc>(&mut self, node: &Node<D>, scope: ContextId, file: &FileCx) {
        let ordinal = self.functions.last_mut().map_or(0, |state| {
            let ordinal = state.blocks;
            state.blocks += 1;
            ordinal
        });
        let decl = Declaration {
            kind: DeclKind::Block,
            name: DeclName::Identifier(String::new()),
            context: scope,
            location: file.location(node),
            extent: file.extent(node),
            has_body: true,
            signature: Signature::default(),
            template: None,
            storage: StorageClass::None,
            linkage: Linkage::C,
            attributes: DeclAttributes::default(),
            objc: None,
            block: Some(BlockInfo { ordinal }),
        };
        let id = self.unit.add_decl(decl);
        let inner = self.unit.context_for(scope, ContextKind::Block(id));
        self.lower_locals(node, inner, file);
    }

    /// A lambda expression becomes the call operator of its closure class.
    pub(super) fn lower_lambda<D: Doc>(&mut self, node: &Node<D>, scope: ContextId, file: &FileCx) {
        let declarator = node.field("declarator");
        let (mut params, variadic) = declarator
            .as_ref()
            .and_then(|d| d.field("parameters"))
            .map(|list| self.lower_params(&list, scope))
            .unwrap_or_default();
        if let Some(template) = node.field("template_parameters") {
            params = vec![TypeRef::Unresolved(template.text().to_string())];
        }
        let mutable = declarator
            .as_ref()
            .is_some_and(|d| d.children().any(|c| c.text().as_ref() == "mutable"));
        let return_type = declarator
            .as_ref()
            .and_then(|d| d.children().find(|c| c.kind().as_ref() == "trailing_return_type"))
            .and_then(|trailing| trailing.children().find(|c| c.kind().as_ref() == "type_descriptor"))
            .map(|ty| self.lower_type_descriptor(&ty, scope));

        let number = self.functions.last_mut().map_or(0, |state| {
            let seen = state.lambdas.entry((params.clone(), variadic)).or_insert(0);
            let number = *seen;
            *seen += 1;
            number
        });
        let closure = self.unit.context_for(
            scope,
            ContextKind::Closure {
                params: params.clone(),
                variadic,
                number,
            },
        );

        let decl = Declaration {
            kind: DeclKind::Method,
            name: DeclName::Operator(OverloadedOperator::Call),
            context: closure,
            location: file.location(node),
            extent: file.extent(node),
            has_body: true,
            signature: Signature {
                params,
                return_type,
                variadic,
                method_quals: if mutable {
                    CvQualifiers::default()
                } else {
                    CvQualifiers::CONST
                },
                ref_qualifier: RefQualifier::None,
            },
            template: None,
            storage: StorageClass::None,
            linkage: Linkage::Cxx,
            attributes: DeclAttributes::default(),
            objc: None,
            block: None,
        };
        let id = self.unit.add_decl(decl);
        if let Some(body) = node.field("body") {
            self.lower_body(id, closure, &body, file);
        }
    }

    fn name_draft<D: Doc>(
        &mut self,
        shape: &FunctionShape<'_, D>,
        ctx: ContextId,
    ) -> (NameDraft, Option<Vec<TemplateArg>>) {
        let leaf = &shape.leaf;
        let text = leaf.text().trim().to_string();
        match leaf.kind().as_ref() {
            "identifier" | "field_identifier" => (NameDraft::Ident(text), None),
            "destructor_name" => (
                NameDraft::Destructor(text.trim_start_matches('~').trim().to_string()),
                None,
            ),
            "operator_name" => (NameDraft::Operator(text), None),
            "template_function" | "template_method" => {
                let args = leaf
                    .field("arguments")
                    .map(|args| self.lower_template_args(&args, ctx));
                let draft = match leaf.field("name") {
                    Some(name) if name.kind().as_ref() == "operator_name" => {
                        NameDraft::Operator(name.text().to_string())
                    }
                    Some(name) => NameDraft::Ident(name.text().to_string()),
                    None => NameDraft::Other(text),
                };
                (draft, args)
            }
            "operator_cast" => {
                let target = match leaf.field("type") {
                    Some(ty) => {
                        let base = self.lower_type_node(&ty, ctx).qualified(qualifiers_of(leaf));
                        match leaf.field("declarator") {
                            Some(declarator) => {
                                self.apply_until(base, &declarator, &shape.func, ctx)
                            }
                            None => base,
                        }
                    }
                    None => TypeRef::Unresolved(text),
                };
                (NameDraft::Conversion(target), None)
            }
            _ => (NameDraft::Other(text), None),
        }
    }

    /// Apply the declarator layers outside `stop`: the return type of the
    /// function `stop` declares.
    fn apply_until<D: Doc>(
        &mut self,
        base: TypeRef,
        node: &Node<D>,
        stop: &Node<D>,
        ctx: ContextId,
    ) -> TypeRef {
        if node.range() == stop.range() && node.kind() == stop.kind() {
            return base;
        }
        match node.kind().as_ref() {
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let ty = TypeRef::pointer_to(base).qualified(qualifiers_of(node));
                match node.field("declarator") {
                    Some(inner) => self.apply_until(ty, &inner, stop, ctx),
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
                match node.children().filter(|c| c.is_named()).last() {
                    Some(inner) => self.apply_until(ty, &inner, stop, ctx),
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
                    Some(inner) => self.apply_until(ty, &inner, stop, ctx),
                    None => ty,
                }
            }
            "parenthesized_declarator"
            | "abstract_parenthesized_declarator"
            | "attributed_declarator" => match node.children().find(|c| c.is_named()) {
                Some(inner) => self.apply_until(base, &inner, stop, ctx),
                None => base,
            },
            _ => base,
        }
    }
}

fn classify(draft: NameDraft, record: Option<&str>) -> (DeclKind, DeclName) {
    let member_or = |kind: DeclKind| if record.is_some() { DeclKind::Method } else { kind };
    match draft {
        NameDraft::Ident(name) if record == Some(name.as_str()) => {
            (DeclKind::Constructor, DeclName::Constructor(name))
        }
        NameDraft::Ident(name) => (member_or(DeclKind::Function), DeclName::Identifier(name)),
        NameDraft::Destructor(name) if record.is_some() => {
            (DeclKind::Destructor, DeclName::Destructor(name))
        }
        NameDraft::Destructor(name) => {
            (DeclKind::Function, DeclName::Unresolved(format!("~{name}")))
        }
        NameDraft::Operator(text) => (member_or(DeclKind::Function), operator_name(&text)),
        NameDraft::Conversion(ty) if record.is_some() => {
            (DeclKind::Conversion, DeclName::Conversion(ty))
        }
        NameDraft::Conversion(ty) => (DeclKind::Function, DeclName::Conversion(ty)),
        NameDraft::Other(text) => (member_or(DeclKind::Function), DeclName::Unresolved(text)),
    }
}

/// `operator+`, `operator new[]`, `operator""_km`.
fn operator_name(text: &str) -> DeclName {
    let rest = text.strip_prefix("operator").unwrap_or(text).trim();
    if let Some(suffix) = rest.strip_prefix("\"\"") {
        return DeclName::LiteralOperator(suffix.trim().to_string());
    }
    OverloadedOperator::from_spelling(rest)
        .map_or_else(|| DeclName::Unresolved(text.to_string()), DeclName::Operator)
}

fn ref_qualifier_of<D: Doc>(func: &Node<D>) -> RefQualifier {
    for child in func.children() {
        let kind = child.kind();
        let text = child.text();
        if kind.as_ref() == "ref_qualifier" || matches!(text.as_ref(), "&" | "&&") {
            return if text.contains("&&") {
                RefQualifier::RValue
            } else {
                RefQualifier::LValue
            };
        }
    }
    RefQualifier::None
}

/// Template arguments of an explicit specialization deduced from its
/// parameter types against the primary template's.
fn deduce(primary: &PrimaryTemplate, concrete: &[TypeRef]) -> Option<Vec<TemplateArg>> {
    if primary.params.len() != concrete.len() {
        return None;
    }
    let mut bound: Vec<Option<TypeRef>> = vec![None; primary.param_count];
    for (pattern, actual) in primary.params.iter().zip(concrete) {
        unify(
            &pattern.adjusted_parameter(),
            &actual.adjusted_parameter(),
            &mut bound,
        )?;
    }
    bound
        .into_iter()
        .map(|ty| ty.map(TemplateArg::Type))
        .collect()
}

fn unify(pattern: &TypeRef, actual: &TypeRef, bound: &mut [Option<TypeRef>]) -> Option<()> {
    match (pattern, actual) {
        (TypeRef::TemplateParam(idx), _) => {
            let slot = bound.get_mut(*idx as usize)?;
            match slot {
                Some(existing) => (existing == actual).then_some(()),
                None => {
                    *slot = Some(actual.clone());
                    Some(())
                }
            }
        }
        (TypeRef::Pointer(p), TypeRef::Pointer(a))
        | (TypeRef::LValueReference(p), TypeRef::LValueReference(a))
        | (TypeRef::RValueReference(p), TypeRef::RValueReference(a)) => unify(p, a, bound),
        (TypeRef::Qualified(p, pq), TypeRef::Qualified(a, aq)) if pq == aq => unify(p, a, bound),
        (TypeRef::Array(p, pn), TypeRef::Array(a, an)) if pn == an => unify(p, a, bound),
        (TypeRef::Named(p), TypeRef::Named(a))
            if p.local == a.local && p.components.len() == a.components.len() =>
        {
            for (pc, ac) in p.components.iter().zip(&a.components) {
                if pc.ident != ac.ident {
                    return None;
                }
                match (&pc.template_args, &ac.template_args) {
                    (None, None) => {}
                    (Some(pa), Some(aa)) if pa.len() == aa.len() => {
                        for (parg, aarg) in pa.iter().zip(aa) {
                            match (parg, aarg) {
                                (TemplateArg::Type(pt), TemplateArg::Type(at)) => {
                                    unify(pt, at, bound)?;
                                }
                                (other_p, other_a) => (other_p == other_a).then_some(())?,
                            }
                        }
                    }
                    _ => return None,
                }
            }
            Some(())
        }
        (TypeRef::Function(p), TypeRef::Function(a))
            if p.params.len() == a.params.len() && p.variadic == a.variadic =>
        {
            unify(&p.return_type, &a.return_type, bound)?;
            for (pp, ap) in p.params.iter().zip(&a.params) {
                unify(pp, ap, bound)?;
            }
            Some(())
        }
        _ => (pattern == actual).then_some(()),
    }
}

#[cfg(test)]
mod tests {
    use linkspan_core::BuiltinType;
    use pretty_assertions::assert_eq;

    use super::*;

    fn int() -> TypeRef {
        TypeRef::Builtin(BuiltinType::Int)
    }

    #[test]
    fn operator_spellings() {
        assert_eq!(
            operator_name("operator+"),
            DeclName::Operator(OverloadedOperator::Plus)
        );
        assert_eq!(
            operator_name("operator new []"),
            DeclName::Operator(OverloadedOperator::ArrayNew)
        );
        assert_eq!(
            operator_name("operator\"\" _km"),
            DeclName::LiteralOperator("_km".to_string())
        );
        assert_eq!(
            operator_name("operator@"),
            DeclName::Unresolved("operator@".to_string())
        );
    }

    #[test]
    fn classify_members_and_free_functions() {
        assert_eq!(
            classify(NameDraft::Ident("Foo".into()), Some("Foo")).0,
            DeclKind::Constructor
        );
        assert_eq!(
            classify(NameDraft::Ident("get".into()), Some("Foo")).0,
            DeclKind::Method
        );
        assert_eq!(
            classify(NameDraft::Destructor("Foo".into()), Some("Foo")).0,
            DeclKind::Destructor
        );
        assert_eq!(classify(NameDraft::Ident("f".into()), None).0, DeclKind::Function);
    }

    #[test]
    fn deduces_from_parameter_types() {
        let primary = PrimaryTemplate {
            param_count: 1,
            params: vec![TypeRef::lvalue_ref_to(
                TypeRef::TemplateParam(0).qualified(linkspan_core::CvQualifiers::CONST),
            )],
            return_type: None,
            variadic: false,
        };
        let concrete = vec![TypeRef::lvalue_ref_to(
            int().qualified(linkspan_core::CvQualifiers::CONST),
        )];
        assert_eq!(
            deduce(&primary, &concrete),
            Some(vec![TemplateArg::Type(int())])
        );
    }

    #[test]
    fn conflicting_deduction_fails() {
        let primary = PrimaryTemplate {
            param_count: 1,
            params: vec![TypeRef::TemplateParam(0), TypeRef::TemplateParam(0)],
            return_type: None,
            variadic: false,
        };
        let concrete = vec![int(), TypeRef::Builtin(BuiltinType::Double)];
        assert_eq!(deduce(&primary, &concrete), None);
    }
}
