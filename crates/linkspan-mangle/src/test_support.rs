//! Hand-built translation units for resolver tests.

use linkspan_core::{
    BlockInfo, BuiltinType, ContextId, ContextKind, CvQualifiers, DeclId, DeclKind, DeclName,
    Declaration, FileId, Linkage, ObjCMethod, OverloadedOperator, RecordTag, Selector,
    SourceLanguage, SourceLocation, SourceRange, TranslationUnit, TypeRef,
};

pub(crate) fn builtin(ty: BuiltinType) -> TypeRef {
    TypeRef::Builtin(ty)
}

pub(crate) struct UnitBuilder {
    pub unit: TranslationUnit,
    next_line: u32,
}

impl UnitBuilder {
    pub fn new(language: SourceLanguage) -> Self {
        Self {
            unit: TranslationUnit::new("/src/test.cpp", language),
            next_line: 1,
        }
    }

    pub fn cxx() -> Self {
        Self::new(SourceLanguage::Cxx)
    }

    pub fn c() -> Self {
        Self::new(SourceLanguage::C)
    }

    pub fn objc() -> Self {
        Self::new(SourceLanguage::ObjC)
    }

    fn next_extent(&mut self) -> SourceRange {
        let line = self.next_line;
        self.next_line += 3;
        let at = |line| SourceLocation {
            file: FileId(0),
            line,
            column: 1,
        };
        SourceRange {
            begin: at(line),
            end: at(line + 2),
        }
    }

    pub fn namespace(&mut self, parent: ContextId, name: &str) -> ContextId {
        self.unit.context_for(
            parent,
            ContextKind::Namespace {
                name: Some(name.to_string()),
                inline: false,
            },
        )
    }

    pub fn anonymous_namespace(&mut self, parent: ContextId) -> ContextId {
        self.unit.context_for(
            parent,
            ContextKind::Namespace {
                name: None,
                inline: false,
            },
        )
    }

    pub fn class(&mut self, parent: ContextId, name: &str) -> ContextId {
        self.unit.context_for(
            parent,
            ContextKind::Record {
                name: name.to_string(),
                tag: RecordTag::Class,
                template_args: None,
                discriminator: 0,
            },
        )
    }

    pub fn extern_c(&mut self, parent: ContextId) -> ContextId {
        self.unit
            .context_for(parent, ContextKind::LinkageSpec(Linkage::C))
    }

    pub fn objc_container(&mut self, class: &str, category: Option<&str>) -> ContextId {
        self.unit.context_for(
            ContextId::ROOT,
            ContextKind::ObjCContainer {
                class: class.to_string(),
                category: category.map(str::to_string),
            },
        )
    }

    /// Body scope of a function-like declaration.
    pub fn function_scope(&mut self, decl: DeclId) -> ContextId {
        let parent = self.unit.decl(decl).context;
        self.unit.context_for(parent, ContextKind::Function(decl))
    }

    pub fn block_scope(&mut self, block: DeclId) -> ContextId {
        let parent = self.unit.decl(block).context;
        self.unit.context_for(parent, ContextKind::Block(block))
    }

    pub fn function(&mut self, ctx: ContextId, name: &str, params: Vec<TypeRef>) -> DeclId {
        let extent = self.next_extent();
        let mut decl = Declaration::function(name, ctx, extent);
        decl.signature.params = params;
        decl.signature.return_type = Some(builtin(BuiltinType::Void));
        if self.unit.ancestors(ctx).any(|(_, c)| c.kind == ContextKind::LinkageSpec(Linkage::C)) {
            decl.linkage = Linkage::C;
        }
        self.unit.add_decl(decl)
    }

    pub fn method(&mut self, class: ContextId, name: &str, params: Vec<TypeRef>) -> DeclId {
        let id = self.function(class, name, params);
        self.decl_mut(id).kind = DeclKind::Method;
        id
    }

    pub fn constructor(&mut self, class: ContextId, name: &str, params: Vec<TypeRef>) -> DeclId {
        let id = self.function(class, name, params);
        let decl = self.decl_mut(id);
        decl.kind = DeclKind::Constructor;
        decl.name = DeclName::Constructor(name.to_string());
        decl.signature.return_type = None;
        id
    }

    pub fn destructor(&mut self, class: ContextId, name: &str) -> DeclId {
        let id = self.function(class, name, vec![]);
        let decl = self.decl_mut(id);
        decl.kind = DeclKind::Destructor;
        decl.name = DeclName::Destructor(name.to_string());
        decl.signature.return_type = None;
        id
    }

    pub fn objc_method(
        &mut self,
        container: ContextId,
        instance: bool,
        selector: Selector,
    ) -> DeclId {
        let (class, category) = match &self.unit.context(container).kind {
            ContextKind::ObjCContainer { class, category } => (class.clone(), category.clone()),
            other => panic!("not an Objective-C container: {other:?}"),
        };
        let id = self.function(container, &selector.as_string(), vec![]);
        let decl = self.decl_mut(id);
        decl.kind = DeclKind::ObjCMethod;
        decl.linkage = Linkage::C;
        decl.signature.return_type = None;
        decl.objc = Some(ObjCMethod {
            instance,
            selector,
            class,
            category,
        });
        id
    }

    /// A block literal written directly in the body of `scope`.
    pub fn block(&mut self, scope: ContextId, ordinal: u32) -> DeclId {
        let id = self.function(scope, "", vec![]);
        let decl = self.decl_mut(id);
        decl.kind = DeclKind::Block;
        decl.name = DeclName::Identifier(String::new());
        decl.block = Some(BlockInfo { ordinal });
        id
    }

    /// Call operator of a non-`mutable` lambda written in `scope`.
    pub fn lambda(&mut self, scope: ContextId, params: Vec<TypeRef>, number: u32) -> DeclId {
        let closure = self.unit.context_for(
            scope,
            ContextKind::Closure {
                params: params.clone(),
                variadic: false,
                number,
            },
        );
        let id = self.method(closure, "operator()", params);
        let decl = self.decl_mut(id);
        decl.name = DeclName::Operator(OverloadedOperator::Call);
        decl.signature.method_quals = CvQualifiers::CONST;
        decl.signature.return_type = None;
        id
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Declaration {
        self.unit.decl_mut(id).expect("declaration exists")
    }
}
