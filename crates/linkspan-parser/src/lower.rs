//! Lowering of ast-grep trees into the owned declaration model.
//!
//! The walk mirrors a compiler's top-down visitation: declarations are added
//! to the unit in source order, headers are expanded at their `#include`, and
//! a function is added before the local classes and blocks in its body.

mod function;
mod objc;
mod types;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use ast_grep_core::{Doc, Node};
use ast_grep_language::SupportLang;
use linkspan_core::{
    BuiltinType, ContextId, ContextKind, FileId, Linkage, RecordTag, SourceLanguage,
    SourceLocation, SourceRange, TargetInfo, TemplateArg, TranslationUnit, TypeRef,
};

use crate::options::CompileOptions;
use crate::parser::{Grammar, parse_objc, parse_source};

/// Nesting limit for `#include` expansion.
const MAX_INCLUDE_DEPTH: usize = 200;

/// Per-file position bookkeeping.
pub(crate) struct FileCx {
    id: FileId,
    line_starts: Vec<usize>,
    dir: Option<PathBuf>,
}

impl FileCx {
    fn new(id: FileId, source: &str, path: &Path) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            id,
            line_starts,
            dir: path.parent().map(Path::to_path_buf),
        }
    }

    fn column(&self, line: usize, offset: usize) -> u32 {
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        (offset.saturating_sub(start) + 1) as u32
    }

    fn location<D: Doc>(&self, node: &Node<D>) -> SourceLocation {
        let line = node.start_pos().line();
        SourceLocation {
            file: self.id,
            line: line as u32 + 1,
            column: self.column(line, node.range().start),
        }
    }

    fn extent<D: Doc>(&self, node: &Node<D>) -> SourceRange {
        let end_line = node.end_pos().line();
        SourceRange {
            begin: self.location(node),
            end: SourceLocation {
                file: self.id,
                line: end_line as u32 + 1,
                column: self.column(end_line, node.range().end.saturating_sub(1)),
            },
        }
    }
}

/// Template parameters introduced by the `template<...>` directly
/// enclosing a declaration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TemplateHeader {
    params: usize,
}

impl TemplateHeader {
    /// `template<>`
    const fn is_specialization(self) -> bool {
        self.params == 0
    }

    fn own_args(self) -> Vec<TemplateArg> {
        (0..self.params)
            .map(|idx| TemplateArg::Type(TypeRef::TemplateParam(idx as u32)))
            .collect()
    }
}

/// Counters scoped to the body of one function-like declaration.
#[derive(Debug, Default)]
struct FunctionState {
    blocks: u32,
    records: HashMap<String, u32>,
    /// Lambdas seen so far, by parameter list and variadic flag.
    lambdas: HashMap<(Vec<TypeRef>, bool), u32>,
}

/// A primary function template, kept so explicit specializations can be
/// expressed in terms of its parameters.
#[derive(Debug, Clone)]
struct PrimaryTemplate {
    param_count: usize,
    params: Vec<TypeRef>,
    return_type: Option<TypeRef>,
    variadic: bool,
}

type ScopedName = (ContextId, String);

pub(crate) struct Lowerer<'t> {
    unit: TranslationUnit,
    target: &'t TargetInfo,
    grammar: Grammar,
    includes: Option<&'t CompileOptions>,
    visited_headers: HashSet<PathBuf>,
    include_depth: usize,
    /// Directory of the file being lowered, for quoted includes.
    current_dir: Option<PathBuf>,
    /// Named namespaces and records by (parent, name).
    scopes: HashMap<ScopedName, ContextId>,
    typedefs: HashMap<ScopedName, TypeRef>,
    template_params: Vec<Vec<String>>,
    c_linkage: HashSet<ScopedName>,
    asm_labels: HashMap<ScopedName, String>,
    overloadable: HashSet<ScopedName>,
    static_members: HashSet<ScopedName>,
    primaries: HashMap<ScopedName, PrimaryTemplate>,
    functions: Vec<FunctionState>,
}

impl<'t> Lowerer<'t> {
    pub(crate) fn new(
        main_file: &str,
        language: SourceLanguage,
        target: &'t TargetInfo,
        includes: Option<&'t CompileOptions>,
    ) -> Self {
        Self {
            unit: TranslationUnit::new(main_file, language),
            target,
            grammar: Grammar::for_language(language),
            includes,
            visited_headers: HashSet::new(),
            include_depth: 0,
            current_dir: None,
            scopes: HashMap::new(),
            typedefs: HashMap::new(),
            template_params: Vec::new(),
            c_linkage: HashSet::new(),
            asm_labels: HashMap::new(),
            overloadable: HashSet::new(),
            static_members: HashSet::new(),
            primaries: HashMap::new(),
            functions: Vec::new(),
        }
    }

    /// Lower the main file's source and return the finished unit.
    pub(crate) fn lower_main(mut self, source: &str) -> TranslationUnit {
        let main_file = self.unit.main_file().to_string();
        let main_id = self.unit.main_file_id();
        let main_path = PathBuf::from(&main_file);
        if let Ok(canonical) = std::fs::canonicalize(&main_path) {
            self.visited_headers.insert(canonical);
        }
        let file = FileCx::new(main_id, source, &main_path);
        self.current_dir.clone_from(&file.dir);
        self.lower_file(source, &file, ContextId::ROOT);
        self.unit
    }

    fn lower_file(&mut self, source: &str, file: &FileCx, ctx: ContextId) {
        match self.grammar {
            Grammar::C => self.lower_root(&parse_source(source, SupportLang::C).root(), file, ctx),
            Grammar::Cpp => {
                self.lower_root(&parse_source(source, SupportLang::Cpp).root(), file, ctx);
            }
            Grammar::Objc => self.lower_root(&parse_objc(source).root(), file, ctx),
        }
    }

    fn lower_root<D: Doc>(&mut self, root: &Node<D>, file: &FileCx, ctx: ContextId) {
        let errors = count_errors(root);
        if errors > 0 {
            // Only the main file's errors count against the unit.
            let main = file.id == self.unit.main_file_id();
            if main {
                for _ in 0..errors {
                    self.unit.record_syntax_error();
                }
            }
            tracing::debug!(
                file = self.unit.file_path(file.id),
                errors,
                main,
                "syntax errors in source"
            );
        }
        self.lower_items(root, ctx, file);
    }

    // ── Declaration-level dispatch ────────────────────────────────────

    fn lower_items<D: Doc>(&mut self, parent: &Node<D>, ctx: ContextId, file: &FileCx) {
        for child in parent.children() {
            self.lower_item(&child, ctx, file, None);
        }
    }

    fn lower_item<D: Doc>(
        &mut self,
        node: &Node<D>,
        ctx: ContextId,
        file: &FileCx,
        template: Option<TemplateHeader>,
    ) {
        let kind = node.kind();
        match kind.as_ref() {
            "function_definition" => {
                self.lower_function(node, ctx, file, template);
            }
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.lower_record(node, ctx, file, template, None);
            }
            "declaration" | "field_declaration" => self.lower_declaration(node, ctx, file, template),
            "friend_declaration" => self.lower_friend(node, ctx, file),
            "namespace_definition" => self.lower_namespace(node, ctx, file),
            "linkage_specification" => self.lower_linkage(node, ctx, file),
            "template_declaration" => self.lower_template(node, ctx, file),
            "type_definition" => self.lower_typedef(node, ctx, file),
            "alias_declaration" if template.is_none() => self.lower_alias(node, ctx),
            "preproc_include" => self.lower_include(node, ctx),
            "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif"
            | "preproc_elifdef" | "declaration_list" | "ERROR" => {
                self.lower_items(node, ctx, file);
            }
            "method_definition" => self.lower_objc_method(node, ctx, file),
            other if other.contains("implementation") => {
                self.lower_objc_container(node, ctx, file);
            }
            _ => {}
        }
    }

    fn lower_namespace<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId, file: &FileCx) {
        let inline = node.children().any(|c| c.kind().as_ref() == "inline");
        let mut current = ctx;
        match node.field("name") {
            None => {
                current = self.unit.context_for(
                    current,
                    ContextKind::Namespace {
                        name: None,
                        inline: false,
                    },
                );
            }
            Some(name) => {
                let text = name.text();
                let segments: Vec<&str> = text.split("::").map(str::trim).collect();
                let last = segments.len().saturating_sub(1);
                for (idx, segment) in segments.iter().enumerate() {
                    let (segment, nested_inline) = match segment.strip_prefix("inline ") {
                        Some(rest) => (rest.trim(), true),
                        None => (*segment, false),
                    };
                    let next = self.unit.context_for(
                        current,
                        ContextKind::Namespace {
                            name: Some(segment.to_string()),
                            inline: nested_inline || (inline && idx == last),
                        },
                    );
                    self.scopes.insert((current, segment.to_string()), next);
                    current = next;
                }
            }
        }
        if let Some(body) = node.field("body") {
            self.lower_items(&body, current, file);
        }
    }

    fn lower_linkage<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId, file: &FileCx) {
        let linkage = match node.field("value").map(|v| v.text().to_string()) {
            Some(value) if value.trim_matches('"') == "C" => Linkage::C,
            _ => Linkage::Cxx,
        };
        let spec = self.unit.context_for(ctx, ContextKind::LinkageSpec(linkage));
        for child in node.children() {
            match child.kind().as_ref() {
                "string_literal" | "extern" => {}
                _ => self.lower_item(&child, spec, file, None),
            }
        }
    }

    fn lower_template<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId, file: &FileCx) {
        let params = node
            .field("parameters")
            .map(|list| template_param_names(&list))
            .unwrap_or_default();
        let header = TemplateHeader {
            params: params.len(),
        };
        self.template_params.push(params);
        for child in node.children() {
            if child.kind().as_ref() == "template_parameter_list" {
                continue;
            }
            self.lower_item(&child, ctx, file, Some(header));
        }
        self.template_params.pop();
    }

    fn lower_friend<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId, file: &FileCx) {
        let enclosing = self
            .unit
            .ancestors(ctx)
            .find(|(_, c)| !c.is_record())
            .map_or(ContextId::ROOT, |(id, _)| id);
        for child in node.children() {
            if child.kind().as_ref() == "function_definition" {
                self.lower_function(&child, enclosing, file, None);
            }
        }
    }

    // ── Records ───────────────────────────────────────────────────────

    /// Lower a class definition and its members. Returns `None` for
    /// forward declarations and elaborated type uses.
    fn lower_record<D: Doc>(
        &mut self,
        node: &Node<D>,
        ctx: ContextId,
        file: &FileCx,
        template: Option<TemplateHeader>,
        typedef_name: Option<&str>,
    ) -> Option<ContextId> {
        let body = node.field("body")?;
        let tag = match node.kind().as_ref() {
            "struct_specifier" => RecordTag::Struct,
            "union_specifier" => RecordTag::Union,
            _ => RecordTag::Class,
        };

        let mut parent = ctx;
        let mut explicit_args = None;
        let name = match node.field("name") {
            Some(name_node) => match name_node.kind().as_ref() {
                "template_type" => {
                    explicit_args = name_node
                        .field("arguments")
                        .map(|args| self.lower_template_args(&args, ctx));
                    name_node
                        .field("name")
                        .map_or_else(String::new, |n| n.text().to_string())
                }
                "qualified_identifier" => {
                    let (global, mut segments) = self.name_segments(&name_node, ctx);
                    let leaf = segments.pop();
                    parent = self.resolve_scope(ctx, global, &segments);
                    match leaf {
                        Some(leaf) => {
                            explicit_args = leaf.args;
                            leaf.name
                        }
                        None => String::new(),
                    }
                }
                _ => name_node.text().to_string(),
            },
            None => typedef_name.unwrap_or_default().to_string(),
        };

        let template_args = explicit_args.or_else(|| {
            template
                .filter(|header| !header.is_specialization())
                .map(TemplateHeader::own_args)
        });

        let discriminator = if self.unit.enclosing_function(parent).is_some() {
            self.functions.last_mut().map_or(0, |state| {
                let seen = state.records.entry(name.clone()).or_insert(0);
                let ordinal = *seen;
                *seen += 1;
                ordinal
            })
        } else {
            0
        };

        let record = self.unit.context_for(
            parent,
            ContextKind::Record {
                name: name.clone(),
                tag,
                template_args,
                discriminator,
            },
        );
        if !name.is_empty() {
            self.scopes.entry((parent, name)).or_insert(record);
        }
        self.lower_items(&body, record, file);
        Some(record)
    }

    // ── Declarations without bodies ───────────────────────────────────

    fn lower_declaration<D: Doc>(
        &mut self,
        node: &Node<D>,
        ctx: ContextId,
        file: &FileCx,
        template: Option<TemplateHeader>,
    ) {
        if let Some(ty) = node.field("type")
            && matches!(
                ty.kind().as_ref(),
                "class_specifier" | "struct_specifier" | "union_specifier"
            )
        {
            self.lower_record(&ty, ctx, file, template, None);
        }
        for child in node.children() {
            if !child.kind().ends_with("_specifier") {
                self.lower_initializer_lambdas(&child, ctx, file);
            }
        }

        let Some(declarator) = node.field("declarator") else {
            return;
        };
        let Some(func) = function::find_function_declarator(&declarator) else {
            return;
        };
        let Some(name) = func
            .field("declarator")
            .filter(|n| matches!(n.kind().as_ref(), "identifier" | "field_identifier"))
            .map(|n| n.text().to_string())
        else {
            return;
        };

        let naming = self.unit.naming_context(ctx);
        if self.lexical_linkage(ctx) == Some(Linkage::C) {
            self.c_linkage.insert((naming, name.clone()));
        }
        let text = node.text();
        if let Some(label) = asm_label(&text) {
            self.asm_labels.insert((naming, name.clone()), label);
        }
        if text.contains("overloadable") {
            self.overloadable.insert((naming, name.clone()));
        }
        if self.unit.context(ctx).is_record() && has_storage(node, "static") {
            self.static_members.insert((ctx, name));
        }
    }

    fn lower_typedef<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId, file: &FileCx) {
        let Some(ty) = node.field("type") else {
            return;
        };
        let declarator = node.field("declarator");
        let alias = declarator.as_ref().and_then(types::declarator_name);

        let base = if matches!(
            ty.kind().as_ref(),
            "class_specifier" | "struct_specifier" | "union_specifier"
        ) && ty.field("body").is_some()
        {
            let anonymous = ty.field("name").is_none();
            let record = self.lower_record(&ty, ctx, file, None, alias.as_deref());
            match record {
                Some(record) if anonymous => {
                    TypeRef::Named(self.qualified_name_of(record))
                }
                _ => self.lower_type_node(&ty, ctx),
            }
        } else {
            self.lower_type_node(&ty, ctx)
        };
        let base = base.qualified(types::qualifiers_of(node));

        if let (Some(declarator), Some(alias)) = (declarator, alias) {
            let ty = self.apply_declarator(base, &declarator, ctx);
            let naming = self.unit.naming_context(ctx);
            self.typedefs.insert((naming, alias), ty);
        }
    }

    fn lower_alias<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId) {
        let (Some(name), Some(ty)) = (node.field("name"), node.field("type")) else {
            return;
        };
        let aliased = self.lower_type_descriptor(&ty, ctx);
        let naming = self.unit.naming_context(ctx);
        self.typedefs.insert((naming, name.text().to_string()), aliased);
    }

    // ── Includes ──────────────────────────────────────────────────────

    fn lower_include<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId) {
        let Some(options) = self.includes else {
            return;
        };
        let Some(path) = node.field("path") else {
            return;
        };
        let text = path.text();
        let angled = text.starts_with('<');
        let spec = text.trim_matches(|c| c == '<' || c == '>' || c == '"');

        let current_dir = self.current_dir.clone();
        let Some(resolved) = resolve_include(spec, angled, current_dir.as_deref(), options) else {
            tracing::debug!(include = spec, "include not found on search path");
            return;
        };
        let key = std::fs::canonicalize(&resolved).unwrap_or_else(|_| resolved.clone());
        if !self.visited_headers.insert(key) || self.include_depth >= MAX_INCLUDE_DEPTH {
            return;
        }

        let source = match std::fs::read_to_string(&resolved) {
            Ok(source) => source,
            Err(error) => {
                tracing::debug!(path = %resolved.display(), %error, "failed to read header");
                return;
            }
        };
        let id = self.unit.add_file(resolved.display().to_string());
        let header = FileCx::new(id, &source, &resolved);

        self.include_depth += 1;
        let saved_dir = std::mem::replace(&mut self.current_dir, header.dir.clone());
        self.lower_file(&source, &header, ctx);
        self.current_dir = saved_dir;
        self.include_depth -= 1;
    }

    // ── Function bodies ───────────────────────────────────────────────

    /// Walk a function or block body for local classes, typedefs and blocks.
    fn lower_locals<D: Doc>(&mut self, node: &Node<D>, scope: ContextId, file: &FileCx) {
        for child in node.children() {
            match child.kind().as_ref() {
                "class_specifier" | "struct_specifier" | "union_specifier"
                    if child.field("body").is_some() =>
                {
                    self.lower_record(&child, scope, file, None, None);
                }
                "type_definition" => self.lower_typedef(&child, scope, file),
                "alias_declaration" => self.lower_alias(&child, scope),
                "block_literal" | "block_expression" => self.lower_block(&child, scope, file),
                "lambda_expression" => self.lower_lambda(&child, scope, file),
                _ => self.lower_locals(&child, scope, file),
            }
        }
    }

    /// Lambdas in the initializers of a namespace- or class-scope declaration.
    fn lower_initializer_lambdas<D: Doc>(&mut self, node: &Node<D>, ctx: ContextId, file: &FileCx) {
        for child in node.children() {
            if child.kind().as_ref() == "lambda_expression" {
                self.lower_lambda(&child, ctx, file);
            } else {
                self.lower_initializer_lambdas(&child, ctx, file);
            }
        }
    }

    // ── Lookup helpers ────────────────────────────────────────────────

    /// Innermost `extern "..."` around `ctx`.
    fn lexical_linkage(&self, ctx: ContextId) -> Option<Linkage> {
        self.unit.ancestors(ctx).find_map(|(_, c)| match c.kind {
            ContextKind::LinkageSpec(linkage) => Some(linkage),
            _ => None,
        })
    }

    fn template_param(&self, name: &str) -> Option<u32> {
        self.template_params.iter().rev().find_map(|level| {
            level
                .iter()
                .position(|param| param == name)
                .map(|idx| idx as u32)
        })
    }

    fn lookup_scope(&self, ctx: ContextId, name: &str) -> Option<ContextId> {
        self.unit
            .ancestors(ctx)
            .find_map(|(id, _)| self.scopes.get(&(id, name.to_string())).copied())
    }

    fn lookup_typedef(&self, ctx: ContextId, name: &str) -> Option<&TypeRef> {
        self.unit
            .ancestors(ctx)
            .find_map(|(id, _)| self.typedefs.get(&(id, name.to_string())))
    }
}

/// Builtin spelled by a single-keyword `primitive_type`.
fn primitive_builtin(spelling: &str, target: &TargetInfo) -> Option<BuiltinType> {
    let builtin = match spelling {
        "void" => BuiltinType::Void,
        "bool" | "_Bool" => BuiltinType::Bool,
        "char" => BuiltinType::Char,
        "wchar_t" => BuiltinType::WChar,
        "char8_t" => BuiltinType::Char8,
        "char16_t" => BuiltinType::Char16,
        "char32_t" => BuiltinType::Char32,
        "short" => BuiltinType::Short,
        "int" | "signed" => BuiltinType::Int,
        "unsigned" => BuiltinType::UnsignedInt,
        "long" => BuiltinType::Long,
        "float" => BuiltinType::Float,
        "double" => BuiltinType::Double,
        "__int128" => BuiltinType::Int128,
        "__float128" => BuiltinType::Float128,
        "nullptr_t" => BuiltinType::NullPtr,
        other => return target.builtin_typedef(other),
    };
    Some(builtin)
}

fn count_errors<D: Doc>(node: &Node<D>) -> usize {
    let own = usize::from(node.kind().as_ref() == "ERROR");
    own + node.children().map(|child| count_errors(&child)).sum::<usize>()
}

fn template_param_names<D: Doc>(list: &Node<D>) -> Vec<String> {
    let mut names = Vec::new();
    for param in list.children() {
        let kind = param.kind();
        let name = match kind.as_ref() {
            "type_parameter_declaration"
            | "variadic_type_parameter_declaration"
            | "template_template_parameter_declaration" => param
                .children()
                .filter(|c| c.kind().as_ref() == "type_identifier")
                .last()
                .map(|n| n.text().to_string()),
            "optional_type_parameter_declaration" => {
                param.field("name").map(|n| n.text().to_string())
            }
            "parameter_declaration"
            | "optional_parameter_declaration"
            | "variadic_parameter_declaration" => param
                .field("declarator")
                .as_ref()
                .and_then(types::declarator_name),
            _ => continue,
        };
        names.push(name.unwrap_or_default());
    }
    names
}

/// Source text of a definition up to (not including) its body.
fn header_text<D: Doc>(node: &Node<D>, body: Option<&Node<D>>) -> String {
    let text = node.text();
    let Some(body) = body else {
        return text.to_string();
    };
    let len = body.range().start.saturating_sub(node.range().start);
    text.get(..len).unwrap_or(text.as_ref()).to_string()
}

fn has_storage<D: Doc>(node: &Node<D>, keyword: &str) -> bool {
    node.children().any(|c| {
        c.kind().as_ref() == "storage_class_specifier" && c.text().as_ref() == keyword
    })
}

/// Label of an `asm("...")` / `__asm__("...")` suffix.
fn asm_label(text: &str) -> Option<String> {
    let start = ["__asm__", "__asm", "asm"]
        .iter()
        .find_map(|keyword| text.find(keyword).map(|idx| idx + keyword.len()))?;
    let rest = &text[start..];
    let open = rest.find('"')? + 1;
    let close = rest[open..].find('"')? + open;
    Some(rest[open..close].to_string())
}

fn resolve_include(
    spec: &str,
    angled: bool,
    current_dir: Option<&Path>,
    options: &CompileOptions,
) -> Option<PathBuf> {
    let spec_path = Path::new(spec);
    if spec_path.is_absolute() {
        return spec_path.is_file().then(|| spec_path.to_path_buf());
    }
    let quoted_dirs = current_dir
        .into_iter()
        .map(Path::to_path_buf)
        .chain(options.quote_dirs.iter().cloned());
    let common_dirs = options
        .include_dirs
        .iter()
        .chain(options.system_dirs.iter())
        .cloned();

    let candidates: Vec<PathBuf> = if angled {
        common_dirs.collect()
    } else {
        quoted_dirs.chain(common_dirs).collect()
    };
    candidates
        .into_iter()
        .map(|dir| dir.join(spec))
        .find(|candidate| candidate.is_file())
}
