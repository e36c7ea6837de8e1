//! Kind dispatch from a declaration to its link name.

use linkspan_core::{
    ContextKind, DeclId, DeclKind, DeclName, Declaration, Linkage, TargetInfo, TranslationUnit,
};

use crate::block::block_invoke_name;
use crate::error::MangleError;
use crate::{itanium, objc};

/// Computes link names for the declarations of one translation unit.
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    unit: &'a TranslationUnit,
    target: &'a TargetInfo,
}

impl<'a> NameResolver<'a> {
    #[must_use]
    pub const fn new(unit: &'a TranslationUnit, target: &'a TargetInfo) -> Self {
        Self { unit, target }
    }

    /// Link name of `id`.
    ///
    /// # Errors
    /// Returns `MangleError` when the declaration cannot be named.
    pub fn resolve(&self, id: DeclId) -> Result<String, MangleError> {
        let decl = self.decl(id)?;
        match decl.kind {
            DeclKind::ObjCMethod => {
                let method = decl
                    .objc
                    .as_ref()
                    .ok_or_else(|| MangleError::MissingObjCInfo(decl.name.spelling()))?;
                Ok(objc::method_name(method, self.target.objc_runtime))
            }
            DeclKind::Block => self.block_name(decl),
            DeclKind::Function
            | DeclKind::Method
            | DeclKind::Constructor
            | DeclKind::Destructor
            | DeclKind::Conversion => self.function_name(id, decl),
        }
    }

    /// Link name of `id`, or the empty string when it cannot be computed.
    #[must_use]
    pub fn resolve_or_empty(&self, id: DeclId) -> String {
        match self.resolve(id) {
            Ok(name) => name,
            Err(error) => {
                tracing::debug!(decl = id.0, %error, "link name unresolved, recording empty name");
                String::new()
            }
        }
    }

    /// Whether Itanium mangling applies to a function-like declaration.
    #[must_use]
    pub fn should_mangle(&self, decl: &Declaration) -> bool {
        if decl.attributes.overloadable {
            return true;
        }
        if !decl.name.is_identifier() || decl.kind.is_cxx_member() {
            return true;
        }
        if !self.unit.language().is_cplusplus() {
            return false;
        }
        if self.is_main(decl) {
            return false;
        }
        // Internal linkage defeats extern "C".
        decl.linkage == Linkage::Cxx || decl.is_static()
    }

    fn decl(&self, id: DeclId) -> Result<&'a Declaration, MangleError> {
        self.unit
            .get_decl(id)
            .ok_or_else(|| MangleError::Unsupported(format!("dangling declaration id {}", id.0)))
    }

    fn is_main(&self, decl: &Declaration) -> bool {
        matches!(&decl.name, DeclName::Identifier(name) if name == "main")
            && decl.kind == DeclKind::Function
            && matches!(
                self.unit.context(self.unit.naming_context(decl.context)).kind,
                ContextKind::TranslationUnit
            )
    }

    fn function_name(&self, id: DeclId, decl: &Declaration) -> Result<String, MangleError> {
        if let Some(label) = &decl.attributes.asm_label {
            let marker = if self.target.user_label_prefix().is_empty() {
                ""
            } else {
                "\u{1}"
            };
            return Ok(format!("{marker}{label}"));
        }
        if !self.should_mangle(decl) {
            return match &decl.name {
                DeclName::Identifier(name) => Ok(name.clone()),
                other => Err(MangleError::UnresolvedName(other.spelling())),
            };
        }
        itanium::mangle_declaration(self.unit, id)
    }

    fn block_name(&self, decl: &Declaration) -> Result<String, MangleError> {
        let ordinal = decl.block.map_or(0, |info| info.ordinal);
        let outer = self
            .unit
            .ancestors(decl.context)
            .find_map(|(_, ctx)| match ctx.kind {
                ContextKind::Function(outer) => Some(outer),
                _ => None,
            })
            .ok_or(MangleError::DetachedBlock)?;
        let outer_decl = self.decl(outer)?;
        let prefix = match (&outer_decl.kind, &outer_decl.objc) {
            (DeclKind::ObjCMethod, Some(method)) => objc::method_source_name(method),
            _ => {
                let name = self.function_name(outer, outer_decl)?;
                name.trim_start_matches('\u{1}').to_string()
            }
        };
        Ok(block_invoke_name(&prefix, ordinal))
    }
}

#[cfg(test)]
mod tests {
    use linkspan_core::{
        BuiltinType, ContextId, ObjcRuntime, Platform, Selector, SourceLanguage, StorageClass,
        TypeRef,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{UnitBuilder, builtin};

    fn resolve(builder: &UnitBuilder, id: DeclId) -> String {
        NameResolver::new(&builder.unit, &TargetInfo::default())
            .resolve(id)
            .expect("resolves")
    }

    #[test]
    fn cxx_free_function_is_mangled() {
        let mut b = UnitBuilder::cxx();
        let add = b.function(
            ContextId::ROOT,
            "add",
            vec![builtin(BuiltinType::Int), builtin(BuiltinType::Int)],
        );
        assert_eq!(resolve(&b, add), "_Z3addii");
    }

    #[test]
    fn int64_parameter_follows_target_data_model() {
        let mut b = UnitBuilder::cxx();
        let target = TargetInfo::default();
        let int64 = target.builtin_typedef("int64_t").expect("known typedef");
        let f = b.function(ContextId::ROOT, "f", vec![builtin(int64)]);
        assert_eq!(resolve(&b, f), "_Z1fl");
    }

    #[test]
    fn extern_c_function_keeps_plain_identifier() {
        let mut b = UnitBuilder::cxx();
        let block = b.extern_c(ContextId::ROOT);
        let foo = b.function(block, "foo", vec![builtin(BuiltinType::Int)]);
        assert_eq!(resolve(&b, foo), "foo");
    }

    #[test]
    fn static_function_inside_extern_c_is_still_mangled() {
        let mut b = UnitBuilder::cxx();
        let block = b.extern_c(ContextId::ROOT);
        let helper = b.function(block, "helper", vec![]);
        b.decl_mut(helper).storage = StorageClass::Static;
        assert_eq!(resolve(&b, helper), "_ZL6helperv");
    }

    #[test]
    fn main_is_never_mangled() {
        let mut b = UnitBuilder::cxx();
        let main = b.function(ContextId::ROOT, "main", vec![]);
        assert_eq!(resolve(&b, main), "main");

        let ns = b.namespace(ContextId::ROOT, "app");
        let scoped = b.function(ns, "main", vec![]);
        assert_eq!(resolve(&b, scoped), "_ZN3app4mainEv");
    }

    #[test]
    fn c_functions_are_plain_unless_overloadable() {
        let mut b = UnitBuilder::c();
        let plain = b.function(ContextId::ROOT, "compute", vec![builtin(BuiltinType::Int)]);
        let overloaded = b.function(ContextId::ROOT, "compute", vec![builtin(BuiltinType::Float)]);
        b.decl_mut(overloaded).attributes.overloadable = true;
        assert_eq!(resolve(&b, plain), "compute");
        assert_eq!(resolve(&b, overloaded), "_Z7computef");
    }

    #[test]
    fn asm_label_wins_and_gets_marker_on_darwin() {
        let mut b = UnitBuilder::cxx();
        let f = b.function(ContextId::ROOT, "f", vec![]);
        b.decl_mut(f).attributes.asm_label = Some("real_name".into());

        let linux = TargetInfo::default();
        let darwin = TargetInfo::new(Platform::Darwin, ObjcRuntime::Apple);
        assert_eq!(
            NameResolver::new(&b.unit, &linux).resolve(f).expect("resolves"),
            "real_name"
        );
        assert_eq!(
            NameResolver::new(&b.unit, &darwin).resolve(f).expect("resolves"),
            "\u{1}real_name"
        );
    }

    #[test]
    fn constructor_and_method_names_are_distinct() {
        let mut b = UnitBuilder::cxx();
        let foo = b.class(ContextId::ROOT, "Foo");
        let ctor = b.constructor(foo, "Foo", vec![]);
        let dtor = b.destructor(foo, "Foo");
        let method = b.method(foo, "Foo2", vec![]);

        let names = [resolve(&b, ctor), resolve(&b, dtor), resolve(&b, method)];
        assert_eq!(names, ["_ZN3FooC1Ev", "_ZN3FooD1Ev", "_ZN3Foo4Foo2Ev"]);
        assert!(names[0].contains("C1") && !names[0].contains("C2"));
        assert!(names[1].contains("D1") && !names[1].contains("D0"));
    }

    #[test]
    fn objc_methods_follow_configured_runtime() {
        let mut b = UnitBuilder::objc();
        let foo = b.objc_container("Foo", None);
        let m = b.objc_method(foo, true, Selector::unary("doThing"));

        assert_eq!(resolve(&b, m), "-[Foo doThing]");
        let gnu = TargetInfo::new(Platform::Linux, ObjcRuntime::Gnu);
        assert_eq!(
            NameResolver::new(&b.unit, &gnu).resolve(m).expect("resolves"),
            "_i_Foo__doThing"
        );
    }

    #[test]
    fn objc_method_without_selector_info_is_empty() {
        let mut b = UnitBuilder::objc();
        let foo = b.objc_container("Foo", None);
        let m = b.objc_method(foo, true, Selector::unary("doThing"));
        b.decl_mut(m).objc = None;
        let target = TargetInfo::default();
        assert_eq!(NameResolver::new(&b.unit, &target).resolve_or_empty(m), "");
    }

    #[test]
    fn blocks_in_c_function() {
        let mut b = UnitBuilder::new(SourceLanguage::C);
        let run = b.function(ContextId::ROOT, "run", vec![]);
        let body = b.function_scope(run);
        let first = b.block(body, 0);
        let second = b.block(body, 1);
        assert_eq!(resolve(&b, first), "__run_block_invoke");
        assert_eq!(resolve(&b, second), "__run_block_invoke_2");
    }

    #[test]
    fn nested_block_uses_outermost_function() {
        let mut b = UnitBuilder::c();
        let run = b.function(ContextId::ROOT, "run", vec![]);
        let body = b.function_scope(run);
        let outer = b.block(body, 0);
        let inner_scope = b.block_scope(outer);
        let inner = b.block(inner_scope, 1);
        assert_eq!(resolve(&b, inner), "__run_block_invoke_2");
    }

    #[test]
    fn block_in_cxx_function_uses_mangled_outer_name() {
        let mut b = UnitBuilder::cxx();
        let foo = b.function(ContextId::ROOT, "foo", vec![]);
        let body = b.function_scope(foo);
        let blk = b.block(body, 0);
        assert_eq!(resolve(&b, blk), "___Z3foov_block_invoke");
    }

    #[test]
    fn block_in_objc_method_uses_source_name() {
        let mut b = UnitBuilder::objc();
        let foo = b.objc_container("Foo", None);
        let bar = b.objc_method(foo, true, Selector::unary("bar"));
        let body = b.function_scope(bar);
        let blk = b.block(body, 0);
        assert_eq!(resolve(&b, blk), "__10-[Foo bar]_block_invoke");
    }

    #[test]
    fn global_block_resolves_to_empty() {
        let mut b = UnitBuilder::c();
        let blk = b.block(ContextId::ROOT, 0);
        let target = TargetInfo::default();
        let resolver = NameResolver::new(&b.unit, &target);
        assert!(matches!(resolver.resolve(blk), Err(MangleError::DetachedBlock)));
        assert_eq!(resolver.resolve_or_empty(blk), "");
    }

    #[test]
    fn unsupported_parameter_type_resolves_to_empty() {
        let mut b = UnitBuilder::cxx();
        let f = b.function(ContextId::ROOT, "f", vec![TypeRef::Unresolved("auto".into())]);
        let target = TargetInfo::default();
        assert_eq!(NameResolver::new(&b.unit, &target).resolve_or_empty(f), "");
    }
}
