//! Objective-C `@implementation` blocks and method definitions.
//!
//! Method and implementation headers are read from their source text, so
//! the lowering does not depend on how the grammar splits selectors.

use ast_grep_core::{Doc, Node};
use linkspan_core::{
    ContextId, ContextKind, DeclAttributes, DeclKind, DeclName, Declaration, Linkage, ObjCMethod,
    Selector, Signature, StorageClass,
};

use super::{FileCx, Lowerer, header_text};

impl Lowerer<'_> {
    pub(super) fn lower_objc_container<D: Doc>(
        &mut self,
        node: &Node<D>,
        ctx: ContextId,
        file: &FileCx,
    ) {
        let Some((class, category)) = parse_implementation_header(&node.text()) else {
            tracing::debug!("@implementation without a class name");
            return;
        };
        let container = self
            .unit
            .context_for(ctx, ContextKind::ObjCContainer { class, category });
        self.lower_objc_members(node, ctx, container, file);
    }

    fn lower_objc_members<D: Doc>(
        &mut self,
        node: &Node<D>,
        outer: ContextId,
        container: ContextId,
        file: &FileCx,
    ) {
        for child in node.children() {
            match child.kind().as_ref() {
                "method_definition" => self.lower_objc_method(&child, container, file),
                "function_definition" => {
                    self.lower_function(&child, outer, file, None);
                }
                _ if child.is_named() => self.lower_objc_members(&child, outer, container, file),
                _ => {}
            }
        }
    }

    pub(super) fn lower_objc_method<D: Doc>(
        &mut self,
        node: &Node<D>,
        container: ContextId,
        file: &FileCx,
    ) {
        let ContextKind::ObjCContainer { class, category } =
            self.unit.context(container).kind.clone()
        else {
            return;
        };
        let body = node
            .children()
            .find(|child| child.kind().as_ref() == "compound_statement");
        let header = header_text(node, body.as_ref());
        let parsed = parse_method_header(&header);
        if parsed.is_none() {
            tracing::debug!(header = header.trim(), "unparsed method header");
        }

        let decl = Declaration {
            kind: DeclKind::ObjCMethod,
            name: DeclName::Identifier(
                parsed
                    .as_ref()
                    .map_or_else(|| header.trim().to_string(), |(_, sel)| sel.as_string()),
            ),
            context: container,
            location: file.location(node),
            extent: file.extent(node),
            has_body: body.is_some() || header.contains('{'),
            signature: Signature::default(),
            template: None,
            storage: StorageClass::None,
            linkage: Linkage::C,
            attributes: DeclAttributes::default(),
            objc: parsed.map(|(instance, selector)| ObjCMethod {
                instance,
                selector,
                class,
                category,
            }),
            block: None,
        };
        let id = self.unit.add_decl(decl);
        if let Some(body) = body {
            self.lower_body(id, container, &body, file);
        }
    }
}

/// Class and optional category of `@implementation Class (Category)`.
fn parse_implementation_header(text: &str) -> Option<(String, Option<String>)> {
    let start = text.find("@implementation")? + "@implementation".len();
    let rest = text[start..].trim_start();
    let (class, rest) = take_identifier(rest);
    if class.is_empty() {
        return None;
    }
    let rest = rest.trim_start();
    let category = rest
        .strip_prefix('(')
        .and_then(|inner| inner.split_once(')'))
        .map(|(name, _)| name.trim().to_string())
        .filter(|name| !name.is_empty());
    Some((class.to_string(), category))
}

/// Whether a method is an instance method, and its selector.
fn parse_method_header(text: &str) -> Option<(bool, Selector)> {
    let text = text.trim_start();
    let instance = match text.chars().next()? {
        '-' => true,
        '+' => false,
        _ => return None,
    };
    let mut rest = skip_parenthesized(text[1..].trim_start());

    let mut slots = Vec::new();
    let mut keyword = false;
    loop {
        let (ident, after) = take_identifier(rest.trim_start());
        let after = after.trim_start();
        if let Some(after_colon) = after.strip_prefix(':') {
            keyword = true;
            slots.push(ident.to_string());
            let after_type = skip_parenthesized(after_colon.trim_start());
            let (_, after_param) = take_identifier(after_type.trim_start());
            rest = after_param;
            continue;
        }
        if !keyword {
            if ident.is_empty() {
                return None;
            }
            slots.push(ident.to_string());
        }
        break;
    }

    let num_args = if keyword { slots.len() } else { 0 };
    Some((instance, Selector { slots, num_args }))
}

fn take_identifier(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(text.len());
    text.split_at(end)
}

/// Skip one balanced `( ... )` group at the start of `text`, if any.
fn skip_parenthesized(text: &str) -> &str {
    if !text.starts_with('(') {
        return text;
    }
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &text[idx + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("- (void)doThing {", true, &["doThing"], 0)]
    #[case("+ (instancetype)shared", false, &["shared"], 0)]
    #[case("- (void)setName:(NSString *)name age:(int)age {", true, &["setName", "age"], 2)]
    #[case("-(id)initWithBlock:(void (^)(int))block", true, &["initWithBlock"], 1)]
    #[case("- (void)draw:(int)x :(int)y", true, &["draw", ""], 2)]
    #[case("- (void)log:(NSString *)fmt, ... {", true, &["log"], 1)]
    fn method_headers(
        #[case] header: &str,
        #[case] instance: bool,
        #[case] slots: &[&str],
        #[case] num_args: usize,
    ) {
        let (parsed_instance, selector) = parse_method_header(header).expect("parses");
        assert_eq!(parsed_instance, instance);
        assert_eq!(selector.slots, slots.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        assert_eq!(selector.num_args, num_args);
    }

    #[test]
    fn rejects_non_method_text() {
        assert_eq!(parse_method_header("void f(void)"), None);
        assert_eq!(parse_method_header("- (void)"), None);
    }

    #[test]
    fn implementation_headers() {
        assert_eq!(
            parse_implementation_header("@implementation Foo\n- (void)bar {}\n@end"),
            Some(("Foo".to_string(), None))
        );
        assert_eq!(
            parse_implementation_header("@implementation Foo (Extras)\n@end"),
            Some(("Foo".to_string(), Some("Extras".to_string())))
        );
        assert_eq!(
            parse_implementation_header("@implementation Foo : NSObject {\n}\n@end"),
            Some(("Foo".to_string(), None))
        );
        assert_eq!(parse_implementation_header("@end"), None);
    }
}
