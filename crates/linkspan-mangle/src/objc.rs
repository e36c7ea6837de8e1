//! Objective-C method names.

use linkspan_core::{ObjCMethod, ObjcRuntime};

/// Link name of `method` under `runtime`.
///
/// The Apple form is the "non-blocking" variant: no leading `\x01` marker,
/// category kept.
#[must_use]
pub fn method_name(method: &ObjCMethod, runtime: ObjcRuntime) -> String {
    match runtime {
        ObjcRuntime::Apple => apple_method_name(method),
        ObjcRuntime::Gnu => gnu_method_name(method),
    }
}

/// `-[Class(Category) selector:with:]`
#[must_use]
pub fn apple_method_name(method: &ObjCMethod) -> String {
    let sign = if method.instance { '-' } else { '+' };
    let category = method
        .category
        .as_deref()
        .map(|category| format!("({category})"))
        .unwrap_or_default();
    format!(
        "{sign}[{}{category} {}]",
        method.class,
        method.selector.as_string()
    )
}

/// `_i_Class_Category_selector_with_`; colons become underscores.
#[must_use]
pub fn gnu_method_name(method: &ObjCMethod) -> String {
    let kind = if method.instance { 'i' } else { 'c' };
    let category = method.category.as_deref().unwrap_or_default();
    let selector = method.selector.as_string().replace(':', "_");
    format!("_{kind}_{}_{category}_{selector}", method.class)
}

/// The Apple name as a length-prefixed source name, used as the outer part
/// of a block name.
#[must_use]
pub fn method_source_name(method: &ObjCMethod) -> String {
    let name = apple_method_name(method);
    format!("{}{name}", name.len())
}

#[cfg(test)]
mod tests {
    use linkspan_core::Selector;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn method(instance: bool, category: Option<&str>, selector: Selector) -> ObjCMethod {
        ObjCMethod {
            instance,
            selector,
            class: "Foo".to_string(),
            category: category.map(str::to_string),
        }
    }

    #[rstest]
    #[case(method(true, None, Selector::unary("doThing")), "-[Foo doThing]")]
    #[case(method(false, None, Selector::unary("sharedInstance")), "+[Foo sharedInstance]")]
    #[case(method(true, Some("Extras"), Selector::unary("doThing")), "-[Foo(Extras) doThing]")]
    #[case(method(true, None, Selector::keyword(&["setName", "age"])), "-[Foo setName:age:]")]
    fn apple_runtime(#[case] method: ObjCMethod, #[case] expected: &str) {
        assert_eq!(method_name(&method, ObjcRuntime::Apple), expected);
    }

    #[rstest]
    #[case(method(true, None, Selector::unary("doThing")), "_i_Foo__doThing")]
    #[case(method(false, None, Selector::unary("sharedInstance")), "_c_Foo__sharedInstance")]
    #[case(
        method(true, Some("Extras"), Selector::keyword(&["setName", "age"])),
        "_i_Foo_Extras_setName_age_"
    )]
    fn gnu_runtime(#[case] method: ObjCMethod, #[case] expected: &str) {
        assert_eq!(method_name(&method, ObjcRuntime::Gnu), expected);
    }

    #[test]
    fn source_name_is_length_prefixed() {
        let m = method(true, None, Selector::unary("bar"));
        assert_eq!(method_source_name(&m), "10-[Foo bar]");
    }
}
