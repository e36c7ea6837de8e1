//! ast-grep wrapper and language detection from file extensions.

pub mod objc_lang;

use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_language::{LanguageExt, SupportLang};
use linkspan_core::SourceLanguage;

pub use objc_lang::ObjcLang;

use crate::error::ParserError;

/// Tree type for C and C++ sources.
pub type AstTree = ast_grep_core::AstGrep<StrDoc<SupportLang>>;

/// Tree type for Objective-C sources.
pub type ObjcTree = ast_grep_core::AstGrep<StrDoc<ObjcLang>>;

/// Detect the source language from a file path extension.
///
/// Headers (`.h`) are C++ here; callers that know the unit is C or
/// Objective-C override this through `-x`.
#[must_use]
pub fn detect_language(file_path: &str) -> Option<SourceLanguage> {
    let (_, ext) = file_path.rsplit_once('.')?;
    match ext {
        "c" => Some(SourceLanguage::C),
        "m" => Some(SourceLanguage::ObjC),
        "mm" => Some(SourceLanguage::ObjCxx),
        "cpp" | "cc" | "cxx" | "c++" | "C" | "h" | "hh" | "hpp" | "hxx" | "h++" | "ipp"
        | "inl" => Some(SourceLanguage::Cxx),
        _ => None,
    }
}

/// Map a `-x` argument to a language.
///
/// # Errors
/// Returns `ParserError::UnsupportedLanguage` for anything but the C family.
pub fn language_from_flag(value: &str) -> Result<SourceLanguage, ParserError> {
    match value {
        "c" | "c-header" => Ok(SourceLanguage::C),
        "c++" | "c++-header" => Ok(SourceLanguage::Cxx),
        "objective-c" | "objective-c-header" => Ok(SourceLanguage::ObjC),
        "objective-c++" | "objective-c++-header" => Ok(SourceLanguage::ObjCxx),
        other => Err(ParserError::UnsupportedLanguage(other.to_string())),
    }
}

/// tree-sitter grammar used for a source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    C,
    Cpp,
    Objc,
}

impl Grammar {
    #[must_use]
    pub const fn for_language(language: SourceLanguage) -> Self {
        match language {
            SourceLanguage::C => Self::C,
            SourceLanguage::Cxx => Self::Cpp,
            SourceLanguage::ObjC | SourceLanguage::ObjCxx => Self::Objc,
        }
    }
}

/// Parse C or C++ source into an ast-grep tree.
#[must_use]
pub fn parse_source(source: &str, lang: SupportLang) -> AstTree {
    lang.ast_grep(source)
}

/// Parse Objective-C source into an ast-grep tree.
#[must_use]
pub fn parse_objc(source: &str) -> ObjcTree {
    ObjcLang.ast_grep(source)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("main.c", Some(SourceLanguage::C))]
    #[case("src/app.cpp", Some(SourceLanguage::Cxx))]
    #[case("widget.cc", Some(SourceLanguage::Cxx))]
    #[case("include/api.h", Some(SourceLanguage::Cxx))]
    #[case("include/api.hpp", Some(SourceLanguage::Cxx))]
    #[case("View.m", Some(SourceLanguage::ObjC))]
    #[case("Bridge.mm", Some(SourceLanguage::ObjCxx))]
    #[case("notes.txt", None)]
    #[case("Makefile", None)]
    fn detects_language(#[case] path: &str, #[case] expected: Option<SourceLanguage>) {
        assert_eq!(detect_language(path), expected);
    }

    #[test]
    fn language_flags() {
        assert_eq!(language_from_flag("c").ok(), Some(SourceLanguage::C));
        assert_eq!(language_from_flag("objective-c++").ok(), Some(SourceLanguage::ObjCxx));
        assert!(matches!(
            language_from_flag("fortran"),
            Err(ParserError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn grammar_per_language() {
        assert_eq!(Grammar::for_language(SourceLanguage::C), Grammar::C);
        assert_eq!(Grammar::for_language(SourceLanguage::ObjCxx), Grammar::Objc);
    }

    #[test]
    fn parse_source_produces_translation_unit() {
        let tree = parse_source("int main(void) { return 0; }", SupportLang::C);
        assert_eq!(tree.root().kind().as_ref(), "translation_unit");
    }

    #[test]
    fn parse_objc_produces_translation_unit() {
        let tree = parse_objc("@implementation Foo\n- (void)bar {}\n@end\n");
        assert_eq!(tree.root().kind().as_ref(), "translation_unit");
    }
}
