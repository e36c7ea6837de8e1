//! Per-unit compiler options: language override and include search paths.

use std::path::{Path, PathBuf};

use linkspan_core::SourceLanguage;

use crate::error::ParserError;
use crate::parser::{detect_language, language_from_flag};

/// The subset of a compiler invocation the frontend understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// `-x <lang>`
    pub language: Option<SourceLanguage>,
    /// `-iquote <dir>`: searched for `"..."` includes only.
    pub quote_dirs: Vec<PathBuf>,
    /// `-I <dir>`
    pub include_dirs: Vec<PathBuf>,
    /// `-isystem <dir>`
    pub system_dirs: Vec<PathBuf>,
    /// `-std=` value, when it names a C (not C++) standard.
    pub c_standard: Option<String>,
}

impl CompileOptions {
    /// Parse compiler arguments, resolving relative directories against
    /// `directory` when given.
    ///
    /// Unknown flags are ignored. Arguments are expected without the
    /// compiler executable.
    ///
    /// # Errors
    /// Returns `ParserError` when a flag is missing its value or `-x` names
    /// an unsupported language.
    pub fn from_args(args: &[String], directory: Option<&Path>) -> Result<Self, ParserError> {
        let mut options = Self::default();
        let resolve = |dir: &str| -> PathBuf {
            let path = PathBuf::from(dir);
            match directory {
                Some(base) if path.is_relative() => base.join(path),
                _ => path,
            }
        };

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value_of = |flag: &str| -> Result<String, ParserError> {
                if arg.len() > flag.len() {
                    return Ok(arg[flag.len()..].trim_start_matches('=').to_string());
                }
                iter.next()
                    .cloned()
                    .ok_or_else(|| ParserError::Arguments(format!("{flag} expects a value")))
            };

            if arg.starts_with("-iquote") {
                let dir = value_of("-iquote")?;
                options.quote_dirs.push(resolve(&dir));
            } else if arg.starts_with("-isystem") {
                let dir = value_of("-isystem")?;
                options.system_dirs.push(resolve(&dir));
            } else if arg.starts_with("-I") {
                let dir = value_of("-I")?;
                options.include_dirs.push(resolve(&dir));
            } else if arg.starts_with("-x") {
                let lang = value_of("-x")?;
                options.language = Some(language_from_flag(&lang)?);
            } else if let Some(standard) = arg.strip_prefix("-std=") {
                let is_cxx = standard.contains("++");
                options.c_standard = (!is_cxx).then(|| standard.to_string());
            }
        }
        Ok(options)
    }

    /// Language of `path` under these options.
    ///
    /// # Errors
    /// Returns `ParserError::UnsupportedLanguage` when neither `-x` nor the
    /// extension identifies a C-family language.
    pub fn language_for(&self, path: &str) -> Result<SourceLanguage, ParserError> {
        if let Some(language) = self.language {
            return Ok(language);
        }
        let detected = detect_language(path)
            .ok_or_else(|| ParserError::UnsupportedLanguage(path.to_string()))?;
        if detected == SourceLanguage::Cxx && self.c_standard.is_some() && path.ends_with(".h") {
            return Ok(SourceLanguage::C);
        }
        Ok(detected)
    }

    /// Append the search paths of `other` after this set's.
    pub fn extend(&mut self, other: &Self) {
        if other.language.is_some() {
            self.language = other.language;
        }
        if other.c_standard.is_some() {
            self.c_standard.clone_from(&other.c_standard);
        }
        self.quote_dirs.extend(other.quote_dirs.iter().cloned());
        self.include_dirs.extend(other.include_dirs.iter().cloned());
        self.system_dirs.extend(other.system_dirs.iter().cloned());
    }
}
