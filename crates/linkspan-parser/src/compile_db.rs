//! `compile_commands.json` reader.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ParserError;
use crate::options::CompileOptions;

/// One entry of a JSON compilation database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
}

impl CompileCommand {
    /// `file` made absolute against `directory`.
    #[must_use]
    pub fn absolute_file(&self) -> String {
        let file = Path::new(&self.file);
        if file.is_absolute() {
            return self.file.clone();
        }
        Path::new(&self.directory).join(file).display().to_string()
    }

    /// Compiler arguments without the executable.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let words = match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(command)) => split_command(command),
            (None, None) => Vec::new(),
        };
        words.into_iter().skip(1).collect()
    }

    /// Options for this entry, with include directories made absolute.
    ///
    /// # Errors
    /// Returns `ParserError` for malformed arguments.
    pub fn options(&self) -> Result<CompileOptions, ParserError> {
        CompileOptions::from_args(&self.args(), Some(Path::new(&self.directory)))
    }
}

/// A loaded compilation database.
#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
    commands: Vec<CompileCommand>,
}

impl CompilationDatabase {
    /// Load `compile_commands.json` from a build directory, or from the
    /// given file when `path` names one.
    ///
    /// # Errors
    /// Returns `ParserError` if the file cannot be read or is not a JSON
    /// array of compile commands.
    pub fn load(path: &Path) -> Result<Self, ParserError> {
        let file: PathBuf = if path.is_dir() {
            path.join("compile_commands.json")
        } else {
            path.to_path_buf()
        };
        let text = std::fs::read_to_string(&file).map_err(|source| ParserError::Read {
            path: file.clone(),
            source,
        })?;
        Self::from_json(&text).map_err(|error| ParserError::CompileDatabase {
            path: file,
            message: error.to_string(),
        })
    }

    /// Parse a compilation database from JSON text.
    ///
    /// # Errors
    /// Returns `ParserError::Json` for malformed input.
    pub fn from_json(text: &str) -> Result<Self, ParserError> {
        let commands: Vec<CompileCommand> = serde_json::from_str(text)?;
        Ok(Self { commands })
    }

    #[must_use]
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// Absolute source paths in database order, without repeats.
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for command in &self.commands {
            let file = command.absolute_file();
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// The first entry whose absolute file equals `file` exactly.
    #[must_use]
    pub fn command_for(&self, file: &str) -> Option<&CompileCommand> {
        self.commands.iter().find(|c| c.absolute_file() == file)
    }
}

/// Split a shell command line into words, honouring quotes and backslashes.
#[must_use]
pub fn split_command(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn splits_quoted_words() {
        assert_eq!(
            split_command(r#"clang++ -I"/path with space" -DNAME='a b' -c x\ y.cpp"#),
            vec!["clang++", "-I/path with space", "-DNAME=a b", "-c", "x y.cpp"]
        );
        assert_eq!(split_command("  cc   a.c  "), vec!["cc", "a.c"]);
        assert_eq!(split_command(r#"cc -D X="""#), vec!["cc", "-D", "X="]);
    }

    #[test]
    fn reads_command_and_arguments_forms() {
        let db = CompilationDatabase::from_json(
            r#"[
                {"directory": "/build", "file": "../src/a.cpp", "command": "c++ -Iinc -c ../src/a.cpp"},
                {"directory": "/build", "file": "/src/b.c", "arguments": ["cc", "-x", "c", "-isystem", "/sys", "/src/b.c"]}
            ]"#,
        )
        .expect("valid database");

        assert_eq!(db.files(), vec!["/build/../src/a.cpp", "/src/b.c"]);

        let a = db.command_for("/build/../src/a.cpp").expect("entry a");
        let options = a.options().expect("options");
        assert_eq!(options.include_dirs, vec![PathBuf::from("/build/inc")]);

        let b = db.command_for("/src/b.c").expect("entry b");
        let options = b.options().expect("options");
        assert_eq!(options.system_dirs, vec![PathBuf::from("/sys")]);
        assert_eq!(options.language, Some(linkspan_core::SourceLanguage::C));
    }

    #[test]
    fn loads_from_build_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("compile_commands.json"),
            r#"[{"directory": "/b", "file": "/s/main.cc", "arguments": ["c++", "/s/main.cc"]}]"#,
        )
        .expect("write db");

        let db = CompilationDatabase::load(dir.path()).expect("loads");
        assert_eq!(db.commands().len(), 1);
        assert_eq!(db.files(), vec!["/s/main.cc"]);
    }

    #[test]
    fn malformed_database_names_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("compile_commands.json");
        std::fs::write(&path, "{not json").expect("write db");

        let error = CompilationDatabase::load(dir.path()).expect_err("rejects");
        assert!(matches!(error, ParserError::CompileDatabase { path: p, .. } if p == path));
    }
}
