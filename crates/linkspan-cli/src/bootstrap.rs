use std::path::{Path, PathBuf};

use anyhow::Context;
use linkspan_config::LinkspanConfig;
use linkspan_extract::UnitInput;
use linkspan_parser::{CompilationDatabase, CompileOptions};

use crate::cli::Cli;

/// Load layered configuration and apply command-line overrides on top.
pub fn load_config(cli: &Cli) -> anyhow::Result<LinkspanConfig> {
    let mut config = LinkspanConfig::load_with_dotenv(cli.config.as_deref())
        .context("failed to load linkspan configuration")?;

    if let Some(jobs) = cli.jobs {
        config.extract.jobs = jobs;
    }
    if cli.no_includes {
        config.extract.follow_includes = false;
    }
    if let Some(path) = &cli.output_file {
        config.output.file = Some(path.display().to_string());
    }
    config.validate().context("invalid command-line override")?;

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

pub fn load_database(build_path: Option<&Path>) -> anyhow::Result<Option<CompilationDatabase>> {
    let Some(path) = build_path else {
        return Ok(None);
    };
    let database = CompilationDatabase::load(path)
        .with_context(|| format!("failed to load compilation database from {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        commands = database.commands().len(),
        "compilation database loaded"
    );
    Ok(Some(database))
}

/// One [`UnitInput`] per source, in order.
///
/// Each source takes its options from the matching database entry (looked
/// up by the path as given, then by its absolute form), followed by the
/// arguments after `--`. Sources keep the spelling they were given with, so
/// output keys match the command line.
pub fn unit_inputs(
    sources: &[String],
    database: Option<&CompilationDatabase>,
    compiler_args: &[String],
) -> anyhow::Result<Vec<UnitInput>> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let extra = CompileOptions::from_args(compiler_args, Some(&cwd))
        .context("invalid compiler arguments after `--`")?;

    let sources: Vec<String> = match (sources.is_empty(), database) {
        (false, _) => sources.to_vec(),
        (true, Some(database)) => database.files(),
        (true, None) => anyhow::bail!("no source files given and no compilation database (-p)"),
    };

    sources
        .into_iter()
        .map(|path| {
            let mut options = match database.and_then(|db| lookup(db, &path, &cwd)) {
                Some(command) => command
                    .options()
                    .with_context(|| format!("invalid compile command for {path}"))?,
                None => {
                    if database.is_some() {
                        tracing::debug!(file = %path, "no compile command; using defaults");
                    }
                    CompileOptions::default()
                }
            };
            options.extend(&extra);
            Ok(UnitInput { path, options })
        })
        .collect()
}

fn lookup<'db>(
    database: &'db CompilationDatabase,
    path: &str,
    cwd: &Path,
) -> Option<&'db linkspan_parser::CompileCommand> {
    database.command_for(path).or_else(|| {
        let absolute: PathBuf = cwd.join(path);
        database.command_for(&absolute.display().to_string())
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use linkspan_core::SourceLanguage;
    use pretty_assertions::assert_eq;

    use super::*;

    fn database() -> CompilationDatabase {
        CompilationDatabase::from_json(
            r#"[
                {"directory": "/proj/build", "file": "../src/a.cpp", "arguments": ["c++", "-I../include", "-c", "../src/a.cpp"]},
                {"directory": "/proj/build", "file": "/proj/src/b.c", "command": "cc -isystem /usr/local/include -c /proj/src/b.c"}
            ]"#,
        )
        .expect("valid database")
    }

    #[test]
    fn sources_take_database_options_and_extra_args() {
        let db = database();
        let inputs = unit_inputs(
            &["/proj/src/b.c".to_string(), "/elsewhere/c.m".to_string()],
            Some(&db),
            &["-I/extra".to_string()],
        )
        .expect("inputs");

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].path, "/proj/src/b.c");
        assert_eq!(
            inputs[0].options.system_dirs,
            vec![PathBuf::from("/usr/local/include")]
        );
        assert_eq!(inputs[0].options.include_dirs, vec![PathBuf::from("/extra")]);
        assert_eq!(inputs[1].options.include_dirs, vec![PathBuf::from("/extra")]);
    }

    #[test]
    fn database_files_are_used_when_no_sources_are_given() {
        let db = database();
        let inputs = unit_inputs(&[], Some(&db), &[]).expect("inputs");
        let paths: Vec<&str> = inputs.iter().map(|input| input.path.as_str()).collect();
        assert_eq!(paths, vec!["/proj/build/../src/a.cpp", "/proj/src/b.c"]);
        assert_eq!(
            inputs[0].options.include_dirs,
            vec![PathBuf::from("/proj/build/../include")]
        );
    }

    #[test]
    fn language_override_applies_to_every_unit() {
        let inputs = unit_inputs(
            &["one.h".to_string()],
            None,
            &["-x".to_string(), "c".to_string()],
        )
        .expect("inputs");
        assert_eq!(inputs[0].options.language, Some(SourceLanguage::C));
    }

    #[test]
    fn nothing_to_do_is_an_error() {
        assert!(unit_inputs(&[], None, &[]).is_err());
    }
}
