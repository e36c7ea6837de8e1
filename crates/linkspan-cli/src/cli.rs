use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI parser for the `linkspan` binary.
#[derive(Debug, Parser)]
#[command(
    name = "linkspan",
    version,
    about = "Record link names and line ranges of function definitions"
)]
pub struct Cli {
    /// Source files to extract from. Defaults to every file in the
    /// compilation database when `-p` is given.
    pub sources: Vec<String>,

    /// Build directory containing compile_commands.json (or the file itself)
    #[arg(short = 'p', long = "build-path")]
    pub build_path: Option<PathBuf>,

    /// Write the JSON document here instead of stdout
    #[arg(short, long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Extra configuration file layered above the project config
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Translation units processed in parallel (overrides extract.jobs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Do not expand #include directives
    #[arg(long)]
    pub no_includes: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Extra compiler arguments applied to every unit, after `--`
    #[arg(last = true, allow_hyphen_values = true)]
    pub compiler_args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::Cli;

    #[test]
    fn clap_command_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sources_build_path_and_output() {
        let cli = Cli::try_parse_from([
            "linkspan",
            "-p",
            "build",
            "a.cpp",
            "b.cpp",
            "--output-file",
            "out.json",
        ])
        .expect("cli should parse");

        assert_eq!(cli.sources, vec!["a.cpp", "b.cpp"]);
        assert_eq!(cli.build_path, Some(PathBuf::from("build")));
        assert_eq!(cli.output_file, Some(PathBuf::from("out.json")));
        assert!(cli.compiler_args.is_empty());
    }

    #[test]
    fn compiler_args_follow_double_dash() {
        let cli = Cli::try_parse_from([
            "linkspan", "main.c", "--", "-Iinclude", "-x", "c", "-std=c11",
        ])
        .expect("cli should parse");

        assert_eq!(cli.sources, vec!["main.c"]);
        assert_eq!(cli.compiler_args, vec!["-Iinclude", "-x", "c", "-std=c11"]);
    }

    #[test]
    fn logging_and_job_flags() {
        let cli = Cli::try_parse_from(["linkspan", "-v", "--jobs", "4", "--no-includes", "x.m"])
            .expect("cli should parse");
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.no_includes);
        assert_eq!(cli.jobs, Some(4));
    }

    #[test]
    fn jobs_must_be_a_number() {
        assert!(Cli::try_parse_from(["linkspan", "--jobs", "many", "x.c"]).is_err());
    }
}
