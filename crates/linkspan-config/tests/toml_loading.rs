//! Integration tests for TOML configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files, env vars and working directory.

use std::path::Path;

use figment::Jail;
use linkspan_config::{ConfigError, LinkspanConfig};
use linkspan_core::{ObjcRuntime, Platform};

#[test]
fn loads_project_config_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".linkspan")?;
        jail.create_file(
            ".linkspan/config.toml",
            r#"
[target]
platform = "darwin"
objc_runtime = "gnu"

[extract]
jobs = 4
follow_includes = false
"#,
        )?;

        let config = LinkspanConfig::load().expect("config loads");
        assert_eq!(config.target.platform, Platform::Darwin);
        assert_eq!(config.target.objc_runtime, ObjcRuntime::Gnu);
        assert_eq!(config.extract.jobs, 4);
        assert!(!config.extract.follow_includes);
        assert!(config.extract.syntax_errors_fail);
        Ok(())
    });
}

#[test]
fn explicit_file_overrides_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".linkspan")?;
        jail.create_file(".linkspan/config.toml", "[extract]\njobs = 2\n")?;
        jail.create_file("ci.toml", "[extract]\njobs = 8\n[output]\nfile = \"out.json\"\n")?;

        let config = LinkspanConfig::load_from(Some(Path::new("ci.toml"))).expect("config loads");
        assert_eq!(config.extract.jobs, 8);
        assert_eq!(config.output.file.as_deref(), Some("out.json"));
        Ok(())
    });
}

#[test]
fn unknown_platform_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_dir(".linkspan")?;
        jail.create_file(".linkspan/config.toml", "[target]\nplatform = \"plan9\"\n")?;

        let result = LinkspanConfig::load();
        assert!(matches!(result, Err(ConfigError::Figment(_))));
        Ok(())
    });
}

#[test]
fn zero_jobs_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_dir(".linkspan")?;
        jail.create_file(".linkspan/config.toml", "[extract]\njobs = 0\n")?;

        let result = LinkspanConfig::load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        Ok(())
    });
}
