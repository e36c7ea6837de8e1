//! # linkspan-config
//!
//! Layered configuration loading for linkspan using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LINKSPAN_*` prefix, `__` as separator)
//! 2. A file passed explicitly (`--config`), if any
//! 3. Project-level `.linkspan/config.toml`
//! 4. User-level `~/.config/linkspan/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! `LINKSPAN_TARGET__PLATFORM` -> `target.platform`,
//! `LINKSPAN_EXTRACT__JOBS` -> `extract.jobs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use linkspan_config::LinkspanConfig;
//!
//! let config = LinkspanConfig::load().expect("config");
//! let target = config.target.target_info();
//! ```

mod error;
mod extract;
mod output;
mod target;

pub use error::ConfigError;
pub use extract::ExtractConfig;
pub use output::OutputConfig;
pub use target::TargetConfig;

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinkspanConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl LinkspanConfig {
    /// Load configuration from the default sources.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `explicit` above the project file.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit
            && !path.exists()
        {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }
        let config: Self = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory first, then [`Self::load_from`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_from(explicit)
    }

    /// Build the figment provider chain.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".linkspan/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("LINKSPAN_").split("__"))
    }

    /// Reject values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extract.jobs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "extract.jobs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.output.file.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::InvalidValue {
                field: "output.file".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("linkspan").join("config.toml"))
    }
}
