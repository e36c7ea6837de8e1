//! Extraction run configuration.

use serde::{Deserialize, Serialize};

/// Default number of translation units processed at once.
const fn default_jobs() -> usize {
    1
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractConfig {
    /// Translation units parsed in parallel. `1` keeps the run sequential.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Lower declarations from `#include`d headers found on the include path.
    #[serde(default = "default_true")]
    pub follow_includes: bool,

    /// Treat a unit with syntax errors as failed for the exit status.
    #[serde(default = "default_true")]
    pub syntax_errors_fail: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            follow_includes: default_true(),
            syntax_errors_fail: default_true(),
        }
    }
}
