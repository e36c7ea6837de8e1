//! Output destination configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// File to write the JSON document to. Stdout when unset.
    #[serde(default)]
    pub file: Option<String>,
}
