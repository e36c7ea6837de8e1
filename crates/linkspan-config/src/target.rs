//! Target ABI configuration.

use linkspan_core::{ObjcRuntime, Platform, TargetInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetConfig {
    /// `linux` or `darwin`; picks the data model and user label prefix.
    #[serde(default)]
    pub platform: Platform,

    /// `apple` or `gnu`; picks the Objective-C method name scheme.
    #[serde(default)]
    pub objc_runtime: ObjcRuntime,
}

impl TargetConfig {
    #[must_use]
    pub const fn target_info(&self) -> TargetInfo {
        TargetInfo::new(self.platform, self.objc_runtime)
    }
}
