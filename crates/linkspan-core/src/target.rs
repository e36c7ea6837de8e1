//! Target description: the parts of the platform ABI that change link names.

use serde::{Deserialize, Serialize};

use crate::types::BuiltinType;

/// Operating system family whose C data model and assembler conventions apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Linux,
    Darwin,
}

/// Objective-C runtime family, which selects the method name scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjcRuntime {
    /// `-[Class(Category) selector:]`
    #[default]
    Apple,
    /// `_i_Class_Category_selector_`
    Gnu,
}

/// ABI-relevant facts about the compilation target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetInfo {
    pub platform: Platform,
    pub objc_runtime: ObjcRuntime,
}

impl TargetInfo {
    #[must_use]
    pub const fn new(platform: Platform, objc_runtime: ObjcRuntime) -> Self {
        Self {
            platform,
            objc_runtime,
        }
    }

    /// Prefix the assembler prepends to C symbol names.
    #[must_use]
    pub const fn user_label_prefix(&self) -> &'static str {
        match self.platform {
            Platform::Linux => "",
            Platform::Darwin => "_",
        }
    }

    /// Builtin spelled by `int64_t`.
    #[must_use]
    pub const fn int64_type(&self) -> BuiltinType {
        match self.platform {
            Platform::Linux => BuiltinType::Long,
            Platform::Darwin => BuiltinType::LongLong,
        }
    }

    /// Builtin spelled by `uint64_t`.
    #[must_use]
    pub const fn uint64_type(&self) -> BuiltinType {
        match self.platform {
            Platform::Linux => BuiltinType::UnsignedLong,
            Platform::Darwin => BuiltinType::UnsignedLongLong,
        }
    }

    /// Resolve a well-known C library typedef to the builtin it names.
    #[must_use]
    pub fn builtin_typedef(&self, spelling: &str) -> Option<BuiltinType> {
        let builtin = match spelling {
            "int8_t" => BuiltinType::SignedChar,
            "uint8_t" => BuiltinType::UnsignedChar,
            "int16_t" => BuiltinType::Short,
            "uint16_t" => BuiltinType::UnsignedShort,
            "int32_t" => BuiltinType::Int,
            "uint32_t" => BuiltinType::UnsignedInt,
            "int64_t" | "intmax_t" => self.int64_type(),
            "uint64_t" | "uintmax_t" => self.uint64_type(),
            "size_t" | "uintptr_t" => BuiltinType::UnsignedLong,
            "ssize_t" | "ptrdiff_t" | "intptr_t" => BuiltinType::Long,
            _ => return None,
        };
        Some(builtin)
    }
}
