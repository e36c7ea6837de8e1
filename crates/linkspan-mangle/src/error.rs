//! Name resolution error types.

/// Reasons a link name could not be computed.
#[derive(Debug, thiserror::Error)]
pub enum MangleError {
    #[error("Declaration name could not be classified: {0:?}")]
    UnresolvedName(String),

    #[error("Type cannot be mangled: {0}")]
    UnsupportedType(String),

    #[error("Template argument cannot be mangled: {0}")]
    UnsupportedTemplateArg(String),

    #[error("Objective-C method {0:?} carries no selector information")]
    MissingObjCInfo(String),

    #[error("Block has no enclosing function or method")]
    DetachedBlock,

    #[error("Unsupported entity: {0}")]
    Unsupported(String),
}
