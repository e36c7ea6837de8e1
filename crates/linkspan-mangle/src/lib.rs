//! # linkspan-mangle
//!
//! Computes the symbol name a linker sees for a lowered declaration.
//!
//! Dispatch is by [`DeclKind`](linkspan_core::DeclKind):
//! - Objective-C methods use the runtime's method-name scheme ([`objc`]),
//! - blocks use the `__<outer>_block_invoke` scheme ([`block`]),
//! - everything else is either left unmangled (C linkage, `main`) or
//!   mangled under the Itanium C++ ABI ([`itanium`]).
//!
//! [`NameResolver::resolve_or_empty`] applies the extraction policy: a name
//! that cannot be computed becomes the empty string instead of an error.

pub mod block;
pub mod error;
pub mod itanium;
pub mod objc;
pub mod resolver;
mod substitution;

pub use error::MangleError;
pub use resolver::NameResolver;

#[cfg(test)]
pub(crate) mod test_support;
