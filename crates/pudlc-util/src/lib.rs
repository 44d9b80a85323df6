//! Shared foundation types for the Pudl compiler: interned identifiers and
//! `(line, column)`-keyed diagnostics. Every other crate in the workspace
//! depends on this one and nothing else in it depends on them.

pub mod diagnostic;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use symbol::Symbol;
