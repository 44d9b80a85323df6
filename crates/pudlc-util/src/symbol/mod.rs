//! Interned identifiers.
//!
//! Every `Var`, function, and parameter name in the AST is stored as a
//! [`Symbol`] rather than a `String`: names are compared constantly during
//! parsing (scope lookups) and codegen (locals/args maps), and a 4-byte
//! integer compare beats a string compare on every one of those lookups.

mod interner;

use std::fmt;

/// A compact handle to an interned string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn intern(s: &str) -> Self {
        Symbol(interner::global().intern(s))
    }

    pub fn as_str(self) -> &'static str {
        interner::global().resolve(self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_equal_symbol() {
        assert_eq!(Symbol::intern("mast"), Symbol::intern("mast"));
    }

    #[test]
    fn different_text_interns_to_different_symbol() {
        assert_ne!(Symbol::intern("x"), Symbol::intern("y"));
    }

    #[test]
    fn round_trips_through_as_str() {
        let sym = Symbol::intern("printd");
        assert_eq!(sym.as_str(), "printd");
    }
}
