//! Static types.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Undefined,
    Bool,
    Integer,
    Float,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    /// Numeric promotion rule: if either side is `Float`, both promote to
    /// `Float`; otherwise both are `Integer`. Callers must check
    /// `is_numeric` on both sides first — this never promotes `Bool`.
    pub fn promote(a: Type, b: Type) -> Type {
        if a == Type::Float || b == Type::Float {
            Type::Float
        } else {
            Type::Integer
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Undefined => "undefined",
            Type::Bool => "bool",
            Type::Integer => "int",
            Type::Float => "float",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promote_to_float_if_either_side_is_float() {
        assert_eq!(Type::promote(Type::Integer, Type::Float), Type::Float);
        assert_eq!(Type::promote(Type::Float, Type::Integer), Type::Float);
        assert_eq!(Type::promote(Type::Float, Type::Float), Type::Float);
    }

    #[test]
    fn promote_stays_integer_otherwise() {
        assert_eq!(Type::promote(Type::Integer, Type::Integer), Type::Integer);
    }
}
