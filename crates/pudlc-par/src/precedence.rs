use rustc_hash::FxHashMap;

/// Module-global operator-precedence table for the expression dialect.
/// Owned by the `ExprParser` for the lifetime of one REPL session rather
/// than held in a process-global static, but it persists across top-level
/// items the same way a single global precedence map would, which is
/// exactly what lets a `binary <op> [precedence]` declaration affect parses
/// of later input.
pub struct PrecedenceTable {
    table: FxHashMap<String, i32>,
}

impl PrecedenceTable {
    pub fn new() -> Self {
        let mut table = FxHashMap::default();
        table.insert("=".to_string(), 2);
        table.insert("<".to_string(), 10);
        table.insert("+".to_string(), 20);
        table.insert("-".to_string(), 20);
        table.insert("*".to_string(), 40);
        PrecedenceTable { table }
    }

    /// Unknown operators yield `-1`, terminating the precedence climb.
    pub fn get(&self, op: &str) -> i32 {
        *self.table.get(op).unwrap_or(&-1)
    }

    /// A later declaration for the same operator symbol overwrites the
    /// entry — last declaration wins.
    pub fn set(&mut self, op: String, precedence: i32) {
        self.table.insert(op, precedence);
    }
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_precedences_for_builtin_operators() {
        let t = PrecedenceTable::new();
        assert_eq!(t.get("="), 2);
        assert_eq!(t.get("<"), 10);
        assert_eq!(t.get("+"), 20);
        assert_eq!(t.get("-"), 20);
        assert_eq!(t.get("*"), 40);
    }

    #[test]
    fn unknown_operator_is_negative_one() {
        assert_eq!(PrecedenceTable::new().get(":"), -1);
    }

    #[test]
    fn later_declaration_overwrites_earlier_one() {
        let mut t = PrecedenceTable::new();
        t.set(":".to_string(), 1);
        assert_eq!(t.get(":"), 1);
        t.set(":".to_string(), 5);
        assert_eq!(t.get(":"), 5);
    }
}
