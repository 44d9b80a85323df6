//! Diagnostic reporting — error/warning collection keyed on `(line, column)`.
//!
//! There is no multi-file `SourceMap`, no byte-offset `Span`, no secondary
//! labels. A [`Diagnostic`] is exactly what's needed to render
//! `error: expected X at (line:col) but given Y`-shaped messages, nothing
//! more.

use std::fmt;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Error => "error",
            Level::Warning => "warning",
        })
    }
}

/// A single reported problem, located at a `(line, column)` pair matching
/// the lexer's token position fields.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at ({}:{})",
            self.level, self.message, self.line, self.column
        )
    }
}

/// Collects diagnostics for one compilation unit.
///
/// The handler never aborts on its own — callers decide whether to keep
/// going (lex/parse errors recover) or bail out of the current item
/// (type/codegen errors).
#[derive(Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>, line: u32, column: u32) {
        self.diagnostics.push(Diagnostic {
            level: Level::Error,
            message: message.into(),
            line,
            column,
        });
    }

    pub fn warning(&mut self, message: impl Into<String>, line: u32, column: u32) {
        self.diagnostics.push(Diagnostic {
            level: Level::Warning,
            message: message.into(),
            line,
            column,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Print every accumulated diagnostic to stderr, in emission order.
    pub fn emit_to_stderr(&self) {
        for diag in &self.diagnostics {
            eprintln!("{}", diag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_ignores_warnings() {
        let mut h = Handler::new();
        h.warning("unused variable x", 3, 5);
        assert!(!h.has_errors());
        h.error("expected ';' but given 'EOF'", 4, 1);
        assert!(h.has_errors());
    }

    #[test]
    fn display_formats_level_message_and_position() {
        let d = Diagnostic {
            level: Level::Error,
            message: "expected ';' but given 'EOF'".into(),
            line: 4,
            column: 1,
        };
        assert_eq!(
            d.to_string(),
            "error: expected ';' but given 'EOF' at (4:1)"
        );
    }
}
