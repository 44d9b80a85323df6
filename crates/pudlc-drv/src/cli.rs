//! Command-line surface, parsed with `clap`'s derive API rather than
//! hand-rolled `std::env::args` (matching the example pack's
//! compiler-shaped CLIs).

use std::path::PathBuf;

use clap::Parser;

/// Pudl compiler and REPL.
///
/// Given a source file, compiles the typed dialect in batch mode. Given no
/// file, reads the Kaleidoscope-style expression dialect from stdin as an
/// interactive top-level loop.
#[derive(Parser, Debug)]
#[command(name = "pudlc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pudl compiler and REPL", long_about = None)]
pub struct Cli {
    /// Source file (typed dialect). Omit to start the expression-dialect
    /// REPL on stdin.
    pub file: Option<PathBuf>,

    /// Print textual IR to stderr, or to PATH if given.
    #[arg(short = 'p', long = "print-ir", num_args = 0..=1, value_name = "PATH")]
    pub print_ir: Option<Option<PathBuf>>,

    /// Emit an object file. Defaults to the input basename with `.o`.
    #[arg(short = 'c', long = "compile", num_args = 0..=1, value_name = "PATH")]
    pub compile: Option<Option<PathBuf>>,

    /// Link to an executable. Defaults to the input basename.
    #[arg(short = 'o', long = "output", num_args = 0..=1, value_name = "PATH")]
    pub output: Option<Option<PathBuf>>,

    /// Linker command.
    #[arg(short = 'l', long = "linker", env = "PUDLC_LINKER")]
    pub linker: Option<String>,

    /// Verbose progress (debug-level tracing to stderr).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Optimization level: 0-6, None, or all.
    #[arg(short = 'O', long = "opt-level", env = "PUDLC_OPT_LEVEL")]
    pub opt_level: Option<String>,
}

impl Cli {
    /// `-c` and `-o` are mutually exclusive; `clap`'s `ArgGroup` can't
    /// express "both optionally take a value and are mutually exclusive"
    /// cleanly with `num_args = 0..=1`, so this is checked by hand after
    /// parsing.
    pub fn compile_and_output_conflict(&self) -> bool {
        self.compile.is_some() && self.output.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_file() {
        let cli = Cli::parse_from(["pudlc", "main.pudl"]);
        assert_eq!(cli.file, Some(PathBuf::from("main.pudl")));
        assert!(cli.compile.is_none());
    }

    #[test]
    fn parses_print_ir_without_path() {
        let cli = Cli::parse_from(["pudlc", "main.pudl", "-p"]);
        assert_eq!(cli.print_ir, Some(None));
    }

    #[test]
    fn parses_print_ir_with_path() {
        let cli = Cli::parse_from(["pudlc", "main.pudl", "--print-ir", "out.ll"]);
        assert_eq!(cli.print_ir, Some(Some(PathBuf::from("out.ll"))));
    }

    #[test]
    fn detects_compile_and_output_conflict() {
        let cli = Cli::parse_from(["pudlc", "main.pudl", "-c", "-o"]);
        assert!(cli.compile_and_output_conflict());
    }

    #[test]
    fn no_file_means_repl_mode() {
        let cli = Cli::parse_from(["pudlc"]);
        assert!(cli.file.is_none());
    }

    #[test]
    fn parses_opt_level() {
        let cli = Cli::parse_from(["pudlc", "main.pudl", "-O2"]);
        assert_eq!(cli.opt_level, Some("2".to_string()));
    }
}
