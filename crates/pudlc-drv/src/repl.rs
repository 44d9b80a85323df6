//! REPL driver for the expression dialect: reads one top-level item at a
//! time from stdin, JIT-compiles and evaluates bare expressions
//! immediately, and keeps `def`/`extern` declarations around for later
//! items to call.
//!
//! Every item reinitializes the module afterward, uniformly for `def`,
//! `extern`, and bare expressions. `Codegen::ensure_function_declared` is
//! built exactly to re-resolve a call into a module a prior reset
//! discarded, so a call to a function from two items back still links
//! correctly through the JIT's symbol table.

use std::io::Read;

use anyhow::Context as _;
use inkwell::context::Context;
use pudlc_ast::Item;
use pudlc_gen::{Codegen, Jit};
use pudlc_par::{ExprParser, NextItem};

pub fn run(config: &crate::config::Config) -> anyhow::Result<i32> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("reading expression-dialect source from stdin")?;

    let context = Context::create();
    let mut codegen = Codegen::new(&context, "pudl_repl_module_0", config.opt_level);
    let jit = Jit::new(codegen.module()).context("initializing JIT execution engine")?;
    // `create_jit_execution_engine` already took ownership of module_0.
    let mut module_owned_by_jit = true;

    let mut parser = ExprParser::new(&source);
    let mut module_counter: u32 = 0;
    let mut seen_diagnostics = 0;

    loop {
        let item = match parser.next_item() {
            NextItem::Item(item) => item,
            NextItem::Eof => {
                for d in &parser.diagnostics()[seen_diagnostics..] {
                    eprintln!("{d}");
                }
                break;
            }
        };
        for d in &parser.diagnostics()[seen_diagnostics..] {
            eprintln!("{d}");
        }
        seen_diagnostics = parser.diagnostics().len();

        match item {
            Item::TopLevelExpr(expr) => match codegen.compile_top_level_expr(&expr) {
                Ok(function) => {
                    let name = function.get_name().to_string_lossy().into_owned();
                    if !module_owned_by_jit {
                        jit.add_module(codegen.module())?;
                        module_owned_by_jit = true;
                    }
                    match jit.call_nullary_f64(&name) {
                        Ok(value) => println!("Evaluated to {value:.6}"),
                        Err(e) => eprintln!("error: {e}"),
                    }
                    jit.remove_module(codegen.module());
                    module_owned_by_jit = false;
                }
                Err(e) => eprintln!("error: {e}"),
            },
            other => match codegen.compile_item(&other) {
                Ok(()) => {
                    if !module_owned_by_jit {
                        jit.add_module(codegen.module())?;
                        module_owned_by_jit = true;
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            },
        }

        module_counter += 1;
        codegen.reset_module(&format!("pudl_repl_module_{module_counter}"));
        module_owned_by_jit = false;
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    #[test]
    fn module_names_are_unique_per_item() {
        let names: Vec<String> = (0..3).map(|n| format!("pudl_repl_module_{n}")).collect();
        assert_eq!(
            names,
            vec!["pudl_repl_module_0", "pudl_repl_module_1", "pudl_repl_module_2"]
        );
    }
}
