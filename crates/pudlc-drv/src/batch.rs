//! Batch driver for the typed dialect: parse the whole file, codegen the
//! whole module, then do exactly one of print-ir, compile-to-object, or
//! compile-and-link, per the CLI flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use inkwell::context::Context;
use pudlc_ast::Item;
use pudlc_gen::Codegen;
use pudlc_par::TypedParser;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::DriverError;
use crate::linker::Linker;

pub fn run(file: &Path, cli: &Cli, config: &Config) -> anyhow::Result<i32> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| DriverError::ReadSourceFailed(file.to_path_buf(), e))?;

    let module_name = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pudl".to_string());

    let mut parser = TypedParser::new(&source);
    let defs = parser.parse_unit();
    let parse_failed = parser.has_errors();
    let handler = parser.into_handler();
    handler.emit_to_stderr();
    if parse_failed {
        return Ok(1);
    }

    let items: Vec<Item> = defs.into_iter().map(Item::FunctionDef).collect();

    let context = Context::create();
    let mut codegen = Codegen::new(&context, &module_name, config.opt_level);
    if let Err(errors) = codegen.compile_program(&items) {
        for e in &errors {
            eprintln!("error: {e}");
        }
        return Ok(1);
    }

    let emitted_thunk = codegen
        .emit_main_thunk()
        .context("emitting linker thunk")?;
    if config.debug && emitted_thunk {
        tracing::debug!("emitted main() thunk calling mast()");
    }

    if let Some(ir_path) = &cli.print_ir {
        let ir = codegen.emit_ir_to_string();
        match ir_path {
            Some(path) => std::fs::write(path, &ir)
                .with_context(|| format!("writing IR to '{}'", path.display()))?,
            None => eprint!("{ir}"),
        }
    }

    // `cli.compile_and_output_conflict()` is already checked in `main` before
    // dispatch, so both branches below are never reachable simultaneously.

    if let Some(object_path) = &cli.compile {
        let path = object_path
            .clone()
            .unwrap_or_else(|| default_sibling_path(file, "o"));
        codegen
            .write_object_file(&config.target_triple, &path)
            .context("emitting object file")?;
        return Ok(0);
    }

    if let Some(exe_path) = &cli.output {
        let path = exe_path
            .clone()
            .unwrap_or_else(|| default_sibling_path(file, ""));
        let object = tempfile::Builder::new()
            .prefix("pudlc-")
            .suffix(".o")
            .tempfile()
            .context("creating temporary object file")?;
        codegen
            .write_object_file(&config.target_triple, object.path())
            .context("emitting object file")?;

        let linker = Linker::new(config.linker.clone());
        linker.link(object.path(), &path)?;
        // `object` (a `NamedTempFile`) removes its backing file on drop
        // regardless of which exit path below is taken.
    }

    Ok(0)
}

fn default_sibling_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut path = input.with_file_name(stem);
    if !extension.is_empty() {
        path.set_extension(extension);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_object_path_has_o_extension() {
        let path = default_sibling_path(Path::new("dir/main.pudl"), "o");
        assert_eq!(path, PathBuf::from("dir/main.o"));
    }

    #[test]
    fn default_executable_path_has_no_extension() {
        let path = default_sibling_path(Path::new("dir/main.pudl"), "");
        assert_eq!(path, PathBuf::from("dir/main"));
    }
}
