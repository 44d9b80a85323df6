//! Linker thunk: when linking a module that defines a function named
//! `mast`, emit a trivial `main` that calls it. The thunk itself is
//! `Codegen::emit_main_thunk`, since building it needs the module's
//! `mast`/`printf`/format-global handles; this free function is the
//! textual-IR path a caller uses when it wants the module's IR with the
//! thunk already included, rather than linking an object file.

use crate::codegen::Codegen;
use crate::error::Result;

/// Emits the `mast` thunk into `codegen`'s current module, if present,
/// and returns the module's textual IR with the thunk included. Returns
/// `None` (module left untouched) if this module has no `mast`.
pub fn emit_main_thunk(codegen: &mut Codegen<'_>) -> Result<Option<String>> {
    if codegen.emit_main_thunk()? {
        Ok(Some(codegen.emit_ir_to_string()))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::OptLevel;
    use inkwell::context::Context;

    #[test]
    fn no_op_without_mast() {
        let context = Context::create();
        let mut codegen = Codegen::new(&context, "empty", OptLevel::O0);
        assert!(emit_main_thunk(&mut codegen).unwrap().is_none());
    }
}
