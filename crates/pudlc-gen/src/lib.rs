//! Code Generator and Pass Scheduler, instantiated concretely over
//! `inkwell` — both the IR builder and the executor that runs compiled code
//! resolve to LLVM here, since a buildable compiler needs one real backend
//! behind those interfaces.

mod codegen;
mod error;
mod jit;
mod pass;
mod thunk;

pub use codegen::Codegen;
pub use error::{CodeGenError, Result};
pub use jit::Jit;
pub use pass::{build_function_pass_manager, OptLevel};
pub use thunk::emit_main_thunk;
