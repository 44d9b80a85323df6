//! JIT execution, concretely an `inkwell` `ExecutionEngine`, driving the
//! expression dialect's REPL loop. Follows the LLVM/inkwell Kaleidoscope
//! tutorial's add-module/remove-module/call-by-symbol-name shape.

use inkwell::execution_engine::ExecutionEngine;
use inkwell::module::Module;
use inkwell::OptimizationLevel;

use crate::error::{CodeGenError, Result};

/// Wraps one `ExecutionEngine` that outlives any individual module passed
/// to it. The REPL driver calls `add_module` after each `reset_module`,
/// evaluates the anonymous top-level-expression function, then calls
/// `remove_module` so the next item's identically-named `__anon_exprN`
/// function doesn't collide (each anonymous wrapper still gets a fresh
/// counter suffix, so collisions aren't actually possible, but removing
/// keeps the engine's module list from growing without bound across a
/// long REPL session).
pub struct Jit<'ctx> {
    engine: ExecutionEngine<'ctx>,
}

impl<'ctx> Jit<'ctx> {
    /// The first module handed to a fresh `ExecutionEngine` is adopted
    /// implicitly; later modules must go through `add_module`.
    pub fn new(initial_module: &Module<'ctx>) -> Result<Self> {
        let engine = initial_module
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|e| CodeGenError::LlvmOperationFailed(format!("JIT init: {e}")))?;
        Ok(Jit { engine })
    }

    pub fn add_module(&self, module: &Module<'ctx>) -> Result<()> {
        self.engine
            .add_module(module)
            .map_err(|()| CodeGenError::Internal("module already owned by this engine".into()))
    }

    pub fn remove_module(&self, module: &Module<'ctx>) {
        // `ExecutionEngine::remove_module` takes the module by value's
        // `Module` handle; inkwell only errors if the module was never
        // added, which can't happen on the REPL's add-then-remove path.
        let _ = self.engine.remove_module(module);
    }

    /// Looks up and calls a nullary `f64`-returning function by symbol
    /// name — the shape every `__anon_exprN` wrapper has.
    pub fn call_nullary_f64(&self, name: &str) -> Result<f64> {
        unsafe {
            let function = self
                .engine
                .get_function::<unsafe extern "C" fn() -> f64>(name)
                .map_err(|e| CodeGenError::UndefinedFunction(format!("{name} ({e:?})")))?;
            Ok(function.call())
        }
    }
}
