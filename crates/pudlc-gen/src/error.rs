//! Error type for LLVM code generation, shaped like
//! `faxc_gen::error::CodeGenError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    #[error("function '{0}' expects {expected} argument(s), given {given}", expected = .1, given = .2)]
    ArityMismatch(String, usize, usize),

    #[error("LLVM operation failed: {0}")]
    LlvmOperationFailed(String),

    #[error("basic block is not open for instruction insertion")]
    BlockNotOpen,

    #[error("target initialization failed: {0}")]
    TargetError(String),

    #[error("object file emission failed: {0}")]
    EmitError(String),

    #[error("internal code generator error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
