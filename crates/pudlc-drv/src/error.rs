//! Driver-level errors: backend/link failures are fatal and surface here.
//! Parse/type/codegen errors are reported through `pudlc_util::Handler`
//! instead; this enum covers the usage and process-boundary failures that
//! only make sense at the CLI layer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("'--compile' and '--output' are mutually exclusive")]
    CompileAndOutputBothGiven,

    #[error("could not read source file '{0}': {1}")]
    ReadSourceFailed(PathBuf, std::io::Error),

    #[error("parsing failed; see diagnostics above")]
    ParseFailed,

    #[error("code generation failed; see diagnostics above")]
    CodegenFailed,

    #[error("linker '{linker}' exited with status {status}")]
    LinkFailed { linker: String, status: i32 },

    #[error("failed to spawn linker '{0}': {1}")]
    LinkerSpawnFailed(String, std::io::Error),

    #[error("unrecognized optimization level '{0}'")]
    BadOptLevel(String),
}
