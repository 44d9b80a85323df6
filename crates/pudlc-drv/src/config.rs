//! Driver-wide configuration: resolved once per invocation in order CLI
//! flag > environment variable > built-in default, mirroring
//! `faxc-drv::Config`'s `Config`/`Session` split: gathered once, held for
//! the invocation's duration.

use std::str::FromStr;

use pudlc_gen::OptLevel;

use crate::error::DriverError;

const DEFAULT_LINKER: &str = "clang";

#[derive(Debug, Clone)]
pub struct Config {
    pub linker: String,
    pub opt_level: OptLevel,
    pub target_triple: String,
    pub debug: bool,
}

impl Config {
    pub fn resolve(
        cli_linker: Option<String>,
        cli_opt_level: Option<String>,
        debug: bool,
    ) -> Result<Self, DriverError> {
        let linker = cli_linker
            .or_else(|| std::env::var("PUDLC_LINKER").ok())
            .unwrap_or_else(|| DEFAULT_LINKER.to_string());

        let opt_level_str = cli_opt_level.or_else(|| std::env::var("PUDLC_OPT_LEVEL").ok());
        let opt_level = match opt_level_str {
            Some(s) => {
                OptLevel::from_str(&s).map_err(|_| DriverError::BadOptLevel(s))?
            }
            None => OptLevel::O0,
        };

        let target_triple = inkwell::targets::TargetMachine::get_default_triple()
            .as_str()
            .to_string_lossy()
            .into_owned();

        Ok(Config {
            linker,
            opt_level,
            target_triple,
            debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins_over_default() {
        let config = Config::resolve(Some("mylinker".into()), None, false).unwrap();
        assert_eq!(config.linker, "mylinker");
    }

    #[test]
    fn default_opt_level_is_o0() {
        let config = Config::resolve(None, None, false).unwrap();
        assert_eq!(config.opt_level, OptLevel::O0);
    }

    #[test]
    fn bad_opt_level_is_rejected() {
        assert!(Config::resolve(None, Some("O9".into()), false).is_err());
    }
}
