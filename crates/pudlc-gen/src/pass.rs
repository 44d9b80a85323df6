//! Pass Scheduler: configures `inkwell`'s legacy `PassManager<FunctionValue>`
//! once per module, then `run_on` is called after each function is emitted.

use inkwell::passes::PassManager;
use inkwell::values::FunctionValue;

/// `-O0`..`-O6`/`-ONone`/`-Oall` (CLI surface).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
    O4,
    O5,
    O6,
    ONone,
    OAll,
}

impl OptLevel {
    /// Collapses the level to the tier the staged table actually branches
    /// on: 0 (none), 1, 2, or 3+ (everything).
    fn tier(self) -> u8 {
        match self {
            OptLevel::O0 | OptLevel::ONone => 0,
            OptLevel::O1 => 1,
            OptLevel::O2 => 2,
            OptLevel::O3 | OptLevel::O4 | OptLevel::O5 | OptLevel::O6 | OptLevel::OAll => 3,
        }
    }
}

impl std::str::FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" | "O0" => OptLevel::O0,
            "1" | "O1" => OptLevel::O1,
            "2" | "O2" => OptLevel::O2,
            "3" | "O3" => OptLevel::O3,
            "4" | "O4" => OptLevel::O4,
            "5" | "O5" => OptLevel::O5,
            "6" | "O6" => OptLevel::O6,
            "None" | "ONone" => OptLevel::ONone,
            "all" | "Oall" | "OAll" => OptLevel::OAll,
            other => return Err(format!("unrecognized optimization level '{other}'")),
        })
    }
}

/// Builds and configures the per-function pass manager for `level`.
/// `{promote-to-reg, inst-combine, reassociate, dce, gvn, simplify-cfg}`
/// staged as: `-O0` none; `-O1` promote-to-reg+inst-combine; `-O2` adds
/// reassociate+gvn; `-O3..-O6`/`-Oall` additionally add dce+simplify-cfg.
pub fn build_function_pass_manager<'ctx>(
    level: OptLevel,
) -> PassManager<FunctionValue<'ctx>> {
    let fpm = PassManager::create(());
    let tier = level.tier();

    if tier >= 1 {
        fpm.add_promote_memory_to_register_pass();
        fpm.add_instruction_combining_pass();
    }
    if tier >= 2 {
        fpm.add_reassociate_pass();
        fpm.add_gvn_pass();
    }
    if tier >= 3 {
        fpm.add_aggressive_dce_pass();
        fpm.add_cfg_simplification_pass();
    }

    fpm.initialize();
    fpm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_match_the_staged_table() {
        assert_eq!(OptLevel::O0.tier(), 0);
        assert_eq!(OptLevel::ONone.tier(), 0);
        assert_eq!(OptLevel::O1.tier(), 1);
        assert_eq!(OptLevel::O2.tier(), 2);
        assert_eq!(OptLevel::O3.tier(), 3);
        assert_eq!(OptLevel::O6.tier(), 3);
        assert_eq!(OptLevel::OAll.tier(), 3);
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("O2".parse::<OptLevel>().unwrap(), OptLevel::O2);
        assert_eq!("2".parse::<OptLevel>().unwrap(), OptLevel::O2);
        assert_eq!("Oall".parse::<OptLevel>().unwrap(), OptLevel::OAll);
        assert!("O9".parse::<OptLevel>().is_err());
    }
}
