//! Phase-specific command lines for the migration tool.

use x2a_core::enums::MigrationPhase;

use crate::error::SpecError;

pub const SOURCE_DIR: &str = "/workspace/source";
pub const TARGET_DIR: &str = "/workspace/target";

/// Inputs that vary per run.
#[derive(Debug, Clone, Copy)]
pub struct CommandArgs<'a> {
    pub phase: MigrationPhase,
    pub project_abbreviation: &'a str,
    pub module_name: Option<&'a str>,
    pub user_prompt: Option<&'a str>,
    pub source_technology: &'a str,
}

/// Full argv: `base` followed by the phase subcommand and its arguments.
///
/// A non-empty `user_prompt` is appended to `init` and replaces the module
/// name positional of `analyze` and `migrate`.
///
/// # Errors
///
/// Returns `SpecError::MissingModuleName` for module phases without a module.
pub fn build_command(base: &[String], args: &CommandArgs<'_>) -> Result<Vec<String>, SpecError> {
    let prompt = args.user_prompt.filter(|p| !p.trim().is_empty());
    let module = match args.phase {
        MigrationPhase::Init => None,
        phase => Some(
            args.module_name
                .filter(|m| !m.trim().is_empty())
                .ok_or(SpecError::MissingModuleName { phase })?,
        ),
    };

    let mut argv: Vec<String> = base.to_vec();
    argv.push(args.phase.as_str().to_string());

    match (args.phase, module) {
        (MigrationPhase::Init, _) => {
            argv.extend(["--source-dir".to_string(), SOURCE_DIR.to_string()]);
            if let Some(prompt) = prompt {
                argv.push(prompt.to_string());
            }
        }
        (MigrationPhase::Analyze, Some(module)) => {
            argv.extend([
                "--source-dir".to_string(),
                SOURCE_DIR.to_string(),
                prompt.unwrap_or(module).to_string(),
            ]);
        }
        (MigrationPhase::Migrate, Some(module)) => {
            let plan_dir = format!("{TARGET_DIR}/{}", args.project_abbreviation);
            argv.extend([
                "--source-dir".to_string(),
                SOURCE_DIR.to_string(),
                "--source-technology".to_string(),
                args.source_technology.to_string(),
                "--high-level-migration-plan".to_string(),
                format!("{plan_dir}/migration-plan.md"),
                "--module-migration-plan".to_string(),
                format!("{plan_dir}/modules/{module}/migration-plan-{module}.md"),
                prompt.unwrap_or(module).to_string(),
            ]);
        }
        (MigrationPhase::Publish, Some(module)) => {
            argv.extend([
                "--target-dir".to_string(),
                TARGET_DIR.to_string(),
                module.to_string(),
            ]);
        }
        (phase, None) => return Err(SpecError::MissingModuleName { phase }),
    }
    Ok(argv)
}
