//! `nokvault secure-delete`: overwrite a file, then remove it.

use std::path::Path;

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, require_exists, Cli};
use crate::core::shred::secure_delete;
use crate::errors::{NokvaultError, Result};

/// Execute the `secure-delete` command.
pub fn execute(cli: &Cli, path: &Path, passes: Option<i64>, force: bool) -> Result<()> {
    require_exists(path)?;
    if path.is_dir() {
        return Err(NokvaultError::CommandFailed(
            "secure-delete works on files, not directories".into(),
        ));
    }

    let passes = match passes {
        Some(p) => p,
        None => i64::from(load_settings()?.security.delete_passes),
    };

    // Unless --force is set, ask for confirmation before destroying anything.
    if !force {
        if cli.no_prompt {
            return Err(NokvaultError::CommandFailed(
                "refusing to delete without confirmation".into(),
            )
            .with_hint("Pass --force to skip the confirmation prompt."));
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently destroy {}? This cannot be undone.",
                path.display()
            ))
            .default(false)
            .interact()
            .map_err(|e| NokvaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    secure_delete(path, passes)?;
    output::success(&format!("Securely deleted {}", path.display()));
    output::tip("SSDs and journaling filesystems may still hold copies of the old data.");
    Ok(())
}
