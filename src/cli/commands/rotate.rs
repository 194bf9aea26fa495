//! `nokvault rotate-key`: re-encrypt a container under a new password.
//!
//! The old password comes from the global `--password` / `--keyfile`
//! flags (or `NOKVAULT_PASSWORD`), the new one from `--new-password` /
//! `--new-keyfile` (or `NOKVAULT_NEW_PASSWORD`).

use std::path::Path;

use crate::cli::output;
use crate::cli::password::{get_password, PasswordSource};
use crate::cli::{load_settings, password_source, require_exists, Cli, NEW_PASSWORD_ENV};
use crate::core::rotate::rotate_key;
use crate::errors::{NokvaultError, Result};

/// Execute the `rotate-key` command.
pub fn execute(
    cli: &Cli,
    path: &Path,
    new_password: Option<&str>,
    new_keyfile: Option<&Path>,
) -> Result<()> {
    require_exists(path)?;
    if path.is_dir() {
        return Err(NokvaultError::CommandFailed(
            "rotate-key works on a single container".into(),
        ));
    }
    let settings = load_settings()?;

    if !cli.no_prompt {
        output::info("Enter the current password.");
    }
    let old = get_password(&password_source(cli, "Current password", false))?;

    if !cli.no_prompt {
        output::info("Choose the new password.");
    }
    let new = get_password(&PasswordSource {
        keyfile: new_keyfile,
        explicit: new_password,
        env_var: NEW_PASSWORD_ENV,
        prompt: "New password",
        confirm: true,
        allow_prompt: !cli.no_prompt,
    })?;

    rotate_key(path, &old, &new, &settings.kdf_params())?;

    output::success(&format!("Rotated key for {}", path.display()));
    Ok(())
}
