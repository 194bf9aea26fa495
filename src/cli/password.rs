//! Password supply for the CLI.
//!
//! Sources are tried in this order:
//! 1. `--keyfile` (file contents, trailing newline trimmed)
//! 2. `--password`
//! 3. the environment variable (`NOKVAULT_PASSWORD` by default)
//! 4. an interactive prompt, unless `--no-prompt` was given
//!
//! Every result is `Zeroizing` so the password is wiped from memory on drop.

use std::path::Path;

use zeroize::Zeroizing;

use crate::crypto::keyfile::load_keyfile;
use crate::errors::{NokvaultError, Result};

/// Where a password may come from, in priority order.
#[derive(Debug, Clone)]
pub struct PasswordSource<'a> {
    pub keyfile: Option<&'a Path>,
    pub explicit: Option<&'a str>,
    pub env_var: &'a str,
    pub prompt: &'a str,
    /// Ask twice when prompting.
    pub confirm: bool,
    pub allow_prompt: bool,
}

/// Resolve a password from the first available source.
pub fn get_password(source: &PasswordSource<'_>) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(path) = source.keyfile {
        return load_keyfile(path);
    }

    if let Some(pw) = source.explicit.filter(|pw| !pw.is_empty()) {
        return Ok(Zeroizing::new(pw.as_bytes().to_vec()));
    }

    if let Ok(pw) = std::env::var(source.env_var) {
        let pw = Zeroizing::new(pw);
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw.as_bytes().to_vec()));
        }
    }

    if !source.allow_prompt {
        return Err(NokvaultError::NoPasswordSource.with_hint(format!(
            "Pass --password, --keyfile, or set {}.",
            source.env_var
        )));
    }

    prompt(source)
}

fn prompt(source: &PasswordSource<'_>) -> Result<Zeroizing<Vec<u8>>> {
    let first = Zeroizing::new(
        dialoguer::Password::new()
            .with_prompt(source.prompt)
            .interact()
            .map_err(|e| NokvaultError::CommandFailed(format!("password prompt: {e}")))?,
    );

    if source.confirm {
        let second = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Confirm password")
                .interact()
                .map_err(|e| NokvaultError::CommandFailed(format!("password prompt: {e}")))?,
        );
        if *first != *second {
            return Err(NokvaultError::PasswordMismatch);
        }
    }

    if first.is_empty() {
        return Err(NokvaultError::CommandFailed("password cannot be empty".into()));
    }
    Ok(Zeroizing::new(first.as_bytes().to_vec()))
}
