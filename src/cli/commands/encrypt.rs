//! `nokvault encrypt`: seal a file or a directory tree.
//!
//! A single salt is generated per invocation; every file of a directory
//! job is encrypted under the same derived key.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::password::get_password;
use crate::cli::{load_settings, password_source, require_exists, Cli};
use crate::container::format::CONTAINER_SUFFIX;
use crate::core::directory::encrypt_directory;
use crate::core::file::encrypt_file;
use crate::errors::Result;
use crate::keys::KeyManager;

/// Execute the `encrypt` command.
pub fn execute(
    cli: &Cli,
    path: &Path,
    output_path: Option<&Path>,
    compress: bool,
    no_compress: bool,
    dry_run: bool,
) -> Result<()> {
    require_exists(path)?;
    let target = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(path));

    if dry_run {
        output::info(&format!(
            "Would encrypt: {} -> {}",
            path.display(),
            target.display()
        ));
        return Ok(());
    }

    let settings = load_settings()?;
    let mut options = settings.file_options();
    if compress {
        options.compress = true;
    } else if no_compress {
        options.compress = false;
    }

    let password = get_password(&password_source(cli, "Enter encryption password", true))?;
    let manager = KeyManager::new(settings.kdf_params());
    let (key, salt) = manager.derive_key_from_password(&password)?;
    drop(password);

    if path.is_dir() {
        let report = output::run_with_progress(|tx| {
            encrypt_directory(path, &target, &key, &salt, &options, Some(tx))
        });
        return output::finish_directory(report);
    }

    encrypt_file(path, &target, &key, &salt, &options)?;
    output::success(&format!(
        "Encrypted: {} -> {}",
        path.display(),
        target.display()
    ));
    output::tip("Use `nokvault secure-delete` to destroy the plaintext original.");
    Ok(())
}

/// `<path>.nokvault`
pub fn default_output(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(CONTAINER_SUFFIX);
    PathBuf::from(name)
}
