//! `nokvault decrypt`: open a container or a directory of containers.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::password::get_password;
use crate::cli::{load_settings, password_source, require_exists, Cli};
use crate::container::format::{read_header_with_metadata, CONTAINER_SUFFIX};
use crate::core::directory::{decrypt_directory, find_first_container};
use crate::core::file::decrypt_file_with_password;
use crate::errors::Result;
use crate::keys::KeyManager;

/// Execute the `decrypt` command.
pub fn execute(cli: &Cli, path: &Path, output_path: Option<&Path>, dry_run: bool) -> Result<()> {
    require_exists(path)?;
    let target = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(path));

    if dry_run {
        output::info(&format!(
            "Would decrypt: {} -> {}",
            path.display(),
            target.display()
        ));
        return Ok(());
    }

    let settings = load_settings()?;
    let options = settings.file_options();

    if !path.is_dir() {
        let password = get_password(&password_source(cli, "Enter decryption password", false))?;
        decrypt_file_with_password(path, &target, &password, &settings.kdf_params(), &options)?;
        output::success(&format!(
            "Decrypted: {} -> {}",
            path.display(),
            target.display()
        ));
        return Ok(());
    }

    // Every container of a directory job shares one salt; read it from
    // the first one found.
    let Some(first) = find_first_container(path)? else {
        output::info(&format!("No {CONTAINER_SUFFIX} files found in {}", path.display()));
        return Ok(());
    };
    let (header, metadata) = read_header_with_metadata(&mut File::open(&first)?)?;
    let recorded = match &metadata {
        Some(meta) => meta.recorded_kdf()?,
        None => None,
    };
    let params = recorded.unwrap_or_else(|| settings.kdf_params());

    let password = get_password(&password_source(cli, "Enter decryption password", false))?;
    let key = KeyManager::new(params).derive_key_from_password_and_salt(&password, &header.salt)?;
    drop(password);

    let report = output::run_with_progress(|tx| {
        decrypt_directory(path, &target, &key, &options, Some(tx))
    });
    output::finish_directory(report)
}

/// Strip `.nokvault` from the path, or append `.decrypted` if it has none.
pub fn default_output(path: &Path) -> PathBuf {
    let s = path.as_os_str().to_string_lossy();
    match s.strip_suffix(CONTAINER_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => {
            let mut name = OsString::from(path.as_os_str());
            name.push(".decrypted");
            PathBuf::from(name)
        }
    }
}
