//! Keyfile support.
//!
//! A keyfile stands in for a typed password: its raw bytes are fed to
//! Argon2id exactly as a password would be.  A single trailing newline
//! is stripped so keyfiles written by editors or `echo` behave the same
//! as ones written by `generate_keyfile`.

use std::fs;
use std::path::Path;

use rand::RngCore;
use zeroize::Zeroizing;

use crate::errors::{NokvaultError, Result};

/// Length of a generated keyfile in bytes (256 bits).
pub const KEYFILE_LEN: usize = 32;

/// Generate a new random keyfile and write it to `path`.
///
/// The file is written with restrictive permissions (owner-only read).
/// Returns the raw keyfile bytes so the caller can use them immediately.
pub fn generate_keyfile(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    if path.exists() {
        return Err(NokvaultError::KeyfileError(format!(
            "keyfile already exists at {}",
            path.display()
        )));
    }

    let mut keyfile = Zeroizing::new(vec![0u8; KEYFILE_LEN]);
    rand::rng().fill_bytes(&mut keyfile);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                NokvaultError::KeyfileError(format!("cannot create keyfile directory: {e}"))
            })?;
        }
    }

    fs::write(path, keyfile.as_slice())
        .map_err(|e| NokvaultError::KeyfileError(format!("failed to write keyfile: {e}")))?;

    // On Unix, restrict permissions to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms).map_err(|e| {
            NokvaultError::KeyfileError(format!("failed to set keyfile permissions: {e}"))
        })?;
    }

    Ok(keyfile)
}

/// Load a keyfile from disk, trimming one trailing newline.
pub fn load_keyfile(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    if !path.exists() {
        return Err(NokvaultError::KeyfileError(format!(
            "keyfile not found at {}",
            path.display()
        )));
    }

    let mut data = Zeroizing::new(
        fs::read(path)
            .map_err(|e| NokvaultError::KeyfileError(format!("failed to read keyfile: {e}")))?,
    );

    if data.last() == Some(&b'\n') {
        data.pop();
    }

    if data.is_empty() {
        return Err(NokvaultError::KeyfileError(format!(
            "keyfile at {} is empty",
            path.display()
        )));
    }

    Ok(data)
}
