//! In-place key rotation for a single container.
//!
//! The payload is decrypted with the old password, re-sealed under a key
//! derived from the new password and a fresh salt, written to a temporary
//! file beside the original and moved over it with a rename.  The original
//! container is never opened for writing.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::container::format::{read_container, write_container};
use crate::core::file::{container_kdf, write_private};
use crate::crypto::cipher::Cipher;
use crate::crypto::kdf::{derive_key, generate_salt, KdfParams};
use crate::errors::{NokvaultError, Result};

/// Re-encrypt the container at `path` under `new_password`.
///
/// `params` are used for the new key, and for the old key when the
/// container does not record its own.
pub fn rotate_key(
    path: &Path,
    old_password: &[u8],
    new_password: &[u8],
    params: &KdfParams,
) -> Result<()> {
    rotate_key_with(path, old_password, new_password, params, |from, to| {
        fs::rename(from, to)
    })
}

/// Same as [`rotate_key`], with the final replace step supplied by the caller.
pub fn rotate_key_with<F>(
    path: &Path,
    old_password: &[u8],
    new_password: &[u8],
    params: &KdfParams,
    rename: F,
) -> Result<()>
where
    F: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let container = read_container(path)?;

    let old_key = derive_key(
        old_password,
        &container.header.salt,
        &container_kdf(&container, params)?,
    )?;
    // The payload is re-sealed as stored: a compressed payload stays compressed.
    let payload = Zeroizing::new(
        Cipher::new(old_key.as_bytes())?
            .decrypt(&container.ciphertext)
            .map_err(|_| NokvaultError::OldPasswordIncorrect)?,
    );
    drop(old_key);

    let new_salt = generate_salt();
    let new_key = derive_key(new_password, &new_salt, params)?;
    let ciphertext = Cipher::new(new_key.as_bytes())?.encrypt(&payload)?;

    let metadata = container.metadata.map(|m| m.with_kdf(*params));
    let mut buf = Vec::with_capacity(ciphertext.len() + 512);
    write_container(&mut buf, &new_salt, metadata.as_ref(), &ciphertext)?;

    let tmp = temp_path(path);
    if let Err(e) = write_private(&tmp, &buf) {
        remove_temp(&tmp);
        return Err(e.with_hint("The original container was left unchanged."));
    }
    debug!(tmp = %tmp.display(), "wrote rotated container");

    if let Err(e) = rename(&tmp, path) {
        remove_temp(&tmp);
        return Err(NokvaultError::Io(e)
            .with_hint("The original container was left unchanged."));
    }

    info!(path = %path.display(), "rotated container key");
    Ok(())
}

fn remove_temp(tmp: &Path) {
    match fs::remove_file(tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(tmp = %tmp.display(), "could not remove temporary file: {e}"),
    }
}

/// `<path>.tmp`, beside the original.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
