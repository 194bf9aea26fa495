//! Single-file encrypt/decrypt pipeline.
//!
//! Encrypt: read → (compress) → AES-256-GCM → header + metadata + ciphertext.
//! Decrypt: header + metadata → AES-256-GCM → (decompress) → write →
//! best-effort restore of mode and modification time.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::container::format::{read_container, write_container, Container};
use crate::container::metadata::{restore_metadata, FileMetadata};
use crate::core::compression::{self, DEFAULT_MIN_COMPRESS_SIZE};
use crate::crypto::cipher::Cipher;
use crate::crypto::kdf::{derive_key, DerivedKey, KdfParams};
use crate::errors::{NokvaultError, Result};

/// Per-invocation knobs for the single-file pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOptions {
    /// Gzip payloads before encryption (subject to `min_compress_size`).
    pub compress: bool,
    pub min_compress_size: usize,
    /// Store file metadata in the container and restore it on decrypt.
    pub preserve_metadata: bool,
    /// KDF parameters to record in the container metadata.
    pub kdf: Option<KdfParams>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            compress: false,
            min_compress_size: DEFAULT_MIN_COMPRESS_SIZE,
            preserve_metadata: true,
            kdf: None,
        }
    }
}

/// Compress (if enabled and worthwhile) and encrypt a raw buffer.
///
/// Returns `nonce || ciphertext || tag`; no header is added.
pub fn encrypt_bytes(plaintext: &[u8], key: &DerivedKey, options: &FileOptions) -> Result<Vec<u8>> {
    let cipher = Cipher::new(key.as_bytes())?;
    if options.compress && compression::should_compress(plaintext, options.min_compress_size) {
        let compressed = Zeroizing::new(compression::compress(plaintext)?);
        debug!(
            original = plaintext.len(),
            compressed = compressed.len(),
            "compressed payload"
        );
        return cipher.encrypt(&compressed);
    }
    cipher.encrypt(plaintext)
}

/// Decrypt a raw buffer and undo compression if the payload looks gzipped.
///
/// A payload that starts with the gzip magic but does not decompress is
/// returned as-is.
pub fn decrypt_bytes(ciphertext: &[u8], key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = Zeroizing::new(Cipher::new(key.as_bytes())?.decrypt(ciphertext)?);
    if compression::looks_compressed(&plaintext) {
        match compression::decompress(&plaintext) {
            Ok(decompressed) => return Ok(Zeroizing::new(decompressed)),
            Err(e) => debug!("payload has gzip magic but did not decompress, using as-is: {e}"),
        }
    }
    Ok(plaintext)
}

/// Encrypt `input` into a container at `output`.
pub fn encrypt_file(
    input: &Path,
    output: &Path,
    key: &DerivedKey,
    salt: &[u8],
    options: &FileOptions,
) -> Result<()> {
    seal_file(input, output, key, salt, None, options)
}

/// Encrypt `input`, recording `relative_path` in the metadata when given.
pub(crate) fn seal_file(
    input: &Path,
    output: &Path,
    key: &DerivedKey,
    salt: &[u8],
    relative_path: Option<&str>,
    options: &FileOptions,
) -> Result<()> {
    let metadata = if options.preserve_metadata {
        let mut meta = FileMetadata::from_path(input)?;
        if let Some(rel) = relative_path {
            meta = meta.with_relative_path(rel);
        }
        if let Some(kdf) = options.kdf {
            meta = meta.with_kdf(kdf);
        }
        Some(meta)
    } else {
        None
    };

    let plaintext = Zeroizing::new(fs::read(input)?);
    let ciphertext = encrypt_bytes(&plaintext, key, options)?;

    // Build the whole container first so a failure never leaves a
    // half-written output file.
    let mut buf = Vec::with_capacity(ciphertext.len() + 512);
    write_container(&mut buf, salt, metadata.as_ref(), &ciphertext)?;
    write_private(output, &buf)?;

    debug!(input = %input.display(), output = %output.display(), "encrypted file");
    Ok(())
}

/// Decrypt the container at `input` with an already-derived key.
pub fn decrypt_file(
    input: &Path,
    output: &Path,
    key: &DerivedKey,
    options: &FileOptions,
) -> Result<()> {
    decrypt_file_with(input, output, key, options, restore_metadata)
}

/// Same as [`decrypt_file`], with the metadata restore step supplied by
/// the caller.
pub(crate) fn decrypt_file_with(
    input: &Path,
    output: &Path,
    key: &DerivedKey,
    options: &FileOptions,
    restore: RestoreFn,
) -> Result<()> {
    let container = read_container(input)?;
    open_to_path(&container, key, output, options, restore)?;
    debug!(input = %input.display(), output = %output.display(), "decrypted file");
    Ok(())
}

/// Decrypt the container at `input`, deriving the key from `password`
/// and the container's salt.
///
/// KDF parameters recorded in the container take precedence over
/// `default_params`.
pub fn decrypt_file_with_password(
    input: &Path,
    output: &Path,
    password: &[u8],
    default_params: &KdfParams,
    options: &FileOptions,
) -> Result<()> {
    let container = read_container(input)?;
    let params = container_kdf(&container, default_params)?;
    let key = derive_key(password, &container.header.salt, &params)?;
    open_to_path(&container, &key, output, options, restore_metadata)
}

/// The KDF parameters a container was sealed with, if it says so.
pub(crate) fn container_kdf(container: &Container, default_params: &KdfParams) -> Result<KdfParams> {
    let recorded = match &container.metadata {
        Some(meta) => meta.recorded_kdf()?,
        None => None,
    };
    Ok(recorded.unwrap_or(*default_params))
}

type RestoreFn = fn(&Path, &FileMetadata) -> Vec<NokvaultError>;

fn open_to_path(
    container: &Container,
    key: &DerivedKey,
    output: &Path,
    options: &FileOptions,
    restore: RestoreFn,
) -> Result<()> {
    let plaintext = decrypt_bytes(&container.ciphertext, key)?;
    write_private(output, &plaintext)?;

    if options.preserve_metadata {
        if let Some(meta) = &container.metadata {
            for failure in restore(output, meta) {
                warn!(path = %output.display(), "could not restore metadata: {failure}");
            }
        }
    }
    Ok(())
}

/// Create or truncate `path` with owner-only permissions and write `data`.
pub(crate) fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}
