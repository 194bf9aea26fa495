//! File metadata carried inside a container, and its capture/restore.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use filetime::FileTime;
use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::errors::{NokvaultError, Result};

/// Metadata of the original file, stored as JSON between the header and
/// the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Base name of the original file.
    pub name: String,

    /// Size of the original plaintext in bytes.
    pub size: u64,

    /// Permission bits (`st_mode & 0o7777` on Unix).
    pub mode: u32,

    /// Last modification time.
    pub mod_time: DateTime<Utc>,

    pub is_dir: bool,

    /// Path relative to the root of the directory job, or the base name
    /// for single-file encryption.
    pub relative_path: String,

    /// KDF parameters the container key was derived with.
    /// Absent in containers written without this information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<KdfParams>,
}

impl FileMetadata {
    /// Capture metadata from a file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let info = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = info.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Ok(Self {
            relative_path: name.clone(),
            name,
            size: info.len(),
            mode: mode_bits(&info),
            mod_time: DateTime::<Utc>::from(modified),
            is_dir: info.is_dir(),
            kdf: None,
        })
    }

    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = relative_path.into();
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = Some(kdf);
        self
    }

    /// The recorded KDF parameters, rejected when out of range.
    pub fn recorded_kdf(&self) -> Result<Option<KdfParams>> {
        match self.kdf {
            Some(kdf) => {
                kdf.validate_untrusted()?;
                Ok(Some(kdf))
            }
            None => Ok(None),
        }
    }
}

#[cfg(unix)]
fn mode_bits(info: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    info.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(info: &fs::Metadata) -> u32 {
    if info.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Apply the stored mode and modification time to `path`.
///
/// The two steps are independent: a failure in one does not skip the
/// other.  Every failure is returned so the caller can report it as a
/// warning.
pub fn restore_metadata(path: &Path, metadata: &FileMetadata) -> Vec<NokvaultError> {
    let mut failures = Vec::new();

    if let Err(e) = set_mode(path, metadata.mode) {
        failures.push(e);
    }

    let mtime = FileTime::from_system_time(SystemTime::from(metadata.mod_time));
    if let Err(e) = filetime::set_file_mtime(path, mtime) {
        failures.push(NokvaultError::Io(e));
    }

    failures
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, perms)?;
    Ok(())
}
