use std::path::PathBuf;
use thiserror::Error;

use crate::core::directory::DirectoryReport;

/// Broad category of a [`NokvaultError`].
///
/// Callers branch on the kind rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad salt/key length or other caller-supplied input.
    InvalidInput,
    /// Not a container, unsupported version, malformed header or metadata.
    InvalidFormat,
    /// Authentication failure or a primitive refusing to run.
    Crypto,
    /// Filesystem errors, with the underlying cause attached.
    Io,
    /// Every file of a directory job failed.
    Batch,
    /// Configuration file problems.
    Config,
    /// Password supply / prompting problems in the CLI shell.
    Cli,
}

/// All errors that can occur in nokvault.
#[derive(Debug, Error)]
pub enum NokvaultError {
    // --- Input validation ---
    #[error("invalid salt length: expected {expected} bytes, got {actual}")]
    InvalidSalt { expected: usize, actual: usize },

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    // --- Container format ---
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    #[error("unsupported container version {0}")]
    UnsupportedVersion(u16),

    // --- Crypto ---
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    #[error("old password incorrect: could not decrypt container for rotation")]
    OldPasswordIncorrect,

    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    // --- Batch ---
    #[error("all {} files failed", report.failures.len())]
    BatchFailed { report: DirectoryReport },

    // --- Config ---
    #[error("config file error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    // --- Keyfile / password supply ---
    #[error("keyfile error: {0}")]
    KeyfileError(String),

    #[error("no password provided and prompting is disabled")]
    NoPasswordSource,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("command failed: {0}")]
    CommandFailed(String),

    // --- IO ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{inner}")]
    Hinted {
        #[source]
        inner: Box<NokvaultError>,
        hint: String,
    },
}

impl NokvaultError {
    /// Attach a user-facing hint at the point the error is raised.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        Self::Hinted {
            inner: Box::new(self),
            hint: hint.into(),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSalt { .. } | Self::InvalidKeyLength { .. } | Self::PathNotFound(_) => {
                ErrorKind::InvalidInput
            }
            Self::InvalidFormat(_) | Self::UnsupportedVersion(_) | Self::SerializationError(_) => {
                ErrorKind::InvalidFormat
            }
            Self::EncryptionFailed(_)
            | Self::DecryptionFailed
            | Self::OldPasswordIncorrect
            | Self::KeyDerivationFailed(_)
            | Self::CompressionFailed(_) => ErrorKind::Crypto,
            Self::BatchFailed { .. } => ErrorKind::Batch,
            Self::ConfigError(_) => ErrorKind::Config,
            Self::KeyfileError(_)
            | Self::NoPasswordSource
            | Self::PasswordMismatch
            | Self::CommandFailed(_) => ErrorKind::Cli,
            Self::Io(_) => ErrorKind::Io,
            Self::Hinted { inner, .. } => inner.kind(),
        }
    }

    /// A short suggestion for the user, if one applies.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Hinted { hint, .. } => Some(hint),
            Self::PathNotFound(_) => Some(
                "Check that the file or directory exists and you have permission to access it.",
            ),
            Self::DecryptionFailed => Some(
                "The password may be incorrect, or the file may be corrupted. Verify your password and try again.",
            ),
            Self::OldPasswordIncorrect => {
                Some("Check the old password or keyfile used to encrypt this container.")
            }
            Self::InvalidFormat(_) | Self::UnsupportedVersion(_) => Some(
                "The file may not be a nokvault container. Ensure it was encrypted with nokvault.",
            ),
            Self::KeyDerivationFailed(_) => Some(
                "This may indicate insufficient system resources or invalid [key_derivation] settings.",
            ),
            Self::NoPasswordSource => Some(
                "Use --password, --keyfile, or set the NOKVAULT_PASSWORD environment variable.",
            ),
            Self::BatchFailed { .. } => Some("Run with --verbose to see why each file failed."),
            _ => None,
        }
    }
}

/// Convenience type alias for nokvault results.
pub type Result<T> = std::result::Result<T, NokvaultError>;
