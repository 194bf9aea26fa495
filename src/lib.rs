//! nokvault: password-based encryption of files and directory trees into
//! self-describing containers.
//!
//! The library is usable without the CLI:
//!
//! - [`crypto`]: Argon2id key derivation, AES-256-GCM, keyfiles
//! - [`container`]: the binary container format and file metadata
//! - [`core`]: file and directory pipelines, key rotation, secure deletion
//! - [`keys`]: key manager and key cache
//! - [`config`]: layered TOML settings

pub mod cli;
pub mod config;
pub mod container;
pub mod core;
pub mod crypto;
pub mod errors;
pub mod keys;

pub use crate::core::{
    decrypt_directory, decrypt_file, decrypt_file_with_password, encrypt_directory, encrypt_file,
    rotate_key, secure_delete, DirectoryReport, FileOptions, ProgressEvent,
};
pub use crate::crypto::{decrypt_data, derive_key, encrypt_data, DerivedKey, KdfParams};
pub use crate::errors::{ErrorKind, NokvaultError, Result};
pub use crate::keys::{KeyCache, KeyManager};
