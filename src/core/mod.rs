//! Core module: the file and directory operations.
//!
//! This module provides:
//! - The single-file encrypt/decrypt pipeline (`file`)
//! - Recursive directory jobs with partial-failure reporting (`directory`)
//! - Progress events for directory jobs (`progress`)
//! - Optional gzip compression of payloads (`compression`)
//! - In-place key rotation (`rotate`)
//! - Multi-pass secure deletion (`shred`)

pub mod compression;
pub mod directory;
pub mod file;
pub mod progress;
pub mod rotate;
pub mod shred;

pub use directory::{
    decrypt_directory, encrypt_directory, find_first_container, DirectoryReport, EntryState,
    FileFailure,
};
pub use file::{
    decrypt_bytes, decrypt_file, decrypt_file_with_password, encrypt_bytes, encrypt_file,
    FileOptions,
};
pub use progress::{Outcome, ProgressEvent};
pub use rotate::{rotate_key, rotate_key_with};
pub use shred::{overwrite_pattern, secure_delete, DEFAULT_PASSES};
