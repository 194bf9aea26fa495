//! Cryptographic primitives for nokvault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`cipher`)
//! - Argon2id password-based key derivation (`kdf`)
//! - Keyfiles as an alternative password source (`keyfile`)

pub mod cipher;
pub mod kdf;
pub mod keyfile;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt_data, decrypt_data, derive_key, ...};
pub use cipher::{decrypt_data, encrypt_data, Cipher, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_key, generate_salt, keys_equal, DerivedKey, KdfParams, Salt, KEY_LEN, SALT_LEN};
pub use keyfile::{generate_keyfile, load_keyfile};
