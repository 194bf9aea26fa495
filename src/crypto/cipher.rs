//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::crypto::kdf::KEY_LEN;
use crate::errors::{NokvaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// An AES-256-GCM cipher bound to one key.
pub struct Cipher {
    aead: Aes256Gcm,
}

impl Cipher {
    /// Build a cipher from raw key bytes.  Only 32-byte keys are accepted.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(NokvaultError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: key.len(),
            });
        }
        let aead = Aes256Gcm::new_from_slice(key).map_err(|_| NokvaultError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        Ok(Self { aead })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    ///
    /// Returns the nonce prepended to the ciphertext (nonce || ciphertext || tag).
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|e| NokvaultError::EncryptionFailed(format!("AES-GCM seal: {e}")))?;

        // Prepend the nonce so the caller only needs to store one blob.
        let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    /// Decrypt data that was produced by `encrypt`.
    ///
    /// Wrong key, truncation and tampering all surface as the same
    /// `DecryptionFailed` error.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(NokvaultError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.aead
            .decrypt(nonce, ciphertext)
            .map_err(|_| NokvaultError::DecryptionFailed)
    }
}

/// Encrypt `plaintext` with a 32-byte `key`.
pub fn encrypt_data(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    Cipher::new(key)?.encrypt(plaintext)
}

/// Decrypt a `nonce || ciphertext || tag` blob with a 32-byte `key`.
pub fn decrypt_data(blob: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    Cipher::new(key)?.decrypt(blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let key = [0x11u8; 32];
        let blob = encrypt_data(b"payload", &key).unwrap();
        assert_eq!(blob.len(), NONCE_LEN + 7 + TAG_LEN);
        assert_eq!(decrypt_data(&blob, &key).unwrap(), b"payload");
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let key = [0x22u8; 32];
        let blob = encrypt_data(b"", &key).unwrap();
        assert_eq!(blob.len(), NONCE_LEN + TAG_LEN);
        assert!(decrypt_data(&blob, &key).unwrap().is_empty());
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        for len in [0usize, 16, 24, 31, 33, 64] {
            let key = vec![0u8; len];
            let err = Cipher::new(&key).err().unwrap();
            assert!(matches!(err, NokvaultError::InvalidKeyLength { .. }));
        }
    }

    #[test]
    fn input_shorter_than_nonce_plus_tag_fails() {
        let key = [0x33u8; 32];
        let err = decrypt_data(&[0u8; NONCE_LEN + TAG_LEN - 1], &key).unwrap_err();
        assert!(matches!(err, NokvaultError::DecryptionFailed));
    }
}
