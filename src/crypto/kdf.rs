//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  Parameters are configurable via `KdfParams`
//! (loaded from `.nokvault.toml` or sensible defaults).

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{NokvaultError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Upper bounds for parameters read back from a container (4 GiB, 64, 64).
const MAX_STORED_MEMORY_KIB: u32 = 4 * 1024 * 1024;
const MAX_STORED_ITERATIONS: u32 = 64;
const MAX_STORED_PARALLELISM: u32 = 64;

/// A KDF salt as stored in the container header.
pub type Salt = [u8; SALT_LEN];

/// Configurable Argon2id parameters.
///
/// These map 1:1 to the `[key_derivation]` table in `Settings`.  They are
/// also recorded in container metadata so a file can be re-opened with the
/// parameters it was sealed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Check parameters that came from container metadata.
    ///
    /// The metadata block is not authenticated, so anything outside the
    /// range a sealing run could have produced is a malformed container.
    pub fn validate_untrusted(&self) -> Result<()> {
        let in_range = (MIN_MEMORY_KIB..=MAX_STORED_MEMORY_KIB).contains(&self.memory_kib)
            && (1..=MAX_STORED_ITERATIONS).contains(&self.iterations)
            && (1..=MAX_STORED_PARALLELISM).contains(&self.parallelism);
        if in_range {
            Ok(())
        } else {
            Err(NokvaultError::InvalidFormat(format!(
                "container records out-of-range KDF parameters \
                 (memory_kib={}, iterations={}, parallelism={})",
                self.memory_kib, self.iterations, self.parallelism
            )))
        }
    }
}

/// A 32-byte symmetric key that wipes itself when dropped.
///
/// Equality is constant-time.  `Debug` never prints the key bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Copy a key out of a slice, rejecting any length other than 32.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| NokvaultError::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self::new(arr))
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Explicit copy; keys are never cloned implicitly.
    pub fn duplicate(&self) -> Self {
        Self::new(self.bytes)
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        keys_equal(&self.bytes, &other.bytes)
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive a 32-byte key from a password and a 16-byte salt.
///
/// The same password + salt + params will always produce the same key.
/// Enforces minimum Argon2 parameters to prevent dangerously weak KDF settings.
pub fn derive_key(password: &[u8], salt: &[u8], kdf: &KdfParams) -> Result<DerivedKey> {
    if salt.len() != SALT_LEN {
        return Err(NokvaultError::InvalidSalt {
            expected: SALT_LEN,
            actual: salt.len(),
        });
    }
    if kdf.memory_kib < MIN_MEMORY_KIB {
        return Err(NokvaultError::KeyDerivationFailed(format!(
            "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
            kdf.memory_kib
        )));
    }
    if kdf.iterations < 1 {
        return Err(NokvaultError::KeyDerivationFailed(
            "Argon2 iterations must be at least 1".into(),
        ));
    }
    if kdf.parallelism < 1 {
        return Err(NokvaultError::KeyDerivationFailed(
            "Argon2 parallelism must be at least 1".into(),
        ));
    }

    let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(KEY_LEN))
        .map_err(|e| NokvaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    let hashed = argon2.hash_password_into(password, salt, &mut key);
    let derived = DerivedKey::new(key);
    key.zeroize();
    hashed
        .map_err(|e| NokvaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(derived)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> Salt {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Compare two byte strings in constant time.
///
/// Slices of different length compare unequal without inspecting contents.
pub fn keys_equal(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn same_inputs_same_key() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key(b"pw", &salt, &fast()).unwrap();
        let b = derive_key(b"pw", &salt, &fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn stored_params_are_bounded() {
        assert!(fast().validate_untrusted().is_ok());
        assert!(KdfParams::default().validate_untrusted().is_ok());

        for bad in [
            KdfParams { iterations: u32::MAX, ..fast() },
            KdfParams { iterations: 0, ..fast() },
            KdfParams { memory_kib: u32::MAX, ..fast() },
            KdfParams { memory_kib: 1, ..fast() },
            KdfParams { parallelism: 65, ..fast() },
        ] {
            let err = bad.validate_untrusted().unwrap_err();
            assert!(matches!(err, NokvaultError::InvalidFormat(_)), "{bad:?}");
        }
    }

    #[test]
    fn rejects_short_salt() {
        let err = derive_key(b"pw", &[0u8; 8], &fast()).unwrap_err();
        assert!(matches!(
            err,
            NokvaultError::InvalidSalt {
                expected: 16,
                actual: 8
            }
        ));
    }

    #[test]
    fn rejects_weak_params() {
        let weak = KdfParams {
            memory_kib: 1024,
            ..fast()
        };
        assert!(derive_key(b"pw", &[0u8; SALT_LEN], &weak).is_err());

        let zero_iter = KdfParams {
            iterations: 0,
            ..fast()
        };
        assert!(derive_key(b"pw", &[0u8; SALT_LEN], &zero_iter).is_err());
    }

    #[test]
    fn keys_equal_handles_length_mismatch() {
        assert!(keys_equal(b"abc", b"abc"));
        assert!(!keys_equal(b"abc", b"abd"));
        assert!(!keys_equal(b"abc", b"abcd"));
    }

    #[test]
    fn debug_is_redacted() {
        let key = DerivedKey::new([0x41; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "DerivedKey([REDACTED])");
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(DerivedKey::from_slice(&[0u8; 31]).is_err());
        assert!(DerivedKey::from_slice(&[0u8; 32]).is_ok());
    }
}
