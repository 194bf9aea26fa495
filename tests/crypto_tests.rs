//! Integration tests for the nokvault crypto module.

use nokvault::crypto::{
    decrypt_data, derive_key, encrypt_data, generate_salt, KdfParams, NONCE_LEN, TAG_LEN,
};
use nokvault::keys::{KeyCache, KeyManager};
use nokvault::{ErrorKind, NokvaultError};
use proptest::prelude::*;
use std::time::Duration;

fn fast() -> KdfParams {
    KdfParams {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = b"quarterly numbers, do not share";

    let blob = encrypt_data(plaintext, &key).expect("encrypt should succeed");

    // nonce || ciphertext || tag
    assert_eq!(blob.len(), NONCE_LEN + plaintext.len() + TAG_LEN);

    let recovered = decrypt_data(&blob, &key).expect("decrypt should succeed");
    assert_eq!(recovered, plaintext);
}

#[test]
fn empty_plaintext_roundtrip() {
    let key = [0x01u8; 32];
    let blob = encrypt_data(b"", &key).unwrap();
    assert_eq!(blob.len(), NONCE_LEN + TAG_LEN);
    assert!(decrypt_data(&blob, &key).unwrap().is_empty());
}

#[test]
fn encrypt_produces_different_ciphertext_each_time() {
    let key = [0xCDu8; 32];
    let plaintext = b"same input";

    let ct1 = encrypt_data(plaintext, &key).expect("encrypt 1");
    let ct2 = encrypt_data(plaintext, &key).expect("encrypt 2");

    assert_ne!(ct1[..NONCE_LEN], ct2[..NONCE_LEN], "nonces must differ");
    assert_ne!(ct1, ct2, "two encryptions of the same plaintext must differ");
}

#[test]
fn decrypt_with_wrong_key_fails_generically() {
    let blob = encrypt_data(b"TOP_SECRET=42", &[0x11u8; 32]).expect("encrypt");
    let err = decrypt_data(&blob, &[0x22u8; 32]).unwrap_err();
    assert!(matches!(err, NokvaultError::DecryptionFailed));
}

#[test]
fn decrypt_with_truncated_data_fails() {
    let key = [0xAAu8; 32];
    assert!(decrypt_data(&[0u8; 5], &key).is_err());
    assert!(decrypt_data(&[0u8; NONCE_LEN + TAG_LEN - 1], &key).is_err());
}

#[test]
fn wrong_key_length_is_rejected_before_encrypting() {
    let err = encrypt_data(b"x", &[0u8; 16]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_single_bit_flip_is_detected(
        plaintext in proptest::collection::vec(any::<u8>(), 0..256),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = [0x5Au8; 32];
        let mut blob = encrypt_data(&plaintext, &key).unwrap();
        let i = position.index(blob.len());
        blob[i] ^= 1 << bit;
        prop_assert!(matches!(
            decrypt_data(&blob, &key),
            Err(NokvaultError::DecryptionFailed)
        ));
    }
}

// ---------------------------------------------------------------------------
// Key derivation (Argon2id)
// ---------------------------------------------------------------------------

#[test]
fn derive_key_same_inputs_same_output() {
    let salt = [7u8; 16];
    let a = derive_key(b"correct-horse", &salt, &fast()).unwrap();
    let b = derive_key(b"correct-horse", &salt, &fast()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn derive_key_differs_by_salt_and_password() {
    let a = derive_key(b"pw", &[1u8; 16], &fast()).unwrap();
    let b = derive_key(b"pw", &[2u8; 16], &fast()).unwrap();
    let c = derive_key(b"other", &[1u8; 16], &fast()).unwrap();
    assert_ne!(a, b);
    assert_ne!(a, c);
}

#[test]
fn derive_key_rejects_short_salt() {
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
fn generated_salts_are_unique() {
    assert_ne!(generate_salt(), generate_salt());
}

// ---------------------------------------------------------------------------
// Key manager & cache
// ---------------------------------------------------------------------------

#[test]
fn key_manager_rederives_same_key_from_salt() {
    let manager = KeyManager::new(fast());
    let (key, salt) = manager.derive_key_from_password(b"pw").unwrap();
    let again = manager.derive_key_from_password_and_salt(b"pw", &salt).unwrap();
    assert_eq!(key, again);
    assert!(manager.verify_password(b"pw", &salt, &key));
    assert!(!manager.verify_password(b"nope", &salt, &key));
}

#[test]
fn key_cache_expires_entries() {
    let cache = KeyCache::new(Duration::from_millis(20));
    let manager = KeyManager::new(fast());
    let (key, _) = manager.derive_key_from_password(b"pw").unwrap();

    cache.set("vault", key);
    assert!(cache.get("vault").is_some());

    std::thread::sleep(Duration::from_millis(40));
    assert!(cache.get("vault").is_none());
    assert!(cache.is_empty());
}
