//! Key management: password → key derivation with configured parameters,
//! and a short-lived in-memory key cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::crypto::kdf::{derive_key, generate_salt, keys_equal, DerivedKey, KdfParams, Salt};
use crate::errors::Result;

/// Derives keys from passwords using one fixed set of KDF parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyManager {
    params: KdfParams,
}

impl KeyManager {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Derive a key under a freshly generated salt.
    pub fn derive_key_from_password(&self, password: &[u8]) -> Result<(DerivedKey, Salt)> {
        let salt = generate_salt();
        let key = derive_key(password, &salt, &self.params)?;
        Ok((key, salt))
    }

    /// Re-derive a key from a password and an existing salt.
    pub fn derive_key_from_password_and_salt(
        &self,
        password: &[u8],
        salt: &[u8],
    ) -> Result<DerivedKey> {
        derive_key(password, salt, &self.params)
    }

    /// Check a password against a known key without leaking timing.
    pub fn verify_password(&self, password: &[u8], salt: &[u8], expected: &DerivedKey) -> bool {
        match self.derive_key_from_password_and_salt(password, salt) {
            Ok(derived) => keys_equal(derived.as_bytes(), expected.as_bytes()),
            Err(_) => false,
        }
    }
}

struct CachedKey {
    key: DerivedKey,
    expires_at: Instant,
}

/// Keys cached by an identifier (typically a container path) for `ttl`.
///
/// All access goes through a single lock, so a cache can be shared
/// between threads behind an `Arc`.  Evicted keys are zeroized on drop.
pub struct KeyCache {
    entries: Mutex<HashMap<String, CachedKey>>,
    ttl: Duration,
}

impl KeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedKey>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return a copy of the cached key if it exists and has not expired.
    pub fn get(&self, key_id: &str) -> Option<DerivedKey> {
        let mut entries = self.lock();
        let expired = match entries.get(key_id) {
            None => return None,
            Some(cached) => Instant::now() >= cached.expires_at,
        };
        if expired {
            entries.remove(key_id);
            return None;
        }
        entries.get(key_id).map(|cached| cached.key.duplicate())
    }

    /// Store a key, replacing any previous entry for the same id.
    pub fn set(&self, key_id: &str, key: DerivedKey) {
        let expires_at = Instant::now() + self.ttl;
        self.lock()
            .insert(key_id.to_string(), CachedKey { key, expires_at });
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, cached| now < cached.expires_at);
        before - entries.len()
    }

    /// Remove all cached keys.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn fast() -> KdfParams {
        KdfParams {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn derive_with_fresh_salt_then_rederive() {
        let km = KeyManager::new(fast());
        let (key, salt) = km.derive_key_from_password(b"correct-horse").unwrap();
        let again = km
            .derive_key_from_password_and_salt(b"correct-horse", &salt)
            .unwrap();
        assert_eq!(key, again);
    }

    #[test]
    fn fresh_salts_give_unrelated_keys() {
        let km = KeyManager::new(fast());
        let (k1, s1) = km.derive_key_from_password(b"pw").unwrap();
        let (k2, s2) = km.derive_key_from_password(b"pw").unwrap();
        assert_ne!(s1, s2);
        assert_ne!(k1, k2);
    }

    #[test]
    fn verify_password_accepts_right_and_rejects_wrong() {
        let km = KeyManager::new(fast());
        let (key, salt) = km.derive_key_from_password(b"right").unwrap();
        assert!(km.verify_password(b"right", &salt, &key));
        assert!(!km.verify_password(b"wrong", &salt, &key));
        assert!(!km.verify_password(b"right", &salt[..8], &key));
    }

    #[test]
    fn cache_get_set_clear() {
        let cache = KeyCache::new(Duration::from_secs(60));
        assert!(cache.get("a").is_none());

        cache.set("a", DerivedKey::new([1u8; 32]));
        assert_eq!(cache.get("a").unwrap().as_bytes(), &[1u8; 32]);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_expires_entries() {
        let cache = KeyCache::new(Duration::ZERO);
        cache.set("a", DerivedKey::new([1u8; 32]));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());

        cache.set("b", DerivedKey::new([2u8; 32]));
        assert_eq!(cache.purge_expired(), 1);
    }

    #[test]
    fn cache_is_shareable_across_threads() {
        let cache = Arc::new(KeyCache::new(Duration::from_secs(60)));
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let id = format!("k{i}");
                    cache.set(&id, DerivedKey::new([i; 32]));
                    cache.get(&id).map(|k| k.as_bytes()[0])
                })
            })
            .collect();

        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), Some(i as u8));
        }
        assert_eq!(cache.len(), 8);
    }
}
