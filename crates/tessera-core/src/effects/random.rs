//! Randomness effect.

/// Source of randomness.
///
/// Synchronous: randomness is local and never blocks on I/O. Deterministic
/// handlers make protocol runs reproducible in tests.
pub trait RandomEffects: Send + Sync {
    /// Fill a fresh buffer of `len` random bytes
    fn random_bytes(&self, len: usize) -> Vec<u8>;

    /// 32 random bytes
    fn random_bytes_32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.random_bytes(32));
        out
    }

    /// 12 random bytes, sized for AEAD nonces
    fn random_nonce(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out.copy_from_slice(&self.random_bytes(12));
        out
    }
}

impl<T: RandomEffects + ?Sized> RandomEffects for std::sync::Arc<T> {
    fn random_bytes(&self, len: usize) -> Vec<u8> {
        (**self).random_bytes(len)
    }
}
