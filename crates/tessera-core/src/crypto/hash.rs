//! Pure synchronous hashing for content addressing
//!
//! Hashing is deterministic and side-effect free, so it is not an effect.
//! The algorithm is selected once here; every caller goes through [`hash`] or
//! [`hasher`].
//!
//! Current algorithm: **SHA-256** (32-byte output)

use sha2::{Digest, Sha256};

/// Incremental hasher over the selected algorithm
#[derive(Debug, Clone, Default)]
pub struct Hasher(Sha256);

impl Hasher {
    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.0.update(data);
        self
    }

    /// Finalize and return the 32-byte digest
    pub fn finalize(self) -> [u8; 32] {
        let mut output = [0u8; 32];
        output.copy_from_slice(&self.0.finalize());
        output
    }
}

/// Hash arbitrary bytes to a 32-byte digest
#[inline]
pub fn hash(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Sha256::digest(data));
    output
}

/// Create an incremental hasher
#[inline]
pub fn hasher() -> Hasher {
    Hasher::default()
}
