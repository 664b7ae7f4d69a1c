//! Requester authentication signer.

use crate::errors::Result;
use crate::identifiers::Address;
use async_trait::async_trait;

/// Signs on behalf of the requester.
///
/// Backs the reserved requester-address context parameter: every resolution
/// asks for a fresh signature.
#[async_trait]
pub trait AuthSignerEffects: Send + Sync {
    /// Account address of the signer
    fn address(&self) -> Address;

    /// Verifying key bytes
    fn public_key(&self) -> Vec<u8>;

    /// Sign arbitrary bytes
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}
