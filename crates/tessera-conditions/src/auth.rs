//! Requester authentication proofs backing the reserved `:userAddress`.

use serde::{Deserialize, Serialize};
use tessera_core::crypto::ed25519_verify;
use tessera_core::{Address, AuthSignerEffects, ChainId, Result, TesseraError};

/// Domain every proof is signed under.
pub const AUTH_DOMAIN: &str = "tessera";

/// Tolerated clock difference between requester and node.
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Typed message the requester signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedAuthMessage {
    /// Signing domain
    pub domain: String,
    /// Chain the proof is bound to
    pub chain: ChainId,
    /// Address being claimed
    pub address: Address,
    /// Unix seconds at signing
    pub issued_at: u64,
    /// Hex-encoded random nonce
    pub nonce: String,
}

impl TypedAuthMessage {
    /// Canonical bytes covered by the signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Signed claim that the requester controls `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProof {
    /// Claimed address
    pub address: Address,
    /// Hex-encoded verifying key
    pub public_key: String,
    /// Hex-encoded signature over the typed message
    pub signature: String,
    /// Signed message
    pub typed_data: TypedAuthMessage,
}

impl AuthProof {
    /// Ask `signer` for a fresh proof.
    pub async fn sign(
        signer: &dyn AuthSignerEffects,
        chain: ChainId,
        issued_at: u64,
        nonce: &[u8],
    ) -> Result<Self> {
        let address = signer.address();
        let typed_data = TypedAuthMessage {
            domain: AUTH_DOMAIN.to_string(),
            chain,
            address: address.clone(),
            issued_at,
            nonce: hex::encode(nonce),
        };
        let signature = signer.sign(&typed_data.signing_bytes()?).await?;
        Ok(Self {
            address,
            public_key: hex::encode(signer.public_key()),
            signature: hex::encode(signature),
            typed_data,
        })
    }

    /// Check signature, key-to-address binding and freshness.
    pub fn verify(&self, now_unix_secs: u64, max_age_secs: u64) -> Result<()> {
        if self.typed_data.domain != AUTH_DOMAIN {
            return Err(TesseraError::invalid(format!(
                "Auth proof signed for domain {:?}",
                self.typed_data.domain
            )));
        }
        if self.typed_data.address != self.address {
            return Err(TesseraError::invalid(
                "Auth proof message is for a different address",
            ));
        }

        let public_key = hex::decode(&self.public_key)
            .map_err(|e| TesseraError::invalid(format!("Auth proof key is not hex: {e}")))?;
        if Address::from_public_key(&public_key) != self.address {
            return Err(TesseraError::invalid(
                "Auth proof key does not control the claimed address",
            ));
        }

        let signature = hex::decode(&self.signature)
            .map_err(|e| TesseraError::invalid(format!("Auth proof signature is not hex: {e}")))?;
        if !ed25519_verify(&public_key, &self.typed_data.signing_bytes()?, &signature)? {
            return Err(TesseraError::invalid("Auth proof signature does not verify"));
        }

        let issued_at = self.typed_data.issued_at;
        if issued_at > now_unix_secs.saturating_add(MAX_CLOCK_SKEW_SECS) {
            return Err(TesseraError::invalid("Auth proof is issued in the future"));
        }
        if now_unix_secs.saturating_sub(issued_at) > max_age_secs {
            return Err(TesseraError::invalid(format!(
                "Auth proof expired: issued at {issued_at}, max age {max_age_secs}s"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_effects::Ed25519AuthSigner;

    async fn proof(issued_at: u64) -> AuthProof {
        let signer = Ed25519AuthSigner::from_seed([7; 32]);
        AuthProof::sign(&signer, ChainId::Sepolia, issued_at, &[1; 16])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_proof_verifies() {
        proof(1_000).await.verify(1_010, 3_600).unwrap();
    }

    #[tokio::test]
    async fn test_stale_and_future_proofs_rejected() {
        assert!(proof(1_000).await.verify(10_000, 3_600).is_err());
        assert!(proof(10_000).await.verify(1_000, 3_600).is_err());
    }

    #[tokio::test]
    async fn test_claiming_another_address_fails() {
        let mut forged = proof(1_000).await;
        forged.address = Address::from_bytes([9; 20]);
        forged.typed_data.address = forged.address.clone();
        assert!(forged.verify(1_000, 3_600).is_err());
    }

    #[tokio::test]
    async fn test_tampered_message_fails() {
        let mut tampered = proof(1_000).await;
        tampered.typed_data.chain = ChainId::Polygon;
        assert!(tampered.verify(1_000, 3_600).is_err());
    }
}
