//! Threshold ElGamal over Ristretto
//!
//! A dealer splits the ritual secret `s` with a Shamir polynomial; the ritual
//! public key is `P = s·G`. Encryption picks `r`, publishes the header
//! `U = r·G`, and keys ChaCha20-Poly1305 from `K = r·P`. Participant `i`
//! answers with `D_i = s_i·U`; any `threshold` of them recover `K` by Lagrange
//! interpolation at zero.
//!
//! The header also carries a Schnorr proof of knowledge of `r` whose challenge
//! hashes the associated data, so `U` cannot be re-labelled with different
//! conditions: participants refuse to produce a share unless the proof
//! verifies against the associated data they were shown.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use hkdf::Hkdf;
use sha2::{Digest, Sha256, Sha512};
use std::collections::BTreeSet;
use std::fmt;
use tessera_core::crypto::NONCE_LEN;
use tracing::{debug, trace};
use tessera_core::{
    Ciphertext, CiphertextHeader, DecryptionShare, DecryptionShareEffects, DkgPublicKey,
    RandomEffects, Result, TesseraError, ThresholdCryptoEffects, ThresholdSharedSecret,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

const KDF_SALT: &[u8] = b"tessera-threshold-v1";
const KDF_INFO: &[u8] = b"tessera-threshold-payload";
const CHALLENGE_DOMAIN: &[u8] = b"tessera-threshold-header-v1";

/// Encoded header length: `U`, then the proof challenge and response.
pub const HEADER_LEN: usize = 32 * 3;

/// Encoded share length: 4-byte index followed by a compressed point.
pub const SHARE_LEN: usize = 4 + 32;

/// One participant's slice of the ritual secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyShare {
    index: u32,
    secret: Scalar,
}

impl KeyShare {
    /// Evaluation point of this share (1-based).
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Debug for KeyShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyShare")
            .field("index", &self.index)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Polynomial `f(x) = a_0 + a_1·x + … + a_{t-1}·x^{t-1}` with `a_0` the secret.
#[derive(Zeroize, ZeroizeOnDrop)]
struct ShamirPolynomial {
    coefficients: Vec<Scalar>,
}

impl ShamirPolynomial {
    fn random(threshold: usize, random: &dyn RandomEffects) -> Self {
        Self {
            coefficients: (0..threshold).map(|_| random_scalar(random)).collect(),
        }
    }

    fn secret(&self) -> Scalar {
        self.coefficients.first().copied().unwrap_or(Scalar::ZERO)
    }

    /// Horner evaluation.
    fn evaluate(&self, x: Scalar) -> Scalar {
        self.coefficients
            .iter()
            .rev()
            .fold(Scalar::ZERO, |acc, coeff| acc * x + coeff)
    }
}

/// Dealer key generation: the ritual public key and one share per participant,
/// in participant order.
pub fn generate_key_shares(
    threshold: usize,
    shares: usize,
    random: &dyn RandomEffects,
) -> Result<(DkgPublicKey, Vec<KeyShare>)> {
    if threshold == 0 || threshold > shares {
        return Err(TesseraError::invalid(format!(
            "Threshold must be in 1..={shares}, got {threshold}"
        )));
    }
    let count = u32::try_from(shares)
        .map_err(|_| TesseraError::invalid("Too many shares for a ritual"))?;

    let polynomial = ShamirPolynomial::random(threshold, random);
    let public_key = (RISTRETTO_BASEPOINT_POINT * polynomial.secret())
        .compress()
        .to_bytes()
        .to_vec();
    let key_shares = (1..=count)
        .map(|index| KeyShare {
            index,
            secret: polynomial.evaluate(Scalar::from(index)),
        })
        .collect();

    debug!(threshold, shares, "Dealt ritual key shares");
    Ok((DkgPublicKey(public_key), key_shares))
}

/// Requester-side threshold handler
#[derive(Debug, Clone)]
pub struct RistrettoThresholdHandler<R: RandomEffects> {
    random: R,
}

impl<R: RandomEffects> RistrettoThresholdHandler<R> {
    /// Create a handler drawing encryption randomness from `random`
    pub fn new(random: R) -> Self {
        Self { random }
    }
}

#[async_trait::async_trait]
impl<R: RandomEffects> ThresholdCryptoEffects for RistrettoThresholdHandler<R> {
    async fn encrypt(
        &self,
        plaintext: &[u8],
        public_key: &DkgPublicKey,
        aad: &[u8],
    ) -> Result<Ciphertext> {
        let ritual_key = decompress(public_key.as_bytes(), "ritual public key")?;
        let mut r = random_scalar(&self.random);
        let u = (RISTRETTO_BASEPOINT_POINT * r).compress();
        let mut shared = (ritual_key * r).compress().to_bytes();

        let mut k = random_scalar(&self.random);
        let commitment = (RISTRETTO_BASEPOINT_POINT * k).compress();
        let c = challenge(&u, &commitment, aad);
        let z = k + c * r;
        k.zeroize();
        r.zeroize();

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(u.as_bytes());
        header.extend_from_slice(c.as_bytes());
        header.extend_from_slice(z.as_bytes());

        let cipher = payload_cipher(&shared, &header)?;
        shared.zeroize();
        let nonce = self.random.random_nonce();
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
            .map_err(|e| TesseraError::crypto(format!("Payload encryption failed: {e}")))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&sealed);
        Ok(Ciphertext {
            header: CiphertextHeader(header),
            payload,
        })
    }

    async fn combine_shares(&self, shares: &[DecryptionShare]) -> Result<ThresholdSharedSecret> {
        if shares.is_empty() {
            return Err(TesseraError::crypto("Cannot combine zero shares"));
        }
        let points = shares
            .iter()
            .map(decode_share)
            .collect::<Result<Vec<_>>>()?;

        let mut seen = BTreeSet::new();
        if let Some((index, _)) = points.iter().find(|(index, _)| !seen.insert(*index)) {
            return Err(TesseraError::crypto(format!(
                "Duplicate decryption share for index {index}"
            )));
        }

        let combined = points
            .iter()
            .fold(RistrettoPoint::identity(), |acc, (index, point)| {
                acc + point * lagrange_at_zero(*index, &points)
            });
        trace!(shares = points.len(), "Combined decryption shares");
        Ok(ThresholdSharedSecret::new(
            combined.compress().to_bytes().to_vec(),
        ))
    }

    async fn decrypt(
        &self,
        ciphertext: &Ciphertext,
        shared_secret: &ThresholdSharedSecret,
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        if ciphertext.payload.len() < NONCE_LEN {
            return Err(TesseraError::crypto("Ciphertext payload is truncated"));
        }
        let (nonce, sealed) = ciphertext.payload.split_at(NONCE_LEN);
        let cipher = payload_cipher(shared_secret.as_bytes(), ciphertext.header.as_bytes())?;
        cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: sealed, aad })
            .map_err(|e| TesseraError::crypto(format!("Payload decryption failed: {e}")))
    }
}

/// Participant-side share handler holding one key share
#[derive(Debug, Clone)]
pub struct RistrettoShareHandler {
    share: KeyShare,
}

impl RistrettoShareHandler {
    /// Create a handler for `share`
    pub fn new(share: KeyShare) -> Self {
        Self { share }
    }
}

#[async_trait::async_trait]
impl DecryptionShareEffects for RistrettoShareHandler {
    async fn create_share(
        &self,
        header: &CiphertextHeader,
        aad: &[u8],
    ) -> Result<DecryptionShare> {
        let u = verify_header(header.as_bytes(), aad)?;
        let point = (u * self.share.secret).compress();

        let mut bytes = Vec::with_capacity(SHARE_LEN);
        bytes.extend_from_slice(&self.share.index.to_be_bytes());
        bytes.extend_from_slice(point.as_bytes());
        Ok(DecryptionShare(bytes))
    }
}

fn random_scalar(random: &dyn RandomEffects) -> Scalar {
    loop {
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&random.random_bytes(64));
        let scalar = Scalar::from_bytes_mod_order_wide(&wide);
        if scalar != Scalar::ZERO {
            return scalar;
        }
    }
}

/// Check the header proof against `aad` and return `U`.
fn verify_header(header: &[u8], aad: &[u8]) -> Result<RistrettoPoint> {
    if header.len() != HEADER_LEN {
        return Err(TesseraError::crypto(format!(
            "Ciphertext header must be {HEADER_LEN} bytes, got {}",
            header.len()
        )));
    }
    let u = decompress(&header[..32], "ciphertext header")?;
    let c = canonical_scalar(&header[32..64])?;
    let z = canonical_scalar(&header[64..])?;

    let commitment = (RISTRETTO_BASEPOINT_POINT * z - u * c).compress();
    if challenge(&u.compress(), &commitment, aad) != c {
        return Err(TesseraError::crypto("Ciphertext header does not match associated data"));
    }
    Ok(u)
}

fn challenge(u: &CompressedRistretto, commitment: &CompressedRistretto, aad: &[u8]) -> Scalar {
    let mut wide = [0u8; 64];
    wide.copy_from_slice(
        &Sha512::new()
            .chain_update(CHALLENGE_DOMAIN)
            .chain_update(u.as_bytes())
            .chain_update(commitment.as_bytes())
            .chain_update(aad)
            .finalize(),
    );
    Scalar::from_bytes_mod_order_wide(&wide)
}

fn canonical_scalar(bytes: &[u8]) -> Result<Scalar> {
    let mut array = [0u8; 32];
    array.copy_from_slice(bytes);
    Option::<Scalar>::from(Scalar::from_canonical_bytes(array))
        .ok_or_else(|| TesseraError::crypto("Non-canonical scalar in ciphertext header"))
}

fn decompress(bytes: &[u8], what: &str) -> Result<RistrettoPoint> {
    let compressed = CompressedRistretto::from_slice(bytes)
        .map_err(|_| TesseraError::crypto(format!("Invalid {what} length")))?;
    let point = compressed
        .decompress()
        .ok_or_else(|| TesseraError::crypto(format!("Invalid {what} encoding")))?;
    if point == RistrettoPoint::identity() {
        return Err(TesseraError::crypto(format!("Degenerate {what}")));
    }
    Ok(point)
}

fn decode_share(share: &DecryptionShare) -> Result<(u32, RistrettoPoint)> {
    let bytes = share.as_bytes();
    if bytes.len() != SHARE_LEN {
        return Err(TesseraError::crypto(format!(
            "Decryption share must be {SHARE_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let mut index = [0u8; 4];
    index.copy_from_slice(&bytes[..4]);
    let index = u32::from_be_bytes(index);
    if index == 0 {
        return Err(TesseraError::crypto("Decryption share index must be non-zero"));
    }
    Ok((index, decompress(&bytes[4..], "decryption share")?))
}

/// `L_i(0) = Π_{j≠i} x_j / (x_j - x_i)`
fn lagrange_at_zero(index: u32, points: &[(u32, RistrettoPoint)]) -> Scalar {
    let x_i = Scalar::from(index);
    points
        .iter()
        .filter(|(other, _)| *other != index)
        .fold(Scalar::ONE, |basis, (other, _)| {
            let x_j = Scalar::from(*other);
            basis * x_j * (x_j - x_i).invert()
        })
}

fn payload_cipher(shared: &[u8], header: &[u8]) -> Result<ChaCha20Poly1305> {
    let mut ikm = Vec::with_capacity(shared.len() + header.len());
    ikm.extend_from_slice(shared);
    ikm.extend_from_slice(header);

    let hkdf = Hkdf::<Sha256>::new(Some(KDF_SALT), &ikm);
    let mut key = [0u8; 32];
    let expanded = hkdf.expand(KDF_INFO, &mut key);
    ikm.zeroize();
    expanded.map_err(|e| TesseraError::crypto(format!("HKDF expansion failed: {e}")))?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    key.zeroize();
    Ok(cipher)
}
