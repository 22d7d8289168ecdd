//! Deterministic indexed key derivation.
//!
//! Each forwarding address is derived from a fixed secret seed combined with
//! the ledger entry's derivation index, electrum-style: the same index always
//! yields the same key pair and distinct indices never collide.
//!
//! The derivation applies HMAC-SHA512 with the seed as key and the path
//! string `m/<index>` as message, taking the first 32 bytes as the secp256k1
//! secret scalar. In the astronomically unlikely case the candidate scalar
//! falls outside the curve order, the path is extended with a tweak counter
//! and derivation retried, keeping the scheme fully deterministic.

use hmac::{Hmac, Mac};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::Sha512;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha512 = Hmac<Sha512>;

/// Maximum tweak attempts before giving up on a derivation index.
const MAX_TWEAKS: u8 = 255;

/// Errors arising from key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("invalid secret key encoding: {0}")]
    InvalidSecret(String),
}

/// The fixed secret seed forwarding keys are derived from.
///
/// Zeroized on drop. Intentionally implements neither `Debug` nor `Clone`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeySeed(Vec<u8>);

impl KeySeed {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A key pair derived for one ledger entry, in the encodings the ledger
/// persists: hex secret scalar, hex compressed public key, P2PKH address.
pub struct DerivedKey {
    pub index: u64,
    pub secret_hex: String,
    pub public_hex: String,
    pub address: String,
}

/// Derive the key pair for a ledger entry's derivation index.
pub fn derive_key(seed: &KeySeed, index: u64) -> Result<DerivedKey, KeyError> {
    for tweak in 0..MAX_TWEAKS {
        let path = if tweak == 0 {
            format!("m/{index}")
        } else {
            format!("m/{index}/{tweak}")
        };

        let mut mac = HmacSha512::new_from_slice(seed.as_bytes())
            .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;
        mac.update(path.as_bytes());
        let mut digest = mac.finalize().into_bytes();

        let result = SigningKey::from_slice(&digest[..32]);
        digest.zeroize();

        if let Ok(signing_key) = result {
            let public = signing_key.verifying_key().to_encoded_point(true);
            let public_hex = hex::encode(public.as_bytes());
            let address = crate::address::p2pkh_address(public.as_bytes());
            return Ok(DerivedKey {
                index,
                secret_hex: hex::encode(signing_key.to_bytes()),
                public_hex,
                address,
            });
        }
    }
    Err(KeyError::DerivationFailed(format!(
        "no valid scalar for index {index}"
    )))
}

/// Reconstruct a signing key from its persisted hex encoding.
pub fn signing_key_from_hex(secret_hex: &str) -> Result<SigningKey, KeyError> {
    let bytes = hex::decode(secret_hex).map_err(|e| KeyError::InvalidSecret(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| KeyError::InvalidSecret(e.to_string()))
}
