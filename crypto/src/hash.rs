//! Bitcoin hash functions.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Double SHA-256 (transaction ids, base58check checksums, sighashes).
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// RIPEMD-160 of SHA-256 (public key and script hashes).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}
