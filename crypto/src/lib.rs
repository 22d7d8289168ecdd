//! Bitcoin primitives for RelayTip.
//!
//! Provides everything the ledger and sweeper need to handle funds:
//! - Deterministic indexed key derivation from a fixed seed
//! - Base58check address encoding, decoding, and extraction from free text
//! - Legacy (pre-segwit) transaction building and ECDSA signing

pub mod address;
pub mod hash;
pub mod keys;
pub mod tx;

pub use address::{decode_address, extract_address, p2pkh_address, validate_address};
pub use hash::{hash160, sha256d};
pub use keys::{derive_key, signing_key_from_hex, DerivedKey, KeyError, KeySeed};
pub use tx::{build_and_sign, SignedTransaction, TxError, TxInput, TxOutput};
