//! Base58check bitcoin address handling.
//!
//! Forwarding keys produce mainnet P2PKH (`1…`) addresses; donation targets
//! parsed from relay contact data may be either P2PKH or P2SH (`3…`).

use crate::hash::{hash160, sha256d};
use regex::Regex;
use std::sync::OnceLock;

/// Version byte for mainnet pay-to-pubkey-hash addresses.
pub const P2PKH_VERSION: u8 = 0x00;
/// Version byte for mainnet pay-to-script-hash addresses.
pub const P2SH_VERSION: u8 = 0x05;

/// Candidate pattern for a mainnet base58 address embedded in free text.
static ADDRESS_PATTERN: OnceLock<Regex> = OnceLock::new();

fn address_pattern() -> &'static Regex {
    ADDRESS_PATTERN.get_or_init(|| {
        Regex::new(r"[13][a-km-zA-HJ-NP-Z0-9]{26,33}").expect("static pattern compiles")
    })
}

/// Encode a 20-byte payload as a base58check address.
fn base58check_encode(version: u8, payload: &[u8; 20]) -> String {
    let mut bytes = Vec::with_capacity(25);
    bytes.push(version);
    bytes.extend_from_slice(payload);
    let checksum = sha256d(&bytes);
    bytes.extend_from_slice(&checksum[..4]);
    bs58::encode(bytes).into_string()
}

/// Derive the mainnet P2PKH address for a (compressed) public key.
pub fn p2pkh_address(public_key: &[u8]) -> String {
    base58check_encode(P2PKH_VERSION, &hash160(public_key))
}

/// Decode a base58check address into its version byte and 20-byte hash.
///
/// Returns `None` if the address is malformed, the checksum is wrong, or the
/// version is neither P2PKH nor P2SH.
pub fn decode_address(address: &str) -> Option<(u8, [u8; 20])> {
    let bytes = bs58::decode(address).into_vec().ok()?;
    if bytes.len() != 25 {
        return None;
    }
    let (body, checksum) = bytes.split_at(21);
    let expected = sha256d(body);
    if checksum != &expected[..4] {
        return None;
    }
    let version = body[0];
    if version != P2PKH_VERSION && version != P2SH_VERSION {
        return None;
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&body[1..21]);
    Some((version, hash))
}

/// Validate that an address string is well-formed with a correct checksum.
pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_some()
}

/// Extract the first valid bitcoin address from free-form text (a relay's
/// contact field). Candidates that fail the checksum are skipped.
pub fn extract_address(text: &str) -> Option<String> {
    address_pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|candidate| validate_address(candidate))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Genesis coinbase address.
    const KNOWN_P2PKH: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

    #[test]
    fn known_address_validates() {
        assert!(validate_address(KNOWN_P2PKH));
    }

    #[test]
    fn decode_yields_p2pkh_version() {
        let (version, _) = decode_address(KNOWN_P2PKH).unwrap();
        assert_eq!(version, P2PKH_VERSION);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let mut bad = KNOWN_P2PKH.to_string();
        bad.pop();
        bad.push('7');
        assert!(!validate_address(&bad));
    }

    #[test]
    fn garbage_rejected() {
        assert!(!validate_address(""));
        assert!(!validate_address("not an address"));
        assert!(!validate_address("1short"));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let payload = [0xABu8; 20];
        let address = base58check_encode(P2PKH_VERSION, &payload);
        let (version, hash) = decode_address(&address).unwrap();
        assert_eq!(version, P2PKH_VERSION);
        assert_eq!(hash, payload);
    }

    #[test]
    fn extract_from_contact_field() {
        let contact = format!("John Doe <jd AT example DOT com> tips: {KNOWN_P2PKH}");
        assert_eq!(extract_address(&contact).as_deref(), Some(KNOWN_P2PKH));
    }

    #[test]
    fn extract_skips_invalid_candidates() {
        // Plausible-looking but checksum-invalid candidate before a real one.
        let contact = format!("1AAAAAAAAAAAAAAAAAAAAAAAAAAAAA {KNOWN_P2PKH}");
        assert_eq!(extract_address(&contact).as_deref(), Some(KNOWN_P2PKH));
    }

    #[test]
    fn extract_none_when_absent() {
        assert_eq!(extract_address("no donation info here"), None);
    }
}
