//! Legacy (pre-segwit) bitcoin transaction building and signing.
//!
//! The sweeper spends every unspent output of one forwarding address, so all
//! inputs are P2PKH outputs controlled by a single derived key. Outputs may
//! pay either P2PKH or P2SH addresses. Signing uses SIGHASH_ALL with low-S
//! normalized DER signatures.

use crate::address::{decode_address, P2SH_VERSION};
use crate::hash::sha256d;
use crate::keys::{signing_key_from_hex, KeyError};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::Signature;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use relaytip_types::TxId;
use thiserror::Error;

/// SIGHASH_ALL hash type byte.
const SIGHASH_ALL: u8 = 0x01;

/// Errors from transaction construction.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("invalid output address: {0}")]
    InvalidAddress(String),

    #[error("invalid source address: {0}")]
    InvalidSourceAddress(String),

    #[error("invalid previous transaction id: {0}")]
    InvalidTxId(String),

    #[error("transaction has no inputs")]
    NoInputs,

    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// An unspent output being consumed.
#[derive(Clone, Debug)]
pub struct TxInput {
    /// Transaction id of the funding transaction (display hex).
    pub prev_txid: String,
    /// Output index within the funding transaction.
    pub prev_index: u32,
}

/// A payment the transaction makes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    pub address: String,
    pub value: u64,
}

/// A fully signed transaction ready for broadcast.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    pub raw_hex: String,
    pub txid: TxId,
}

fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xFC => buf.push(value as u8),
        0xFD..=0xFFFF => {
            buf.push(0xFD);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            buf.push(0xFE);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xFF);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

fn push_data(buf: &mut Vec<u8>, data: &[u8]) {
    // All pushes here (signatures, public keys) fit in a single length byte.
    buf.push(data.len() as u8);
    buf.extend_from_slice(data);
}

/// Locking script for a decoded address.
fn script_pubkey(version: u8, hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    if version == P2SH_VERSION {
        // OP_HASH160 <hash> OP_EQUAL
        script.push(0xA9);
        push_data(&mut script, hash);
        script.push(0x87);
    } else {
        // OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG
        script.push(0x76);
        script.push(0xA9);
        push_data(&mut script, hash);
        script.push(0x88);
        script.push(0xAC);
    }
    script
}

fn outpoint_txid_bytes(prev_txid: &str) -> Result<[u8; 32], TxError> {
    let bytes =
        hex::decode(prev_txid).map_err(|_| TxError::InvalidTxId(prev_txid.to_string()))?;
    let mut out: [u8; 32] = bytes
        .try_into()
        .map_err(|_| TxError::InvalidTxId(prev_txid.to_string()))?;
    // Display form is byte-reversed relative to the wire encoding.
    out.reverse();
    Ok(out)
}

/// Serialize the transaction with the given per-input scripts.
fn serialize(
    inputs: &[TxInput],
    scripts: &[Vec<u8>],
    output_scripts: &[(u64, Vec<u8>)],
) -> Result<Vec<u8>, TxError> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&1u32.to_le_bytes()); // version

    write_varint(&mut buf, inputs.len() as u64);
    for (input, script) in inputs.iter().zip(scripts) {
        buf.extend_from_slice(&outpoint_txid_bytes(&input.prev_txid)?);
        buf.extend_from_slice(&input.prev_index.to_le_bytes());
        write_varint(&mut buf, script.len() as u64);
        buf.extend_from_slice(script);
        buf.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes()); // sequence
    }

    write_varint(&mut buf, output_scripts.len() as u64);
    for (value, script) in output_scripts {
        buf.extend_from_slice(&value.to_le_bytes());
        write_varint(&mut buf, script.len() as u64);
        buf.extend_from_slice(script);
    }

    buf.extend_from_slice(&0u32.to_le_bytes()); // locktime
    Ok(buf)
}

/// Build a transaction spending `inputs` (all P2PKH outputs of
/// `source_address`) into `outputs`, signed with the persisted secret key.
pub fn build_and_sign(
    inputs: &[TxInput],
    outputs: &[TxOutput],
    source_address: &str,
    secret_hex: &str,
) -> Result<SignedTransaction, TxError> {
    if inputs.is_empty() {
        return Err(TxError::NoInputs);
    }
    if outputs.is_empty() {
        return Err(TxError::NoOutputs);
    }

    let (source_version, source_hash) = decode_address(source_address)
        .ok_or_else(|| TxError::InvalidSourceAddress(source_address.to_string()))?;
    if source_version == P2SH_VERSION {
        return Err(TxError::InvalidSourceAddress(source_address.to_string()));
    }
    let source_script = script_pubkey(source_version, &source_hash);

    let output_scripts: Vec<(u64, Vec<u8>)> = outputs
        .iter()
        .map(|out| {
            decode_address(&out.address)
                .map(|(version, hash)| (out.value, script_pubkey(version, &hash)))
                .ok_or_else(|| TxError::InvalidAddress(out.address.clone()))
        })
        .collect::<Result<_, _>>()?;

    let signing_key = signing_key_from_hex(secret_hex)?;
    let public_key = signing_key.verifying_key().to_encoded_point(true);

    // SIGHASH_ALL: for each input, the script slot holds the source locking
    // script while every other input's slot is empty.
    let mut script_sigs: Vec<Vec<u8>> = Vec::with_capacity(inputs.len());
    for index in 0..inputs.len() {
        let mut scripts: Vec<Vec<u8>> = vec![Vec::new(); inputs.len()];
        scripts[index] = source_script.clone();

        let mut preimage = serialize(inputs, &scripts, &output_scripts)?;
        preimage.extend_from_slice(&(SIGHASH_ALL as u32).to_le_bytes());
        let digest = sha256d(&preimage);

        let signature: Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|e| TxError::Signing(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        let mut der = signature.to_der().as_bytes().to_vec();
        der.push(SIGHASH_ALL);

        let mut script_sig = Vec::with_capacity(der.len() + 35);
        push_data(&mut script_sig, &der);
        push_data(&mut script_sig, public_key.as_bytes());
        script_sigs.push(script_sig);
    }

    let raw = serialize(inputs, &script_sigs, &output_scripts)?;
    let mut txid_bytes = sha256d(&raw);
    txid_bytes.reverse();

    Ok(SignedTransaction {
        raw_hex: hex::encode(raw),
        txid: TxId::new(hex::encode(txid_bytes)),
    })
}
