//! Sweep outcomes and their wire payloads.

use relaytip_types::TxId;
use serde_json::{json, Value};

/// Result of one sweep attempt.
///
/// `Fail` carries an HTTP-style code: 404 when there is nothing to forward
/// (unknown address, no funds, already forwarded), 500 when funds exist but
/// fee or dust rules leave nothing payable. `Error` means an external call
/// failed and the entry stays unswept for a retry.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Success { tx_hash: TxId, amount: u64 },
    Fail { code: u16, message: String },
    Error { message: String },
}

impl Outcome {
    pub fn fail(code: u16, message: impl Into<String>) -> Self {
        Self::Fail {
            code,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// JSend-style JSON payload.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Success { tx_hash, amount } => json!({
                "status": "success",
                "data": {
                    "message": format!("forwarded {amount} satoshis"),
                    "tx_hash": tx_hash.as_str(),
                },
            }),
            Self::Fail { code, message } => json!({
                "status": "fail",
                "data": {
                    "message": message,
                    "code": code,
                },
            }),
            Self::Error { message } => json!({
                "status": "error",
                "message": message,
            }),
        }
    }
}
