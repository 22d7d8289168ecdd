//! Chain oracle errors.

use thiserror::Error;

/// Failures talking to the external chain oracle.
///
/// Both variants are retryable from the sweeper's point of view: the ledger
/// entry stays `Unswept` and a later sweep starts over.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Transport failure, including timeouts and non-success HTTP statuses.
    #[error("chain oracle unreachable: {0}")]
    Network(String),

    /// The oracle answered, but not in the shape we expect.
    #[error("unexpected chain oracle response: {0}")]
    InvalidResponse(String),
}
