//! The session-level error taxonomy.
//!
//! Grounded in the `#[derive(Error)]` pattern used for `TxError` in
//! `bitcoin/src/types/transactions.rs` and for `LedgerBTCError`/`LedgerError` referenced from
//! `ledger-btc/src/utils.rs` and `ledger/src/transports/mod.rs`: one coarse taxonomy the host
//! protocol expects (`Failure.code`), with an `Other` catch-all split into named sub-variants so
//! Rust callers get a precise `match` without losing that coarse shape.
//!
//! Every variant here is fatal: there is no retry, no partial rollback, no resumption (see the
//! propagation policy in the design notes). `SigningHandler::dispatch` converts any
//! `Err(SigningError)` into one `Failure` message and tears the session down.

use thiserror::Error;

/// Everything that can end a signing session early.
#[derive(Debug, Error)]
pub enum SigningError {
    /// A `TxAck` arrived while no session was active.
    #[error("Unexpected message: no signing session is in progress")]
    UnexpectedMessage,

    /// The inputs being spent do not cover the outputs being created.
    #[error("Not enough funds: spending {spending} exceeds inputs of {to_spend}")]
    NotEnoughFunds {
        /// The total of the outputs being created plus the fee.
        spending: u64,
        /// The total of the inputs being spent.
        to_spend: u64,
    },

    /// The user declined a confirmation gate.
    #[error("Signing cancelled by user")]
    ActionCancelled,

    /// Any other protocol or integrity violation. Carries a short human-readable reason, matching
    /// the original firmware's single free-text `Failure` message while still letting Rust
    /// callers `match` on the coarse kind.
    #[error("{0}")]
    Other(#[from] OtherError),
}

/// The `Other` taxonomy row's sub-variants: protocol and integrity violations that are not one of
/// the three named top-level kinds.
#[derive(Debug, Error)]
pub enum OtherError {
    /// The previous transaction streamed in Stage 2 did not hash to the input's declared
    /// `prev_hash`.
    #[error("Encountered invalid prevhash")]
    InvalidPrevhash,

    /// A (de)serialization operation failed.
    #[error("Transaction serialization failed: {0}")]
    SerializeFailed(String),

    /// The key-derivation or signing backend failed.
    #[error("Key derivation or signing failed: {0}")]
    DerivationFailed(String),

    /// An input declared `SpendMultisig` but carried no `MultisigRedeemScriptType`.
    #[error("Missing multisig information for a multisig input")]
    MissingMultisigInfo,

    /// This input's signing pubkey was not found among its multisig's cosigner keys.
    #[error("Pubkey not found in multisig")]
    PubkeyNotInMultisig,

    /// The Phase 1 and Phase 2 tamper checksums did not match.
    #[error("Transaction has changed during signing")]
    ChecksumMismatch,

    /// Recompiling an output for the final transaction failed (e.g. an address the host declared
    /// could not be resolved to a script).
    #[error("Failed to compile output: {0}")]
    CompileOutputFailed(String),

    /// An output's `address_type` was present but inconsistent with its `address_n` (see the
    /// `ChangeDetector` malformed-output rule).
    #[error("Invalid output address type")]
    InvalidAddressType,

    /// A second output was classified as change; at most one is permitted per session.
    #[error("Transaction has more than one change output")]
    TooManyChangeOutputs,
}

/// Result alias used throughout the signing core.
pub type SigningResult<T> = Result<T, SigningError>;

impl From<txbitcoin::TxError> for SigningError {
    fn from(e: txbitcoin::TxError) -> Self {
        SigningError::Other(OtherError::SerializeFailed(e.to_string()))
    }
}

impl From<txhal::keys::KeyError> for SigningError {
    fn from(e: txhal::keys::KeyError) -> Self {
        SigningError::Other(OtherError::DerivationFailed(e.to_string()))
    }
}

/// The outbound message the core sends when a session ends in error: a coarse kind plus a
/// human-readable reason, mirroring the original firmware's `Failure` protobuf message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure {
    /// A short, stable, host-facing label for the error kind (`"UnexpectedMessage"`,
    /// `"NotEnoughFunds"`, `"ActionCancelled"`, or `"Other"`).
    pub code: &'static str,
    /// A human-readable message, suitable for host-side logging or display.
    pub message: String,
}

impl From<&SigningError> for Failure {
    fn from(e: &SigningError) -> Self {
        let code = match e {
            SigningError::UnexpectedMessage => "UnexpectedMessage",
            SigningError::NotEnoughFunds { .. } => "NotEnoughFunds",
            SigningError::ActionCancelled => "ActionCancelled",
            SigningError::Other(_) => "Other",
        };
        Failure {
            code,
            message: e.to_string(),
        }
    }
}
