//! The streamed transaction-signing state machine.
//!
//! This crate is the hard part of the workspace: it drives a host-side wallet through an
//! eight-stage request/response dialogue (see [`state`]), replaying the same input/output stream
//! twice -- once to inspect and confirm, once to sign -- and fatally aborting if the two replays
//! ever disagree. It never holds a whole transaction in memory; `txbitcoin::TxHasher` and
//! `txbitcoin::TxBuilder` do the streaming encode/hash work this crate drives.
//!
//! Key derivation, ECDSA signing, user confirmation, and coin parameters are external
//! collaborators, injected through the traits in `txhal`. This crate never performs field
//! arithmetic, never derives a BIP32 child node, and never renders a confirmation screen.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Wire message shapes: `TxRequest`, `TxAck`, and the structured records they carry.
pub mod protocol;

/// The cross-phase tamper checksum (`TxChecksum`).
pub mod checksum;

/// Change-output classification (`ChangeDetector`, multisig fingerprinting).
pub mod change;

/// Per-input sighash computation and `script_sig` assembly (`Signer`).
pub mod signer;

/// The session-level error taxonomy (`SigningError`, `Failure`).
pub mod error;

/// The eight-stage dialogue (`SigningHandler`, `Session`).
pub mod state;

pub use error::{Failure, SigningError, SigningResult};
pub use protocol::{TxAck, TxRequest};
pub use state::SigningHandler;
