//! Bit-exact Bitcoin transaction types and streaming (de)serialization.
//!
//! This crate renders the non-witness (legacy) subset of Bitcoin's transaction format: scripts,
//! inputs, outputs, and the legacy sighash algorithm. Segregated witness construction is out of
//! scope for the signing workspace this crate supports (see the top-level design notes), so no
//! `WitnessTx` type is provided here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Opaque, length-prefixed script byte vectors (`Script`, `ScriptSig`, `ScriptPubkey`).
pub mod script;

/// Transaction input types: outpoints and `TxIn`.
pub mod txin;

/// Transaction output types: `TxOut` and the compiled binary form used for previous-output
/// verification.
pub mod txout;

/// `LegacyTx`, sighash arguments, and the legacy SIGHASH_ALL/SINGLE/ANYONECANPAY algorithm.
pub mod transactions;

/// Streaming encoders: `TxHasher` (hash-as-you-go) and `TxBuilder` (chunk-as-you-go), the two
/// concrete uses of the same lazy header/footer bookkeeping described in the design notes.
pub mod stream;

/// Hash digest marker types specific to Bitcoin (`Txid`).
pub mod hashes;

pub use script::{Script, ScriptPubkey, ScriptSig};
pub use stream::{TxBuilder, TxHasher};
pub use transactions::{LegacySighashArgs, LegacyTx, Sighash, TxError, TxResult};
pub use txin::{Outpoint, TxIn};
pub use txout::TxOut;
