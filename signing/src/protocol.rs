//! Wire message shapes.
//!
//! The original firmware frames these as protobuf messages; no `.proto` schema is part of this
//! crate's scope (generating one would invent an interface the spec never defines), so the
//! messages are rendered as plain Rust structs/enums. Framing, transport, and the rest of the
//! command dispatcher are external collaborators (see `txhal`) this crate never touches.

use txbitcoin::{Outpoint, Script, ScriptPubkey, ScriptSig};
use txhal::DerivationPath;

/// Which element of the transaction a `TxRequest` is asking for next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestType {
    /// Asking for (or returning) an input.
    TxInput,
    /// Asking for (or returning) an output.
    TxOutput,
    /// Asking for the previous transaction's metadata (Stage 2 only).
    TxMeta,
    /// The session is complete; no further acks are expected.
    TxFinished,
}

/// Identifies which element within the current request `details` refers to, and -- during Stage
/// 2 -- which previous transaction it belongs to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestDetails {
    /// The index of the element being requested.
    pub request_index: u32,
    /// Present iff requesting data belonging to a *previous* transaction (Stage 2 only): that
    /// transaction's id, so the host can look it up.
    pub tx_hash: Option<[u8; 32]>,
}

/// The serialized-transaction payload carried by a `TxRequest` during Stages 4 and 5: a freshly
/// produced signature (Stage 4 only) plus the next chunk of the final transaction's bytes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SerializedChunk {
    /// The index of the input this signature belongs to, present iff `signature` is.
    pub signature_index: Option<u32>,
    /// A freshly produced DER-encoded signature, present only immediately after signing input
    /// `signature_index`.
    pub signature: Option<Vec<u8>>,
    /// The next chunk of the final transaction's canonical serialization.
    pub serialized_tx: Vec<u8>,
}

/// A message from the core to the host: "send me this next", optionally carrying a piece of the
/// finished transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxRequest {
    /// What's being requested.
    pub request_type: RequestType,
    /// Which element, and (in Stage 2) which previous transaction.
    pub details: RequestDetails,
    /// Present on Stage 4/5 emissions that carry signature and/or transaction bytes.
    pub serialized: Option<SerializedChunk>,
}

impl TxRequest {
    /// Build a bare request for the input at `index` in the session's own transaction.
    pub fn input(index: u32) -> Self {
        Self {
            request_type: RequestType::TxInput,
            details: RequestDetails {
                request_index: index,
                tx_hash: None,
            },
            serialized: None,
        }
    }

    /// Build a bare request for the output at `index` in the session's own transaction.
    pub fn output(index: u32) -> Self {
        Self {
            request_type: RequestType::TxOutput,
            details: RequestDetails {
                request_index: index,
                tx_hash: None,
            },
            serialized: None,
        }
    }

    /// Build a request for the metadata of the previous transaction identified by `tx_hash`.
    pub fn prev_meta(tx_hash: [u8; 32]) -> Self {
        Self {
            request_type: RequestType::TxMeta,
            details: RequestDetails {
                request_index: 0,
                tx_hash: Some(tx_hash),
            },
            serialized: None,
        }
    }

    /// Build a request for the input at `index` of the previous transaction identified by
    /// `tx_hash`.
    pub fn prev_input(tx_hash: [u8; 32], index: u32) -> Self {
        Self {
            request_type: RequestType::TxInput,
            details: RequestDetails {
                request_index: index,
                tx_hash: Some(tx_hash),
            },
            serialized: None,
        }
    }

    /// Build a request for the output at `index` of the previous transaction identified by
    /// `tx_hash`.
    pub fn prev_output(tx_hash: [u8; 32], index: u32) -> Self {
        Self {
            request_type: RequestType::TxOutput,
            details: RequestDetails {
                request_index: index,
                tx_hash: Some(tx_hash),
            },
            serialized: None,
        }
    }

    /// Build the Stage 4 request that carries a freshly produced signature plus the next
    /// `out_tx_ctx` chunk.
    pub fn signed_input(next_index: u32, signature_index: u32, signature: Vec<u8>, chunk: Vec<u8>) -> Self {
        Self {
            request_type: RequestType::TxInput,
            details: RequestDetails {
                request_index: next_index,
                tx_hash: None,
            },
            serialized: Some(SerializedChunk {
                signature_index: Some(signature_index),
                signature: Some(signature),
                serialized_tx: chunk,
            }),
        }
    }

    /// Build the Stage 5 request that carries the next `out_tx_ctx` output chunk.
    pub fn output_chunk(next_index: u32, chunk: Vec<u8>) -> Self {
        Self {
            request_type: RequestType::TxOutput,
            details: RequestDetails {
                request_index: next_index,
                tx_hash: None,
            },
            serialized: Some(SerializedChunk {
                signature_index: None,
                signature: None,
                serialized_tx: chunk,
            }),
        }
    }

    /// The terminal `TXFINISHED` sentinel.
    pub fn finished() -> Self {
        Self {
            request_type: RequestType::TxFinished,
            details: RequestDetails::default(),
            serialized: None,
        }
    }
}

/// How an input authorizes its spend.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputScriptType {
    /// A standard single-signature pay-to-pubkey-hash input.
    SpendAddress,
    /// A multisig input, carrying a `MultisigRedeemScriptType`.
    SpendMultisig,
}

/// How an output is paid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputScriptType {
    /// Pay to a single address (P2PKH).
    PayToAddress,
    /// Pay to a multisig redeem script (P2SH).
    PayToMultisig,
}

/// The three ways an output's relationship to the wallet can be declared.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressType {
    /// An ordinary spend to a third party.
    Spend,
    /// A spend to an address the host displays as belonging to this wallet, but which is *not*
    /// treated as change (see the design notes' address_type/TRANSFER resolution).
    Transfer,
    /// A change output: funds returning to this wallet, not separately confirmed.
    Change,
}

/// A multisig redeem script descriptor: the sorted set of cosigner public keys and the signature
/// threshold, sufficient to reconstruct `OP_m <pubkey>* OP_n OP_CHECKMULTISIG`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultisigRedeemScriptType {
    /// The cosigner public keys, in the redeem script's canonical order.
    pub pubkeys: Vec<[u8; 33]>,
    /// The signature threshold `m` (of `n = pubkeys.len()`).
    pub signatures_required: u8,
}

impl MultisigRedeemScriptType {
    /// The index of `pubkey` within this multisig's cosigner list, if present.
    pub fn pubkey_index(&self, pubkey: &[u8; 33]) -> Option<usize> {
        self.pubkeys.iter().position(|k| k == pubkey)
    }
}

/// One transaction input, as streamed from the host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxInputType {
    /// The BIP32 derivation path to this input's signing key, relative to the session root.
    pub address_n: DerivationPath,
    /// The id of the transaction this input spends from.
    pub prev_hash: [u8; 32],
    /// The index of the output being spent within `prev_hash`'s output vector.
    pub prev_index: u32,
    /// The input's `script_sig`. Empty until this input is signed.
    pub script_sig: ScriptSig,
    /// The input's sequence number.
    pub sequence: u32,
    /// How this input authorizes its spend.
    pub script_type: InputScriptType,
    /// Present iff `script_type == SpendMultisig`.
    pub multisig: Option<MultisigRedeemScriptType>,
}

impl TxInputType {
    /// This input's outpoint.
    pub fn outpoint(&self) -> Outpoint {
        Outpoint::new(
            txcore::hashes::Hash256Digest(self.prev_hash).into(),
            self.prev_index,
        )
    }
}

/// One transaction output, as streamed from the host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxOutputType {
    /// A fully-formed destination address, present for external (non-wallet) spends.
    pub address: Option<String>,
    /// The BIP32 derivation path to this output's address, if it belongs to this wallet.
    pub address_n: DerivationPath,
    /// The amount, in satoshis.
    pub amount: u64,
    /// How this output is paid.
    pub script_type: OutputScriptType,
    /// The host's declared relationship between this output and the wallet, if any.
    pub address_type: Option<AddressType>,
    /// Present iff `script_type == PayToMultisig`.
    pub multisig: Option<MultisigRedeemScriptType>,
}

/// The compiled, binary form of a previously-created output, streamed back during Stage 2 so the
/// device can accumulate `to_spend` and verify `prev_hash`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxOutputBinType {
    /// The output's value, in satoshis.
    pub amount: u64,
    /// The output's locking script.
    pub script_pubkey: ScriptPubkey,
}

/// The metadata of a previous transaction, streamed at the start of Stage 2.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrevTxMeta {
    /// Number of inputs in the previous transaction.
    pub inputs_cnt: u32,
    /// Number of outputs in the previous transaction.
    pub outputs_cnt: u32,
    /// The previous transaction's version field.
    pub version: u32,
    /// The previous transaction's locktime field.
    pub lock_time: u32,
}

/// The payload of a `TxAck`: exactly one of the fields the current stage expects is populated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxAck {
    /// An input belonging to the session's own transaction (Stage 1), or to the previous
    /// transaction currently being streamed (Stage 2).
    Input(TxInputType),
    /// An output belonging to the session's own transaction (Stage 3).
    Output(TxOutputType),
    /// A previous transaction's compiled output (Stage 2 only).
    BinOutput(TxOutputBinType),
    /// The previous transaction's metadata (Stage 2 only, in response to `RequestType::TxMeta`).
    Meta(PrevTxMeta),
}

/// A raw "unused" script, carried where the spec's `Script` codec type is referenced directly
/// rather than through one of the typed wrappers above (e.g. substituted prevout scripts during
/// sighash computation).
pub type RawScript = Script;
