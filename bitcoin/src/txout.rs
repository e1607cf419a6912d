//! Transaction outputs.

use std::io::{Read, Write};

use txcore::ser::{ByteFormat, SerError};

use crate::script::ScriptPubkey;

/// An output: describes a new UTXO to be created. `TxOut::null()` returns the "null" output
/// (value `0xffff_ffff_ffff_ffff`, empty `script_pubkey`) used to blank out non-signed outputs
/// during legacy `SIGHASH_SINGLE` sighash computation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxOut {
    /// The value of the output, in satoshis.
    pub value: u64,
    /// The script which locks the UTXO.
    pub script_pubkey: ScriptPubkey,
}

impl Default for TxOut {
    fn default() -> Self {
        Self::null()
    }
}

impl TxOut {
    /// Build a new `TxOut`.
    pub fn new<T: Into<ScriptPubkey>>(value: u64, script_pubkey: T) -> Self {
        Self {
            value,
            script_pubkey: script_pubkey.into(),
        }
    }

    /// The null output used to blank non-signed outputs in `SIGHASH_SINGLE`.
    pub fn null() -> Self {
        Self {
            value: 0xffff_ffff_ffff_ffff,
            script_pubkey: ScriptPubkey::null(),
        }
    }
}

impl ByteFormat for TxOut {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        8 + self.script_pubkey.serialized_length()
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let value = Self::read_u64_le(reader)?;
        let script_pubkey = ScriptPubkey::read_from(reader)?;
        Ok(Self {
            value,
            script_pubkey,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        let mut len = Self::write_u64_le(writer, self.value)?;
        len += self.script_pubkey.write_to(writer)?;
        Ok(len)
    }
}

/// The compiled, binary form of a previous transaction's output, as streamed back to the device
/// during Stage 2 so it can accumulate `to_spend` and verify `prev_hash`. Structurally identical
/// to `TxOut`; kept as a distinct name to mirror the protocol's own distinction between an output
/// a wallet is *creating* (`TxOut`) and one it is *reading back* from a previous transaction.
pub type TxOutputBin = TxOut;
