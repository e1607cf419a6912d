//! Transaction inputs.

use std::io::{Read, Write};

use txcore::ser::{ByteFormat, SerError};

use crate::hashes::Txid;
use crate::script::ScriptSig;

/// A unique reference to an existing UTXO: the id of the transaction that created it, and the
/// index of the output within that transaction's output vector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outpoint {
    /// The transaction id of the previous transaction.
    pub txid: Txid,
    /// The index of the output being spent within `txid`'s output vector.
    pub index: u32,
}

impl Outpoint {
    /// Build an outpoint from a txid and index.
    pub fn new(txid: Txid, index: u32) -> Self {
        Self { txid, index }
    }
}

impl ByteFormat for Outpoint {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        36
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let mut txid_bytes = [0u8; 32];
        reader.read_exact(&mut txid_bytes)?;
        let index = Self::read_u32_le(reader)?;
        Ok(Self {
            txid: txcore::hashes::Hash256Digest(txid_bytes).into(),
            index,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        writer.write_all(&self.txid.as_bytes())?;
        Self::write_u32_le(writer, self.index)?;
        Ok(36)
    }
}

/// A transaction input. References an outpoint, carries a `script_sig` authorizing the spend
/// (empty until the relevant input is signed), and a sequence number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxIn {
    /// The previous output being spent.
    pub outpoint: Outpoint,
    /// The unlocking script. Empty for every input except the one currently being signed, during
    /// sighash computation; fully populated after `Signer` injects the final signature.
    pub script_sig: ScriptSig,
    /// The input's sequence number.
    pub sequence: u32,
}

impl TxIn {
    /// Build a new `TxIn`.
    pub fn new(outpoint: Outpoint, script_sig: ScriptSig, sequence: u32) -> Self {
        Self {
            outpoint,
            script_sig,
            sequence,
        }
    }
}

impl ByteFormat for TxIn {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        self.outpoint.serialized_length() + self.script_sig.serialized_length() + 4
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let outpoint = Outpoint::read_from(reader)?;
        let script_sig = ScriptSig::read_from(reader)?;
        let sequence = Self::read_u32_le(reader)?;
        Ok(Self {
            outpoint,
            script_sig,
            sequence,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        let mut len = self.outpoint.write_to(writer)?;
        len += self.script_sig.write_to(writer)?;
        len += Self::write_u32_le(writer, self.sequence)?;
        Ok(len)
    }
}
