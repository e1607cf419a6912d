//! `LegacyTx`: a fully-materialized transaction, and the legacy (pre-segwit) sighash algorithm.
//!
//! Note on scope: the streaming signing session (see the `txsigning` crate) never actually holds
//! one of these in memory for the transaction it is signing -- it streams pieces through
//! `TxHasher`/`TxBuilder` instead, exactly as the enclosing design avoids loading a whole
//! transaction at once. `LegacyTx` remains useful as a self-contained type for tests (building
//! known-answer fixtures, checking a streamed digest against an independently-computed one) and
//! for any caller that already has a complete transaction on hand.

use std::io::{Read, Write};

use thiserror::Error;
use txcore::ser::{compact_int_length, read_compact_int, write_compact_int, ByteFormat, SerError};

use crate::hashes::Txid;
use crate::script::{Script, ScriptSig};
use crate::txin::TxIn;
use crate::txout::TxOut;

/// Errors arising from transaction construction or sighash computation.
#[derive(Debug, Error)]
pub enum TxError {
    /// Propagated (de)serialization error.
    #[error(transparent)]
    SerError(#[from] SerError),

    /// SIGHASH_NONE is not implemented; this device firmware lineage never needed it.
    #[error("SIGHASH_NONE is unsupported")]
    NoneUnsupported,

    /// Satoshi's SIGHASH_SINGLE bug (signing when there is no output at the input's index) is
    /// refused rather than replicated.
    #[error("SIGHASH_SINGLE bug is unsupported: no output at index {0}")]
    SighashSingleBug(usize),

    /// An unknown sighash flag byte.
    #[error("Unknown sighash flag: {0:#x}")]
    UnknownSighash(u8),

    /// The requested input index does not exist in this transaction.
    #[error("Input index {0} out of range (transaction has {1} inputs)")]
    InputIndexOutOfRange(usize, usize),
}

/// Result alias for `TxError`.
pub type TxResult<T> = Result<T, TxError>;

/// All possible legacy sighash modes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sighash {
    /// Sign ALL inputs and ALL outputs.
    All = 0x01,
    /// Sign ALL inputs and NO outputs. Unsupported (see `TxError::NoneUnsupported`).
    None = 0x02,
    /// Sign ALL inputs and ONE output.
    Single = 0x03,
    /// Sign ONE input and ALL outputs.
    AllAnyoneCanPay = 0x81,
    /// Sign ONE input and NO outputs. Unsupported.
    NoneAnyoneCanPay = 0x82,
    /// Sign ONE input and ONE output.
    SingleAnyoneCanPay = 0x83,
}

impl Sighash {
    /// Parse a sighash flag byte.
    pub fn from_u8(flag: u8) -> TxResult<Self> {
        match flag {
            0x01 => Ok(Self::All),
            0x02 => Ok(Self::None),
            0x03 => Ok(Self::Single),
            0x81 => Ok(Self::AllAnyoneCanPay),
            0x82 => Ok(Self::NoneAnyoneCanPay),
            0x83 => Ok(Self::SingleAnyoneCanPay),
            other => Err(TxError::UnknownSighash(other)),
        }
    }

    fn is_anyone_can_pay(self) -> bool {
        (self as u8) & 0x80 == 0x80
    }
}

/// Arguments needed to compute a legacy sighash: which input, which mode, and the script that
/// stands in for that input's `script_sig` (the previous output's `script_pubkey`, or a multisig
/// redeem script).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LegacySighashArgs<'a> {
    /// The index of the input being signed.
    pub index: usize,
    /// The sighash mode.
    pub sighash_flag: Sighash,
    /// The script substituted into `script_sig` for the input at `index`.
    pub prevout_script: &'a Script,
}

/// A fully-materialized, non-witness Bitcoin transaction.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct LegacyTx {
    /// The version number. Usually 1 or 2.
    pub version: u32,
    /// The input vector.
    pub vin: Vec<TxIn>,
    /// The output vector.
    pub vout: Vec<TxOut>,
    /// The nLocktime field.
    pub locktime: u32,
}

impl LegacyTx {
    /// Build a new `LegacyTx`.
    pub fn new(version: u32, vin: Vec<TxIn>, vout: Vec<TxOut>, locktime: u32) -> Self {
        Self {
            version,
            vin,
            vout,
            locktime,
        }
    }

    /// The transaction id: the double-SHA256 of this transaction's serialization.
    pub fn txid(&self) -> Txid {
        let mut w = txcore::hashes::Hash256Writer::default();
        self.write_to(&mut w).expect("writes to a Sha256 hasher never fail");
        txcore::hashes::MarkedDigestWriter::finish_marked(w)
    }

    /// Performs steps 6, 7, and 8 of the classic sighash setup: substitute `prevout_script` into
    /// the `script_sig` of the input at `index`, and null out every other input's `script_sig`.
    fn sighash_prep(&self, index: usize, prevout_script: &Script) -> Self {
        let mut copy_tx = self.clone();
        for (i, input) in copy_tx.vin.iter_mut().enumerate() {
            input.script_sig = if i == index {
                ScriptSig::from(prevout_script.items())
            } else {
                ScriptSig::null()
            };
        }
        copy_tx
    }

    /// Applies legacy `SIGHASH_SINGLE` semantics in place: blanks every output before `index`,
    /// keeps only the output at `index`, drops every output after it, and zeroes every other
    /// input's sequence number.
    fn apply_sighash_single(copy_tx: &mut Self, index: usize) {
        let mut outs: Vec<TxOut> = (0..index).map(|_| TxOut::null()).collect();
        outs.push(copy_tx.vout[index].clone());
        copy_tx.vout = outs;

        for (i, input) in copy_tx.vin.iter_mut().enumerate() {
            if i != index {
                input.sequence = 0;
            }
        }
    }

    /// Applies `ANYONECANPAY` semantics in place: keeps only the input being signed.
    fn apply_anyone_can_pay(copy_tx: &mut Self, index: usize) {
        copy_tx.vin = vec![copy_tx.vin[index].clone()];
    }

    /// Write the SIGHASH_ALL/SINGLE/ANYONECANPAY preimage for `args` to `writer`.
    pub fn write_legacy_sighash_preimage<W: Write>(
        &self,
        writer: &mut W,
        args: &LegacySighashArgs,
    ) -> TxResult<()> {
        if args.sighash_flag == Sighash::None || args.sighash_flag == Sighash::NoneAnyoneCanPay {
            return Err(TxError::NoneUnsupported);
        }
        if args.index >= self.vin.len() {
            return Err(TxError::InputIndexOutOfRange(args.index, self.vin.len()));
        }

        let mut copy_tx = self.sighash_prep(args.index, args.prevout_script);

        if args.sighash_flag == Sighash::Single || args.sighash_flag == Sighash::SingleAnyoneCanPay
        {
            if args.index >= self.vout.len() {
                return Err(TxError::SighashSingleBug(args.index));
            }
            Self::apply_sighash_single(&mut copy_tx, args.index);
        }

        if args.sighash_flag.is_anyone_can_pay() {
            Self::apply_anyone_can_pay(&mut copy_tx, args.index);
        }

        copy_tx.write_to(writer)?;
        Self::write_u32_le(writer, args.sighash_flag as u32)?;
        Ok(())
    }

    /// Compute the double-SHA256 legacy sighash digest for `args`.
    pub fn legacy_sighash(&self, args: &LegacySighashArgs) -> TxResult<txcore::hashes::Hash256Digest> {
        let mut w = txcore::hashes::Hash256Writer::default();
        self.write_legacy_sighash_preimage(&mut w, args)?;
        Ok(txcore::hashes::MarkedDigestWriter::finish(w))
    }
}

impl ByteFormat for LegacyTx {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        let mut len = 4; // version
        len += compact_int_length(self.vin.len() as u64);
        len += self.vin.iter().map(|i| i.serialized_length()).sum::<usize>();
        len += compact_int_length(self.vout.len() as u64);
        len += self
            .vout
            .iter()
            .map(|o| o.serialized_length())
            .sum::<usize>();
        len += 4; // locktime
        len
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let version = Self::read_u32_le(reader)?;
        let vin_len = read_compact_int(reader)?;
        let vin = (0..vin_len)
            .map(|_| TxIn::read_from(reader).map_err(TxError::from))
            .collect::<TxResult<Vec<_>>>()?;
        let vout_len = read_compact_int(reader)?;
        let vout = (0..vout_len)
            .map(|_| TxOut::read_from(reader).map_err(TxError::from))
            .collect::<TxResult<Vec<_>>>()?;
        let locktime = Self::read_u32_le(reader)?;
        Ok(Self {
            version,
            vin,
            vout,
            locktime,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        let mut len = Self::write_u32_le(writer, self.version)?;
        len += write_compact_int(writer, self.vin.len() as u64)?;
        for input in &self.vin {
            len += input.write_to(writer)?;
        }
        len += write_compact_int(writer, self.vout.len() as u64)?;
        for output in &self.vout {
            len += output.write_to(writer)?;
        }
        len += Self::write_u32_le(writer, self.locktime)?;
        Ok(len)
    }
}
