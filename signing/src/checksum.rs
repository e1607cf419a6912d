//! The cross-phase tamper checksum.
//!
//! A single-round (non-Bitcoin) SHA-256 used purely to detect tampering between Phase 1
//! (inspection: Stages 1-3) and Phase 2 (signing: Stages 4-5). The host streams every input and
//! output twice; if what it sends in Phase 2 differs at all from what it sent in Phase 1, the
//! device displayed confirmations for a transaction it is not actually signing. This checksum
//! makes that divergence detectable without re-displaying anything.
//!
//! Resolves the open question in the original firmware's favor of portability (see the design
//! notes' "Endianness (resolved)" entry): seeded with canonical little-endian encodings of the
//! transaction shape, then fed each input/output's canonical `ByteFormat` encoding -- never a raw
//! memory image.

use txbitcoin::{ScriptSig, TxIn, TxOut};
use txcore::hashes::sha256;
use txcore::ser::ByteFormat;

use crate::protocol::TxInputType;

/// A rolling, finalize-twice checksum over the host-declared transaction shape.
pub struct TxChecksum {
    buf: Vec<u8>,
}

impl TxChecksum {
    /// Seed a new checksum with the transaction's declared shape:
    /// `inputs_count || outputs_count || version || lock_time`, each a little-endian `u32`.
    pub fn new(inputs_count: u32, outputs_count: u32, version: u32, lock_time: u32) -> Self {
        let mut buf = Vec::with_capacity(16);
        buf.extend(&inputs_count.to_le_bytes());
        buf.extend(&outputs_count.to_le_bytes());
        buf.extend(&version.to_le_bytes());
        buf.extend(&lock_time.to_le_bytes());
        Self { buf }
    }

    /// Feed one input's canonical encoding. `script_sig` is expected to be empty at this point in
    /// the protocol (Stage 1/Stage 4 inputs carry no signature yet); it is encoded exactly as
    /// received, whatever its contents.
    pub fn update_input(&mut self, input: &TxInputType) {
        let txin = TxIn::new(input.outpoint(), input.script_sig.clone(), input.sequence);
        txin.write_to(&mut self.buf)
            .expect("writes to a Vec never fail");
    }

    /// Feed one compiled output's canonical encoding.
    pub fn update_output(&mut self, output: &TxOut) {
        output
            .write_to(&mut self.buf)
            .expect("writes to a Vec never fail");
    }

    /// Finalize the checksum as it stands. Does not consume `self`: the same running buffer is
    /// hashed again at the end of Phase 2 for comparison against the Phase 1 digest.
    pub fn finalize(&self) -> [u8; 32] {
        sha256(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txhal::DerivationPath;

    fn sample_input() -> TxInputType {
        TxInputType {
            address_n: DerivationPath::new(vec![0x8000_002c, 0x8000_0000, 0x8000_0000, 0, 0]),
            prev_hash: [0x44u8; 32],
            prev_index: 0,
            script_sig: ScriptSig::null(),
            sequence: 0xffff_ffff,
            script_type: crate::protocol::InputScriptType::SpendAddress,
            multisig: None,
        }
    }

    #[test]
    fn it_is_deterministic_for_identical_input_streams() {
        let a = {
            let mut c = TxChecksum::new(1, 1, 1, 0);
            c.update_input(&sample_input());
            c.finalize()
        };
        let b = {
            let mut c = TxChecksum::new(1, 1, 1, 0);
            c.update_input(&sample_input());
            c.finalize()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn it_detects_a_single_mutated_field() {
        let mut tampered = sample_input();
        tampered.sequence = 0;

        let original = {
            let mut c = TxChecksum::new(1, 1, 1, 0);
            c.update_input(&sample_input());
            c.finalize()
        };
        let changed = {
            let mut c = TxChecksum::new(1, 1, 1, 0);
            c.update_input(&tampered);
            c.finalize()
        };
        assert_ne!(original, changed);
    }

    #[test]
    fn it_is_not_bitcoins_double_sha256() {
        // Sanity check that this checksum is a single SHA-256 round, distinct from `TxHasher`'s
        // double-round convention, per the explicit non-Bitcoin design note.
        let c = TxChecksum::new(0, 0, 1, 0);
        let single = c.finalize();
        let double = txcore::hashes::hash256(&c.buf);
        assert_ne!(single, double.0);
    }
}
