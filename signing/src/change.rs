//! Change-output classification.
//!
//! An output is change -- not separately confirmed, and excluded from `total_amount` at the final
//! gate -- via exactly one of two paths. At most one output per session may be classified as
//! change; a second is a fatal error.

use crate::error::{OtherError, SigningError};
use crate::protocol::{AddressType, OutputScriptType, TxInputType, TxOutputType};

/// Tracks the multisig cosigner fingerprint shared by the inputs seen so far, and whether any
/// output has already claimed the change slot.
#[derive(Default)]
pub struct ChangeDetector {
    multisig_fp: Option<[u8; 32]>,
    /// Becomes `true` the moment any input is not `SpendMultisig`, or has a differing
    /// fingerprint from the first one seen. Once true, it never becomes false again: no output
    /// may be classified as change via the multisig path for the rest of the session.
    multisig_fp_mismatch: bool,
    change_claimed: bool,
}

impl ChangeDetector {
    /// Build a fresh detector with no inputs observed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once any input broke multisig fingerprint consensus.
    pub fn multisig_fp_mismatch(&self) -> bool {
        self.multisig_fp_mismatch
    }

    /// Fold in one more input's multisig fingerprint (or lack thereof).
    pub fn observe_input(&mut self, input: &TxInputType) {
        if self.multisig_fp_mismatch {
            return;
        }
        match &input.multisig {
            Some(multisig) => {
                let fp = multisig_fingerprint(multisig);
                match self.multisig_fp {
                    None => self.multisig_fp = Some(fp),
                    Some(existing) if existing == fp => {}
                    Some(_) => self.multisig_fp_mismatch = true,
                }
            }
            None => self.multisig_fp_mismatch = true,
        }
    }

    /// Classify `output`, recording it as the session's change output if it qualifies.
    ///
    /// Returns `Ok(true)` if `output` is change, `Ok(false)` if it is an ordinary spend, or
    /// `Err` if the output is malformed or a second change output was claimed. A declared
    /// `Spend` with no address, a declared `Transfer` with no derivation path, or a declared
    /// `Change` with no derivation path are all malformed and rejected rather than silently
    /// treated as an ordinary spend.
    pub fn classify(&mut self, output: &TxOutputType) -> Result<bool, SigningError> {
        let is_change = match (output.script_type, &output.address_type) {
            (OutputScriptType::PayToMultisig, _) => {
                output.multisig.as_ref().map_or(false, |multisig| {
                    !self.multisig_fp_mismatch
                        && self
                            .multisig_fp
                            .map_or(false, |fp| fp == multisig_fingerprint(multisig))
                })
            }
            (OutputScriptType::PayToAddress, address_type) => {
                let has_path = !output.address_n.as_slice().is_empty();
                match address_type {
                    None => has_path,
                    Some(AddressType::Change) if has_path => true,
                    Some(AddressType::Change) => {
                        return Err(SigningError::Other(OtherError::InvalidAddressType))
                    }
                    Some(AddressType::Spend) if output.address.is_some() => false,
                    Some(AddressType::Spend) => {
                        return Err(SigningError::Other(OtherError::InvalidAddressType))
                    }
                    Some(AddressType::Transfer) if has_path => false,
                    Some(AddressType::Transfer) => {
                        return Err(SigningError::Other(OtherError::InvalidAddressType))
                    }
                }
            }
        };

        if is_change {
            if self.change_claimed {
                return Err(SigningError::Other(OtherError::TooManyChangeOutputs));
            }
            self.change_claimed = true;
        }

        Ok(is_change)
    }
}

/// A 32-byte fingerprint over a multisig redeem script's sorted cosigner pubkey set, stable under
/// signature-slot reordering. Used to recognize "this multisig output belongs to the same cohort
/// of inputs" without caring which cosigner holds which slot.
pub fn multisig_fingerprint(multisig: &crate::protocol::MultisigRedeemScriptType) -> [u8; 32] {
    let mut pubkeys: Vec<&[u8; 33]> = multisig.pubkeys.iter().collect();
    pubkeys.sort_unstable();
    let mut buf = Vec::with_capacity(pubkeys.len() * 33 + 1);
    for pubkey in pubkeys {
        buf.extend_from_slice(pubkey);
    }
    buf.push(multisig.signatures_required);
    txcore::hashes::sha256(&buf)
}
