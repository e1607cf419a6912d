//! Computes one input's legacy `SIGHASH_ALL` digest and injects its final `script_sig`.
//!
//! The `ecdsa_sign_digest` primitive and the BIP32 derivation that produces the signing
//! `PrivateKey` are external collaborators (see `txhal::keys`); this module never implements
//! field arithmetic or key-tree derivation itself, only the sighash/script-assembly bookkeeping
//! around them.

use txbitcoin::{Script, ScriptSig};
use txhal::keys::PublicKey;

use crate::error::{OtherError, SigningError};
use crate::protocol::{InputScriptType, MultisigRedeemScriptType, TxInputType};

/// Builds the script substituted into `script_sig` for the input currently being signed: the
/// previous output's spending script, in the shape required by `script_type`.
pub fn prevout_script(input: &TxInputType, pubkey: &PublicKey) -> Result<Script, SigningError> {
    match input.script_type {
        InputScriptType::SpendAddress => {
            let hash160 = txcore::hashes::hash160(pubkey.as_bytes());
            Ok(txbitcoin::ScriptPubkey::p2pkh(&hash160).into())
        }
        InputScriptType::SpendMultisig => {
            let multisig = input
                .multisig
                .as_ref()
                .ok_or(SigningError::Other(OtherError::MissingMultisigInfo))?;
            Ok(redeem_script(multisig))
        }
    }
}

/// Serialize a multisig redeem script: `OP_m <pubkey>* OP_n OP_CHECKMULTISIG`.
pub fn redeem_script(multisig: &MultisigRedeemScriptType) -> Script {
    let mut v = Vec::new();
    v.push(op_n(multisig.signatures_required));
    for pubkey in &multisig.pubkeys {
        v.push(pubkey.len() as u8);
        v.extend_from_slice(pubkey);
    }
    v.push(op_n(multisig.pubkeys.len() as u8));
    v.push(0xae); // OP_CHECKMULTISIG
    Script::new(v)
}

fn op_n(n: u8) -> u8 {
    0x50 + n // OP_1 == 0x51, so OP_n == 0x50 + n for 1 <= n <= 16
}

/// Assembles the final `script_sig` for a signed input, given its DER signature and (for
/// multisig inputs) the signing pubkey's slot.
pub fn finalize_script_sig(
    input: &TxInputType,
    signature_der: &[u8],
    pubkey: &PublicKey,
) -> Result<ScriptSig, SigningError> {
    match input.script_type {
        InputScriptType::SpendAddress => {
            let mut v = Vec::with_capacity(signature_der.len() + 2 + pubkey.as_bytes().len() + 1);
            v.push((signature_der.len() + 1) as u8);
            v.extend_from_slice(signature_der);
            v.push(0x01); // SIGHASH_ALL
            v.push(pubkey.as_bytes().len() as u8);
            v.extend_from_slice(pubkey.as_bytes());
            Ok(ScriptSig::new(v))
        }
        InputScriptType::SpendMultisig => {
            let multisig = input
                .multisig
                .as_ref()
                .ok_or(SigningError::Other(OtherError::MissingMultisigInfo))?;
            let slot = multisig
                .pubkey_index(pubkey.as_bytes())
                .ok_or(SigningError::Other(OtherError::PubkeyNotInMultisig))?;

            let mut sigs: Vec<Option<Vec<u8>>> = vec![None; multisig.pubkeys.len()];
            let mut sig = signature_der.to_vec();
            sig.push(0x01); // SIGHASH_ALL
            sigs[slot] = Some(sig);

            let mut v = Vec::new();
            v.push(0x00); // OP_0: off-by-one bug workaround consumed by OP_CHECKMULTISIG
            for maybe_sig in sigs.into_iter().flatten() {
                v.push(maybe_sig.len() as u8);
                v.extend(maybe_sig);
            }
            let redeem = redeem_script(multisig);
            v.push(redeem.len() as u8);
            v.extend_from_slice(&redeem);
            Ok(ScriptSig::new(v))
        }
    }
}
