//! Key derivation and ECDSA signing traits.
//!
//! These traits stand in for BIP32 key-tree derivation and secp256k1 field arithmetic, exactly as
//! `coins_bip32::model::{SigningKey, DerivePrivateChild}` stand in for the same concerns in the
//! teacher lineage (see `bip32/src/model.rs`). This crate never implements either; it only
//! describes the shape a caller's implementation must have.

use thiserror::Error;

/// Errors a key-derivation or signing backend may report.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The requested derivation path could not be walked (e.g. a hardened step past a
    /// public-only node, or a backend-specific failure).
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    /// The signing backend failed to produce a signature for an otherwise-valid digest.
    #[error("ECDSA signing failed: {0}")]
    SigningFailed(String),
}

/// A BIP32-style derivation path: a sequence of (possibly hardened) child indices from the
/// session root. Hardened indices are represented with the high bit already set, matching the
/// wire encoding used by `address_n` in the protocol (see `txsigning::protocol`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DerivationPath(pub Vec<u32>);

impl DerivationPath {
    /// Build a path from raw indices.
    pub fn new(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    /// Borrow the path's indices.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(v: Vec<u32>) -> Self {
        Self(v)
    }
}

/// A secp256k1 private key scalar. Zeroized on drop; never `Clone`, so a caller cannot
/// accidentally retain a second live copy past the scope that needs it.
///
/// Per the session lifecycle design (`txsigning::state::Session`), a fresh `PrivateKey` is
/// derived immediately before signing one input and dropped immediately after its signature is
/// produced and injected.
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    /// Wrap a raw 32-byte scalar. The caller gives up ownership of `bytes`'s contents; this type
    /// takes over responsibility for zeroizing them.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw scalar bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        for byte in self.0.iter_mut() {
            *byte = 0;
        }
    }
}

/// A compressed secp256k1 public key (33 bytes: a 0x02/0x03 parity prefix and a 32-byte x
/// coordinate). Unlike `PrivateKey`, this is not secret and may be freely cloned/compared.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublicKey(pub [u8; 33]);

impl PublicKey {
    /// Borrow the compressed encoding.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

/// A DER-encoded ECDSA signature, at most 72 bytes (the `SIGHASH` type byte is appended
/// separately by the `Signer`, not carried here).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Secp256k1Signature(pub Vec<u8>);

impl Secp256k1Signature {
    /// Borrow the DER-encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Any type that can walk a derivation path from a session root to a leaf private key. Grounded
/// in `coins_bip32::model::{SigningKey, DerivePrivateChild}` (`bip32/src/model.rs`): this trait is
/// a coarser, session-facing cousin of that pair, collapsing "derive the child node" and "read
/// off its private key" into one call, since the signing core never needs an intermediate node.
pub trait DerivesPrivateKey {
    /// Derive the private key at `path` from this root.
    fn derive_private_key(&self, path: &DerivationPath) -> Result<PrivateKey, KeyError>;
}

/// Any type that can produce deterministic ECDSA signatures and the public key paired with a
/// given private key. The signing core never performs scalar multiplication or field arithmetic
/// itself -- it calls through this trait exclusively.
pub trait Secp256k1Signer {
    /// Sign `digest` (expected to already be a sighash, i.e. the output of a double-SHA256) with
    /// `privkey`, returning a DER-encoded signature.
    fn sign_digest(
        &self,
        privkey: &PrivateKey,
        digest: [u8; 32],
    ) -> Result<Secp256k1Signature, KeyError>;

    /// Derive the compressed public key paired with `privkey`.
    fn derive_pubkey(&self, privkey: &PrivateKey) -> Result<PublicKey, KeyError>;
}
