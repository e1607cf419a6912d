//! Bitcoin-specific marker digests, built atop `txcore`'s generic `MarkedDigest` pattern.

use txcore::hashes::{Hash256Digest, MarkedDigest};

/// A transaction ID: the double-SHA256 of a transaction's legacy (non-witness) serialization.
///
/// Wrapped separately from a bare `Hash256Digest` so a txid can never be silently compared
/// against, say, a sighash or a previous-tx-hash computed for an unrelated purpose.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Txid(Hash256Digest);

impl MarkedDigest for Txid {
    type Digest = Hash256Digest;

    fn new(hash: Hash256Digest) -> Self {
        Self(hash)
    }

    fn internal(&self) -> Hash256Digest {
        self.0
    }
}

impl Txid {
    /// Return the underlying 32 raw bytes, in internal (not RPC-reversed) byte order.
    pub fn as_bytes(&self) -> [u8; 32] {
        (self.0).0
    }
}

impl From<Hash256Digest> for Txid {
    fn from(d: Hash256Digest) -> Self {
        Self(d)
    }
}

impl AsRef<[u8]> for Txid {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
