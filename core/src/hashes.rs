//! Streaming double-SHA256 and the `MarkedDigest` wrapper pattern.
//!
//! We wrap raw 32-byte digests in named marker types (`TXID`, `SigningDigest`, ...) to prevent
//! type confusion between otherwise-identical `[u8; 32]` values that mean different things.

use std::io::Write;

use ripemd160::Ripemd160;
use sha2::{Digest as _, Sha256};

use crate::ser::{ByteFormat, SerError};

/// Marks a raw hash function digest (a bare `[u8; 32]`-shaped value).
pub trait Digest: Default + Copy + AsRef<[u8]> {}

/// A named wrapper around a `Digest`. Implementors prevent mixing up, e.g., a txid with a
/// sighash, even though both are 32 bytes.
pub trait MarkedDigest: Default + Copy {
    /// The underlying digest type this marker wraps.
    type Digest: Digest;

    /// Wrap a digest in the marker.
    fn new(hash: Self::Digest) -> Self;

    /// Return a copy of the internal digest.
    fn internal(&self) -> Self::Digest;
}

/// A `Write`-implementing hasher that finishes into a `Digest`. Parameterized by the digest type
/// it outputs so a single hashing algorithm can back several marker types.
pub trait MarkedDigestWriter<T: Digest>: Default + Write {
    /// Consume the hasher and return its digest.
    fn finish(self) -> T;

    /// Consume the hasher, finish it, and wrap the result in a `MarkedDigest`.
    fn finish_marked<M: MarkedDigest<Digest = T>>(self) -> M
    where
        Self: Sized,
    {
        MarkedDigest::new(self.finish())
    }
}

/// A raw 32-byte SHA256(SHA256(..)) digest.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Hash256Digest(pub [u8; 32]);

impl Default for Hash256Digest {
    fn default() -> Self {
        Self([0u8; 32])
    }
}

impl AsRef<[u8]> for Hash256Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Digest for Hash256Digest {}

impl ByteFormat for Hash256Digest {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        32
    }

    fn read_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Self::Error> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(Self(buf))
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
        writer.write_all(&self.0)?;
        Ok(32)
    }
}

/// A streaming hasher that always double-hashes (`SHA256(SHA256(m))`) on `finish`, matching
/// Bitcoin's convention for txids and sighashes.
#[derive(Default)]
pub struct Hash256Writer(Sha256);

impl Write for Hash256Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl MarkedDigestWriter<Hash256Digest> for Hash256Writer {
    fn finish(self) -> Hash256Digest {
        let first = self.0.finalize();
        let second = Sha256::digest(&first);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second);
        Hash256Digest(out)
    }
}

/// Hash `preimage` with a single round of SHA256. Used for the cross-phase tamper checksum,
/// which is explicitly *not* Bitcoin's double-SHA256 (see the signing crate's `TxChecksum`).
pub fn sha256(preimage: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(preimage);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Hash `preimage` with Bitcoin's HASH160: `RIPEMD160(SHA256(preimage))`. Used to turn a
/// compressed public key into the 20-byte hash embedded in a pay-to-pubkey-hash script.
pub fn hash160(preimage: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(preimage);
    let ripemd = Ripemd160::digest(&sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd);
    out
}

/// Hash `preimage` with double SHA256. Convenience wrapper around `Hash256Writer` for one-shot
/// callers that already have the whole preimage in memory (e.g. tests).
pub fn hash256(preimage: &[u8]) -> Hash256Digest {
    let mut w = Hash256Writer::default();
    w.write_all(preimage).expect("writes to a Sha256 never fail");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_matches_known_double_sha256_vectors() {
        // sha256d("") per standard test vectors.
        let digest = hash256(b"");
        assert_eq!(
            hex::encode(digest.0),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn it_streams_identically_to_one_shot_hashing() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let one_shot = hash256(data);

        let mut w = Hash256Writer::default();
        for chunk in data.chunks(7) {
            w.write_all(chunk).unwrap();
        }
        let streamed = w.finish();

        assert_eq!(one_shot, streamed);
    }

    #[test]
    fn it_matches_a_known_hash160_vector() {
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        assert_eq!(
            hex::encode(hash160(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd"
        );
    }
}
