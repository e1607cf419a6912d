//! Shared primitives: byte-exact serialization (`ByteFormat`) and streaming digests
//! (`MarkedDigest`/`MarkedDigestWriter`) used by every crate in the workspace.
//!
//! Nothing in this crate knows about Bitcoin. It provides the vocabulary that the `txbitcoin`
//! crate specializes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Byte-exact serialization trait and varint helpers.
pub mod ser;

/// Streaming digest primitives: double-SHA256 and the `MarkedDigest` wrapper pattern.
pub mod hashes;
