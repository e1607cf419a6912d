//! Streaming transaction framing: `TxHasher` incrementally hashes a transaction it never holds in
//! memory, and `TxBuilder` incrementally re-emits one as wire bytes. Both share the same lazy
//! header/footer bookkeeping -- the version and input count are not known to be "final" until the
//! first input arrives, and the output count switch happens exactly once, on the first output.
//!
//! Modeled on `MarkedDigestWriter` (see `txcore::hashes`): a `Write`-shaped value type that owns
//! its hasher state and is consumed by value on `finalize`.

use std::io::{self, Write};

use sha2::{Digest as _, Sha256};

use txcore::ser::{write_compact_int, ByteFormat, SerError};

use crate::txin::TxIn;
use crate::txout::TxOut;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum FrameState {
    Pending,
    InputsStarted,
    OutputsStarted,
}

/// Lazy header/footer bookkeeping shared by `TxHasher` and `TxBuilder`.
#[derive(Clone, Copy, Debug)]
struct Framer {
    state: FrameState,
    version: u32,
    inputs_count: u64,
    outputs_count: u64,
}

impl Framer {
    fn new(version: u32, inputs_count: u64, outputs_count: u64) -> Self {
        Self {
            state: FrameState::Pending,
            version,
            inputs_count,
            outputs_count,
        }
    }

    /// Emit whatever header bytes are due before the next input or output, advancing `state`.
    fn before_input<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        if self.state == FrameState::Pending {
            w.write_all(&self.version.to_le_bytes())?;
            write_compact_int(w, self.inputs_count).map_err(io_err)?;
            self.state = FrameState::InputsStarted;
        }
        Ok(())
    }

    fn before_output<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.before_input(w)?; // covers the zero-input edge case
        if self.state == FrameState::InputsStarted {
            write_compact_int(w, self.outputs_count).map_err(io_err)?;
            self.state = FrameState::OutputsStarted;
        }
        Ok(())
    }
}

fn io_err(e: SerError) -> io::Error {
    match e {
        SerError::IOError(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

/// Adapts a bare `Sha256` accumulator to `std::io::Write`, so the shared `Framer`/`ByteFormat`
/// machinery (which only knows how to write to a `Write` sink) can feed it without requiring
/// `sha2::Sha256` itself to implement `Write`.
struct HasherSink<'a>(&'a mut Sha256);

impl<'a> Write for HasherSink<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A streaming encoder/hasher for a transaction never fully materialized in memory.
///
/// Construct with the transaction's version and final input/output counts (known up front from
/// the protocol's metadata message), then feed inputs and outputs one at a time as they stream
/// in. `finalize` appends the locktime and returns the accumulated digest.
pub struct TxHasher {
    framer: Framer,
    hasher: Sha256,
}

impl TxHasher {
    /// Begin a new streaming hash.
    pub fn new(version: u32, inputs_count: u64, outputs_count: u64) -> Self {
        Self {
            framer: Framer::new(version, inputs_count, outputs_count),
            hasher: Sha256::new(),
        }
    }

    /// Feed a raw varint-encoded unsigned integer into the hash, with no framing side effects.
    pub fn add_varint(&mut self, n: u64) {
        write_compact_int(&mut HasherSink(&mut self.hasher), n)
            .expect("writes to a Sha256 hasher never fail");
    }

    /// Feed a little-endian `u32`.
    pub fn add_u32_le(&mut self, n: u32) {
        self.hasher.update(&n.to_le_bytes());
    }

    /// Feed a little-endian `u64`.
    pub fn add_u64_le(&mut self, n: u64) {
        self.hasher.update(&n.to_le_bytes());
    }

    /// Feed raw bytes with no length prefix.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Feed one transaction input: `prev_hash(32) || prev_index(u32 LE) || varint(script_len) ||
    /// script || sequence(u32 LE)`. Emits the lazily-deferred version/input-count header first if
    /// this is the first input seen.
    pub fn serialize_input(&mut self, input: &TxIn) {
        self.framer
            .before_input(&mut HasherSink(&mut self.hasher))
            .expect("writes to a Sha256 hasher never fail");
        input
            .write_to(&mut HasherSink(&mut self.hasher))
            .expect("writes to a Sha256 hasher never fail");
    }

    /// Feed one transaction output: `amount(u64 LE) || varint(script_len) || script`. Emits the
    /// lazily-deferred output-count header first if this is the first output seen.
    pub fn serialize_output(&mut self, output: &TxOut) {
        self.framer
            .before_output(&mut HasherSink(&mut self.hasher))
            .expect("writes to a Sha256 hasher never fail");
        output
            .write_to(&mut HasherSink(&mut self.hasher))
            .expect("writes to a Sha256 hasher never fail");
    }

    /// Consume the hasher, producing its digest. A single SHA-256 round if `double` is `false`;
    /// `SHA256(SHA256(..))` (Bitcoin's usual convention) if `true`.
    pub fn finalize(self, double: bool) -> [u8; 32] {
        let first = self.hasher.finalize();
        let mut out = [0u8; 32];
        if double {
            out.copy_from_slice(&Sha256::digest(&first));
        } else {
            out.copy_from_slice(&first);
        }
        out
    }
}

impl Write for TxHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hasher.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A streaming re-encoder that emits a transaction's canonical wire bytes one piece at a time,
/// for relay back to the host as `TxRequest.serialized_tx` chunks.
///
/// Each method returns exactly the bytes it wrote (including any header bytes the lazy framer
/// chose to emit on this call), so the caller can forward them immediately without buffering the
/// whole transaction.
pub struct TxBuilder {
    framer: Framer,
}

impl TxBuilder {
    /// Begin a new streaming build.
    pub fn new(version: u32, inputs_count: u64, outputs_count: u64) -> Self {
        Self {
            framer: Framer::new(version, inputs_count, outputs_count),
        }
    }

    /// Emit the next input, returning the bytes written (header included, if this was the first).
    pub fn serialize_input(&mut self, input: &TxIn) -> Vec<u8> {
        let mut buf = Vec::with_capacity(input.serialized_length() + 5);
        self.framer
            .before_input(&mut buf)
            .expect("writes to a Vec never fail");
        input
            .write_to(&mut buf)
            .expect("writes to a Vec never fail");
        buf
    }

    /// Emit the next output, returning the bytes written (header included, if this was the first).
    pub fn serialize_output(&mut self, output: &TxOut) -> Vec<u8> {
        let mut buf = Vec::with_capacity(output.serialized_length() + 5);
        self.framer
            .before_output(&mut buf)
            .expect("writes to a Vec never fail");
        output
            .write_to(&mut buf)
            .expect("writes to a Vec never fail");
        buf
    }

    /// Emit the final footer: `lock_time(u32 LE)`.
    pub fn finalize(self, lock_time: u32) -> Vec<u8> {
        lock_time.to_le_bytes().to_vec()
    }
}
