//! Opaque, length-prefixed script byte vectors.
//!
//! We do not disassemble or execute Script here -- scripts are opaque byte vectors with no
//! semantics, prefixed on the wire by a `CompactInt` length, exactly as `ScriptSig` and
//! `script_pubkey` appear in a serialized transaction.
//!
//! `Script`, `ScriptSig`, and `ScriptPubkey` all wrap the same underlying bytes and freely convert
//! into one another with `From`/`Into`; the distinct names exist so a function that expects a
//! `script_pubkey` can't accidentally be handed a `script_sig`.

use std::io::{Read, Write};
use std::ops::Deref;

use txcore::ser::{compact_int_length, read_compact_int, write_compact_int, ByteFormat, SerError};

/// Defines a newtype wrapping a length-prefixed `Vec<u8>`, with `ByteFormat`, `Deref`, and
/// conversions to/from a bare `Vec<u8>`.
macro_rules! wrap_prefixed_byte_vector {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[derive(Clone, Debug, Default, Eq, PartialEq)]
        pub struct $name(pub Vec<u8>);

        impl $name {
            /// Construct a new instance from any byte-convertible value.
            pub fn new<T: Into<Vec<u8>>>(v: T) -> Self {
                Self(v.into())
            }

            /// The "null" (empty) value: the zero-length byte string, encoded as a single `0x00`
            /// prefix byte and no body.
            pub fn null() -> Self {
                Self(Vec::new())
            }

            /// `true` iff this is the empty byte string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// The number of *payload* bytes (excludes the CompactInt length prefix).
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Borrow the payload bytes.
            pub fn items(&self) -> &[u8] {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = [u8];

            fn deref(&self) -> &[u8] {
                &self.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(v: Vec<u8>) -> Self {
                Self(v)
            }
        }

        impl From<&[u8]> for $name {
            fn from(v: &[u8]) -> Self {
                Self(v.to_vec())
            }
        }

        impl ByteFormat for $name {
            type Error = SerError;

            fn serialized_length(&self) -> usize {
                compact_int_length(self.0.len() as u64) + self.0.len()
            }

            fn read_from<R: Read>(reader: &mut R) -> Result<Self, Self::Error> {
                let len = read_compact_int(reader)?;
                let mut buf = vec![0u8; len as usize];
                reader.read_exact(&mut buf)?;
                Ok(Self(buf))
            }

            fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, Self::Error> {
                let mut len = write_compact_int(writer, self.0.len() as u64)?;
                writer.write_all(&self.0)?;
                len += self.0.len();
                Ok(len)
            }
        }
    };
}

/// Defines lossless `From` conversions between two script-like wrapper types that share the same
/// underlying byte representation.
macro_rules! impl_script_conversion {
    ($a:ident, $b:ident) => {
        impl From<$a> for $b {
            fn from(v: $a) -> Self {
                Self(v.0)
            }
        }

        impl From<$b> for $a {
            fn from(v: $b) -> Self {
                Self(v.0)
            }
        }

        impl From<&$a> for $b {
            fn from(v: &$a) -> Self {
                Self(v.0.clone())
            }
        }

        impl From<&$b> for $a {
            fn from(v: &$b) -> Self {
                Self(v.0.clone())
            }
        }
    };
}

wrap_prefixed_byte_vector!(
    /// A free-standing Script, used to hold e.g. a redeem script or a prevout's `script_pubkey`
    /// when it is being substituted into a sighash preimage.
    Script
);
wrap_prefixed_byte_vector!(
    /// The `script_sig` field of a `TxIn`.
    ScriptSig
);
wrap_prefixed_byte_vector!(
    /// The `script_pubkey` field of a `TxOut`.
    ScriptPubkey
);

impl_script_conversion!(Script, ScriptSig);
impl_script_conversion!(Script, ScriptPubkey);
impl_script_conversion!(ScriptSig, ScriptPubkey);

impl ScriptPubkey {
    /// Build the standard `OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG`
    /// pay-to-pubkey-hash script for the given HASH160 of a public key.
    pub fn p2pkh(pubkey_hash160: &[u8; 20]) -> Self {
        let mut v = Vec::with_capacity(25);
        v.extend(&[0x76, 0xa9, 0x14]); // OP_DUP OP_HASH160 PUSH_20
        v.extend(pubkey_hash160);
        v.extend(&[0x88, 0xac]); // OP_EQUALVERIFY OP_CHECKSIG
        v.into()
    }

    /// Build the standard `OP_HASH160 <20-byte hash> OP_EQUAL` pay-to-script-hash script.
    pub fn p2sh(script_hash160: &[u8; 20]) -> Self {
        let mut v = Vec::with_capacity(23);
        v.extend(&[0xa9, 0x14]); // OP_HASH160 PUSH_20
        v.extend(script_hash160);
        v.push(0x87); // OP_EQUAL
        v.into()
    }
}
