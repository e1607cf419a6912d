//! Hardware/host abstraction layer.
//!
//! The signing core (see the `txsigning` crate) is deliberately ignorant of *how* keys are
//! derived, *how* signatures are produced, *how* a user is asked to confirm a payment, and *how*
//! coin parameters are looked up. Those are external collaborators -- a display/button subsystem,
//! BIP32 derivation, secp256k1 field arithmetic -- left to the embedding application: this crate
//! defines only the traits the core calls through, plus the small data types those traits pass
//! back and forth. No field arithmetic, no key-tree derivation, and no display rendering live in
//! this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod coin;
pub mod confirm;
pub mod keys;
pub mod progress;

pub use coin::CoinParams;
pub use confirm::Confirmer;
pub use keys::{DerivationPath, DerivesPrivateKey, PrivateKey, PublicKey, Secp256k1Signature, Secp256k1Signer};
pub use progress::ProgressSink;
