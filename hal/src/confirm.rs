//! The user-confirmation capability.
//!
//! The signing core never renders a screen; it calls through `Confirmer` at exactly the gates
//! described in the state machine design and consumes a synchronous accept/reject answer.
//! Injected the way `coins_ledger`'s `LedgerAsync` trait is injected behind `Ledger`
//! (`ledger/src/transports/mod.rs`), except synchronous: the core's dispatch loop is itself
//! synchronous (see §5 of the design notes), so there is no `async_trait` here.

/// Confirmation gates the signing core calls through during a session.
pub trait Confirmer {
    /// Ask the user to confirm sending `amount` (in satoshis) to `address`. Called once per
    /// non-change output in Stage 3.
    fn confirm_output(&mut self, address: &str, amount: u64) -> bool;

    /// Ask the user to confirm a fee that exceeds the coin's per-kilobyte ceiling. Called at most
    /// once, after all outputs have been classified.
    fn confirm_fee(&mut self, fee: u64) -> bool;

    /// Ask the user for the final go/no-go: total amount leaving the wallet (spend minus change)
    /// and the fee. Called exactly once, as the last gate before signing begins.
    fn confirm_total(&mut self, total_amount: u64, fee: u64) -> bool;
}

/// A `Confirmer` that accepts every prompt. Useful for tests and for headless/automated signing
/// flows that perform their own out-of-band authorization.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl Confirmer for AcceptAll {
    fn confirm_output(&mut self, _address: &str, _amount: u64) -> bool {
        true
    }

    fn confirm_fee(&mut self, _fee: u64) -> bool {
        true
    }

    fn confirm_total(&mut self, _total_amount: u64, _fee: u64) -> bool {
        true
    }
}
