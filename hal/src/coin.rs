//! Coin parameters: the small, read-only table of per-network constants the signing core
//! consults (never mutates). A general-purpose Bitcoin library's network table would carry many
//! more fields (bech32 HRPs, message-signing prefixes, full address encoders); this signing core
//! only needs enough to gate a fee prompt and label an amount.

/// Per-coin parameters the signing core needs: how much fee is "a lot" per kilobyte, and how to
/// label/scale amounts for confirmation prompts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CoinParams {
    /// The base58check version byte for P2PKH addresses on this coin/network.
    pub address_version: u8,
    /// The base58check version byte for P2SH addresses on this coin/network.
    pub script_version: u8,
    /// The fee, in satoshis per kilobyte of estimated transaction size, above which the
    /// `Confirmer::confirm_fee` gate is triggered.
    pub maxfee_kb: u64,
    /// The display symbol used in confirmation prompts (e.g. `"BTC"`).
    pub symbol: &'static str,
    /// The number of decimal places used to format a satoshi amount for display.
    pub decimals: u8,
}

impl CoinParams {
    /// Bitcoin mainnet parameters.
    pub fn bitcoin_mainnet() -> Self {
        Self {
            address_version: 0x00,
            script_version: 0x05,
            maxfee_kb: 10_000,
            symbol: "BTC",
            decimals: 8,
        }
    }

    /// Bitcoin testnet parameters.
    pub fn bitcoin_testnet() -> Self {
        Self {
            address_version: 0x6f,
            script_version: 0xc4,
            maxfee_kb: 10_000,
            symbol: "tBTC",
            decimals: 8,
        }
    }

    /// Format a satoshi amount as a decimal string in this coin's display unit, e.g. `100000000`
    /// sat on `decimals = 8` renders as `"1.00000000"`.
    pub fn format_amount(&self, amount_sat: u64) -> String {
        let decimals = self.decimals as usize;
        let divisor = 10u64.pow(self.decimals as u32);
        format!(
            "{}.{:0width$}",
            amount_sat / divisor,
            amount_sat % divisor,
            width = decimals
        )
    }
}
