use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

#[derive(Serialize, Deserialize, Default, PartialEq, Clone, Debug)]
pub enum SwapMode {
    #[default]
    ExactIn,
    ExactOut,
}

impl FromStr for SwapMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ExactIn" => Ok(Self::ExactIn),
            "ExactOut" => Ok(Self::ExactOut),
            _ => Err(anyhow!("{} is not a valid SwapMode", s)),
        }
    }
}

/// Parameters for the quote endpoint. Amounts are in the smallest unit of
/// the input mint.
#[derive(Debug, Default, Clone)]
pub struct QuoteRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount: u64,
    pub slippage_bps: u16,
    pub restrict_intermediate_tokens: bool,
    pub swap_mode: Option<SwapMode>,
    pub max_accounts: Option<usize>,
}

/// Priced route returned by the quote endpoint.
///
/// The payload is passed back to the swap-build endpoint verbatim, so it is
/// kept opaque instead of being mapped onto route-plan types. Only a couple
/// of fields are peeked at for log lines.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(transparent)]
pub struct SwapQuote(pub serde_json::Value);

impl SwapQuote {
    /// Estimated output amount, when the quote carries one.
    pub fn out_amount(&self) -> Option<u64> {
        self.0.get("outAmount")?.as_str()?.parse().ok()
    }

    /// Number of route steps, when the quote carries a route plan.
    pub fn route_steps(&self) -> Option<usize> {
        Some(self.0.get("routePlan")?.as_array()?.len())
    }
}
