use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::quote::SwapQuote;
use crate::serde_helpers::field_as_string;

/// Body of the swap-build request: the opaque quote plus the identity the
/// transaction is built for.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest<'a> {
    pub quote_response: &'a SwapQuote,
    #[serde(with = "field_as_string")]
    pub user_public_key: Pubkey,
    pub wrap_and_unwrap_sol: bool,
}

/// Swap-build response: a base64-encoded, versioned, not-yet-signed
/// transaction envelope.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SwapBuildResponse {
    pub swap_transaction: String,
}
