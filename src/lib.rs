use crate::quote::{QuoteRequest, SwapQuote};
use crate::swap::{SwapBuildResponse, SwapRequest};
use reqwest::Response;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub mod augment;
pub mod config;
pub mod flow;
pub mod lookup;
pub mod quote;
pub mod serde_helpers;
pub mod submit;
pub mod swap;

pub use config::FlowConfig;
pub use flow::{FlowError, FlowOutcome, SwapFlow};

const QUOTE_API_URL: &str = "https://quote-api.jup.ag/v6";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("quote request failed with status {status}: {body}")]
    QuoteUnavailable {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("swap build failed with status {status}: {body}")]
    SwapBuildFailed {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Client for the swap aggregation API: priced quotes and pre-built,
/// unsigned swap transactions.
pub struct SwapApiClient {
    client: reqwest::Client,
    base_path: String,
}

impl SwapApiClient {
    pub fn new(base_path: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_path: base_path.unwrap_or_else(|| QUOTE_API_URL.to_string()),
        }
    }

    /// Fetches a priced route for the requested swap. The response is kept
    /// opaque and handed back to the swap-build endpoint verbatim.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<SwapQuote, ClientError> {
        let params = build_query_params(request);
        let response = self
            .client
            .get(format!("{}/quote", self.base_path))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = read_error_body(response).await;
            return Err(ClientError::QuoteUnavailable { status, body });
        }

        Ok(SwapQuote(response.json().await?))
    }

    /// Exchanges a quote for a serialized, not-yet-signed swap transaction
    /// built for `user_public_key`.
    pub async fn swap_transaction(
        &self,
        quote: &SwapQuote,
        user_public_key: &Pubkey,
    ) -> Result<SwapBuildResponse, ClientError> {
        let request = SwapRequest {
            quote_response: quote,
            user_public_key: *user_public_key,
            wrap_and_unwrap_sol: true,
        };

        let response = self
            .client
            .post(format!("{}/swap", self.base_path))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = read_error_body(response).await;
            return Err(ClientError::SwapBuildFailed { status, body });
        }

        Ok(response.json().await?)
    }
}

fn build_query_params(request: &QuoteRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("inputMint", request.input_mint.to_string()),
        ("outputMint", request.output_mint.to_string()),
        ("amount", request.amount.to_string()),
        (
            "restrictIntermediateTokens",
            request.restrict_intermediate_tokens.to_string(),
        ),
        ("slippageBps", request.slippage_bps.to_string()),
    ];

    if let Some(swap_mode) = &request.swap_mode {
        params.push((
            "swapMode",
            match swap_mode {
                quote::SwapMode::ExactIn => "ExactIn",
                quote::SwapMode::ExactOut => "ExactOut",
            }
            .to_string(),
        ));
    }
    if let Some(max_accounts) = request.max_accounts {
        params.push(("maxAccounts", max_accounts.to_string()));
    }

    params
}

async fn read_error_body(response: Response) -> (reqwest::StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::SwapMode;

    fn sample_request() -> QuoteRequest {
        QuoteRequest {
            input_mint: Pubkey::new_unique(),
            output_mint: Pubkey::new_unique(),
            amount: 100_000_000,
            slippage_bps: 50,
            restrict_intermediate_tokens: true,
            ..Default::default()
        }
    }

    #[test]
    fn query_params_carry_swap_parameters() {
        let request = sample_request();
        let params = build_query_params(&request);

        assert!(params.contains(&("inputMint", request.input_mint.to_string())));
        assert!(params.contains(&("outputMint", request.output_mint.to_string())));
        assert!(params.contains(&("amount", "100000000".to_string())));
        assert!(params.contains(&("restrictIntermediateTokens", "true".to_string())));
        assert!(params.contains(&("slippageBps", "50".to_string())));
    }

    #[test]
    fn zero_amount_passes_through() {
        // No client-side validation: amount 0 reaches the API unchanged.
        let request = QuoteRequest {
            amount: 0,
            ..sample_request()
        };
        let params = build_query_params(&request);
        assert!(params.contains(&("amount", "0".to_string())));
    }

    #[test]
    fn optional_params_are_omitted_by_default() {
        let params = build_query_params(&sample_request());
        assert!(params.iter().all(|(key, _)| *key != "swapMode"));
        assert!(params.iter().all(|(key, _)| *key != "maxAccounts"));
    }

    #[test]
    fn optional_params_are_included_when_set() {
        let request = QuoteRequest {
            swap_mode: Some(SwapMode::ExactOut),
            max_accounts: Some(50),
            ..sample_request()
        };
        let params = build_query_params(&request);
        assert!(params.contains(&("swapMode", "ExactOut".to_string())));
        assert!(params.contains(&("maxAccounts", "50".to_string())));
    }
}
