use std::env;

use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use thiserror::Error;

use crate::submit::SubmitConfig;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_RELAY_URL: &str = "http://ams1.nozomi.temporal.xyz";
pub const DEFAULT_QUOTE_API_URL: &str = "https://quote-api.jup.ag/v6";

/// 0.001 SOL, the fixed relay tip.
pub const DEFAULT_TIP_LAMPORTS: u64 = 1_000_000;
pub const DEFAULT_TIP_ADDRESS: Pubkey =
    Pubkey::from_str_const("TEMPaMeCRFAS9EKF53Jd6KpHxgL47uWLcpFArU1Fanq");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    MissingVar { name: &'static str },
    #[error("PRIVATE_KEY is not usable key material: {reason}")]
    InvalidKey { reason: String },
}

/// Endpoints, relay credential, and tip parameters for one swap flow.
///
/// Kept as fields rather than module-level literals so tests and alternate
/// deployments can substitute values without touching the environment.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub rpc_url: String,
    pub relay_url: String,
    pub relay_uuid: String,
    pub quote_api_url: String,
    pub tip_address: Pubkey,
    pub tip_lamports: u64,
    pub submit: SubmitConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            relay_uuid: String::new(),
            quote_api_url: DEFAULT_QUOTE_API_URL.to_string(),
            tip_address: DEFAULT_TIP_ADDRESS,
            tip_lamports: DEFAULT_TIP_LAMPORTS,
            submit: SubmitConfig::default(),
        }
    }
}

impl FlowConfig {
    /// Reads `RPC_URL` (optional, defaults to the public mainnet endpoint)
    /// and `NOZOMI_UUID` (required relay credential).
    pub fn from_env() -> Result<Self, ConfigError> {
        let relay_uuid = env::var("NOZOMI_UUID").map_err(|_| ConfigError::MissingVar {
            name: "NOZOMI_UUID",
        })?;
        Ok(Self {
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            relay_uuid,
            ..Self::default()
        })
    }

    /// Relay endpoint with the credential attached as a query parameter.
    pub fn relay_endpoint(&self) -> String {
        format!("{}?c={}", self.relay_url, self.relay_uuid)
    }
}

/// Loads the signing key from `PRIVATE_KEY`.
pub fn keypair_from_env() -> Result<Keypair, ConfigError> {
    let raw = env::var("PRIVATE_KEY").map_err(|_| ConfigError::MissingVar {
        name: "PRIVATE_KEY",
    })?;
    parse_keypair(&raw)
}

/// Parses secret-key material: a JSON array of bytes (the environment
/// contract), or a base58 string as a fallback. The key is plaintext in the
/// environment; it is held only for signing and never written anywhere.
pub fn parse_keypair(raw: &str) -> Result<Keypair, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        let bytes: Vec<u8> =
            serde_json::from_str(trimmed).map_err(|err| ConfigError::InvalidKey {
                reason: err.to_string(),
            })?;
        Keypair::try_from(bytes.as_slice()).map_err(|err| ConfigError::InvalidKey {
            reason: err.to_string(),
        })
    } else if trimmed.is_empty() {
        Err(ConfigError::InvalidKey {
            reason: "empty value".to_string(),
        })
    } else {
        Ok(Keypair::from_base58_string(trimmed))
    }
}
