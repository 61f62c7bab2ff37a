use std::time::Duration;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{
    message::VersionedMessage,
    signature::{Keypair, Signature},
    signer::SignerError,
    transaction::{TransactionError, VersionedTransaction},
};
use solana_transaction_status::UiTransactionEncoding;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to sign transaction: {0}")]
    Sign(#[from] SignerError),
    #[error("relay rejected transaction: {reason}")]
    Rejected { reason: String },
    #[error("confirmation status poll failed: {reason}")]
    StatusPoll { reason: String },
    #[error("transaction {signature} failed on chain: {err}")]
    TransactionFailed {
        signature: Signature,
        err: TransactionError,
    },
    #[error("blockhash expired before {signature} was confirmed")]
    BlockhashExpired { signature: Signature },
}

/// Relay submission and confirmation tuning. The relay runs its own
/// fast-path admission, so preflight simulation is skipped and the relay is
/// allowed a small number of internal resends.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub skip_preflight: bool,
    pub max_retries: usize,
    pub poll_interval: Duration,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            skip_preflight: true,
            max_retries: 2,
            poll_interval: Duration::from_millis(400),
        }
    }
}

/// Signs the augmented message with the single local signer.
pub fn sign_transaction(
    message: VersionedMessage,
    keypair: &Keypair,
) -> Result<VersionedTransaction, SubmitError> {
    Ok(VersionedTransaction::try_new(message, &[keypair])?)
}

/// Submits the signed transaction once through the relay endpoint.
pub async fn send_via_relay(
    relay: &RpcClient,
    transaction: &VersionedTransaction,
    config: &SubmitConfig,
) -> Result<Signature, SubmitError> {
    relay
        .send_transaction_with_config(
            transaction,
            RpcSendTransactionConfig {
                skip_preflight: config.skip_preflight,
                max_retries: Some(config.max_retries),
                encoding: Some(UiTransactionEncoding::Base64),
                ..RpcSendTransactionConfig::default()
            },
        )
        .await
        .map_err(|err| SubmitError::Rejected {
            reason: err.to_string(),
        })
}

/// Polls the general endpoint until the transaction confirms, fails on
/// chain, or the blockhash's valid-height window elapses.
pub async fn await_confirmation(
    rpc: &RpcClient,
    signature: &Signature,
    last_valid_block_height: u64,
    poll_interval: Duration,
) -> Result<(), SubmitError> {
    loop {
        let statuses = rpc
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|err| SubmitError::StatusPoll {
                reason: err.to_string(),
            })?;

        if let Some(Some(status)) = statuses.value.first() {
            if let Some(err) = &status.err {
                return Err(SubmitError::TransactionFailed {
                    signature: *signature,
                    err: err.clone(),
                });
            }
            if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                return Ok(());
            }
        }

        let block_height = rpc
            .get_block_height()
            .await
            .map_err(|err| SubmitError::StatusPoll {
                reason: err.to_string(),
            })?;
        if block_height > last_valid_block_height {
            return Err(SubmitError::BlockhashExpired {
                signature: *signature,
            });
        }

        debug!(%signature, block_height, "transaction not yet confirmed");
        tokio::time::sleep(poll_interval).await;
    }
}
