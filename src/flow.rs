use std::time::{Duration, Instant};

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use solana_system_interface::instruction as system_instruction;
use thiserror::Error;
use tracing::{debug, info};

use crate::augment::{self, AugmentError};
use crate::config::FlowConfig;
use crate::lookup::{self, LookupError};
use crate::quote::QuoteRequest;
use crate::submit::{self, SubmitError};
use crate::{ClientError, SwapApiClient};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("aggregation API error: {0}")]
    Client(#[from] ClientError),
    #[error("lookup table resolution failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("failed to fetch recent blockhash: {reason}")]
    Blockhash { reason: String },
    #[error("transaction augmentation failed: {0}")]
    Augment(#[from] AugmentError),
    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),
}

/// Observable result of one run: the relay-issued submission identifier and
/// the submit-to-confirmation latency.
#[derive(Debug)]
pub struct FlowOutcome {
    pub signature: Signature,
    pub confirmed_in: Duration,
}

/// One-shot swap pipeline: quote, build, resolve, augment, sign, submit
/// through the relay, confirm on the general endpoint.
pub struct SwapFlow {
    config: FlowConfig,
    api: SwapApiClient,
    rpc: RpcClient,
    relay: RpcClient,
    keypair: Keypair,
}

impl SwapFlow {
    pub fn new(config: FlowConfig, keypair: Keypair) -> Self {
        let api = SwapApiClient::new(Some(config.quote_api_url.clone()));
        let rpc = RpcClient::new_with_commitment(
            config.rpc_url.clone(),
            CommitmentConfig::confirmed(),
        );
        let relay = RpcClient::new(config.relay_endpoint());
        Self {
            config,
            api,
            rpc,
            relay,
            keypair,
        }
    }

    pub fn signer_pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Runs the full pipeline. Every stage is fatal on failure; nothing is
    /// signed unless decode, resolution, and augmentation all succeeded.
    pub async fn execute(&self, request: &QuoteRequest) -> Result<FlowOutcome, FlowError> {
        let quote = self.api.quote(request).await?;
        info!(
            amount = request.amount,
            out_amount = quote.out_amount(),
            route_steps = quote.route_steps(),
            "quote received"
        );

        let build = self
            .api
            .swap_transaction(&quote, &self.keypair.pubkey())
            .await?;
        let transaction = augment::decode_transaction(&build.swap_transaction)?;
        debug!(
            instructions = transaction.message.instructions().len(),
            "swap transaction decoded"
        );

        let tables = lookup::resolve_lookup_tables(&self.rpc, &transaction.message).await?;

        // The blockhash must postdate everything baked into the message; it
        // is fetched here and attached during recompilation.
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .await
            .map_err(|err| FlowError::Blockhash {
                reason: err.to_string(),
            })?;

        let tip = system_instruction::transfer(
            &self.keypair.pubkey(),
            &self.config.tip_address,
            self.config.tip_lamports,
        );
        let message = augment::augment_message(&transaction.message, &tables, tip, blockhash)?;
        let signed = submit::sign_transaction(message, &self.keypair)?;

        let started = Instant::now();
        let signature = submit::send_via_relay(&self.relay, &signed, &self.config.submit).await?;
        info!(%signature, "relay accepted transaction");

        submit::await_confirmation(
            &self.rpc,
            &signature,
            last_valid_block_height,
            self.config.submit.poll_interval,
        )
        .await?;

        let confirmed_in = started.elapsed();
        info!(%signature, elapsed_ms = confirmed_in.as_millis() as u64, "transaction confirmed");
        Ok(FlowOutcome {
            signature,
            confirmed_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
    use solana_sdk::account::Account;
    use solana_sdk::hash::Hash;
    use solana_sdk::instruction::{AccountMeta, Instruction};
    use solana_sdk::message::{v0, AddressLookupTableAccount, VersionedMessage};
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::transaction::VersionedTransaction;

    use crate::lookup::{resolve_lookup_tables, AccountFetcher, LookupError};

    use super::*;

    /// Fetcher double standing in for the general RPC endpoint.
    struct MemoryFetcher(HashMap<Pubkey, Account>);

    #[async_trait]
    impl AccountFetcher for MemoryFetcher {
        async fn fetch_account(&self, address: &Pubkey) -> Result<Option<Account>, LookupError> {
            Ok(self.0.get(address).cloned())
        }
    }

    fn unsigned_swap_response(payer: &Pubkey, placeholder: Hash) -> String {
        let swap_ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 777);
        let message = VersionedMessage::V0(
            v0::Message::try_compile(payer, &[swap_ix], &[], placeholder).unwrap(),
        );
        let unsigned = VersionedTransaction {
            signatures: vec![Signature::default()],
            message,
        };
        BASE64_STANDARD.encode(bincode::serialize(&unsigned).unwrap())
    }

    #[tokio::test]
    async fn pipeline_signs_against_the_latest_blockhash() {
        let keypair = Keypair::new();
        let config = FlowConfig::default();
        let placeholder = Hash::new_from_array([1; 32]);
        let latest = Hash::new_from_array([2; 32]);

        // Mocked swap-build response: zero lookup tables.
        let encoded = unsigned_swap_response(&keypair.pubkey(), placeholder);

        let transaction = augment::decode_transaction(&encoded).unwrap();
        let fetcher = MemoryFetcher(HashMap::new());
        let tables = resolve_lookup_tables(&fetcher, &transaction.message)
            .await
            .unwrap();
        assert!(tables.is_empty());

        let tip = system_instruction::transfer(
            &keypair.pubkey(),
            &config.tip_address,
            config.tip_lamports,
        );
        let message =
            augment::augment_message(&transaction.message, &tables, tip, latest).unwrap();
        let signed = submit::sign_transaction(message, &keypair).unwrap();

        assert_eq!(*signed.message.recent_blockhash(), latest);
        assert_ne!(*signed.message.recent_blockhash(), placeholder);
        assert_eq!(
            signed.message.instructions().len(),
            transaction.message.instructions().len() + 1
        );
        assert_eq!(signed.signatures.len(), 1);
        assert_ne!(signed.signatures[0], Signature::default());
    }

    #[tokio::test]
    async fn missing_lookup_table_stops_the_pipeline_before_signing() {
        let keypair = Keypair::new();
        let loaded = Pubkey::new_unique();
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![loaded],
        };
        let swap_ix = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![
                AccountMeta::new(keypair.pubkey(), true),
                AccountMeta::new(loaded, false),
            ],
            data: vec![],
        };
        let message = VersionedMessage::V0(
            v0::Message::try_compile(
                &keypair.pubkey(),
                &[swap_ix],
                std::slice::from_ref(&table),
                Hash::new_from_array([1; 32]),
            )
            .unwrap(),
        );

        // The referenced table is absent from the (mock) network.
        let fetcher = MemoryFetcher(HashMap::new());
        let err = resolve_lookup_tables(&fetcher, &message).await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::TableNotFound { address } if address == table.key
        ));
    }
}
