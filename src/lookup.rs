use async_trait::async_trait;
use solana_address_lookup_table_interface::state::AddressLookupTable;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account,
    message::{AddressLookupTableAccount, VersionedMessage},
    pubkey::Pubkey,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup table {address} does not exist")]
    TableNotFound { address: Pubkey },
    #[error("failed to fetch lookup table {address}: {reason}")]
    TableFetch { address: Pubkey, reason: String },
    #[error("lookup table {address} holds malformed data: {reason}")]
    TableData { address: Pubkey, reason: String },
}

/// Account-fetching seam for lookup-table resolution, so tests can stand in
/// an in-memory store for the RPC endpoint.
#[async_trait]
pub trait AccountFetcher {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<Account>, LookupError>;
}

#[async_trait]
impl AccountFetcher for RpcClient {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<Account>, LookupError> {
        self.get_account_with_commitment(address, self.commitment())
            .await
            .map(|response| response.value)
            .map_err(|err| LookupError::TableFetch {
                address: *address,
                reason: err.to_string(),
            })
    }
}

/// Resolves every lookup table the message references, one fetch per
/// reference, preserving reference order. Messages without lookups resolve
/// to an empty list without touching the network.
///
/// A table the network does not return is fatal: the flow must stop before
/// anything is signed against an unresolvable key set.
pub async fn resolve_lookup_tables<F>(
    fetcher: &F,
    message: &VersionedMessage,
) -> Result<Vec<AddressLookupTableAccount>, LookupError>
where
    F: AccountFetcher + ?Sized,
{
    let Some(lookups) = message.address_table_lookups() else {
        return Ok(Vec::new());
    };

    let mut tables = Vec::with_capacity(lookups.len());
    for lookup in lookups {
        let address = lookup.account_key;
        let account = fetcher
            .fetch_account(&address)
            .await?
            .ok_or(LookupError::TableNotFound { address })?;

        let table = AddressLookupTable::deserialize(&account.data).map_err(|err| {
            LookupError::TableData {
                address,
                reason: err.to_string(),
            }
        })?;

        debug!(
            table = %address,
            addresses = table.addresses.len(),
            "resolved lookup table"
        );
        tables.push(AddressLookupTableAccount {
            key: address,
            addresses: table.addresses.to_vec(),
        });
    }

    Ok(tables)
}
