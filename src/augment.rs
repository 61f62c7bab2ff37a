use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{
        compiled_instruction::CompiledInstruction, v0, AddressLookupTableAccount, CompileError,
        Message, VersionedMessage,
    },
    pubkey::Pubkey,
    transaction::VersionedTransaction,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("failed to decode transaction base64: {0}")]
    DecodeBase64(#[from] base64::DecodeError),
    #[error("failed to deserialize transaction: {0}")]
    Deserialize(#[from] bincode::Error),
    #[error("message references lookup table {address} that was not resolved")]
    UnresolvedLookupTable { address: Pubkey },
    #[error("lookup table {address} has no entry at index {index}")]
    LookupIndexOutOfBounds { address: Pubkey, index: u8 },
    #[error("instruction references account index {index} outside the message")]
    AccountIndexOutOfBounds { index: u8 },
    #[error("message carries no account keys")]
    MissingFeePayer,
    #[error("failed to compile message: {0}")]
    Compile(#[from] CompileError),
}

/// Decodes the swap-build payload into a versioned transaction envelope.
pub fn decode_transaction(encoded: &str) -> Result<VersionedTransaction, AugmentError> {
    let bytes = BASE64_STANDARD.decode(encoded)?;
    Ok(bincode::deserialize(&bytes)?)
}

/// Rebuilds the message with `tip` appended as the final instruction and the
/// freshly fetched `blockhash` attached.
///
/// The same lookup tables that decompiled the message recompile it, so the
/// account-key compression scheme of the output matches the input. Fee payer
/// stays the message's first static key.
pub fn augment_message(
    message: &VersionedMessage,
    tables: &[AddressLookupTableAccount],
    tip: Instruction,
    blockhash: Hash,
) -> Result<VersionedMessage, AugmentError> {
    let payer = *message
        .static_account_keys()
        .first()
        .ok_or(AugmentError::MissingFeePayer)?;

    let mut instructions = decompile_message(message, tables)?;
    instructions.push(tip);

    match message {
        VersionedMessage::Legacy(_) => Ok(VersionedMessage::Legacy(Message::new_with_blockhash(
            &instructions,
            Some(&payer),
            &blockhash,
        ))),
        VersionedMessage::V0(_) => Ok(VersionedMessage::V0(v0::Message::try_compile(
            &payer,
            &instructions,
            tables,
            blockhash,
        )?)),
    }
}

/// Expands a compiled message back into an editable instruction list.
///
/// For v0 messages the combined key space is static keys, then the addresses
/// loaded writable, then the addresses loaded readonly, in the order the
/// table lookups appear. Signer and writability flags are recovered from the
/// message header and that split.
pub fn decompile_message(
    message: &VersionedMessage,
    tables: &[AddressLookupTableAccount],
) -> Result<Vec<Instruction>, AugmentError> {
    match message {
        VersionedMessage::Legacy(message) => decompile_instructions(
            &message.instructions,
            &message.account_keys,
            &message.header,
            message.account_keys.len(),
            0,
        ),
        VersionedMessage::V0(message) => {
            let mut keys = message.account_keys.clone();
            let num_static = keys.len();

            let mut loaded_writable = Vec::new();
            let mut loaded_readonly = Vec::new();
            for lookup in &message.address_table_lookups {
                let table = tables
                    .iter()
                    .find(|table| table.key == lookup.account_key)
                    .ok_or(AugmentError::UnresolvedLookupTable {
                        address: lookup.account_key,
                    })?;
                for &index in &lookup.writable_indexes {
                    loaded_writable.push(*lookup_entry(table, index)?);
                }
                for &index in &lookup.readonly_indexes {
                    loaded_readonly.push(*lookup_entry(table, index)?);
                }
            }

            let num_writable_loaded = loaded_writable.len();
            keys.extend(loaded_writable);
            keys.extend(loaded_readonly);

            decompile_instructions(
                &message.instructions,
                &keys,
                &message.header,
                num_static,
                num_writable_loaded,
            )
        }
    }
}

fn lookup_entry(table: &AddressLookupTableAccount, index: u8) -> Result<&Pubkey, AugmentError> {
    table
        .addresses
        .get(index as usize)
        .ok_or(AugmentError::LookupIndexOutOfBounds {
            address: table.key,
            index,
        })
}

fn decompile_instructions(
    compiled: &[CompiledInstruction],
    keys: &[Pubkey],
    header: &solana_sdk::message::MessageHeader,
    num_static: usize,
    num_writable_loaded: usize,
) -> Result<Vec<Instruction>, AugmentError> {
    let num_signers = header.num_required_signatures as usize;
    let num_readonly_signed = header.num_readonly_signed_accounts as usize;
    let num_readonly_unsigned = header.num_readonly_unsigned_accounts as usize;

    let is_writable = |index: usize| {
        if index < num_static {
            if index < num_signers {
                index < num_signers.saturating_sub(num_readonly_signed)
            } else {
                index < num_static.saturating_sub(num_readonly_unsigned)
            }
        } else {
            index < num_static + num_writable_loaded
        }
    };

    let key_at = |index: u8| {
        keys.get(index as usize)
            .copied()
            .ok_or(AugmentError::AccountIndexOutOfBounds { index })
    };

    compiled
        .iter()
        .map(|instruction| {
            let program_id = key_at(instruction.program_id_index)?;
            let accounts = instruction
                .accounts
                .iter()
                .map(|&index| {
                    let pubkey = key_at(index)?;
                    Ok(AccountMeta {
                        pubkey,
                        is_signer: (index as usize) < num_signers,
                        is_writable: is_writable(index as usize),
                    })
                })
                .collect::<Result<Vec<_>, AugmentError>>()?;
            Ok(Instruction {
                program_id,
                accounts,
                data: instruction.data.clone(),
            })
        })
        .collect()
}
