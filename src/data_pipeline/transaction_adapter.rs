// DANS : src/data_pipeline/transaction_adapter.rs

use crate::decoders::{RawInstruction, RawTransaction, TokenBalance};
use anyhow::{anyhow, bail, Context, Result};
use solana_sdk::pubkey::Pubkey;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiCompiledInstruction, UiInstruction,
    UiLoadedAddresses, UiMessage, UiTransactionStatusMeta,
};
use std::{collections::BTreeMap, str::FromStr};

/// Convertit une transaction RPC (encodage JSON) en `RawTransaction`.
/// Une instruction dont un index de compte ne se résout pas rend la transaction inutilisable.
pub fn adapt_transaction(encoded: EncodedConfirmedTransactionWithStatusMeta) -> Result<RawTransaction> {
    let EncodedConfirmedTransactionWithStatusMeta { slot, transaction, block_time } = encoded;

    let EncodedTransaction::Json(ui_transaction) = transaction.transaction else {
        bail!("Encodage de transaction inattendu (JSON attendu)");
    };
    let UiMessage::Raw(message) = ui_transaction.message else {
        bail!("Message parsé inattendu (message brut attendu)");
    };
    let signature = ui_transaction.signatures.first().cloned().unwrap_or_default();
    let meta = transaction.meta;

    // Clés statiques, puis adresses chargées depuis les lookup tables (writable, puis readonly).
    let mut account_keys = parse_keys(&message.account_keys)
        .with_context(|| format!("Clés de compte invalides dans {}", signature))?;
    if let Some(loaded) = meta.as_ref().and_then(|m| Option::<&UiLoadedAddresses>::from(m.loaded_addresses.as_ref())) {
        account_keys.extend(parse_keys(&loaded.writable)?);
        account_keys.extend(parse_keys(&loaded.readonly)?);
    }

    let instructions = message
        .instructions
        .iter()
        .map(|ix| resolve_instruction(ix, &account_keys))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Instruction top-level non résolue dans {}", signature))?;

    let (inner_instructions, post_token_balances) = match meta.as_ref() {
        Some(meta) => (
            adapt_inner_instructions(meta, &account_keys)
                .with_context(|| format!("Inner instruction non résolue dans {}", signature))?,
            adapt_post_balances(meta)?,
        ),
        None => (BTreeMap::new(), Vec::new()),
    };

    Ok(RawTransaction {
        slot,
        block_time,
        signature,
        account_keys,
        instructions,
        inner_instructions,
        post_token_balances,
    })
}

fn parse_keys(keys: &[String]) -> Result<Vec<Pubkey>> {
    keys.iter()
        .map(|key| Pubkey::from_str(key).with_context(|| format!("Adresse invalide: {}", key)))
        .collect()
}

fn resolve_key(index: u8, account_keys: &[Pubkey]) -> Result<Pubkey> {
    account_keys
        .get(index as usize)
        .copied()
        .ok_or_else(|| anyhow!("index de compte {} hors limites ({} comptes)", index, account_keys.len()))
}

fn resolve_instruction(ix: &UiCompiledInstruction, account_keys: &[Pubkey]) -> Result<RawInstruction> {
    Ok(RawInstruction {
        program_id: resolve_key(ix.program_id_index, account_keys)?,
        accounts: ix
            .accounts
            .iter()
            .map(|&index| resolve_key(index, account_keys))
            .collect::<Result<Vec<_>>>()?,
        data: ix.data.clone(),
    })
}

fn adapt_inner_instructions(
    meta: &UiTransactionStatusMeta,
    account_keys: &[Pubkey],
) -> Result<BTreeMap<usize, Vec<RawInstruction>>> {
    let mut groups: BTreeMap<usize, Vec<RawInstruction>> = BTreeMap::new();
    let Some(inner) = Option::<&Vec<_>>::from(meta.inner_instructions.as_ref()) else {
        return Ok(groups);
    };

    for group in inner {
        let resolved = groups.entry(group.index as usize).or_default();
        for ix in &group.instructions {
            // En encodage JSON, les inner instructions sont toujours compilées.
            if let UiInstruction::Compiled(compiled) = ix {
                resolved.push(resolve_instruction(compiled, account_keys)?);
            }
        }
    }
    Ok(groups)
}

fn adapt_post_balances(meta: &UiTransactionStatusMeta) -> Result<Vec<TokenBalance>> {
    let Some(balances) = Option::<&Vec<_>>::from(meta.post_token_balances.as_ref()) else {
        return Ok(Vec::new());
    };

    balances
        .iter()
        .map(|balance| {
            Ok(TokenBalance {
                account_index: balance.account_index as usize,
                mint: Pubkey::from_str(&balance.mint)
                    .with_context(|| format!("Mint invalide: {}", balance.mint))?,
                decimals: balance.ui_token_amount.decimals,
                ui_amount: balance.ui_token_amount.ui_amount.unwrap_or(0.0),
            })
        })
        .collect()
}
