// DANS : src/data_pipeline/history.rs

use super::transaction_adapter::adapt_transaction;
use crate::{
    decoders::{spl_token_decoders::mint::decode_mint, RawTransaction},
    rpc::ResilientRpcClient,
    scanner::TransactionSource,
    state::MintAuthorities,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::{collections::HashMap, str::FromStr, sync::Arc};
use tracing::{debug, info, warn};

/// Limite de `getMultipleAccounts`.
const MULTIPLE_ACCOUNTS_CHUNK: usize = 100;

/// Une entrée de signature à garder : transaction réussie, dans la fenêtre.
/// Une entrée sans `block_time` est gardée ; le scanner la filtrera.
fn keep_entry(entry: &RpcConfirmedTransactionStatusWithSignature, min_block_time: i64) -> bool {
    entry.err.is_none() && entry.block_time.is_none_or(|time| time >= min_block_time)
}

/// Dernière page : vide, incomplète, ou dont la plus ancienne entrée sort de la fenêtre.
fn is_last_page(page: &[RpcConfirmedTransactionStatusWithSignature], limit: usize, min_block_time: i64) -> bool {
    match page.last() {
        None => true,
        Some(oldest) => page.len() < limit || oldest.block_time.is_some_and(|time| time < min_block_time),
    }
}

/// L'historique d'une adresse, page par page à reculons, jusqu'à `min_block_time`.
/// Une transaction illisible est ignorée ; un échec de pagination fait échouer le scan
/// (le client a déjà épuisé ses ré-essais sur le même curseur).
pub async fn fetch_history(
    rpc: &ResilientRpcClient,
    address: &Pubkey,
    min_block_time: i64,
    page_limit: usize,
) -> Result<Vec<RawTransaction>> {
    let mut before: Option<Signature> = None;
    let mut transactions = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = rpc.get_signatures_for_address(address, before, page_limit).await?;
        pages += 1;

        for entry in page.iter().filter(|entry| keep_entry(entry, min_block_time)) {
            let signature = Signature::from_str(&entry.signature)
                .with_context(|| format!("Signature invalide: {}", entry.signature))?;
            match rpc.get_transaction(&signature).await {
                Ok(encoded) => match adapt_transaction(encoded) {
                    Ok(tx) => transactions.push(tx),
                    Err(e) => debug!(%signature, error = ?e, "[History] Transaction inutilisable, ignorée."),
                },
                Err(e) => warn!(%signature, error = ?e, "[History] Transaction introuvable, ignorée."),
            }
        }

        if is_last_page(&page, page_limit, min_block_time) {
            break;
        }
        if let Some(oldest) = page.last() {
            before = Some(
                Signature::from_str(&oldest.signature)
                    .with_context(|| format!("Signature invalide: {}", oldest.signature))?,
            );
        }
    }

    info!(%address, pages, transactions = transactions.len(), "[History] Historique récupéré.");
    Ok(transactions)
}

/// La source de production : le RPC.
#[derive(Clone)]
pub struct RpcTransactionSource {
    rpc: Arc<ResilientRpcClient>,
    page_limit: usize,
}

impl RpcTransactionSource {
    pub fn new(rpc: Arc<ResilientRpcClient>, page_limit: usize) -> Self {
        Self { rpc, page_limit }
    }
}

#[async_trait]
impl TransactionSource for RpcTransactionSource {
    async fn fetch_history(&self, address: &Pubkey, min_block_time: i64) -> Result<Vec<RawTransaction>> {
        fetch_history(&self.rpc, address, min_block_time, self.page_limit).await
    }

    async fn fetch_mint_authorities(&self, mints: &[Pubkey]) -> HashMap<Pubkey, MintAuthorities> {
        let mut authorities = HashMap::with_capacity(mints.len());

        for chunk in mints.chunks(MULTIPLE_ACCOUNTS_CHUNK) {
            let accounts = match self.rpc.get_multiple_accounts(chunk).await {
                Ok(accounts) => accounts,
                Err(e) => {
                    warn!(error = ?e, count = chunk.len(), "[History] Lecture des mints impossible, autorités à N/A.");
                    continue;
                }
            };

            for (mint, account) in chunk.iter().zip(accounts) {
                let Some(account) = account else { continue };
                match decode_mint(mint, &account.data) {
                    Ok(decoded) => {
                        authorities.insert(*mint, MintAuthorities::from(&decoded));
                    }
                    Err(e) => debug!(%mint, error = ?e, "[History] Compte de mint non décodable."),
                }
            }
        }

        authorities
    }
}
