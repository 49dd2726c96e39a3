// src/scanner/mod.rs

//! Le scan d'un protocole : découverte des créations, scan des trades par token,
//! évaluation et écriture du rapport.

use crate::{
    decoders::{DomainEvent, Protocol, RawTransaction},
    state::{MintAuthorities, TokenRecord},
};
use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

pub mod batch;
pub mod pipeline;
pub mod pump;
pub mod raydium;

pub use pipeline::{run_protocol, RunSettings, RunSummary};
pub use pump::PumpScanner;
pub use raydium::RaydiumScanner;

/// D'où viennent les transactions. En production, le RPC ; en test, une liste en mémoire.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// L'historique d'une adresse jusqu'à `min_block_time` inclus, du plus récent au plus ancien.
    /// Aucun ordre n'est garanti : l'appelant trie.
    async fn fetch_history(&self, address: &Pubkey, min_block_time: i64) -> Result<Vec<RawTransaction>>;

    /// Les autorités de chaque mint. Un mint absent du résultat vaut "N/A".
    async fn fetch_mint_authorities(&self, mints: &[Pubkey]) -> HashMap<Pubkey, MintAuthorities>;
}

/// Ce qui distingue un protocole d'un autre dans le pipeline.
/// Les décodages sont "best effort" : une instruction qui ne se décode pas est ignorée.
pub trait ProtocolScanner: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// L'adresse dont l'historique liste les créations.
    fn discovery_address(&self) -> Pubkey;

    fn creation_events(&self, tx: &RawTransaction) -> Vec<DomainEvent>;

    /// L'adresse dont l'historique liste les trades de ce token.
    fn trade_address(&self, record: &TokenRecord) -> Pubkey;

    /// Les swaps/trades de ce token dans la transaction, dans l'ordre d'exécution.
    fn trade_events(&self, record: &TokenRecord, tx: &RawTransaction) -> Vec<DomainEvent>;
}
